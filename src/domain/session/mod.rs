//! Session bounded context - manages the lifecycle of billed consultations

pub mod aggregate;
pub mod event;
pub mod notifier;
pub mod repository;
pub mod service;
pub mod value_object;
pub mod view;

pub use aggregate::CallSession;
pub use event::{SessionEvent, SessionPatch};
pub use notifier::SessionNotifier;
pub use repository::SessionRepository;
pub use service::SessionLifecycleService;
pub use value_object::{PostCallRoute, SessionStatus};
pub use view::SessionView;
