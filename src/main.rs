use devpay::application::{JoinCoordinator, JoinDecision, SettlementService};
use devpay::config::Config;
use devpay::domain::actor::{Actor, Role};
use devpay::domain::availability::AvailabilityStatus;
use devpay::domain::developer::{Developer, DeveloperRepository};
use devpay::domain::session::{SessionLifecycleService, SessionView};
use devpay::domain::shared::value_objects::{UserId, WalletAddress};
use devpay::infrastructure::payment::LedgerGateway;
use devpay::infrastructure::persistence::{InMemoryDeveloperRepository, InMemorySessionRepository};
use devpay::infrastructure::relay::SessionRelay;
use devpay::infrastructure::transport::{RoomTokenSigner, SimulatedRoom};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting DevPay session engine");

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Initialize metrics recorder
    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;

    // Demo: run a full consultation lifecycle over the in-memory adapters
    demo_session_lifecycle(&config).await?;

    info!("Metrics snapshot:\n{}", prometheus_handle.render());

    Ok(())
}

/// Demonstrate the session lifecycle: request, acceptance, live call,
/// settlement, and the payout.
async fn demo_session_lifecycle(config: &Config) -> anyhow::Result<()> {
    info!("=== Session Lifecycle Demo ===");

    let relay = Arc::new(SessionRelay::new());
    let sessions = Arc::new(InMemorySessionRepository::new());
    let developers = Arc::new(InMemoryDeveloperRepository::new());
    let service = Arc::new(SessionLifecycleService::new(
        sessions.clone(),
        developers.clone(),
        relay.clone(),
    ));

    // A developer signs in and goes available
    let developer_id = UserId::new();
    let mut developer = Developer::new(developer_id, 0.4)?
        .with_title("Senior Rust Engineer".to_string())
        .with_skills(vec!["rust".to_string(), "tokio".to_string()])
        .with_wallet(
            WalletAddress::parse("0x52908400098527886e0f7030069857d2e4169ee7")
                .map_err(|e| anyhow::anyhow!(e))?,
        );
    developer.set_status(AvailabilityStatus::Available);
    developers.save(&developer).await?;

    let developer_actor = Actor::new(developer_id, Role::Developer);
    let client_actor = Actor::new(UserId::new(), Role::Client);

    // The developer's dashboard listens for new requests
    let mut request_feed = relay.subscribe_developer(developer_id);

    let session = service
        .create(
            client_actor,
            developer_id,
            "Track down a deadlock in our async worker pool".to_string(),
        )
        .await?;
    info!("Request created: {} ({})", session.id, session.status.as_str());

    let announced = request_feed.recv().await?;
    info!("Developer notified of request {}", announced.id);

    // Both sides watch the session from here on
    let mut session_feed = relay.subscribe_session(session.id);
    let mut client_view = SessionView::new(session.clone());

    service.accept(developer_actor, session.id).await?;
    info!("Request accepted");

    // A room admission token, as the transport provider expects it
    let signer = RoomTokenSigner::new(
        config.transport.app_id,
        config.transport.server_secret.clone(),
    );
    let token = signer.mint(
        session.id,
        client_actor.id,
        "Demo Client",
        config.transport.token_ttl_seconds,
    )?;
    info!("Room token minted ({} bytes)", token.len());

    // Drive the call with explicit timestamps: ninety minutes on the clock
    let t0 = chrono::Utc::now();
    let started = service.begin(client_actor, session.id, t0).await?;
    info!("Client entered the room (started the session: {})", started);

    let started_again = service
        .begin(developer_actor, session.id, t0 + chrono::Duration::seconds(2))
        .await?;
    info!("Developer entered the room (started the session: {})", started_again);

    let completed = service
        .complete(client_actor, session.id, t0 + chrono::Duration::minutes(90))
        .await?;
    info!(
        "Session completed: {:.2} hours at {} = {} due",
        completed.duration_hours.unwrap_or_default(),
        completed.rate_at_booking.unwrap_or_default(),
        completed.amount.unwrap_or_default(),
    );

    // The client's view catches up from the relay
    while let Ok(patch) = session_feed.try_recv() {
        client_view.apply(&patch);
    }
    info!("Client view is now {}", client_view.session().status.as_str());

    // Settlement: the client pays the developer's wallet
    let gateway = Arc::new(LedgerGateway::new());
    let settlement = SettlementService::new(service.clone(), developers.clone(), gateway.clone());
    let receipt = settlement.pay(client_actor, session.id).await?;
    info!("Paid out, tx {}", receipt.tx_reference);

    demo_join_flow(service, developers).await?;

    info!("=== Session Lifecycle Demo Complete ===");
    Ok(())
}

/// Demonstrate the join coordinator against the simulated room
async fn demo_join_flow(
    service: Arc<SessionLifecycleService>,
    developers: Arc<InMemoryDeveloperRepository>,
) -> anyhow::Result<()> {
    let developer_id = UserId::new();
    let mut developer = Developer::new(developer_id, 0.1)?;
    developer.set_status(AvailabilityStatus::Available);
    developers.save(&developer).await?;

    let developer_actor = Actor::new(developer_id, Role::Developer);
    let client_actor = Actor::new(UserId::new(), Role::Client);

    let session = service
        .create(client_actor, developer_id, "Quick API design review".to_string())
        .await?;
    service.accept(developer_actor, session.id).await?;

    let room = Arc::new(SimulatedRoom::new());
    let coordinator = JoinCoordinator::new(service, room.clone());

    let client_join = match coordinator
        .join_if_eligible(session.id, client_actor, "Demo Client")
        .await?
    {
        JoinDecision::Admitted(join) => join,
        _ => anyhow::bail!("client was not admitted"),
    };
    let developer_join = match coordinator
        .join_if_eligible(session.id, developer_actor, "Demo Developer")
        .await?
    {
        JoinDecision::Admitted(join) => join,
        _ => anyhow::bail!("developer was not admitted"),
    };
    info!("Both participants seated: {}", coordinator.seated(&session.id));

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    room.leave(session.id, client_actor.id);
    room.leave(session.id, developer_actor.id);

    let client_route = client_join.wait_leave().await?;
    let developer_route = developer_join.wait_leave().await?;
    info!(
        "Client routed to {:?}, developer routed to {:?}",
        client_route, developer_route
    );

    Ok(())
}
