//! Live room transport
//!
//! The audio/video channel itself is an external system; the engine only
//! needs to enter a room and learn when a participant left it.

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{SessionId, UserId};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Resolves when the participant leaves the room (or the room goes away)
pub struct LeaveSignal {
    rx: oneshot::Receiver<()>,
}

impl LeaveSignal {
    pub async fn left(self) {
        // A dropped sender also counts as having left
        let _ = self.rx.await;
    }
}

/// Port for the live audio/video room
#[async_trait]
pub trait RoomTransport: Send + Sync {
    /// Enter the room of a session. The returned signal resolves when this
    /// participant leaves.
    async fn join(
        &self,
        room_id: SessionId,
        participant: UserId,
        display_name: &str,
    ) -> Result<LeaveSignal>;
}

/// In-process room used by tests and the demo binary
pub struct SimulatedRoom {
    occupants: Mutex<HashMap<(SessionId, UserId), oneshot::Sender<()>>>,
}

impl SimulatedRoom {
    pub fn new() -> Self {
        Self {
            occupants: Mutex::new(HashMap::new()),
        }
    }

    /// Make a participant leave, firing their leave signal
    pub fn leave(&self, room_id: SessionId, participant: UserId) {
        let mut occupants = self.occupants.lock().unwrap();
        if let Some(tx) = occupants.remove(&(room_id, participant)) {
            let _ = tx.send(());
        }
    }

    pub fn occupant_count(&self, room_id: SessionId) -> usize {
        let occupants = self.occupants.lock().unwrap();
        occupants.keys().filter(|(room, _)| *room == room_id).count()
    }
}

impl Default for SimulatedRoom {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomTransport for SimulatedRoom {
    async fn join(
        &self,
        room_id: SessionId,
        participant: UserId,
        display_name: &str,
    ) -> Result<LeaveSignal> {
        let (tx, rx) = oneshot::channel();
        let mut occupants = self.occupants.lock().unwrap();
        // Re-joining replaces the previous entry; the stale signal resolves
        occupants.insert((room_id, participant), tx);
        debug!(room = %room_id, participant = %participant, display_name, "joined room");
        Ok(LeaveSignal { rx })
    }
}

/// Claims carried inside a room admission token
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    app_id: u64,
    room_id: SessionId,
    user_id: UserId,
    display_name: String,
    nonce: u64,
    expires_at: i64,
}

/// Mints signed admission tokens for the room provider.
///
/// Token format: `base64(claims).hex(hmac-sha256(claims))`, signed with the
/// provider's server secret.
pub struct RoomTokenSigner {
    app_id: u64,
    server_secret: String,
}

impl RoomTokenSigner {
    pub fn new(app_id: u64, server_secret: String) -> Self {
        Self {
            app_id,
            server_secret,
        }
    }

    pub fn mint(
        &self,
        room_id: SessionId,
        user_id: UserId,
        display_name: &str,
        ttl_seconds: u64,
    ) -> Result<String> {
        let claims = TokenClaims {
            app_id: self.app_id,
            room_id,
            user_id,
            display_name: display_name.to_string(),
            nonce: rand::random::<u64>(),
            expires_at: (Utc::now() + Duration::seconds(ttl_seconds as i64)).timestamp(),
        };

        let body = serde_json::to_vec(&claims)
            .map_err(|e| DomainError::Internal(format!("token claims: {}", e)))?;

        let mut mac = HmacSha256::new_from_slice(self.server_secret.as_bytes())
            .map_err(|e| DomainError::Internal(format!("token key: {}", e)))?;
        mac.update(&body);
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&body),
            hex::encode(signature)
        ))
    }

    /// Check a token's signature and expiry
    pub fn verify(&self, token: &str) -> bool {
        let Some((body_b64, signature_hex)) = token.split_once('.') else {
            return false;
        };
        let Ok(body) = URL_SAFE_NO_PAD.decode(body_b64) else {
            return false;
        };
        let Ok(signature) = hex::decode(signature_hex) else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(self.server_secret.as_bytes()) else {
            return false;
        };
        mac.update(&body);
        if mac.verify_slice(&signature).is_err() {
            return false;
        }

        match serde_json::from_slice::<TokenClaims>(&body) {
            Ok(claims) => claims.expires_at > Utc::now().timestamp(),
            Err(_) => false,
        }
    }
}
