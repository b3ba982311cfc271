use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::{Rng, distr::Alphanumeric, rng};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::Role;

const TOKEN_LENGTH: usize = 48;
/// Lifetime of a password reset token.
pub const RESET_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Signed-in user as seen by request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub signed_in_at: OffsetDateTime,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

struct SessionSlot {
    session: Session,
    expires_at: Instant,
}

struct ResetSlot {
    user_id: Uuid,
    expires_at: Instant,
}

/// Bearer sessions and pending password resets, keyed by their opaque token.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionSlot>,
    resets: DashMap<String, ResetSlot>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            resets: DashMap::new(),
            ttl,
        }
    }

    /// Open a session for the user and return it with its freshly minted token.
    pub fn open(
        &self,
        user_id: Uuid,
        email: String,
        display_name: String,
        role: Role,
        now: OffsetDateTime,
    ) -> Session {
        let session = Session {
            token: generate_token(),
            user_id,
            email,
            display_name,
            role,
            signed_in_at: now,
        };
        self.sessions.insert(
            session.token.clone(),
            SessionSlot {
                session: session.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        session
    }

    /// Look up a live session; expired sessions are evicted on access.
    pub fn resolve(&self, token: &str) -> Option<Session> {
        let slot = self.sessions.get(token)?;
        if slot.expires_at <= Instant::now() {
            drop(slot);
            self.sessions.remove(token);
            return None;
        }
        Some(slot.session.clone())
    }

    /// Close a session. Returns whether it existed.
    pub fn close(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Close every session belonging to the user.
    pub fn close_all_for(&self, user_id: Uuid) {
        self.sessions.retain(|_, slot| slot.session.user_id != user_id);
    }

    /// Number of sessions currently stored, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Issue a single-use password reset token for the user.
    pub fn issue_reset(&self, user_id: Uuid) -> String {
        let token = generate_token();
        self.resets.insert(
            token.clone(),
            ResetSlot {
                user_id,
                expires_at: Instant::now() + RESET_TOKEN_TTL,
            },
        );
        token
    }

    /// Drop every session and reset token expired at `now`. Returns how many
    /// entries were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.sessions.len() + self.resets.len();
        self.sessions.retain(|_, slot| slot.expires_at > now);
        self.resets.retain(|_, slot| slot.expires_at > now);
        before.saturating_sub(self.sessions.len() + self.resets.len())
    }

    /// Number of pending password resets, expired ones included.
    pub fn pending_resets(&self) -> usize {
        self.resets.len()
    }

    /// Consume a reset token, returning the user it was issued for.
    pub fn redeem_reset(&self, token: &str) -> Option<Uuid> {
        let (_, slot) = self.resets.remove(token)?;
        (slot.expires_at > Instant::now()).then_some(slot.user_id)
    }
}

fn generate_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
