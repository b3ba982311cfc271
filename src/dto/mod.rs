use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::dao::models::from_unix_ms;

pub mod auth;
pub mod contact;
pub mod course;
pub mod exam;
pub mod health;
pub mod leaderboard;
pub mod result;
pub mod sse;
pub mod submission;
pub mod validation;

fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn format_unix_ms(ms: i64) -> String {
    format_timestamp(from_unix_ms(ms))
}

/// Parse an RFC 3339 timestamp as sent by clients.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}
