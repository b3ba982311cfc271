use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{dao::models::SubmissionEntity, state::leaderboard::Ranked};

/// One line of a leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// Competition rank: equal scores share a rank and the next rank is skipped.
    pub rank: usize,
    pub user_id: Uuid,
    pub display_name: String,
    pub score: i64,
}

impl From<Ranked<SubmissionEntity>> for LeaderboardRow {
    fn from(ranked: Ranked<SubmissionEntity>) -> Self {
        Self {
            rank: ranked.rank,
            user_id: ranked.entry.user_id,
            display_name: ranked.entry.display_name,
            score: ranked.entry.score.unwrap_or(0),
        }
    }
}

/// Every participant of an exam, best score first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub exam_id: Uuid,
    pub rows: Vec<LeaderboardRow>,
}

/// Query string of the winners route.
#[derive(Debug, Deserialize, IntoParams)]
pub struct WinnersQuery {
    /// Number of winners wanted; ties at the cut are all included.
    pub n: Option<usize>,
}

/// Winners of an exam, possibly more than requested when tied at the cut.
#[derive(Debug, Serialize, ToSchema)]
pub struct WinnersResponse {
    pub exam_id: Uuid,
    pub requested: usize,
    pub winners: Vec<LeaderboardRow>,
}
