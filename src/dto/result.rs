use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{ResultEntity, WinnerEntity},
    dto::{format_unix_ms, leaderboard::LeaderboardRow},
};

/// Published winners of an exam.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultView {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub exam_title: String,
    pub published_at: String,
    pub winners: Vec<LeaderboardRow>,
}

impl From<&ResultEntity> for ResultView {
    fn from(result: &ResultEntity) -> Self {
        Self {
            id: result.id,
            exam_id: result.exam_id,
            exam_title: result.exam_title.clone(),
            published_at: format_unix_ms(result.published_at_ms),
            winners: result.winners.iter().map(LeaderboardRow::from).collect(),
        }
    }
}

impl From<&WinnerEntity> for LeaderboardRow {
    fn from(winner: &WinnerEntity) -> Self {
        Self {
            rank: winner.rank,
            user_id: winner.user_id,
            display_name: winner.display_name.clone(),
            score: winner.score,
        }
    }
}

impl From<&LeaderboardRow> for WinnerEntity {
    fn from(row: &LeaderboardRow) -> Self {
        Self {
            rank: row.rank,
            user_id: row.user_id,
            display_name: row.display_name.clone(),
            score: row.score,
        }
    }
}
