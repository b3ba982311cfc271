use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{ResultEntity, WinnerEntity, to_unix_ms},
    dto::{
        leaderboard::{LeaderboardResponse, LeaderboardRow, WinnersResponse},
        result::ResultView,
    },
    error::ServiceError,
    services::{exam_service::load_exam, sse_events, submission_service::submissions_for_exam},
    state::{
        Session, SharedState,
        countdown::evaluate,
        leaderboard::{rank, select_winners},
    },
};

/// Rank every participant of an exam.
pub async fn leaderboard(
    state: &SharedState,
    exam_id: Uuid,
) -> Result<LeaderboardResponse, ServiceError> {
    load_exam(state, exam_id).await?;
    let submissions = submissions_for_exam(state, exam_id).await?;
    let rows = rank(&submissions)
        .into_iter()
        .map(LeaderboardRow::from)
        .collect();
    Ok(LeaderboardResponse { exam_id, rows })
}

async fn winner_rows(
    state: &SharedState,
    exam_id: Uuid,
    n: usize,
) -> Result<Vec<LeaderboardRow>, ServiceError> {
    let submissions = submissions_for_exam(state, exam_id).await?;
    let winners = select_winners(&submissions, n);
    // Winners are a prefix of the ranking, so ranking them alone keeps the ranks.
    Ok(rank(&winners)
        .into_iter()
        .map(LeaderboardRow::from)
        .collect())
}

/// Select the top `n` participants (configured default when `None`), ties at the cut included.
pub async fn winners(
    state: &SharedState,
    exam_id: Uuid,
    n: Option<usize>,
) -> Result<WinnersResponse, ServiceError> {
    load_exam(state, exam_id).await?;
    let requested = n.unwrap_or_else(|| state.config().winner_count());
    Ok(WinnersResponse {
        exam_id,
        requested,
        winners: winner_rows(state, exam_id, requested).await?,
    })
}

/// Snapshot the current winners of an exam and announce them.
pub async fn publish_results(
    state: &SharedState,
    admin: &Session,
    exam_id: Uuid,
) -> Result<ResultView, ServiceError> {
    let exam = load_exam(state, exam_id).await?;
    let now = state.clock().now();
    if !evaluate(exam.starts_at(), now).is_started() {
        return Err(ServiceError::InvalidState(format!(
            "exam {exam_id} has not started yet"
        )));
    }

    let rows = winner_rows(state, exam_id, state.config().winner_count()).await?;
    let result = ResultEntity {
        id: Uuid::new_v4(),
        exam_id,
        exam_title: exam.title.clone(),
        published_at_ms: to_unix_ms(now),
        published_by: admin.user_id,
        winners: rows.iter().map(WinnerEntity::from).collect(),
    };
    state.repository::<ResultEntity>().await?.put(&result).await?;
    info!(%exam_id, result_id = %result.id, winners = result.winners.len(), "results published");

    let view = ResultView::from(&result);
    sse_events::broadcast_result_published(state, view.clone());
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::submission::SubmitAnswersRequest,
        services::{
            auth_service::tests::{ADMIN_EMAIL, signed_up},
            exam_service::{create_exam, tests::exam_request},
            submission_service::submit,
        },
        state::tests::test_state,
    };
    use time::macros::datetime;

    #[tokio::test]
    async fn ranks_selects_and_publishes() {
        let config = AppConfig::from_json(r#"{"winner_count": 2}"#)
            .unwrap()
            .with_admin_email(ADMIN_EMAIL);
        let (state, _, clock) = test_state(config, datetime!(2024-05-01 09:00 UTC)).await;
        let admin = signed_up(&state, ADMIN_EMAIL, "Root").await;
        let exam = create_exam(&state, &admin, exam_request("2024-05-01T10:00:00Z", None))
            .await
            .unwrap();
        let exam_id = exam.summary.id;

        let early = publish_results(&state, &admin, exam_id).await;
        assert!(matches!(early, Err(ServiceError::InvalidState(_))));

        clock.set(datetime!(2024-05-01 10:00 UTC));
        // Scores: ada 5, bob 2, cy 2, dee 0.
        for (email, name, given) in [
            ("ada@example.org", "Ada", vec![Some(1), Some(0)]),
            ("bob@example.org", "Bob", vec![Some(1), None]),
            ("cy@example.org", "Cy", vec![Some(1), Some(2)]),
            ("dee@example.org", "Dee", vec![None, None]),
        ] {
            let session = signed_up(&state, email, name).await;
            clock.advance(time::Duration::seconds(1));
            submit(&state, &session, exam_id, SubmitAnswersRequest { answers: given })
                .await
                .unwrap();
        }

        let board = leaderboard(&state, exam_id).await.unwrap();
        let summary: Vec<(usize, &str, i64)> = board
            .rows
            .iter()
            .map(|row| (row.rank, row.display_name.as_str(), row.score))
            .collect();
        assert_eq!(
            summary,
            vec![(1, "Ada", 5), (2, "Bob", 2), (2, "Cy", 2), (4, "Dee", 0)]
        );

        let default_winners = winners(&state, exam_id, None).await.unwrap();
        assert_eq!(default_winners.requested, 2);
        assert_eq!(default_winners.winners.len(), 3);
        assert!(winners(&state, exam_id, Some(0)).await.unwrap().winners.is_empty());
        assert_eq!(winners(&state, exam_id, Some(10)).await.unwrap().winners.len(), 4);

        let mut events = state.public_sse().subscribe();
        let published = publish_results(&state, &admin, exam_id).await.unwrap();
        assert_eq!(published.winners.len(), 3);
        assert_eq!(published.exam_title, "Rust basics");
        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("result.published"));
    }

    #[tokio::test]
    async fn empty_exam_has_empty_leaderboard() {
        let (state, _, _) = test_state(
            AppConfig::default().with_admin_email(ADMIN_EMAIL),
            datetime!(2024-05-01 09:00 UTC),
        )
        .await;
        let admin = signed_up(&state, ADMIN_EMAIL, "Root").await;
        let exam = create_exam(&state, &admin, exam_request("2024-05-01T08:00:00Z", None))
            .await
            .unwrap();
        let board = leaderboard(&state, exam.summary.id).await.unwrap();
        assert!(board.rows.is_empty());
        let winners = winners(&state, exam.summary.id, None).await.unwrap();
        assert!(winners.winners.is_empty());
    }
}
