use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        document::{Direction, Query},
        models::{SubmissionEntity, to_unix_ms},
    },
    dto::submission::{SubmissionView, SubmitAnswersRequest},
    error::ServiceError,
    services::exam_service::load_exam,
    state::{Session, SharedState, countdown::evaluate},
};

fn exam_query(exam_id: Uuid) -> Query {
    Query::new().where_eq("exam_id", exam_id.to_string())
}

/// Key of a user's submission for an exam. One key per pair keeps a user to
/// a single submission even under concurrent requests.
fn submission_id(exam_id: Uuid, user_id: Uuid) -> Uuid {
    Uuid::new_v5(&exam_id, user_id.as_bytes())
}

/// Submissions of an exam in hand-in order.
pub async fn submissions_for_exam(
    state: &SharedState,
    exam_id: Uuid,
) -> Result<Vec<SubmissionEntity>, ServiceError> {
    Ok(state
        .repository::<SubmissionEntity>()
        .await?
        .list(exam_query(exam_id).order_by("submitted_at_ms", Direction::Ascending))
        .await?)
}

/// Grade and store the signed-in user's answers.
///
/// Each user may submit once, between the exam's start and its end.
pub async fn submit(
    state: &SharedState,
    session: &Session,
    exam_id: Uuid,
    request: SubmitAnswersRequest,
) -> Result<SubmissionView, ServiceError> {
    let exam = load_exam(state, exam_id).await?;
    let now = state.clock().now();

    if !evaluate(exam.starts_at(), now).is_started() {
        return Err(ServiceError::InvalidState(format!(
            "exam {exam_id} has not started yet"
        )));
    }
    if exam.ends_at().is_some_and(|ends_at| now >= ends_at) {
        return Err(ServiceError::InvalidState(format!(
            "exam {exam_id} is closed"
        )));
    }
    if request.answers.len() != exam.questions.len() {
        return Err(ServiceError::InvalidInput(format!(
            "expected {} answer(s), got {}",
            exam.questions.len(),
            request.answers.len()
        )));
    }

    let submission = SubmissionEntity {
        id: submission_id(exam_id, session.user_id),
        exam_id,
        user_id: session.user_id,
        display_name: session.display_name.clone(),
        score: Some(exam.grade(&request.answers)),
        answers: request.answers,
        submitted_at_ms: to_unix_ms(now),
    };
    let created = state
        .repository::<SubmissionEntity>()
        .await?
        .insert(&submission)
        .await?;
    if !created {
        return Err(ServiceError::Conflict(format!(
            "answers for exam {exam_id} were already submitted"
        )));
    }
    info!(
        %exam_id,
        user_id = %session.user_id,
        score = submission.score,
        "submission recorded"
    );

    Ok(SubmissionView::from(&submission))
}

/// The signed-in user's submission for an exam.
pub async fn own_submission(
    state: &SharedState,
    session: &Session,
    exam_id: Uuid,
) -> Result<SubmissionView, ServiceError> {
    state
        .repository::<SubmissionEntity>()
        .await?
        .get(&submission_id(exam_id, session.user_id).to_string())
        .await?
        .map(|submission| SubmissionView::from(&submission))
        .ok_or_else(|| ServiceError::NotFound(format!("no submission for exam {exam_id}")))
}

/// Every submission of an exam, for administrators.
pub async fn list_submissions(
    state: &SharedState,
    exam_id: Uuid,
) -> Result<Vec<SubmissionView>, ServiceError> {
    load_exam(state, exam_id).await?;
    let submissions = submissions_for_exam(state, exam_id).await?;
    Ok(submissions.iter().map(SubmissionView::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::{
            auth_service::tests::{ADMIN_EMAIL, signed_up},
            exam_service::{create_exam, tests::exam_request},
        },
        state::tests::test_state,
    };
    use time::macros::datetime;

    fn answers(answers: Vec<Option<usize>>) -> SubmitAnswersRequest {
        SubmitAnswersRequest { answers }
    }

    #[tokio::test]
    async fn submission_rules() {
        let (state, _, clock) = test_state(
            AppConfig::default().with_admin_email(ADMIN_EMAIL),
            datetime!(2024-05-01 09:00 UTC),
        )
        .await;
        let admin = signed_up(&state, ADMIN_EMAIL, "Root").await;
        let ada = signed_up(&state, "ada@example.org", "Ada").await;
        let exam = create_exam(&state, &admin, exam_request("2024-05-01T10:00:00Z", Some(60)))
            .await
            .unwrap();
        let exam_id = exam.summary.id;

        let early = submit(&state, &ada, exam_id, answers(vec![Some(1), Some(0)])).await;
        assert!(matches!(early, Err(ServiceError::InvalidState(_))));

        clock.set(datetime!(2024-05-01 10:00 UTC));
        let short = submit(&state, &ada, exam_id, answers(vec![Some(1)])).await;
        assert!(matches!(short, Err(ServiceError::InvalidInput(_))));

        let accepted = submit(&state, &ada, exam_id, answers(vec![Some(1), Some(2)]))
            .await
            .unwrap();
        assert_eq!(accepted.score, Some(2));
        assert_eq!(accepted.display_name, "Ada");

        let twice = submit(&state, &ada, exam_id, answers(vec![Some(1), Some(0)])).await;
        assert!(matches!(twice, Err(ServiceError::Conflict(_))));

        let own = own_submission(&state, &ada, exam_id).await.unwrap();
        assert_eq!(own.id, accepted.id);

        clock.set(datetime!(2024-05-01 11:00 UTC));
        let bob = signed_up(&state, "bob@example.org", "Bob").await;
        let late = submit(&state, &bob, exam_id, answers(vec![Some(1), Some(0)])).await;
        assert!(matches!(late, Err(ServiceError::InvalidState(_))));
        assert!(matches!(
            own_submission(&state, &bob, exam_id).await,
            Err(ServiceError::NotFound(_))
        ));

        assert_eq!(list_submissions(&state, exam_id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_from_one_user_keep_a_single_entry() {
        let (state, _, _) = test_state(
            AppConfig::default().with_admin_email(ADMIN_EMAIL),
            datetime!(2024-05-01 09:00 UTC),
        )
        .await;
        let admin = signed_up(&state, ADMIN_EMAIL, "Root").await;
        let ada = signed_up(&state, "ada@example.org", "Ada").await;
        let exam = create_exam(&state, &admin, exam_request("2024-05-01T08:00:00Z", None))
            .await
            .unwrap();
        let exam_id = exam.summary.id;

        const ATTEMPTS: usize = 16;
        let barrier = std::sync::Arc::new(tokio::sync::Barrier::new(ATTEMPTS));
        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|_| {
                let state = state.clone();
                let ada = ada.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    submit(&state, &ada, exam_id, answers(vec![Some(1), Some(0)])).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert!(matches!(err, ServiceError::Conflict(_)), "{err}"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(list_submissions(&state, exam_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_exam_is_not_found() {
        let (state, _, _) = test_state(AppConfig::default(), datetime!(2024-05-01 09:00 UTC)).await;
        let ada = signed_up(&state, "ada@example.org", "Ada").await;
        let result = submit(&state, &ada, Uuid::new_v4(), answers(vec![])).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
