use futures::{Stream, StreamExt, stream::BoxStream};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    services::exam_service::load_exam,
    state::{SharedState, countdown::Countdown, ticker::CountdownTicker},
};

/// Stream the countdown of an exam, one item per tick, ending with the
/// first `Started` value.
///
/// The stream owns its ticker: dropping the stream stops re-evaluation.
pub async fn open_countdown(
    state: &SharedState,
    exam_id: Uuid,
) -> Result<BoxStream<'static, Countdown>, ServiceError> {
    let exam = load_exam(state, exam_id).await?;
    let ticker = CountdownTicker::spawn(
        exam.starts_at(),
        state.config().countdown_tick(),
        state.clock(),
    );
    Ok(countdown_stream(ticker).boxed())
}

fn countdown_stream(ticker: CountdownTicker) -> impl Stream<Item = Countdown> + Send + 'static {
    async_stream::stream! {
        let mut updates = ticker.subscribe();
        while updates.changed().await.is_ok() {
            let countdown = updates.borrow_and_update().clone();
            let started = countdown.is_started();
            yield countdown;
            if started {
                break;
            }
        }
        drop(ticker);
    }
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
        state::{countdown::Phase, tests::test_state},
    };
    use futures::StreamExt;
    use time::macros::datetime;

    #[tokio::test(start_paused = true)]
    async fn streams_until_the_exam_starts() {
        let (state, _, clock) = test_state(
            AppConfig::default().with_admin_email(ADMIN_EMAIL),
            datetime!(2024-05-01 09:59:58 UTC),
        )
        .await;
        let admin = signed_up(&state, ADMIN_EMAIL, "Root").await;
        let exam = create_exam(&state, &admin, exam_request("2024-05-01T10:00:00Z", None))
            .await
            .unwrap();

        let stream = open_countdown(&state, exam.summary.id).await.unwrap();
        futures::pin_mut!(stream);

        assert_eq!(stream.next().await.unwrap().display, "0H 0M 2S");
        clock.advance(time::Duration::seconds(1));
        assert_eq!(stream.next().await.unwrap().display, "0H 0M 1S");
        clock.advance(time::Duration::seconds(1));
        assert_eq!(stream.next().await.unwrap().phase, Phase::Started);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn started_exam_yields_a_single_item() {
        let (state, _, _) = test_state(
            AppConfig::default().with_admin_email(ADMIN_EMAIL),
            datetime!(2024-05-02 09:00 UTC),
        )
        .await;
        let admin = signed_up(&state, ADMIN_EMAIL, "Root").await;
        let exam = create_exam(&state, &admin, exam_request("2024-05-01T10:00:00Z", None))
            .await
            .unwrap();

        let items: Vec<Countdown> = open_countdown(&state, exam.summary.id)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_started());
    }

    #[tokio::test]
    async fn unknown_exam_is_not_found() {
        let (state, _, _) =
            test_state(AppConfig::default(), datetime!(2024-05-01 09:00 UTC)).await;
        assert!(matches!(
            open_countdown(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
