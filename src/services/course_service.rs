use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        document::{Direction, Query},
        models::{CourseEntity, LessonEntity, to_unix_ms},
    },
    dto::course::{CourseView, CreateCourseRequest, UpdateCourseRequest},
    error::ServiceError,
    state::SharedState,
};

#[derive(Serialize)]
struct CoursePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lessons: Option<Vec<LessonEntity>>,
    updated_at_ms: i64,
}

/// Every course, oldest first.
pub async fn list_courses(state: &SharedState) -> Result<Vec<CourseView>, ServiceError> {
    let courses = state
        .repository::<CourseEntity>()
        .await?
        .list(Query::new().order_by("created_at_ms", Direction::Ascending))
        .await?;
    Ok(courses.iter().map(CourseView::from).collect())
}

pub async fn get_course(state: &SharedState, course_id: Uuid) -> Result<CourseView, ServiceError> {
    state
        .repository::<CourseEntity>()
        .await?
        .get(&course_id.to_string())
        .await?
        .map(|course| CourseView::from(&course))
        .ok_or_else(|| ServiceError::NotFound(format!("course {course_id} not found")))
}

pub async fn create_course(
    state: &SharedState,
    request: CreateCourseRequest,
) -> Result<CourseView, ServiceError> {
    let now_ms = to_unix_ms(state.clock().now());
    let course = CourseEntity {
        id: Uuid::new_v4(),
        title: request.title.trim().to_string(),
        description: request.description,
        lessons: request.lessons.into_iter().map(Into::into).collect(),
        created_at_ms: now_ms,
        updated_at_ms: now_ms,
    };
    state.repository::<CourseEntity>().await?.put(&course).await?;
    info!(course_id = %course.id, lessons = course.lessons.len(), "course created");
    Ok(CourseView::from(&course))
}

/// Merge the provided fields into a course.
pub async fn update_course(
    state: &SharedState,
    course_id: Uuid,
    request: UpdateCourseRequest,
) -> Result<CourseView, ServiceError> {
    let patch = CoursePatch {
        title: request.title.map(|title| title.trim().to_string()),
        description: request.description,
        lessons: request
            .lessons
            .map(|lessons| lessons.into_iter().map(Into::into).collect()),
        updated_at_ms: to_unix_ms(state.clock().now()),
    };
    let courses = state.repository::<CourseEntity>().await?;
    if !courses.update(&course_id.to_string(), &patch).await? {
        return Err(ServiceError::NotFound(format!(
            "course {course_id} not found"
        )));
    }
    info!(%course_id, "course updated");
    get_course(state, course_id).await
}

pub async fn delete_course(state: &SharedState, course_id: Uuid) -> Result<(), ServiceError> {
    let deleted = state
        .repository::<CourseEntity>()
        .await?
        .delete(&course_id.to_string())
        .await?;
    if !deleted {
        return Err(ServiceError::NotFound(format!(
            "course {course_id} not found"
        )));
    }
    info!(%course_id, "course deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dto::course::LessonInput, state::tests::test_state};
    use time::macros::datetime;

    fn lesson(title: &str) -> LessonInput {
        LessonInput {
            title: title.into(),
            video_url: format!("https://video.example.org/{title}"),
            notes: None,
        }
    }

    #[tokio::test]
    async fn course_lifecycle() {
        let (state, _, clock) =
            test_state(AppConfig::default(), datetime!(2024-05-01 09:00 UTC)).await;
        let created = create_course(
            &state,
            CreateCourseRequest {
                title: " Ownership ".into(),
                description: "Moves and borrows".into(),
                lessons: vec![lesson("intro")],
            },
        )
        .await
        .unwrap();
        assert_eq!(created.title, "Ownership");

        clock.advance(time::Duration::minutes(5));
        let updated = update_course(
            &state,
            created.id,
            UpdateCourseRequest {
                lessons: Some(vec![lesson("intro"), lesson("borrowing")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Ownership");
        assert_eq!(updated.lessons.len(), 2);
        assert_ne!(updated.updated_at, updated.created_at);

        assert_eq!(list_courses(&state).await.unwrap().len(), 1);
        delete_course(&state, created.id).await.unwrap();
        assert!(matches!(
            get_course(&state, created.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_course(&state, created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
