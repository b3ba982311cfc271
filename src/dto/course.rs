use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{CourseEntity, LessonEntity},
    dto::{format_unix_ms, validation::validate_not_blank},
};

/// Payload used to publish a course.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    #[validate(nested)]
    pub lessons: Vec<LessonInput>,
}

/// Partial update of a course. `lessons`, when present, replaces the whole list.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub lessons: Option<Vec<LessonInput>>,
}

/// A lesson backed by an embeddable video.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct LessonInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(url)]
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<LessonInput> for LessonEntity {
    fn from(input: LessonInput) -> Self {
        Self {
            title: input.title,
            video_url: input.video_url,
            notes: input.notes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonView {
    pub title: String,
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Course as shown in the course viewer.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub lessons: Vec<LessonView>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&CourseEntity> for CourseView {
    fn from(course: &CourseEntity) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            description: course.description.clone(),
            lessons: course
                .lessons
                .iter()
                .map(|lesson| LessonView {
                    title: lesson.title.clone(),
                    video_url: lesson.video_url.clone(),
                    notes: lesson.notes.clone(),
                })
                .collect(),
            created_at: format_unix_ms(course.created_at_ms),
            updated_at: format_unix_ms(course.updated_at_ms),
        }
    }
}
