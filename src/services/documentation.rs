use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Exam Hall Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::auth::sign_up,
        crate::routes::auth::sign_in,
        crate::routes::auth::sign_out,
        crate::routes::auth::me,
        crate::routes::auth::request_password_reset,
        crate::routes::auth::confirm_password_reset,
        crate::routes::exams::list_exams,
        crate::routes::exams::get_exam,
        crate::routes::exams::countdown,
        crate::routes::exams::leaderboard,
        crate::routes::exams::winners,
        crate::routes::exams::submit_answers,
        crate::routes::exams::own_submission,
        crate::routes::results::list_results,
        crate::routes::results::get_result,
        crate::routes::courses::list_courses,
        crate::routes::courses::get_course,
        crate::routes::contact::send_message,
        crate::routes::admin::create_exam,
        crate::routes::admin::get_exam,
        crate::routes::admin::update_exam,
        crate::routes::admin::delete_exam,
        crate::routes::admin::list_submissions,
        crate::routes::admin::publish_results,
        crate::routes::admin::create_course,
        crate::routes::admin::update_course,
        crate::routes::admin::delete_course,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::health::StorageHealth,
            crate::dto::auth::SignUpRequest,
            crate::dto::auth::SignInRequest,
            crate::dto::auth::PasswordResetRequest,
            crate::dto::auth::PasswordResetConfirm,
            crate::dto::auth::UserRole,
            crate::dto::auth::UserProfile,
            crate::dto::auth::AuthResponse,
            crate::dto::auth::ActionResponse,
            crate::dto::exam::CreateExamRequest,
            crate::dto::exam::QuestionInput,
            crate::dto::exam::UpdateExamRequest,
            crate::dto::exam::ExamSummary,
            crate::dto::exam::QuestionView,
            crate::dto::exam::ExamDetail,
            crate::dto::submission::SubmitAnswersRequest,
            crate::dto::submission::SubmissionView,
            crate::dto::leaderboard::LeaderboardRow,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::leaderboard::WinnersResponse,
            crate::dto::result::ResultView,
            crate::dto::course::CreateCourseRequest,
            crate::dto::course::UpdateCourseRequest,
            crate::dto::course::LessonInput,
            crate::dto::course::LessonView,
            crate::dto::course::CourseView,
            crate::dto::contact::ContactRequest,
            crate::state::countdown::Countdown,
            crate::state::countdown::Phase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "auth", description = "Accounts, sessions, and password resets"),
        (name = "exams", description = "Exams, countdowns, submissions, and leaderboards"),
        (name = "results", description = "Published exam results"),
        (name = "courses", description = "Course viewer"),
        (name = "contact", description = "Contact form"),
        (name = "admin", description = "Administrator-only management"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/auth/sign-up",
            "/exams/{id}/countdown",
            "/exams/{id}/winners",
            "/admin/exams/{id}/results",
            "/contact",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
