/// Account registration, sign-in and password resets.
pub mod auth_service;
/// Contact form forwarding.
pub mod contact_service;
/// Per-subscriber exam countdown streams.
pub mod countdown_service;
/// Course viewer content management.
pub mod course_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Exam scheduling and retrieval.
pub mod exam_service;
/// Health check service.
pub mod health_service;
/// Leaderboards, winner selection and result publication.
pub mod leaderboard_service;
/// Transactional email dispatch.
pub mod mailer;
/// Published results.
pub mod result_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Background sweep of expired sessions.
pub mod session_janitor;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Answer submission and grading.
pub mod submission_service;
