use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{dao::repository::Record, state::leaderboard::Scored};

/// Convert a timestamp into the Unix milliseconds stored in records.
pub fn to_unix_ms(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Convert stored Unix milliseconds back into a timestamp.
pub fn from_unix_ms(ms: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// `starts_at + minutes`, or `None` when that falls outside the supported date range.
pub fn closing_time(starts_at: OffsetDateTime, minutes: u32) -> Option<OffsetDateTime> {
    starts_at.checked_add(time::Duration::minutes(i64::from(minutes)))
}

/// Authorization level of an account.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

/// Account able to sign in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    pub id: Uuid,
    /// Lowercased email, unique across accounts.
    pub email: String,
    pub display_name: String,
    /// Argon2 hash in PHC string format.
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    pub created_at_ms: i64,
}

/// Timed exam made of multiple-choice questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExamEntity {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Moment the exam opens, in Unix milliseconds.
    pub starts_at_ms: i64,
    /// How long submissions stay open once started. `None` keeps them open.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub questions: Vec<QuestionEntity>,
    pub created_by: Uuid,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl ExamEntity {
    pub fn starts_at(&self) -> OffsetDateTime {
        from_unix_ms(self.starts_at_ms)
    }

    /// Moment submissions close, if the exam has a duration.
    ///
    /// A closing time past the last representable date counts as never closing.
    pub fn ends_at(&self) -> Option<OffsetDateTime> {
        closing_time(self.starts_at(), self.duration_minutes?)
    }

    /// Highest score reachable on this exam.
    pub fn max_score(&self) -> i64 {
        self.questions.iter().map(|q| i64::from(q.points)).sum()
    }

    /// Score a set of answers; unanswered or out-of-range answers earn nothing.
    pub fn grade(&self, answers: &[Option<usize>]) -> i64 {
        self.questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| **answer == Some(question.answer))
            .map(|(question, _)| i64::from(question.points))
            .sum()
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index of the correct option.
    pub answer: usize,
    pub points: u32,
}

/// Answers handed in by one user for one exam.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionEntity {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub answers: Vec<Option<usize>>,
    #[serde(default)]
    pub score: Option<i64>,
    pub submitted_at_ms: i64,
}

impl Scored for SubmissionEntity {
    fn score(&self) -> Option<i64> {
        self.score
    }
}

/// Published snapshot of an exam's winners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultEntity {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub exam_title: String,
    pub published_at_ms: i64,
    pub published_by: Uuid,
    pub winners: Vec<WinnerEntity>,
}

/// One line of a published result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinnerEntity {
    pub rank: usize,
    pub user_id: Uuid,
    pub display_name: String,
    pub score: i64,
}

/// Course shown in the course viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseEntity {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lessons: Vec<LessonEntity>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Lesson of a course, backed by an embeddable video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LessonEntity {
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for UserEntity {
    const COLLECTION: &'static str = "users";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl Record for ExamEntity {
    const COLLECTION: &'static str = "exams";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl Record for SubmissionEntity {
    const COLLECTION: &'static str = "submissions";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl Record for ResultEntity {
    const COLLECTION: &'static str = "results";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl Record for CourseEntity {
    const COLLECTION: &'static str = "courses";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn exam(duration_minutes: Option<u32>) -> ExamEntity {
        ExamEntity {
            id: Uuid::new_v4(),
            title: "Rust basics".into(),
            description: String::new(),
            starts_at_ms: to_unix_ms(datetime!(2024-05-01 10:00:00 UTC)),
            duration_minutes,
            questions: vec![
                QuestionEntity {
                    prompt: "Borrow checker?".into(),
                    options: vec!["yes".into(), "no".into()],
                    answer: 0,
                    points: 2,
                },
                QuestionEntity {
                    prompt: "Ownership moves?".into(),
                    options: vec!["no".into(), "yes".into(), "maybe".into()],
                    answer: 1,
                    points: 3,
                },
            ],
            created_by: Uuid::new_v4(),
            created_at_ms: 0,
            updated_at_ms: 0,
        }
    }

    #[test]
    fn unix_ms_round_trip_keeps_millisecond_precision() {
        let at = datetime!(2024-05-01 10:00:00.123 UTC);
        assert_eq!(from_unix_ms(to_unix_ms(at)), at);
    }

    #[test]
    fn grading_counts_only_correct_answers() {
        let exam = exam(None);
        assert_eq!(exam.grade(&[Some(0), Some(1)]), 5);
        assert_eq!(exam.grade(&[Some(1), Some(1)]), 3);
        assert_eq!(exam.grade(&[None, Some(7)]), 0);
        assert_eq!(exam.max_score(), 5);
    }

    #[test]
    fn closing_time_past_the_last_date_never_closes() {
        let mut exam = exam(Some(120));
        exam.starts_at_ms = to_unix_ms(datetime!(9999-12-31 23:00:00 UTC));
        assert_eq!(exam.ends_at(), None);
        assert_eq!(exam.max_score(), 5);
    }

    #[test]
    fn ends_at_follows_duration() {
        assert_eq!(exam(None).ends_at(), None);
        assert_eq!(
            exam(Some(90)).ends_at(),
            Some(datetime!(2024-05-01 11:30:00 UTC))
        );
    }
}
