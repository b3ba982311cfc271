//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dto::{exam::QuestionInput, parse_timestamp};

/// Rejects strings made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Accepts RFC 3339 timestamps such as `2024-05-01T10:00:00Z`.
pub fn validate_rfc3339(value: &str) -> Result<(), ValidationError> {
    if parse_timestamp(value).is_none() {
        let mut err = ValidationError::new("rfc3339");
        err.message = Some(format!("`{value}` is not an RFC 3339 timestamp").into());
        return Err(err);
    }
    Ok(())
}

/// The correct answer must point at one of the question's options.
pub fn validate_answer_index(question: &QuestionInput) -> Result<(), ValidationError> {
    if question.answer >= question.options.len() {
        let mut err = ValidationError::new("answer_out_of_range");
        err.message = Some(
            format!(
                "answer index {} is out of range for {} option(s)",
                question.answer,
                question.options.len()
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_timestamps() {
        assert!(validate_rfc3339("2024-05-01T10:00:00Z").is_ok());
        assert!(validate_rfc3339("2024-05-01T10:00:00.250+02:00").is_ok());
        assert!(validate_rfc3339("2024-05-01 10:00").is_err());
        assert!(validate_rfc3339("").is_err());
    }

    #[test]
    fn blank_strings() {
        assert!(validate_not_blank("Rust").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn answer_index_must_be_in_range() {
        let mut question = QuestionInput {
            prompt: "2 + 2?".into(),
            options: vec!["3".into(), "4".into()],
            answer: 1,
            points: 1,
        };
        assert!(validate_answer_index(&question).is_ok());
        question.answer = 2;
        assert!(validate_answer_index(&question).is_err());
    }
}
