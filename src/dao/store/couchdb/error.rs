use reqwest::{Method, StatusCode};
use thiserror::Error;

pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures of the CouchDB backend. `target` is the database or document path
/// a request was addressed to.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("CouchDB is not configured: `{var}` is unset")]
    MissingEnvVar { var: &'static str },
    #[error("could not build the CouchDB HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("{method} {target} never reached CouchDB")]
    Transport {
        method: Method,
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {target} was answered with {status}")]
    Rejected {
        method: Method,
        target: String,
        status: StatusCode,
    },
    #[error("unreadable CouchDB answer for {target}")]
    Decode {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB document `{id}` in `{collection}` is not an object")]
    NotAnObject { collection: &'static str, id: String },
}

impl CouchDaoError {
    pub(super) fn rejected(method: Method, target: impl Into<String>, status: StatusCode) -> Self {
        Self::Rejected {
            method,
            target: target.into(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_names_the_request() {
        let err = CouchDaoError::rejected(Method::PUT, "exams::42", StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "PUT exams::42 was answered with 403 Forbidden");
    }
}
