//! Transactional email dispatch. The delivery provider lives outside this
//! service; [`LogMailer`] writes outgoing mail to the log instead.

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tracing::info;

/// A message ready to be handed to the mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
}

/// Failure reported by a [`Mailer`].
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail provider rejected message to `{to}`: {reason}")]
    Rejected { to: String, reason: String },
}

/// Sends transactional email.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: OutgoingMail) -> BoxFuture<'static, Result<(), MailError>>;
}

/// [`Mailer`] that only records outgoing mail in the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: OutgoingMail) -> BoxFuture<'static, Result<(), MailError>> {
        info!(
            to = %mail.to,
            subject = %mail.subject,
            reply_to = mail.reply_to.as_deref().unwrap_or("-"),
            body_len = mail.body.len(),
            "dispatching mail"
        );
        futures::future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    /// Keeps every message it is asked to send; can be switched to failing.
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
        failing: AtomicBool,
    }

    impl RecordingMailer {
        pub(crate) fn sent(&self) -> Vec<OutgoingMail> {
            self.sent.lock().unwrap().clone()
        }

        pub(crate) fn fail_next_sends(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    impl Mailer for RecordingMailer {
        fn send(&self, mail: OutgoingMail) -> BoxFuture<'static, Result<(), MailError>> {
            let result = if self.failing.load(Ordering::SeqCst) {
                Err(MailError::Rejected {
                    to: mail.to,
                    reason: "provider offline".into(),
                })
            } else {
                self.sent.lock().unwrap().push(mail);
                Ok(())
            };
            futures::future::ready(result).boxed()
        }
    }

    #[tokio::test]
    async fn log_mailer_accepts_everything() {
        let mail = OutgoingMail {
            to: "someone@example.org".into(),
            subject: "hi".into(),
            body: "hello".into(),
            reply_to: None,
        };
        assert!(LogMailer.send(mail).await.is_ok());
    }
}
