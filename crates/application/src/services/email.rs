//! Email service trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use domain::Email;

use crate::error::ApplicationError;

/// A message handed to the email service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: Email,
    pub subject: String,
    pub body: String,
}

/// Trait for notifying employees by email.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), ApplicationError>;
}

#[async_trait]
impl<T: EmailService + ?Sized> EmailService for Arc<T> {
    async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), ApplicationError> {
        (**self).send(to, subject, body).await
    }
}

#[derive(Debug, Default)]
struct InMemoryEmailState {
    sent: Vec<SentEmail>,
    fail_on_send: bool,
}

/// In-memory email service that records every message.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmailService {
    state: Arc<RwLock<InMemoryEmailState>>,
}

impl InMemoryEmailService {
    /// Creates a new in-memory email service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every send until reset.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_send = fail;
    }

    /// Returns every message sent so far, oldest first.
    pub fn sent(&self) -> Vec<SentEmail> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .clone()
    }

    /// Returns the number of messages sent so far.
    pub fn sent_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .len()
    }
}

#[async_trait]
impl EmailService for InMemoryEmailService {
    async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), ApplicationError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if state.fail_on_send {
            return Err(ApplicationError::Notification(format!(
                "Mail server rejected message to {to}"
            )));
        }

        tracing::debug!(%to, subject, "email sent");
        state.sent.push(SentEmail {
            to: to.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
