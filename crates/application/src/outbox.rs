//! Notifications queued by a handler and delivered once its unit of work
//! has committed.

use domain::Email;

/// An email waiting for the surrounding transaction to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Email,
    pub subject: String,
    pub body: String,
}

/// Emails collected while a handler runs.
///
/// Discarded unsent when the unit of work rolls back or fails to commit.
#[derive(Debug, Default)]
pub struct Outbox {
    emails: Vec<OutgoingEmail>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an email for delivery after commit.
    pub fn push(&mut self, to: Email, subject: impl Into<String>, body: impl Into<String>) {
        self.emails.push(OutgoingEmail {
            to,
            subject: subject.into(),
            body: body.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn emails(&self) -> &[OutgoingEmail] {
        &self.emails
    }
}

impl IntoIterator for Outbox {
    type Item = OutgoingEmail;
    type IntoIter = std::vec::IntoIter<OutgoingEmail>;

    fn into_iter(self) -> Self::IntoIter {
        self.emails.into_iter()
    }
}
