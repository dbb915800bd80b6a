//! Public contact form.

use folio_core::{ContactSubmission, Email, NewContactSubmission};
use tracing::{info, warn};

use super::{Outcome, ValidationError, non_blank, required};
use crate::client::SiteClient;

const SENT: &str = "Message sent successfully! I'll get back to you soon.";
const SEND_FAILED: &str = "Failed to send message. Please try again.";

/// What the visitor has typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactDraft {
    /// Insert payload, or the first invalid field.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if name, email or message is blank, or the
    /// email is malformed.
    pub fn validate(&self) -> Result<NewContactSubmission, ValidationError> {
        let name = required(&self.name, "Name")?;
        let email = Email::parse(&self.email)?;
        let message = required(&self.message, "Message")?;
        Ok(NewContactSubmission {
            name,
            email,
            subject: non_blank(&self.subject),
            message,
        })
    }
}

/// The contact form. Holds no snapshot; it only writes.
pub struct ContactForm {
    client: SiteClient,
    pub draft: ContactDraft,
}

impl ContactForm {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            draft: ContactDraft::default(),
        }
    }

    /// Send the draft. The draft is cleared only once the message is stored.
    pub async fn submit(&mut self) -> Outcome {
        let notifier = self.client.notifier();
        let submission = match self.draft.validate() {
            Ok(submission) => submission,
            Err(e) => {
                notifier.error(e.to_string());
                return Outcome::Rejected;
            }
        };

        match self
            .client
            .table::<ContactSubmission>()
            .insert(&submission)
            .await
        {
            Ok(stored) => {
                info!(submission = %stored.id, "Contact message received");
                self.draft = ContactDraft::default();
                notifier.success(SENT);
                Outcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "Failed to store contact message");
                notifier.error(SEND_FAILED);
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use folio_core::Collection;

    use super::*;
    use crate::bindings::testing::fixture;
    use crate::notify::{Notice, NoticeLevel};

    fn draft() -> ContactDraft {
        ContactDraft {
            name: "Fan".to_owned(),
            email: "fan@example.com".to_owned(),
            subject: "  ".to_owned(),
            message: "Love the new track".to_owned(),
        }
    }

    #[test]
    fn test_blank_subject_is_absent() {
        let submission = draft().validate().unwrap();
        assert_eq!(submission.subject, None);
    }

    #[test]
    fn test_required_fields() {
        let mut missing = draft();
        missing.message = "\n".to_owned();
        assert_eq!(missing.validate().unwrap_err(), ValidationError::Required("Message"));

        let mut bad_email = draft();
        bad_email.email = "fan-at-example.com".to_owned();
        assert!(matches!(bad_email.validate().unwrap_err(), ValidationError::Email(_)));
    }

    #[tokio::test]
    async fn test_submit_clears_draft() {
        let (client, services, notices) = fixture();
        let mut form = ContactForm::new(&client);
        form.draft = draft();

        assert_eq!(form.submit().await, Outcome::Applied);
        assert_eq!(form.draft, ContactDraft::default());
        assert_eq!(services.store.len(Collection::ContactSubmissions), 1);
        assert_eq!(notices.last(), Some(Notice::success(SENT)));
    }

    #[tokio::test]
    async fn test_invalid_draft_sends_nothing() {
        let (client, services, notices) = fixture();
        let mut form = ContactForm::new(&client);
        form.draft = ContactDraft {
            name: String::new(),
            ..draft()
        };

        assert_eq!(form.submit().await, Outcome::Rejected);
        assert!(services.store.is_empty(Collection::ContactSubmissions));
        assert_eq!(notices.messages(NoticeLevel::Error), ["Name is required"]);
        assert_eq!(form.draft.message, "Love the new track");
    }
}
