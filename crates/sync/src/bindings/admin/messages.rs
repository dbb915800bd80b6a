//! Contact message inbox.

use async_trait::async_trait;
use folio_core::{Collection, ContactSubmission, SubmissionId};
use serde_json::json;

use crate::bindings::{Binding, Outcome, settle};
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::{Direction, Query};

/// Asked before a message is deleted.
pub const DELETE_MESSAGE_PROMPT: &str = "Are you sure you want to delete this message?";

/// Inbox filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadFilter {
    #[must_use]
    pub const fn admits(self, message: &ContactSubmission) -> bool {
        match self {
            Self::All => true,
            Self::Unread => !message.is_read,
            Self::Read => message.is_read,
        }
    }
}

impl std::str::FromStr for ReadFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            other => Err(format!("unknown filter '{other}' (expected all, unread or read)")),
        }
    }
}

/// Every contact submission, newest first.
pub struct MessagesAdmin {
    client: SiteClient,
    messages: Vec<ContactSubmission>,
    filter: ReadFilter,
}

impl MessagesAdmin {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            messages: Vec::new(),
            filter: ReadFilter::default(),
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ContactSubmission] {
        &self.messages
    }

    #[must_use]
    pub const fn filter(&self) -> ReadFilter {
        self.filter
    }

    /// Change the filter. Does not re-query.
    pub const fn set_filter(&mut self, filter: ReadFilter) {
        self.filter = filter;
    }

    /// Messages passing the current filter.
    #[must_use]
    pub fn visible(&self) -> Vec<&ContactSubmission> {
        self.messages
            .iter()
            .filter(|message| self.filter.admits(message))
            .collect()
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.is_read).count()
    }

    /// Flip a message between read and unread.
    pub async fn toggle_read(&mut self, id: SubmissionId) -> Outcome {
        let client = self.client.clone();
        let result = match self.messages.iter().find(|m| m.id == id) {
            Some(message) => {
                client
                    .table::<ContactSubmission>()
                    .update(id, &json!({ "is_read": !message.is_read }))
                    .await
            }
            None => Err(StoreError::NotFound(format!("message {id}"))),
        };
        settle(self, &client, result, "Status updated", "Failed to update status").await
    }

    pub async fn delete(&mut self, id: SubmissionId, confirm: impl FnOnce(&str) -> bool) -> Outcome {
        if !confirm(DELETE_MESSAGE_PROMPT) {
            return Outcome::Declined;
        }
        let client = self.client.clone();
        let result = client.table::<ContactSubmission>().delete(id).await;
        settle(self, &client, result, "Message deleted", "Failed to delete").await
    }
}

#[async_trait]
impl Binding for MessagesAdmin {
    fn name(&self) -> &'static str {
        "admin-messages"
    }

    fn watches(&self) -> &'static [Collection] {
        &[Collection::ContactSubmissions]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        self.messages = self
            .client
            .table::<ContactSubmission>()
            .fetch(&Query::new().order_by("created_at", Direction::Descending))
            .await?;
        Ok(())
    }
}
