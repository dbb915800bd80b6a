//! Contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Collection, Email, SubmissionId};

/// A message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: SubmissionId,
    pub name: String,
    /// Stored as typed; not re-validated on read.
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for ContactSubmission {
    const COLLECTION: Collection = Collection::ContactSubmissions;
}

/// Insert payload from the contact form. `is_read` takes the store default.
#[derive(Debug, Clone, Serialize)]
pub struct NewContactSubmission {
    pub name: String,
    pub email: Email,
    pub subject: Option<String>,
    pub message: String,
}
