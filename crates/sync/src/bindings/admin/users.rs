//! Admin account creation.

use async_trait::async_trait;
use folio_core::{Collection, Email};
use tracing::{info, warn};

use crate::auth::validate_password;
use crate::bindings::{Binding, Outcome};
use crate::client::SiteClient;
use crate::error::StoreError;

/// New account form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AdminDraft {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminDraft")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Creates further admin accounts from a signed-in session.
pub struct UsersAdmin {
    client: SiteClient,
    pub draft: AdminDraft,
}

impl UsersAdmin {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            draft: AdminDraft::default(),
        }
    }

    /// Create an account from the draft. The draft is cleared on success.
    pub async fn create_admin(&mut self) -> Outcome {
        let notifier = self.client.notifier();
        if let Err(e) = Email::parse(&self.draft.email) {
            notifier.error(format!("Please enter a valid email: {e}"));
            return Outcome::Rejected;
        }
        if let Err(e) = validate_password(&self.draft.password) {
            notifier.error(e.to_string());
            return Outcome::Rejected;
        }

        match self
            .client
            .auth()
            .sign_up(&self.draft.email, &self.draft.password)
            .await
        {
            Ok(user) => {
                info!(user = %user.email, "Admin account created");
                self.draft = AdminDraft::default();
                notifier.success("Admin account created successfully!");
                Outcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "Admin account creation failed");
                notifier.error(e.to_string());
                Outcome::Failed
            }
        }
    }
}

#[async_trait]
impl Binding for UsersAdmin {
    fn name(&self) -> &'static str {
        "admin-users"
    }

    fn watches(&self) -> &'static [Collection] {
        &[]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
