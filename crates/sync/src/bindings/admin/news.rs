//! News post management.

use async_trait::async_trait;
use folio_core::{Collection, NewsPost, NewsPostId, NewsPostInput};
use serde_json::json;

use crate::bindings::{Binding, Outcome, ValidationError, non_blank, required, settle};
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::store::{Direction, Query};

/// Asked before a post is deleted.
pub const DELETE_POST_PROMPT: &str = "Are you sure you want to delete this post?";

/// The create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub image_url: String,
    editing: Option<NewsPostId>,
}

impl NewsDraft {
    /// Post being edited, or `None` when creating.
    #[must_use]
    pub const fn editing(&self) -> Option<NewsPostId> {
        self.editing
    }

    /// Write payload, or the first missing field.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Required` if title or content is blank.
    pub fn validate(&self) -> Result<NewsPostInput, ValidationError> {
        Ok(NewsPostInput {
            title: required(&self.title, "Title")?,
            content: required(&self.content, "Content")?,
            excerpt: non_blank(&self.excerpt),
            image_url: non_blank(&self.image_url),
        })
    }
}

/// Every post, newest first.
pub struct NewsAdmin {
    client: SiteClient,
    posts: Vec<NewsPost>,
    pub draft: NewsDraft,
}

impl NewsAdmin {
    #[must_use]
    pub fn new(client: &SiteClient) -> Self {
        Self {
            client: client.clone(),
            posts: Vec::new(),
            draft: NewsDraft::default(),
        }
    }

    #[must_use]
    pub fn posts(&self) -> &[NewsPost] {
        &self.posts
    }

    fn find(&self, id: NewsPostId) -> Option<&NewsPost> {
        self.posts.iter().find(|post| post.id == id)
    }

    /// Seed the form from an existing post. Returns false if it is not in
    /// the snapshot.
    pub fn start_edit(&mut self, id: NewsPostId) -> bool {
        let Some(post) = self.find(id) else {
            return false;
        };
        self.draft = NewsDraft {
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone().unwrap_or_default(),
            image_url: post.image_url.clone().unwrap_or_default(),
            editing: Some(id),
        };
        true
    }

    pub fn reset_draft(&mut self) {
        self.draft = NewsDraft::default();
    }

    /// Create a post, or replace the one being edited.
    pub async fn submit(&mut self) -> Outcome {
        let client = self.client.clone();
        let input = match self.draft.validate() {
            Ok(input) => input,
            Err(e) => {
                client.notifier().error(e.to_string());
                return Outcome::Rejected;
            }
        };

        let table = client.table::<NewsPost>();
        let (result, success) = match self.draft.editing {
            Some(id) => (table.update(id, &input).await, "Post updated!"),
            None => (table.insert(&input).await.map(drop), "Post created!"),
        };
        if result.is_ok() {
            self.reset_draft();
        }
        settle(self, &client, result, success, "Failed to save post").await
    }

    pub async fn toggle_published(&mut self, id: NewsPostId) -> Outcome {
        let client = self.client.clone();
        let result = match self.find(id) {
            Some(post) => {
                client
                    .table::<NewsPost>()
                    .update(id, &json!({ "is_published": !post.is_published }))
                    .await
            }
            None => Err(StoreError::NotFound(format!("news post {id}"))),
        };
        settle(self, &client, result, "Status updated", "Failed to update status").await
    }

    pub async fn delete(&mut self, id: NewsPostId, confirm: impl FnOnce(&str) -> bool) -> Outcome {
        if !confirm(DELETE_POST_PROMPT) {
            return Outcome::Declined;
        }
        let client = self.client.clone();
        let result = client.table::<NewsPost>().delete(id).await;
        settle(self, &client, result, "Post deleted", "Failed to delete").await
    }
}

#[async_trait]
impl Binding for NewsAdmin {
    fn name(&self) -> &'static str {
        "admin-news"
    }

    fn watches(&self) -> &'static [Collection] {
        &[Collection::NewsPosts]
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        self.posts = self
            .client
            .table::<NewsPost>()
            .fetch(&Query::new().order_by("published_at", Direction::Descending))
            .await?;
        Ok(())
    }
}
