//! Blog post model and publication workflow.
//!
//! Posts move through a strict linear state machine:
//! Draft -> Submitted -> Approved -> Published. Transitions verify the
//! precondition status and reject anything else.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    /// Being written by its author.
    Draft,
    /// Submitted for editorial review.
    Submitted,
    /// Approved by an editor, awaiting publication.
    Approved,
    /// Publicly visible.
    Published,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Published => "Published",
        };
        f.write_str(s)
    }
}

/// Errors raised by workflow transitions.
///
/// Distinct from not-found conditions: a transition on a post in the wrong
/// status is a domain error, not a missing entity.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The post is not in the status the transition requires.
    #[error("cannot {action} post: status is {actual}, expected {expected}")]
    InvalidTransition {
        /// The attempted transition.
        action: &'static str,
        /// The status the transition requires.
        expected: PostStatus,
        /// The post's actual status.
        actual: PostStatus,
    },
}

/// A blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier.
    pub id: Uuid,
    /// Post title.
    pub title: String,
    /// URL slug (unique).
    pub slug: String,
    /// Post body.
    pub content: String,
    /// Subject identifier of the author.
    pub author_id: String,
    /// Publication status.
    pub status: PostStatus,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Creates a new draft post.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            slug: slug.into(),
            content: content.into(),
            author_id: author_id.into(),
            status: PostStatus::Draft,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Submits a draft for review.
    ///
    /// ## Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the post is in
    /// `Draft` status.
    pub fn submit(&mut self) -> Result<(), WorkflowError> {
        self.transition("submit", PostStatus::Draft, PostStatus::Submitted)
    }

    /// Approves a submitted post.
    ///
    /// ## Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the post is in
    /// `Submitted` status.
    pub fn approve(&mut self) -> Result<(), WorkflowError> {
        self.transition("approve", PostStatus::Submitted, PostStatus::Approved)
    }

    /// Publishes an approved post.
    ///
    /// ## Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the post is in
    /// `Approved` status.
    pub fn publish(&mut self) -> Result<(), WorkflowError> {
        self.transition("publish", PostStatus::Approved, PostStatus::Published)
    }

    fn transition(
        &mut self,
        action: &'static str,
        expected: PostStatus,
        next: PostStatus,
    ) -> Result<(), WorkflowError> {
        if self.status != expected {
            return Err(WorkflowError::InvalidTransition {
                action,
                expected,
                actual: self.status,
            });
        }
        self.status = next;
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Post {
        Post::new("Title", "title", "body", "u1")
    }

    #[test]
    fn full_workflow_succeeds_in_order() {
        let mut post = draft();

        post.submit().unwrap();
        assert_eq!(post.status, PostStatus::Submitted);

        post.approve().unwrap();
        assert_eq!(post.status, PostStatus::Approved);

        post.publish().unwrap();
        assert_eq!(post.status, PostStatus::Published);
    }

    #[test]
    fn submit_requires_draft() {
        let mut post = draft();
        post.submit().unwrap();

        let err = post.submit().unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition {
                expected: PostStatus::Draft,
                actual: PostStatus::Submitted,
                ..
            }
        ));
    }

    #[test]
    fn approve_requires_submitted() {
        let mut post = draft();

        assert!(post.approve().is_err());

        post.submit().unwrap();
        assert!(post.approve().is_ok());
    }

    #[test]
    fn publish_requires_approved() {
        let mut post = draft();
        assert!(post.publish().is_err());

        post.submit().unwrap();
        assert!(post.publish().is_err());

        post.approve().unwrap();
        assert!(post.publish().is_ok());
    }

    #[test]
    fn no_reverse_transitions() {
        let mut post = draft();
        post.submit().unwrap();
        post.approve().unwrap();
        post.publish().unwrap();

        assert!(post.submit().is_err());
        assert!(post.approve().is_err());
        assert!(post.publish().is_err());
    }
}
