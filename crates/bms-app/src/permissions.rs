//! Post permission policies.
//!
//! Pure, stateless predicates over a post and the requesting principal.
//! Role claims are the only identity input; post status gates the workflow
//! transitions.

use bms_identity::Principal;
use bms_model::{Post, PostStatus};

/// Full administrative access.
pub const ADMIN_ROLE: &str = "Admin";
/// Writes and edits own posts.
pub const AUTHOR_ROLE: &str = "Author";
/// Approves and publishes posts.
pub const EDITOR_ROLE: &str = "Editor";
/// Read-only access.
pub const READER_ROLE: &str = "Reader";

/// Roles that see every post regardless of status.
pub const ELEVATED_ROLES: [&str; 3] = [ADMIN_ROLE, AUTHOR_ROLE, EDITOR_ROLE];

/// Whether the principal may view posts in any status.
#[must_use]
pub fn can_view_any_post(user: &Principal) -> bool {
    ELEVATED_ROLES.iter().any(|role| user.is_in_role(role))
}

/// Whether the principal may edit the post.
///
/// Admins edit anything; authors edit only their own posts, matched by the
/// subject identifier claim.
#[must_use]
pub fn can_edit_post(post: &Post, user: &Principal) -> bool {
    if user.is_in_role(ADMIN_ROLE) {
        return true;
    }

    let user_id = user.subject().unwrap_or_default();
    user.is_in_role(AUTHOR_ROLE) && post.author_id == user_id
}

/// Whether the principal may submit the post for review.
#[must_use]
pub fn can_submit_post(post: &Post, user: &Principal) -> bool {
    can_edit_post(post, user) && post.status == PostStatus::Draft
}

/// Whether the principal may approve the post.
#[must_use]
pub fn can_approve_post(post: &Post, user: &Principal) -> bool {
    (user.is_in_role(ADMIN_ROLE) || user.is_in_role(EDITOR_ROLE))
        && post.status == PostStatus::Submitted
}

/// Whether the principal may publish the post.
#[must_use]
pub fn can_publish_post(post: &Post, user: &Principal) -> bool {
    (user.is_in_role(ADMIN_ROLE) || user.is_in_role(EDITOR_ROLE))
        && post.status == PostStatus::Approved
}

/// Whether the post is visible to the principal.
///
/// Elevated roles see everything; everyone else (readers and anonymous
/// visitors included) sees only published and approved posts.
#[must_use]
pub fn is_post_visible(post: &Post, user: &Principal) -> bool {
    if can_view_any_post(user) {
        return true;
    }

    matches!(post.status, PostStatus::Published | PostStatus::Approved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bms_identity::{claims, Claim};

    fn principal(subject: &str, roles: &[&str]) -> Principal {
        let mut claim_list = vec![Claim::new(claims::SUBJECT, subject)];
        for role in roles {
            claim_list.push(Claim::new(claims::ROLE, *role));
        }
        Principal::new(claim_list)
    }

    fn post_by(author: &str) -> Post {
        Post::new("Title", "title", "body", author)
    }

    #[test]
    fn author_edits_only_own_drafts() {
        let author = principal("u1", &[AUTHOR_ROLE]);
        let own = post_by("u1");
        let other = post_by("u2");

        assert!(can_edit_post(&own, &author));
        assert!(!can_edit_post(&other, &author));
        assert!(can_submit_post(&own, &author));
        assert!(!can_approve_post(&own, &author));
        assert!(!can_approve_post(&other, &author));
    }

    #[test]
    fn admin_edits_anything() {
        let admin = principal("admin", &[ADMIN_ROLE]);
        let post = post_by("someone-else");

        assert!(can_edit_post(&post, &admin));
        assert!(can_submit_post(&post, &admin));
    }

    #[test]
    fn approve_and_publish_follow_status() {
        let editor = principal("e1", &[EDITOR_ROLE]);
        let mut post = post_by("u1");

        assert!(!can_approve_post(&post, &editor));
        post.submit().unwrap();
        assert!(can_approve_post(&post, &editor));
        assert!(!can_publish_post(&post, &editor));

        post.approve().unwrap();
        assert!(!can_approve_post(&post, &editor));
        assert!(can_publish_post(&post, &editor));
    }

    #[test]
    fn submit_requires_draft_status() {
        let author = principal("u1", &[AUTHOR_ROLE]);
        let mut post = post_by("u1");
        post.submit().unwrap();

        assert!(!can_submit_post(&post, &author));
    }

    #[test]
    fn readers_see_only_published_and_approved() {
        let reader = principal("r1", &[READER_ROLE]);
        let anonymous = Principal::default();
        let mut post = post_by("u1");

        assert!(!is_post_visible(&post, &reader));
        assert!(!is_post_visible(&post, &anonymous));

        post.submit().unwrap();
        assert!(!is_post_visible(&post, &reader));

        post.approve().unwrap();
        assert!(is_post_visible(&post, &reader));
        assert!(is_post_visible(&post, &anonymous));

        post.publish().unwrap();
        assert!(is_post_visible(&post, &reader));
    }

    #[test]
    fn elevated_roles_see_everything() {
        let post = post_by("u1");
        for role in ELEVATED_ROLES {
            let user = principal("x", &[role]);
            assert!(is_post_visible(&post, &user), "role {role} must see drafts");
        }
    }
}
