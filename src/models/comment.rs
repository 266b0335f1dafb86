//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Artwork, User};

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub user_id: String,
    pub artwork_id: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(content: String, user_id: String, artwork_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            user_id,
            artwork_id,
            created_at: Utc::now(),
        }
    }
}

/// Public view of a comment's author
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub id: String,
    pub username: String,
    pub profile_picture: Option<String>,
}

impl From<&User> for CommentAuthor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// Comment joined with its author, as listed on an artwork page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: CommentAuthor,
}

/// Freshly created comment, echoed back with its author and artwork
#[derive(Debug, Clone, Serialize)]
pub struct CreatedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: CommentAuthor,
    pub artwork: Artwork,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_with_author_shape() {
        let comment = Comment::new("Lovely".into(), "u1".into(), "a1".into());
        let view = CommentWithAuthor {
            comment,
            user: CommentAuthor {
                id: "u1".into(),
                username: "alice".into(),
                profile_picture: None,
            },
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["content"], "Lovely");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["artworkId"], "a1");
        assert_eq!(json["user"]["username"], "alice");
        assert!(json["user"].get("email").is_none());
    }
}
