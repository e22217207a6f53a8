use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slug::slugify;

/// Post entity - a blog article published by staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub body: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post. The slug is derived from the title and is not
    /// touched again when the title later changes.
    pub fn new(author_id: Uuid, title: String, description: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            slug: slugify(&title),
            title,
            description,
            body,
            cover_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Tag entity. Tags are shared between posts and garbage-collected when the
/// last post referencing them is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub user_id: Option<Uuid>,
}

impl Tag {
    /// New tag, optionally recording the user who introduced it.
    pub fn new(name: String, user_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            user_id,
        }
    }
}

/// Image attached to a post. Only the storage path is kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostImage {
    pub id: Uuid,
    pub post_id: Uuid,
    pub title: String,
    pub image: String,
}

impl PostImage {
    /// Create an image record for an uploaded file, generating its storage path.
    pub fn new(post_id: Uuid, title: String, filename: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            title,
            image: image_file_path(filename),
        }
    }
}

/// Storage path for an uploaded image: `uploads/post/<uuid><ext>`.
///
/// The original file name is discarded, only its extension survives.
pub fn image_file_path(filename: &str) -> String {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("uploads/post/{}{}", Uuid::new_v4(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_derives_slug() {
        let post = Post::new(
            Uuid::new_v4(),
            "Post title".to_string(),
            "description".to_string(),
            "body".to_string(),
        );
        assert_eq!(post.slug, "post-title");
        assert_eq!(post.created_at, post.updated_at);
    }

    #[test]
    fn test_image_file_path_keeps_extension() {
        let path = image_file_path("holiday photo.jpg");
        assert!(path.starts_with("uploads/post/"));
        assert!(path.ends_with(".jpg"));
        assert!(!path.contains("holiday"));
    }

    #[test]
    fn test_image_file_path_without_extension() {
        let path = image_file_path("README");
        let name = path.trim_start_matches("uploads/post/");
        assert!(Uuid::parse_str(name).is_ok());
    }
}
