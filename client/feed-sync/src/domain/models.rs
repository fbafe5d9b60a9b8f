use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default favorite-music blurb shown on freshly created profiles
pub const DEFAULT_FAVORITE_MUSIC: &str = "Lo-fi / Synthwave";

/// Authenticated user profile as held by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_music: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    /// Build a profile for a freshly authenticated account.
    /// The display name is the part of the email before `@`.
    pub fn from_email(id: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        let display_name = email
            .split('@')
            .next()
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or("User")
            .to_string();

        Self {
            id: id.into(),
            email,
            display_name,
            favorite_music: Some(DEFAULT_FAVORITE_MUSIC.to_string()),
            avatar_url: None,
        }
    }

    /// Name recorded as author on posts and comments
    pub fn author_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.email
        } else {
            &self.display_name
        }
    }
}

/// Persisted session record. The token only ever exists alongside its user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Comment embedded in a post document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Stable identifier assigned when the comment is written.
    /// Documents written by older clients carry no id; those get a fresh one on read.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(text: impl Into<String>, author: &User) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author_id: author.id.clone(),
            author_name: author.author_name().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Visible fields used for structural matching
    pub fn key(&self) -> CommentKey {
        CommentKey {
            text: self.text.clone(),
            author_name: self.author_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Structural identity of a comment: (text, author name, timestamp).
/// Two distinct comments sharing all three collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentKey {
    pub text: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl CommentKey {
    pub fn matches(&self, comment: &Comment) -> bool {
        comment.text == self.text
            && comment.author_name == self.author_name
            && comment.created_at == self.created_at
    }
}

/// Post document as stored in the remote "posts" collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Fields supplied by the client when creating a document.
/// The collection assigns id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPostDocument {
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub author_name: String,
}

/// Post form input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub body: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Editable post fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    pub title: String,
    pub body: String,
}

/// Post as seen by the current viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub liked_by_me: bool,
    pub like_count: usize,
    pub comments: Vec<Comment>,
}

impl Post {
    /// Project a remote document for `viewer`. `liked_by_me` is always
    /// derived from the document's liked-by set, never stored.
    pub fn project(document: PostDocument, viewer: Option<&str>) -> Self {
        let liked_by_me = viewer
            .map(|uid| document.liked_by.iter().any(|id| id == uid))
            .unwrap_or(false);

        Self {
            id: document.id,
            author_id: document.author_id,
            author_name: document.author_name,
            title: document.title,
            body: document.body,
            created_at: document.created_at,
            liked_by_me,
            like_count: document.liked_by.len(),
            comments: document.comments,
        }
    }
}
