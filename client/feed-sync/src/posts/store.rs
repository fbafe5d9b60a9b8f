use super::view::{self, FeedOrder};
use crate::domain::{Comment, CommentKey, NewPost, NewPostDocument, Post, PostUpdate, User};
use crate::error::{PostError, PostResult};
use crate::generation::Generation;
use crate::platform::{remote_call, PostCollection, RemoteError};
use crate::session::SessionState;
use crate::validators;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How a mutation reaches local state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Remote write, then full refresh
    #[default]
    Refetch,
    /// Local patch first, remote write, rollback on failure, refresh on success
    Optimistic,
}

impl SyncMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "refetch" => Some(SyncMode::Refetch),
            "optimistic" => Some(SyncMode::Optimistic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostState {
    pub posts: Vec<Post>,
    pub is_loading: bool,
    /// User-facing message of the last failed operation
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh started (or the store was invalidated) while this one was in flight
    Discarded,
}

#[derive(Debug, Clone)]
pub struct PostStoreOptions {
    pub mode: SyncMode,
    /// Budget for each remote collection call
    pub remote_timeout: Duration,
}

impl Default for PostStoreOptions {
    fn default() -> Self {
        Self {
            mode: SyncMode::Refetch,
            remote_timeout: Duration::from_secs(10),
        }
    }
}

pub struct PostStore {
    collection: Arc<dyn PostCollection>,
    session: watch::Receiver<SessionState>,
    options: PostStoreOptions,
    state: watch::Sender<PostState>,
    generation: Generation,
}

impl PostStore {
    pub fn new(
        collection: Arc<dyn PostCollection>,
        session: watch::Receiver<SessionState>,
        options: PostStoreOptions,
    ) -> Self {
        let (state, _) = watch::channel(PostState::default());
        Self {
            collection,
            session,
            options,
            state,
            generation: Generation::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PostState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PostState {
        self.state.borrow().clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state.borrow().posts.clone()
    }

    pub fn find(&self, id: &str) -> Option<Post> {
        self.state.borrow().posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn view(&self, order: FeedOrder) -> Vec<Post> {
        view::arrange(&self.state.borrow().posts, order)
    }

    pub fn posts_by_author(&self, author_id: &str) -> Vec<Post> {
        view::by_author(&self.state.borrow().posts, author_id)
    }

    /// Drop any in-flight refresh result, e.g. when the viewer changes
    pub fn invalidate(&self) {
        self.generation.invalidate();
        self.state.send_modify(|state| state.is_loading = false);
    }

    /// Replace the whole cache with a fresh read of the collection
    pub async fn refresh(&self) -> PostResult<RefreshOutcome> {
        let ticket = self.generation.begin();
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let result = remote_call(self.options.remote_timeout, self.collection.fetch_all()).await;

        if !self.generation.is_current(ticket) {
            debug!("Discarding stale post fetch");
            return Ok(RefreshOutcome::Discarded);
        }

        match result {
            Ok(documents) => {
                let viewer = self.viewer();
                let posts: Vec<Post> = documents
                    .into_iter()
                    .map(|document| Post::project(document, viewer.as_deref()))
                    .collect();

                debug!(count = posts.len(), "Post cache refreshed");
                self.state.send_modify(|state| {
                    state.posts = posts;
                    state.is_loading = false;
                });
                Ok(RefreshOutcome::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch posts");
                let err = PostError::FetchFailed(e);
                let message = err.to_string();
                self.state.send_modify(|state| {
                    state.error = Some(message);
                    state.is_loading = false;
                });
                Err(err)
            }
        }
    }

    /// Returns the id assigned by the collection
    pub async fn create_post(&self, input: &NewPost) -> PostResult<String> {
        validators::validate_post(&input.title, &input.body)?;
        let author = self.author()?;

        let document = NewPostDocument {
            title: input.title.clone(),
            body: input.body.clone(),
            author_id: author.id.clone(),
            author_name: author.author_name().to_string(),
        };
        let placeholder = Post {
            id: format!("pending-{}", Uuid::new_v4().simple()),
            author_id: document.author_id.clone(),
            author_name: document.author_name.clone(),
            title: document.title.clone(),
            body: document.body.clone(),
            created_at: Utc::now(),
            liked_by_me: false,
            like_count: 0,
            comments: Vec::new(),
        };

        let id = self
            .commit(
                |posts| posts.push(placeholder),
                self.collection.create(document),
            )
            .await?;

        info!(post_id = %id, author_id = %author.id, "Post created");
        Ok(id)
    }

    pub async fn update_post(&self, id: &str, update: &PostUpdate) -> PostResult<()> {
        validators::validate_post(&update.title, &update.body)?;

        self.commit(
            |posts| {
                if let Some(post) = posts.iter_mut().find(|p| p.id == id) {
                    post.title = update.title.clone();
                    post.body = update.body.clone();
                }
            },
            self.collection.update_fields(id, update),
        )
        .await?;

        debug!(post_id = %id, "Post updated");
        Ok(())
    }

    pub async fn delete_post(&self, id: &str) -> PostResult<()> {
        self.commit(
            |posts| posts.retain(|p| p.id != id),
            self.collection.delete(id),
        )
        .await?;

        info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Flip the viewer's like. The direction comes from the cached
    /// `liked_by_me`, not a fresh remote read. Returns the new value.
    pub async fn toggle_like(&self, id: &str) -> PostResult<bool> {
        let user_id = self.viewer().ok_or(PostError::NotAuthenticated)?;
        let liked = self.cached(id)?.liked_by_me;

        let write = if liked {
            self.collection.remove_liker(id, &user_id)
        } else {
            self.collection.add_liker(id, &user_id)
        };

        self.commit(
            |posts| {
                if let Some(post) = posts.iter_mut().find(|p| p.id == id) {
                    post.liked_by_me = !liked;
                    post.like_count = if liked {
                        post.like_count.saturating_sub(1)
                    } else {
                        post.like_count + 1
                    };
                }
            },
            write,
        )
        .await?;

        debug!(post_id = %id, liked = !liked, "Like toggled");
        Ok(!liked)
    }

    pub async fn add_comment(&self, post_id: &str, text: &str) -> PostResult<Comment> {
        validators::validate_comment(text)?;
        let author = self.author()?;
        let post = self.cached(post_id)?;

        let comment = Comment::new(text, &author);
        let mut comments = post.comments;
        comments.push(comment.clone());

        let added = comment.clone();
        self.commit(
            |posts| {
                if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
                    post.comments.push(added);
                }
            },
            self.collection.replace_comments(post_id, comments),
        )
        .await?;

        debug!(post_id = %post_id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    /// Remove every comment whose (text, author name, timestamp) equals
    /// `target`. Duplicates sharing all three fields all go. Returns how
    /// many were removed.
    pub async fn delete_comment(&self, post_id: &str, target: &CommentKey) -> PostResult<usize> {
        let post = self.cached(post_id)?;
        let before = post.comments.len();
        let remaining: Vec<Comment> = post
            .comments
            .into_iter()
            .filter(|c| !target.matches(c))
            .collect();
        let removed = before - remaining.len();

        self.replace_comments(post_id, remaining).await?;

        debug!(post_id = %post_id, removed, "Comments deleted by match");
        Ok(removed)
    }

    /// Remove a single comment by its stable id. Returns whether it existed.
    pub async fn delete_comment_by_id(&self, post_id: &str, comment_id: Uuid) -> PostResult<bool> {
        let post = self.cached(post_id)?;
        if !post.comments.iter().any(|c| c.id == comment_id) {
            return Ok(false);
        }

        let remaining: Vec<Comment> = post
            .comments
            .into_iter()
            .filter(|c| c.id != comment_id)
            .collect();
        self.replace_comments(post_id, remaining).await?;

        debug!(post_id = %post_id, comment_id = %comment_id, "Comment deleted");
        Ok(true)
    }

    async fn replace_comments(&self, post_id: &str, comments: Vec<Comment>) -> PostResult<()> {
        let local = comments.clone();
        self.commit(
            |posts| {
                if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
                    post.comments = local;
                }
            },
            self.collection.replace_comments(post_id, comments),
        )
        .await
    }

    /// Perform one remote write and reconcile.
    ///
    /// In optimistic mode `patch` is applied before the write and undone
    /// if the write fails. A failed refresh after a successful write is
    /// reported but leaves the (stale) cache in place.
    async fn commit<T, F>(&self, patch: impl FnOnce(&mut Vec<Post>), write: F) -> PostResult<T>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        let undo = match self.options.mode {
            SyncMode::Optimistic => {
                let mut undo = None;
                self.state.send_modify(|state| {
                    let before = state.posts.clone();
                    patch(&mut state.posts);
                    undo = Some(Undo::between(&before, &state.posts));
                });
                undo
            }
            SyncMode::Refetch => None,
        };

        let value = match remote_call(self.options.remote_timeout, write).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Remote post write failed");
                let err = PostError::UpdateFailed(e);
                let message = err.to_string();
                self.state.send_modify(|state| {
                    if let Some(undo) = undo {
                        undo.apply(&mut state.posts);
                    }
                    state.error = Some(message);
                });
                return Err(err);
            }
        };

        self.refresh().await?;
        Ok(value)
    }

    fn cached(&self, id: &str) -> PostResult<Post> {
        self.find(id)
            .ok_or_else(|| PostError::PostNotFound(id.to_string()))
    }

    fn viewer(&self) -> Option<String> {
        self.session.borrow().user_id().map(str::to_owned)
    }

    fn author(&self) -> PostResult<User> {
        self.session
            .borrow()
            .user()
            .cloned()
            .ok_or(PostError::NotAuthenticated)
    }
}

/// Inverse of one optimistic patch, limited to the posts it touched.
/// Anything else that reached the cache while the write was in flight
/// (a refresh, another mutation) survives the rollback.
#[derive(Debug)]
struct Undo {
    /// Posts the patch inserted
    inserted: Vec<String>,
    /// Pre-patch versions of posts it modified, with the patched version
    modified: Vec<(Post, Post)>,
    /// Posts it removed, with their original position
    removed: Vec<(usize, Post)>,
}

impl Undo {
    fn between(before: &[Post], after: &[Post]) -> Self {
        let inserted = after
            .iter()
            .filter(|post| !before.iter().any(|b| b.id == post.id))
            .map(|post| post.id.clone())
            .collect();

        let mut modified = Vec::new();
        let mut removed = Vec::new();
        for (index, original) in before.iter().enumerate() {
            match after.iter().find(|a| a.id == original.id) {
                Some(patched) if patched != original => {
                    modified.push((original.clone(), patched.clone()));
                }
                Some(_) => {}
                None => removed.push((index, original.clone())),
            }
        }

        Self {
            inserted,
            modified,
            removed,
        }
    }

    fn apply(self, posts: &mut Vec<Post>) {
        posts.retain(|post| !self.inserted.contains(&post.id));

        // Only revert posts still showing the patch; fresher data wins
        for (original, patched) in self.modified {
            if let Some(post) = posts.iter_mut().find(|p| p.id == original.id) {
                if *post == patched {
                    *post = original;
                }
            }
        }

        for (index, original) in self.removed {
            if !posts.iter().any(|p| p.id == original.id) {
                posts.insert(index.min(posts.len()), original);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_mode_names() {
        assert_eq!(SyncMode::from_name("refetch"), Some(SyncMode::Refetch));
        assert_eq!(SyncMode::from_name(" Optimistic "), Some(SyncMode::Optimistic));
        assert_eq!(SyncMode::from_name("eventual"), None);
    }

    fn post(id: &str, title: &str) -> Post {
        Post {
            id: id.to_string(),
            author_id: "u1".to_string(),
            author_name: "a".to_string(),
            title: title.to_string(),
            body: "0123456789".to_string(),
            created_at: Utc::now(),
            liked_by_me: false,
            like_count: 0,
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_undo_keeps_posts_that_arrived_meanwhile() {
        let before = vec![post("p1", "one"), post("p2", "two")];
        let mut after = before.clone();
        after[0].liked_by_me = true;
        after.retain(|p| p.id != "p2");
        after.push(post("pending-1", "draft"));
        let undo = Undo::between(&before, &after);

        // A refresh landed while the write was in flight
        let mut current = after.clone();
        current.push(post("p3", "three"));

        undo.apply(&mut current);

        let ids: Vec<&str> = current.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert!(!current[0].liked_by_me);
    }

    #[test]
    fn test_undo_leaves_fresher_versions_alone() {
        let before = vec![post("p1", "one")];
        let mut after = before.clone();
        after[0].title = "patched".to_string();
        let undo = Undo::between(&before, &after);

        let mut current = vec![post("p1", "edited elsewhere")];
        undo.apply(&mut current);

        assert_eq!(current[0].title, "edited elsewhere");
    }

    #[test]
    fn test_default_state_is_empty() {
        let state = PostState::default();
        assert!(state.posts.is_empty());
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }
}
