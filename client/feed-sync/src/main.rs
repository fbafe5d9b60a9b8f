use anyhow::{Context, Result};
use feed_sync::config::Config;
use feed_sync::domain::NewPost;
use feed_sync::platform::memory::{InMemoryIdentityProvider, InMemoryPostCollection};
use feed_sync::posts::FeedOrder;
use feed_sync::theme::ThemeName;
use feed_sync::{telemetry, ClientOptions, FeedClient, Platform};
use local_storage::FileStore;
use std::sync::Arc;
use tracing::info;

const DEMO_EMAIL: &str = "a@b.com";
const DEMO_PASSWORD: &str = "secret1";

/// Scripted session against the in-process platform. Device storage is a
/// real file, so session and theme survive between runs.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.logging);

    info!(
        env = %config.app.env,
        storage = %config.storage.path.display(),
        mode = ?config.sync.mode,
        "Starting feed-sync"
    );

    let platform = Platform {
        identity: Arc::new(InMemoryIdentityProvider::new()),
        posts: Arc::new(InMemoryPostCollection::new()),
        storage: Arc::new(FileStore::new(&config.storage.path)),
    };
    let client = FeedClient::new(platform, ClientOptions::from_config(&config));
    client.bootstrap().await;

    let user = match client.session().current_user() {
        Some(user) => {
            info!(user_id = %user.id, "Resumed persisted session");
            user
        }
        None => client
            .register(DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .context("Registration failed")?,
    };
    info!(email = %user.email, display_name = %user.display_name, "Signed in");

    let post_id = client
        .posts()
        .create_post(&NewPost::new("Hi there", "0123456789"))
        .await
        .context("Failed to create post")?;

    let liked = client.posts().toggle_like(&post_id).await?;
    info!(post_id = %post_id, liked, "Toggled like");
    let liked = client.posts().toggle_like(&post_id).await?;
    info!(post_id = %post_id, liked, "Toggled like");

    let comment = client
        .posts()
        .add_comment(&post_id, "First!")
        .await
        .context("Failed to comment")?;
    info!(comment_id = %comment.id, "Commented");

    for post in client.posts().view(FeedOrder::Recent) {
        info!(
            post_id = %post.id,
            title = %post.title,
            likes = post.like_count,
            comments = post.comments.len(),
            "Feed entry"
        );
    }

    client
        .posts()
        .delete_post(&post_id)
        .await
        .context("Failed to delete post")?;

    // Rotate the theme so the next run restores a different one
    let current = client.theme().current();
    let position = ThemeName::ALL
        .iter()
        .position(|name| *name == current)
        .unwrap_or(0);
    let next = ThemeName::ALL[(position + 1) % ThemeName::ALL.len()];
    client.set_theme(next).await;
    info!(from = %current, to = %next, "Theme changed");

    info!(remaining = client.posts().posts().len(), "Done");
    Ok(())
}
