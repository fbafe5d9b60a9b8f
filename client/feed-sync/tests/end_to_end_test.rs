//! The whole client flow from first launch to relaunch

mod common;

use common::{Harness, EMAIL, PASSWORD};
use feed_sync::domain::NewPost;
use feed_sync::posts::FeedOrder;
use feed_sync::session::AuthStatus;

#[tokio::test]
async fn test_register_post_like_delete() {
    let harness = Harness::new();
    let client = &harness.client;
    client.bootstrap().await;
    assert_eq!(client.session().snapshot().status(), AuthStatus::SignedOut);

    let user = client.register(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(user.email, "a@b.com");
    assert_eq!(client.session().current_user().unwrap().email, "a@b.com");

    let id = client
        .posts()
        .create_post(&NewPost::new("Hi there", "0123456789"))
        .await
        .unwrap();
    let head = client.posts().view(FeedOrder::Recent)[0].clone();
    assert_eq!(head.id, id);
    assert_eq!(head.title, "Hi there");
    assert!(!head.liked_by_me);

    assert!(client.posts().toggle_like(&id).await.unwrap());
    assert!(client.posts().find(&id).unwrap().liked_by_me);

    assert!(!client.posts().toggle_like(&id).await.unwrap());
    assert!(!client.posts().find(&id).unwrap().liked_by_me);

    client.posts().delete_post(&id).await.unwrap();
    assert!(client.posts().posts().iter().all(|p| p.id != id));
}

#[tokio::test]
async fn test_relaunch_resumes_session_and_feed() {
    let harness = Harness::signed_in().await;
    let id = harness
        .client
        .posts()
        .create_post(&NewPost::new("Persisted", "0123456789"))
        .await
        .unwrap();
    harness.client.posts().toggle_like(&id).await.unwrap();

    let relaunched = harness.relaunch();
    assert!(relaunched.client.session().is_bootstrapping());
    relaunched.client.bootstrap().await;

    let session = relaunched.client.session().snapshot();
    assert_eq!(session.status(), AuthStatus::SignedIn);
    assert_eq!(session.user().unwrap().email, EMAIL);

    let post = relaunched.client.posts().find(&id).unwrap();
    assert!(post.liked_by_me);
}

#[tokio::test]
async fn test_logout_clears_viewer_projection() {
    let harness = Harness::signed_in().await;
    let id = harness
        .client
        .posts()
        .create_post(&NewPost::new("Mine", "0123456789"))
        .await
        .unwrap();
    harness.client.posts().toggle_like(&id).await.unwrap();

    harness.client.logout().await;

    assert!(harness.client.session().current_user().is_none());
    let post = harness.client.posts().find(&id).unwrap();
    assert!(!post.liked_by_me);
    assert_eq!(post.like_count, 1);
}
