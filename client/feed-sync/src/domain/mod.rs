pub mod models;

pub use models::{
    Comment, CommentKey, NewPost, NewPostDocument, Post, PostDocument, PostUpdate, Session, User,
};
