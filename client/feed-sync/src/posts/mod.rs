//! Post cache and mutations
//!
//! [`PostStore`] reflects the remote "posts" collection in memory. Every
//! mutation is a single remote write followed by a wholesale refresh;
//! ordering and filtering happen locally in [`view`].

mod store;
pub mod view;

pub use store::{PostState, PostStore, PostStoreOptions, RefreshOutcome, SyncMode};
pub use view::FeedOrder;
