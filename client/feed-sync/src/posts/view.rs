use crate::domain::Post;

/// Local ordering/filtering of the cached feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedOrder {
    /// Newest first
    #[default]
    Recent,
    Oldest,
    /// Posts the viewer liked, newest first
    LikedOnly,
}

impl FeedOrder {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "recent" => Some(FeedOrder::Recent),
            "oldest" => Some(FeedOrder::Oldest),
            "liked" | "liked-only" => Some(FeedOrder::LikedOnly),
            _ => None,
        }
    }
}

/// Computed over the full cached list on every call
pub fn arrange(posts: &[Post], order: FeedOrder) -> Vec<Post> {
    let mut arranged: Vec<Post> = match order {
        FeedOrder::LikedOnly => posts.iter().filter(|p| p.liked_by_me).cloned().collect(),
        FeedOrder::Recent | FeedOrder::Oldest => posts.to_vec(),
    };

    match order {
        FeedOrder::Oldest => arranged.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        FeedOrder::Recent | FeedOrder::LikedOnly => {
            arranged.sort_by(|a, b| b.created_at.cmp(&a.created_at))
        }
    }
    arranged
}

/// Profile grid: posts written by `author_id`, newest first
pub fn by_author(posts: &[Post], author_id: &str) -> Vec<Post> {
    let authored: Vec<Post> = posts
        .iter()
        .filter(|p| p.author_id == author_id)
        .cloned()
        .collect();
    arrange(&authored, FeedOrder::Recent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn post(id: &str, author: &str, minutes: i64, liked: bool) -> Post {
        Post {
            id: id.to_string(),
            author_id: author.to_string(),
            author_name: author.to_string(),
            title: format!("title {}", id),
            body: "0123456789".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            liked_by_me: liked,
            like_count: usize::from(liked),
            comments: Vec::new(),
        }
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_recent_and_oldest_orders() {
        let posts = vec![
            post("b", "u1", 2, false),
            post("a", "u1", 1, true),
            post("c", "u2", 3, false),
        ];

        assert_eq!(ids(&arrange(&posts, FeedOrder::Recent)), vec!["c", "b", "a"]);
        assert_eq!(ids(&arrange(&posts, FeedOrder::Oldest)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_liked_only_filters_then_sorts() {
        let posts = vec![
            post("a", "u1", 1, true),
            post("b", "u1", 2, false),
            post("c", "u2", 3, true),
        ];

        assert_eq!(ids(&arrange(&posts, FeedOrder::LikedOnly)), vec!["c", "a"]);
    }

    #[test]
    fn test_by_author() {
        let posts = vec![
            post("a", "u1", 1, false),
            post("b", "u2", 2, false),
            post("c", "u1", 3, false),
        ];

        assert_eq!(ids(&by_author(&posts, "u1")), vec!["c", "a"]);
        assert!(by_author(&posts, "nobody").is_empty());
    }

    #[test]
    fn test_order_names() {
        assert_eq!(FeedOrder::from_name("Recent"), Some(FeedOrder::Recent));
        assert_eq!(FeedOrder::from_name("liked"), Some(FeedOrder::LikedOnly));
        assert_eq!(FeedOrder::from_name("popular"), None);
    }
}
