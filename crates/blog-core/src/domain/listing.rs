//! Annotated listing views returned by the query helpers.
//!
//! Each view pairs an entity with an aggregate computed by the store in the
//! same query. Serialized, the entity's fields are flattened next to the
//! count.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Post, Tag};

/// Post annotated with the number of users who liked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithLikesCount {
    #[serde(flatten)]
    pub post: Post,
    pub likes_count: i64,
}

/// Post annotated with the number of comments referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithCommentsCount {
    #[serde(flatten)]
    pub post: Post,
    pub comments_count: i64,
}

/// Tag annotated with the number of posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagWithPostsCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub posts_count: i64,
}

/// Post with its comment count and its tags, most popular tag first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithTags {
    #[serde(flatten)]
    pub post: Post,
    pub comments_count: i64,
    pub tags: Vec<TagWithPostsCount>,
}

impl PostWithTags {
    pub fn new(counted: PostWithCommentsCount, tags: Vec<TagWithPostsCount>) -> Self {
        Self {
            post: counted.post,
            comments_count: counted.comments_count,
            tags,
        }
    }

    /// Attach prefetched tags to already counted posts.
    ///
    /// `links` are `(post_id, tag_id)` pairs and `popular_tags` is ordered by
    /// popularity; each post's tags keep that order. Links to tags missing
    /// from `popular_tags` are skipped.
    pub fn assemble(
        posts: Vec<PostWithCommentsCount>,
        links: impl IntoIterator<Item = (Uuid, Uuid)>,
        popular_tags: &[TagWithPostsCount],
    ) -> Vec<Self> {
        let rank: HashMap<Uuid, usize> = popular_tags
            .iter()
            .enumerate()
            .map(|(i, t)| (t.tag.id, i))
            .collect();

        let mut ranks_by_post: HashMap<Uuid, Vec<usize>> = HashMap::new();
        for (post_id, tag_id) in links {
            if let Some(&i) = rank.get(&tag_id) {
                ranks_by_post.entry(post_id).or_default().push(i);
            }
        }

        posts
            .into_iter()
            .map(|counted| {
                let mut ranks = ranks_by_post.remove(&counted.post.id).unwrap_or_default();
                ranks.sort_unstable();
                ranks.dedup();
                let tags = ranks.into_iter().map(|i| popular_tags[i].clone()).collect();
                Self::new(counted, tags)
            })
            .collect()
    }
}
