use chrono::{Duration, TimeZone, Utc};

use super::*;

struct Fixture {
    store: InMemoryStore,
    author: User,
    readers: Vec<User>,
}

async fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    let author = store
        .users()
        .save(User::staff("editor", "editor@example.com"))
        .await
        .unwrap();

    let mut readers = Vec::new();
    for name in ["ann", "bob", "cid"] {
        let user = store
            .users()
            .save(User::new(name, format!("{name}@example.com")))
            .await
            .unwrap();
        readers.push(user);
    }

    Fixture {
        store,
        author,
        readers,
    }
}

async fn publish(fx: &Fixture, slug: &str, days_ago: i64) -> Post {
    let published_at = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap() - Duration::days(days_ago);
    let post = Post::new(fx.author.id, slug, "Body text", slug, "cover.png").published_at(published_at);
    fx.store.posts().save(post).await.unwrap()
}

async fn comment(fx: &Fixture, post: &Post, author: &User, text: &str) -> Comment {
    fx.store
        .comments()
        .save(Comment::new(post.id, author.id, text))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_tag_is_read_back_lower_cased() {
    let fx = fixture().await;
    let tags = fx.store.tags();

    let saved = tags.save(Tag::new("Django")).await.unwrap();
    assert_eq!(saved.title, "django");

    let found: Option<Tag> = tags.find_by_id(saved.id).await.unwrap();
    assert_eq!(found.unwrap().title, "django");

    let by_title = tags.find_by_title("DJANGO").await.unwrap();
    assert_eq!(by_title.map(|t| t.id), Some(saved.id));
}

#[tokio::test]
async fn test_tag_titles_differing_in_case_collide() {
    let fx = fixture().await;
    let tags = fx.store.tags();

    tags.save(Tag::new("python")).await.unwrap();
    let err = tags.save(Tag::new("Python")).await.unwrap_err();

    assert!(matches!(err, RepoError::Constraint(msg) if msg == "tag 'python' already exists"));
    assert_eq!(tags.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_tag_is_rejected() {
    let fx = fixture().await;
    let err = fx
        .store
        .tags()
        .save(Tag::new("a-very-long-tag-title-indeed"))
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn test_popular_posts_are_sorted_by_likes() {
    let fx = fixture().await;
    let posts = fx.store.posts();
    let quiet = publish(&fx, "quiet", 0).await;
    let liked = publish(&fx, "liked", 1).await;
    let loved = publish(&fx, "loved", 2).await;

    for reader in &fx.readers {
        posts.add_like(loved.id, reader.id).await.unwrap();
    }
    posts.add_like(liked.id, fx.readers[0].id).await.unwrap();

    let popular = posts.popular().await.unwrap();
    let order: Vec<(Uuid, i64)> = popular.iter().map(|p| (p.post.id, p.likes_count)).collect();

    assert_eq!(order, vec![(loved.id, 3), (liked.id, 1), (quiet.id, 0)]);
    assert!(popular.windows(2).all(|w| w[0].likes_count >= w[1].likes_count));
}

#[tokio::test]
async fn test_liking_twice_counts_once() {
    let fx = fixture().await;
    let posts = fx.store.posts();
    let post = publish(&fx, "post", 0).await;
    let reader = &fx.readers[0];

    posts.add_like(post.id, reader.id).await.unwrap();
    posts.add_like(post.id, reader.id).await.unwrap();
    assert_eq!(posts.popular().await.unwrap()[0].likes_count, 1);
    assert_eq!(posts.likers(post.id).await.unwrap(), vec![reader.clone()]);
    assert_eq!(posts.liked_by(reader.id).await.unwrap(), vec![post.clone()]);

    posts.remove_like(post.id, reader.id).await.unwrap();
    assert_eq!(posts.popular().await.unwrap()[0].likes_count, 0);
    assert!(posts.likers(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_with_comments_count_returns_exactly_the_selection() {
    let fx = fixture().await;
    let first = publish(&fx, "first", 3).await;
    let second = publish(&fx, "second", 2).await;
    let _unselected = publish(&fx, "unselected", 1).await;

    comment(&fx, &first, &fx.readers[0], "one").await;
    comment(&fx, &first, &fx.readers[1], "two").await;
    comment(&fx, &second, &fx.readers[0], "three").await;

    let selection = [first.id, second.id, first.id, Uuid::new_v4()];
    let counted = fx
        .store
        .posts()
        .fetch_with_comments_count(&selection)
        .await
        .unwrap();

    let result: Vec<(Uuid, i64)> = counted.iter().map(|p| (p.post.id, p.comments_count)).collect();
    assert_eq!(result, vec![(second.id, 1), (first.id, 2)]);
}

#[tokio::test]
async fn test_fetch_with_comments_count_of_empty_selection() {
    let fx = fixture().await;
    publish(&fx, "post", 0).await;

    let counted = fx.store.posts().fetch_with_comments_count(&[]).await.unwrap();
    assert!(counted.is_empty());
}

#[tokio::test]
async fn test_fresh_posts_report_comment_counts() {
    let fx = fixture().await;
    let older = publish(&fx, "older", 5).await;
    let newer = publish(&fx, "newer", 1).await;

    for text in ["a", "b", "c"] {
        comment(&fx, &older, &fx.readers[0], text).await;
    }

    let fresh = fx.store.posts().fresh_posts().await.unwrap();

    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh[0].post.id, newer.id);
    assert_eq!(fresh[0].comments_count, 0);
    assert_eq!(fresh[1].post.id, older.id);
    assert_eq!(fresh[1].comments_count, 3);
}

#[tokio::test]
async fn test_fetch_with_tags_sorts_tags_by_popularity() {
    let fx = fixture().await;
    let posts = fx.store.posts();
    let tags = fx.store.tags();

    let rust = tags.save(Tag::new("Rust")).await.unwrap();
    let sql = tags.save(Tag::new("sql")).await.unwrap();
    let web = tags.save(Tag::new("web")).await.unwrap();

    let a = publish(&fx, "a", 3).await;
    let b = publish(&fx, "b", 2).await;
    let c = publish(&fx, "c", 1).await;

    // rust: 3 posts, sql: 2 posts, web: 1 post
    for post in [&a, &b, &c] {
        posts.add_tag(post.id, rust.id).await.unwrap();
    }
    posts.add_tag(a.id, sql.id).await.unwrap();
    posts.add_tag(b.id, sql.id).await.unwrap();
    posts.add_tag(a.id, web.id).await.unwrap();
    comment(&fx, &a, &fx.readers[2], "hi").await;

    let listed = posts.fetch_with_tags(&[a.id, c.id]).await.unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].post.id, c.id);
    let c_tags: Vec<&str> = listed[0].tags.iter().map(|t| t.tag.title.as_str()).collect();
    assert_eq!(c_tags, vec!["rust"]);

    assert_eq!(listed[1].post.id, a.id);
    assert_eq!(listed[1].comments_count, 1);
    let a_tags: Vec<(&str, i64)> = listed[1]
        .tags
        .iter()
        .map(|t| (t.tag.title.as_str(), t.posts_count))
        .collect();
    assert_eq!(a_tags, vec![("rust", 3), ("sql", 2), ("web", 1)]);
}

#[tokio::test]
async fn test_fetch_with_tags_skips_unknown_and_repeated_ids() {
    let fx = fixture().await;
    let posts = fx.store.posts();
    let rust = fx.store.tags().save(Tag::new("rust")).await.unwrap();

    let post = publish(&fx, "only", 0).await;
    posts.add_tag(post.id, rust.id).await.unwrap();
    comment(&fx, &post, &fx.readers[0], "first").await;
    comment(&fx, &post, &fx.readers[1], "second").await;

    let listed = posts
        .fetch_with_tags(&[post.id, Uuid::new_v4(), post.id])
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].comments_count, 2);
    assert_eq!(listed[0].tags.len(), 1);
    assert_eq!(listed[0].tags[0].posts_count, 1);

    assert!(posts.fetch_with_tags(&[Uuid::new_v4()]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_popular_tags() {
    let fx = fixture().await;
    let posts = fx.store.posts();
    let tags = fx.store.tags();

    let unused = tags.save(Tag::new("zig")).await.unwrap();
    let used = tags.save(Tag::new("go")).await.unwrap();
    let post = publish(&fx, "post", 0).await;
    posts.add_tag(post.id, used.id).await.unwrap();

    let popular = tags.popular().await.unwrap();
    assert_eq!(popular[0].tag.id, used.id);
    assert_eq!(popular[0].posts_count, 1);
    assert_eq!(popular[1].tag.id, unused.id);
    assert_eq!(popular[1].posts_count, 0);

    assert_eq!(tags.posts(used.id).await.unwrap(), vec![post.clone()]);
    assert_eq!(posts.tags(post.id).await.unwrap(), vec![used]);
}

#[tokio::test]
async fn test_deleting_post_cascades_to_comments_only() {
    let fx = fixture().await;
    let posts = fx.store.posts();
    let tags = fx.store.tags();
    let comments = fx.store.comments();

    let doomed = publish(&fx, "doomed", 1).await;
    let survivor = publish(&fx, "survivor", 0).await;
    let tag = tags.save(Tag::new("news")).await.unwrap();

    posts.add_tag(doomed.id, tag.id).await.unwrap();
    posts.add_tag(survivor.id, tag.id).await.unwrap();
    posts.add_like(doomed.id, fx.readers[0].id).await.unwrap();
    posts.add_like(survivor.id, fx.readers[0].id).await.unwrap();
    let doomed_comment = comment(&fx, &doomed, &fx.readers[1], "bye").await;
    comment(&fx, &survivor, &fx.readers[1], "still here").await;

    BaseRepository::<Post, Uuid>::delete(&posts, doomed.id).await.unwrap();

    let gone: Option<Comment> = comments.find_by_id(doomed_comment.id).await.unwrap();
    assert!(gone.is_none());
    assert!(comments.find_by_post(doomed.id).await.unwrap().is_empty());
    assert_eq!(comments.find_by_post(survivor.id).await.unwrap().len(), 1);

    let kept: Option<Tag> = tags.find_by_id(tag.id).await.unwrap();
    assert!(kept.is_some());
    assert_eq!(tags.posts(tag.id).await.unwrap(), vec![survivor.clone()]);
    assert_eq!(posts.likers(survivor.id).await.unwrap().len(), 1);
    assert_eq!(posts.liked_by(fx.readers[0].id).await.unwrap(), vec![survivor]);
}

#[tokio::test]
async fn test_deleting_missing_post_is_not_found() {
    let fx = fixture().await;
    let err = BaseRepository::<Post, Uuid>::delete(&fx.store.posts(), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn test_deleting_author_cascades_to_posts_and_comments() {
    let fx = fixture().await;
    let post = publish(&fx, "post", 0).await;
    let reader = &fx.readers[0];
    comment(&fx, &post, reader, "mine").await;

    BaseRepository::<User, Uuid>::delete(&fx.store.users(), fx.author.id)
        .await
        .unwrap();

    assert!(fx.store.posts().list().await.unwrap().is_empty());
    assert!(fx.store.comments().find_by_author(reader.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_comments_are_listed_oldest_first() {
    let fx = fixture().await;
    let post = publish(&fx, "post", 0).await;
    let comments = fx.store.comments();
    let base = post.published_at;

    let late = Comment::new(post.id, fx.readers[0].id, "late").published_at(base + Duration::hours(2));
    let early = Comment::new(post.id, fx.readers[1].id, "early").published_at(base + Duration::hours(1));
    comments.save(late).await.unwrap();
    comments.save(early).await.unwrap();

    let texts: Vec<String> = comments
        .find_by_post(post.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, vec!["early", "late"]);
}

#[tokio::test]
async fn test_dangling_references_are_rejected() {
    let fx = fixture().await;
    let post = publish(&fx, "post", 0).await;

    let orphan = Comment::new(Uuid::new_v4(), fx.readers[0].id, "lost");
    let err = fx.store.comments().save(orphan).await.unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));

    let err = fx
        .store
        .posts()
        .add_tag(post.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));

    let stray = Post::new(Uuid::new_v4(), "Stray", "Body", "stray", "x.png");
    let err = fx.store.posts().save(stray).await.unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));
}

#[tokio::test]
async fn test_saving_existing_post_updates_it() {
    let fx = fixture().await;
    let posts = fx.store.posts();
    let mut post = publish(&fx, "draft", 0).await;

    post.title = "Final title".to_string();
    posts.save(post.clone()).await.unwrap();

    assert_eq!(posts.list().await.unwrap().len(), 1);
    let found = posts.find_by_slug("draft").await.unwrap().unwrap();
    assert_eq!(found.title, "Final title");
    assert_eq!(posts.find_by_author(fx.author.id).await.unwrap(), vec![found]);
}

#[tokio::test]
async fn test_staff_and_usernames() {
    let fx = fixture().await;
    let users = fx.store.users();

    let staff = users.staff().await.unwrap();
    assert_eq!(staff, vec![fx.author.clone()]);

    let err = users
        .save(User::new("ann", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));

    let found = users.find_by_username("bob").await.unwrap();
    assert_eq!(found, Some(fx.readers[1].clone()));
}
