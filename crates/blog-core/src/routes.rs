//! Named routes the blog entities link to.
//!
//! The route table itself lives in the web layer; these are the two paths
//! the persistence layer needs to build canonical links.

/// A named route with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Detail page of a single post, keyed by slug.
    PostDetail { slug: &'a str },
    /// Listing of posts carrying a tag, keyed by tag title.
    TagFilter { tag_title: &'a str },
}

impl Route<'_> {
    /// Route name as registered by the web layer.
    pub fn name(&self) -> &'static str {
        match self {
            Route::PostDetail { .. } => "post_detail",
            Route::TagFilter { .. } => "tag_filter",
        }
    }

    /// Build the path for this route. Arguments are percent-encoded.
    pub fn reverse(&self) -> String {
        match self {
            Route::PostDetail { slug } => format!("/post/{}/", urlencoding::encode(slug)),
            Route::TagFilter { tag_title } => {
                format!("/tag/{}/", urlencoding::encode(tag_title))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_names() {
        assert_eq!(Route::PostDetail { slug: "a" }.name(), "post_detail");
        assert_eq!(Route::TagFilter { tag_title: "a" }.name(), "tag_filter");
    }

    #[test]
    fn test_reverse_encodes_arguments() {
        let route = Route::TagFilter { tag_title: "c++ tips" };
        assert_eq!(route.reverse(), "/tag/c%2B%2B%20tips/");
    }
}
