//! Feed filtering.
//!
//! The feed is an already-ordered collection (newest-first, as the
//! document store returns it); filtering narrows it without ever
//! reordering, duplicating, or fabricating posts. The criteria are
//! transient view state, re-evaluated on every change.

use super::*;

/// User-chosen constraints narrowing a feed view.
/// A `None` selector means "all". Held only in request state;
/// never persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Subject selector. Matched by case-sensitive equality.
    #[serde(default)]
    pub subject: Option<Subject>,
    /// Kind selector.
    #[serde(default)]
    pub kind: Option<PostKind>,
    /// Free-text query. Matched case-insensitively as a substring of
    /// title or description. The query is not trimmed: a
    /// whitespace-only query is a literal substring match.
    #[serde(default)]
    pub query: String,
}

impl FilterCriteria {
    /// Criteria that match everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether these criteria constrain anything at all.
    pub fn is_unconstrained(&self) -> bool {
        self.subject.is_none() && self.kind.is_none() && self.query.is_empty()
    }

    /// Check whether a post passes all criteria.
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(subject) = self.subject {
            if post.subject() != subject {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if post.kind() != kind {
                return false;
            }
        }
        if !self.query.is_empty() {
            let query = self.query.to_lowercase();
            let in_title = post.title().to_lowercase().contains(&query);
            let in_description =
                post.description().to_lowercase().contains(&query);
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}

/// Produce the ordered subsequence of `posts` passing `criteria`.
/// Lazy and order-preserving; the input is never mutated.
pub fn filtered<'a>(
    posts: &'a [Post],
    criteria: &'a FilterCriteria,
) -> FilteredPosts<'a> {
    FilteredPosts {
        posts,
        criteria,
        next: 0,
    }
}

/// Iterator over the posts of a slice passing some criteria.
pub struct FilteredPosts<'a> {
    posts: &'a [Post],
    criteria: &'a FilterCriteria,
    next: usize,
}

impl<'a> Iterator for FilteredPosts<'a> {
    type Item = &'a Post;

    fn next(&mut self) -> Option<Self::Item> {
        for post in &self.posts[self.next..] {
            self.next += 1;
            if self.criteria.matches(post) {
                return Some(post);
            }
        }
        None
    }
}
