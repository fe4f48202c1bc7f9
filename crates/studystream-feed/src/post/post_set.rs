//! Post set storage and iteration.

use super::*;

/// Set of posts.
/// Posts are ordered newest-first, matching the ordering the
/// document store establishes, and deduplicated by id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostSet {
    posts: Vec<Post>,
    max_length: usize,
}

impl PostSet {
    /// Create new post set.
    pub fn new(max_length: usize) -> Self {
        Self {
            posts: Vec::with_capacity(max_length),
            max_length,
        }
    }

    /// Number of posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Clear all posts in the set.
    pub fn clear(&mut self) {
        self.posts.clear();
    }

    /// Add a post to the set.
    /// A post with an id already present is ignored.
    pub fn add(&mut self, post: Post) {
        for other in self.posts.iter() {
            if other.id() == post.id() {
                tracing::trace!("Skipping duplicate post {}.", post.id());
                return;
            }
        }
        self.posts.push(post);
    }

    /// Sort posts in the set.
    pub fn sort(&mut self) {
        // Sort oldest to newest.
        self.posts.sort();
        // Reverse from newest to oldest.
        self.posts.reverse();
        // Truncate for specific length.
        self.posts.truncate(self.max_length);
    }

    /// Get a slice of posts.
    pub fn as_slice(&self) -> &[Post] {
        &self.posts
    }

    /// Iterate over posts matching the criteria, in set order.
    pub fn filtered<'a>(
        &'a self,
        criteria: &'a FilterCriteria,
    ) -> FilteredPosts<'a> {
        filtered(self.as_slice(), criteria)
    }
}
