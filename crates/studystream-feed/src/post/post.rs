//! A shared resource post.

use super::*;

/// Opaque, unique post identifier.
/// Assigned by the document store; never interpreted here.
#[derive(
    Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct PostId(String);

impl PostId {
    /// Create a post id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        PostId(value.into())
    }
}

/// A single shared resource: a note, assignment, project, or study
/// guide, with associated metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    // Post fields.
    /// Unique id within a collection.
    id: PostId,
    /// Post title.
    title: String,
    /// Post description.
    description: String,
    /// Author display name.
    author: String,
    /// Author identifier, from the identity provider.
    author_id: String,
    /// Author avatar url.
    avatar: String,
    /// Subject the post is filed under.
    subject: Subject,
    /// What sort of resource this is.
    kind: PostKind,
    /// Creation timestamp. Immutable once set.
    created: DateTime,
    /// Due date, for assignments.
    due: Option<DateTime>,
    /// Like count.
    likes: u32,
    /// Comment count.
    comments: u32,
    /// Attached files, in upload order.
    attachments: Vec<Attachment>,
}

impl Post {
    /// Get the post id.
    pub fn id(&self) -> &PostId {
        &self.id
    }

    /// Get the title.
    pub fn title(&self) -> &String {
        &self.title
    }

    /// Get the description.
    pub fn description(&self) -> &String {
        &self.description
    }

    /// Get the author display name.
    pub fn author(&self) -> &String {
        &self.author
    }

    /// Get the author id.
    pub fn author_id(&self) -> &String {
        &self.author_id
    }

    /// Get the avatar url.
    pub fn avatar(&self) -> &String {
        &self.avatar
    }

    /// Get the subject.
    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// Get the kind.
    pub fn kind(&self) -> PostKind {
        self.kind
    }

    /// Get the creation timestamp.
    pub fn created(&self) -> &DateTime {
        &self.created
    }

    /// Get the due date, if any.
    pub fn due(&self) -> Option<&DateTime> {
        self.due.as_ref()
    }

    /// Get the like count.
    pub fn likes(&self) -> u32 {
        self.likes
    }

    /// Get the comment count.
    pub fn comments(&self) -> u32 {
        self.comments
    }

    /// Get the attachments.
    pub fn attachments(&self) -> &Vec<Attachment> {
        &self.attachments
    }

    /// Check whether this post was written by a user.
    pub fn is_by(&self, author_id: impl AsRef<str>) -> bool {
        self.author_id == author_id.as_ref()
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Post) -> bool {
        self.id == other.id
    }
}

impl Eq for Post {}

impl PartialOrd for Post {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Post {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Chronological, with the id as a stable tiebreak.
        self.created
            .cmp(&other.created)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl std::hash::Hash for Post {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Builder helper for posts.
pub struct PostBuilder {
    id: Option<PostId>,
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
    author_id: Option<String>,
    avatar: Option<String>,
    subject: Option<Subject>,
    kind: Option<PostKind>,
    created: Option<DateTime>,
    due: Option<DateTime>,
    likes: u32,
    comments: u32,
    attachments: Vec<Attachment>,
}

impl PostBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            id: None,
            title: None,
            description: None,
            author: None,
            author_id: None,
            avatar: None,
            subject: None,
            kind: None,
            created: None,
            due: None,
            likes: 0,
            comments: 0,
            attachments: Vec::new(),
        }
    }

    /// Set the id.
    pub fn id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = Some(PostId::new(id));
        self
    }

    /// Set the title.
    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Set the author display name.
    pub fn author(&mut self, author: impl Into<String>) -> &mut Self {
        self.author = Some(author.into());
        self
    }

    /// Set the author id.
    pub fn author_id(&mut self, author_id: impl Into<String>) -> &mut Self {
        self.author_id = Some(author_id.into());
        self
    }

    /// Set the avatar url.
    pub fn avatar(&mut self, avatar: impl Into<String>) -> &mut Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Set the subject.
    pub fn subject(&mut self, subject: Subject) -> &mut Self {
        self.subject = Some(subject);
        self
    }

    /// Set the kind.
    pub fn kind(&mut self, kind: PostKind) -> &mut Self {
        self.kind = Some(kind);
        self
    }

    /// Set the creation timestamp.
    pub fn created(&mut self, created: DateTime) -> &mut Self {
        self.created = Some(created);
        self
    }

    /// Set the due date.
    pub fn due(&mut self, due: DateTime) -> &mut Self {
        self.due = Some(due);
        self
    }

    /// Set the like count.
    pub fn likes(&mut self, likes: u32) -> &mut Self {
        self.likes = likes;
        self
    }

    /// Set the comment count.
    pub fn comments(&mut self, comments: u32) -> &mut Self {
        self.comments = comments;
        self
    }

    /// Add an attachment.
    pub fn attachment(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Build into a post.
    pub fn build(&self) -> Post {
        Post {
            id: self
                .id
                .clone()
                .unwrap_or_else(|| PostId::new("")),
            title: self.title.clone().unwrap_or_else(|| "".to_string()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| "".to_string()),
            author: self
                .author
                .clone()
                .unwrap_or_else(|| "Anonymous".to_string()),
            author_id: self
                .author_id
                .clone()
                .unwrap_or_else(|| "".to_string()),
            avatar: self
                .avatar
                .clone()
                .unwrap_or_else(|| "/default-avatar.png".to_string()),
            subject: self.subject.unwrap_or(Subject::Mathematics),
            kind: self.kind.unwrap_or(PostKind::Note),
            created: self.created.clone().unwrap_or_else(|| DateTime::now()),
            due: self.due.clone(),
            likes: self.likes,
            comments: self.comments,
            attachments: self.attachments.clone(),
        }
    }
}

impl From<PostBuilder> for Post {
    fn from(value: PostBuilder) -> Self {
        value.build()
    }
}

/// An attached file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Public url of the stored blob.
    pub url: String,
    /// Original file name.
    pub name: String,
    /// The attachment's mime-type.
    pub mime_type: Option<String>,
}

impl Attachment {
    /// Create a new attachment.
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            mime_type: None,
        }
    }

    /// Create a new attachment with a mime-type.
    pub fn new_with_mime(
        url: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            mime_type: Some(mime_type.into()),
        }
    }
}
