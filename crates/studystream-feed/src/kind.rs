//! Post kinds.

use super::*;

/// What sort of resource a post is.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PostKind {
    Note,
    Assignment,
    Project,
    StudyGuide,
}

impl PostKind {
    /// All kinds, in dropdown order.
    pub fn all() -> &'static [PostKind] {
        &[
            PostKind::Note,
            PostKind::Assignment,
            PostKind::Project,
            PostKind::StudyGuide,
        ]
    }

    /// The canonical wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Note => "note",
            PostKind::Assignment => "assignment",
            PostKind::Project => "project",
            PostKind::StudyGuide => "study-guide",
        }
    }
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PostKind {
    type Error = ();
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        for kind in PostKind::all() {
            if kind.as_str() == value {
                return Ok(*kind);
            }
        }
        Err(())
    }
}
