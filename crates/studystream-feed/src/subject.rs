//! Subjects.

use super::*;

/// The fixed set of subjects a post can be filed under.
/// String forms are exact and case-sensitive; they match what the
/// post forms offer in their subject dropdowns.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Subject {
    Mathematics,
    Physics,
    #[serde(rename = "Computer Science")]
    ComputerScience,
    Literature,
    History,
    #[serde(rename = "Web Development")]
    WebDevelopment,
}

impl Subject {
    /// All subjects, in dropdown order.
    pub fn all() -> &'static [Subject] {
        &[
            Subject::Mathematics,
            Subject::Physics,
            Subject::ComputerScience,
            Subject::Literature,
            Subject::History,
            Subject::WebDevelopment,
        ]
    }

    /// The canonical display string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::Physics => "Physics",
            Subject::ComputerScience => "Computer Science",
            Subject::Literature => "Literature",
            Subject::History => "History",
            Subject::WebDevelopment => "Web Development",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Subject {
    type Error = ();
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        for subject in Subject::all() {
            if subject.as_str() == value {
                return Ok(*subject);
            }
        }
        Err(())
    }
}
