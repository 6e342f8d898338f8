//! YouTube metadata generated from a video script.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Recommended upper bound for a title, in characters.
pub const TITLE_MAX_CHARS: usize = 60;

/// Recommended keyword count range (inclusive).
pub const KEYWORDS_RANGE: (usize, usize) = (10, 15);

/// Title, keywords and description produced for a single script.
///
/// Built from one remote call and never mutated afterwards. The
/// `validate()` rules only reject empty fields; the length bounds from the
/// prompt contract are advisory and reported by [`GeneratedMetadata::advisories`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GeneratedMetadata {
    /// SEO-friendly video title
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    /// Ordered list of tags
    #[validate(length(min = 1, message = "keywords must not be empty"))]
    pub keywords: Vec<String>,
    /// Long-form description including hashtags
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
}

/// Advisory deviation from the prompt contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataAdvisory {
    /// Title is at least [`TITLE_MAX_CHARS`] characters long
    TitleTooLong(usize),
    /// Keyword count falls outside [`KEYWORDS_RANGE`]
    KeywordCount(usize),
}

impl std::fmt::Display for MetadataAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataAdvisory::TitleTooLong(len) => {
                write!(f, "title has {} characters (recommended under {})", len, TITLE_MAX_CHARS)
            }
            MetadataAdvisory::KeywordCount(count) => write!(
                f,
                "{} keywords (recommended {}-{})",
                count, KEYWORDS_RANGE.0, KEYWORDS_RANGE.1
            ),
        }
    }
}

impl GeneratedMetadata {
    /// Create a metadata value.
    pub fn new(
        title: impl Into<String>,
        keywords: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            keywords,
            description: description.into(),
        }
    }

    /// List the advisory bounds this result does not meet.
    pub fn advisories(&self) -> Vec<MetadataAdvisory> {
        let mut out = Vec::new();

        let title_len = self.title.chars().count();
        if title_len >= TITLE_MAX_CHARS {
            out.push(MetadataAdvisory::TitleTooLong(title_len));
        }

        let count = self.keywords.len();
        if count < KEYWORDS_RANGE.0 || count > KEYWORDS_RANGE.1 {
            out.push(MetadataAdvisory::KeywordCount(count));
        }

        out
    }
}
