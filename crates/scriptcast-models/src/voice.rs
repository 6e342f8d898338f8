//! Synthetic voice descriptors.

use serde::{Deserialize, Serialize};

/// A voice offered by the platform speech engine.
///
/// `uri` is the unique identifier; descriptors are replaced wholesale
/// whenever the platform registry changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    pub uri: String,
    pub name: String,
    /// BCP 47 style language tag, e.g. `en-US`
    pub lang: String,
    #[serde(default)]
    pub is_default: bool,
}

impl VoiceDescriptor {
    /// Create a non-default voice descriptor.
    pub fn new(uri: impl Into<String>, name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            lang: lang.into(),
            is_default: false,
        }
    }

    /// Mark this voice as the platform default.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Case-insensitive language family match (`"en"` matches `en`, `en-GB`, `EN_us`).
    pub fn speaks(&self, family: &str) -> bool {
        self.lang
            .get(..family.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(family))
    }

    /// Label for pickers: `name (lang)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_family_match() {
        assert!(VoiceDescriptor::new("a", "A", "en-US").speaks("en"));
        assert!(VoiceDescriptor::new("b", "B", "EN-gb").speaks("en"));
        assert!(!VoiceDescriptor::new("c", "C", "fr-FR").speaks("en"));
        assert!(!VoiceDescriptor::new("d", "D", "e").speaks("en"));
    }

    #[test]
    fn test_camel_case_fields() {
        let voice = VoiceDescriptor::new("uri", "Name", "en").as_default();
        let json = serde_json::to_value(&voice).unwrap();
        assert_eq!(json["isDefault"], true);
        assert_eq!(voice.label(), "Name (en)");
    }
}
