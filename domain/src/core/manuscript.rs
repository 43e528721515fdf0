//! Manuscript value objects

use serde::{Deserialize, Serialize};

/// Metadata accompanying a submitted manuscript.
///
/// Metadata is validated lazily: missing or malformed fields degrade to
/// defaults rather than blocking analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManuscriptMeta {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub format: String,
    pub page_count: Option<u32>,
}

impl Default for ManuscriptMeta {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            author: "Unknown".to_string(),
            genre: "Unspecified".to_string(),
            format: "Manuscript".to_string(),
            page_count: None,
        }
    }
}

impl ManuscriptMeta {
    /// Build metadata from loosely-validated fields, falling back to
    /// defaults for anything empty or missing.
    pub fn from_loose(
        title: Option<&str>,
        author: Option<&str>,
        genre: Option<&str>,
        format: Option<&str>,
        page_count: Option<u32>,
    ) -> Self {
        let defaults = Self::default();
        let pick = |value: Option<&str>, default: String| match value {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => default,
        };
        Self {
            title: pick(title, defaults.title),
            author: pick(author, defaults.author),
            genre: pick(genre, defaults.genre),
            format: pick(format, defaults.format),
            page_count,
        }
    }
}

/// A manuscript submitted for panel analysis (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manuscript {
    text: String,
    meta: ManuscriptMeta,
}

impl Manuscript {
    /// Create a new manuscript.
    ///
    /// # Panics
    /// Panics if the text is empty or only whitespace
    pub fn new(text: impl Into<String>, meta: ManuscriptMeta) -> Self {
        let text = text.into();
        assert!(!text.trim().is_empty(), "Manuscript cannot be empty");
        Self { text, meta }
    }

    /// Try to create a new manuscript, returning None if the text is empty
    pub fn try_new(text: impl Into<String>, meta: ManuscriptMeta) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self { text, meta })
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn meta(&self) -> &ManuscriptMeta {
        &self.meta
    }

    /// A short excerpt of the opening text, for logs and progress display.
    pub fn excerpt(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            self.text.clone()
        } else {
            let cut: String = self.text.chars().take(max_chars).collect();
            format!("{}…", cut.trim_end())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manuscript_creation() {
        let m = Manuscript::new("Call me Ishmael.", ManuscriptMeta::default());
        assert_eq!(m.text(), "Call me Ishmael.");
        assert_eq!(m.meta().title, "Untitled");
    }

    #[test]
    fn test_try_new_empty() {
        assert!(Manuscript::try_new("   ", ManuscriptMeta::default()).is_none());
    }

    #[test]
    fn test_meta_from_loose_degrades() {
        let meta = ManuscriptMeta::from_loose(Some("  "), Some("A. Writer"), None, None, Some(312));
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.author, "A. Writer");
        assert_eq!(meta.page_count, Some(312));
    }

    #[test]
    fn test_excerpt_truncates() {
        let m = Manuscript::new("abcdefghij", ManuscriptMeta::default());
        assert_eq!(m.excerpt(4), "abcd…");
        assert_eq!(m.excerpt(100), "abcdefghij");
    }
}
