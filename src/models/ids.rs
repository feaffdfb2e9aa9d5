use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix appended to a raw synset offset to mark it as a noun synset.
const NOUN_SUFFIX: &str = "-n";

/// Unique identifier for a synset.
///
/// Wraps the `"<8-digit-offset>-n"` string so synset ids cannot be confused
/// with surface forms, glosses or other free text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynsetId(String);

impl SynsetId {
    /// Creates a synset id from an already suffixed value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a noun synset id from a raw offset as it appears in the data file.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyres::SynsetId;
    ///
    /// let id = SynsetId::from_offset("00001740");
    /// assert_eq!(id.as_str(), "00001740-n");
    /// assert_eq!(id.offset(), "00001740");
    /// ```
    pub fn from_offset(offset: &str) -> Self {
        Self(format!("{offset}{NOUN_SUFFIX}"))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the raw offset without the part-of-speech suffix.
    pub fn offset(&self) -> &str {
        self.0.strip_suffix(NOUN_SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for SynsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SynsetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SynsetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
