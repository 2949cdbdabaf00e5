use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Outcome of the smile classifier.
///
/// Persisted and rendered with the human-readable names `"Smiling"` and
/// `"Not Smiling"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Smiling")]
    Smiling,
    #[serde(rename = "Not Smiling")]
    NotSmiling,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smiling => "Smiling",
            Self::NotSmiling => "Not Smiling",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown label: {0:?}")]
pub struct UnknownLabel(pub String);

impl FromStr for Label {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Smiling" => Ok(Self::Smiling),
            "Not Smiling" => Ok(Self::NotSmiling),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// One row of classification history. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub id: i64,
    /// Relative path of the stored upload, e.g. `images/<uuid>.png`.
    pub image_path: String,
    pub label: Label,
    pub upload_date: DateTime<FixedOffset>,
}
