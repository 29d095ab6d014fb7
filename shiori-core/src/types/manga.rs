//! A tracked serialized title and the reader's progress in it

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A serialized work tracked by a reader
///
/// `chapter` is the last chapter the reader consumed, `latest_chapter` the
/// highest chapter known to exist anywhere. Titles are matched across
/// sources and stores by case-insensitive name, with uuid equality as a
/// secondary match when both sides carry one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manga {
    /// Stable identifier, assigned by the persistent store
    #[serde(default)]
    pub uuid: Option<Uuid>,

    /// Display name, also the matching key
    pub name: String,

    /// Last chapter read; `None` means nothing read yet
    #[serde(default)]
    pub chapter: Option<f64>,

    /// Highest chapter observed anywhere, independent of any reader
    #[serde(default)]
    pub latest_chapter: f64,

    /// Source locations backing the current `chapter` value
    #[serde(default)]
    pub urls: Vec<String>,

    /// Creation timestamp (naive UTC)
    #[serde(default)]
    pub created: Option<NaiveDateTime>,

    /// Last modification timestamp (naive UTC)
    #[serde(default)]
    pub updated: Option<NaiveDateTime>,
}

impl Manga {
    /// Create a new tracked title with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: None,
            name: name.into(),
            chapter: None,
            latest_chapter: 0.0,
            urls: Vec::new(),
            created: None,
            updated: None,
        }
    }

    /// Lower-cased name, the matching key across sources and stores
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Whether this record matches another by name or uuid
    pub fn matches(&self, other: &Manga) -> bool {
        if !self.name.is_empty() && !other.name.is_empty() {
            if self.key() == other.key() {
                return true;
            }
        }
        match (self.uuid, other.uuid) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
