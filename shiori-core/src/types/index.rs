//! The per-build canonical availability index

use super::Manga;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Canonical mapping from lower-cased title name to best-known availability
pub type ChapterIndex = BTreeMap<String, IndexEntry>;

/// Best-known chapter for one title within a single index build
///
/// `chapter` is the maximum chapter number observed across all sources so
/// far; `urls` holds exactly the locations that reported that maximum.
/// Entries are values: handing one back to a caller always goes through
/// [`IndexEntry::to_manga`], which copies, so the index is never aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Display name as reported by the winning source
    pub name: String,

    /// Highest chapter number observed for this title
    pub chapter: f64,

    /// Locations that reported the current maximum (ordered, deduplicated)
    pub urls: Vec<String>,

    /// When this entry was last touched within the build
    pub updated: NaiveDateTime,
}

impl IndexEntry {
    /// Build a fresh `Manga` from this entry, carrying the reader's uuid so
    /// the result can be matched back to the reader's own record
    pub fn to_manga(&self, uuid: Option<Uuid>) -> Manga {
        Manga {
            uuid,
            name: self.name.clone(),
            chapter: Some(self.chapter),
            latest_chapter: self.chapter,
            urls: self.urls.clone(),
            created: None,
            updated: Some(self.updated),
        }
    }
}
