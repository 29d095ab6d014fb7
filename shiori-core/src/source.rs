//! Chapter sources and the candidate normalizer
//!
//! A source adapter turns a web page into a [`RawListing`] of loosely-typed
//! records. The normalizer validates each record into a
//! [`Candidate`] triple (name, chapter number, location) or rejects it.

use crate::error::SourceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// A scraped field: sites report either one value or a list of alternatives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// First value, the fallback rule for `name` and `link` fields
    pub fn first(&self) -> Option<&str> {
        match self {
            FieldValue::One(v) => Some(v),
            FieldValue::Many(vs) => vs.first().map(|s| s.as_str()),
        }
    }

    /// All values, used for `number` fields where a list means several
    /// sub-chapters bundled in one entry
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        match self {
            FieldValue::One(v) => std::slice::from_ref(v).iter(),
            FieldValue::Many(vs) => vs.iter(),
        }
        .map(|s| s.as_str())
    }
}

/// One raw scraped chapter entry, any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub name: Option<FieldValue>,

    #[serde(default)]
    pub number: Option<FieldValue>,

    #[serde(default)]
    pub link: Option<FieldValue>,
}

impl RawRecord {
    /// Whether the record carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.number.is_none() && self.link.is_none()
    }
}

/// A source's complete scraped listing
///
/// `chapters` is `None` when the page lacked the structure that carries
/// chapter entries, which the index builder treats as an empty contribution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub chapters: Option<Vec<RawRecord>>,
}

/// A validated chapter candidate produced by [`normalize`]
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Trimmed display name, may be empty (such entries never match a
    /// reader's titles but still fold into the index)
    pub name: String,

    /// Parsed chapter number
    pub chapter: f64,

    /// Absolute location of the chapter
    pub url: String,
}

/// An external listing provider
#[async_trait]
pub trait Source: Send + Sync {
    /// Base location, also used to resolve relative chapter links
    fn base_url(&self) -> &Url;

    /// Retrieve the raw listing
    async fn fetch(&self) -> std::result::Result<RawListing, SourceError>;

    /// Pre-normalization trimming of a fetched listing
    fn shrink(&self, raw: RawListing) -> RawListing {
        raw
    }
}

/// Validate one raw record into a chapter candidate
///
/// The chapter number is the maximum over all parseable `number` values;
/// a record with no parseable number is rejected. The link is trimmed and
/// resolved against `base`.
pub fn normalize(record: &RawRecord, base: &Url) -> Option<Candidate> {
    let chapter = record
        .number
        .as_ref()?
        .candidates()
        .filter_map(|raw| raw.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .fold(None::<f64>, |max, n| match max {
            Some(m) if m >= n => Some(m),
            _ => Some(n),
        })?;

    let name = record
        .name
        .as_ref()
        .and_then(FieldValue::first)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let url = record
        .link
        .as_ref()
        .and_then(FieldValue::first)
        .map(str::trim)
        .and_then(|link| base.join(link).ok())
        .map(|u| u.to_string())
        .unwrap_or_default();

    Some(Candidate { name, chapter, url })
}
