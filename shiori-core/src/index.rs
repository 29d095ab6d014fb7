//! Chapter index builder
//!
//! Runs every configured source, normalizes its listing and folds the
//! results into one canonical [`ChapterIndex`]. The fold keeps the maximum
//! chapter per title: a strictly higher chapter replaces the backing
//! locations, an equal chapter from another source extends them. The fold
//! is commutative and associative, so the final index is identical no
//! matter in which order or on how many tasks the sources were processed.

use crate::error::SourceError;
use crate::source::{normalize, Source};
use crate::types::{ChapterIndex, IndexEntry};
use chrono::{NaiveDateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// A shareable source handle, cloneable into concurrent build tasks
pub type DynSource = Arc<dyn Source>;

/// How the index builder schedules its sources
///
/// All modes produce an identical index for the same inputs; they differ
/// only in how much fetching overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// One source after another
    Sequential,
    /// A caller-sized pool: at most this many sources in flight at once
    Bounded(usize),
    /// One task per source, all joined before folding
    PerSource,
}

/// Best chapter seen for one title within a single source's listing
#[derive(Debug, Clone, PartialEq)]
struct SourceEntry {
    name: String,
    chapter: f64,
    urls: Vec<String>,
}

type SourcePartial = BTreeMap<String, SourceEntry>;

/// Build the canonical availability index across all sources
///
/// Returns `None` when no sources are configured at all. When every source
/// fails the index is present but empty, which is a different outcome.
pub async fn build_index(sources: &[DynSource], mode: BuildMode) -> Option<ChapterIndex> {
    if sources.is_empty() {
        error!("no sources configured");
        return None;
    }

    let partials: Vec<Option<SourcePartial>> = match mode {
        BuildMode::Sequential => {
            let mut results = Vec::with_capacity(sources.len());
            for source in sources {
                results.push(scrape_source(source.as_ref()).await);
            }
            results
        }
        BuildMode::Bounded(workers) => {
            stream::iter(sources.iter().cloned())
                .map(|source| async move { scrape_source(source.as_ref()).await })
                .buffered(workers.max(1))
                .collect()
                .await
        }
        BuildMode::PerSource => {
            let mut set = JoinSet::new();
            for source in sources.iter().cloned() {
                set.spawn(async move { scrape_source(source.as_ref()).await });
            }
            let mut results = Vec::with_capacity(sources.len());
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(partial) => results.push(partial),
                    Err(e) => {
                        error!(error = %e, "source task panicked");
                        results.push(None);
                    }
                }
            }
            results
        }
    };

    let now = Utc::now().naive_utc();
    let mut index = ChapterIndex::new();
    for partial in partials.into_iter().flatten() {
        for (key, entry) in partial {
            fold_entry(&mut index, key, entry, now);
        }
    }
    Some(index)
}

/// Fetch and normalize one source's listing into a per-source partial map
///
/// Every failure mode of a single source is contained here: unreachable
/// sources, malformed listings and listings without a chapter section all
/// log and contribute nothing.
async fn scrape_source(source: &dyn Source) -> Option<SourcePartial> {
    let raw = match source.fetch().await {
        Ok(raw) => raw,
        Err(SourceError::Unavailable(e)) => {
            error!(source = %source.base_url(), error = %e, "source unreachable");
            return None;
        }
        Err(SourceError::Malformed(e)) => {
            error!(source = %source.base_url(), error = %e, "malformed listing");
            return None;
        }
    };

    let raw = source.shrink(raw);
    let Some(records) = raw.chapters else {
        error!(source = %source.base_url(), "listing carries no chapter entries");
        return None;
    };

    let mut partial = SourcePartial::new();
    for record in &records {
        // records without a usable chapter number are silently discarded
        let Some(candidate) = normalize(record, source.base_url()) else {
            continue;
        };
        let key = candidate.name.to_lowercase();
        match partial.get_mut(&key) {
            None => {
                partial.insert(
                    key,
                    SourceEntry {
                        name: candidate.name,
                        chapter: candidate.chapter,
                        urls: vec![candidate.url],
                    },
                );
            }
            Some(entry) => {
                if candidate.chapter > entry.chapter {
                    entry.chapter = candidate.chapter;
                    entry.urls = vec![candidate.url];
                } else if candidate.chapter == entry.chapter
                    && !entry.urls.contains(&candidate.url)
                {
                    entry.urls.push(candidate.url);
                }
            }
        }
    }
    debug!(
        source = %source.base_url(),
        titles = partial.len(),
        "source contributed"
    );
    Some(partial)
}

/// Merge one per-source entry into the final index (max/replace/extend)
fn fold_entry(index: &mut ChapterIndex, key: String, entry: SourceEntry, now: NaiveDateTime) {
    match index.get_mut(&key) {
        None => {
            index.insert(
                key,
                IndexEntry {
                    name: entry.name,
                    chapter: entry.chapter,
                    urls: entry.urls,
                    updated: now,
                },
            );
        }
        Some(existing) => {
            existing.updated = now;
            if entry.chapter > existing.chapter {
                existing.chapter = entry.chapter;
                existing.urls = entry.urls;
            } else if entry.chapter == existing.chapter {
                for url in entry.urls {
                    if !existing.urls.contains(&url) {
                        existing.urls.push(url);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FieldValue, RawListing, RawRecord};
    use async_trait::async_trait;
    use url::Url;

    struct FakeSource {
        base: Url,
        listing: std::result::Result<RawListing, SourceError>,
    }

    impl FakeSource {
        fn with_chapters(base: &str, entries: &[(&str, &str, &str)]) -> DynSource {
            let records = entries
                .iter()
                .map(|(name, number, link)| RawRecord {
                    name: Some(FieldValue::One(name.to_string())),
                    number: Some(FieldValue::One(number.to_string())),
                    link: Some(FieldValue::One(link.to_string())),
                })
                .collect();
            Arc::new(FakeSource {
                base: Url::parse(base).unwrap(),
                listing: Ok(RawListing {
                    chapters: Some(records),
                }),
            })
        }

        fn failing(base: &str, err: SourceError) -> DynSource {
            Arc::new(FakeSource {
                base: Url::parse(base).unwrap(),
                listing: Err(err),
            })
        }

        fn without_chapter_section(base: &str) -> DynSource {
            Arc::new(FakeSource {
                base: Url::parse(base).unwrap(),
                listing: Ok(RawListing { chapters: None }),
            })
        }
    }

    #[async_trait]
    impl Source for FakeSource {
        fn base_url(&self) -> &Url {
            &self.base
        }

        async fn fetch(&self) -> std::result::Result<RawListing, SourceError> {
            match &self.listing {
                Ok(listing) => Ok(listing.clone()),
                Err(SourceError::Unavailable(e)) => Err(SourceError::Unavailable(e.clone())),
                Err(SourceError::Malformed(e)) => Err(SourceError::Malformed(e.clone())),
            }
        }
    }

    fn two_sources() -> Vec<DynSource> {
        vec![
            FakeSource::with_chapters(
                "https://a.example/",
                &[("Dai Dark", "3", "/dai-dark/3"), ("Blame!", "5", "/blame/5")],
            ),
            FakeSource::with_chapters(
                "https://b.example/",
                &[("Dai Dark", "5", "/dd/5"), ("Blame!", "5", "/b/5")],
            ),
        ]
    }

    #[tokio::test]
    async fn test_higher_chapter_replaces_urls() {
        let index = build_index(&two_sources(), BuildMode::Sequential)
            .await
            .unwrap();
        let entry = &index["dai dark"];
        assert_eq!(entry.chapter, 5.0);
        assert_eq!(entry.urls, vec!["https://b.example/dd/5".to_string()]);
    }

    #[tokio::test]
    async fn test_equal_chapter_extends_urls() {
        let index = build_index(&two_sources(), BuildMode::Sequential)
            .await
            .unwrap();
        let entry = &index["blame!"];
        assert_eq!(entry.chapter, 5.0);
        assert_eq!(
            entry.urls,
            vec![
                "https://a.example/blame/5".to_string(),
                "https://b.example/b/5".to_string()
            ]
        );
    }

    // strip the build timestamp so indexes from separate runs compare
    fn shape(index: &ChapterIndex) -> Vec<(String, String, f64, Vec<String>)> {
        index
            .iter()
            .map(|(k, e)| (k.clone(), e.name.clone(), e.chapter, e.urls.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_all_modes_agree() {
        let sources = two_sources();
        let seq = build_index(&sources, BuildMode::Sequential).await.unwrap();
        let pool = build_index(&sources, BuildMode::Bounded(2)).await.unwrap();
        let spawned = build_index(&sources, BuildMode::PerSource).await.unwrap();
        assert_eq!(shape(&seq), shape(&pool));
        assert_eq!(shape(&seq), shape(&spawned));
    }

    #[tokio::test]
    async fn test_no_sources_is_none() {
        assert!(build_index(&[], BuildMode::Sequential).await.is_none());
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_empty_index() {
        let sources = vec![
            FakeSource::failing(
                "https://down.example/",
                SourceError::Unavailable("connection refused".into()),
            ),
            FakeSource::without_chapter_section("https://odd.example/"),
        ];
        let index = build_index(&sources, BuildMode::Sequential).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_failing_source_does_not_abort_build() {
        let mut sources = two_sources();
        sources.push(FakeSource::failing(
            "https://down.example/",
            SourceError::Malformed("no table".into()),
        ));
        let index = build_index(&sources, BuildMode::PerSource).await.unwrap();
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_within_source_keeps_max_per_title() {
        let sources = vec![FakeSource::with_chapters(
            "https://a.example/",
            &[
                ("Dorohedoro", "2", "/d/2"),
                ("Dorohedoro", "9", "/d/9"),
                ("Dorohedoro", "4", "/d/4"),
            ],
        )];
        let index = build_index(&sources, BuildMode::Sequential).await.unwrap();
        let entry = &index["dorohedoro"];
        assert_eq!(entry.chapter, 9.0);
        assert_eq!(entry.urls, vec!["https://a.example/d/9".to_string()]);
    }
}
