//! Update detection: reader progress vs. the availability index

use crate::types::{ChapterIndex, Manga, User};
use std::collections::HashMap;

/// Return the subset of a reader's titles that have unseen chapters
///
/// A title produces an update when its lower-cased name is in the index,
/// both its recorded chapter and the index chapter are present, and the
/// recorded chapter is strictly behind. Results follow the order of the
/// reader's list and carry the reader's uuid so they can be matched back.
pub fn detect_updates(mangas: &[Manga], index: &ChapterIndex) -> Vec<Manga> {
    let mut updates = Vec::new();
    for manga in mangas {
        if manga.name.is_empty() {
            continue;
        }
        let Some(entry) = index.get(&manga.key()) else {
            continue;
        };
        let Some(read) = manga.chapter else {
            continue;
        };
        if read < entry.chapter {
            updates.push(entry.to_manga(manga.uuid));
        }
    }
    updates
}

/// Run [`detect_updates`] for many readers against one shared index
///
/// Keyed by [`User::identity`], so one index build serves every reader.
pub fn detect_updates_batch(
    readers: &[(User, Vec<Manga>)],
    index: &ChapterIndex,
) -> HashMap<String, Vec<Manga>> {
    readers
        .iter()
        .map(|(user, mangas)| (user.identity(), detect_updates(mangas, index)))
        .collect()
}
