//! Sync command implementation

use crate::config::Settings;
use anyhow::Result;
use shiori_core::{
    add_for_user, reconcile, AddOutcome, Manga, MangaFilter, ShioriError, StoreClient, StoreError,
};
use shiori_store::SqliteStore;
use std::path::Path;
use tracing::{debug, warn};

/// Reconcile the library file against the database and persist both sides
pub fn sync(settings: &Settings, manga_file: Option<&Path>) -> Result<()> {
    let (path, mut library) = super::load_library(settings, manga_file)?;
    let mut store = SqliteStore::open(&settings.database)?;

    let user = library.user.clone();
    let db_mangas = store.read_get(&user)?;
    let outcome = reconcile(&user, std::mem::take(&mut library.mangas), db_mangas)?;
    library.mangas = outcome.mangas;
    let mut dirty = outcome.dirty;

    let create_count = outcome.db_creates.len();
    if !outcome.db_creates.is_empty() {
        debug!(
            "missing from db:\n{}",
            super::format_mangas(&outcome.db_creates)
        );
    }
    for mut pending in outcome.db_creates {
        let settled = match add_for_user(&mut store, &user, &mut pending) {
            Ok(AddOutcome::Added) => true,
            Ok(AddOutcome::Ambiguous(found)) => {
                warn!(
                    name = %pending.name,
                    matches = found.len(),
                    "several stored titles match, not syncing this one"
                );
                false
            }
            Err(ShioriError::Store(StoreError::Conflict(_))) => {
                // title already in the store for this reader; resolve the
                // stored identity, then push progress instead
                if let Some(stored) = store
                    .manga_get(&MangaFilter::by_name(&pending.name))?
                    .into_iter()
                    .next()
                {
                    pending.uuid = stored.uuid;
                    pending.created = stored.created;
                }
                if pending.chapter.is_some() {
                    store.read_update(&user, &pending)?;
                }
                true
            }
            Err(e) => return Err(e.into()),
        };
        // the store owns identity fields; carry them into the file copy
        if settled && adopt_identity(&mut library.mangas, &pending) {
            dirty = true;
        }
    }

    if !outcome.db_updates.is_empty() {
        debug!(
            "update in db:\n{}",
            super::format_mangas(&outcome.db_updates)
        );
    }
    for row in &outcome.db_updates {
        store.read_update(&user, row)?;
    }
    store.commit()?;

    if dirty {
        library.save(&path, true)?;
    }
    println!(
        "Synced: {} updated in db, {} created, file {}",
        outcome.db_updates.len(),
        create_count,
        if dirty { "rewritten" } else { "unchanged" }
    );
    Ok(())
}

/// Carry store-assigned identity fields into the matching file entry
fn adopt_identity(mangas: &mut [Manga], pending: &Manga) -> bool {
    let Some(mine) = mangas.iter_mut().find(|m| m.key() == pending.key()) else {
        return false;
    };
    if mine.uuid.is_none() && pending.uuid.is_some() {
        mine.uuid = pending.uuid;
        mine.created = pending.created;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_adopt_identity_fills_uuid_and_created() {
        let mut mine = Manga::new("Dai Dark");
        mine.chapter = Some(3.0);
        let mut pending = mine.clone();
        pending.uuid = Some(Uuid::new_v4());
        pending.created = Some(Utc::now().naive_utc());

        let mut mangas = vec![mine];
        assert!(adopt_identity(&mut mangas, &pending));
        assert_eq!(mangas[0].uuid, pending.uuid);
        assert_eq!(mangas[0].created, pending.created);

        // an entry that already has its identity is left alone
        assert!(!adopt_identity(&mut mangas, &pending));
    }

    #[test]
    fn test_adopt_identity_ignores_unknown_titles() {
        let mut pending = Manga::new("Elsewhere");
        pending.uuid = Some(Uuid::new_v4());
        let mut mangas = vec![Manga::new("Dai Dark")];
        assert!(!adopt_identity(&mut mangas, &pending));
        assert!(mangas[0].uuid.is_none());
    }
}
