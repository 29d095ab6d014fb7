//! Persistent-store client interface
//!
//! The core never executes SQL; it talks to the store through this trait
//! and only decides what should be written. A concrete SQLite client lives
//! in the `shiori-store` crate.

use crate::error::{Result, ShioriError, StoreError};
use crate::types::{Manga, User};
use tracing::info;
use uuid::Uuid;

/// Filter for manga lookups; uuid takes precedence over name when present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MangaFilter {
    pub uuid: Option<Uuid>,
    pub name: Option<String>,
}

impl MangaFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            uuid: None,
            name: Some(name.into()),
        }
    }

    pub fn by_uuid(uuid: Uuid) -> Self {
        Self {
            uuid: Some(uuid),
            name: None,
        }
    }
}

/// A relational store holding titles, readers and read-progress rows
///
/// `Conflict` results signal a unique-constraint collision and are
/// recoverable; callers typically retry a create as an update.
pub trait StoreClient {
    /// Titles matching the filter, all titles for an empty filter
    fn manga_get(&mut self, filter: &MangaFilter) -> std::result::Result<Vec<Manga>, StoreError>;

    /// Insert a title row; assigns uuid and timestamps when missing
    fn manga_create(&mut self, manga: &mut Manga) -> std::result::Result<usize, StoreError>;

    /// Insert a reader row; assigns uuid and timestamps when missing
    fn user_create(&mut self, user: &mut User) -> std::result::Result<usize, StoreError>;

    /// Readers matching the populated fields of the example
    fn user_get(&mut self, example: &User) -> std::result::Result<Vec<User>, StoreError>;

    /// All titles the given reader tracks, with their read progress
    fn read_get(&mut self, user: &User) -> std::result::Result<Vec<Manga>, StoreError>;

    /// Associate a title with a reader
    fn read_create(&mut self, user: &User, manga: &Manga)
        -> std::result::Result<usize, StoreError>;

    /// Persist new progress for a reader's title
    fn read_update(&mut self, user: &User, manga: &Manga)
        -> std::result::Result<usize, StoreError>;

    /// Commit outstanding writes
    fn commit(&mut self) -> std::result::Result<(), StoreError>;
}

/// Result of routing one title through the create path
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The read association was created
    Added,
    /// More than one stored title matched the name; the caller must pick
    Ambiguous(Vec<Manga>),
}

/// Start tracking a title for a reader
///
/// Looks the title up by name, creates the title row when the store has
/// never seen it, adopts the stored identity fields into `manga`, then
/// creates the read association and commits.
pub fn add_for_user<S: StoreClient + ?Sized>(
    store: &mut S,
    user: &User,
    manga: &mut Manga,
) -> Result<AddOutcome> {
    if user.uuid.is_none() {
        return Err(ShioriError::InvalidInput("user has no uuid".into()));
    }
    if manga.uuid.is_none() && manga.name.is_empty() {
        return Err(ShioriError::InvalidInput(
            "manga has neither uuid nor name".into(),
        ));
    }

    if manga.uuid.is_none() {
        let mut found = store.manga_get(&MangaFilter::by_name(&manga.name))?;
        if found.is_empty() {
            info!(name = %manga.name, "creating new manga");
            if store.manga_create(manga)? == 0 {
                return Err(StoreError::Failure("manga not created".into()).into());
            }
            found = store.manga_get(&MangaFilter::by_name(&manga.name))?;
        }
        match found.len() {
            0 => return Err(StoreError::Failure("manga not found after create".into()).into()),
            1 => {
                let stored = &found[0];
                manga.uuid = stored.uuid;
                manga.created = stored.created;
                manga.updated = stored.updated;
            }
            _ => return Ok(AddOutcome::Ambiguous(found)),
        }
    }

    if store.read_create(user, manga)? == 0 {
        return Err(StoreError::Failure("read association not created".into()).into());
    }
    store.commit()?;
    Ok(AddOutcome::Added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    /// Minimal in-memory store covering the trait surface
    #[derive(Default)]
    struct MemStore {
        mangas: Vec<Manga>,
        reads: HashMap<Uuid, Vec<Uuid>>,
        committed: usize,
    }

    impl StoreClient for MemStore {
        fn manga_get(
            &mut self,
            filter: &MangaFilter,
        ) -> std::result::Result<Vec<Manga>, StoreError> {
            Ok(self
                .mangas
                .iter()
                .filter(|m| match (&filter.uuid, &filter.name) {
                    (Some(uuid), _) => m.uuid == Some(*uuid),
                    (None, Some(name)) => m.key() == name.to_lowercase(),
                    (None, None) => true,
                })
                .cloned()
                .collect())
        }

        fn manga_create(&mut self, manga: &mut Manga) -> std::result::Result<usize, StoreError> {
            if self.mangas.iter().any(|m| m.key() == manga.key()) {
                return Err(StoreError::Conflict(manga.name.clone()));
            }
            let now = Utc::now().naive_utc();
            manga.uuid.get_or_insert_with(Uuid::new_v4);
            manga.created.get_or_insert(now);
            manga.updated.get_or_insert(now);
            self.mangas.push(manga.clone());
            Ok(1)
        }

        fn user_create(&mut self, _user: &mut User) -> std::result::Result<usize, StoreError> {
            Ok(1)
        }

        fn user_get(&mut self, _example: &User) -> std::result::Result<Vec<User>, StoreError> {
            Ok(Vec::new())
        }

        fn read_get(&mut self, _user: &User) -> std::result::Result<Vec<Manga>, StoreError> {
            Ok(Vec::new())
        }

        fn read_create(
            &mut self,
            user: &User,
            manga: &Manga,
        ) -> std::result::Result<usize, StoreError> {
            let user_uuid = user.uuid.expect("checked by caller");
            let manga_uuid = manga.uuid.expect("assigned before association");
            let reads = self.reads.entry(user_uuid).or_default();
            if reads.contains(&manga_uuid) {
                return Err(StoreError::Conflict(manga.name.clone()));
            }
            reads.push(manga_uuid);
            Ok(1)
        }

        fn read_update(
            &mut self,
            _user: &User,
            _manga: &Manga,
        ) -> std::result::Result<usize, StoreError> {
            Ok(1)
        }

        fn commit(&mut self) -> std::result::Result<(), StoreError> {
            self.committed += 1;
            Ok(())
        }
    }

    fn reader() -> User {
        let mut u = User::new("Kana", "Arima");
        u.uuid = Some(Uuid::new_v4());
        u
    }

    #[test]
    fn test_add_creates_title_and_adopts_identity() {
        let mut store = MemStore::default();
        let user = reader();
        let mut manga = Manga::new("Dai Dark");
        let outcome = add_for_user(&mut store, &user, &mut manga).unwrap();
        assert_eq!(outcome, AddOutcome::Added);
        assert!(manga.uuid.is_some());
        assert!(manga.created.is_some());
        assert_eq!(store.committed, 1);
    }

    #[test]
    fn test_add_reuses_existing_title_row() {
        let mut store = MemStore::default();
        let mut existing = Manga::new("Dai Dark");
        store.manga_create(&mut existing).unwrap();

        let user = reader();
        let mut manga = Manga::new("dai dark");
        add_for_user(&mut store, &user, &mut manga).unwrap();
        assert_eq!(manga.uuid, existing.uuid);
        assert_eq!(store.mangas.len(), 1);
    }

    #[test]
    fn test_duplicate_association_surfaces_conflict() {
        let mut store = MemStore::default();
        let user = reader();
        let mut manga = Manga::new("Dai Dark");
        add_for_user(&mut store, &user, &mut manga).unwrap();
        let err = add_for_user(&mut store, &user, &mut manga.clone()).unwrap_err();
        assert!(matches!(
            err,
            ShioriError::Store(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut store = MemStore::default();
        let no_uuid = User::new("A", "B");
        let mut manga = Manga::new("X");
        assert!(matches!(
            add_for_user(&mut store, &no_uuid, &mut manga),
            Err(ShioriError::InvalidInput(_))
        ));

        let user = reader();
        let mut nameless = Manga::new("");
        assert!(matches!(
            add_for_user(&mut store, &user, &mut nameless),
            Err(ShioriError::InvalidInput(_))
        ));
    }
}
