//! Three-way merge of the file-resident and database-resident libraries
//!
//! The merge decides what changed on which side and emits work for the
//! caller: an updated file-side list, rows the database must update, rows
//! the database must create, and a dirty flag for the file. It never
//! performs any persistence itself.

use crate::error::ReconcileError;
use crate::types::{Manga, User};
use std::collections::HashMap;
use tracing::debug;

/// Everything a reconciliation run decided
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileOutcome {
    /// The full file-side list, mutated where the database won
    pub mangas: Vec<Manga>,

    /// Database rows that must be persisted with new values
    pub db_updates: Vec<Manga>,

    /// Titles the database has never seen; the caller routes these through
    /// its create path, which assigns uuids
    pub db_creates: Vec<Manga>,

    /// Whether the file-side list changed and must be written back
    pub dirty: bool,
}

/// Merge a file-resident library against a database snapshot
///
/// Titles match by lower-cased name. For titles on both sides the rules
/// fire in a fixed order: missing-field backfill from the database, then,
/// when both sides carry a timestamp, the newer one wins whole, then the
/// larger chapter wins with `None` behind everything. A pair that already
/// agrees contributes nothing, so reconciling a reconciled result is a
/// no-op.
pub fn reconcile(
    user: &User,
    file_mangas: Vec<Manga>,
    db_mangas: Vec<Manga>,
) -> Result<ReconcileOutcome, ReconcileError> {
    if user.uuid.is_none() {
        return Err(ReconcileError::MissingUser);
    }
    if file_mangas.is_empty() && db_mangas.is_empty() {
        return Err(ReconcileError::NoData);
    }

    let mut db_by_key: HashMap<String, Manga> =
        db_mangas.iter().map(|m| (m.key(), m.clone())).collect();

    let mut outcome = ReconcileOutcome {
        mangas: file_mangas,
        ..Default::default()
    };

    for manga in &mut outcome.mangas {
        let Some(mut db) = db_by_key.remove(&manga.key()) else {
            // file-only title, queue for the database create path; the
            // store will assign a uuid, which must land back in the file
            if manga.uuid.is_none() {
                outcome.dirty = true;
            }
            outcome.db_creates.push(manga.clone());
            continue;
        };

        let mut queue_db = false;

        // 1. backfill fields the file copy lacks
        if manga.uuid.is_none() {
            debug!(name = %manga.name, "backfilling uuid from database");
            manga.uuid = db.uuid;
            outcome.dirty = true;
        }
        if manga.created.is_none() {
            manga.created = db.created;
            outcome.dirty = true;
        }
        if manga.updated.is_none() {
            manga.updated = db.updated;
            outcome.dirty = true;
        }
        if manga.name.is_empty() {
            manga.name = db.name.clone();
            outcome.dirty = true;
        }

        // 2. the side with the newer timestamp wins whole; the rule needs
        // a timestamp on both sides, otherwise only chapters are compared
        let stamped = db.updated.zip(manga.updated);
        if stamped.is_some_and(|(theirs, ours)| theirs < ours) {
            debug!(name = %manga.name, "file copy newer, updating database");
            db.name = manga.name.clone();
            db.chapter = manga.chapter;
            db.updated = manga.updated;
            queue_db = true;
        } else if stamped.is_some_and(|(theirs, ours)| theirs > ours) {
            debug!(name = %db.name, "database copy newer, updating file");
            manga.name = db.name.clone();
            manga.chapter = db.chapter;
            manga.updated = db.updated;
            outcome.dirty = true;
        } else if db.chapter != manga.chapter {
            // 3. equal timestamps, the larger chapter wins; None is
            // always behind a concrete value
            if chapter_behind(manga.chapter, db.chapter) {
                debug!(name = %manga.name, from = ?manga.chapter, to = ?db.chapter, "advancing file chapter");
                manga.chapter = db.chapter;
                outcome.dirty = true;
            } else if chapter_behind(db.chapter, manga.chapter) {
                debug!(name = %db.name, from = ?db.chapter, to = ?manga.chapter, "advancing database chapter");
                db.chapter = manga.chapter;
                queue_db = true;
            }
        }

        if queue_db {
            outcome.db_updates.push(db);
        }
    }

    // database-only titles join the file list
    for db in db_mangas {
        if db_by_key.remove(&db.key()).is_some() {
            outcome.mangas.push(db);
            outcome.dirty = true;
        }
    }

    Ok(outcome)
}

/// Whether `a` is behind `b`: absent, or numerically smaller
fn chapter_behind(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, Some(_)) => true,
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}
