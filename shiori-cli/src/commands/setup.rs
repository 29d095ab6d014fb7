//! Setup command implementation

use crate::config::Settings;
use anyhow::{bail, Context, Result};
use shiori_core::{Library, LibraryError, StoreClient, User};
use shiori_store::SqliteStore;
use std::path::Path;
use tracing::info;

/// Create the database schema and register the reader
///
/// Bootstraps a fresh library file when none exists and a reader name was
/// given on the command line.
pub fn setup(
    settings: &Settings,
    manga_file: Option<&Path>,
    firstname: Option<&str>,
    lastname: Option<&str>,
) -> Result<()> {
    let base = manga_file.unwrap_or(&settings.manga_path);
    let mut library = match Library::load(base) {
        Ok(library) => library,
        Err(LibraryError::NotFound(_)) => match (firstname, lastname) {
            (Some(first), Some(last)) => {
                info!(firstname = first, lastname = last, "starting a fresh library");
                Library::new(User::new(first, last))
            }
            _ => bail!(
                "No library at {}; pass --firstname and --lastname to create one",
                base.display()
            ),
        },
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load library {}", base.display()))
        }
    };

    let mut store = SqliteStore::open(&settings.database)?;
    store.setup()?;

    if library.user.uuid.is_none() {
        // adopt an existing row for this reader before creating a new one
        let found = store.user_get(&library.user)?;
        match found.into_iter().next() {
            Some(existing) => {
                library.user.uuid = existing.uuid;
                library.user.created = existing.created;
                library.user.updated = existing.updated;
                library.user.role = existing.role;
            }
            None => {
                store.user_create(&mut library.user)?;
                store.commit()?;
            }
        }
    }

    let path = Library::resolve_path(base, &library.user);
    library.save(&path, true)?;
    println!(
        "Database ready at {}, library at {}",
        settings.database.display(),
        path.display()
    );
    Ok(())
}
