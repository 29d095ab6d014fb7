//! Read command implementation

use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Mark detected updates as read, all titles or only those matching a prefix
pub async fn read(
    settings: &Settings,
    manga_file: Option<&Path>,
    prefix: Option<&str>,
    jobs: Option<usize>,
) -> Result<()> {
    let (path, mut library) = super::load_library(settings, manga_file)?;
    let updates = super::check::detect(settings, &library, jobs).await?;
    if updates.is_empty() {
        println!("Nothing read");
        return Ok(());
    }

    let prefix = prefix.unwrap_or("").to_lowercase();
    let mut dirty = false;
    for manga in &mut library.mangas {
        if !prefix.is_empty() && !manga.key().starts_with(&prefix) {
            continue;
        }
        for update in &updates {
            if !manga.matches(update) {
                continue;
            }
            manga.chapter = update.chapter;
            manga.updated = update.updated;
            manga.urls = update.urls.clone();
            dirty = true;
            println!("Read {}", super::format_mangas(std::slice::from_ref(manga)));
        }
    }

    if dirty {
        library.save(&path, true)?;
    } else {
        println!("Nothing read");
    }
    Ok(())
}
