//! Add command implementation

use crate::config::Settings;
use anyhow::Result;
use chrono::Utc;
use shiori_core::Manga;
use std::path::Path;

/// Start tracking a title in the library file
pub fn add(settings: &Settings, manga_file: Option<&Path>, name: &str) -> Result<()> {
    let (path, mut library) = super::load_library(settings, manga_file)?;

    let new = Manga::new(name.trim());
    if let Some(existing) = library.mangas.iter().find(|m| m.key() == new.key()) {
        println!("Already tracked ({})", existing.name);
        return Ok(());
    }

    let now = Utc::now().naive_utc();
    let mut new = new;
    new.created = Some(now);
    new.updated = Some(now);
    library.mangas.push(new);
    library.save(&path, true)?;
    println!("Added {}", name.trim());
    Ok(())
}
