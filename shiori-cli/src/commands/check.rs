//! Check command implementation

use crate::config::Settings;
use anyhow::{bail, Result};
use shiori_core::{build_index, detect_updates, Library, Manga};
use std::path::Path;

/// Check every configured source for unseen chapters
pub async fn check(settings: &Settings, manga_file: Option<&Path>, jobs: Option<usize>) -> Result<()> {
    let (_, library) = super::load_library(settings, manga_file)?;
    let updates = detect(settings, &library, jobs).await?;
    if updates.is_empty() {
        println!("No updates");
    } else {
        println!("{}", super::format_mangas(&updates));
    }
    Ok(())
}

/// Build the availability index and compare the library against it
pub(crate) async fn detect(
    settings: &Settings,
    library: &Library,
    jobs: Option<usize>,
) -> Result<Vec<Manga>> {
    let sources = super::build_sources(settings);
    let mode = super::build_mode(settings, jobs);
    let Some(index) = build_index(&sources, mode).await else {
        bail!("No sources configured, nothing to check");
    };
    Ok(detect_updates(&library.mangas, &index))
}
