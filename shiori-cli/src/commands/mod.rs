//! CLI command implementations

mod add;
mod check;
mod read;
mod setup;
mod sync;

pub use add::add;
pub use check::check;
pub use read::read;
pub use setup::setup;
pub use sync::sync;

use crate::config::Settings;
use anyhow::{Context, Result};
use shiori_core::{BuildMode, DynSource, Library, Manga};
use shiori_sources::WebSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Load the library file, either the override or the configured location
pub(crate) fn load_library(
    settings: &Settings,
    manga_file: Option<&Path>,
) -> Result<(PathBuf, Library)> {
    let path = manga_file.unwrap_or(&settings.manga_path).to_path_buf();
    let library = Library::load(&path)
        .with_context(|| format!("Failed to load library {}", path.display()))?;
    Ok((path, library))
}

/// Instantiate every configured source; misconfigured ones are skipped
pub(crate) fn build_sources(settings: &Settings) -> Vec<DynSource> {
    let client = reqwest::Client::new();
    let mut sources: Vec<DynSource> = Vec::new();
    for config in &settings.sources {
        match WebSource::from_config(config, client.clone()) {
            Ok(source) => sources.push(Arc::new(source)),
            Err(e) => warn!(url = %config.url, error = %e, "skipping misconfigured source"),
        }
    }
    sources
}

/// Map the jobs argument onto a build mode: 0 is one task per source,
/// 1 is sequential, anything else bounds the pool
pub(crate) fn build_mode(settings: &Settings, jobs: Option<usize>) -> BuildMode {
    match jobs.unwrap_or(settings.pool_size) {
        0 => BuildMode::PerSource,
        1 => BuildMode::Sequential,
        n => BuildMode::Bounded(n),
    }
}

/// One line per title: `Name (chapter): host1,host2`
pub(crate) fn format_mangas(mangas: &[Manga]) -> String {
    mangas
        .iter()
        .map(|manga| {
            let chapter = match manga.chapter {
                Some(c) if c.fract() == 0.0 => format!("{}", c as i64),
                Some(c) => format!("{c}"),
                None => "-".to_string(),
            };
            let hosts: Vec<String> = manga
                .urls
                .iter()
                .filter_map(|u| {
                    Url::parse(u)
                        .ok()
                        .and_then(|u| u.host_str().map(str::to_string))
                })
                .collect();
            if hosts.is_empty() {
                format!("{} ({})", manga.name, chapter)
            } else {
                format!("{} ({}): {}", manga.name, chapter, hosts.join(","))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mangas_drops_fraction_for_whole_chapters() {
        let mut whole = Manga::new("Dai Dark");
        whole.chapter = Some(8.0);
        whole.urls = vec!["https://scans.example/dd/8".to_string()];
        let mut half = Manga::new("Blame!");
        half.chapter = Some(4.5);
        let out = format_mangas(&[whole, half]);
        assert_eq!(out, "Dai Dark (8): scans.example\nBlame! (4.5)");
    }

    #[test]
    fn test_build_mode_mapping() {
        let settings = Settings::default();
        assert_eq!(build_mode(&settings, Some(0)), BuildMode::PerSource);
        assert_eq!(build_mode(&settings, Some(1)), BuildMode::Sequential);
        assert_eq!(build_mode(&settings, Some(6)), BuildMode::Bounded(6));
        assert_eq!(build_mode(&settings, None), BuildMode::Bounded(4));
    }
}
