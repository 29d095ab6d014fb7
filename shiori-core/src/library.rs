//! The file-resident library: one reader plus their tracked titles

use crate::error::LibraryError;
use crate::types::{Manga, User};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk document: `{ "user": ..., "mangas": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Library {
    pub user: User,
    pub mangas: Vec<Manga>,
}

impl Library {
    pub fn new(user: User) -> Self {
        Self {
            user,
            mangas: Vec::new(),
        }
    }

    /// File name used when only a base directory is configured
    pub fn default_file_name(user: &User) -> String {
        format!("shiori_manga_{}.json", user.identity())
    }

    /// Load a library document
    ///
    /// A missing file is reported separately from a file that exists but
    /// does not parse (including one without a `user` entry).
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        if !path.is_file() {
            return Err(LibraryError::NotFound(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        let library: Library =
            serde_json::from_str(&data).map_err(|e| LibraryError::Parse(e.to_string()))?;
        debug!(path = %path.display(), titles = library.mangas.len(), "library loaded");
        Ok(library)
    }

    /// Write the library document, titles sorted by name
    pub fn save(&self, path: &Path, readable: bool) -> Result<(), LibraryError> {
        let mut doc = self.clone();
        doc.mangas.sort_by(|a, b| a.name.cmp(&b.name));
        let data = if readable {
            serde_json::to_string_pretty(&doc)
        } else {
            serde_json::to_string(&doc)
        }
        .map_err(|e| LibraryError::Parse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, data)?;
        debug!(path = %path.display(), "library saved");
        Ok(())
    }

    /// Resolve a configured location into a concrete file path
    ///
    /// An existing directory gets the per-reader default file name joined
    /// onto it; anything else is used as the file path itself.
    pub fn resolve_path(base: &Path, user: &User) -> PathBuf {
        if base.is_dir() {
            base.join(Self::default_file_name(user))
        } else {
            base.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Library {
        let mut user = User::new("Kana", "Arima");
        user.uuid = Some(uuid::Uuid::new_v4());
        let mut lib = Library::new(user);
        let mut m = Manga::new("Zeta");
        m.chapter = Some(12.5);
        lib.mangas.push(m);
        lib.mangas.push(Manga::new("Alpha"));
        lib
    }

    #[test]
    fn test_save_load_roundtrip_sorts_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.json");
        let lib = sample();
        lib.save(&path, true).unwrap();
        let loaded = Library::load(&path).unwrap();
        assert_eq!(loaded.user, lib.user);
        let names: Vec<&str> = loaded.mangas.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Library::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[test]
    fn test_document_without_user_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{"mangas": []}"#).unwrap();
        let err = Library::load(&path).unwrap_err();
        assert!(matches!(err, LibraryError::Parse(_)));
    }

    #[test]
    fn test_resolve_path_joins_only_for_directories() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("custom.json");
        let user = User::new("A", "B");
        assert_eq!(Library::resolve_path(&explicit, &user), explicit);
        assert_eq!(
            Library::resolve_path(dir.path(), &user),
            dir.path().join("shiori_manga_B_A.json")
        );
    }
}
