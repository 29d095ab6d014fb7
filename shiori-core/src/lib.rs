//! Shiori Core Library
//!
//! This crate provides the update-detection and reconciliation engine for
//! the shiori reading tracker: per-source chapter listings are normalized
//! and folded into one canonical availability index, a reader's progress is
//! compared against that index, and the file-resident library is three-way
//! merged against the database-resident one.

pub mod detect;
pub mod error;
pub mod index;
pub mod library;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod types;

pub use detect::{detect_updates, detect_updates_batch};
pub use error::{
    LibraryError, ReconcileError, Result, ShioriError, SourceError, StoreError,
};
pub use index::{build_index, BuildMode, DynSource};
pub use library::Library;
pub use reconcile::{reconcile, ReconcileOutcome};
pub use source::{normalize, Candidate, FieldValue, RawListing, RawRecord, Source};
pub use store::{add_for_user, AddOutcome, MangaFilter, StoreClient};
pub use types::{ChapterIndex, IndexEntry, Manga, Role, User};
