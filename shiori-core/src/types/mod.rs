//! Core data model: tracked titles, readers and the chapter index

mod index;
mod manga;
mod user;

pub use index::{ChapterIndex, IndexEntry};
pub use manga::Manga;
pub use user::{Role, User};
