//! SQLite-backed persistent store for shiori
//!
//! Implements the core's [`StoreClient`] trait over an embedded SQLite
//! database. Unique-constraint collisions are reported as
//! [`StoreError::Conflict`] so callers can branch on them directly.

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use shiori_core::{Manga, MangaFilter, Role, StoreClient, StoreError, User};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// A connection to the shiori database
pub struct SqliteStore {
    conn: Connection,
}

type StoreResult<T> = std::result::Result<T, StoreError>;

fn map_sql_err(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref failure, ref message) = e {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            return StoreError::Conflict(
                message.clone().unwrap_or_else(|| "constraint violation".into()),
            );
        }
    }
    StoreError::Failure(e.to_string())
}

fn parse_uuid(value: Option<String>) -> StoreResult<Option<Uuid>> {
    match value {
        None => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(|e| StoreError::Failure(format!("stored uuid invalid: {e}"))),
    }
}

impl SqliteStore {
    /// Open (creating if necessary) the database at the given path
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(map_sql_err)?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(map_sql_err)?;
        Ok(Self { conn })
    }

    /// Open a private in-memory database, used by tests
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(map_sql_err)?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(map_sql_err)?;
        Ok(Self { conn })
    }

    /// Create the schema: titles, readers and read-progress rows
    pub fn setup(&mut self) -> StoreResult<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS mangas (
                    uuid TEXT NOT NULL UNIQUE PRIMARY KEY,
                    created TEXT NOT NULL,
                    updated TEXT NOT NULL,
                    name TEXT NOT NULL UNIQUE,
                    latest_chapter REAL
                );
                CREATE TABLE IF NOT EXISTS users (
                    uuid TEXT NOT NULL UNIQUE PRIMARY KEY,
                    created TEXT NOT NULL,
                    updated TEXT NOT NULL,
                    firstname TEXT NOT NULL,
                    lastname TEXT NOT NULL,
                    role INTEGER NOT NULL,
                    CONSTRAINT users_name_uq UNIQUE (lastname, firstname)
                );
                CREATE TABLE IF NOT EXISTS mangas_read (
                    user_uuid TEXT NOT NULL,
                    manga_uuid TEXT NOT NULL,
                    created TEXT NOT NULL,
                    updated TEXT NOT NULL,
                    chapter REAL,
                    CONSTRAINT mangas_read_pk PRIMARY KEY (user_uuid, manga_uuid),
                    CONSTRAINT mangas_read_user_fk FOREIGN KEY (user_uuid)
                        REFERENCES users (uuid) ON DELETE CASCADE,
                    CONSTRAINT mangas_read_manga_fk FOREIGN KEY (manga_uuid)
                        REFERENCES mangas (uuid) ON DELETE CASCADE
                );",
            )
            .map_err(map_sql_err)?;
        info!("database schema ready");
        Ok(())
    }

    fn row_to_manga(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Option<String>, Manga)> {
        let uuid: Option<String> = row.get(0)?;
        let created: Option<NaiveDateTime> = row.get(1)?;
        let updated: Option<NaiveDateTime> = row.get(2)?;
        let name: String = row.get(3)?;
        let latest_chapter: Option<f64> = row.get(4)?;
        let mut manga = Manga::new(name);
        manga.created = created;
        manga.updated = updated;
        manga.latest_chapter = latest_chapter.unwrap_or(0.0);
        Ok((uuid, manga))
    }

    fn collect_mangas(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> StoreResult<Vec<Manga>> {
        let mut stmt = self.conn.prepare(sql).map_err(map_sql_err)?;
        let rows = stmt
            .query_map(args, Self::row_to_manga)
            .map_err(map_sql_err)?;
        let mut mangas = Vec::new();
        for row in rows {
            let (uuid, mut manga) = row.map_err(map_sql_err)?;
            manga.uuid = parse_uuid(uuid)?;
            mangas.push(manga);
        }
        Ok(mangas)
    }
}

const MANGA_COLS: &str = "uuid, created, updated, name, latest_chapter";

impl StoreClient for SqliteStore {
    fn manga_get(&mut self, filter: &MangaFilter) -> StoreResult<Vec<Manga>> {
        match (filter.uuid, &filter.name) {
            (Some(uuid), _) => self.collect_mangas(
                &format!("SELECT {MANGA_COLS} FROM mangas WHERE uuid = ?1"),
                &[&uuid.to_string()],
            ),
            (None, Some(name)) => self.collect_mangas(
                &format!("SELECT {MANGA_COLS} FROM mangas WHERE name = ?1 COLLATE NOCASE"),
                &[name],
            ),
            (None, None) => {
                self.collect_mangas(&format!("SELECT {MANGA_COLS} FROM mangas"), &[])
            }
        }
    }

    fn manga_create(&mut self, manga: &mut Manga) -> StoreResult<usize> {
        if manga.name.is_empty() {
            return Err(StoreError::Failure("manga has no name".into()));
        }
        let now = Utc::now().naive_utc();
        manga.created.get_or_insert(now);
        if manga.updated.is_none() {
            manga.updated = manga.created;
        }
        manga.uuid.get_or_insert_with(Uuid::new_v4);
        debug!(name = %manga.name, "inserting manga row");
        self.conn
            .execute(
                "INSERT INTO mangas (uuid, created, updated, name, latest_chapter)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    manga.uuid.map(|u| u.to_string()),
                    manga.created,
                    manga.updated,
                    manga.name,
                    manga.latest_chapter,
                ],
            )
            .map_err(map_sql_err)
    }

    fn user_create(&mut self, user: &mut User) -> StoreResult<usize> {
        let now = Utc::now().naive_utc();
        user.created.get_or_insert(now);
        if user.updated.is_none() {
            user.updated = user.created;
        }
        user.uuid.get_or_insert_with(Uuid::new_v4);
        self.conn
            .execute(
                "INSERT INTO users (uuid, created, updated, firstname, lastname, role)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.uuid.map(|u| u.to_string()),
                    user.created,
                    user.updated,
                    user.firstname,
                    user.lastname,
                    user.role.as_i64(),
                ],
            )
            .map_err(map_sql_err)
    }

    fn user_get(&mut self, example: &User) -> StoreResult<Vec<User>> {
        // uuid is unique, other fields are unnecessary when it is present
        let (sql, args): (String, Vec<Box<dyn rusqlite::ToSql>>) = if let Some(uuid) = example.uuid
        {
            (
                "SELECT uuid, created, updated, firstname, lastname, role FROM users
                 WHERE uuid = ?1"
                    .into(),
                vec![Box::new(uuid.to_string())],
            )
        } else if !example.firstname.is_empty() || !example.lastname.is_empty() {
            (
                "SELECT uuid, created, updated, firstname, lastname, role FROM users
                 WHERE firstname = ?1 AND lastname = ?2"
                    .into(),
                vec![
                    Box::new(example.firstname.clone()),
                    Box::new(example.lastname.clone()),
                ],
            )
        } else {
            (
                "SELECT uuid, created, updated, firstname, lastname, role FROM users".into(),
                Vec::new(),
            )
        };

        let mut stmt = self.conn.prepare(&sql).map_err(map_sql_err)?;
        let arg_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
        let rows = stmt
            .query_map(arg_refs.as_slice(), |row| {
                let uuid: Option<String> = row.get(0)?;
                let created: Option<NaiveDateTime> = row.get(1)?;
                let updated: Option<NaiveDateTime> = row.get(2)?;
                let firstname: String = row.get(3)?;
                let lastname: String = row.get(4)?;
                let role: i64 = row.get(5)?;
                Ok((uuid, created, updated, firstname, lastname, role))
            })
            .map_err(map_sql_err)?;

        let mut users = Vec::new();
        for row in rows {
            let (uuid, created, updated, firstname, lastname, role) = row.map_err(map_sql_err)?;
            let mut user = User::new(firstname, lastname);
            user.uuid = parse_uuid(uuid)?;
            user.created = created;
            user.updated = updated;
            user.role = Role::from_i64(role);
            users.push(user);
        }
        Ok(users)
    }

    fn read_get(&mut self, user: &User) -> StoreResult<Vec<Manga>> {
        let Some(user_uuid) = user.uuid else {
            return Err(StoreError::Failure("user has no uuid".into()));
        };
        let mut stmt = self
            .conn
            .prepare(
                "SELECT m.uuid, mr.created, mr.updated, m.name, m.latest_chapter, mr.chapter
                 FROM mangas_read mr JOIN mangas m ON mr.manga_uuid = m.uuid
                 WHERE mr.user_uuid = ?1",
            )
            .map_err(map_sql_err)?;
        let rows = stmt
            .query_map(params![user_uuid.to_string()], |row| {
                let (uuid, mut manga) = Self::row_to_manga(row)?;
                let chapter: Option<f64> = row.get(5)?;
                manga.chapter = chapter;
                Ok((uuid, manga))
            })
            .map_err(map_sql_err)?;
        let mut mangas = Vec::new();
        for row in rows {
            let (uuid, mut manga) = row.map_err(map_sql_err)?;
            manga.uuid = parse_uuid(uuid)?;
            mangas.push(manga);
        }
        Ok(mangas)
    }

    fn read_create(&mut self, user: &User, manga: &Manga) -> StoreResult<usize> {
        let (Some(user_uuid), Some(manga_uuid)) = (user.uuid, manga.uuid) else {
            return Err(StoreError::Failure("user and manga need uuids".into()));
        };
        let now = Utc::now().naive_utc();
        self.conn
            .execute(
                "INSERT INTO mangas_read (user_uuid, manga_uuid, created, updated, chapter)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user_uuid.to_string(),
                    manga_uuid.to_string(),
                    manga.created.unwrap_or(now),
                    manga.updated.unwrap_or(now),
                    manga.chapter.unwrap_or(0.0),
                ],
            )
            .map_err(map_sql_err)
    }

    fn read_update(&mut self, user: &User, manga: &Manga) -> StoreResult<usize> {
        let (Some(user_uuid), Some(manga_uuid)) = (user.uuid, manga.uuid) else {
            return Err(StoreError::Failure("user and manga need uuids".into()));
        };
        let Some(chapter) = manga.chapter else {
            return Err(StoreError::Failure("manga has no chapter".into()));
        };
        self.conn
            .execute(
                "UPDATE mangas_read SET updated = ?1, chapter = ?2
                 WHERE user_uuid = ?3 AND manga_uuid = ?4",
                params![
                    Utc::now().naive_utc(),
                    chapter,
                    user_uuid.to_string(),
                    manga_uuid.to_string(),
                ],
            )
            .map_err(map_sql_err)
    }

    fn commit(&mut self) -> StoreResult<()> {
        // autocommit connection: writes are already durable, this is the
        // place where an explicit-transaction client would commit
        if !self.conn.is_autocommit() {
            self.conn
                .execute_batch("COMMIT")
                .map_err(map_sql_err)?;
        }
        Ok(())
    }
}
