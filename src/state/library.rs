use rusqlite::{Connection, DatabaseName, OpenFlags, Result as SqlResult, Transaction};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::data::FilmRoll;
use crate::error::MigrateError;

/// Table holding one row per imported folder
pub const FILM_ROLLS_TABLE: &str = "film_rolls";

/// The Library wraps an existing photo catalog database.
/// It reads the film roll folders and writes rewritten folders back.
/// Rows are never created or deleted here.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open an existing library for read-write access.
    ///
    /// The file is never created. SQLite only reads the header on the first
    /// statement, so the film roll table is looked up right away to reject
    /// files that are not databases.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, MigrateError> {
        let db_path = db_path.into();
        let open_error = |source| MigrateError::StorageOpen {
            path: db_path.clone(),
            source,
        };

        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(open_error)?;

        let has_film_rolls: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [FILM_ROLLS_TABLE],
                |row| row.get(0),
            )
            .map_err(open_error)?;

        // SQLite falls back to read-only when the OS denies write access
        if conn.is_readonly(DatabaseName::Main).map_err(open_error)? {
            return Err(MigrateError::ReadOnly { path: db_path });
        }

        if !has_film_rolls {
            return Err(MigrateError::MissingTable {
                path: db_path,
                table: FILM_ROLLS_TABLE,
            });
        }

        debug!(path = %db_path.display(), "opened library");

        Ok(Library { conn, db_path })
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Get every film roll, in whatever order SQLite returns them
    pub fn film_rolls(&self) -> SqlResult<Vec<FilmRoll>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, folder FROM {FILM_ROLLS_TABLE}"))?;

        let roll_iter = stmt.query_map([], |row| {
            Ok(FilmRoll {
                id: row.get(0)?,
                folder: row.get(1)?,
            })
        })?;

        let mut rolls = Vec::new();
        for roll in roll_iter {
            rolls.push(roll?);
        }

        Ok(rolls)
    }

    /// Set a film roll's folder, committed on its own
    pub fn set_folder(&self, id: i64, folder: &str) -> SqlResult<()> {
        update_folder(&self.conn, id, folder)
    }

    /// Start a transaction; dropping it without commit rolls back
    pub fn transaction(&mut self) -> SqlResult<Transaction<'_>> {
        self.conn.transaction()
    }

    /// Copy the whole database to `dest` with the online backup API
    pub fn backup_to(&self, dest: &Path) -> SqlResult<()> {
        self.conn.backup(DatabaseName::Main, dest, None)
    }
}

/// Update one film roll's folder through any connection or transaction
pub fn update_folder(conn: &Connection, id: i64, folder: &str) -> SqlResult<()> {
    conn.execute(
        &format!("UPDATE {FILM_ROLLS_TABLE} SET folder = ?1 WHERE id = ?2"),
        rusqlite::params![folder, id],
    )?;
    Ok(())
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_library(dir: &TempDir, rows: &[(i64, &str)]) -> PathBuf {
        let path = dir.path().join("library.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE film_rolls (
                id                INTEGER PRIMARY KEY,
                access_timestamp  INTEGER,
                folder            VARCHAR(1024) NOT NULL
            );",
        )
        .unwrap();
        for (id, folder) in rows {
            conn.execute(
                "INSERT INTO film_rolls (id, folder) VALUES (?1, ?2)",
                rusqlite::params![id, folder],
            )
            .unwrap();
        }
        path
    }

    #[test]
    fn reads_every_film_roll() {
        let dir = TempDir::new().unwrap();
        let path = create_library(&dir, &[(1, "/home/joe/a"), (7, "/home/joe/b")]);

        let library = Library::open(&path).unwrap();
        let mut rolls = library.film_rolls().unwrap();
        rolls.sort_by_key(|roll| roll.id);

        assert_eq!(
            rolls,
            vec![FilmRoll::new(1, "/home/joe/a"), FilmRoll::new(7, "/home/joe/b")]
        );
        assert_eq!(library.path(), path.as_path());
    }

    #[test]
    fn set_folder_only_touches_one_row() {
        let dir = TempDir::new().unwrap();
        let path = create_library(&dir, &[(1, "/a"), (2, "/b")]);

        let library = Library::open(&path).unwrap();
        library.set_folder(2, r"P:\b").unwrap();

        let mut rolls = library.film_rolls().unwrap();
        rolls.sort_by_key(|roll| roll.id);
        assert_eq!(rolls, vec![FilmRoll::new(1, "/a"), FilmRoll::new(2, r"P:\b")]);
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let dir = TempDir::new().unwrap();
        let path = create_library(&dir, &[(1, "/a")]);

        let mut library = Library::open(&path).unwrap();
        {
            let tx = library.transaction().unwrap();
            update_folder(&tx, 1, "/z").unwrap();
        }

        assert_eq!(library.film_rolls().unwrap(), vec![FilmRoll::new(1, "/a")]);
    }

    #[test]
    fn backup_copies_rows() {
        let dir = TempDir::new().unwrap();
        let path = create_library(&dir, &[(3, "/c")]);
        let dest = dir.path().join("library.db.bak");

        let library = Library::open(&path).unwrap();
        library.backup_to(&dest).unwrap();

        let copy = Library::open(&dest).unwrap();
        assert_eq!(copy.film_rolls().unwrap(), vec![FilmRoll::new(3, "/c")]);
    }

    #[test]
    fn missing_file_is_not_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.db");

        let err = Library::open(&path).unwrap_err();
        assert!(matches!(err, MigrateError::StorageOpen { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not a database\n".repeat(512)).unwrap();

        let err = Library::open(&path).unwrap_err();
        assert!(matches!(err, MigrateError::StorageOpen { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_file_is_rejected_up_front() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = create_library(&dir, &[(1, "/a")]);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o444)).unwrap();

        // root ignores file modes, so there is nothing to check there
        if std::fs::OpenOptions::new().write(true).open(&path).is_ok() {
            return;
        }

        let err = Library::open(&path).unwrap_err();
        assert!(matches!(err, MigrateError::ReadOnly { .. }));
        assert_eq!(err.exit_code(), 66);
    }

    #[test]
    fn database_without_film_rolls_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE images (id INTEGER PRIMARY KEY, path TEXT);")
            .unwrap();

        let err = Library::open(&path).unwrap_err();
        assert!(matches!(
            err,
            MigrateError::MissingTable { table: FILM_ROLLS_TABLE, .. }
        ));
    }
}
