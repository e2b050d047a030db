pub mod schema;
pub mod migrations;
pub mod kv_repo;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub use kv_repo::KvRepository;

/// Huvuddatabas-wrapper med thread-safe access
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Öppna eller skapa databas
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            "
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Öppna in-memory databas (för tester)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Kör databasmigrationer
    pub fn migrate(&self) -> Result<()> {
        let conn = lock(&self.conn)?;
        migrations::run_migrations(&conn)
    }

    /// Hämta nyckel/värde-repository
    pub fn kv(&self) -> KvRepository {
        KvRepository::new(Arc::clone(&self.conn))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// Lås anslutningen. Ett förgiftat lås blir ett vanligt fel.
pub(crate) fn lock(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| anyhow!("Databaslåset är förgiftat"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_file_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("youthroll.db");

        {
            let db = Database::open(&path).unwrap();
            db.migrate().unwrap();
            db.kv().set("dirty", "true").unwrap();
        }

        let reopened = Database::open(&path).unwrap();
        reopened.migrate().unwrap();
        assert_eq!(reopened.kv().get("dirty").unwrap().as_deref(), Some("true"));
    }
}
