//! The shared connection wrapper. A single `rusqlite::Connection` guarded
//! by a `Mutex`: every statement goes through one serialized handle rather
//! than a pool, which is also what makes a dead letter's "republish then
//! delete" sequence safe to run as one transaction without a separate lock.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use crate::schema::init_schema;
use crate::Result;

pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        init_schema(&db.conn.lock().expect("db mutex poisoned"))?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        init_schema(&db.conn.lock().expect("db mutex poisoned"))?;
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_and_initializes_schema() {
        let db = Database::open_in_memory().unwrap();
        let version: i32 = db
            .conn
            .lock()
            .unwrap()
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, crate::schema::SCHEMA_VERSION);
    }
}
