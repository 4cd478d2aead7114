//! Redb-backed durable chat log.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. The
//! log survives server restarts unless it is cleared at startup.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{LogError, LogSink};

/// Table: chatlog
/// Key: append sequence number (u64, starts at 0)
/// Value: the formatted line
const CHATLOG: TableDefinition<u64, &str> = TableDefinition::new("chatlog");

/// Durable chat log backed by Redb.
///
/// Thread-safe through Redb's internal locking: write transactions are
/// serialized, so concurrent appends never share a sequence number. Clone is
/// cheap (Arc).
#[derive(Clone)]
pub struct RedbLog {
    db: Arc<Database>,
}

impl RedbLog {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the CHATLOG table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `LogError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let db = Database::create(path.as_ref()).map_err(|e| LogError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| LogError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(CHATLOG).map_err(|e| LogError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| LogError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl LogSink for RedbLog {
    fn append(&self, line: &str) -> Result<(), LogError> {
        let txn = self.db.begin_write().map_err(|e| LogError::Io(e.to_string()))?;

        {
            let mut table = txn.open_table(CHATLOG).map_err(|e| LogError::Io(e.to_string()))?;

            let next = table
                .last()
                .map_err(|e| LogError::Io(e.to_string()))?
                .map_or(0, |(key, _)| key.value() + 1);

            table.insert(next, line).map_err(|e| LogError::Io(e.to_string()))?;
        }

        txn.commit().map_err(|e| LogError::Io(e.to_string()))?;

        Ok(())
    }

    fn all(&self) -> Result<Vec<String>, LogError> {
        let txn = self.db.begin_read().map_err(|e| LogError::Io(e.to_string()))?;
        let table = txn.open_table(CHATLOG).map_err(|e| LogError::Io(e.to_string()))?;

        let mut lines = Vec::new();
        for entry in table.iter().map_err(|e| LogError::Io(e.to_string()))? {
            let (_, value) = entry.map_err(|e| LogError::Io(e.to_string()))?;
            lines.push(value.value().to_string());
        }

        Ok(lines)
    }

    fn clear(&self) -> Result<(), LogError> {
        let txn = self.db.begin_write().map_err(|e| LogError::Io(e.to_string()))?;

        txn.delete_table(CHATLOG).map_err(|e| LogError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(CHATLOG).map_err(|e| LogError::Io(e.to_string()))?;
        }

        txn.commit().map_err(|e| LogError::Io(e.to_string()))?;

        Ok(())
    }
}
