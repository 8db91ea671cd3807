//! SQLite-backed record storage.
//!
//! Records live in two tables: `records` holds one row per record (id, type,
//! timestamps) and `record_fields` holds one row per `(record_id, bind_key)`.
//! Every multi-statement mutation runs inside a single transaction; dropping
//! an uncommitted transaction rolls it back.

use std::sync::{Mutex, MutexGuard};

use contentrecords_tree::{get_at_path, BindIndex, Node};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::record::{FieldValues, Record};

/// Special store path for a process-local in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS record_fields (
        record_id INTEGER,
        bind_key TEXT,
        value TEXT,
        PRIMARY KEY(record_id, bind_key)
    );

    CREATE INDEX IF NOT EXISTS idx_records_type ON records(type);
    CREATE INDEX IF NOT EXISTS idx_record_fields_record_id ON record_fields(record_id);
";

/// Persistent record store backed by one SQLite connection.
///
/// An empty `record_type` disables type scoping on every operation.
pub struct RecordStore {
    path: String,
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").field("path", &self.path).finish()
    }
}

impl RecordStore {
    /// Opens a connection at `path` without touching the schema.
    ///
    /// Use [`crate::StoreRegistry::open`] to get a shared, initialized store.
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = if path == MEMORY_PATH {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        info!(path, "opened record store");
        Ok(Self {
            path: path.to_string(),
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory store with the schema in place (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self::open(MEMORY_PATH)?;
        store.init_schema()?;
        Ok(store)
    }

    /// The path this store was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Creates tables and indexes if they do not exist.
    pub fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %self.path, "record schema ready");
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Inserts a record and its field values. Returns the new id.
    pub fn create(&self, record_type: &str, values: &FieldValues) -> StoreResult<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = insert_record(&tx, record_type, values)?;
        tx.commit()?;
        debug!(id, record_type, fields = values.len(), "created record");
        Ok(id)
    }

    /// Replaces all field values of a record.
    ///
    /// This is not a merge: fields missing from `values` are removed.
    pub fn update(&self, id: i64, record_type: &str, values: &FieldValues) -> StoreResult<()> {
        if id == 0 {
            return Err(StoreError::MissingId);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        touch_record(&tx, id, record_type)?;
        tx.execute("DELETE FROM record_fields WHERE record_id = ?1", params![id])?;
        insert_fields(&tx, id, values)?;
        tx.commit()?;
        debug!(id, record_type, fields = values.len(), "replaced record fields");
        Ok(())
    }

    /// Sets a single field value, leaving the other fields untouched.
    pub fn update_field(
        &self,
        id: i64,
        record_type: &str,
        bind_key: &str,
        value: &str,
    ) -> StoreResult<()> {
        if id == 0 {
            return Err(StoreError::MissingId);
        }
        if bind_key.trim().is_empty() {
            return Err(StoreError::MissingBindKey);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        touch_record(&tx, id, record_type)?;
        let updated = tx.execute(
            "UPDATE record_fields SET value = ?1 WHERE record_id = ?2 AND bind_key = ?3",
            params![value, id, bind_key],
        )?;
        if updated == 0 {
            tx.execute(
                "INSERT INTO record_fields(record_id, bind_key, value) VALUES(?1, ?2, ?3)",
                params![id, bind_key, value],
            )?;
        }
        tx.commit()?;
        debug!(id, record_type, bind_key, "updated record field");
        Ok(())
    }

    /// Deletes a record and its field rows.
    pub fn delete(&self, id: i64, record_type: &str) -> StoreResult<()> {
        if id == 0 {
            return Err(StoreError::MissingId);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !record_exists(&tx, id, record_type)? {
            return Err(StoreError::NotFound { id });
        }
        tx.execute("DELETE FROM record_fields WHERE record_id = ?1", params![id])?;
        if record_type.is_empty() {
            tx.execute("DELETE FROM records WHERE id = ?1", params![id])?;
        } else {
            tx.execute(
                "DELETE FROM records WHERE id = ?1 AND type = ?2",
                params![id, record_type],
            )?;
        }
        tx.commit()?;
        debug!(id, record_type, "deleted record");
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Loads a record by id, scoped by type when `record_type` is non-empty.
    pub fn fetch_by_id(&self, id: i64, record_type: &str) -> StoreResult<Record> {
        if id == 0 {
            return Err(StoreError::MissingId);
        }
        let conn = self.lock()?;
        if !record_exists(&conn, id, record_type)? {
            return Err(StoreError::NotFound { id });
        }
        let fields = load_fields(&conn, id)?;
        Ok(Record { id, fields })
    }

    /// Loads the records for explicit ids, skipping ids that do not resolve.
    pub fn fetch_by_ids(&self, ids: &[i64], record_type: &str) -> StoreResult<Vec<Record>> {
        let mut records = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.fetch_by_id(id, record_type) {
                Ok(record) => records.push(record),
                Err(StoreError::NotFound { .. } | StoreError::MissingId) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Lists record ids.
    ///
    /// A non-empty `query` is executed verbatim and its first column is read
    /// as the id; rows whose first column is not an integer are skipped. The
    /// query is configuration authored, not user input. Without a query the
    /// ids of `record_type` (or of all records) are returned in id order.
    pub fn fetch_ids(&self, query: &str, record_type: &str) -> StoreResult<Vec<i64>> {
        let conn = self.lock()?;
        let query = query.trim();
        if !query.is_empty() {
            return query_ids(&conn, query, params![]);
        }
        if record_type.is_empty() {
            query_ids(&conn, "SELECT id FROM records ORDER BY id", params![])
        } else {
            query_ids(
                &conn,
                "SELECT id FROM records WHERE type = ?1 ORDER BY id",
                params![record_type],
            )
        }
    }

    /// Lists records via [`Self::fetch_ids`], loading each record's fields.
    pub fn fetch_records(&self, query: &str, record_type: &str) -> StoreResult<Vec<Record>> {
        let ids = self.fetch_ids(query, record_type)?;
        let conn = self.lock()?;
        ids.into_iter()
            .map(|id| Ok(Record { id, fields: load_fields(&conn, id)? }))
            .collect()
    }

    /// Number of records of a type (all records when `record_type` is empty).
    pub fn count_by_type(&self, record_type: &str) -> StoreResult<usize> {
        let conn = self.lock()?;
        count_records(&conn, record_type)
    }

    // ── Template seeding ─────────────────────────────────────────

    /// Creates a record holding the template's in-place values at each bind.
    pub fn create_from_template(
        &self,
        record_type: &str,
        template: &Node,
        binds: &BindIndex,
    ) -> StoreResult<i64> {
        self.create(record_type, &default_values(template, binds))
    }

    /// Creates one record from template defaults if the type has no records.
    ///
    /// Returns the id of the seeded record, or `None` when data already exists.
    /// The count and the insert share one transaction.
    pub fn seed_if_empty(
        &self,
        template: &Node,
        binds: &BindIndex,
        record_type: &str,
    ) -> StoreResult<Option<i64>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if count_records(&tx, record_type)? > 0 {
            return Ok(None);
        }
        let id = insert_record(&tx, record_type, &default_values(template, binds))?;
        tx.commit()?;
        info!(id, record_type, "seeded empty store from template");
        Ok(Some(id))
    }
}

/// Reads the template's current value at every bound path.
///
/// Paths that do not resolve produce an empty value.
pub fn default_values(template: &Node, binds: &BindIndex) -> FieldValues {
    binds
        .iter()
        .map(|(field, path)| {
            let value = get_at_path(template, path)
                .map(Node::to_field_value)
                .unwrap_or_default();
            (field.to_string(), value)
        })
        .collect()
}

fn insert_record(
    tx: &Transaction<'_>,
    record_type: &str,
    values: &FieldValues,
) -> StoreResult<i64> {
    tx.execute("INSERT INTO records(type) VALUES(?1)", params![record_type])?;
    let id = tx.last_insert_rowid();
    insert_fields(tx, id, values)?;
    Ok(id)
}

fn count_records(conn: &Connection, record_type: &str) -> StoreResult<usize> {
    let count: i64 = if record_type.is_empty() {
        conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?
    } else {
        conn.query_row(
            "SELECT COUNT(*) FROM records WHERE type = ?1",
            params![record_type],
            |row| row.get(0),
        )?
    };
    Ok(count as usize)
}

fn insert_fields(tx: &Transaction<'_>, id: i64, values: &FieldValues) -> StoreResult<()> {
    let mut stmt =
        tx.prepare("INSERT INTO record_fields(record_id, bind_key, value) VALUES(?1, ?2, ?3)")?;
    for (key, value) in values {
        stmt.execute(params![id, key, value])?;
    }
    Ok(())
}

/// Bumps `updated_at`; zero affected rows means the record is missing.
fn touch_record(tx: &Transaction<'_>, id: i64, record_type: &str) -> StoreResult<()> {
    let touched = if record_type.is_empty() {
        tx.execute(
            "UPDATE records SET updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
            params![id],
        )?
    } else {
        tx.execute(
            "UPDATE records SET updated_at = CURRENT_TIMESTAMP WHERE id = ?1 AND type = ?2",
            params![id, record_type],
        )?
    };
    if touched == 0 {
        return Err(StoreError::NotFound { id });
    }
    Ok(())
}

fn record_exists(conn: &Connection, id: i64, record_type: &str) -> StoreResult<bool> {
    let found: Option<i64> = if record_type.is_empty() {
        conn.query_row("SELECT id FROM records WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?
    } else {
        conn.query_row(
            "SELECT id FROM records WHERE id = ?1 AND type = ?2",
            params![id, record_type],
            |row| row.get(0),
        )
        .optional()?
    };
    Ok(found.is_some())
}

fn load_fields(conn: &Connection, id: i64) -> StoreResult<FieldValues> {
    let mut stmt = conn.prepare("SELECT bind_key, value FROM record_fields WHERE record_id = ?1")?;
    let rows = stmt.query_map(params![id], |row| {
        let key: String = row.get(0)?;
        let value: Option<String> = row.get(1)?;
        Ok((key, value.unwrap_or_default()))
    })?;

    let mut fields = FieldValues::new();
    for row in rows {
        let (key, value) = row?;
        fields.entry(key).or_insert(value);
    }
    Ok(fields)
}

fn query_ids<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> StoreResult<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    if stmt.column_count() == 0 {
        return Ok(Vec::new());
    }
    let mut rows = stmt.query(params)?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        if let Some(id) = id_from_value(row.get_ref(0)?) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn id_from_value(value: ValueRef<'_>) -> Option<i64> {
    match value {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => Some(f as i64),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse().ok()),
        ValueRef::Null => None,
    }
}
