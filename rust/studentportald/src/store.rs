use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::records::{RecordField, StudentRecord};

/// Largest number of documents one atomic write may carry.
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("batch of {len} records exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Document collection of student records keyed by identity number.
pub trait RecordStore {
    fn get_one(&self, identity_number: &str) -> Result<Option<StudentRecord>, StoreError>;

    /// Every document whose `field` equals `value`, oldest first.
    fn query_equals(
        &self,
        field: RecordField,
        value: &str,
    ) -> Result<Vec<StudentRecord>, StoreError>;

    /// Upserts all records in one atomic write; existing documents with the same identity
    /// number have their fields overwritten.
    fn batch_upsert(&mut self, records: &[StudentRecord]) -> Result<(), StoreError>;

    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }
}

/// `RecordStore` over the workspace database.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteStore { conn }
    }
}

fn row_to_record(r: &rusqlite::Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        identity_number: r.get(0)?,
        full_name: r.get(1)?,
        external_id: r.get(2)?,
        derived_email: r.get(3)?,
        issued_password: r.get(4)?,
    })
}

impl RecordStore for SqliteStore<'_> {
    fn get_one(&self, identity_number: &str) -> Result<Option<StudentRecord>, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT ic, name, delima_id, email, password FROM students WHERE ic = ?",
                [identity_number],
                row_to_record,
            )
            .optional()?;
        Ok(found)
    }

    fn query_equals(
        &self,
        field: RecordField,
        value: &str,
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let sql = format!(
            "SELECT ic, name, delima_id, email, password FROM students WHERE {} = ? ORDER BY rowid",
            field.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([value], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn batch_upsert(&mut self, records: &[StudentRecord]) -> Result<(), StoreError> {
        let max = self.max_batch_size();
        if records.len() > max {
            return Err(StoreError::BatchTooLarge {
                len: records.len(),
                max,
            });
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO students(ic, name, delima_id, email, password, updated_at)
                 VALUES(?, ?, ?, ?, ?, ?)
                 ON CONFLICT(ic) DO UPDATE SET
                    name = excluded.name,
                    delima_id = excluded.delima_id,
                    email = excluded.email,
                    password = excluded.password,
                    updated_at = excluded.updated_at",
            )?;
            for r in records {
                stmt.execute((
                    &r.identity_number,
                    &r.full_name,
                    &r.external_id,
                    &r.derived_email,
                    &r.issued_password,
                    &now,
                ))?;
            }
        }
        // Dropping the transaction on an early return rolls the whole batch back.
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestSettings;
    use crate::db;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        db::init_schema(&conn).expect("schema");
        conn
    }

    fn record(ic: &str, name: &str) -> StudentRecord {
        StudentRecord::from_cells(ic, name, "M1", "pw", &IngestSettings::default())
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))
            .expect("count")
    }

    #[test]
    fn upsert_overwrites_existing_identity() {
        let conn = memory_conn();
        let mut store = SqliteStore::new(&conn);
        store
            .batch_upsert(&[record("900101015555", "First")])
            .expect("first write");
        store
            .batch_upsert(&[record("900101015555", "Second")])
            .expect("second write");

        assert_eq!(count(&conn), 1);
        let got = store.get_one("900101015555").expect("get").expect("exists");
        assert_eq!(got.full_name, "Second");
    }

    #[test]
    fn oversized_batch_is_rejected_without_writing() {
        let conn = memory_conn();
        let mut store = SqliteStore::new(&conn);
        let records = (0..MAX_BATCH_SIZE + 1)
            .map(|i| record(&format!("{:012}", i), "X"))
            .collect::<Vec<_>>();
        let e = store.batch_upsert(&records).expect_err("too large");
        assert!(matches!(e, StoreError::BatchTooLarge { len: 501, max: 500 }));
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn query_equals_returns_matches_in_insert_order() {
        let conn = memory_conn();
        let mut store = SqliteStore::new(&conn);
        store
            .batch_upsert(&[record("900101015555", "A"), record("900101016666", "B")])
            .expect("write");

        let by_ic = store
            .query_equals(RecordField::IdentityNumber, "900101016666")
            .expect("query");
        assert_eq!(by_ic.len(), 1);
        assert_eq!(by_ic[0].full_name, "B");

        let by_delima = store
            .query_equals(RecordField::ExternalId, "M1")
            .expect("query");
        assert_eq!(
            by_delima.iter().map(|r| r.full_name.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );

        assert!(store
            .query_equals(RecordField::IdentityNumber, "000000000000")
            .expect("query")
            .is_empty());
    }

    #[test]
    fn failing_batch_leaves_no_partial_rows() {
        let conn = memory_conn();
        conn.execute(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON students
             WHEN NEW.name = 'BAD' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            [],
        )
        .expect("trigger");
        let mut store = SqliteStore::new(&conn);
        let e = store
            .batch_upsert(&[record("900101015555", "ok"), record("900101016666", "BAD")])
            .expect_err("batch fails");
        assert!(e.to_string().contains("rejected"));
        assert_eq!(count(&conn), 0);
    }
}
