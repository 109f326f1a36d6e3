use std::path::Path;

use factsheet_model::LabelRecord;
use rusqlite::{params, Connection, ErrorCode};
use thiserror::Error;

use crate::schema;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("duplicate record key ({area}, {category}, {statistics}, {qualifier})")]
    DuplicateKey {
        area: String,
        category: String,
        statistics: String,
        qualifier: String,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Persists [`LabelRecord`]s into the `aggregate` table.
///
/// Column naming follows the published dataset: the table label is stored as
/// `category`, the row label as `statistics` and the column label as
/// `qualifier`.
#[derive(Debug)]
pub struct RecordSink {
    conn: Connection,
}

impl RecordSink {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a batch of records inside one transaction.
    ///
    /// Nothing is written if any record collides on the composite key; the
    /// offending key is reported and the transaction rolls back.
    pub fn insert_all(&mut self, records: &[LabelRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO aggregate (area, category, statistics, qualifier, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.area,
                    record.table,
                    record.row,
                    record.column,
                    record.value,
                ])
                .map_err(|err| match err {
                    rusqlite::Error::SqliteFailure(e, _)
                        if e.code == ErrorCode::ConstraintViolation =>
                    {
                        StorageError::DuplicateKey {
                            area: record.area.clone(),
                            category: record.table.clone(),
                            statistics: record.row.clone(),
                            qualifier: record.column.clone(),
                        }
                    }
                    other => StorageError::Sqlite(other),
                })?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Total number of stored records.
    pub fn count(&self) -> Result<u64> {
        let n: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM aggregate", [], |row| row.get(0))?;
        Ok(n)
    }

    /// All records for one area, in key order.
    pub fn records_for_area(&self, area: &str) -> Result<Vec<LabelRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT area, category, statistics, qualifier, value
             FROM aggregate
             WHERE area = ?1
             ORDER BY category, statistics, qualifier",
        )?;
        let rows = stmt.query_map(params![area], |row| {
            Ok(LabelRecord {
                area: row.get(0)?,
                table: row.get(1)?,
                row: row.get(2)?,
                column: row.get(3)?,
                value: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(area: &str, table: &str, row: &str, column: &str, value: f64) -> LabelRecord {
        LabelRecord {
            area: area.into(),
            table: table.into(),
            row: row.into(),
            column: column.into(),
            value,
        }
    }

    #[test]
    fn inserts_and_reads_back() {
        let mut sink = RecordSink::open_in_memory().unwrap();
        let records = vec![
            record("Z34", "Ethnicity", "White", "Male", 1.23),
            record("Z34", "Ethnicity", "White", "Female", 4.56),
        ];
        assert_eq!(sink.insert_all(&records).unwrap(), 2);
        assert_eq!(sink.count().unwrap(), 2);

        let stored = sink.records_for_area("Z34").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].column, "Female");
        assert_eq!(stored[0].value, 4.56);
    }

    #[test]
    fn duplicate_composite_key_is_reported_not_overwritten() {
        let mut sink = RecordSink::open_in_memory().unwrap();
        sink.insert_all(&[record("Z34", "Ethnicity", "White", "Male", 1.0)])
            .unwrap();

        let err = sink
            .insert_all(&[record("Z34", "Ethnicity", "White", "Male", 9.0)])
            .unwrap_err();
        match err {
            StorageError::DuplicateKey { area, qualifier, .. } => {
                assert_eq!(area, "Z34");
                assert_eq!(qualifier, "Male");
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }

        // The original value survives.
        let stored = sink.records_for_area("Z34").unwrap();
        assert_eq!(stored[0].value, 1.0);
    }

    #[test]
    fn failed_batch_rolls_back_entirely() {
        let mut sink = RecordSink::open_in_memory().unwrap();
        let batch = vec![
            record("Z34", "Ethnicity", "White", "Male", 1.0),
            record("Z34", "Ethnicity", "White", "Male", 2.0),
        ];
        assert!(sink.insert_all(&batch).is_err());
        assert_eq!(sink.count().unwrap(), 0);
    }

    #[test]
    fn same_labels_in_different_areas_do_not_collide() {
        let mut sink = RecordSink::open_in_memory().unwrap();
        sink.insert_all(&[record("Z34", "Ethnicity", "White", "Male", 1.0)])
            .unwrap();
        sink.insert_all(&[record("A01", "Ethnicity", "White", "Male", 2.0)])
            .unwrap();
        assert_eq!(sink.count().unwrap(), 2);
    }

    #[test]
    fn persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregate.db");
        {
            let mut sink = RecordSink::open_path(&path).unwrap();
            sink.insert_all(&[record("Z34", "Ethnicity", "White", "Male", 1.0)])
                .unwrap();
        }
        let sink = RecordSink::open_path(&path).unwrap();
        assert_eq!(sink.count().unwrap(), 1);
    }
}
