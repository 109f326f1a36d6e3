use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS aggregate (
          area TEXT NOT NULL,
          category TEXT NOT NULL,
          statistics TEXT NOT NULL,
          qualifier TEXT NOT NULL,
          value NUMERIC NOT NULL,
          PRIMARY KEY (area, category, statistics, qualifier)
        );

        CREATE INDEX IF NOT EXISTS idx_aggregate_area ON aggregate(area);
        "#,
    )
}
