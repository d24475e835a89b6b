//! `DuckDB`-backed implementation of the embedded query engine.

use duckdb::{AccessMode, Config, Connection};

use crate::{DataError, QueryEngine, QueryHandle};

/// Opens fetched database bytes with `DuckDB`.
///
/// `DuckDB` opens files rather than byte slices, so the bytes are staged in
/// a scratch file that lives exactly as long as the handle. The connection
/// is read-only; the bundled file is never mutated.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbEngine;

impl DuckDbEngine {
    /// Creates the engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl QueryEngine for DuckDbEngine {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn QueryHandle>, DataError> {
        let file = tempfile::NamedTempFile::new()?;
        std::fs::write(file.path(), bytes)?;

        let conn = Connection::open_with_flags(
            file.path(),
            Config::default().access_mode(AccessMode::ReadOnly)?,
        )?;

        Ok(Box::new(DuckDbHandle { conn, _file: file }))
    }
}

/// Live read-only connection over the staged database file.
///
/// Field order matters: the connection must drop before the scratch file is
/// unlinked.
struct DuckDbHandle {
    conn: Connection,
    _file: tempfile::NamedTempFile,
}

impl QueryHandle for DuckDbHandle {
    fn execute(&mut self, sql: &str) -> Result<Vec<[f64; 3]>, DataError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let latitude: Option<f64> = row.get(0)?;
            let longitude: Option<f64> = row.get(1)?;
            let value: Option<f64> = row.get(2)?;

            // NULLs can't be placed or weighted; skip the row.
            let (Some(latitude), Some(longitude), Some(value)) = (latitude, longitude, value)
            else {
                continue;
            };

            out.push([latitude, longitude, value]);
        }

        Ok(out)
    }
}
