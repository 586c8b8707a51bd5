//! Raw extract reading.

use crate::{IoError, batch_rows};
use arrow_csv::ReaderBuilder;
use arrow_csv::reader::Format;
use arrow_schema::{DataType, Field, Schema};
use ecom_cleaner::{RawTable, Source, SourceError};
use ecom_core::{Entity, InputConfig};
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BATCH_SIZE: usize = 8192;

/// Reads a delimited file with a header row into a raw table.
///
/// Every column is read as text; short rows are padded with nulls.
pub fn read_raw_table(path: &Path, delimiter: u8) -> Result<RawTable, IoError> {
    let mut file = File::open(path).map_err(|e| IoError::io(path, e))?;

    let format = Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    // Header only: a short data row must not fail inference.
    let (inferred, _) = format.infer_schema(&mut file, Some(0))?;
    let headers: Vec<String> = inferred.fields().iter().map(|f| f.name().clone()).collect();

    // Only the header matters; every column stays text until coercion.
    let schema = Schema::new(
        headers
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    );

    file.rewind().map_err(|e| IoError::io(path, e))?;
    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_delimiter(delimiter)
        .with_truncated_rows(true)
        .with_batch_size(BATCH_SIZE)
        .build(file)?;

    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(batch_rows(&batch?)?);
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(RawTable::new(headers, rows))
}

/// Source reading one `<entity>.csv` per entity from a directory.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
    delimiter: u8,
}

impl CsvDirectorySource {
    /// Creates a source over the configured input directory.
    pub fn new(input: &InputConfig) -> Self {
        Self {
            dir: input.dir.clone(),
            delimiter: input.delimiter_byte(),
        }
    }

    /// Path of an entity's raw extract.
    pub fn path_of(&self, entity: Entity) -> PathBuf {
        self.dir.join(entity.raw_file_name())
    }
}

impl Source for CsvDirectorySource {
    fn extract(&self, entity: Entity) -> Result<RawTable, SourceError> {
        let path = self.path_of(entity);
        if !path.is_file() {
            return Err(SourceError::missing(entity, path.display().to_string()));
        }

        info!("Loading {} from {}", entity, path.display());
        read_raw_table(&path, self.delimiter)
            .map_err(|e| SourceError::unreadable(entity, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_read_raw_table_keeps_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        fs::write(
            &path,
            "id,email,age,city\n1,Ann@Example.com,034,Rome\n2,,25.0,\n3,\"Doe, Jane\",41,NULL\n",
        )
        .unwrap();

        let raw = read_raw_table(&path, b',').unwrap();

        assert_eq!(raw.headers, vec!["id", "email", "age", "city"]);
        assert_eq!(raw.len(), 3);
        // Leading zeros survive: nothing is typed at read time.
        assert_eq!(raw.rows[0][2].as_deref(), Some("034"));
        assert_eq!(raw.rows[1][1].as_deref().unwrap_or(""), "");
        assert_eq!(raw.rows[2][1].as_deref(), Some("Doe, Jane"));
        assert_eq!(raw.rows[2][3].as_deref(), Some("NULL"));
    }

    #[test]
    fn test_short_first_row_is_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        fs::write(&path, "id,email,age\n1,a@b.com\n2,c@d.com,30\n").unwrap();

        let raw = read_raw_table(&path, b',').unwrap();

        assert_eq!(raw.headers, vec!["id", "email", "age"]);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.rows[0][1].as_deref(), Some("a@b.com"));
        assert_eq!(raw.rows[0][2].as_deref().unwrap_or(""), "");
        assert_eq!(raw.rows[1][2].as_deref(), Some("30"));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        fs::write(&path, "id;cost\n1;10,50\n").unwrap();

        let raw = read_raw_table(&path, b';').unwrap();
        assert_eq!(raw.headers, vec!["id", "cost"]);
        assert_eq!(raw.rows[0][1].as_deref(), Some("10,50"));
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("orders.csv"), "order_id,status\n10,shipped\n").unwrap();

        let input = InputConfig {
            dir: dir.path().to_path_buf(),
            ..InputConfig::default()
        };
        let source = CsvDirectorySource::new(&input);

        let orders = source.extract(Entity::Orders).unwrap();
        assert_eq!(orders.len(), 1);
        assert!(matches!(
            source.extract(Entity::Users),
            Err(SourceError::Missing {
                entity: Entity::Users,
                ..
            })
        ));
    }
}
