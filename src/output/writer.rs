//! Parquet file writer
//!
//! One file per feed. The schema is fixed when the file is created, so every
//! page written afterwards is converted against it.

use super::schema::{infer_schema, records_to_arrow};
use crate::error::{Error, Result};
use crate::types::Record;
use arrow::datatypes::{Schema, SchemaRef};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Compression and row group settings for Parquet output
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 64 * 1024,
        }
    }
}

impl ParquetWriterConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum rows per row group
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    #[must_use]
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Use ZSTD instead of Snappy
    #[must_use]
    pub fn zstd(mut self) -> Self {
        self.compression = Compression::ZSTD(ZstdLevel::default());
        self
    }

    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    fn properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Writes pages of one feed's records to a Parquet file
pub struct ParquetWriter {
    path: PathBuf,
    schema: SchemaRef,
    writer: ArrowWriter<File>,
    rows_written: usize,
}

impl ParquetWriter {
    /// Create the file with a fixed schema
    pub fn create(
        path: impl AsRef<Path>,
        schema: Schema,
        config: &ParquetWriterConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| {
            Error::output(format!("Failed to create '{}': {e}", path.display()))
        })?;

        let schema = Arc::new(schema);
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(config.properties()))?;

        Ok(Self {
            path,
            schema,
            writer,
            rows_written: 0,
        })
    }

    /// Schema every page is converted against
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Convert one page of records and append it
    ///
    /// Fields absent from the schema are dropped; missing fields are null.
    pub fn write_records(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let batch = records_to_arrow(records, Some(&self.schema))?;
        self.writer.write(&batch)?;
        self.rows_written += batch.num_rows();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Finish the file, returning the number of rows in it
    pub fn close(self) -> Result<usize> {
        self.writer.close()?;
        debug!(path = %self.path.display(), rows = self.rows_written, "Closed Parquet file");
        Ok(self.rows_written)
    }
}

/// Write one page of records to a new Parquet file, inferring the schema
///
/// An empty record set is refused: it has no schema to write.
pub fn write_records_to_parquet(
    path: impl AsRef<Path>,
    records: &[Record],
    config: Option<&ParquetWriterConfig>,
) -> Result<usize> {
    if records.is_empty() {
        return Err(Error::output("No records to write"));
    }

    let config = config.cloned().unwrap_or_default();
    let mut writer = ParquetWriter::create(path, infer_schema(records), &config)?;
    writer.write_records(records)?;
    writer.close()
}
