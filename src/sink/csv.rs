//! CSV file sink
//!
//! Rows are spooled to temporary Arrow IPC segments while the run is in
//! progress and only written as CSV by [`RecordSink::finish`], once every
//! column that will ever appear is known. A new segment starts whenever the
//! incoming column set changes, so one batch at a time is held in memory.

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::WriterBuilder;
use arrow::datatypes::{Field, FieldRef, Schema, SchemaRef};
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;

use crate::error::{ExtractError, Result};
use crate::schema::CanonicalFieldSet;
use crate::schema::adapt::align_to_schema;
use crate::sink::RecordSink;

/// Batches with one column layout, spooled to an anonymous temp file
struct Segment {
    schema: SchemaRef,
    writer: StreamWriter<BufWriter<File>>,
}

/// Writes batches to a comma-separated file with one header
///
/// The header is the union of every column appended during the run.
/// Columns named in the field order come first, in that order; any other
/// column follows in the order it first arrived. Batches lacking a header
/// column get empty fields for it.
///
/// Nothing reaches `path` until [`RecordSink::finish`] is called.
pub struct CsvSink {
    path: PathBuf,
    spool_dir: PathBuf,
    out: BufWriter<File>,
    field_order: Vec<String>,
    columns: Vec<FieldRef>,
    closed: Vec<File>,
    current: Option<Segment>,
    header_requested: bool,
    header: Option<SchemaRef>,
    rows_written: usize,
    finished: bool,
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("path", &self.path)
            .field("columns", &self.columns.len())
            .field("segments", &(self.closed.len() + usize::from(self.current.is_some())))
            .field("rows_written", &self.rows_written)
            .field("finished", &self.finished)
            .finish()
    }
}

impl CsvSink {
    /// Create (or truncate) the output file
    ///
    /// Header columns follow the canonical output order.
    ///
    /// # Errors
    /// Returns an I/O error carrying the path if the file cannot be created
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let spool_dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ExtractError::with_path(e, parent))?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };
        let file = File::create(&path).map_err(|e| ExtractError::with_path(e, &path))?;
        log::debug!("Writing output to {}", path.display());

        Ok(Self {
            path,
            spool_dir,
            out: BufWriter::new(file),
            field_order: CanonicalFieldSet::default().iter().map(String::from).collect(),
            columns: Vec::new(),
            closed: Vec::new(),
            current: None,
            header_requested: false,
            header: None,
            rows_written: 0,
            finished: false,
        })
    }

    /// Order header columns by `fields`
    #[must_use]
    pub fn with_field_order(mut self, fields: &CanonicalFieldSet) -> Self {
        self.field_order = fields.iter().map(String::from).collect();
        self
    }

    /// Order header columns purely by first arrival
    #[must_use]
    pub fn in_arrival_order(mut self) -> Self {
        self.field_order.clear();
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows accepted so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Names in the header, once it has been written
    #[must_use]
    pub fn header(&self) -> Option<Vec<String>> {
        self.header
            .as_ref()
            .map(|s| s.fields().iter().map(|f| f.name().clone()).collect())
    }

    fn track_columns(&mut self, schema: &Schema) {
        for field in schema.fields() {
            if !self.columns.iter().any(|c| c.name() == field.name()) {
                log::debug!("Column {} first seen in {}", field.name(), self.path.display());
                self.columns
                    .push(Arc::new(Field::new(field.name(), field.data_type().clone(), true)));
            }
        }
    }

    fn spool_error(&self, source: std::io::Error) -> ExtractError {
        ExtractError::with_path(source, &self.spool_dir)
    }

    fn open_segment(&mut self, schema: &SchemaRef) -> Result<()> {
        self.close_segment()?;
        let file = tempfile::tempfile_in(&self.spool_dir).map_err(|e| self.spool_error(e))?;
        let writer = StreamWriter::try_new(BufWriter::new(file), schema)?;
        self.current = Some(Segment {
            schema: Arc::clone(schema),
            writer,
        });
        Ok(())
    }

    fn close_segment(&mut self) -> Result<()> {
        let Some(segment) = self.current.take() else {
            return Ok(());
        };
        let file = segment
            .writer
            .into_inner()?
            .into_inner()
            .map_err(|e| self.spool_error(e.into_error()))?;
        self.closed.push(file);
        Ok(())
    }

    /// The final header: ordered fields first, the rest by arrival
    fn final_header(&self) -> SchemaRef {
        let mut fields = self.columns.clone();
        fields.sort_by_key(|f| {
            self.field_order
                .iter()
                .position(|name| name == f.name())
                .unwrap_or(usize::MAX)
        });
        Arc::new(Schema::new(fields))
    }

    fn write_csv(&mut self, header: &SchemaRef) -> Result<()> {
        let mut write_header = self.header_requested;

        for mut file in std::mem::take(&mut self.closed) {
            file.rewind().map_err(|e| self.spool_error(e))?;
            let reader = StreamReader::try_new(BufReader::new(file), None)?;
            for batch in reader {
                let batch = align_to_schema(&batch?, header)?;
                let mut writer = WriterBuilder::new()
                    .with_header(write_header)
                    .build(&mut self.out);
                writer.write(&batch)?;
                write_header = false;
            }
        }
        Ok(())
    }
}

impl RecordSink for CsvSink {
    fn append(&mut self, batch: &RecordBatch, header_needed: bool) -> Result<()> {
        if batch.num_rows() == 0 {
            return Ok(());
        }
        if self.finished {
            return Err(ExtractError::Config(format!(
                "{} is already finished",
                self.path.display()
            )));
        }

        self.header_requested |= header_needed;
        self.track_columns(batch.schema_ref());

        let same_layout = self
            .current
            .as_ref()
            .is_some_and(|s| s.schema.fields() == batch.schema_ref().fields());
        if !same_layout {
            self.open_segment(batch.schema_ref())?;
        }
        if let Some(segment) = self.current.as_mut() {
            segment.writer.write(batch)?;
        }

        self.rows_written += batch.num_rows();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.close_segment()?;

        if self.rows_written > 0 {
            let header = self.final_header();
            self.write_csv(&header)?;
            self.header = Some(header);
        }

        self.out
            .flush()
            .map_err(|e| ExtractError::with_path(e, &self.path))?;
        log::debug!("Flushed {} rows to {}", self.rows_written, self.path.display());
        Ok(())
    }
}
