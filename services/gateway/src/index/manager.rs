use crate::error::{BackendError, BackendResult};
use crate::index::IndexSchema;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tantivy::directory::MmapDirectory;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyError};

const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// Owns an index together with its single writer and a manually reloaded reader.
#[derive(Clone)]
pub struct IndexManager {
    index: Index,
    schema: IndexSchema,
    reader: IndexReader,
    writer: Arc<Mutex<IndexWriter>>,
}

impl IndexManager {
    pub fn create_in_ram() -> BackendResult<Self> {
        let schema = IndexSchema::new();
        let index = Index::create_in_ram(schema.schema());
        Self::from_index(index, schema)
    }

    /// Opens the index stored under `path`, creating it when the directory is
    /// empty. Fails while another process holds the index writer lock.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> BackendResult<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let schema = IndexSchema::new();
        let directory = MmapDirectory::open(path.as_ref()).map_err(TantivyError::from)?;
        let index = Index::open_or_create(directory, schema.schema())?;
        Self::from_index(index, schema)
    }

    fn from_index(index: Index, schema: IndexSchema) -> BackendResult<Self> {
        let writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BUDGET)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            index,
            schema,
            reader,
            writer: Arc::new(Mutex::new(writer)),
        })
    }

    pub fn writer(&self) -> MutexGuard<'_, IndexWriter> {
        match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Index writer mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Makes the last commit visible to new searchers.
    pub fn refresh(&self) -> BackendResult<()> {
        self.reader.reload().map_err(BackendError::from)
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}
