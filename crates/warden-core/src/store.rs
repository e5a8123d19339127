//! Known-set persistence as a flat bincode file.
//!
//! On disk the set is two parallel sequences, `encodings` and `labels`,
//! plus a little metadata. Loading rejects files whose sequences differ in
//! length, whose encodings are empty or of mixed dimension, or whose format
//! version is not the current one.

use crate::types::{Embedding, EnrollmentRecord, KnownSet};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

pub const FORMAT_VERSION: u32 = 1;

/// Default enrollment file name, relative to the working directory.
pub const DEFAULT_KNOWN_SET_FILE: &str = "face_model.bin";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("encoding failed: {0}")]
    Codec(#[from] bincode::Error),
    #[error("unsupported known-set format version {found} (expected {})", FORMAT_VERSION)]
    Version { found: u32 },
    #[error("corrupt known set: {encodings} encodings but {labels} labels")]
    LengthMismatch { encodings: usize, labels: usize },
    #[error("corrupt known set: encoding {index} is empty")]
    EmptyEncoding { index: usize },
    #[error("corrupt known set: encoding {index} has {found} dimensions (expected {expected})")]
    Dimension {
        index: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Serialize, Deserialize)]
struct KnownSetFile {
    version: u32,
    created_at: String,
    encoder: Option<String>,
    encodings: Vec<Vec<f32>>,
    labels: Vec<String>,
}

impl From<&KnownSet> for KnownSetFile {
    fn from(set: &KnownSet) -> Self {
        let (encodings, labels) = set
            .records
            .iter()
            .map(|r| (r.embedding.values.clone(), r.label.clone()))
            .unzip();
        Self {
            version: FORMAT_VERSION,
            created_at: set.created_at.clone(),
            encoder: set.encoder.clone(),
            encodings,
            labels,
        }
    }
}

impl TryFrom<KnownSetFile> for KnownSet {
    type Error = StoreError;

    fn try_from(file: KnownSetFile) -> Result<Self, Self::Error> {
        if file.version != FORMAT_VERSION {
            return Err(StoreError::Version { found: file.version });
        }
        if file.encodings.len() != file.labels.len() {
            return Err(StoreError::LengthMismatch {
                encodings: file.encodings.len(),
                labels: file.labels.len(),
            });
        }
        if let Some(index) = file.encodings.iter().position(Vec::is_empty) {
            return Err(StoreError::EmptyEncoding { index });
        }
        if let Some(first) = file.encodings.first() {
            let expected = first.len();
            if let Some((index, found)) = file
                .encodings
                .iter()
                .map(Vec::len)
                .enumerate()
                .find(|&(_, len)| len != expected)
            {
                return Err(StoreError::Dimension {
                    index,
                    expected,
                    found,
                });
            }
        }

        let records = file
            .encodings
            .into_iter()
            .zip(file.labels)
            .map(|(values, label)| EnrollmentRecord {
                embedding: Embedding::new(values),
                label,
            })
            .collect();

        Ok(KnownSet {
            records,
            created_at: file.created_at,
            encoder: file.encoder,
        })
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl KnownSet {
    /// Write the set to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let file = File::create(path).map_err(io_err(path))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &KnownSetFile::from(self))?;
        writer.flush().map_err(io_err(path))?;

        tracing::info!(path = %path.display(), records = self.len(), "known set saved");
        Ok(())
    }

    /// Read a set previously written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(io_err(path))?;
        let raw: KnownSetFile = bincode::deserialize_from(BufReader::new(file))?;
        let set = KnownSet::try_from(raw)?;

        tracing::info!(
            path = %path.display(),
            records = set.len(),
            encoder = ?set.encoder,
            created_at = %set.created_at,
            "known set loaded"
        );
        Ok(set)
    }
}
