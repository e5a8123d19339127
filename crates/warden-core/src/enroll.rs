//! Offline enrollment: scan labeled image directories into a known set.
//!
//! Every image and every directory yields an explicit outcome value so the
//! caller can report counts; a bad file never aborts the scan.

use crate::encoder::{EncoderError, FaceEncoder};
use crate::labels::{format_label, infer_category, normalize_name};
use crate::types::{Category, EnrollmentRecord, KnownSet};
use image::ImageReader;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("not a regular file")]
    NotAFile,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Encoder(#[from] EncoderError),
}

/// What happened to one directory entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Enrolled { file: String, label: String },
    NoFace { file: String },
    Failed { file: String, reason: String },
}

/// What happened to one directory as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    Scanned,
    Missing,
    Empty,
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub dir: PathBuf,
    pub category: Category,
    pub status: SourceStatus,
    pub outcomes: Vec<ImageOutcome>,
}

impl SourceReport {
    pub fn enrolled(&self) -> usize {
        self.count(|o| matches!(o, ImageOutcome::Enrolled { .. }))
    }

    pub fn no_face(&self) -> usize {
        self.count(|o| matches!(o, ImageOutcome::NoFace { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ImageOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ImageOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Result of a full enrollment run.
#[derive(Debug, Clone)]
pub struct EnrollmentReport {
    pub known: KnownSet,
    pub sources: Vec<SourceReport>,
}

/// Encode the first face of one image file.
///
/// `Ok(None)` means the image decoded but no face was found.
pub fn enroll_image<E: FaceEncoder>(
    path: &Path,
    category: Category,
    encoder: &mut E,
) -> Result<Option<EnrollmentRecord>, EnrollError> {
    if !path.is_file() {
        return Err(EnrollError::NotAFile);
    }

    // Format comes from the file content, not the extension.
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgb8();
    let faces = encoder.locate(&image)?;
    let Some(first) = faces.first() else {
        return Ok(None);
    };

    let embedding = encoder.encode(&image, first)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(EnrollmentRecord {
        embedding,
        label: format_label(&normalize_name(&file_name), category),
    }))
}

/// Enroll every entry of one directory, in listing order.
pub fn enroll_directory<E: FaceEncoder>(
    dir: &Path,
    encoder: &mut E,
) -> (SourceReport, Vec<EnrollmentRecord>) {
    let category = infer_category(dir);
    let mut report = SourceReport {
        dir: dir.to_path_buf(),
        category,
        status: SourceStatus::Scanned,
        outcomes: Vec::new(),
    };

    tracing::info!(dir = %dir.display(), %category, "processing images");

    if !dir.exists() {
        tracing::error!(dir = %dir.display(), "folder not found");
        report.status = SourceStatus::Missing;
        return (report, Vec::new());
    }

    let entries: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(iter) => iter.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "cannot read folder");
            report.status = SourceStatus::Unreadable(e.to_string());
            return (report, Vec::new());
        }
    };

    if entries.is_empty() {
        tracing::warn!(dir = %dir.display(), "no images found");
        report.status = SourceStatus::Empty;
        return (report, Vec::new());
    }

    let mut records = Vec::new();
    for path in entries {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::debug!(%file, "processing image");

        let outcome = match enroll_image(&path, category, encoder) {
            Ok(Some(record)) => {
                tracing::info!(%file, label = %record.label, "face encoded");
                let outcome = ImageOutcome::Enrolled {
                    file,
                    label: record.label.clone(),
                };
                records.push(record);
                outcome
            }
            Ok(None) => {
                tracing::warn!(%file, "no face detected");
                ImageOutcome::NoFace { file }
            }
            Err(e) => {
                tracing::error!(%file, error = %e, "error processing image");
                ImageOutcome::Failed {
                    file,
                    reason: e.to_string(),
                }
            }
        };
        report.outcomes.push(outcome);
    }

    (report, records)
}

/// Enroll several directories in order into one known set.
pub fn enroll<E: FaceEncoder>(dirs: &[PathBuf], encoder: &mut E) -> EnrollmentReport {
    let mut sources = Vec::with_capacity(dirs.len());
    let mut records = Vec::new();

    for dir in dirs {
        let (report, found) = enroll_directory(dir, encoder);
        records.extend(found);
        sources.push(report);
    }

    let encoder_version = encoder.model_version().map(str::to_string);
    EnrollmentReport {
        known: KnownSet::new(records, encoder_version),
        sources,
    }
}
