use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl BoundingBox {
    /// A landmark-less box, as produced by test fixtures and simple detectors.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: 1.0,
            landmarks: None,
        }
    }

    /// Intersection-over-Union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let inter = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.width * self.height + other.width * other.height - inter;

        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// Face embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Euclidean distance between two embeddings.
    ///
    /// `None` when the dimensions differ or either vector is empty.
    pub fn euclidean_distance(&self, other: &Embedding) -> Option<f32> {
        if self.values.is_empty() || self.dim() != other.dim() {
            return None;
        }
        let sum: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        Some(sum.sqrt())
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self { values }
    }
}

/// Classification attached to an enrolled identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Threat,
    NonThreat,
    Unknown,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Threat => "threat",
            Category::NonThreat => "non-threat",
            Category::Unknown => "unknown",
        }
    }

    /// Parse a category tag case-insensitively. Anything unrecognized is `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("threat") {
            Category::Threat
        } else if tag.eq_ignore_ascii_case("non-threat") {
            Category::NonThreat
        } else {
            Category::Unknown
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One enrolled face: its embedding and a `"<name> (<category>)"` label.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentRecord {
    pub embedding: Embedding,
    pub label: String,
}

/// The enrolled faces, in scan order.
///
/// Records are stored as pairs so embeddings and labels stay index-aligned.
/// The set is immutable once a recognition session has loaded it.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownSet {
    pub records: Vec<EnrollmentRecord>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Model version of the encoder that produced the embeddings (e.g. "w600k_r50").
    pub encoder: Option<String>,
}

impl KnownSet {
    pub fn new(records: Vec<EnrollmentRecord>, encoder: Option<String>) -> Self {
        Self {
            records,
            created_at: chrono::Utc::now().to_rfc3339(),
            encoder,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance_identical() {
        let a = Embedding::new(vec![0.3, -0.2, 0.9]);
        assert_eq!(a.euclidean_distance(&a), Some(0.0));
    }

    #[test]
    fn test_euclidean_distance_pythagorean() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![3.0, 4.0]);
        let d = a.euclidean_distance(&b).unwrap();
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_distance_rejects_dimension_mismatch() {
        let short = Embedding::new(vec![0.0]);
        let long = Embedding::new(vec![0.0, 5.0, 5.0]);
        assert_eq!(short.euclidean_distance(&long), None);
        assert_eq!(long.euclidean_distance(&short), None);

        let empty = Embedding::new(Vec::new());
        assert_eq!(empty.euclidean_distance(&empty), None);
    }

    #[test]
    fn test_euclidean_distance_symmetric() {
        let a = Embedding::new(vec![0.1, 0.7, -0.4]);
        let b = Embedding::new(vec![-0.5, 0.2, 0.3]);
        assert_eq!(a.euclidean_distance(&b), b.euclidean_distance(&a));
    }

    #[test]
    fn test_category_from_tag_case_insensitive() {
        assert_eq!(Category::from_tag("THREAT"), Category::Threat);
        assert_eq!(Category::from_tag("Non-Threat"), Category::NonThreat);
        assert_eq!(Category::from_tag("unknown"), Category::Unknown);
        assert_eq!(Category::from_tag("friendly"), Category::Unknown);
        assert_eq!(Category::from_tag(""), Category::Unknown);
    }

    #[test]
    fn test_category_tag_roundtrip() {
        for c in [Category::Threat, Category::NonThreat, Category::Unknown] {
            assert_eq!(Category::from_tag(c.as_str()), c);
        }
    }

    #[test]
    fn test_iou_identical() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }
}
