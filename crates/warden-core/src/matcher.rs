//! Nearest-neighbor matching of a query embedding against the known set.

use crate::labels::split_label;
use crate::types::{Category, Embedding, KnownSet};

/// Distance below which a nearest neighbor counts as the same person.
pub const ACCEPTANCE_THRESHOLD: f32 = 0.6;

/// Name shown for faces that match nobody.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Result of matching a query embedding against a known set.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    /// Distance to the nearest record, `None` when no record is comparable.
    pub distance: Option<f32>,
    /// Index of the nearest record, `None` when no record is comparable.
    pub index: Option<usize>,
    /// Label of the matched record (only when `matched`).
    pub label: Option<String>,
}

impl MatchResult {
    fn no_match(distance: Option<f32>, index: Option<usize>) -> Self {
        Self {
            matched: false,
            distance,
            index,
            label: None,
        }
    }
}

/// Strategy for comparing a query embedding against enrolled faces.
pub trait Matcher {
    fn compare(&self, query: &Embedding, known: &KnownSet) -> MatchResult;
}

/// Euclidean nearest-neighbor matcher with a strict acceptance threshold.
#[derive(Debug, Clone, Copy)]
pub struct EuclideanMatcher {
    threshold: f32,
}

impl Default for EuclideanMatcher {
    fn default() -> Self {
        Self {
            threshold: ACCEPTANCE_THRESHOLD,
        }
    }
}

impl Matcher for EuclideanMatcher {
    fn compare(&self, query: &Embedding, known: &KnownSet) -> MatchResult {
        let mut best: Option<(usize, f32)> = None;

        for (i, record) in known.records.iter().enumerate() {
            let Some(d) = query.euclidean_distance(&record.embedding) else {
                tracing::debug!(
                    index = i,
                    query_dim = query.dim(),
                    record_dim = record.embedding.dim(),
                    "skipping record with incomparable embedding"
                );
                continue;
            };
            // Strict `<` keeps the first occurrence on ties.
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }

        match best {
            Some((idx, d)) if d < self.threshold => MatchResult {
                matched: true,
                distance: Some(d),
                index: Some(idx),
                label: Some(known.records[idx].label.clone()),
            },
            Some((idx, d)) => MatchResult::no_match(Some(d), Some(idx)),
            None => MatchResult::no_match(None, None),
        }
    }
}

/// Display identity derived from a match.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub name: String,
    /// Category tag as stored in the label (e.g. `"threat"`).
    pub tag: String,
    pub distance: Option<f32>,
}

impl Identification {
    pub fn unknown(distance: Option<f32>) -> Self {
        Self {
            name: UNKNOWN_NAME.to_string(),
            tag: Category::Unknown.as_str().to_string(),
            distance,
        }
    }

    pub fn category(&self) -> Category {
        Category::from_tag(&self.tag)
    }

    /// `"{name} ({tag})"`, the text drawn above the face.
    pub fn caption(&self) -> String {
        format!("{} ({})", self.name, self.tag)
    }
}

/// Turn a match into the name and category tag to display.
pub fn identify(result: &MatchResult) -> Identification {
    match (&result.label, result.matched) {
        (Some(label), true) => {
            let (name, tag) = split_label(label);
            Identification {
                name: name.to_string(),
                tag: tag.to_string(),
                distance: result.distance,
            }
        }
        _ => Identification::unknown(result.distance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnrollmentRecord;

    fn known(entries: &[(&[f32], &str)]) -> KnownSet {
        KnownSet::new(
            entries
                .iter()
                .map(|(values, label)| EnrollmentRecord {
                    embedding: Embedding::new(values.to_vec()),
                    label: label.to_string(),
                })
                .collect(),
            None,
        )
    }

    #[test]
    fn test_reflexive_match() {
        let set = known(&[
            (&[1.0, 0.0, 0.0], "a (threat)"),
            (&[0.0, 1.0, 0.0], "b (non-threat)"),
            (&[0.0, 0.0, 1.0], "c (threat)"),
        ]);
        for (i, record) in set.records.iter().enumerate() {
            let result = EuclideanMatcher::default().compare(&record.embedding, &set);
            assert!(result.matched);
            assert_eq!(result.index, Some(i));
            assert_eq!(result.distance, Some(0.0));
        }
    }

    #[test]
    fn test_scans_entire_set() {
        let set = known(&[
            (&[0.0, 1.0], "decoy1 (non-threat)"),
            (&[5.0, 5.0], "decoy2 (non-threat)"),
            (&[1.0, 0.0], "target (threat)"),
        ]);
        let result = EuclideanMatcher::default().compare(&Embedding::new(vec![1.0, 0.05]), &set);
        assert!(result.matched);
        assert_eq!(result.index, Some(2));
        assert_eq!(result.label.as_deref(), Some("target (threat)"));
    }

    #[test]
    fn test_tie_breaks_on_first_occurrence() {
        let set = known(&[
            (&[0.1, 0.0], "first (threat)"),
            (&[0.1, 0.0], "second (non-threat)"),
        ]);
        let result = EuclideanMatcher::default().compare(&Embedding::new(vec![0.0, 0.0]), &set);
        assert_eq!(result.index, Some(0));
        assert_eq!(result.label.as_deref(), Some("first (threat)"));
    }

    #[test]
    fn test_threshold_is_strict() {
        let set = known(&[(&[0.0], "edge (threat)")]);
        let matcher = EuclideanMatcher::default();

        let at = matcher.compare(&Embedding::new(vec![0.6]), &set);
        assert_eq!(at.distance, Some(0.6));
        assert!(!at.matched, "distance equal to the threshold must be rejected");
        assert_eq!(at.label, None);

        let below = matcher.compare(&Embedding::new(vec![0.599_999]), &set);
        assert!(below.matched);
    }

    #[test]
    fn test_empty_set_never_matches() {
        let set = known(&[]);
        let result = EuclideanMatcher::default().compare(&Embedding::new(vec![0.0, 0.0]), &set);
        assert!(!result.matched);
        assert_eq!(result.distance, None);
        assert_eq!(result.index, None);
        assert_eq!(identify(&result), Identification::unknown(None));
    }

    #[test]
    fn test_shorter_record_is_not_a_prefix_match() {
        let set = known(&[(&[0.0], "bob (threat)")]);
        let result =
            EuclideanMatcher::default().compare(&Embedding::new(vec![0.0, 5.0, 5.0]), &set);
        assert!(!result.matched);
        assert_eq!(result.index, None);
        assert_eq!(identify(&result), Identification::unknown(None));
    }

    #[test]
    fn test_mismatched_records_are_skipped() {
        let set = known(&[
            (&[0.0], "short (threat)"),
            (&[3.0, 4.0], "far (non-threat)"),
            (&[0.1, 0.0], "near (non-threat)"),
        ]);
        let result = EuclideanMatcher::default().compare(&Embedding::new(vec![0.0, 0.0]), &set);
        assert!(result.matched);
        assert_eq!(result.index, Some(2));
    }

    #[test]
    fn test_empty_embeddings_never_match() {
        let set = known(&[(&[], "ghost (threat)")]);
        let matcher = EuclideanMatcher::default();
        assert!(!matcher.compare(&Embedding::new(Vec::new()), &set).matched);
        assert!(!matcher.compare(&Embedding::new(vec![0.0]), &set).matched);
    }

    #[test]
    fn test_identify_accepted_match() {
        let set = known(&[(&[0.0, 0.0], "bob (threat)")]);
        let result = EuclideanMatcher::default().compare(&Embedding::new(vec![0.1, 0.0]), &set);
        let id = identify(&result);
        assert_eq!(id.name, "bob");
        assert_eq!(id.tag, "threat");
        assert_eq!(id.category(), Category::Threat);
        assert_eq!(id.caption(), "bob (threat)");
    }

    #[test]
    fn test_identify_rejected_match_is_unknown() {
        let set = known(&[(&[0.0, 0.0], "bob (threat)")]);
        let result = EuclideanMatcher::default().compare(&Embedding::new(vec![0.9, 0.0]), &set);
        let id = identify(&result);
        assert_eq!(id.name, "Unknown");
        assert_eq!(id.tag, "unknown");
        assert_eq!(id.caption(), "Unknown (unknown)");
        assert!((id.distance.unwrap_or_default() - 0.9).abs() < 1e-6);
    }
}
