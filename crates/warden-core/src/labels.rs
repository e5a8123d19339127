//! Label conventions: filename normalization, directory category inference,
//! and the `"<name> (<category>)"` label format.

use crate::types::Category;
use image::ImageFormat;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// `(<digits>)` suffixes used to tell apart several photos of one person.
static DISAMBIGUATOR: OnceLock<Regex> = OnceLock::new();

fn disambiguator() -> &'static Regex {
    DISAMBIGUATOR.get_or_init(|| Regex::new(r"\(\d+\)").expect("disambiguator pattern is valid"))
}

/// Derive a person's name from an image filename.
///
/// Strips the image extension, removes every `(<digits>)` group and trims
/// whitespace: `"peter(1).jpg"` becomes `"peter"`. The steps repeat until
/// the name stops changing, so normalizing a normalized name is a no-op.
/// Only extensions the image decoder knows are stripped (`"a.b.jpg"` keeps
/// `"a.b"`).
pub fn normalize_name(file_name: &str) -> String {
    let mut current = file_name.to_string();
    loop {
        let next = normalize_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn normalize_once(name: &str) -> String {
    let stem = strip_image_extension(name);
    disambiguator().replace_all(stem, "").trim().to_string()
}

fn strip_image_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        // A leading dot is a hidden file, not an extension.
        Some((stem, ext)) if !stem.is_empty() && ImageFormat::from_extension(ext).is_some() => stem,
        _ => name,
    }
}

/// Infer the category of an enrollment directory from its path text.
///
/// `non_threat` must be tested first: it contains `threat`.
pub fn infer_category(dir: &Path) -> Category {
    let text = dir.to_string_lossy().to_lowercase();
    if text.contains("non_threat") {
        Category::NonThreat
    } else if text.contains("threat") {
        Category::Threat
    } else {
        Category::Unknown
    }
}

/// Build the stored label for an enrolled face.
pub fn format_label(name: &str, category: Category) -> String {
    format!("{name} ({category})")
}

/// Split a stored label on its last space into `(name, category_tag)`.
///
/// Parentheses around the tag are removed. A label without a space is all
/// name, tagged `"unknown"`.
pub fn split_label(label: &str) -> (&str, &str) {
    match label.rsplit_once(' ') {
        Some((name, tag)) => (name, tag.trim_matches(|c| c == '(' || c == ')')),
        None => (label, Category::Unknown.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_disambiguator_and_extension() {
        assert_eq!(normalize_name("peter(1).jpg"), "peter");
        assert_eq!(normalize_name("ana_maria.png"), "ana_maria");
        assert_eq!(normalize_name("bob (12).JPEG"), "bob");
    }

    #[test]
    fn test_normalize_removes_every_group() {
        assert_eq!(normalize_name("jo(1)hn(2).jpg"), "john");
    }

    #[test]
    fn test_normalize_only_suffix_yields_empty() {
        assert_eq!(normalize_name("(3).png"), "");
    }

    #[test]
    fn test_normalize_keeps_non_numeric_parens() {
        assert_eq!(normalize_name("carl (old).jpg"), "carl (old)");
    }

    #[test]
    fn test_normalize_keeps_unknown_extension_dots() {
        assert_eq!(normalize_name("a.b.jpg"), "a.b");
        assert_eq!(normalize_name(".jpg"), ".jpg");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = [
            "peter(1).jpg",
            "ana_maria.png",
            "(1(2)).jpg",
            "x.png.jpg",
            "  spaced (4) .bmp",
            "a.b.jpg",
            "",
            "((1))",
            "name(1) (2).webp",
        ];
        for input in inputs {
            let once = normalize_name(input);
            assert_eq!(normalize_name(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(infer_category(Path::new("C:/Dataset/threat_faces")), Category::Threat);
        assert_eq!(
            infer_category(Path::new("C:/Dataset/non_threat_faces")),
            Category::NonThreat
        );
        assert_eq!(
            infer_category(Path::new("/data/NON_THREAT")),
            Category::NonThreat
        );
        assert_eq!(infer_category(Path::new("/data/Threats")), Category::Threat);
        assert_eq!(infer_category(Path::new("/data/visitors")), Category::Unknown);
    }

    #[test]
    fn test_infer_category_hyphen_is_not_non_threat() {
        // Only the underscore spelling marks a non-threat directory.
        assert_eq!(infer_category(Path::new("/data/non-threat")), Category::Threat);
    }

    #[test]
    fn test_format_and_split_label() {
        let label = format_label("bob", Category::Threat);
        assert_eq!(label, "bob (threat)");
        assert_eq!(split_label(&label), ("bob", "threat"));
    }

    #[test]
    fn test_split_label_uses_last_space() {
        assert_eq!(split_label("mary jane (non-threat)"), ("mary jane", "non-threat"));
    }

    #[test]
    fn test_split_label_empty_name() {
        assert_eq!(split_label(" (threat)"), ("", "threat"));
    }

    #[test]
    fn test_split_label_without_space() {
        assert_eq!(split_label("solo"), ("solo", "unknown"));
    }
}
