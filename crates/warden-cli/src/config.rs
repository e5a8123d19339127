use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use warden_core::DEFAULT_KNOWN_SET_FILE;

/// Runtime configuration, loaded from environment variables.
/// Command-line flags take precedence over these values.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Enrollment file written by `enroll` and read by `watch` / `list`.
    pub known_set: PathBuf,
    pub threat_dir: PathBuf,
    pub non_threat_dir: PathBuf,
    /// Capture device index, i.e. `/dev/video{N}`.
    pub camera_index: u32,
    pub alarm_frequency_hz: u32,
    pub alarm_duration_ms: u64,
    /// Where `watch` writes its log files.
    pub log_dir: PathBuf,
}

impl Config {
    /// Load configuration from `WARDEN_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("warden");

        let path = |key: &str, default: PathBuf| var(key).map(PathBuf::from).unwrap_or(default);

        Self {
            model_dir: path("WARDEN_MODEL_DIR", data_dir.join("models")),
            known_set: path("WARDEN_KNOWN_SET", PathBuf::from(DEFAULT_KNOWN_SET_FILE)),
            threat_dir: path("WARDEN_THREAT_DIR", PathBuf::from("dataset/threat_faces")),
            non_threat_dir: path(
                "WARDEN_NON_THREAT_DIR",
                PathBuf::from("dataset/non_threat_faces"),
            ),
            camera_index: parsed(&var, "WARDEN_CAMERA_INDEX").unwrap_or(0),
            alarm_frequency_hz: parsed(&var, "WARDEN_ALARM_FREQUENCY_HZ").unwrap_or(1000),
            alarm_duration_ms: parsed(&var, "WARDEN_ALARM_DURATION_MS").unwrap_or(500),
            log_dir: path("WARDEN_LOG_DIR", data_dir.join("logs")),
        }
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> String {
        self.model_dir
            .join("det_10g.onnx")
            .to_string_lossy()
            .into_owned()
    }

    /// Path to the ArcFace recognition model.
    pub fn arcface_model_path(&self) -> String {
        self.model_dir
            .join("w600k_r50.onnx")
            .to_string_lossy()
            .into_owned()
    }

    pub fn alarm_duration(&self) -> Duration {
        Duration::from_millis(self.alarm_duration_ms)
    }
}

fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|v| v.trim().parse().ok())
}
