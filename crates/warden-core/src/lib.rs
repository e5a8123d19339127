//! warden-core: Face enrollment, nearest-neighbor threat matching and the
//! recognition loop.
//!
//! Detection and embedding run through the [`FaceEncoder`] seam; the shipped
//! implementation uses SCRFD and ArcFace via ONNX Runtime.

pub mod alignment;
pub mod detector;
pub mod draw;
pub mod encoder;
pub mod enroll;
pub mod labels;
pub mod matcher;
pub mod policy;
pub mod recognizer;
pub mod session;
pub mod store;
pub mod types;

pub use encoder::{EncoderError, FaceEncoder, OnnxEncoder};
pub use enroll::{enroll, EnrollmentReport, ImageOutcome, SourceReport, SourceStatus};
pub use matcher::{
    identify, EuclideanMatcher, Identification, MatchResult, Matcher, ACCEPTANCE_THRESHOLD,
};
pub use policy::Treatment;
pub use session::{Alarm, FaceReport, FrameSink, FrameSource, LoopError, LoopExit, RecognitionLoop};
pub use store::{StoreError, DEFAULT_KNOWN_SET_FILE};
pub use types::{BoundingBox, Category, Embedding, EnrollmentRecord, KnownSet};
