//! The face encoding seam: locate faces in an RGB image and turn each into
//! an embedding.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError, ARCFACE_MODEL_VERSION};
use crate::types::{BoundingBox, Embedding};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Face detection plus embedding extraction.
pub trait FaceEncoder {
    /// Locate faces, most prominent first.
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EncoderError>;

    /// Embed one located face.
    fn encode(&mut self, image: &RgbImage, face: &BoundingBox) -> Result<Embedding, EncoderError>;

    /// Version tag stored alongside enrolled embeddings.
    fn model_version(&self) -> Option<&str> {
        None
    }
}

impl<E: FaceEncoder + ?Sized> FaceEncoder for &mut E {
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EncoderError> {
        (**self).locate(image)
    }

    fn encode(&mut self, image: &RgbImage, face: &BoundingBox) -> Result<Embedding, EncoderError> {
        (**self).encode(image, face)
    }

    fn model_version(&self) -> Option<&str> {
        (**self).model_version()
    }
}

/// SCRFD detection + ArcFace recognition.
pub struct OnnxEncoder {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxEncoder {
    /// Load both models. Fails fast if either file is missing.
    pub fn load(scrfd_path: &str, arcface_path: &str) -> Result<Self, EncoderError> {
        let detector = FaceDetector::load(scrfd_path)?;
        tracing::info!(path = scrfd_path, "SCRFD detector loaded");

        let recognizer = FaceRecognizer::load(arcface_path)?;
        tracing::info!(path = arcface_path, "ArcFace recognizer loaded");

        Ok(Self { detector, recognizer })
    }
}

impl FaceEncoder for OnnxEncoder {
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EncoderError> {
        Ok(self.detector.detect(image)?)
    }

    fn encode(&mut self, image: &RgbImage, face: &BoundingBox) -> Result<Embedding, EncoderError> {
        Ok(self.recognizer.extract(image, face)?)
    }

    fn model_version(&self) -> Option<&str> {
        Some(ARCFACE_MODEL_VERSION)
    }
}
