//! The real-time recognition loop.
//!
//! Single-threaded and blocking: acquire a frame, locate and embed faces,
//! match each against the known set, draw, alarm, show, then poll for exit.
//! Per-frame failures are logged and skipped, as are source errors the
//! source reports as transient; every other source or sink failure ends the
//! loop.

use crate::draw::annotate_face;
use crate::encoder::FaceEncoder;
use crate::matcher::{identify, EuclideanMatcher, Identification, Matcher};
use crate::policy::Treatment;
use crate::types::{BoundingBox, KnownSet};
use image::RgbImage;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A blocking supply of RGB frames.
pub trait FrameSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Next frame, `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, Self::Error>;

    /// Whether `error` spoiled only the current frame, so the next call may
    /// still succeed.
    fn is_transient(_error: &Self::Error) -> bool {
        false
    }
}

/// Where annotated frames are shown.
pub trait FrameSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn show(&mut self, frame: &RgbImage, faces: &[FaceReport]) -> Result<(), Self::Error>;

    /// Polled once per frame; `true` ends the loop.
    fn exit_requested(&mut self) -> Result<bool, Self::Error>;
}

/// An audible alarm. `sound` blocks for the alarm's duration.
pub trait Alarm {
    fn sound(&mut self);
}

impl<A: Alarm + ?Sized> Alarm for &mut A {
    fn sound(&mut self) {
        (**self).sound()
    }
}

/// One face in one frame.
#[derive(Debug, Clone)]
pub struct FaceReport {
    pub face: BoundingBox,
    pub identity: Identification,
    pub treatment: Treatment,
}

/// Why the loop stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    ExitRequested { frames: u64 },
    EndOfStream { frames: u64 },
}

#[derive(Error, Debug)]
pub enum LoopError {
    #[error("frame source failed: {0}")]
    Source(#[source] BoxError),
    #[error("frame sink failed: {0}")]
    Sink(#[source] BoxError),
}

/// Recognition state shared across frames: the read-only known set plus
/// the encoder and alarm.
pub struct RecognitionLoop<'k, E, A> {
    known: &'k KnownSet,
    encoder: E,
    alarm: A,
    matcher: EuclideanMatcher,
}

impl<'k, E: FaceEncoder, A: Alarm> RecognitionLoop<'k, E, A> {
    pub fn new(known: &'k KnownSet, encoder: E, alarm: A) -> Self {
        Self {
            known,
            encoder,
            alarm,
            matcher: EuclideanMatcher::default(),
        }
    }

    /// Identify every face in `frame`, draw the annotations onto it and sound
    /// the alarm once per matched threat.
    ///
    /// A detection failure leaves the frame untouched and returns no faces; a
    /// face that fails to encode is skipped.
    pub fn process_frame(&mut self, frame: &mut RgbImage) -> Vec<FaceReport> {
        let faces = match self.encoder.locate(frame) {
            Ok(faces) => faces,
            Err(e) => {
                tracing::warn!(error = %e, "face detection failed; skipping frame");
                return Vec::new();
            }
        };

        let mut reports = Vec::with_capacity(faces.len());
        for face in faces {
            let embedding = match self.encoder.encode(frame, &face) {
                Ok(embedding) => embedding,
                Err(e) => {
                    tracing::warn!(error = %e, "face encoding failed; skipping face");
                    continue;
                }
            };

            let result = self.matcher.compare(&embedding, self.known);
            let identity = identify(&result);
            let treatment = identity.category().treatment();
            tracing::debug!(
                name = %identity.name,
                tag = %identity.tag,
                distance = ?result.distance,
                "face identified"
            );

            if treatment.alarm {
                tracing::warn!(
                    name = %identity.name,
                    distance = ?result.distance,
                    "THREAT DETECTED"
                );
                self.alarm.sound();
            }

            reports.push(FaceReport {
                face,
                identity,
                treatment,
            });
        }

        for report in &reports {
            annotate_face(frame, &report.face, &report.identity.caption(), report.treatment.color);
        }

        reports
    }

    /// Run until the sink asks to exit or the source runs dry.
    pub fn run<S, D>(&mut self, source: &mut S, sink: &mut D) -> Result<LoopExit, LoopError>
    where
        S: FrameSource,
        D: FrameSink,
    {
        tracing::info!(known = self.known.len(), "recognition loop started");
        let mut frames = 0u64;

        loop {
            let mut frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!(frames, "frame source ended");
                    return Ok(LoopExit::EndOfStream { frames });
                }
                Err(e) if S::is_transient(&e) => {
                    tracing::warn!(error = %e, "dropping unreadable frame");
                    continue;
                }
                Err(e) => return Err(LoopError::Source(Box::new(e))),
            };
            frames += 1;

            let faces = self.process_frame(&mut frame);
            sink.show(&frame, &faces).map_err(|e| LoopError::Sink(Box::new(e)))?;

            if sink.exit_requested().map_err(|e| LoopError::Sink(Box::new(e)))? {
                tracing::info!(frames, "exit requested");
                return Ok(LoopExit::ExitRequested { frames });
            }
        }
    }
}
