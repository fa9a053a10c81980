//! Frame-by-frame orchestration: detect, adapt, track, count, render, write.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::DetectionSource;
use crate::adapter::adapt_detections;
use crate::config::FootfallConfig;
use crate::counter::{Counts, CrossingCounter, CrossingEvent};
use crate::error::{FootfallError, Result};
use crate::frame::{Frame, FrameSink};
use crate::render::FrameRenderer;
use crate::tracker::{MultiObjectTracker, SortTracker, TrackedObject};

type TrackId<T> = <<T as MultiObjectTracker>::Track as TrackedObject>::Id;

/// Cooperative stop signal, checked once before each frame.
///
/// Raising it between frames ends the run after the frame in progress, with
/// the totals reflecting every frame that completed.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A crossing classified on one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossingRecord<Id> {
    pub track_id: Id,
    pub centroid_y: f32,
    pub event: CrossingEvent,
}

/// What happened on a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport<Id> {
    pub index: u64,
    /// Detection or tracking failed; no track was observed.
    pub skipped: bool,
    pub confirmed_tracks: usize,
    pub crossings: Vec<CrossingRecord<Id>>,
}

impl<Id> FrameReport<Id> {
    fn skipped(index: u64) -> Self {
        Self {
            index,
            skipped: true,
            confirmed_tracks: 0,
            crossings: Vec::new(),
        }
    }
}

/// Totals at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub entries: u64,
    pub exits: u64,
    /// The stop signal ended the run; the source was not drained.
    pub stopped_early: bool,
    pub output: Option<PathBuf>,
}

/// Drives a detector, a tracker and the crossing counter one frame at a time.
///
/// All counter updates happen on the caller's thread in frame order.
pub struct FootfallPipeline<D: DetectionSource, T: MultiObjectTracker> {
    detector: D,
    tracker: T,
    counter: CrossingCounter<TrackId<T>>,
    renderer: Option<Box<dyn FrameRenderer>>,
    config: FootfallConfig,
    stop: StopHandle,
    frames_processed: u64,
    frames_skipped: u64,
}

impl<D: DetectionSource> FootfallPipeline<D, SortTracker> {
    /// Pipeline using the built-in tracker configured from `config.tracker`.
    pub fn with_sort_tracker(detector: D, config: FootfallConfig) -> Result<Self> {
        let tracker = SortTracker::new(config.tracker.clone());
        Self::new(detector, tracker, config)
    }
}

impl<D: DetectionSource, T: MultiObjectTracker> FootfallPipeline<D, T> {
    pub fn new(detector: D, tracker: T, config: FootfallConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector,
            tracker,
            counter: CrossingCounter::new(config.line_y),
            renderer: None,
            config,
            stop: StopHandle::default(),
            frames_processed: 0,
            frames_skipped: 0,
        })
    }

    pub fn with_renderer(mut self, renderer: impl FrameRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Handle that can end [`run`](Self::run) at the next frame boundary.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn config(&self) -> &FootfallConfig {
        &self.config
    }

    pub fn counts(&self) -> Counts {
        self.counter.counts()
    }

    pub fn counter(&self) -> &CrossingCounter<TrackId<T>> {
        &self.counter
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// Detect, track and count on one frame, annotating it in place.
    ///
    /// A detector or tracker failure skips the frame: nothing is observed,
    /// the counts are untouched and the frame is left unannotated.
    pub fn process_frame(&mut self, frame: &mut Frame) -> FrameReport<TrackId<T>> {
        let index = frame.index;
        let (detections, tracks) = match self.detect_and_track(frame) {
            Ok(found) => found,
            Err(e) => {
                warn!(frame = index, error = %e, "skipping frame");
                self.frames_skipped += 1;
                return FrameReport::skipped(index);
            }
        };

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.begin_frame(&mut frame.image, self.config.line_y);
        }

        let mut report = FrameReport {
            index,
            skipped: false,
            confirmed_tracks: 0,
            crossings: Vec::new(),
        };
        let mut seen = HashSet::new();

        for track in tracks.iter().filter(|t| t.is_confirmed()) {
            let id = track.track_id();
            if !seen.insert(id.clone()) {
                warn!(frame = index, track = %id, "tracker reported a track twice, ignoring repeat");
                continue;
            }
            report.confirmed_tracks += 1;

            let [_, y1, _, y2] = track.tlbr();
            let centroid_y = self.config.centroid.centroid_y(y1, y2);
            let event = self.counter.observe(id.clone(), centroid_y);

            match event {
                CrossingEvent::Exit => {
                    info!("track {id} exiting, total exits {}", self.counter.exits())
                }
                CrossingEvent::Entry => {
                    info!("track {id} entering, total entries {}", self.counter.entries())
                }
                CrossingEvent::None => {}
            }

            if let Some(renderer) = self.renderer.as_mut() {
                renderer.draw_track(&mut frame.image, &id, track.tlbr(), event);
            }
            if event.is_crossing() {
                report.crossings.push(CrossingRecord {
                    track_id: id,
                    centroid_y,
                    event,
                });
            }
        }

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.end_frame(&mut frame.image, self.counter.counts());
        }

        self.frames_processed += 1;
        debug!(
            frame = index,
            detections,
            tracks = tracks.len(),
            confirmed = report.confirmed_tracks,
            "frame processed"
        );
        report
    }

    /// Returns the number of adapted detections and the tracker's output.
    fn detect_and_track(
        &mut self,
        frame: &Frame,
    ) -> Result<(usize, Vec<<T as MultiObjectTracker>::Track>)> {
        let threshold = self.config.confidence_threshold;
        let class_filter = [self.config.target_class];

        let detections = self
            .detector
            .detect(frame, &class_filter, threshold)
            .map_err(|e| FootfallError::Detection {
                frame: frame.index,
                reason: e.to_string(),
            })?;
        let adapted = adapt_detections(&detections, self.config.target_class, threshold);

        let tracks = self
            .tracker
            .update(frame, &adapted)
            .map_err(|e| FootfallError::Tracking {
                frame: frame.index,
                reason: e.to_string(),
            })?;
        Ok((adapted.len(), tracks))
    }

    /// Process frames until the source is exhausted or the stop signal is
    /// raised, forwarding every frame to `sink` in order.
    ///
    /// Frame decode errors and sink errors end the run with an error.
    pub fn run<S, K>(&mut self, source: S, sink: &mut K) -> Result<RunSummary>
    where
        S: IntoIterator<Item = Result<Frame>>,
        K: FrameSink + ?Sized,
    {
        let mut stopped_early = false;
        let mut frames = source.into_iter();

        loop {
            // Checked before the next frame is pulled from the source.
            if self.stop.is_stopped() {
                info!(frame = self.frames_processed + self.frames_skipped, "stop requested");
                stopped_early = true;
                break;
            }
            let Some(item) = frames.next() else {
                break;
            };
            let mut frame = item?;
            self.process_frame(&mut frame);
            sink.write(&frame)?;
        }
        sink.finish()?;

        let counts = self.counter.counts();
        Ok(RunSummary {
            frames_processed: self.frames_processed,
            frames_skipped: self.frames_skipped,
            entries: counts.entries,
            exits: counts.exits,
            stopped_early,
            output: sink.output_path().map(|p| p.to_path_buf()),
        })
    }

    /// Clear counts, track history and frame statistics for a fresh run.
    /// The tracker keeps its own state.
    pub fn reset(&mut self) {
        self.counter.reset();
        self.frames_processed = 0;
        self.frames_skipped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;
    use image::RgbImage;

    struct MockDetector {
        detections: Vec<Detection>,
    }

    impl DetectionSource for MockDetector {
        type Error = std::convert::Infallible;

        fn detect(
            &mut self,
            _frame: &Frame,
            _class_filter: &[u32],
            _confidence_threshold: f32,
        ) -> std::result::Result<Vec<Detection>, Self::Error> {
            Ok(self.detections.clone())
        }
    }

    #[test]
    fn test_static_person_never_counts() {
        let detector = MockDetector {
            detections: vec![Detection::new(10.0, 300.0, 50.0, 400.0, 0.9, 0)],
        };
        let mut pipeline =
            FootfallPipeline::with_sort_tracker(detector, FootfallConfig::default()).unwrap();

        for i in 0..6 {
            let mut frame = Frame::new(i, RgbImage::new(64, 64));
            let report = pipeline.process_frame(&mut frame);
            assert!(!report.skipped);
            assert!(report.crossings.is_empty());
        }
        assert_eq!(pipeline.counts(), Counts::default());
        assert_eq!(pipeline.counter().known_tracks(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = FootfallConfig {
            confidence_threshold: -0.1,
            ..Default::default()
        };
        let detector = MockDetector { detections: vec![] };
        assert!(FootfallPipeline::with_sort_tracker(detector, config).is_err());
    }

    #[test]
    fn test_stop_handle_is_shared() {
        let detector = MockDetector { detections: vec![] };
        let pipeline =
            FootfallPipeline::with_sort_tracker(detector, FootfallConfig::default()).unwrap();
        let handle = pipeline.stop_handle();
        handle.stop();
        assert!(pipeline.stop_handle().is_stopped());
    }
}
