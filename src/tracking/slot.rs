use std::sync::{Arc, Mutex, mpsc};
use std::time::Instant;

use image::RgbaImage;

use crate::tracking::detector::{Detection, ObjectDetector};

/// Where a detection request runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    /// On the caller's thread; the result is cached before `request` returns.
    Inline,
    /// On the rayon pool; the result is picked up by a later `poll`.
    #[default]
    Background,
}

struct InFlight {
    generation: u64,
    rx: mpsc::Receiver<Option<Vec<Detection>>>,
}

/// Single in-flight detection request plus the most recent result.
///
/// A second request while one is pending is skipped, not queued. `invalidate` bumps a
/// generation counter so a result that lands after invalidation is dropped.
pub struct DetectionSlot {
    dispatch: Dispatch,
    in_flight: Option<InFlight>,
    latest: Option<Vec<Detection>>,
    generation: u64,
}

impl DetectionSlot {
    /// Create an empty slot.
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            in_flight: None,
            latest: None,
            generation: 0,
        }
    }

    /// Dispatch mode.
    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Whether a background request is pending.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Most recent detection list, if any pass has completed.
    pub fn latest(&self) -> Option<&[Detection]> {
        self.latest.as_deref()
    }

    /// Collect a finished background result, if any.
    pub fn poll(&mut self) {
        let Some(pending) = self.in_flight.as_ref() else {
            return;
        };
        match pending.rx.try_recv() {
            Ok(result) => {
                let current = pending.generation == self.generation;
                self.in_flight = None;
                if current {
                    self.store(result);
                }
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                self.in_flight = None;
            }
        }
    }

    /// Start a detection pass over `frame` unless one is already pending.
    ///
    /// Returns `false` when the request was skipped.
    pub fn request(&mut self, detector: &Arc<Mutex<ObjectDetector>>, frame: &RgbaImage) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        match self.dispatch {
            Dispatch::Inline => {
                let result = run_locked(detector, frame);
                self.store(result);
            }
            Dispatch::Background => {
                let (tx, rx) = mpsc::sync_channel(1);
                let detector = Arc::clone(detector);
                let frame = frame.clone();
                rayon::spawn(move || {
                    let _ = tx.send(run_locked(&detector, &frame));
                });
                self.in_flight = Some(InFlight {
                    generation: self.generation,
                    rx,
                });
            }
        }
        true
    }

    /// Drop the cache and any pending result.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = None;
        self.latest = None;
    }

    /// Block until the pending request finishes. Used by batch callers (CLI, tests).
    pub fn wait(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            if let Ok(result) = pending.rx.recv()
                && pending.generation == self.generation
            {
                self.store(result);
            }
        }
    }

    fn store(&mut self, result: Option<Vec<Detection>>) {
        // Throttled passes leave the previous list in place.
        if let Some(detections) = result {
            self.latest = Some(detections);
        }
    }
}

fn run_locked(detector: &Mutex<ObjectDetector>, frame: &RgbaImage) -> Option<Vec<Detection>> {
    match detector.lock() {
        Ok(mut d) => d.try_detect_at(frame, Instant::now()),
        Err(_) => {
            tracing::warn!("detector lock poisoned; skipping detection pass");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/slot.rs"]
mod tests;
