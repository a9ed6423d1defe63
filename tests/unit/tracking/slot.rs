use super::*;
use crate::foundation::error::FramemarkResult;
use crate::tracking::backend::InferenceBackend;
use crate::tracking::detector::DetectorConfig;

/// One person box at the center of a 100x100 input.
fn person_tensor() -> Vec<f32> {
    vec![50.0, 50.0, 20.0, 20.0, 0.9, 0.0]
}

struct Ready;

impl InferenceBackend for Ready {
    fn infer(&mut self, _input: &[f32], _input_size: u32) -> FramemarkResult<Vec<f32>> {
        Ok(person_tensor())
    }
}

struct Gated(mpsc::Receiver<()>);

impl InferenceBackend for Gated {
    fn infer(&mut self, _input: &[f32], _input_size: u32) -> FramemarkResult<Vec<f32>> {
        let _ = self.0.recv();
        Ok(person_tensor())
    }
}

fn detector(backend: Box<dyn InferenceBackend>) -> Arc<Mutex<ObjectDetector>> {
    let cfg = DetectorConfig {
        input_size: 100,
        num_classes: 2,
        min_interval_ms: 0,
        ..DetectorConfig::default()
    };
    Arc::new(Mutex::new(ObjectDetector::with_backend(cfg, backend)))
}

#[test]
fn inline_request_caches_immediately() {
    let det = detector(Box::new(Ready));
    let mut slot = DetectionSlot::new(Dispatch::Inline);
    assert!(slot.latest().is_none());
    assert!(slot.request(&det, &RgbaImage::new(100, 100)));
    assert!(!slot.is_in_flight());
    assert_eq!(slot.latest().map(<[Detection]>::len), Some(1));
}

#[test]
fn background_result_arrives_through_poll() {
    let det = detector(Box::new(Ready));
    let mut slot = DetectionSlot::new(Dispatch::Background);
    assert!(slot.request(&det, &RgbaImage::new(100, 100)));

    let deadline = Instant::now() + std::time::Duration::from_secs(10);
    while slot.is_in_flight() && Instant::now() < deadline {
        slot.poll();
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    assert!(!slot.is_in_flight());
    assert_eq!(slot.latest().map(<[Detection]>::len), Some(1));
}

#[test]
fn second_request_is_skipped_while_pending() {
    let (gate, rx) = mpsc::channel();
    let det = detector(Box::new(Gated(rx)));
    let mut slot = DetectionSlot::new(Dispatch::Background);
    let frame = RgbaImage::new(100, 100);

    assert!(slot.request(&det, &frame));
    assert!(!slot.request(&det, &frame));
    gate.send(()).unwrap();
    slot.wait();
    assert_eq!(slot.latest().map(<[Detection]>::len), Some(1));
    assert!(slot.request(&det, &frame));
    gate.send(()).unwrap();
    slot.wait();
}

#[test]
fn invalidated_result_is_discarded() {
    let (gate, rx) = mpsc::channel();
    let det = detector(Box::new(Gated(rx)));
    let mut slot = DetectionSlot::new(Dispatch::Background);
    let frame = RgbaImage::new(100, 100);

    assert!(slot.request(&det, &frame));
    slot.invalidate();
    assert!(!slot.is_in_flight());
    gate.send(()).unwrap();
    slot.poll();
    slot.wait();
    assert!(slot.latest().is_none());
}
