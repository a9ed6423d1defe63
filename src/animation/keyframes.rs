use crate::foundation::error::{FramemarkError, FramemarkResult};

/// Linear blend between two values at `t` in `[0, 1]`.
pub trait Lerp: Sized {
    /// Blend from `a` toward `b`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Option<f64> {
    // An absent side never becomes a target: carry the present value unchanged.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Some(a), Some(b)) => Some(<f64 as Lerp>::lerp(a, b, t)),
            (Some(v), None) | (None, Some(v)) => Some(*v),
            (None, None) => None,
        }
    }
}

/// Timestamped sample of a tracked position in video-native pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackPoint {
    /// Playback time in seconds.
    pub time: f64,
    /// Center X in native pixels.
    pub x: f64,
    /// Center Y in native pixels.
    pub y: f64,
    /// Optional box width in native pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Optional box height in native pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl TrackPoint {
    /// Position-only keyframe.
    pub fn at(time: f64, x: f64, y: f64) -> Self {
        Self {
            time,
            x,
            y,
            width: None,
            height: None,
        }
    }

    /// Keyframe carrying a box size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    fn sample(&self) -> Sampled {
        Sampled {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_none_or(f64::is_finite)
            && self.height.is_none_or(f64::is_finite)
    }
}

/// Interpolated position (and size, when any keyframe carried one).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampled {
    /// Center X in native pixels.
    pub x: f64,
    /// Center Y in native pixels.
    pub y: f64,
    /// Box width in native pixels, if known.
    pub width: Option<f64>,
    /// Box height in native pixels, if known.
    pub height: Option<f64>,
}

/// Interpolate a sorted keyframe list at time `t`.
///
/// Times before the first key or after the last key clamp to that key verbatim.
/// A non-finite `t` yields `None`.
pub fn position_at(keys: &[TrackPoint], t: f64) -> Option<Sampled> {
    if !t.is_finite() {
        return None;
    }
    let first = keys.first()?;
    let last = keys.last()?;
    if t <= first.time {
        return Some(first.sample());
    }
    if t >= last.time {
        return Some(last.sample());
    }

    let idx = keys.partition_point(|k| k.time <= t);
    let a = &keys[idx - 1];
    let b = &keys[idx];
    let denom = b.time - a.time;
    if denom <= 0.0 {
        return Some(a.sample());
    }

    let frac = (t - a.time) / denom;
    Some(Sampled {
        x: <f64 as Lerp>::lerp(&a.x, &b.x, frac),
        y: <f64 as Lerp>::lerp(&a.y, &b.y, frac),
        width: <Option<f64> as Lerp>::lerp(&a.width, &b.width, frac),
        height: <Option<f64> as Lerp>::lerp(&a.height, &b.height, frac),
    })
}

/// Keyframe list kept sorted by time, at most one key per exact time value.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyframeTrack {
    keys: Vec<TrackPoint>,
}

impl KeyframeTrack {
    /// Track seeded with a single keyframe.
    pub fn seeded(first: TrackPoint) -> FramemarkResult<Self> {
        let mut track = Self::default();
        track.insert(first)?;
        Ok(track)
    }

    /// Insert a keyframe, replacing any existing key at the same time.
    pub fn insert(&mut self, key: TrackPoint) -> FramemarkResult<()> {
        if !key.is_finite() {
            return Err(FramemarkError::validation(
                "keyframe time/position/size must be finite",
            ));
        }
        match self
            .keys
            .binary_search_by(|k| k.time.total_cmp(&key.time))
        {
            Ok(i) => self.keys[i] = key,
            Err(i) => self.keys.insert(i, key),
        }
        Ok(())
    }

    /// Sorted keyframes.
    pub fn keys(&self) -> &[TrackPoint] {
        &self.keys
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Return `true` when no keyframes exist.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Interpolated sample at `t`.
    pub fn sample(&self, t: f64) -> Option<Sampled> {
        position_at(&self.keys, t)
    }

    /// Validate ordering/uniqueness/finiteness, e.g. after deserialization.
    pub fn validate(&self) -> FramemarkResult<()> {
        if !self.keys.iter().all(TrackPoint::is_finite) {
            return Err(FramemarkError::validation(
                "keyframe time/position/size must be finite",
            ));
        }
        if !self.keys.windows(2).all(|w| w[0].time < w[1].time) {
            return Err(FramemarkError::validation(
                "keyframes must be strictly sorted by time",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframes.rs"]
mod tests;
