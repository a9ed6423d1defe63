/// Lowest opacity during a fade-in, so a freshly created annotation is never invisible.
pub const FADE_IN_FLOOR: f64 = 0.5;
/// Lowest opacity during a fade-out, so an annotation never vanishes before its end time.
pub const FADE_OUT_FLOOR: f64 = 0.2;

/// Lifetime window of an annotation on the playback timeline, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeWindow {
    /// Inclusive start time.
    pub start: f64,
    /// Inclusive end time.
    pub end: f64,
    /// Fade-in duration (`0` disables).
    pub fade_in: f64,
    /// Fade-out duration (`0` disables).
    pub fade_out: f64,
}

impl FadeWindow {
    /// Return `true` when `start <= t <= end`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// Opacity at playback time `t`, or `None` outside the window.
    ///
    /// Fade-in and fade-out are each clamped to the window length on their own; they may
    /// overlap on short windows, in which case the lower of the two ramps wins.
    pub fn opacity_at(&self, t: f64) -> Option<f64> {
        if !self.contains(t) {
            return None;
        }
        let duration = (self.end - self.start).max(0.0);
        let fade_in = self.fade_in.max(0.0).min(duration);
        let fade_out = self.fade_out.max(0.0).min(duration);

        let mut opacity: f64 = 1.0;
        let elapsed = t - self.start;
        if fade_in > 0.0 && elapsed < fade_in {
            opacity = (elapsed / fade_in).max(FADE_IN_FLOOR);
        }
        let remaining = self.end - t;
        if fade_out > 0.0 && remaining < fade_out {
            opacity = opacity.min((remaining / fade_out).max(FADE_OUT_FLOOR));
        }
        Some(opacity.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/fade.rs"]
mod tests;
