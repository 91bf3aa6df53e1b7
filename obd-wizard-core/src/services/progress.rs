//! Install progress math

/// Frames the animator spends moving between two targets
pub const ANIMATION_FRAMES: u32 = 100;

/// Completion ratio of an install task
///
/// `finished / total` rounded to two decimals and clamped to `[0, 1]`. A task
/// without steps reports `0`.
#[must_use]
pub fn progress_ratio(finished: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = (f64::from(finished) / f64::from(total)).clamp(0.0, 1.0);
    (ratio * 100.0).round() / 100.0
}

/// Smooths progress display between two polled values
///
/// Each new target restarts the animation from the previous target, moving
/// 1/100 of the distance per frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressAnimator {
    from: f64,
    target: f64,
    frame: u32,
    shown: f64,
}

impl ProgressAnimator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value currently displayed
    #[must_use]
    pub fn shown(&self) -> f64 {
        self.shown
    }

    /// Latest polled value
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Start animating toward a new ratio
    pub fn retarget(&mut self, ratio: f64) {
        self.from = self.target;
        self.target = ratio.clamp(0.0, 1.0);
        self.frame = 0;
    }

    /// Advance one frame; `None` once the animation has settled
    pub fn tick(&mut self) -> Option<f64> {
        if self.frame >= ANIMATION_FRAMES {
            return None;
        }
        self.frame += 1;
        let step = (self.target - self.from) / f64::from(ANIMATION_FRAMES);
        let value = self.from + step * f64::from(self.frame);
        if value >= 1.0 {
            self.frame = ANIMATION_FRAMES;
            self.shown = 1.0;
            return None;
        }
        self.shown = value;
        Some(value)
    }
}
