use std::f32::consts::FRAC_PI_2;

/// Equal-power stereo panner.
#[derive(Debug, Clone, Default)]
pub struct StereoPannerNode {
    pan: f32,
}

impl StereoPannerNode {
    /// Creates a centred panner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pan value as last set.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Stores the value as given. Processing reads it within [-1, 1].
    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan;
    }

    /// Pans a mono sample into a stereo pair.
    #[inline]
    pub fn process_mono(&self, sample: f32) -> (f32, f32) {
        let x = (self.effective_pan() + 1.0) / 2.0;
        let angle = x * FRAC_PI_2;
        (sample * angle.cos(), sample * angle.sin())
    }

    /// Pans a stereo pair. The attenuated side is folded into the other one,
    /// so a centred pan leaves the input untouched.
    #[inline]
    pub fn process_stereo(&self, left: f32, right: f32) -> (f32, f32) {
        let pan = self.effective_pan();
        if pan <= 0.0 {
            let angle = (pan + 1.0) * FRAC_PI_2;
            (left + right * angle.cos(), right * angle.sin())
        } else {
            let angle = pan * FRAC_PI_2;
            (left * angle.cos(), right + left * angle.sin())
        }
    }

    fn effective_pan(&self) -> f32 {
        if self.pan.is_finite() {
            self.pan.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}
