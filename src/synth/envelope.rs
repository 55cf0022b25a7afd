/// Constants of the multiplicative release curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TailOffOpts {
    /// Gain the release starts from.
    pub initial: f32,
    /// Per-sample multiplier applied while releasing, in `[0, 1)`.
    pub decay: f32,
    /// The voice falls silent once the gain drops to or below this level.
    pub threshold: f32,
}

impl Default for TailOffOpts {
    fn default() -> Self {
        Self {
            initial: 1.0,
            decay: 0.99,
            threshold: 0.005,
        }
    }
}

impl TailOffOpts {
    /// Forces the constants into a shape that always terminates.
    pub fn sanitized(self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        let threshold = finite_or(self.threshold, 0.005).max(1e-6);
        Self {
            initial: finite_or(self.initial, 1.0).max(threshold),
            decay: finite_or(self.decay, 0.99).clamp(0.0, 0.9999),
            threshold,
        }
    }

    /// Upper bound on the samples a release can last.
    pub fn max_release_samples(&self) -> usize {
        if self.decay <= 0.0 || self.initial <= self.threshold {
            return 1;
        }
        ((self.threshold / self.initial).ln() / self.decay.ln()).ceil() as usize + 1
    }
}

/// Release gain. Zero while the note is held, decaying towards zero after note-off.
#[derive(Clone, Copy, Debug)]
pub struct TailOff {
    opts: TailOffOpts,
    value: f32,
}

impl TailOff {
    pub fn new(opts: TailOffOpts) -> Self {
        Self {
            opts: opts.sanitized(),
            value: 0.0,
        }
    }

    pub fn opts(&self) -> TailOffOpts {
        self.opts
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_releasing(&self) -> bool {
        self.value > 0.0
    }

    /// Starts the release unless one is already underway.
    pub fn begin(&mut self) {
        if self.value == 0.0 {
            self.value = self.opts.initial;
        }
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    /// Gain to apply to the current sample.
    #[inline]
    pub fn gain(&self) -> f32 {
        if self.is_releasing() {
            self.value
        } else {
            1.0
        }
    }

    /// Decays by one sample. Returns `true` once the release has finished.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.value *= self.opts.decay;
        if self.value <= self.opts.threshold {
            self.value = 0.0;
            return true;
        }
        false
    }
}
