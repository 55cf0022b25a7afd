use std::f32::consts::{FRAC_2_PI, TAU};

use crate::error::EngineError;

/// The waveform shared by every voice of the synth.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Waveform {
    #[default]
    Sine = 0,
    Square = 1,
    Triangle = 2,
    Saw = 3,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [Waveform::Sine, Waveform::Square, Waveform::Triangle, Waveform::Saw];

    /// Maps a choice index onto a waveform, clamping out-of-range indices to the last entry.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Maps a raw choice index, as stored in a float parameter, onto a waveform.
    ///
    /// The value is rounded to the nearest index and clamped to the valid range.
    pub fn from_value(value: f32) -> Self {
        if value.is_nan() || value <= 0.0 {
            return Waveform::Sine;
        }
        Self::from_index(value.round() as usize)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Square => "Square",
            Waveform::Triangle => "Triangle",
            Waveform::Saw => "Saw",
        }
    }

    /// Evaluates the waveform at `angle` radians. Output is in `[-1, 1]`.
    #[inline]
    pub fn evaluate(&self, angle: f32) -> f32 {
        match self {
            Waveform::Sine => angle.sin(),
            Waveform::Square => {
                if angle.sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            // asin can land a hair past ±π/2 in f32
            Waveform::Triangle => (FRAC_2_PI * angle.sin().asin()).clamp(-1.0, 1.0),
            Waveform::Saw => {
                let cycles = angle / TAU;
                2.0 * (cycles - (cycles + 0.5).floor())
            }
        }
    }
}

impl TryFrom<u8> for Waveform {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(EngineError::InvalidWaveform(value))
    }
}

impl std::fmt::Display for Waveform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Phase accumulator driving the periodic waveforms.
#[derive(Clone, Copy, Debug, Default)]
pub struct Oscillator {
    /// Current phase in radians, kept within `[0, 2π)`.
    current_angle: f32,
    /// Phase advance per sample in radians.
    angle_increment: f32,
}

impl Oscillator {
    pub fn new() -> Self {
        Default::default()
    }

    /// Recomputes the phase increment. Safe to call every block.
    pub fn set_frequency(&mut self, frequency: f32, sample_rate: f32) {
        self.angle_increment = if sample_rate > 0.0 && sample_rate.is_finite() && frequency.is_finite() {
            TAU * frequency / sample_rate
        } else {
            0.0
        };
    }

    pub fn reset(&mut self) {
        self.current_angle = 0.0;
    }

    /// Stops the phase from advancing and rewinds it.
    pub fn stop(&mut self) {
        self.current_angle = 0.0;
        self.angle_increment = 0.0;
    }

    pub fn angle(&self) -> f32 {
        self.current_angle
    }

    pub fn angle_increment(&self) -> f32 {
        self.angle_increment
    }

    /// Produces the sample at the current phase, then advances the phase.
    #[inline]
    pub fn next_sample(&mut self, waveform: Waveform) -> f32 {
        let sample = waveform.evaluate(self.current_angle);
        self.current_angle += self.angle_increment;
        if self.current_angle >= TAU {
            self.current_angle = self.current_angle.rem_euclid(TAU);
        }
        sample
    }
}
