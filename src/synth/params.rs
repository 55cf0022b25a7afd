//! Global synth parameters and their lock-free hand-off to the audio thread.
//!
//! The control thread publishes an immutable [`SynthParams`] snapshot through a
//! [`ParamPublisher`]; the audio thread reads the latest complete snapshot once
//! per block through a [`ParamReader`]. Replaced snapshots are reclaimed by the
//! `basedrop` collector that owns the handle, never on the audio thread.

use std::sync::Arc;

use basedrop::{Handle, Shared, SharedCell};

use super::oscillator::Waveform;
use crate::util::clamp_unit;

/// Host-facing parameter identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamId {
    Gain,
    Type,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ParamRange {
    Float { min: f32, max: f32 },
    Choice(&'static [&'static str]),
}

/// Static description of one parameter.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ParamInfo {
    pub id: ParamId,
    /// Stable identifier used by hosts for automation.
    pub key: &'static str,
    pub name: &'static str,
    pub range: ParamRange,
    pub default: f32,
}

const WAVEFORM_NAMES: &[&str] = &["Sine", "Square", "Triangle", "Saw"];

pub const PARAMS: [ParamInfo; 2] = [
    ParamInfo {
        id: ParamId::Gain,
        key: "GAIN",
        name: "Gain",
        range: ParamRange::Float { min: 0.0, max: 1.0 },
        default: 0.1,
    },
    ParamInfo {
        id: ParamId::Type,
        key: "TYPE",
        name: "Type",
        range: ParamRange::Choice(WAVEFORM_NAMES),
        default: 0.0,
    },
];

impl ParamId {
    pub fn info(&self) -> &'static ParamInfo {
        match self {
            ParamId::Gain => &PARAMS[0],
            ParamId::Type => &PARAMS[1],
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        PARAMS.iter().find(|p| p.key == key).map(|p| p.id)
    }
}

/// One consistent set of global parameter values.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SynthParams {
    pub gain: f32,
    pub waveform: Waveform,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            gain: ParamId::Gain.info().default,
            waveform: Waveform::from_value(ParamId::Type.info().default),
        }
    }
}

impl SynthParams {
    pub fn clamped(self) -> Self {
        Self {
            gain: clamp_unit(self.gain),
            waveform: self.waveform,
        }
    }

    /// Returns a copy with one parameter replaced, clamping to its range.
    pub fn with(self, id: ParamId, value: f32) -> Self {
        match id {
            ParamId::Gain => Self {
                gain: clamp_unit(value),
                ..self
            },
            ParamId::Type => Self {
                waveform: Waveform::from_value(value),
                ..self
            },
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::Gain => self.gain,
            ParamId::Type => self.waveform.index() as f32,
        }
    }
}

/// Creates a connected publisher/reader pair holding `initial`.
pub fn param_channel(handle: &Handle, initial: SynthParams) -> (ParamPublisher, ParamReader) {
    let cell = Arc::new(SharedCell::new(Shared::new(handle, initial.clamped())));
    (
        ParamPublisher {
            handle: handle.clone(),
            cell: cell.clone(),
        },
        ParamReader { cell },
    )
}

/// Control-thread side of the parameter hand-off.
pub struct ParamPublisher {
    handle: Handle,
    cell: Arc<SharedCell<SynthParams>>,
}

impl ParamPublisher {
    pub fn current(&self) -> SynthParams {
        *self.cell.get()
    }

    /// Publishes a full snapshot. Out-of-range values are clamped.
    pub fn publish(&self, params: SynthParams) {
        let clamped = params.clamped();
        if clamped != params {
            tracing::warn!(gain = params.gain, "gain out of range, clamped to {}", clamped.gain);
        }
        tracing::debug!(gain = clamped.gain, waveform = %clamped.waveform, "publishing synth params");
        self.cell.set(Shared::new(&self.handle, clamped));
    }

    pub fn set_parameter(&self, id: ParamId, value: f32) {
        self.publish(self.current().with(id, value));
    }

    pub fn set_gain(&self, gain: f32) {
        self.set_parameter(ParamId::Gain, gain);
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.publish(SynthParams {
            waveform,
            ..self.current()
        });
    }
}

/// Audio-thread side of the parameter hand-off.
#[derive(Clone)]
pub struct ParamReader {
    cell: Arc<SharedCell<SynthParams>>,
}

impl ParamReader {
    /// Reads the latest complete snapshot without blocking or allocating.
    pub fn snapshot(&self) -> SynthParams {
        *self.cell.get()
    }
}
