//! A small polyphonic oscillator synth for real-time hosts.
//!
//! [`Synth`] owns a fixed pool of voices. Each block the host hands it a set
//! of output channels and the note events falling inside the block; the synth
//! applies the latest [`SynthParams`] snapshot, dispatches events at their
//! exact sample offsets and mixes every active voice into the channels.
//! Nothing on that path allocates, blocks or fails.

pub mod audio;
pub mod convert;
pub mod error;
pub mod event;
pub mod note;
pub mod processor;
pub mod synth;
mod util;

pub use error::{EngineError, Result};
pub use event::{NoteEvent, TimedNoteEvent};
pub use note::Note;
pub use processor::{Processor, ProcessorData, ProcessorDescription};
pub use synth::{
    params::{param_channel, ParamId, ParamInfo, ParamPublisher, ParamReader, SynthParams, PARAMS},
    voice::{SoundKind, Voice, VoiceState},
    Oscillator, Synth, SynthOpts, TailOffOpts, VoiceOpts, Waveform,
};
pub use util::hz_from_note;
