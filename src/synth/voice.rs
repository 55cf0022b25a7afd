use std::ops::Range;

use super::{
    envelope::{TailOff, TailOffOpts},
    oscillator::{Oscillator, Waveform},
};
use crate::{note::Note, util::clamp_unit};

/// The kinds of sound a voice may be asked to play.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SoundKind {
    /// The built-in periodic oscillator sound.
    #[default]
    Oscillator,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VoiceState {
    /// Silent and free for allocation.
    Idle,
    /// Key held, playing at full level.
    Sounding,
    /// Key released, tail-off decaying.
    Releasing,
}

#[derive(Clone, Copy)]
pub struct VoiceOpts {
    pub tail_off: TailOffOpts,
    /// 0 ignores velocity, 1 scales the output linearly with it.
    pub velocity_sensitivity: f32,
}

impl Default for VoiceOpts {
    fn default() -> Self {
        Self {
            tail_off: TailOffOpts::default(),
            velocity_sensitivity: 0.0,
        }
    }
}

/// One slot of the voice pool.
#[derive(Clone, Copy)]
pub struct Voice {
    state: VoiceState,
    note: Option<Note>,
    velocity: f32,
    velocity_gain: f32,
    velocity_sensitivity: f32,
    frequency: f32,
    level: f32,
    waveform: Waveform,
    sample_rate: f32,
    oscillator: Oscillator,
    tail_off: TailOff,
    /// Allocation order, used to find the oldest voice when stealing.
    age: u64,
}

impl Voice {
    pub fn new(opts: VoiceOpts) -> Self {
        Self {
            state: VoiceState::Idle,
            note: None,
            velocity: 0.0,
            velocity_gain: 1.0,
            velocity_sensitivity: clamp_unit(opts.velocity_sensitivity),
            frequency: 0.0,
            level: 0.0,
            waveform: Waveform::Sine,
            sample_rate: 0.0,
            oscillator: Oscillator::new(),
            tail_off: TailOff::new(opts.tail_off),
            age: 0,
        }
    }
}

impl Voice {
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        if self.state != VoiceState::Idle {
            self.oscillator.set_frequency(self.frequency, sample_rate);
        }
    }

    pub fn can_play_sound(&self, sound: SoundKind) -> bool {
        matches!(sound, SoundKind::Oscillator)
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = level;
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Starts (or restarts) a note from phase zero.
    pub fn start_note(&mut self, note: Note, velocity: f32, age: u64) {
        self.note = Some(note);
        self.velocity = clamp_unit(velocity);
        self.velocity_gain = 1.0 - self.velocity_sensitivity + self.velocity_sensitivity * self.velocity;
        self.frequency = note.frequency();
        self.oscillator.set_frequency(self.frequency, self.sample_rate);
        self.oscillator.reset();
        self.tail_off.reset();
        self.state = VoiceState::Sounding;
        self.age = age;
    }

    /// Releases the note, either into a tail-off or straight to silence.
    pub fn stop_note(&mut self, _velocity: f32, allow_tail_off: bool) {
        match (self.state, allow_tail_off) {
            (VoiceState::Idle, _) => {}
            (VoiceState::Sounding, true) => {
                self.tail_off.begin();
                self.state = VoiceState::Releasing;
            }
            (VoiceState::Releasing, true) => {}
            (_, false) => self.clear_note(),
        }
    }

    fn clear_note(&mut self) {
        self.state = VoiceState::Idle;
        self.note = None;
        self.frequency = 0.0;
        self.oscillator.stop();
        self.tail_off.reset();
    }

    /// Adds `range` of this voice's output into every channel.
    pub fn render(&mut self, channels: &mut [&mut [f32]], range: Range<usize>) {
        if self.state == VoiceState::Idle {
            return;
        }

        let amplitude = self.level * self.velocity_gain;
        for index in range {
            let sample = self.oscillator.next_sample(self.waveform) * amplitude * self.tail_off.gain();
            for channel in channels.iter_mut() {
                if let Some(out) = channel.get_mut(index) {
                    *out += sample;
                }
            }

            if self.state == VoiceState::Releasing && self.tail_off.advance() {
                self.clear_note();
                break;
            }
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == VoiceState::Idle
    }

    /// Gets the note bound to this voice, while sounding or releasing.
    pub fn note(&self) -> Option<Note> {
        self.note
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn tail_off(&self) -> f32 {
        self.tail_off.value()
    }

    /// Upper bound on how many samples a release can keep this voice busy.
    pub fn max_release_samples(&self) -> usize {
        self.tail_off.opts().max_release_samples()
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }
}
