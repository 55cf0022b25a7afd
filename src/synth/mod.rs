use self::{
    params::{ParamReader, SynthParams},
    voice::{SoundKind, Voice, VoiceState},
};
pub use self::{
    envelope::TailOffOpts,
    oscillator::{Oscillator, Waveform},
    voice::VoiceOpts,
};
use crate::{
    audio::buffer::clear_channels,
    error::{EngineError, Result},
    event::{NoteEvent, TimedNoteEvent},
    note::Note,
    processor::{Processor, ProcessorData, ProcessorDescription},
    util::clamp_unit,
};

mod envelope;
pub mod oscillator;
pub mod params;
pub mod voice;

/// Default polyphony.
pub const DEFAULT_NUM_VOICES: usize = 5;

#[derive(Copy, Clone)]
pub struct SynthOpts {
    pub num_voices: usize,
    pub voice_opts: VoiceOpts,
}

impl Default for SynthOpts {
    fn default() -> Self {
        Self {
            num_voices: DEFAULT_NUM_VOICES,
            voice_opts: VoiceOpts::default(),
        }
    }
}

/// A fixed pool of oscillator voices mixed into a shared output buffer.
///
/// Voices are allocated once in [`Synth::new`] and reused; nothing on the
/// rendering path allocates, locks or fails.
pub struct Synth {
    voices: Vec<Voice>,
    sound: SoundKind,
    sample_rate: f32,
    max_block_size: usize,
    gain: f32,
    waveform: Waveform,
    params: Option<ParamReader>,
    counter: u64,
}

impl Synth {
    pub fn new(opts: SynthOpts) -> Result<Self> {
        if opts.num_voices == 0 {
            return Err(EngineError::NoVoices);
        }
        let defaults = SynthParams::default();
        let mut voice = Voice::new(opts.voice_opts);
        voice.set_level(defaults.gain);
        voice.set_waveform(defaults.waveform);
        tracing::debug!(voices = opts.num_voices, "creating synth");
        Ok(Self {
            voices: vec![voice; opts.num_voices],
            sound: SoundKind::Oscillator,
            sample_rate: 0.0,
            max_block_size: 0,
            gain: defaults.gain,
            waveform: defaults.waveform,
            params: None,
            counter: 0,
        })
    }

    /// Attaches a parameter reader that is polled at the start of every processed block.
    pub fn with_params(mut self, params: ParamReader) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the sample rate. Must be called before rendering.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<()> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(EngineError::InvalidBlockSize);
        }
        tracing::info!(sample_rate, max_block_size, voices = self.voices.len(), "preparing synth");
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.sample_rate > 0.0
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_idle()).count()
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Broadcasts the output gain to every voice. Takes effect from the next rendered sample.
    pub fn set_global_gain(&mut self, gain: f32) {
        self.gain = clamp_unit(gain);
        for voice in &mut self.voices {
            voice.set_level(self.gain);
        }
    }

    pub fn set_global_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        for voice in &mut self.voices {
            voice.set_waveform(waveform);
        }
    }

    pub fn apply_params(&mut self, params: SynthParams) {
        self.set_global_gain(params.gain);
        self.set_global_waveform(params.waveform);
    }

    /// Starts a note on exactly one voice, stealing one if the pool is full.
    pub fn note_on(&mut self, note: Note, velocity: f32) {
        let idx = self.allocate(note);
        self.counter += 1;
        let voice = &mut self.voices[idx];
        if voice.can_play_sound(self.sound) {
            voice.start_note(note, velocity, self.counter);
        }
    }

    /// Releases the voice bound to `note`. Unknown notes are ignored.
    pub fn note_off(&mut self, note: Note, velocity: f32, allow_tail_off: bool) {
        if let Some(voice) = self.voices.iter_mut().find(|v| v.note() == Some(note)) {
            voice.stop_note(velocity, allow_tail_off);
        }
    }

    pub fn all_notes_off(&mut self, allow_tail_off: bool) {
        for voice in &mut self.voices {
            voice.stop_note(0.0, allow_tail_off);
        }
    }

    /// Picks the voice for a new note. In order of preference:
    ///
    /// 1. the voice already bound to `note`, so a note never sounds twice;
    /// 2. the first idle voice;
    /// 3. the releasing voice with the least tail-off left (lowest slot on ties);
    /// 4. the sounding voice that was started earliest.
    fn allocate(&self, note: Note) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| v.note() == Some(note)) {
            return idx;
        }
        if let Some(idx) = self.voices.iter().position(Voice::is_idle) {
            return idx;
        }

        let mut quietest: Option<(usize, f32)> = None;
        for (idx, voice) in self.voices.iter().enumerate() {
            if voice.state() == VoiceState::Releasing && quietest.map_or(true, |(_, tail)| voice.tail_off() < tail) {
                quietest = Some((idx, voice.tail_off()));
            }
        }
        if let Some((idx, _)) = quietest {
            return idx;
        }

        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    fn handle_event(&mut self, event: NoteEvent) {
        match event {
            NoteEvent::NoteOn { note, velocity } => self.note_on(note, velocity),
            NoteEvent::NoteOff {
                note,
                velocity,
                allow_tail_off,
            } => self.note_off(note, velocity, allow_tail_off),
            NoteEvent::AllNotesOff { allow_tail_off } => self.all_notes_off(allow_tail_off),
            NoteEvent::ControlChange { .. } | NoteEvent::PitchBend { .. } => {}
        }
    }

    fn render_voices(&mut self, channels: &mut [&mut [f32]], start: usize, end: usize) {
        if start >= end {
            return;
        }
        for voice in &mut self.voices {
            voice.render(channels, start..end);
        }
    }

    /// Mixes `num_samples` of every active voice into `channels`, dispatching
    /// `events` at their sample offsets.
    ///
    /// Events are expected in timestamp order. One stamped earlier than an
    /// event already handled is applied at that point; one stamped at or past
    /// the end of the block is applied after the last sample. Output is added
    /// to whatever the channels already hold. Nothing is rendered (and events
    /// are discarded) until [`Synth::prepare`] has been called.
    pub fn render_block(&mut self, channels: &mut [&mut [f32]], events: &[TimedNoteEvent], num_samples: usize) {
        if !self.is_prepared() {
            return;
        }

        let len = channels.iter().map(|c| c.len()).fold(num_samples, usize::min);
        let mut cursor = 0;
        for timed in events {
            let time = (timed.time as usize).clamp(cursor, len);
            self.render_voices(channels, cursor, time);
            cursor = time;
            self.handle_event(timed.event);
        }
        self.render_voices(channels, cursor, len);
    }
}

impl Processor for Synth {
    fn description(&self) -> ProcessorDescription {
        ProcessorDescription {
            num_audio_ins: 0,
            num_audio_outs: 2,
        }
    }

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<()> {
        Synth::prepare(self, sample_rate, max_block_size)
    }

    fn process(&mut self, data: ProcessorData) {
        // No inputs, so every output channel is past the source and starts from silence.
        clear_channels(data.audio_out);

        if let Some(params) = &self.params {
            let snapshot = params.snapshot();
            self.apply_params(snapshot);
        }

        self.render_block(data.audio_out, data.events, data.samples);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn synth(num_voices: usize) -> Synth {
        let mut synth = Synth::new(SynthOpts {
            num_voices,
            ..Default::default()
        })
        .unwrap();
        synth.prepare(48_000.0, 512).unwrap();
        synth.set_global_gain(1.0);
        synth
    }

    fn render(synth: &mut Synth, events: &[TimedNoteEvent], len: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; len];
        let mut channels: [&mut [f32]; 1] = [&mut buffer];
        synth.render_block(&mut channels, events, len);
        buffer
    }

    fn bound_notes(synth: &Synth) -> Vec<Option<u8>> {
        synth.voices().iter().map(|v| v.note().map(|n| n.number())).collect()
    }

    #[test]
    fn test_invalid_setup() {
        assert!(matches!(
            Synth::new(SynthOpts {
                num_voices: 0,
                ..Default::default()
            }),
            Err(EngineError::NoVoices)
        ));
        let mut synth = Synth::new(SynthOpts::default()).unwrap();
        assert!(matches!(synth.prepare(0.0, 64), Err(EngineError::InvalidSampleRate(_))));
        assert!(matches!(synth.prepare(f32::NAN, 64), Err(EngineError::InvalidSampleRate(_))));
        assert!(matches!(synth.prepare(44_100.0, 0), Err(EngineError::InvalidBlockSize)));
        assert!(!synth.is_prepared());
    }

    #[test]
    fn test_default_layout() {
        let synth = Synth::new(SynthOpts::default()).unwrap();
        assert_eq!(synth.voices().len(), 5);
        assert_eq!(synth.gain(), 0.1);
        assert_eq!(synth.waveform(), Waveform::Sine);
    }

    #[test]
    fn test_allocates_first_idle_voice() {
        let mut synth = synth(3);
        synth.note_on(Note::from(60u8), 1.0);
        synth.note_on(Note::from(64u8), 1.0);
        assert_eq!(bound_notes(&synth), vec![Some(60), Some(64), None]);

        synth.note_off(Note::from(60u8), 1.0, false);
        synth.note_on(Note::from(67u8), 1.0);
        assert_eq!(bound_notes(&synth), vec![Some(67), Some(64), None]);
    }

    #[test]
    fn test_retrigger_reuses_voice() {
        let mut synth = synth(3);
        synth.note_on(Note::from(60u8), 1.0);
        synth.note_off(Note::from(60u8), 1.0, true);
        synth.note_on(Note::from(60u8), 1.0);
        assert_eq!(bound_notes(&synth), vec![Some(60), None, None]);
        assert_eq!(synth.voices()[0].state(), VoiceState::Sounding);
    }

    #[test]
    fn test_steals_oldest_sounding_voice() {
        let mut synth = synth(3);
        for note in [60u8, 64, 67] {
            synth.note_on(Note::from(note), 1.0);
        }
        synth.note_on(Note::from(72u8), 1.0);
        assert_eq!(bound_notes(&synth), vec![Some(72), Some(64), Some(67)]);

        synth.note_on(Note::from(76u8), 1.0);
        assert_eq!(bound_notes(&synth), vec![Some(72), Some(76), Some(67)]);
        assert_eq!(synth.active_voices(), 3);
    }

    #[test]
    fn test_steals_quietest_releasing_voice() {
        let mut synth = synth(3);
        for note in [60u8, 64, 67] {
            synth.note_on(Note::from(note), 1.0);
        }
        synth.note_off(Note::from(64u8), 1.0, true);
        render(&mut synth, &[], 32);
        synth.note_off(Note::from(67u8), 1.0, true);
        render(&mut synth, &[], 8);
        assert!(synth.voices()[1].tail_off() < synth.voices()[2].tail_off());

        synth.note_on(Note::from(72u8), 1.0);
        assert_eq!(bound_notes(&synth), vec![Some(60), Some(72), Some(67)]);
    }

    #[test]
    fn test_note_off_for_unknown_note_is_noop() {
        let mut synth = synth(2);
        synth.note_on(Note::from(60u8), 1.0);
        synth.note_off(Note::from(61u8), 1.0, true);
        assert_eq!(synth.voices()[0].state(), VoiceState::Sounding);
    }

    #[test]
    fn test_all_notes_off() {
        let mut synth = synth(3);
        synth.note_on(Note::from(60u8), 1.0);
        synth.note_on(Note::from(64u8), 1.0);
        synth.all_notes_off(true);
        assert!(synth.voices()[..2].iter().all(|v| v.state() == VoiceState::Releasing));
        synth.all_notes_off(false);
        assert_eq!(synth.active_voices(), 0);
    }

    #[test]
    fn test_event_timing_is_sample_accurate() {
        let mut synth = synth(2);
        synth.set_global_waveform(Waveform::Square);
        let output = render(&mut synth, &[TimedNoteEvent::note_on(10, 60i32, 1.0)], 32);
        assert!(output[..10].iter().all(|&s| s == 0.0));
        assert!(output[10..].iter().all(|&s| s == 1.0));

        let output = render(&mut synth, &[TimedNoteEvent::note_off(5, 60i32, 1.0, false)], 32);
        assert!(output[..5].iter().all(|&s| s == 1.0));
        assert!(output[5..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_late_events_apply_after_block() {
        let mut synth = synth(2);
        synth.set_global_waveform(Waveform::Square);
        let output = render(&mut synth, &[TimedNoteEvent::note_on(100, 60i32, 1.0)], 16);
        assert!(output.iter().all(|&s| s == 0.0));
        assert_eq!(synth.active_voices(), 1);
    }

    #[test]
    fn test_out_of_order_events_apply_at_cursor() {
        let mut synth = synth(2);
        synth.set_global_waveform(Waveform::Square);
        let events = [
            TimedNoteEvent::note_on(8, 60i32, 1.0),
            TimedNoteEvent::note_on(4, 64i32, 1.0),
        ];
        let output = render(&mut synth, &events, 16);
        assert!(output[..8].iter().all(|&s| s == 0.0));
        assert!(output[8..].iter().all(|&s| s == 2.0));
    }

    #[test]
    fn test_empty_render_leaves_buffer_untouched() {
        let mut synth = synth(4);
        let mut buffer = vec![0.0; 64];
        let mut channels: [&mut [f32]; 1] = [&mut buffer];
        synth.render_block(&mut channels, &[], 64);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_unprepared_synth_renders_nothing() {
        let mut synth = Synth::new(SynthOpts::default()).unwrap();
        let output = render(&mut synth, &[TimedNoteEvent::note_on(0, 60i32, 1.0)], 16);
        assert!(output.iter().all(|&s| s == 0.0));
        assert_eq!(synth.active_voices(), 0);
    }

    #[test]
    fn test_global_params_reach_every_voice() {
        let mut synth = synth(3);
        synth.set_global_gain(2.0);
        synth.set_global_waveform(Waveform::Saw);
        assert!(synth.voices().iter().all(|v| v.level() == 1.0 && v.waveform() == Waveform::Saw));
        synth.apply_params(SynthParams {
            gain: 0.25,
            waveform: Waveform::Triangle,
        });
        assert!(synth.voices().iter().all(|v| v.level() == 0.25 && v.waveform() == Waveform::Triangle));
    }
}
