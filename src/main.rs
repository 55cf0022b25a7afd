use basedrop::Collector;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rand::Rng;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use voice_engine::{
    param_channel,
    processor::{note_channel, AudioOutput},
    EngineError, Note, NoteEvent, Synth, SynthOpts, SynthParams, VoiceOpts, Waveform,
};

const MAX_BLOCK_SIZE: usize = 512;

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Create a collector
    let mut collector = Collector::new();

    let (params, param_reader) = param_channel(
        &collector.handle(),
        SynthParams {
            gain: 0.2,
            ..Default::default()
        },
    );
    let (mut notes, note_receiver) = note_channel(&collector.handle(), 64);
    let synth = Synth::new(SynthOpts {
        voice_opts: VoiceOpts {
            velocity_sensitivity: 0.5,
            ..Default::default()
        },
        ..Default::default()
    })?
    .with_params(param_reader);

    // Create the output stream
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(EngineError::NoOutputDevice)?;
    if let Ok(name) = device.name() {
        tracing::info!(device = %name, "output device");
    }
    let config = device.default_output_config()?;
    let stream = AudioOutput::from_cpal(&device, config, synth, note_receiver, MAX_BLOCK_SIZE)?;
    stream.play()?;

    // Arpeggiate a major triad, switching waveform each bar
    let mut rng = rand::thread_rng();
    for waveform in Waveform::ALL.iter().cycle() {
        params.set_waveform(*waveform);
        tracing::info!(%waveform, "next bar");
        for i in [0, 4, 7, 12, 7, 4] {
            let note = Note::middle_c().transpose(i);
            let velocity = rng.gen_range(0.6..=1.0);
            notes.send(NoteEvent::note_on(note, velocity)).ok();
            std::thread::sleep(Duration::from_millis(180));
            notes.send(NoteEvent::note_off(note, 0.0, true)).ok();
            std::thread::sleep(Duration::from_millis(70));
        }
        collector.collect();
    }

    Ok(())
}
