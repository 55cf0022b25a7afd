use super::{Processor, ProcessorData};
use crate::{
    convert::interleave_stereo,
    error::{EngineError, Result},
    event::{NoteEvent, TimedNoteEvent},
};
use basedrop::Handle;
use cpal::{traits::DeviceTrait, Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfig};
use ringbuf_basedrop as ringbuf;

/// Creates a lock-free queue carrying live note events to the audio thread.
///
/// At most `capacity` events are delivered per block; the rest wait for the next one.
pub fn note_channel(handle: &Handle, capacity: usize) -> (NoteSender, NoteReceiver) {
    let capacity = capacity.max(1);
    let (producer, consumer) = ringbuf::RingBuffer::new(capacity).split(handle);
    (
        NoteSender { producer },
        NoteReceiver {
            consumer,
            pending: Vec::with_capacity(capacity),
            limit: capacity,
        },
    )
}

pub struct NoteSender {
    producer: ringbuf::Producer<NoteEvent>,
}

impl NoteSender {
    pub fn send(&mut self, event: NoteEvent) -> Result<()> {
        self.producer.push(event).map_err(|event| {
            tracing::warn!(?event, "note queue full");
            EngineError::QueueFull
        })
    }
}

pub struct NoteReceiver {
    consumer: ringbuf::Consumer<NoteEvent>,
    pending: Vec<TimedNoteEvent>,
    limit: usize,
}

impl NoteReceiver {
    /// Moves queued events into the block's event list, stamped at the block start.
    pub fn drain(&mut self) -> &[TimedNoteEvent] {
        self.pending.clear();
        while self.pending.len() < self.limit {
            let Some(event) = self.consumer.pop() else {
                break;
            };
            self.pending.push(event.at(0));
        }
        &self.pending
    }
}

/// Drives a processor from a cpal output stream.
pub struct AudioOutput;

impl AudioOutput {
    /// Builds (but does not start) an output stream whose callback renders `processor`.
    ///
    /// The processor is prepared here, on the calling thread. Callbacks longer
    /// than `max_block_size` frames are rendered in several blocks.
    pub fn from_cpal<P>(
        device: &Device,
        supported: SupportedStreamConfig,
        mut processor: P,
        mut notes: NoteReceiver,
        max_block_size: usize,
    ) -> Result<Stream>
    where
        P: Processor + Send + 'static,
    {
        if supported.sample_format() != SampleFormat::F32 {
            return Err(EngineError::UnsupportedFormat(format!("{:?}", supported.sample_format())));
        }
        let config: StreamConfig = supported.into();
        let channels = config.channels as usize;
        processor.prepare(config.sample_rate.0 as f32, max_block_size)?;

        tracing::info!(
            sample_rate = config.sample_rate.0,
            channels,
            max_block_size,
            "building output stream"
        );

        let mut scratch_left = vec![0.0f32; max_block_size];
        let mut scratch_right = vec![0.0f32; max_block_size];

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut events = notes.drain();
                for chunk in data.chunks_mut(max_block_size * channels.max(1)) {
                    let samples = chunk.len() / channels.max(1);
                    let mut audio_out: [&mut [f32]; 2] = [&mut scratch_left[..samples], &mut scratch_right[..samples]];
                    processor.process(ProcessorData {
                        events,
                        samples,
                        audio_out: &mut audio_out,
                    });
                    let [left, right] = &audio_out;
                    interleave_stereo(left, right, chunk, channels);
                    events = &[];
                }
            },
            move |err| {
                tracing::error!("an error occurred on stream: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::note::Note;
    use basedrop::Collector;

    #[test]
    fn test_note_queue() {
        let collector = Collector::new();
        let (mut tx, mut rx) = note_channel(&collector.handle(), 2);
        assert!(rx.drain().is_empty());

        tx.send(NoteEvent::note_on(60i32, 1.0)).unwrap();
        tx.send(NoteEvent::note_off(60i32, 1.0, true)).unwrap();
        assert!(matches!(tx.send(NoteEvent::note_on(62i32, 1.0)), Err(EngineError::QueueFull)));

        let events = rx.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TimedNoteEvent::note_on(0, Note::middle_c(), 1.0));
        assert_eq!(events[1].time, 0);
        assert!(rx.drain().is_empty());
    }
}
