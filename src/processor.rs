use crate::{error::Result, event::TimedNoteEvent};
pub use io::{note_channel, AudioOutput, NoteReceiver, NoteSender};

mod io;

pub struct ProcessorData<'a, 'b> {
    /// Note events for this block, in timestamp order
    pub events: &'a [TimedNoteEvent],
    /// Number of samples in each audio block
    pub samples: usize,
    /// List of output audio blocks
    pub audio_out: &'a mut [&'b mut [f32]],
}

#[derive(Copy, Clone, Debug)]
pub struct ProcessorDescription {
    pub num_audio_ins: usize,
    pub num_audio_outs: usize,
}

pub trait Processor {
    /// Gets information about the processor.
    fn description(&self) -> ProcessorDescription;

    /// Provides the audio sample rate and the largest block `process` will see.
    /// This must be called before calling `process`; until then the processor stays silent.
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<()>;

    /// Processes one block of events and audio. Must not block or allocate.
    fn process(&mut self, data: ProcessorData);
}
