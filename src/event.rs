use crate::{note::Note, util::clamp_unit};

/// A note event positioned within the current block.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TimedNoteEvent {
    /// Offset in samples from the start of the block.
    pub time: u32,
    pub event: NoteEvent,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum NoteEvent {
    NoteOn {
        note: Note,
        velocity: f32,
    },
    NoteOff {
        note: Note,
        velocity: f32,
        allow_tail_off: bool,
    },
    AllNotesOff {
        allow_tail_off: bool,
    },
    /// Accepted for completeness; no controller is mapped to anything.
    ControlChange {
        controller: u8,
        value: u8,
    },
    /// Accepted for completeness; voices do not bend.
    PitchBend {
        value: u16,
    },
}

impl NoteEvent {
    pub fn note_on(note: impl Into<Note>, velocity: f32) -> Self {
        NoteEvent::NoteOn {
            note: note.into(),
            velocity: clamp_unit(velocity),
        }
    }

    pub fn note_off(note: impl Into<Note>, velocity: f32, allow_tail_off: bool) -> Self {
        NoteEvent::NoteOff {
            note: note.into(),
            velocity: clamp_unit(velocity),
            allow_tail_off,
        }
    }

    pub fn at(self, time: u32) -> TimedNoteEvent {
        TimedNoteEvent { time, event: self }
    }
}

impl TimedNoteEvent {
    pub fn note_on(time: u32, note: impl Into<Note>, velocity: f32) -> Self {
        NoteEvent::note_on(note, velocity).at(time)
    }

    pub fn note_off(time: u32, note: impl Into<Note>, velocity: f32, allow_tail_off: bool) -> Self {
        NoteEvent::note_off(note, velocity, allow_tail_off).at(time)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_constructors_clamp() {
        let event = TimedNoteEvent::note_on(12, 200i32, 1.5);
        assert_eq!(event.time, 12);
        assert_eq!(
            event.event,
            NoteEvent::NoteOn {
                note: Note::MAX,
                velocity: 1.0
            }
        );

        let off = NoteEvent::note_off(-3i32, f32::NAN, true);
        assert_eq!(
            off,
            NoteEvent::NoteOff {
                note: Note::clamped(0),
                velocity: 0.0,
                allow_tail_off: true
            }
        );
    }
}
