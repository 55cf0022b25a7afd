use crate::util::hz_from_note;

const PITCH_CLASSES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// A MIDI note number, always within `0..=127`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Note(u8);

impl Note {
    pub const MAX: Note = Note(127);

    pub fn middle_c() -> Self {
        Self(60)
    }

    /// Builds a note from any integer, clamping to the MIDI range.
    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(0, 127) as u8)
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn pitch_class(&self) -> &'static str {
        PITCH_CLASSES[(self.0 % 12) as usize]
    }

    /// Octave in scientific pitch notation, so middle C is in octave 4.
    pub fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    pub fn frequency(&self) -> f32 {
        hz_from_note(self.0)
    }

    pub fn transpose(&self, offset: i8) -> Self {
        Self::clamped(self.0 as i32 + offset as i32)
    }
}

impl From<u8> for Note {
    fn from(value: u8) -> Self {
        Self(value.min(127))
    }
}

impl From<i32> for Note {
    fn from(value: i32) -> Self {
        Self::clamped(value)
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave())
    }
}

impl std::fmt::Debug for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self, self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamping() {
        assert_eq!(Note::clamped(-5).number(), 0);
        assert_eq!(Note::clamped(300).number(), 127);
        assert_eq!(Note::from(200u8), Note::MAX);
        assert_eq!(Note::from(64i32).number(), 64);
        assert_eq!(Note::MAX.transpose(12), Note::MAX);
        assert_eq!(Note::from(3u8).transpose(-12).number(), 0);
    }

    #[test]
    fn test_names() {
        assert_eq!(Note::middle_c().to_string(), "C4");
        assert_eq!(Note::from(69u8).to_string(), "A4");
        assert_eq!(Note::from(0u8).to_string(), "C-1");
        assert_eq!(Note::MAX.to_string(), "G9");
        assert_eq!(Note::from(61u8).pitch_class(), "C#");
    }

    #[test]
    fn test_frequency() {
        assert_eq!(Note::from(69u8).frequency(), 440.0);
        assert_eq!(Note::from(57u8).frequency(), 220.0);
    }
}
