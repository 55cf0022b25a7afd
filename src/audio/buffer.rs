pub trait AudioBuffer<'a>: Sized {
    fn samples(self) -> &'a [f32];

    /// Largest absolute sample value.
    fn peak(self) -> f32 {
        self.samples().iter().fold(0.0, |peak, s| peak.max(s.abs()))
    }

    fn is_silent(self) -> bool {
        self.samples().iter().all(|&s| s == 0.0)
    }
}

impl<'a> AudioBuffer<'a> for &'a [f32] {
    fn samples(self) -> &'a [f32] {
        self
    }
}

impl<'a> AudioBuffer<'a> for &'a mut [f32] {
    fn samples(self) -> &'a [f32] {
        self
    }
}

/// Fills every channel with silence.
pub fn clear_channels(channels: &mut [&mut [f32]]) {
    for channel in channels.iter_mut() {
        channel.fill(0.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_peak_and_silence() {
        let buffer = [0.25, -0.75, 0.5];
        assert_eq!(buffer.as_slice().peak(), 0.75);
        assert!(!buffer.as_slice().is_silent());
        assert!([0.0; 3].as_slice().is_silent());
    }

    #[test]
    fn test_clear_channels() {
        let mut left = [1.0; 4];
        let mut right = [-1.0; 4];
        let mut channels: [&mut [f32]; 2] = [&mut left, &mut right];
        clear_channels(&mut channels);
        assert!(left.as_slice().is_silent());
        assert!(right.as_slice().is_silent());
    }
}
