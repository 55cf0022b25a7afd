/// Interleaves a stereo signal into a frame buffer with `channels` channels per frame.
///
/// Mono devices receive the average of both sides; channels past the second are silenced.
pub fn interleave_stereo(left: &[f32], right: &[f32], output: &mut [f32], channels: usize) {
    if channels == 0 {
        return;
    }
    let lr = left.iter().zip(right.iter());
    for ((&ls, &rs), frame) in lr.zip(output.chunks_exact_mut(channels)) {
        match frame {
            [mono] => *mono = 0.5 * (ls + rs),
            [l, r, rest @ ..] => {
                *l = ls;
                *r = rs;
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}
