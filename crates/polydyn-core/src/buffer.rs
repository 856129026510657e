//! Planar multichannel audio block.
//!
//! The synthesizer speaks interleaved stereo (`[L, R, L, R, ...]`), while the
//! dynamics processor works channel by channel. [`AudioBuffer`] holds one
//! `Vec<f32>` per channel and converts to and from interleaved slices without
//! allocating once it has been sized.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// A planar (non-interleaved) multichannel buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    frames: usize,
}

impl AudioBuffer {
    /// Creates a zeroed buffer with `num_channels` channels of `frames` samples.
    pub fn new(num_channels: usize, frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; num_channels],
            frames,
        }
    }

    /// Builds a buffer from per-channel sample vectors.
    ///
    /// Channels shorter than the longest one are zero-padded.
    pub fn from_channels(mut channels: Vec<Vec<f32>>) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        for ch in &mut channels {
            ch.resize(frames, 0.0);
        }
        Self { channels, frames }
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn num_frames(&self) -> usize {
        self.frames
    }

    /// Returns true if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Read-only view of a channel.
    ///
    /// # Panics
    /// Panics if `channel >= num_channels()`.
    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    /// Mutable view of a channel.
    ///
    /// # Panics
    /// Panics if `channel >= num_channels()`.
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.channels[channel]
    }

    /// Sample at (`channel`, `frame`), or 0.0 when out of range.
    #[inline]
    pub fn sample(&self, channel: usize, frame: usize) -> f32 {
        self.channels
            .get(channel)
            .and_then(|c| c.get(frame))
            .copied()
            .unwrap_or(0.0)
    }

    /// Mutable slices over every channel.
    ///
    /// Slices, not vectors, so the channel lengths always match `num_frames()`.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> + '_ {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    /// The first two channels as `(left, right)`, or `None` for mono.
    pub fn stereo_mut(&mut self) -> Option<(&mut [f32], &mut [f32])> {
        match self.channels.as_mut_slice() {
            [left, right, ..] => Some((left.as_mut_slice(), right.as_mut_slice())),
            _ => None,
        }
    }

    /// Largest absolute sample across all channels at `frame`.
    #[inline]
    pub fn frame_peak(&self, frame: usize) -> f32 {
        self.channels
            .iter()
            .map(|c| c.get(frame).map_or(0.0, |s| s.abs()))
            .fold(0.0, f32::max)
    }

    /// Largest absolute sample in the whole buffer.
    pub fn peak(&self) -> f32 {
        (0..self.frames).map(|i| self.frame_peak(i)).fold(0.0, f32::max)
    }

    /// Zeroes every sample.
    pub fn clear(&mut self) {
        for ch in &mut self.channels {
            ch.fill(0.0);
        }
    }

    /// Resizes to the given shape, zeroing new samples.
    ///
    /// Allocates; call from setup code, not from the audio callback.
    pub fn resize(&mut self, num_channels: usize, frames: usize) {
        self.channels.resize_with(num_channels, Vec::new);
        for ch in &mut self.channels {
            ch.resize(frames, 0.0);
        }
        self.frames = frames;
    }

    /// Changes the frame count without allocating.
    ///
    /// `frames` is limited to the smallest channel capacity, so this is safe
    /// to call from the audio callback. New samples are zeroed. Returns the
    /// frame count actually set.
    pub fn set_num_frames(&mut self, frames: usize) -> usize {
        let frames = self
            .channels
            .iter()
            .map(Vec::capacity)
            .min()
            .map_or(0, |capacity| frames.min(capacity));
        for ch in &mut self.channels {
            ch.resize(frames, 0.0);
        }
        self.frames = frames;
        frames
    }

    /// Copies the contents of another buffer of the same shape.
    ///
    /// Channels or frames past the smaller of the two shapes are left untouched.
    pub fn copy_from(&mut self, other: &AudioBuffer) {
        for (dst, src) in self.channels.iter_mut().zip(other.channels.iter()) {
            let n = dst.len().min(src.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
    }

    /// Fills this buffer from an interleaved slice.
    ///
    /// Reads `min(num_frames, interleaved.len() / num_channels)` frames; the
    /// remaining frames are zeroed.
    pub fn read_interleaved(&mut self, interleaved: &[f32]) {
        let n_ch = self.channels.len();
        if n_ch == 0 {
            return;
        }
        let frames = (interleaved.len() / n_ch).min(self.frames);
        for (c, ch) in self.channels.iter_mut().enumerate() {
            for (i, s) in ch.iter_mut().enumerate() {
                *s = if i < frames { interleaved[i * n_ch + c] } else { 0.0 };
            }
        }
    }

    /// Writes this buffer into an interleaved slice.
    ///
    /// Writes `min(num_frames, interleaved.len() / num_channels)` frames.
    pub fn write_interleaved(&self, interleaved: &mut [f32]) {
        let n_ch = self.channels.len();
        if n_ch == 0 {
            return;
        }
        let frames = (interleaved.len() / n_ch).min(self.frames);
        for (c, ch) in self.channels.iter().enumerate() {
            for i in 0..frames {
                interleaved[i * n_ch + c] = ch[i];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let buf = AudioBuffer::new(2, 64);
        assert_eq!(buf.num_channels(), 2);
        assert_eq!(buf.num_frames(), 64);
        assert_eq!(buf.peak(), 0.0);
    }

    #[test]
    fn test_interleave_roundtrip() {
        let interleaved = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let mut buf = AudioBuffer::new(2, 3);
        buf.read_interleaved(&interleaved);
        assert_eq!(buf.channel(0), &[0.1, 0.2, 0.3]);
        assert_eq!(buf.channel(1), &[-0.1, -0.2, -0.3]);

        let mut out = [0.0; 6];
        buf.write_interleaved(&mut out);
        assert_eq!(out, interleaved);
    }

    #[test]
    fn test_short_interleaved_zero_fills() {
        let mut buf = AudioBuffer::new(2, 4);
        buf.channel_mut(0).fill(9.0);
        buf.read_interleaved(&[1.0, 2.0]);
        assert_eq!(buf.channel(0), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(buf.channel(1), &[2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_frame_peak_spans_channels() {
        let buf = AudioBuffer::from_channels(vec![vec![0.2, -0.9], vec![-0.5, 0.1]]);
        assert_eq!(buf.frame_peak(0), 0.5);
        assert_eq!(buf.frame_peak(1), 0.9);
        assert_eq!(buf.peak(), 0.9);
        assert_eq!(buf.sample(5, 5), 0.0);
    }

    #[test]
    fn test_from_channels_pads() {
        let buf = AudioBuffer::from_channels(vec![vec![1.0], vec![1.0, 2.0, 3.0]]);
        assert_eq!(buf.num_frames(), 3);
        assert_eq!(buf.channel(0), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_stereo_mut() {
        let mut buf = AudioBuffer::new(2, 2);
        let (left, right) = buf.stereo_mut().unwrap();
        left[0] = 1.0;
        right[1] = -1.0;
        assert_eq!(buf.channel(0), &[1.0, 0.0]);
        assert_eq!(buf.channel(1), &[0.0, -1.0]);
        assert!(AudioBuffer::new(1, 2).stereo_mut().is_none());
    }

    #[test]
    fn test_channels_mut_keeps_shape() {
        let mut buf = AudioBuffer::new(3, 8);
        for ch in buf.channels_mut() {
            assert_eq!(ch.len(), 8);
            ch.fill(0.5);
        }
        assert_eq!(buf.peak(), 0.5);
    }

    #[test]
    fn test_set_num_frames_stays_in_capacity() {
        let mut buf = AudioBuffer::new(2, 8);
        buf.channel_mut(0).fill(1.0);
        assert_eq!(buf.set_num_frames(3), 3);
        assert_eq!(buf.channel(0), &[1.0; 3]);

        assert_eq!(buf.set_num_frames(64), 8, "limited to capacity");
        assert_eq!(buf.num_frames(), 8);
        assert_eq!(buf.channel(0), &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(buf.channel(1).len(), 8);
    }

    #[test]
    fn test_resize() {
        let mut buf = AudioBuffer::new(1, 2);
        buf.channel_mut(0).fill(1.0);
        buf.resize(2, 4);
        assert_eq!(buf.channel(0), &[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(buf.channel(1), &[0.0; 4]);
    }
}
