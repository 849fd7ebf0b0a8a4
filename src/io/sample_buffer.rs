//! Fixed-length windowing of a waveform

/// One analysis window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleWindow<'a> {
    /// Position of the window in the sequence
    pub index: usize,

    /// Offset of the first sample
    pub start_sample: usize,

    /// Window samples (a kept trailing window may be shorter)
    pub samples: &'a [f32],
}

/// Iterator over consecutive, non-overlapping windows
///
/// Full windows are always yielded. A trailing partial window is yielded
/// only if it holds at least `min_tail_fraction` of a full window.
#[derive(Debug, Clone)]
pub struct SampleWindows<'a> {
    data: &'a [f32],
    window_size: usize,
    min_tail: usize,
    position: usize,
    index: usize,
}

impl<'a> SampleWindows<'a> {
    /// Create a windowing iterator
    ///
    /// A `window_size` of 0 yields nothing.
    pub fn new(data: &'a [f32], window_size: usize, min_tail_fraction: f32) -> Self {
        let min_tail = ((window_size as f32 * min_tail_fraction.clamp(0.0, 1.0)).ceil() as usize).max(1);
        Self {
            data,
            window_size,
            min_tail,
            position: 0,
            index: 0,
        }
    }

    /// Number of windows the iterator yields in total
    pub fn total(&self) -> usize {
        if self.window_size == 0 {
            return 0;
        }
        let full = self.data.len() / self.window_size;
        let tail = self.data.len() % self.window_size;
        full + usize::from(tail > 0 && tail >= self.min_tail)
    }
}

impl<'a> Iterator for SampleWindows<'a> {
    type Item = SampleWindow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.window_size == 0 || self.position >= self.data.len() {
            return None;
        }

        let end = (self.position + self.window_size).min(self.data.len());
        if end - self.position < self.window_size && end - self.position < self.min_tail {
            self.position = self.data.len();
            return None;
        }

        let window = SampleWindow {
            index: self.index,
            start_sample: self.position,
            samples: &self.data[self.position..end],
        };
        self.position = end;
        self.index += 1;
        Some(window)
    }
}
