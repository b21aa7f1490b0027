// RollingBuffer - fixed-duration sliding window over decoded samples
//
// The buffer has two lifecycle phases. While filling, each acquisition chunk
// is prepended, so the newest samples always sit at the front. Once enough
// chunks have arrived to cover the display window, the buffer length freezes:
// each new chunk rotates the buffer right by the chunk length and overwrites
// the front slots. Downstream time-axis labelling and the analysis slice both
// assume this newest-first layout, so the strategy must not be swapped for a
// conventional index-arithmetic ring buffer.

/// Sliding window of the most recent `max_window_secs` of signal.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    data: Vec<f64>,
    /// Duration of one acquisition chunk in seconds.
    chunk_secs: f64,
    /// Number of appends needed to cover the display window.
    n_max_loops: usize,
    /// Completed appends.
    loops_completed: usize,
}

impl RollingBuffer {
    /// Fraction of the buffer (the newest samples) handed to analysis.
    const ANALYSIS_FRACTION: f64 = 0.05;

    pub fn new(chunk_secs: f64, max_window_secs: f64) -> Self {
        let n_max_loops = (max_window_secs / chunk_secs).floor() as usize;
        Self {
            data: Vec::new(),
            chunk_secs,
            n_max_loops,
            loops_completed: 0,
        }
    }

    /// Fold one decoded chunk into the window.
    ///
    /// Grows (prepend) until `n_max_loops` appends have completed, then
    /// switches to rotate-and-overwrite at fixed length.
    pub fn append(&mut self, chunk: &[f64]) {
        if self.loops_completed == 0 {
            self.data = chunk.to_vec();
        } else if self.loops_completed <= self.n_max_loops {
            let mut grown = Vec::with_capacity(chunk.len() + self.data.len());
            grown.extend_from_slice(chunk);
            grown.extend_from_slice(&self.data);
            self.data = grown;
        } else if !self.data.is_empty() {
            let m = chunk.len().min(self.data.len());
            let len = self.data.len();
            self.data.rotate_right(m % len);
            self.data[..m].copy_from_slice(&chunk[..m]);
        }
        self.loops_completed += 1;
    }

    /// Current window contents, newest samples first.
    pub fn snapshot(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the buffer has stopped growing.
    pub fn is_steady_state(&self) -> bool {
        self.loops_completed > self.n_max_loops
    }

    /// Elapsed-time axis for the current contents.
    ///
    /// Linearly spaced over the buffer length and scaled to
    /// `min(loops_completed, n_max_loops) * chunk_secs`, matching the layout
    /// the display expects.
    pub fn time_axis(&self) -> Vec<f64> {
        let n = self.data.len();
        let scale = self.loops_completed.min(self.n_max_loops) as f64 * self.chunk_secs;
        match n {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => (0..n)
                .map(|i| scale * i as f64 / (n - 1) as f64)
                .collect(),
        }
    }

    /// The most recently written 5% of the window, used as the estimator
    /// input. The rotate-and-overwrite layout keeps that region at the front.
    pub fn analysis_slice(&self) -> &[f64] {
        let take = (Self::ANALYSIS_FRACTION * self.data.len() as f64).round() as usize;
        &self.data[..take.min(self.data.len())]
    }
}
