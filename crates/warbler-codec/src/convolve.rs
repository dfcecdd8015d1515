//! FIR convolution, offline and streaming.
//!
//! All variants use the same centred form:
//!
//! ```text
//! y[i] = Σ_j x[i - mid + j] · k[j]
//! ```
//!
//! The offline functions treat samples outside the buffer as zero
//! ([`convolve`]) or as a point reflection about the end samples
//! ([`convolve_odd_extended`]). [`StreamingFir`] computes the same sum from a
//! fixed-size ring buffer, delayed by `mid` samples so that it stays causal.

use crate::filter::FirKernel;

/// Convolves a signal with a centred kernel, zero outside the buffer.
///
/// The output has the same length as the input and sample `i` of the output
/// is aligned with sample `i` of the input.
pub fn convolve(signal: &[f64], kernel: &FirKernel) -> Vec<f64> {
    let n = signal.len();
    let taps = kernel.taps();
    let mid = kernel.mid();

    (0..n)
        .map(|i| {
            // Valid j satisfy 0 <= i + j - mid < n.
            let j_start = mid.saturating_sub(i);
            let j_end = taps.len().min(n + mid - i);
            if j_start >= j_end {
                return 0.0;
            }
            let s_start = i + j_start - mid;
            let s_end = i + j_end - mid;
            signal[s_start..s_end]
                .iter()
                .zip(&taps[j_start..j_end])
                .map(|(x, k)| x * k)
                .sum()
        })
        .collect()
}

/// Convolves with odd (point-reflected) extension at both edges.
///
/// Beyond the first sample the signal continues as `2·x[0] - x[-k]`, and
/// likewise at the end. Linear trends pass through a unity-gain symmetric
/// kernel unchanged, so smoothing a ramp-like contour (an unwrapped phase, a
/// pitch track) does not collapse toward zero near the edges.
pub fn convolve_odd_extended(signal: &[f64], kernel: &FirKernel) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let taps = kernel.taps();
    let mid = kernel.mid();

    let extended: Vec<f64> = (-(mid as i64)..(n + mid) as i64)
        .map(|index| odd_extended(signal, index))
        .collect();

    (0..n)
        .map(|i| dot(&extended[i..i + taps.len()], taps))
        .collect()
}

fn odd_extended(signal: &[f64], index: i64) -> f64 {
    let last = signal.len() as i64 - 1;
    if index < 0 {
        let mirror = (-index).min(last);
        2.0 * signal[0] - signal[mirror as usize]
    } else if index > last {
        let mirror = (2 * last - index).max(0);
        2.0 * signal[last as usize] - signal[mirror as usize]
    } else {
        signal[index as usize]
    }
}

/// Causal FIR filter over a preallocated ring buffer.
///
/// The ring holds `kernel.len() + block_size` samples and never grows.
/// Each [`push`](StreamingFir::push) costs one pass over the kernel. The
/// output lags the input by [`latency`](StreamingFir::latency) samples and
/// otherwise matches [`convolve`] sample for sample once the ring is full.
#[derive(Debug, Clone)]
pub struct StreamingFir {
    kernel: FirKernel,
    history: Vec<f64>,
    write_pos: usize,
}

impl StreamingFir {
    /// Creates a streaming filter sized for blocks of up to `block_size`.
    pub fn new(kernel: FirKernel, block_size: usize) -> Self {
        let capacity = kernel.len() + block_size.max(1);
        Self {
            kernel,
            history: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Pushes one input sample and returns the output for `latency()`
    /// samples ago.
    #[inline]
    pub fn push(&mut self, sample: f64) -> f64 {
        let capacity = self.history.len();
        self.history[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % capacity;

        let taps = self.kernel.taps();
        let len = taps.len();
        let start = (self.write_pos + capacity - len) % capacity;

        if start + len <= capacity {
            dot(&self.history[start..start + len], taps)
        } else {
            let first = capacity - start;
            dot(&self.history[start..], &taps[..first])
                + dot(&self.history[..len - first], &taps[first..])
        }
    }

    /// Delay between an input sample and its centred output, in samples.
    pub fn latency(&self) -> usize {
        self.kernel.mid()
    }

    /// Ring buffer capacity in samples.
    pub fn capacity(&self) -> usize {
        self.history.len()
    }

    /// Clears the history.
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|s| *s = 0.0);
        self.write_pos = 0;
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
