use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{config::GraphConfig, Result, WidgetError};

/// Byte magnitudes of the analyser bins. Contents are only valid until the
/// next refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisBuffer {
    bins: Vec<u8>,
}

impl AnalysisBuffer {
    /// Creates a zeroed buffer of `bin_count` bins.
    pub fn new(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    /// Returns the number of bins.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Returns the bin magnitudes, 0-255.
    pub fn as_slice(&self) -> &[u8] {
        &self.bins
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bins
    }
}

/// Frequency analyser stage. Keeps the most recent `fft_size` mono samples
/// and turns them into smoothed, decibel-scaled byte magnitudes on demand.
pub struct AnalyserNode {
    fft_size: usize,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    history: Vec<f32>,
    write_pos: usize,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    fft: FftResources,
}

impl AnalyserNode {
    /// Creates an analyser from the graph configuration. The FFT size must be a
    /// power of two and the decibel range must not be empty.
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let fft_size = config.fft_size;
        if fft_size < 32 || !fft_size.is_power_of_two() {
            return Err(WidgetError::InvalidInput(
                "analyser window must be a power of two of at least 32",
            ));
        }
        if config.max_decibels <= config.min_decibels {
            return Err(WidgetError::InvalidInput(
                "analyser decibel range must be increasing",
            ));
        }
        if !(0.0..=1.0).contains(&config.smoothing_time_constant) {
            return Err(WidgetError::InvalidInput(
                "smoothing time constant must lie in [0, 1]",
            ));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(fft_size);
        let fft = FftResources {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        };

        Ok(Self {
            fft_size,
            smoothing: config.smoothing_time_constant,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            history: vec![0.0; fft_size],
            write_pos: 0,
            window: (0..fft_size).map(|i| blackman_value(i, fft_size)).collect(),
            smoothed: vec![0.0; fft_size / 2],
            fft,
        })
    }

    /// Returns the transform window in samples.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Returns the number of frequency bins, half the FFT size.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Records one mono sample flowing through the stage.
    #[inline]
    pub fn observe(&mut self, sample: f32) {
        self.history[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.fft_size;
    }

    /// Transforms the latest window and writes smoothed magnitudes, scaled to
    /// bytes between the decibel bounds, into `out`.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) -> Result<()> {
        if out.len() != self.frequency_bin_count() {
            return Err(WidgetError::InvalidInput(
                "analysis buffer does not match the analyser bin count",
            ));
        }

        // oldest sample first
        let (newer, older) = self.history.split_at(self.write_pos);
        for (index, sample) in older.iter().chain(newer).enumerate() {
            self.fft.input[index] = sample * self.window[index];
        }

        self.fft.plan.process_with_scratch(
            &mut self.fft.input,
            &mut self.fft.spectrum,
            &mut self.fft.scratch,
        )?;

        let scale = 1.0 / self.fft_size as f32;
        let range = self.max_decibels - self.min_decibels;

        for ((slot, previous), bin) in out
            .iter_mut()
            .zip(self.smoothed.iter_mut())
            .zip(&self.fft.spectrum)
        {
            let magnitude = bin.norm() * scale;
            let mut value = self.smoothing * *previous + (1.0 - self.smoothing) * magnitude;
            if !value.is_finite() {
                value = 0.0;
            }
            *previous = value;

            let decibels = 20.0 * value.log10();
            let scaled = 255.0 * (decibels - self.min_decibels) / range;
            *slot = if scaled.is_finite() {
                scaled.clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }

        Ok(())
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for AnalyserNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyserNode")
            .field("fft_size", &self.fft_size)
            .field("smoothing", &self.smoothing)
            .field("min_decibels", &self.min_decibels)
            .field("max_decibels", &self.max_decibels)
            .finish()
    }
}

fn blackman_value(index: usize, len: usize) -> f32 {
    let phase = 2.0 * PI * index as f32 / len as f32;
    0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
}
