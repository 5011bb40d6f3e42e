use std::fmt;

use biquad::{Biquad, Coefficients, DirectForm2Transposed, Hertz, Type};

use crate::{Result, WidgetError};

/// Channels every band keeps filter state for.
pub const MAX_CHANNELS: usize = 2;

/// Number of peaking bands in the equaliser.
pub const BAND_COUNT: usize = 6;

/// One peaking equaliser stage with a fixed centre frequency.
pub struct PeakingBand {
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: u32,
    filters: [DirectForm2Transposed<f32>; MAX_CHANNELS],
}

impl PeakingBand {
    /// Creates a flat band centred on `frequency`. Frequencies at or above
    /// Nyquist are moved just below it.
    pub fn new(sample_rate: u32, frequency: f32, q: f32) -> Result<Self> {
        let nyquist = sample_rate as f32 / 2.0;
        let frequency = if frequency >= nyquist {
            let clamped = nyquist - 1.0;
            tracing::warn!(frequency, clamped, "band frequency above nyquist");
            clamped
        } else {
            frequency
        };

        let coeffs = design(sample_rate, frequency, q, 0.0)?;
        Ok(Self {
            frequency,
            q,
            gain_db: 0.0,
            sample_rate,
            filters: std::array::from_fn(|_| DirectForm2Transposed::<f32>::new(coeffs)),
        })
    }

    /// Returns the centre frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Returns the current gain in dB.
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Redesigns the band for `gain_db`, keeping the filter state.
    pub fn set_gain(&mut self, gain_db: f32) -> Result<()> {
        let coeffs = design(self.sample_rate, self.frequency, self.q, gain_db)?;
        for filter in &mut self.filters {
            filter.update_coefficients(coeffs);
        }
        self.gain_db = gain_db;
        Ok(())
    }

    #[inline]
    pub fn process(&mut self, sample: f32, channel: usize) -> f32 {
        match self.filters.get_mut(channel) {
            Some(filter) => {
                let out = filter.run(sample);
                // denormals
                if out.abs() < 1e-20 {
                    0.0
                } else {
                    out
                }
            }
            None => sample,
        }
    }
}

impl fmt::Debug for PeakingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeakingBand")
            .field("frequency", &self.frequency)
            .field("q", &self.q)
            .field("gain_db", &self.gain_db)
            .finish()
    }
}

/// Serial chain of peaking bands in ascending frequency order. The order is
/// fixed once built; only band gains change afterwards.
#[derive(Debug)]
pub struct FilterChain {
    bands: Vec<PeakingBand>,
}

impl FilterChain {
    /// Builds one band per frequency. Exactly [`BAND_COUNT`] strictly
    /// ascending frequencies are accepted.
    pub fn new(sample_rate: u32, frequencies: &[f32], q: f32) -> Result<Self> {
        if frequencies.len() != BAND_COUNT {
            return Err(WidgetError::InvalidInput("the equaliser has exactly six bands"));
        }
        if frequencies.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(WidgetError::InvalidInput(
                "band frequencies must be strictly ascending",
            ));
        }

        let bands = frequencies
            .iter()
            .map(|&frequency| PeakingBand::new(sample_rate, frequency, q))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { bands })
    }

    /// Returns the number of bands.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Returns the bands in processing order.
    pub fn bands(&self) -> &[PeakingBand] {
        &self.bands
    }

    /// Returns the gain of every band in dB.
    pub fn gains(&self) -> Vec<f32> {
        self.bands.iter().map(PeakingBand::gain_db).collect()
    }

    /// Sets the gain of one band. An unknown index is rejected and no band
    /// changes.
    pub fn set_gain(&mut self, index: usize, gain_db: f32) -> Result<()> {
        let len = self.bands.len();
        let band = self
            .bands
            .get_mut(index)
            .ok_or(WidgetError::OutOfRange { index, len })?;
        band.set_gain(gain_db)
    }

    #[inline]
    pub fn process(&mut self, sample: f32, channel: usize) -> f32 {
        self.bands
            .iter_mut()
            .fold(sample, |acc, band| band.process(acc, channel))
    }
}

fn design(sample_rate: u32, frequency: f32, q: f32, gain_db: f32) -> Result<Coefficients<f32>> {
    let fs = Hertz::<f32>::from_hz(sample_rate as f32).map_err(filter_error)?;
    let f0 = Hertz::<f32>::from_hz(frequency).map_err(filter_error)?;
    Coefficients::<f32>::from_params(Type::PeakingEQ(gain_db), fs, f0, q).map_err(filter_error)
}

fn filter_error(err: biquad::Errors) -> WidgetError {
    WidgetError::Filter(format!("{err:?}"))
}
