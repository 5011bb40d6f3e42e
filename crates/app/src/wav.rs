//! WAV decoding for the host media element.

use audio_widgets_core::{ClipResolver, PcmClip, Result, WidgetError};

/// Decodes WAV files named by path and delivers them at `sample_rate`.
#[derive(Debug, Clone, Copy)]
pub struct WavResolver {
    sample_rate: u32,
}

impl WavResolver {
    /// Creates a resolver delivering clips at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl ClipResolver for WavResolver {
    fn resolve(&self, url: &str) -> Result<PcmClip> {
        let reader = hound::WavReader::open(url).map_err(|err| decode_error(url, err))?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(WidgetError::InvalidInput("wav file declares no channels"));
        }

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>(),
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect::<std::result::Result<Vec<_>, _>>()
            }
        }
        .map_err(|err| decode_error(url, err))?;

        let (samples, channels) = keep_front_pair(samples, usize::from(spec.channels));
        let samples = resample_linear(&samples, channels, spec.sample_rate, self.sample_rate);

        tracing::debug!(
            url,
            channels,
            source_rate = spec.sample_rate,
            target_rate = self.sample_rate,
            "decoded wav"
        );
        PcmClip::new(samples, channels, self.sample_rate)
    }
}

fn decode_error(url: &str, err: hound::Error) -> WidgetError {
    WidgetError::msg(format!("cannot decode `{url}`: {err}"))
}

/// Drops every channel past the first two.
fn keep_front_pair(samples: Vec<f32>, channels: usize) -> (Vec<f32>, usize) {
    if channels <= 2 {
        return (samples, channels);
    }
    let stereo = samples
        .chunks_exact(channels)
        .flat_map(|frame| [frame[0], frame[1]])
        .collect();
    (stereo, 2)
}

fn resample_linear(samples: &[f32], channels: usize, from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() {
        return samples.to_vec();
    }

    let frames = samples.len() / channels;
    let ratio = f64::from(from) / f64::from(to);
    let out_frames = (frames as f64 / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_frames * channels);

    for index in 0..out_frames {
        let position = index as f64 * ratio;
        let i0 = (position.floor() as usize).min(frames - 1);
        let i1 = (i0 + 1).min(frames - 1);
        let frac = (position - i0 as f64) as f32;
        for channel in 0..channels {
            let a = samples[i0 * channels + channel];
            let b = samples[i1 * channels + channel];
            out.push(a + (b - a) * frac);
        }
    }

    out
}
