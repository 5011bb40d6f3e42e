//! Audio processing graph of the player.
//!
//! The chain is fixed at construction:
//!
//! ```text
//! media source -> peaking x6 -> analyser -> stereo panner -> destination
//! ```
//!
//! The host pulls audio through [`AudioGraph::render`] and the visualizer
//! samples the analyser through [`AudioGraph::sample_frequencies`].

mod analyser;
mod context;
mod filters;
mod panner;

pub use analyser::{AnalyserNode, AnalysisBuffer};
pub use context::{AudioContext, ContextState};
pub use filters::{FilterChain, PeakingBand, BAND_COUNT, MAX_CHANNELS};
pub use panner::StereoPannerNode;

use crate::{config::GraphConfig, media::MediaElement, Result, WidgetError};

/// Channel count of the destination.
pub const OUTPUT_CHANNELS: usize = 2;

/// Handle over the constructed node chain.
#[derive(Debug)]
pub struct AudioGraph {
    context: AudioContext,
    filters: FilterChain,
    analyser: AnalyserNode,
    panner: StereoPannerNode,
    source_block: Vec<f32>,
}

impl AudioGraph {
    /// Wires the node chain for `media`. The context must still be usable;
    /// building the graph never starts playback.
    pub fn build<M: MediaElement + ?Sized>(
        context: AudioContext,
        media: &M,
        config: &GraphConfig,
    ) -> Result<Self> {
        if context.state() == ContextState::Closed {
            return Err(WidgetError::ContextClosed);
        }

        let filters = FilterChain::new(context.sample_rate(), &config.band_frequencies, config.band_q)?;
        let analyser = AnalyserNode::new(config)?;

        tracing::debug!(
            sample_rate = context.sample_rate(),
            bands = filters.len(),
            fft_size = analyser.fft_size(),
            source_channels = media.channels(),
            "audio graph built"
        );

        Ok(Self {
            context,
            filters,
            analyser,
            panner: StereoPannerNode::new(),
            source_block: Vec::new(),
        })
    }

    /// Returns the context hosting the graph.
    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    /// Returns the context mutably, e.g. to resume or suspend it.
    pub fn context_mut(&mut self) -> &mut AudioContext {
        &mut self.context
    }

    /// Returns the equaliser chain.
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Returns the number of analyser bins.
    pub fn frequency_bin_count(&self) -> usize {
        self.analyser.frequency_bin_count()
    }

    /// A buffer sized for [`Self::sample_frequencies`].
    pub fn analysis_buffer(&self) -> AnalysisBuffer {
        AnalysisBuffer::new(self.frequency_bin_count())
    }

    /// Sets the gain of one band. Indices outside the chain are rejected
    /// before anything is touched.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> Result<()> {
        self.filters.set_gain(index, gain_db)?;
        tracing::debug!(index, gain_db, "band gain updated");
        Ok(())
    }

    /// Returns the stored balance value.
    pub fn pan(&self) -> f32 {
        self.panner.pan()
    }

    /// Callers are expected to clamp `value` to [-1, 1].
    pub fn set_pan(&mut self, value: f32) {
        self.panner.set_pan(value);
    }

    /// Overwrites `buffer` with the current byte magnitudes.
    pub fn sample_frequencies(&mut self, buffer: &mut AnalysisBuffer) -> Result<()> {
        self.analyser.byte_frequency_data(buffer.as_mut_slice())
    }

    /// Pulls `out.len() / 2` frames from `media` through the chain into the
    /// stereo interleaved `out`. Returns the number of frames the media
    /// produced; the remainder is silence. A context that is not running
    /// renders silence without touching the media.
    pub fn render<M: MediaElement + ?Sized>(&mut self, media: &mut M, out: &mut [f32]) -> usize {
        out.fill(0.0);
        if !self.context.is_running() {
            return 0;
        }

        let frames = out.len() / OUTPUT_CHANNELS;
        let channels = media.channels().clamp(1, MAX_CHANNELS);
        self.source_block.clear();
        self.source_block.resize(frames * channels, 0.0);

        let read = media.read(&mut self.source_block);
        let volume = media.volume();

        for (frame, slot) in self
            .source_block
            .chunks_exact(channels)
            .zip(out.chunks_exact_mut(OUTPUT_CHANNELS))
        {
            let (left, right) = if channels == 1 {
                let sample = self.filters.process(frame[0] * volume, 0);
                self.analyser.observe(sample);
                self.panner.process_mono(sample)
            } else {
                let left = self.filters.process(frame[0] * volume, 0);
                let right = self.filters.process(frame[1] * volume, 1);
                self.analyser.observe(0.5 * (left + right));
                self.panner.process_stereo(left, right)
            };
            slot[0] = left;
            slot[1] = right;
        }

        read
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::media::{BufferedMedia, PcmClip};

    const RATE: u32 = 8_000;

    fn config() -> GraphConfig {
        // 10 kHz sits above Nyquist here and is clamped
        GraphConfig {
            sample_rate: RATE,
            ..GraphConfig::default()
        }
    }

    fn media(samples: Vec<f32>, channels: usize) -> BufferedMedia<HashMap<String, PcmClip>> {
        let mut clips = HashMap::new();
        clips.insert(
            "tone".to_string(),
            PcmClip::new(samples, channels, RATE).unwrap(),
        );
        let mut media = BufferedMedia::new(clips, RATE);
        media.set_src("tone");
        media
    }

    #[test]
    fn builds_the_default_chain() {
        let media = media(vec![0.0; 16], 1);
        let graph = AudioGraph::build(AudioContext::new(44_100), &media, &GraphConfig::default()).unwrap();

        assert_eq!(graph.filters().len(), 6);
        assert!(graph.filters().bands().iter().all(|band| band.gain_db() == 0.0));
        assert_eq!(graph.frequency_bin_count(), 128);
        assert_eq!(graph.context().state(), ContextState::Suspended);
    }

    #[test]
    fn closed_context_cannot_host_a_graph() {
        let media = media(vec![0.0; 16], 1);
        let mut context = AudioContext::new(RATE);
        context.close();
        let err = AudioGraph::build(context, &media, &config()).unwrap_err();
        assert!(matches!(err, WidgetError::ContextClosed));
    }

    #[test]
    fn suspended_context_renders_silence() {
        let mut media = media(vec![0.5; 64], 1);
        media.play();
        let mut graph = AudioGraph::build(AudioContext::new(RATE), &media, &config()).unwrap();

        let mut out = [1.0; 32];
        assert_eq!(graph.render(&mut media, &mut out), 0);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(media.current_time(), 0.0);
    }

    #[test]
    fn renders_stereo_through_volume_and_pan() {
        let mut media = media(vec![0.5, 0.5, 0.5, 0.5], 2);
        media.set_volume(0.5);
        media.play();
        let mut graph = AudioGraph::build(AudioContext::new(RATE), &media, &config()).unwrap();
        graph.context_mut().resume().unwrap();
        graph.set_pan(1.0);

        let mut out = [0.0; 8];
        assert_eq!(graph.render(&mut media, &mut out), 2);
        // hard right folds the left channel into the right one
        assert!(out[0].abs() < 1e-3);
        assert!((out[1] - 0.5).abs() < 0.05);
        assert_eq!(&out[4..], &[0.0; 4]);
    }

    #[test]
    fn rejects_bad_band_index_without_side_effects() {
        let media = media(vec![0.0; 16], 1);
        let mut graph = AudioGraph::build(AudioContext::new(RATE), &media, &config()).unwrap();
        graph.set_band_gain(2, 4.0).unwrap();

        graph.set_band_gain(5, -3.0).unwrap();

        let err = graph.set_band_gain(6, 1.0).unwrap_err();
        assert!(matches!(err, WidgetError::OutOfRange { index: 6, len: 6 }));
        assert_eq!(graph.filters().gains(), vec![0.0, 0.0, 4.0, 0.0, 0.0, -3.0]);
    }

    #[test]
    fn silent_media_samples_to_zero() {
        let mut media = media(vec![0.0; 1_024], 1);
        media.play();
        let mut graph = AudioGraph::build(AudioContext::new(RATE), &media, &config()).unwrap();
        graph.context_mut().resume().unwrap();

        let mut out = vec![0.0; 1_024];
        graph.render(&mut media, &mut out);

        let mut buffer = graph.analysis_buffer();
        graph.sample_frequencies(&mut buffer).unwrap();
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }
}
