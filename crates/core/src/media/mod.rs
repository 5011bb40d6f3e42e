//! Playable media element consumed by the player.
//!
//! Decoding lives with the host: a [`ClipResolver`] turns a source URL into
//! interleaved PCM at the audio context rate, and [`BufferedMedia`] plays it.

use std::collections::HashMap;

use crate::{Result, WidgetError};

/// The playback surface the transport controller and the audio graph talk to.
pub trait MediaElement {
    fn src(&self) -> Option<&str>;
    /// Replaces the source. Position resets to zero and playback pauses until
    /// `play` is requested again.
    fn set_src(&mut self, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// Duration in seconds, `0.0` while no source is loaded.
    fn duration(&self) -> f64;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn looping(&self) -> bool;
    fn set_looping(&mut self, looping: bool);
    /// Returns `true` once after playback reached the end of the source.
    fn take_ended(&mut self) -> bool;
    /// Channel count of the current source (1 or 2).
    fn channels(&self) -> usize;
    /// Writes up to `out.len() / channels()` interleaved frames and returns
    /// the number of frames written. Paused media writes nothing.
    fn read(&mut self, out: &mut [f32]) -> usize;
}

/// Interleaved PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmClip {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl PcmClip {
    /// Wraps interleaved samples. Only mono and stereo clips are accepted.
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Result<Self> {
        if !(1..=2).contains(&channels) {
            return Err(WidgetError::InvalidInput("clips must be mono or stereo"));
        }
        if sample_rate == 0 {
            return Err(WidgetError::InvalidInput("clip sample rate must be positive"));
        }
        if samples.len() % channels != 0 {
            return Err(WidgetError::InvalidInput(
                "sample count must be a multiple of the channel count",
            ));
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of sample frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Returns the interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the clip length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Turns a source URL into decoded audio.
pub trait ClipResolver {
    fn resolve(&self, url: &str) -> Result<PcmClip>;
}

impl ClipResolver for HashMap<String, PcmClip> {
    fn resolve(&self, url: &str) -> Result<PcmClip> {
        self.get(url)
            .cloned()
            .ok_or_else(|| WidgetError::msg(format!("no clip registered for `{url}`")))
    }
}

/// Media element playing fully decoded clips from memory.
#[derive(Debug)]
pub struct BufferedMedia<R> {
    resolver: R,
    sample_rate: u32,
    src: Option<String>,
    clip: Option<PcmClip>,
    position: usize,
    paused: bool,
    volume: f32,
    looping: bool,
    ended: bool,
}

impl<R: ClipResolver> BufferedMedia<R> {
    /// `sample_rate` is the rate clips must be delivered at, i.e. the rate of
    /// the audio context the element feeds.
    pub fn new(resolver: R, sample_rate: u32) -> Self {
        Self {
            resolver,
            sample_rate,
            src: None,
            clip: None,
            position: 0,
            paused: true,
            volume: 1.0,
            looping: false,
            ended: false,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn load(&self, url: &str) -> Result<PcmClip> {
        let clip = self.resolver.resolve(url)?;
        if clip.sample_rate() != self.sample_rate {
            return Err(WidgetError::msg(format!(
                "clip `{url}` is {} Hz, expected {} Hz",
                clip.sample_rate(),
                self.sample_rate
            )));
        }
        Ok(clip)
    }
}

impl<R: ClipResolver> MediaElement for BufferedMedia<R> {
    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn set_src(&mut self, url: &str) {
        self.clip = match self.load(url) {
            Ok(clip) => Some(clip),
            Err(err) => {
                tracing::warn!(url, error = %err, "media source could not be loaded");
                None
            }
        };
        self.src = Some(url.to_string());
        self.position = 0;
        self.paused = true;
        self.ended = false;
    }

    fn play(&mut self) {
        if self.clip.is_none() {
            tracing::debug!("play requested without a loaded source");
        }
        if let Some(clip) = &self.clip {
            if self.position >= clip.frames() {
                self.position = 0;
            }
        }
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    fn set_current_time(&mut self, seconds: f64) {
        let Some(clip) = &self.clip else {
            return;
        };
        let seconds = if seconds.is_finite() { seconds } else { 0.0 };
        let frame = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        self.position = frame.min(clip.frames());
    }

    fn duration(&self) -> f64 {
        self.clip.as_ref().map(PcmClip::duration).unwrap_or(0.0)
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn take_ended(&mut self) -> bool {
        std::mem::take(&mut self.ended)
    }

    fn channels(&self) -> usize {
        self.clip.as_ref().map(PcmClip::channels).unwrap_or(2)
    }

    fn read(&mut self, out: &mut [f32]) -> usize {
        if self.paused {
            return 0;
        }
        let Some(clip) = &self.clip else {
            return 0;
        };

        let channels = clip.channels();
        let wanted = out.len() / channels;
        let mut written = 0;

        while written < wanted {
            if self.position >= clip.frames() {
                if self.looping && clip.frames() > 0 {
                    self.position = 0;
                } else {
                    self.paused = true;
                    self.ended = true;
                    break;
                }
            }

            let count = (wanted - written).min(clip.frames() - self.position);
            let src = &clip.samples()[self.position * channels..(self.position + count) * channels];
            out[written * channels..(written + count) * channels].copy_from_slice(src);
            written += count;
            self.position += count;
        }

        written
    }
}
