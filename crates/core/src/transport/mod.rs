//! Playback control of the player: the media element, the audio graph it
//! feeds, and the button states that mirror them.

use crate::{
    config::{PauseBehavior, TransportConfig},
    graph::AudioGraph,
    media::MediaElement,
    Result,
};

const PLAY_ICON: &str = "./assets/imgs/play.svg";
const PAUSE_ICON: &str = "./assets/imgs/pause.svg";
const TITLE_PREFIX: &str = "Now playing: ";

/// Icon shown on the play/pause button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayButton {
    /// Playback is stopped; the button offers to play.
    Play,
    /// Playback is running; the button offers to pause.
    Pause,
}

impl PlayButton {
    /// Widget-relative path of the icon.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Play => PLAY_ICON,
            Self::Pause => PAUSE_ICON,
        }
    }
}

/// Position report used to drive the progress bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUpdate {
    pub current_time: f64,
    pub duration: f64,
}

/// Owns the media element and the audio graph and keeps the button states
/// in step with them.
#[derive(Debug)]
pub struct TransportController<M> {
    media: M,
    graph: AudioGraph,
    config: TransportConfig,
    play_button: PlayButton,
    loop_enabled: bool,
    grabbed: bool,
    title_label: String,
}

impl<M: MediaElement> TransportController<M> {
    /// Creates a paused transport over `media` and `graph`.
    pub fn new(media: M, graph: AudioGraph, config: TransportConfig) -> Self {
        let loop_enabled = media.looping();
        Self {
            media,
            graph,
            config,
            play_button: PlayButton::Play,
            loop_enabled,
            grabbed: false,
            title_label: String::new(),
        }
    }

    /// Returns the media element.
    pub fn media(&self) -> &M {
        &self.media
    }

    /// Returns the audio graph.
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// Returns the audio graph mutably.
    pub fn graph_mut(&mut self) -> &mut AudioGraph {
        &mut self.graph
    }

    /// Returns the state of the play/pause button.
    pub fn play_button(&self) -> PlayButton {
        self.play_button
    }

    /// Whether the loop button shows its "enabled" state.
    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    /// Returns the `Now playing:` label.
    pub fn title_label(&self) -> &str {
        &self.title_label
    }

    /// Whether the media is playing.
    pub fn is_playing(&self) -> bool {
        !self.media.paused()
    }

    /// Starts the media and resumes the audio context.
    pub fn play(&mut self) -> Result<()> {
        self.media.play();
        self.graph.context_mut().resume()?;
        self.play_button = PlayButton::Pause;
        tracing::debug!(src = self.media.src(), "playback started");
        Ok(())
    }

    /// Pauses the media. The context is resumed or suspended depending on the
    /// configured pause behaviour.
    pub fn pause(&mut self) -> Result<()> {
        self.media.pause();
        match self.config.pause_behavior {
            PauseBehavior::ResumeContext => self.graph.context_mut().resume()?,
            PauseBehavior::SuspendContext => self.graph.context_mut().suspend()?,
        }
        self.play_button = PlayButton::Play;
        tracing::debug!(position = self.media.current_time(), "playback paused");
        Ok(())
    }

    /// Plays when paused, pauses when playing.
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.media.paused() {
            self.play()
        } else {
            self.pause()
        }
    }

    /// Pauses and rewinds to the start.
    pub fn restart(&mut self) -> Result<()> {
        self.pause()?;
        self.media.set_current_time(0.0);
        Ok(())
    }

    /// Flips looping on the media and the loop button.
    pub fn toggle_loop(&mut self) {
        let looping = !self.media.looping();
        self.media.set_looping(looping);
        self.loop_enabled = looping;
    }

    /// Marks whether the seek bar is held down. Seeking only happens while it
    /// is.
    pub fn set_grabbed(&mut self, grabbed: bool) {
        self.grabbed = grabbed;
    }

    /// Whether the seek bar is held down.
    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    /// Moves to `fraction` of the duration while the bar is grabbed. Returns
    /// whether the position changed.
    pub fn seek(&mut self, fraction: f64) -> bool {
        if !self.grabbed {
            return false;
        }
        let position = fraction * self.media.duration();
        self.media.set_current_time(position);
        true
    }

    /// Moves forward by the skip amount, stopping at the end.
    pub fn skip_forward(&mut self) {
        let target = (self.media.current_time() + self.config.skip_seconds).min(self.media.duration());
        self.media.set_current_time(target);
    }

    /// Moves backward by the skip amount, stopping at the start.
    pub fn skip_backward(&mut self) {
        let target = (self.media.current_time() - self.config.skip_seconds).max(0.0);
        self.media.set_current_time(target);
    }

    /// Assigned as given; the volume control keeps it in range.
    pub fn set_volume(&mut self, volume: f32) {
        self.media.set_volume(volume);
    }

    /// Assigned as given; the balance control keeps it in range.
    pub fn set_balance(&mut self, balance: f32) {
        self.graph.set_pan(balance);
    }

    /// Sets the gain of one equaliser band.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> Result<()> {
        self.graph.set_band_gain(index, gain_db)
    }

    /// Rewrites the title label.
    pub fn set_title(&mut self, title: &str) {
        self.title_label = format!("{TITLE_PREFIX}{title}");
    }

    /// Switches the source. A player that was playing keeps playing the new
    /// source.
    pub fn set_source(&mut self, url: &str) -> Result<()> {
        let was_playing = self.is_playing();
        self.media.set_src(url);
        tracing::info!(url, was_playing, "source changed");
        if was_playing {
            self.play()?;
        }
        Ok(())
    }

    /// Pulls one block of audio and handles the end of the source.
    pub fn render(&mut self, out: &mut [f32]) -> Result<usize> {
        let frames = self.graph.render(&mut self.media, out);
        if self.media.take_ended() {
            tracing::debug!(src = self.media.src(), "source ended");
            self.pause()?;
        }
        Ok(frames)
    }

    /// Returns the current position and duration.
    pub fn time_update(&self) -> TimeUpdate {
        TimeUpdate {
            current_time: self.media.current_time(),
            duration: self.media.duration(),
        }
    }
}
