//! The audio player widget.
//!
//! Attributes (`url`, `title`) may arrive before the player is connected;
//! they are held and applied when [`AudioPlayer::connect`] builds the audio
//! graph. After that every control goes through the transport controller.

use std::{fmt, sync::Arc};

use crate::{
    config::AppConfig,
    graph::{AudioContext, AudioGraph},
    progress::{BoundingBox, PointerEvent, ProgressBar, CURRENT_TIME, END_TIME, START_TIME},
    scheduler::{FrameStatus, StopHandle},
    template::Template,
    transport::TransportController,
    visualizer::{IntensityMeter, Surface, VisualizerLoop},
    widget::{Attributes, Lifecycle, Phase, Widget},
    media::MediaElement,
    Result, WidgetError,
};

/// Callback fired by the next and previous song buttons.
pub type NavigationHook = Box<dyn FnMut()>;

/// Audio player widget with equaliser, balance, volume, seek bar and
/// spectrum visualizer.
pub struct AudioPlayer<M> {
    template: Arc<Template>,
    config: AppConfig,
    lifecycle: Lifecycle,
    attributes: Attributes,
    pending_media: Option<M>,
    transport: Option<TransportController<M>>,
    visualizer: Option<VisualizerLoop>,
    progress: ProgressBar,
    meter: IntensityMeter,
    on_next_song: Option<NavigationHook>,
    on_previous_song: Option<NavigationHook>,
}

impl<M: MediaElement> AudioPlayer<M> {
    /// Creates an unconnected player. `media` is handed to the audio graph on
    /// [`AudioPlayer::connect`].
    pub fn new(
        template: Arc<Template>,
        progress_template: Arc<Template>,
        media: M,
        config: AppConfig,
    ) -> Self {
        Self {
            template,
            config,
            lifecycle: Lifecycle::new(),
            attributes: Attributes::new(),
            pending_media: Some(media),
            transport: None,
            visualizer: None,
            progress: ProgressBar::new(progress_template, Attributes::new()),
            meter: IntensityMeter::default(),
            on_next_song: None,
            on_previous_song: None,
        }
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Returns the embedded seek bar.
    pub fn progress(&self) -> &ProgressBar {
        &self.progress
    }

    /// Returns the transport once the player is connected.
    pub fn transport(&self) -> Option<&TransportController<M>> {
        self.transport.as_ref()
    }

    /// Latest value of the intensity meter, 0-100.
    pub fn intensity(&self) -> f32 {
        self.meter.value()
    }

    /// Bins drawn on the latest frame.
    pub fn spectrum(&self) -> &[u8] {
        self.visualizer
            .as_ref()
            .map(VisualizerLoop::bins)
            .unwrap_or(&[])
    }

    /// Returns the `Now playing:` label.
    pub fn title_label(&self) -> &str {
        self.transport
            .as_ref()
            .map(TransportController::title_label)
            .unwrap_or("")
    }

    /// Resolved path of the icon on the play/pause button.
    pub fn play_icon(&self) -> String {
        let button = self
            .transport
            .as_ref()
            .map(TransportController::play_button)
            .unwrap_or(crate::transport::PlayButton::Play);
        self.template.resolve(button.icon())
    }

    /// Whether the loop button shows its enabled state.
    pub fn loop_enabled(&self) -> bool {
        self.transport
            .as_ref()
            .map(TransportController::loop_enabled)
            .unwrap_or(false)
    }

    /// Registers the callback of the next song button.
    pub fn set_on_next_song(&mut self, hook: NavigationHook) {
        self.on_next_song = Some(hook);
    }

    pub fn set_on_previous_song(&mut self, hook: NavigationHook) {
        self.on_previous_song = Some(hook);
    }

    /// Builds the audio graph, applies held attributes and starts the
    /// visualizer. The returned handle stops the visualizer.
    pub fn connect(&mut self) -> Result<StopHandle> {
        self.lifecycle.activate()?;

        let mut media = self
            .pending_media
            .take()
            .ok_or_else(|| WidgetError::msg("player media has already been consumed"))?;
        if let Some(url) = self.attributes.get("url") {
            media.set_src(url);
        }

        let context = AudioContext::new(self.config.graph.sample_rate);
        let graph = AudioGraph::build(context, &media, &self.config.graph)?;
        let visualizer = VisualizerLoop::for_graph(&graph);
        let stop = visualizer.stop_handle();

        let mut transport = TransportController::new(media, graph, self.config.transport.clone());
        if let Some(title) = self.attributes.get("title") {
            transport.set_title(title);
        }

        self.transport = Some(transport);
        self.visualizer = Some(visualizer);
        tracing::info!(tag = self.template.kind.tag_name(), "player connected");
        Ok(stop)
    }

    /// Stops the visualizer and closes the audio context.
    pub fn dispose(&mut self) {
        if !self.lifecycle.dispose() {
            return;
        }
        if let Some(visualizer) = &self.visualizer {
            visualizer.stop_handle().cancel();
        }
        if let Some(transport) = self.transport.as_mut() {
            transport.graph_mut().context_mut().close();
        }
        tracing::info!("player disposed");
    }

    /// Pulls one block of stereo audio for the host output and forwards the
    /// new position to the progress bar.
    pub fn render_audio(&mut self, out: &mut [f32]) -> Result<usize> {
        let transport = self.active_transport()?;
        let frames = transport.render(out)?;
        let update = transport.time_update();

        self.progress
            .set_attribute(CURRENT_TIME, &update.current_time.to_string())?;
        self.progress.set_attribute(START_TIME, "0")?;
        self.progress
            .set_attribute(END_TIME, &update.duration.to_string())?;
        Ok(frames)
    }

    /// Runs one visualizer frame.
    pub fn animation_frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<FrameStatus> {
        if !self.lifecycle.is_active() {
            return Ok(FrameStatus::Cancelled);
        }
        match (self.visualizer.as_mut(), self.transport.as_mut()) {
            (Some(visualizer), Some(transport)) => {
                visualizer.tick(transport.graph_mut(), surface, &mut self.meter)
            }
            _ => Ok(FrameStatus::Cancelled),
        }
    }

    /// Play/pause button.
    pub fn toggle_play(&mut self) -> Result<()> {
        self.active_transport()?.toggle_play()
    }

    /// Stop button: pause and rewind.
    pub fn stop(&mut self) -> Result<()> {
        self.active_transport()?.restart()
    }

    /// Loop button.
    pub fn toggle_loop(&mut self) -> Result<()> {
        self.active_transport()?.toggle_loop();
        Ok(())
    }

    /// Skips forward by the configured amount.
    pub fn forward(&mut self) -> Result<()> {
        self.active_transport()?.skip_forward();
        Ok(())
    }

    /// Skips backward by the configured amount.
    pub fn backward(&mut self) -> Result<()> {
        self.active_transport()?.skip_backward();
        Ok(())
    }

    /// Next song button. Fires the registered hook, if any.
    pub fn next_song(&mut self) {
        if let Some(hook) = self.on_next_song.as_mut() {
            hook();
        }
    }

    pub fn previous_song(&mut self) {
        if let Some(hook) = self.on_previous_song.as_mut() {
            hook();
        }
    }

    /// Volume slider input.
    pub fn volume_input(&mut self, value: f32) -> Result<()> {
        self.active_transport()?.set_volume(value);
        Ok(())
    }

    /// Balance knob input.
    pub fn balance_input(&mut self, value: f32) -> Result<()> {
        self.active_transport()?.set_balance(value);
        Ok(())
    }

    /// Gain slider input for equaliser band `band`.
    pub fn gain_input(&mut self, band: usize, gain_db: f32) -> Result<()> {
        self.active_transport()?.set_band_gain(band, gain_db)
    }

    /// Pointer pressed on the seek bar: grabs it and seeks.
    pub fn bar_pointer_down(&mut self, event: PointerEvent, bounds: BoundingBox) -> Result<()> {
        let bar_move = self.progress.pointer_down(event, bounds);
        let transport = self.active_transport()?;
        transport.set_grabbed(bar_move.pressed);
        transport.seek(bar_move.fraction);
        Ok(())
    }

    /// Pointer moved over the seek bar. Seeks only while grabbed.
    pub fn bar_pointer_move(&mut self, event: PointerEvent, bounds: BoundingBox) -> Result<()> {
        let bar_move = self.progress.pointer_move(event, bounds);
        let transport = self.active_transport()?;
        transport.set_grabbed(bar_move.pressed);
        transport.seek(bar_move.fraction);
        Ok(())
    }

    /// Pointer released: the seek bar lets go.
    pub fn bar_pointer_up(&mut self) {
        self.progress.pointer_up();
        if let Some(transport) = self.transport.as_mut() {
            transport.set_grabbed(false);
        }
    }

    fn active_transport(&mut self) -> Result<&mut TransportController<M>> {
        self.lifecycle.ensure_active()?;
        self.transport
            .as_mut()
            .ok_or(WidgetError::InvalidTransition {
                from: self.lifecycle.phase(),
                to: Phase::Active,
            })
    }
}

impl<M: MediaElement> Widget for AudioPlayer<M> {
    const OBSERVED: &'static [&'static str] = &["url", "title"];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    fn attribute_changed(&mut self, name: &str, _old: Option<&str>, new: Option<&str>) -> Result<()> {
        self.lifecycle.configure()?;
        let (Some(transport), Some(value)) = (self.transport.as_mut(), new) else {
            return Ok(());
        };
        match name {
            "title" => transport.set_title(value),
            "url" => transport.set_source(value)?,
            _ => {}
        }
        Ok(())
    }
}

impl<M> fmt::Debug for AudioPlayer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPlayer")
            .field("phase", &self.lifecycle.phase())
            .field("attributes", &self.attributes)
            .field("progress", &self.progress)
            .field("intensity", &self.meter.value())
            .finish()
    }
}
