//! Core library for the audio widgets: an audio player with equalizer and
//! spectrum visualizer, a seek bar, and a playlist selector.
//!
//! The host environment is represented by traits. It supplies template
//! resources ([`ResourceFetcher`]), decoded media ([`MediaElement`]), a
//! drawing surface ([`Surface`]), and it calls the per-frame entry points of
//! the player.

pub mod config;
pub mod error;
pub mod graph;
pub mod media;
pub mod player;
pub mod playlist;
pub mod progress;
pub mod scheduler;
pub mod template;
pub mod transport;
pub mod visualizer;
pub mod widget;

pub use config::{AppConfig, GraphConfig, PauseBehavior, TransportConfig, VisualizerConfig};
pub use error::{Result, WidgetError};
pub use graph::{AnalysisBuffer, AudioContext, AudioGraph, ContextState};
pub use media::{BufferedMedia, ClipResolver, MediaElement, PcmClip};
pub use player::AudioPlayer;
pub use playlist::{Playlist, PlaylistEntry};
pub use progress::{format_time, BoundingBox, PointerEvent, ProgressBar};
pub use scheduler::{FrameClock, FrameStatus, StopHandle};
pub use template::{
    ComponentKind, FsFetcher, MemoryFetcher, ResourceFetcher, Template, TemplateCache,
    TemplateLoader,
};
pub use transport::{PlayButton, TimeUpdate, TransportController};
pub use visualizer::{IntensityMeter, Rect, Rgb, Surface, VisualizerLoop};
pub use widget::{Attributes, Lifecycle, Phase, Widget};
