//! Spectrum bars and the intensity meter.

use crate::{
    graph::{AnalysisBuffer, AudioGraph},
    scheduler::{FrameStatus, StopHandle},
    Result,
};

/// Magnitude that maps to the full surface height.
const FULL_SCALE: f32 = 128.0;
const BASE_CHANNEL: u8 = 50;

/// Opaque colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Creates a colour from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Axis-aligned rectangle in surface pixels, origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 2D raster target of the visualizer.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Rgb);
}

/// Side display showing a 0-100 loudness value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntensityMeter {
    value: f32,
}

impl IntensityMeter {
    /// Returns the meter reading.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Sets the meter reading.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }
}

/// Colour of a bar for a given bin magnitude.
pub fn bar_color(magnitude: u8) -> Rgb {
    Rgb::new(BASE_CHANNEL, BASE_CHANNEL, BASE_CHANNEL.saturating_add(magnitude))
}

/// Clears `surface` and draws one bottom-anchored bar per bin. Returns the
/// mean magnitude normalised to 0-100.
pub fn draw_bars<S: Surface + ?Sized>(surface: &mut S, bins: &[u8]) -> f32 {
    surface.clear();
    if bins.is_empty() {
        return 0.0;
    }

    let width = surface.width() as f32;
    let height = surface.height() as f32;
    let bar_width = width / bins.len() as f32;
    let height_scale = height / FULL_SCALE;

    let mut total = 0.0_f32;
    for (index, &magnitude) in bins.iter().enumerate() {
        total += f32::from(magnitude);

        let bar_height = f32::from(magnitude) * height_scale / 2.0;
        surface.fill_rect(
            Rect {
                x: index as f32 * (bar_width + 1.0),
                y: height - bar_height,
                width: bar_width,
                height: bar_height,
            },
            bar_color(magnitude),
        );
    }

    let mean = total / bins.len() as f32;
    mean / FULL_SCALE * 100.0
}

/// Per-frame visualizer task. The host invokes [`Self::tick`] once per display
/// frame until it reports [`FrameStatus::Cancelled`].
#[derive(Debug)]
pub struct VisualizerLoop {
    buffer: AnalysisBuffer,
    stop: StopHandle,
    frames: u64,
}

impl VisualizerLoop {
    /// Creates a loop drawing `bin_count` bins.
    pub fn new(bin_count: usize) -> Self {
        Self {
            buffer: AnalysisBuffer::new(bin_count),
            stop: StopHandle::new(),
            frames: 0,
        }
    }

    /// Creates a loop sized for the analyser of `graph`.
    pub fn for_graph(graph: &AudioGraph) -> Self {
        Self::new(graph.frequency_bin_count())
    }

    /// Returns a handle that stops the loop.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Returns the number of frames drawn.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Bins of the most recent frame.
    pub fn bins(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Draws one frame from the analyser of `graph` and updates `meter`. Does
    /// nothing once the loop is stopped.
    pub fn tick<S: Surface + ?Sized>(
        &mut self,
        graph: &mut AudioGraph,
        surface: &mut S,
        meter: &mut IntensityMeter,
    ) -> Result<FrameStatus> {
        if self.stop.is_cancelled() {
            return Ok(FrameStatus::Cancelled);
        }

        graph.sample_frequencies(&mut self.buffer)?;
        let intensity = draw_bars(surface, self.buffer.as_slice());
        meter.set_value(intensity);
        self.frames += 1;

        Ok(FrameStatus::Scheduled)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        config::GraphConfig,
        graph::AudioContext,
        media::{BufferedMedia, MediaElement, PcmClip},
    };

    #[derive(Default)]
    struct RecordingSurface {
        clears: usize,
        rects: Vec<(Rect, Rgb)>,
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> u32 {
            128
        }

        fn height(&self) -> u32 {
            64
        }

        fn clear(&mut self) {
            self.clears += 1;
            self.rects.clear();
        }

        fn fill_rect(&mut self, rect: Rect, color: Rgb) {
            self.rects.push((rect, color));
        }
    }

    #[test]
    fn bars_are_bottom_anchored_in_the_lower_half() {
        let mut surface = RecordingSurface::default();
        let intensity = draw_bars(&mut surface, &[128, 0, 64, 255]);

        assert_eq!(surface.clears, 1);
        assert_eq!(surface.rects.len(), 4);

        let (first, color) = surface.rects[0];
        assert_eq!(first.x, 0.0);
        assert_eq!(first.width, 32.0);
        assert_eq!(first.height, 32.0);
        assert_eq!(first.y + first.height, 64.0);
        assert_eq!(color, Rgb::new(50, 50, 178));

        let (second, _) = surface.rects[1];
        assert_eq!(second.x, 33.0);
        assert_eq!(second.height, 0.0);

        assert_eq!(surface.rects[3].1.b, 255);
        assert!((intensity - (447.0 / 4.0) / 128.0 * 100.0).abs() < 1e-4);
    }

    #[test]
    fn silent_buffer_has_zero_intensity() {
        let mut surface = RecordingSurface::default();
        assert_eq!(draw_bars(&mut surface, &[0; 128]), 0.0);
    }

    #[test]
    fn cancelled_loop_does_not_draw() {
        let mut clips = HashMap::new();
        clips.insert("a".to_string(), PcmClip::new(vec![0.0; 64], 1, 44_100).unwrap());
        let mut media = BufferedMedia::new(clips, 44_100);
        media.set_src("a");
        let mut graph =
            AudioGraph::build(AudioContext::new(44_100), &media, &GraphConfig::default()).unwrap();

        let mut visualizer = VisualizerLoop::for_graph(&graph);
        let mut surface = RecordingSurface::default();
        let mut meter = IntensityMeter::default();

        let status = visualizer.tick(&mut graph, &mut surface, &mut meter).unwrap();
        assert_eq!(status, FrameStatus::Scheduled);
        assert_eq!(surface.rects.len(), 128);
        assert_eq!(meter.value(), 0.0);

        visualizer.stop_handle().cancel();
        let status = visualizer.tick(&mut graph, &mut surface, &mut meter).unwrap();
        assert_eq!(status, FrameStatus::Cancelled);
        assert_eq!(surface.clears, 1);
        assert_eq!(visualizer.frames(), 1);
    }
}
