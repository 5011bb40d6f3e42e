//! Seek bar showing elapsed and total time.

mod style;
mod time;

use std::{fmt, sync::Arc};

pub use style::{BarStyleRules, StyleRule, StyleSection};
pub use time::{format_time, parse_leading_int};

use crate::{
    template::Template,
    widget::{Attributes, Widget},
    Result,
};

/// Observed attribute holding the start of the track in seconds.
pub const START_TIME: &str = "start-time";
/// Observed attribute holding the duration in seconds.
pub const END_TIME: &str = "end-time";
/// Observed attribute holding the playback position in seconds.
pub const CURRENT_TIME: &str = "current-time";

/// Pointer position in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerEvent {
    pub fn at(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }
}

/// Screen rectangle of the bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// What a pointer press or drag on the bar amounts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarMove {
    /// Position along the bar, within [0, 1].
    pub fraction: f64,
    pub pressed: bool,
}

/// Receives every press and drag on the bar with the pressed flag.
pub type BarMoveHook = Box<dyn FnMut(&PointerEvent, &BoundingBox, bool)>;

/// Maps a pointer position to a fraction of the bar, clamped to [0, 1].
pub fn seek_fraction(event: &PointerEvent, bounds: &BoundingBox) -> f64 {
    if bounds.width <= 0.0 {
        return 0.0;
    }
    let fraction = (event.client_x - bounds.left) / bounds.width;
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Seek bar widget.
pub struct ProgressBar {
    template: Arc<Template>,
    attributes: Attributes,
    style: BarStyleRules,
    start_time: f64,
    end_time: f64,
    current_time: f64,
    width: String,
    start_label: String,
    end_label: String,
    pressed: bool,
    on_bar_move: Option<BarMoveHook>,
}

impl ProgressBar {
    /// Builds the bar from its initial attributes. Style options are resolved
    /// here and never recomputed.
    pub fn new(template: Arc<Template>, attributes: Attributes) -> Self {
        let style = BarStyleRules::from_attributes(&attributes);
        let mut bar = Self {
            template,
            style,
            start_time: number_attribute(&attributes, START_TIME),
            end_time: number_attribute(&attributes, END_TIME),
            current_time: number_attribute(&attributes, CURRENT_TIME),
            attributes,
            width: String::new(),
            start_label: String::new(),
            end_label: String::new(),
            pressed: false,
            on_bar_move: None,
        };
        bar.refresh();
        bar
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Returns the resolved style rules.
    pub fn style(&self) -> &BarStyleRules {
        &self.style
    }

    /// Template markup followed by the style sheet generated from the
    /// style attributes.
    pub fn markup(&self) -> String {
        format!("{}<style>{}</style>", self.template.markup, self.style.to_css())
    }

    /// Registers the callback fired on pointer press and drag.
    pub fn set_on_bar_move(&mut self, hook: BarMoveHook) {
        self.on_bar_move = Some(hook);
    }

    /// Filled share of the bar within [0, 1].
    pub fn percentage(&self) -> f64 {
        let ratio = self.current_time / self.end_time - self.start_time;
        if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Width of the filled part, e.g. `25%`.
    pub fn width(&self) -> &str {
        &self.width
    }

    /// Returns the elapsed time label, `mm:ss`.
    pub fn start_label(&self) -> &str {
        &self.start_label
    }

    /// Returns the duration label, `mm:ss`.
    pub fn end_label(&self) -> &str {
        &self.end_label
    }

    /// Whether the pointer is held down on the bar.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Pointer pressed on the bar.
    pub fn pointer_down(&mut self, event: PointerEvent, bounds: BoundingBox) -> BarMove {
        self.pressed = true;
        self.report(event, bounds)
    }

    /// Pointer moved over the bar, pressed or not.
    pub fn pointer_move(&mut self, event: PointerEvent, bounds: BoundingBox) -> BarMove {
        self.report(event, bounds)
    }

    /// Pointer released anywhere.
    pub fn pointer_up(&mut self) {
        self.pressed = false;
    }

    fn report(&mut self, event: PointerEvent, bounds: BoundingBox) -> BarMove {
        if let Some(hook) = self.on_bar_move.as_mut() {
            hook(&event, &bounds, self.pressed);
        }
        BarMove {
            fraction: seek_fraction(&event, &bounds),
            pressed: self.pressed,
        }
    }

    fn refresh(&mut self) {
        // halves round up, never to even
        self.width = format!("{:.0}%", (self.percentage() * 100.0).round());
        self.start_label = format_time(self.attributes.get(CURRENT_TIME).unwrap_or("0"));
        self.end_label = format_time(self.attributes.get(END_TIME).unwrap_or("0"));
    }
}

impl Widget for ProgressBar {
    const OBSERVED: &'static [&'static str] = &[START_TIME, END_TIME, CURRENT_TIME];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    fn attribute_changed(&mut self, name: &str, _old: Option<&str>, new: Option<&str>) -> Result<()> {
        let value = new.map(parse_number).unwrap_or(0.0);
        match name {
            START_TIME => self.start_time = value,
            END_TIME => self.end_time = value,
            CURRENT_TIME => self.current_time = value,
            _ => {}
        }
        self.refresh();
        Ok(())
    }
}

impl fmt::Debug for ProgressBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressBar")
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("current_time", &self.current_time)
            .field("width", &self.width)
            .field("pressed", &self.pressed)
            .finish()
    }
}

fn number_attribute(attributes: &Attributes, name: &str) -> f64 {
    attributes.get(name).map(parse_number).unwrap_or(0.0)
}

fn parse_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::PathBuf, rc::Rc};

    use super::*;
    use crate::template::ComponentKind;

    fn template() -> Arc<Template> {
        Arc::new(Template {
            kind: ComponentKind::ProgressBar,
            base: PathBuf::from("progress_bar"),
            markup: String::new(),
        })
    }

    fn bar() -> ProgressBar {
        ProgressBar::new(template(), Attributes::new())
    }

    fn bounds() -> BoundingBox {
        BoundingBox {
            left: 100.0,
            top: 0.0,
            width: 200.0,
            height: 20.0,
        }
    }

    #[test]
    fn quarter_of_the_track_is_a_quarter_of_the_bar() {
        let mut bar = bar();
        bar.set_attribute(START_TIME, "0").unwrap();
        bar.set_attribute(END_TIME, "200").unwrap();
        bar.set_attribute(CURRENT_TIME, "50").unwrap();

        assert_eq!(bar.percentage(), 0.25);
        assert_eq!(bar.width(), "25%");
        assert_eq!(bar.start_label(), "00:50");
        assert_eq!(bar.end_label(), "03:20");
    }

    #[test]
    fn half_percent_ties_round_up() {
        let mut bar = bar();
        bar.set_attribute(END_TIME, "8").unwrap();
        bar.set_attribute(CURRENT_TIME, "1").unwrap();

        assert_eq!(bar.percentage(), 0.125);
        assert_eq!(bar.width(), "13%");

        bar.set_attribute(CURRENT_TIME, "3").unwrap();
        assert_eq!(bar.width(), "38%");
    }

    #[test]
    fn markup_carries_the_generated_style_sheet() {
        let template = Arc::new(Template {
            kind: ComponentKind::ProgressBar,
            base: PathBuf::from("progress_bar"),
            markup: "<div id=\"emptyBar\"></div>".to_string(),
        });
        let attributes: Attributes = [("dot-color", "#F00")].into_iter().collect();
        let bar = ProgressBar::new(template, attributes);

        let markup = bar.markup();
        assert!(markup.starts_with("<div id=\"emptyBar\"></div><style>#container {"));
        assert!(markup.contains("background-color: #F00"));
        assert!(markup.ends_with("}</style>"));
    }

    #[test]
    fn percentage_is_monotonic_and_bounded() {
        let mut bar = bar();
        bar.set_attribute(END_TIME, "90").unwrap();

        let mut previous = 0.0;
        for current in (0..=120).step_by(5) {
            bar.set_attribute(CURRENT_TIME, &current.to_string()).unwrap();
            let p = bar.percentage();
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= previous);
            previous = p;
        }
        assert_eq!(bar.width(), "100%");
    }

    #[test]
    fn zero_length_track_shows_an_empty_bar() {
        let mut bar = bar();
        bar.set_attribute(CURRENT_TIME, "12").unwrap();
        assert_eq!(bar.percentage(), 0.0);
        assert_eq!(bar.width(), "0%");

        bar.set_attribute(END_TIME, "garbage").unwrap();
        assert_eq!(bar.percentage(), 0.0);
    }

    #[test]
    fn initial_attributes_are_applied() {
        let attributes: Attributes = [(END_TIME, "100"), (CURRENT_TIME, "40"), ("width", "300px")]
            .into_iter()
            .collect();
        let bar = ProgressBar::new(template(), attributes);

        assert_eq!(bar.width(), "40%");
        assert_eq!(bar.style().value(StyleSection::EmptyBar, "width"), Some("300px"));
    }

    #[test]
    fn drag_reports_follow_the_pressed_flag() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut bar = bar();
        bar.set_on_bar_move(Box::new(move |event, _, pressed| {
            sink.borrow_mut().push((event.client_x, pressed));
        }));

        let hover = bar.pointer_move(PointerEvent::at(150.0, 5.0), bounds());
        assert!(!hover.pressed);

        let down = bar.pointer_down(PointerEvent::at(200.0, 5.0), bounds());
        assert_eq!(down, BarMove { fraction: 0.5, pressed: true });

        let drag = bar.pointer_move(PointerEvent::at(400.0, 5.0), bounds());
        assert_eq!(drag.fraction, 1.0);

        bar.pointer_up();
        assert!(!bar.is_pressed());
        assert_eq!(
            *seen.borrow(),
            vec![(150.0, false), (200.0, true), (400.0, true)]
        );
    }

    #[test]
    fn fractions_are_clamped_to_the_bar() {
        assert_eq!(seek_fraction(&PointerEvent::at(50.0, 0.0), &bounds()), 0.0);
        assert_eq!(seek_fraction(&PointerEvent::at(350.0, 0.0), &bounds()), 1.0);
        assert_eq!(seek_fraction(&PointerEvent::at(150.0, 0.0), &bounds()), 0.25);
    }
}
