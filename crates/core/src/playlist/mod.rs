//! Single-selection list of tracks.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    template::{resolve_relative, ResourceFetcher, Template},
    widget::{Attributes, Lifecycle, Widget},
    Result, WidgetError,
};

/// File listing the entries, next to the playlist template.
pub const MANIFEST_FILE: &str = "playlist.json";

/// One selectable track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub title: String,
    pub url: String,
}

impl PlaylistEntry {
    /// Creates an entry from a display title and a media URL.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    current: usize,
    entries: Vec<PlaylistEntry>,
}

/// Receives `(title, url)` of the newly selected entry.
pub type ChangeHook = Box<dyn FnMut(&str, &str)>;
/// Fired once the playlist is connected.
pub type ReadyHook = Box<dyn FnMut()>;

/// Playlist selector widget.
pub struct Playlist {
    template: Arc<Template>,
    lifecycle: Lifecycle,
    attributes: Attributes,
    entries: Vec<PlaylistEntry>,
    current: usize,
    on_current_change: Option<ChangeHook>,
    on_bind_ready: Option<ReadyHook>,
}

impl Playlist {
    /// Creates a playlist over `entries` with `current` selected. The list must
    /// not be empty and `current` must address an entry.
    pub fn new(template: Arc<Template>, entries: Vec<PlaylistEntry>, current: usize) -> Result<Self> {
        if entries.is_empty() {
            return Err(WidgetError::InvalidInput("a playlist needs at least one entry"));
        }
        if current >= entries.len() {
            return Err(WidgetError::OutOfRange {
                index: current,
                len: entries.len(),
            });
        }

        Ok(Self {
            template,
            lifecycle: Lifecycle::new(),
            attributes: Attributes::new(),
            entries,
            current,
            on_current_change: None,
            on_bind_ready: None,
        })
    }

    /// Reads `playlist.json` next to the template. Relative entry URLs are
    /// resolved against the template base.
    pub fn load<F: ResourceFetcher>(template: Arc<Template>, fetcher: &F) -> Result<Self> {
        let text = fetcher.fetch(&template.base.join(MANIFEST_FILE))?;
        let manifest: Manifest = serde_json::from_str(&text)?;
        let entries = manifest
            .entries
            .into_iter()
            .map(|entry| PlaylistEntry {
                url: resolve_relative(&template.base, &entry.url),
                title: entry.title,
            })
            .collect();

        Self::new(template, entries, manifest.current)
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Registers the callback fired on every selection change.
    pub fn set_on_current_change(&mut self, hook: ChangeHook) {
        self.on_current_change = Some(hook);
    }

    /// Registers the callback fired by [`Playlist::connect`].
    pub fn set_on_bind_ready(&mut self, hook: ReadyHook) {
        self.on_bind_ready = Some(hook);
    }

    /// Returns every entry in display order.
    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    /// Returns the index of the selected entry.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Returns the selected entry.
    pub fn current(&self) -> &PlaylistEntry {
        &self.entries[self.current]
    }

    /// Title attribute published for the selected entry.
    pub fn title(&self) -> Option<&str> {
        self.attributes.get("title")
    }

    /// URL attribute published for the selected entry.
    pub fn url(&self) -> Option<&str> {
        self.attributes.get("url")
    }

    /// Publishes the initial selection and signals readiness.
    pub fn connect(&mut self) -> Result<()> {
        self.lifecycle.activate()?;
        self.publish_current();
        if let Some(hook) = self.on_bind_ready.as_mut() {
            hook();
        }
        Ok(())
    }

    /// Detaches the playlist. Repeated calls are harmless.
    pub fn dispose(&mut self) {
        self.lifecycle.dispose();
    }

    /// Moves to the following entry. Returns `false` at the end of the list.
    pub fn next(&mut self) -> bool {
        if self.current + 1 >= self.entries.len() {
            return false;
        }
        self.current += 1;
        self.publish_current();
        true
    }

    /// Moves to the preceding entry. Returns `false` at the start of the list.
    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        self.publish_current();
        true
    }

    /// Direct selection, e.g. a click on an entry. Selecting the current
    /// entry does nothing.
    pub fn select(&mut self, index: usize) -> Result<bool> {
        if index >= self.entries.len() {
            return Err(WidgetError::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        if index == self.current {
            return Ok(false);
        }
        self.current = index;
        self.publish_current();
        Ok(true)
    }

    fn publish_current(&mut self) {
        let PlaylistEntry { title, url } = self.entries[self.current].clone();
        tracing::debug!(index = self.current, %title, "playlist selection changed");

        if let Some(hook) = self.on_current_change.as_mut() {
            hook(&title, &url);
        }
        self.attributes.set("title", title);
        self.attributes.set("url", url);
    }
}

impl Widget for Playlist {
    const OBSERVED: &'static [&'static str] = &["next", "previous"];

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// `next` and `previous` act as one-shot triggers and remove themselves.
    fn attribute_changed(&mut self, name: &str, _old: Option<&str>, new: Option<&str>) -> Result<()> {
        if new.is_none() {
            return Ok(());
        }
        match name {
            "next" => {
                self.attributes.remove("next");
                self.next();
            }
            "previous" => {
                self.attributes.remove("previous");
                self.previous();
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Debug for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Playlist")
            .field("entries", &self.entries)
            .field("current", &self.current)
            .field("phase", &self.lifecycle.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::PathBuf, rc::Rc};

    use super::*;
    use crate::template::{ComponentKind, MemoryFetcher};

    type Log = Rc<RefCell<Vec<(String, String)>>>;

    fn template() -> Arc<Template> {
        Arc::new(Template {
            kind: ComponentKind::Playlist,
            base: PathBuf::from("widgets/playlist"),
            markup: String::new(),
        })
    }

    fn abc() -> (Playlist, Log) {
        let entries = vec![
            PlaylistEntry::new("A", "a.wav"),
            PlaylistEntry::new("B", "b.wav"),
            PlaylistEntry::new("C", "c.wav"),
        ];
        let mut playlist = Playlist::new(template(), entries, 0).unwrap();

        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        playlist.set_on_current_change(Box::new(move |title, url| {
            sink.borrow_mut().push((title.to_string(), url.to_string()));
        }));
        (playlist, log)
    }

    #[test]
    fn next_walks_forward_and_stops_at_the_end() {
        let (mut playlist, log) = abc();

        assert!(playlist.next());
        assert_eq!(playlist.current().title, "B");
        assert_eq!(*log.borrow(), vec![("B".to_string(), "b.wav".to_string())]);

        assert!(playlist.next());
        assert!(!playlist.next());
        assert!(!playlist.next());
        assert_eq!(playlist.current().title, "C");
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(playlist.title(), Some("C"));
        assert_eq!(playlist.url(), Some("c.wav"));
    }

    #[test]
    fn previous_is_a_no_op_on_the_first_entry() {
        let (mut playlist, log) = abc();
        assert!(!playlist.previous());
        assert!(log.borrow().is_empty());
        assert_eq!(playlist.title(), None);
    }

    #[test]
    fn trigger_attributes_move_once_and_disappear() {
        let (mut playlist, log) = abc();

        playlist.set_attribute("next", "").unwrap();
        assert_eq!(playlist.current_index(), 1);
        assert!(playlist.get_attribute("next").is_none());

        playlist.set_attribute("previous", "true").unwrap();
        assert_eq!(playlist.current_index(), 0);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn clicking_selects_directly() {
        let (mut playlist, log) = abc();

        assert!(playlist.select(2).unwrap());
        assert!(!playlist.select(2).unwrap());
        assert!(playlist.select(7).is_err());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn connect_publishes_the_initial_entry() {
        let (mut playlist, log) = abc();
        let ready = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ready);
        playlist.set_on_bind_ready(Box::new(move || *flag.borrow_mut() = true));

        playlist.connect().unwrap();
        assert!(*ready.borrow());
        assert_eq!(playlist.title(), Some("A"));
        assert_eq!(log.borrow().len(), 1);
        assert!(playlist.connect().is_err());
    }

    #[test]
    fn missing_hooks_are_skipped() {
        let entries = vec![PlaylistEntry::new("A", "a"), PlaylistEntry::new("B", "b")];
        let mut playlist = Playlist::new(template(), entries, 1).unwrap();
        playlist.connect().unwrap();
        assert!(playlist.previous());
        assert_eq!(playlist.url(), Some("a"));
    }

    #[test]
    fn loads_a_manifest_and_resolves_urls() {
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert(
            "widgets/playlist/playlist.json",
            r#"{ "current": 1, "entries": [
                { "title": "One", "url": "./songs/one.wav" },
                { "title": "Two", "url": "/music/two.wav" }
            ] }"#,
        );

        let playlist = Playlist::load(template(), &fetcher).unwrap();
        assert_eq!(playlist.current_index(), 1);
        assert_eq!(playlist.entries()[0].url, "widgets/playlist/./songs/one.wav");
        assert_eq!(playlist.entries()[1].url, "/music/two.wav");
    }

    #[test]
    fn rejects_empty_lists() {
        assert!(Playlist::new(template(), Vec::new(), 0).is_err());
        let one = vec![PlaylistEntry::new("A", "a")];
        assert!(matches!(
            Playlist::new(template(), one, 3),
            Err(WidgetError::OutOfRange { index: 3, len: 1 })
        ));
    }
}
