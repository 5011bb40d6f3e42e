//! Markup and style loading for the widgets.
//!
//! Each widget owns a directory holding `template.html` and `template.css`.
//! The style sheet is inlined at the `{{cssStyle}}` token and every relative
//! `src`/`href` reference is rewritten against the widget directory, once,
//! before the template is handed out.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock},
};

use crate::{Result, WidgetError};

/// Token in the markup replaced by the inlined style sheet.
pub const STYLE_PLACEHOLDER: &str = "{{cssStyle}}";
const MARKUP_FILE: &str = "template.html";
const STYLE_FILE: &str = "template.css";

/// The widget types that ship a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    AudioPlayer,
    ProgressBar,
    Playlist,
}

impl ComponentKind {
    /// Returns the custom element name of the widget.
    pub fn tag_name(self) -> &'static str {
        match self {
            Self::AudioPlayer => "audio-player",
            Self::ProgressBar => "progress-bar",
            Self::Playlist => "playlist-selector",
        }
    }

    /// Directory of the widget relative to the asset root.
    pub fn asset_dir(self) -> &'static str {
        match self {
            Self::AudioPlayer => "audio_player",
            Self::ProgressBar => "progress_bar",
            Self::Playlist => "playlist",
        }
    }
}

/// Returns the text content of a resource.
pub trait ResourceFetcher {
    fn fetch(&self, path: &Path) -> Result<String>;
}

/// Reads resources from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFetcher;

impl ResourceFetcher for FsFetcher {
    fn fetch(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|err| WidgetError::resource(path, err))
    }
}

/// In-memory resources keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemoryFetcher {
    files: HashMap<PathBuf, String>,
}

impl MemoryFetcher {
    /// Creates an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `contents` under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl ResourceFetcher for MemoryFetcher {
    fn fetch(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            WidgetError::resource(path, std::io::ErrorKind::NotFound.into())
        })
    }
}

/// Fully assembled markup of one widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub kind: ComponentKind,
    /// Directory every relative reference was resolved against.
    pub base: PathBuf,
    pub markup: String,
}

impl Template {
    /// Resolves a widget-relative path (`./x`, `../x`) against the template
    /// base. Other paths are returned untouched.
    pub fn resolve(&self, path: &str) -> String {
        resolve_relative(&self.base, path)
    }
}

/// Loads templates for widgets living under a common asset root.
pub struct TemplateLoader<F> {
    fetcher: F,
    root: PathBuf,
}

impl<F: ResourceFetcher> TemplateLoader<F> {
    /// Creates a loader reading widget directories below `root`.
    pub fn new(fetcher: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            root: root.into(),
        }
    }

    /// Returns the fetcher used for every resource.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Base directory of a widget.
    pub fn base_of(&self, kind: ComponentKind) -> PathBuf {
        self.root.join(kind.asset_dir())
    }

    /// Fetches a file relative to a widget's base directory.
    pub fn fetch_relative(&self, kind: ComponentKind, relative: &str) -> Result<String> {
        self.fetcher.fetch(&self.base_of(kind).join(relative))
    }

    /// Fetches the markup and style of `kind`, inlines the style and resolves
    /// relative references against the widget directory.
    pub fn load(&self, kind: ComponentKind) -> Result<Template> {
        let base = self.base_of(kind);
        let markup = self.fetcher.fetch(&base.join(MARKUP_FILE))?;
        let style = self.fetcher.fetch(&base.join(STYLE_FILE))?;

        let markup = markup.replacen(STYLE_PLACEHOLDER, &format!("<style>{style}</style>"), 1);
        let markup = resolve_markup_paths(&markup, &base);

        tracing::debug!(tag = kind.tag_name(), base = %base.display(), "template loaded");
        Ok(Template { kind, base, markup })
    }
}

impl<F> fmt::Debug for TemplateLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateLoader")
            .field("root", &self.root)
            .finish()
    }
}

/// Process-wide, lazily populated template store. Entries are keyed by
/// widget type and base directory, so each widget under a given asset root
/// is loaded at most once and later lookups share the same instance.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: Mutex<HashMap<(ComponentKind, PathBuf), Arc<Template>>>,
}

impl TemplateCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cache shared by the whole process.
    pub fn global() -> &'static TemplateCache {
        static CACHE: OnceLock<TemplateCache> = OnceLock::new();
        CACHE.get_or_init(TemplateCache::new)
    }

    /// Returns the cached template of `kind` below the loader's root, loading
    /// it on first use.
    pub fn get_or_load<F: ResourceFetcher>(
        &self,
        kind: ComponentKind,
        loader: &TemplateLoader<F>,
    ) -> Result<Arc<Template>> {
        let key = (kind, loader.base_of(kind));
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| WidgetError::msg("template cache has been poisoned"))?;

        if let Some(template) = entries.get(&key) {
            return Ok(Arc::clone(template));
        }

        let template = Arc::new(loader.load(kind)?);
        entries.insert(key, Arc::clone(&template));
        Ok(template)
    }

    /// Whether the template of `kind` under `base` has been loaded.
    pub fn contains(&self, kind: ComponentKind, base: &Path) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(&(kind, base.to_path_buf())))
            .unwrap_or(false)
    }
}

/// Joins `path` onto `base` when it starts with `.`.
pub fn resolve_relative(base: &Path, path: &str) -> String {
    if path.starts_with('.') {
        base.join(path).display().to_string()
    } else {
        path.to_string()
    }
}

fn resolve_markup_paths(markup: &str, base: &Path) -> String {
    ["src", "href"]
        .iter()
        .fold(markup.to_string(), |acc, attribute| {
            rewrite_attribute(&acc, attribute, base)
        })
}

/// Rewrites every `attribute="./..."` occurrence so that it points below
/// `base`.
fn rewrite_attribute(markup: &str, attribute: &str, base: &Path) -> String {
    let needle = format!(" {attribute}=\"");
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = rest.find(&needle) {
        let value_start = start + needle.len();
        out.push_str(&rest[..value_start]);
        rest = &rest[value_start..];

        let Some(end) = rest.find('"') else {
            break;
        };
        out.push_str(&resolve_relative(base, &rest[..end]));
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher_with_player() -> MemoryFetcher {
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert(
            "widgets/audio_player/template.html",
            r#"{{cssStyle}}<img id="playButton" src="./assets/imgs/play.svg"><a href="https://example.org">x</a>"#,
        );
        fetcher.insert("widgets/audio_player/template.css", "#title { color: red; }");
        fetcher
    }

    #[test]
    fn inlines_style_and_resolves_relative_paths() {
        let loader = TemplateLoader::new(fetcher_with_player(), "widgets");
        let template = loader.load(ComponentKind::AudioPlayer).unwrap();

        assert!(template
            .markup
            .starts_with("<style>#title { color: red; }</style>"));
        assert!(template
            .markup
            .contains(r#"src="widgets/audio_player/./assets/imgs/play.svg""#));
        assert!(template.markup.contains(r#"href="https://example.org""#));
        assert!(!template.markup.contains(STYLE_PLACEHOLDER));
    }

    #[test]
    fn missing_resource_is_a_load_failure() {
        let loader = TemplateLoader::new(MemoryFetcher::new(), "widgets");
        let err = loader.load(ComponentKind::Playlist).unwrap_err();
        assert!(matches!(err, WidgetError::ResourceLoad { .. }));
        assert!(format!("{err}").contains("template.html"));
    }

    #[test]
    fn cache_loads_each_kind_once() {
        let cache = TemplateCache::new();
        let loader = TemplateLoader::new(fetcher_with_player(), "widgets");

        let base = Path::new("widgets/audio_player");
        assert!(!cache.contains(ComponentKind::AudioPlayer, base));
        let first = cache.get_or_load(ComponentKind::AudioPlayer, &loader).unwrap();
        let second = cache.get_or_load(ComponentKind::AudioPlayer, &loader).unwrap();

        assert!(cache.contains(ComponentKind::AudioPlayer, base));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.markup.matches("widgets/audio_player").count(), 1);
    }

    #[test]
    fn cache_keeps_asset_roots_apart() {
        let mut fetcher = fetcher_with_player();
        fetcher.insert("themes/audio_player/template.html", "{{cssStyle}}<p>themed</p>");
        fetcher.insert("themes/audio_player/template.css", "p {}");

        let cache = TemplateCache::new();
        let default = cache
            .get_or_load(
                ComponentKind::AudioPlayer,
                &TemplateLoader::new(fetcher.clone(), "widgets"),
            )
            .unwrap();
        let themed = cache
            .get_or_load(ComponentKind::AudioPlayer, &TemplateLoader::new(fetcher, "themes"))
            .unwrap();

        assert!(!Arc::ptr_eq(&default, &themed));
        assert_eq!(themed.base, Path::new("themes/audio_player"));
        assert!(themed.markup.ends_with("<p>themed</p>"));
    }

    #[test]
    fn reads_templates_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("progress_bar");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("template.html"), "<div id=\"emptyBar\"></div>{{cssStyle}}").unwrap();
        std::fs::write(base.join("template.css"), "#emptyBar {}").unwrap();

        let loader = TemplateLoader::new(FsFetcher, dir.path());
        let template = loader.load(ComponentKind::ProgressBar).unwrap();

        assert_eq!(template.base, base);
        assert!(template.markup.ends_with("<style>#emptyBar {}</style>"));
    }

    #[test]
    fn leaves_absolute_references_alone() {
        let base = Path::new("/srv/widgets");
        assert_eq!(resolve_relative(base, "/abs/a.svg"), "/abs/a.svg");
        assert_eq!(resolve_relative(base, "./a.svg"), "/srv/widgets/./a.svg");
    }

    #[test]
    fn bundled_templates_load() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let loader = TemplateLoader::new(FsFetcher, &root);

        for kind in [
            ComponentKind::AudioPlayer,
            ComponentKind::ProgressBar,
            ComponentKind::Playlist,
        ] {
            let template = loader.load(kind).unwrap();
            assert!(template.markup.contains("<style>"), "{kind:?}");
            assert!(!template.markup.contains(STYLE_PLACEHOLDER), "{kind:?}");
        }

        let manifest = loader
            .fetch_relative(ComponentKind::Playlist, "playlist.json")
            .unwrap();
        assert!(manifest.contains("entries"));
    }
}
