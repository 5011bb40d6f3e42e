mod surface;
mod wav;

use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
    rc::Rc,
};

use audio_widgets_core::{
    AppConfig, AudioPlayer, BufferedMedia, ComponentKind, FrameClock, FrameStatus, FsFetcher,
    MediaElement, Playlist, TemplateCache, TemplateLoader, Widget, WidgetError,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::{surface::TextSurface, wav::WavResolver};

type Player = AudioPlayer<BufferedMedia<WavResolver>>;

fn main() -> audio_widgets_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli.shared)?;

    match cli.command {
        Commands::Play {
            input,
            frames,
            controls,
            print,
        } => run_play(config, &input, frames, &controls, print),
        Commands::Playlist {
            frames_per_track,
            controls,
        } => run_playlist(config, frames_per_track, &controls),
        Commands::Precompute { input, output } => run_precompute(config, &input, &output),
    }
}

fn load_config(shared: &SharedArgs) -> audio_widgets_core::Result<AppConfig> {
    let mut config = match &shared.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(root) = &shared.assets {
        config.assets.root = root.clone();
    }
    if let Some(width) = shared.width {
        config.visualizer.width = width;
    }
    if let Some(height) = shared.height {
        config.visualizer.height = height;
    }
    Ok(config)
}

fn build_player(config: &AppConfig) -> audio_widgets_core::Result<Player> {
    let loader = TemplateLoader::new(FsFetcher, &config.assets.root);
    let cache = TemplateCache::global();
    let template = cache.get_or_load(ComponentKind::AudioPlayer, &loader)?;
    let progress = cache.get_or_load(ComponentKind::ProgressBar, &loader)?;

    let rate = config.graph.sample_rate;
    let media = BufferedMedia::new(WavResolver::new(rate), rate);
    Ok(AudioPlayer::new(template, progress, media, config.clone()))
}

fn apply_controls(player: &mut Player, controls: &Controls) -> audio_widgets_core::Result<()> {
    // The sliders never leave these ranges.
    player.volume_input(controls.volume.clamp(0.0, 1.0))?;
    player.balance_input(controls.balance.clamp(-1.0, 1.0))?;
    for &(band, gain_db) in &controls.gains {
        player.gain_input(band, gain_db.clamp(-40.0, 40.0))?;
    }
    if controls.looping {
        player.toggle_loop()?;
    }
    Ok(())
}

fn run_play(
    config: AppConfig,
    input: &Path,
    frames: u64,
    controls: &Controls,
    print: bool,
) -> audio_widgets_core::Result<()> {
    tracing::info!(?input, frames, "starting playback");

    let mut player = build_player(&config)?;
    player.set_attribute("title", &track_title(input))?;
    player.set_attribute("url", &path_str(input)?)?;
    let stop = player.connect()?;
    apply_controls(&mut player, controls)?;
    player.toggle_play()?;

    let mut surface = TextSurface::new(config.visualizer.width, config.visualizer.height);
    let rendered = run_frames(&mut player, &mut surface, &config, frames, |_, _| {})?;

    stop.cancel();
    if print {
        println!("{}", player.title_label());
        println!("{}", surface.render());
        println!(
            "{} / {}  intensity {:.1}",
            player.progress().start_label(),
            player.progress().end_label(),
            player.intensity()
        );
    }
    player.dispose();

    tracing::info!(rendered, "playback finished");
    Ok(())
}

fn run_playlist(
    config: AppConfig,
    frames_per_track: u64,
    controls: &Controls,
) -> audio_widgets_core::Result<()> {
    let loader = TemplateLoader::new(FsFetcher, &config.assets.root);
    let template = TemplateCache::global().get_or_load(ComponentKind::Playlist, &loader)?;
    let mut playlist = Playlist::load(template, loader.fetcher())?;

    let selection: Rc<RefCell<Option<(String, String)>>> = Rc::default();
    let sink = Rc::clone(&selection);
    playlist.set_on_current_change(Box::new(move |title, url| {
        *sink.borrow_mut() = Some((title.to_string(), url.to_string()));
    }));

    let advance = Rc::new(Cell::new(false));
    let mut player = build_player(&config)?;
    let requested = Rc::clone(&advance);
    player.set_on_next_song(Box::new(move || requested.set(true)));

    playlist.connect()?;
    apply_selection(&mut player, &selection)?;
    let stop = player.connect()?;
    apply_controls(&mut player, controls)?;
    player.toggle_play()?;

    let mut surface = TextSurface::new(config.visualizer.width, config.visualizer.height);
    loop {
        tracing::info!(
            index = playlist.current_index(),
            title = player.title_label(),
            "track started"
        );
        run_frames(&mut player, &mut surface, &config, frames_per_track, |_, _| {})?;

        player.next_song();
        if !advance.replace(false) || !playlist.next() {
            break;
        }
        apply_selection(&mut player, &selection)?;
        if !player.transport().is_some_and(|transport| transport.is_playing()) {
            player.toggle_play()?;
        }
    }

    stop.cancel();
    player.dispose();
    playlist.dispose();
    Ok(())
}

fn apply_selection(
    player: &mut Player,
    selection: &RefCell<Option<(String, String)>>,
) -> audio_widgets_core::Result<()> {
    if let Some((title, url)) = selection.borrow_mut().take() {
        player.set_attribute("title", &title)?;
        player.set_attribute("url", &url)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct FrameRecord {
    time: f64,
    intensity: f32,
    bins: Vec<u8>,
}

fn run_precompute(config: AppConfig, input: &Path, output: &Path) -> audio_widgets_core::Result<()> {
    tracing::info!(?input, ?output, "running precompute pipeline");

    let mut player = build_player(&config)?;
    player.set_attribute("url", &path_str(input)?)?;
    let stop = player.connect()?;
    let loaded = player
        .transport()
        .is_some_and(|transport| transport.media().duration() > 0.0);
    if !loaded {
        return Err(WidgetError::msg(format!(
            "`{}` could not be loaded",
            input.display()
        )));
    }
    player.toggle_play()?;

    let mut surface = TextSurface::new(config.visualizer.width, config.visualizer.height);
    let mut records = Vec::new();
    run_frames(&mut player, &mut surface, &config, u64::MAX, |time, player| {
        records.push(FrameRecord {
            time,
            intensity: player.intensity(),
            bins: player.spectrum().to_vec(),
        });
    })?;
    stop.cancel();
    player.dispose();

    let file = std::fs::File::create(output)?;
    serde_json::to_writer(std::io::BufWriter::new(file), &records)?;
    tracing::info!(frames = records.len(), "analysis written");
    Ok(())
}

/// Alternates audio blocks and visualizer frames. Stops after `frames`
/// frames or once playback ends. Returns the frame count.
fn run_frames(
    player: &mut Player,
    surface: &mut TextSurface,
    config: &AppConfig,
    frames: u64,
    mut on_frame: impl FnMut(f64, &Player),
) -> audio_widgets_core::Result<u64> {
    let mut clock = FrameClock::new(config.visualizer.frames_per_second);
    let fps = u64::from(config.visualizer.frames_per_second.max(1));
    let block = (config.graph.sample_rate as usize / fps as usize).max(1);
    let mut out = vec![0.0_f32; block * 2];

    while clock.frames() < frames {
        player.render_audio(&mut out)?;
        if player.animation_frame(surface)? == FrameStatus::Cancelled {
            break;
        }
        let time = clock.advance();
        on_frame(time, player);

        if clock.frames() % fps == 0 {
            tracing::info!(
                position = %player.progress().start_label(),
                intensity = player.intensity(),
                "frame"
            );
        }
        if !player.transport().is_some_and(|transport| transport.is_playing()) {
            break;
        }
    }

    Ok(clock.frames())
}

fn track_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn path_str(path: &Path) -> audio_widgets_core::Result<String> {
    path.to_str()
        .map(str::to_owned)
        .ok_or(WidgetError::InvalidInput("media path is not valid UTF-8"))
}

fn parse_gain(value: &str) -> Result<(usize, f32), String> {
    let (band, gain) = value
        .split_once('=')
        .ok_or_else(|| format!("expected BAND=DB, got `{value}`"))?;
    let band = band.trim().parse().map_err(|err| format!("bad band: {err}"))?;
    let gain = gain.trim().parse().map_err(|err| format!("bad gain: {err}"))?;
    Ok((band, gain))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio player, seek bar and playlist widgets", long_about = None)]
struct Cli {
    #[command(flatten)]
    shared: SharedArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SharedArgs {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the widget templates.
    #[arg(long, global = true)]
    assets: Option<PathBuf>,
    /// Visualizer width in cells.
    #[arg(long, global = true)]
    width: Option<u32>,
    /// Visualizer height in cells.
    #[arg(long, global = true)]
    height: Option<u32>,
}

#[derive(Args, Debug)]
struct Controls {
    /// Media volume, 0 to 1.
    #[arg(long, default_value_t = 1.0)]
    volume: f32,
    /// Stereo balance, -1 (left) to 1 (right).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    balance: f32,
    /// Equalizer band gain as BAND=DB; may be repeated.
    #[arg(long = "gain", value_parser = parse_gain, allow_hyphen_values = true)]
    gains: Vec<(usize, f32)>,
    /// Loop the current track.
    #[arg(long = "loop")]
    looping: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a WAV file through the player and draw the spectrum.
    Play {
        /// Path to the WAV file.
        input: PathBuf,
        /// Number of visualizer frames to run.
        #[arg(long, default_value_t = 180)]
        frames: u64,
        #[command(flatten)]
        controls: Controls,
        /// Print the last frame and the seek bar labels.
        #[arg(long)]
        print: bool,
    },
    /// Play through the bundled playlist, advancing on each track end.
    Playlist {
        /// Frames to run per track before moving on.
        #[arg(long, default_value_t = 120)]
        frames_per_track: u64,
        #[command(flatten)]
        controls: Controls,
    },
    /// Analyse a WAV file frame by frame and write the spectrum as JSON.
    Precompute {
        /// Path to the WAV file.
        input: PathBuf,
        /// Output path for the analysis.
        output: PathBuf,
    },
}
