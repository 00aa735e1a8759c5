use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pitchtrack::config::Settings;
use pitchtrack::detector::ReplayDetector;
use pitchtrack::frame::{load_font, read_frames, save_frames};
use pitchtrack::pipeline::{prepare_tracks, CachePolicy, Pipeline};
use pitchtrack::possession::PossessionLog;
use pitchtrack::render::render_video;
use pitchtrack::tracker::IouTracker;
use pitchtrack::{cache, logging, Frame};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pitchtrack", about = "Player, referee and ball tracks for match footage")]
struct Args {
    /// TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build tracks from a detection dump
    Track {
        /// One JSON detector frame per line
        #[arg(short, long)]
        detections: PathBuf,

        /// Frame directory; when omitted every dumped frame is used
        #[arg(short, long)]
        frames: Option<PathBuf>,

        /// Snapshot of the merged tracks, reused on later runs
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Recompute even when the snapshot exists
        #[arg(long)]
        no_cache_read: bool,

        /// Where to write the final tracks
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Draw tracks over frames
    Render {
        #[arg(short, long)]
        tracks: PathBuf,

        #[arg(short, long)]
        frames: PathBuf,

        /// Output frame directory
        #[arg(short, long)]
        output: PathBuf,

        /// JSON array with the team in control of the ball for every frame
        #[arg(short, long)]
        possession: Option<PathBuf>,

        /// TrueType font for overlay text
        #[arg(long)]
        font: Option<PathBuf>,
    },
}

fn track(
    settings: &Settings,
    detections: PathBuf,
    frames: Option<PathBuf>,
    cache_path: Option<PathBuf>,
    no_cache_read: bool,
    output: PathBuf,
) -> Result<()> {
    let detector = ReplayDetector::open(&detections)
        .with_context(|| format!("reading detections {}", detections.display()))?;

    let frames = match frames {
        Some(dir) => {
            let frames = read_frames(&dir).with_context(|| format!("reading frames {}", dir.display()))?;
            frames.into_iter().map(|_| ()).collect()
        }
        None => vec![(); detector.len()],
    };

    let policy = cache_path
        .or_else(|| settings.cache.path.clone())
        .map(|path| CachePolicy::new(path, settings.cache.read && !no_cache_read));

    let mut pipeline = Pipeline::new(
        detector,
        IouTracker::new((&settings.tracker).into()),
        settings.detector.class_correction(),
        settings.detector.detector_config(),
    );

    let mut store = pipeline.object_tracks(&frames, policy.as_ref())?;
    prepare_tracks(&mut store)?;

    cache::save(&output, &store).with_context(|| format!("writing tracks {}", output.display()))?;
    info!(path = %output.display(), frames = store.len(), "wrote tracks");

    Ok(())
}

fn render(
    settings: &Settings,
    tracks: PathBuf,
    frames: PathBuf,
    output: PathBuf,
    possession: Option<PathBuf>,
    font: Option<PathBuf>,
) -> Result<()> {
    let store = cache::load(&tracks).with_context(|| format!("no usable tracks in {}", tracks.display()))?;

    let log = match possession {
        Some(path) => {
            let file = std::fs::File::open(&path).with_context(|| format!("opening {}", path.display()))?;
            serde_json::from_reader(std::io::BufReader::new(file))
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => PossessionLog::from_tracks(&store),
    };

    let font = match font.or_else(|| settings.font.clone()) {
        Some(path) => Some(load_font(&path).with_context(|| format!("loading font {}", path.display()))?),
        None => None,
    };

    let frames: Vec<Frame> = read_frames(&frames)?
        .into_iter()
        .map(|image| {
            let frame = Frame::new(image);
            match &font {
                Some(font) => frame.with_font(font.clone()),
                None => frame,
            }
        })
        .collect();

    let annotated = render_video(&frames, &store, &log, &settings.render)?;
    save_frames(&output, &annotated)?;

    Ok(())
}

fn main() -> Result<()> {
    logging::init_logging("info");

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Track {
            detections,
            frames,
            cache,
            no_cache_read,
            output,
        } => track(&settings, detections, frames, cache, no_cache_read, output),

        Command::Render {
            tracks,
            frames,
            output,
            possession,
            font,
        } => render(&settings, tracks, frames, output, possession, font),
    }
}
