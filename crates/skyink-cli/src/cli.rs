//! Headless commands: render or summarize scene documents and manage the
//! saved-scene store.

use clap::{Args, Parser, Subcommand};
use kurbo::Point;
use skyink_core::canvas::Canvas;
use skyink_core::codec::CodecError;
use skyink_core::config::{ConfigError, EditorConfig};
use skyink_core::scene::BodyKind;
use skyink_core::storage::{FileStorage, LAST_SCENE_KEY, Storage, StorageError};
use skyink_render::{
    RasterRenderer, RenderContext, Renderer, RendererError, SpriteSet, encode_png, export_png,
};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Render and inspect SkyInk scene documents.
#[derive(Parser, Debug)]
#[command(name = "skyink", version, about = "Render and inspect SkyInk scene documents")]
pub struct CliArgs {
    /// Editor config JSON. Missing fields take their defaults.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Saved-scene directory. Defaults to the platform data directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Where a command reads its scene from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SceneSource {
    /// Scene document (JSON).
    pub file: Option<PathBuf>,

    /// Id of a scene in the saved-scene store.
    #[arg(long, value_name = "ID")]
    pub saved: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a scene document to a PNG image.
    Render {
        #[command(flatten)]
        scene: SceneSource,

        /// Output PNG path.
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Viewport width in pixels.
        #[arg(long, default_value_t = 1080)]
        width: u32,

        /// Viewport height in pixels.
        #[arg(long, default_value_t = 2340)]
        height: u32,

        /// Render the whole world at one pixel per world unit.
        #[arg(long, conflicts_with_all = ["width", "height"])]
        full: bool,

        /// Directory holding body artwork (`sun.png`, `mars.png`, `star.png`, ...).
        /// Generated discs are used when omitted.
        #[arg(long, value_name = "DIR")]
        sprites: Option<PathBuf>,

        /// Seconds of animation to run before drawing.
        #[arg(long, default_value_t = 0.0)]
        time: f64,

        /// Put planets in orbit before running the animation.
        #[arg(long)]
        orbits: bool,
    },

    /// Print a summary of a scene document.
    Info {
        #[command(flatten)]
        scene: SceneSource,
    },

    /// Copy a scene document into the saved-scene store.
    Import {
        /// Scene document (JSON).
        file: PathBuf,

        /// Id to save under.
        #[arg(long, default_value = LAST_SCENE_KEY)]
        id: String,
    },

    /// List the ids in the saved-scene store.
    List,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("--time must be between 0 and 3600 seconds, got {0}")]
    AnimationTime(f64),
}

/// Longest animation `render --time` will run.
pub const MAX_ANIMATION_SECONDS: f64 = 3600.0;

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig, CliError> {
    match path {
        Some(path) => Ok(EditorConfig::from_json(&read(path)?)?),
        None => Ok(EditorConfig::default()),
    }
}

fn open_store(dir: Option<&Path>) -> Result<FileStorage, CliError> {
    Ok(match dir {
        Some(dir) => FileStorage::new(dir)?,
        None => FileStorage::default_location()?,
    })
}

fn load_canvas(scene: &Path, config: EditorConfig) -> Result<Canvas, CliError> {
    let mut canvas = Canvas::new(config);
    canvas.import_state_json(&read(scene)?)?;
    Ok(canvas)
}

fn load_source(source: &SceneSource, store: Option<&Path>, config: EditorConfig) -> Result<Canvas, CliError> {
    match (&source.file, &source.saved) {
        (Some(file), _) => load_canvas(file, config),
        (None, Some(id)) => {
            let store = open_store(store)?;
            let mut canvas = Canvas::new(config);
            pollster::block_on(canvas.load_from(&store, id))?;
            Ok(canvas)
        }
        (None, None) => Err(CliError::Storage(StorageError::Other(
            "No scene file or saved id given".to_string(),
        ))),
    }
}

/// Advance animation by `seconds`, in frame-sized steps.
fn run_animation(canvas: &mut Canvas, seconds: f64) -> Result<(), CliError> {
    if !(0.0..=MAX_ANIMATION_SECONDS).contains(&seconds) {
        return Err(CliError::AnimationTime(seconds));
    }
    let step = canvas.config().max_frame_delta;
    if step <= 0.0 {
        return Ok(());
    }
    let mut remaining = seconds;
    while remaining > 0.0 {
        remaining -= canvas.advance(remaining.min(step)).max(f64::EPSILON);
    }
    Ok(())
}

/// Run a parsed command.
pub fn run(args: CliArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let store = args.store.as_deref();
    match args.command {
        Command::Render {
            scene,
            output,
            width,
            height,
            full,
            sprites,
            time,
            orbits,
        } => {
            let mut canvas = load_source(&scene, store, config)?;
            canvas.set_viewport_size(width as f64, height as f64);
            if orbits {
                canvas.set_orbit_animation(true);
            }
            run_animation(&mut canvas, time)?;

            let sprites = match sprites {
                Some(dir) => SpriteSet::load_dir(&dir),
                None => SpriteSet::procedural(),
            };
            let mut renderer = RasterRenderer::new(sprites);
            let png_data = if full {
                export_png(&mut renderer, &canvas)?
            } else {
                encode_png(&renderer.render(&RenderContext::new(&canvas))?)?
            };
            fs::write(&output, &png_data).map_err(|source| CliError::Io {
                path: output.clone(),
                source,
            })?;
            log::info!("Wrote {} ({} bytes)", output.display(), png_data.len());
        }
        Command::Info { scene } => {
            let canvas = load_source(&scene, store, config)?;
            print!("{}", summarize(&canvas));
        }
        Command::Import { file, id } => {
            let canvas = load_canvas(&file, config)?;
            let store = open_store(store)?;
            pollster::block_on(canvas.save_to(&store, &id))?;
            println!("{id}");
        }
        Command::List => {
            let store = open_store(store)?;
            for id in pollster::block_on(store.list())? {
                println!("{id}");
            }
        }
    }
    Ok(())
}

/// Human-readable summary of a loaded canvas.
pub fn summarize(canvas: &Canvas) -> String {
    let scene = canvas.scene();
    let strokes = canvas.editor.strokes().strokes();
    let settings = canvas.settings();
    let position = |p: Option<Point>| match p {
        Some(p) => format!("({:.1}, {:.1})", p.x, p.y),
        None => "none".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "sun:     {}", position(scene.sun));
    let _ = writeln!(out, "moon:    {}", position(scene.moon));
    let _ = writeln!(out, "planets: {}", scene.planets.len());
    for kind in BodyKind::PLANETS {
        let count = scene.planets.iter().filter(|p| p.kind == kind).count();
        if count > 0 {
            let _ = writeln!(out, "  {:<8} {count}", kind.name().to_ascii_lowercase());
        }
    }
    let _ = writeln!(out, "stars:   {}", scene.stars.len());
    let _ = writeln!(out, "links:   {}", scene.links.len());
    let erase = strokes.iter().filter(|s| s.is_erase).count();
    let _ = writeln!(out, "strokes: {} ({} paint, {erase} erase)", strokes.len(), strokes.len() - erase);
    let dust: usize = strokes.iter().map(|s| s.dust.len()).sum();
    let marks: usize = strokes.iter().map(|s| s.erasers.len()).sum();
    let _ = writeln!(out, "dust:    {dust}, erase marks: {marks}");
    let _ = writeln!(
        out,
        "ink:     #{:06X}, brush {}",
        settings.ink_color.0 & 0x00FF_FFFF,
        settings.brush_size
    );
    out
}
