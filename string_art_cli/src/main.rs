use std::{
    fmt,
    io::{self, Write as _},
    path::{Path, PathBuf},
    process::ExitCode,
    time::{Duration, Instant},
};

use clap::{Parser, ValueEnum};
use num_traits::AsPrimitive;
use string_art::{
    session,
    verboser::{Message, Verboser},
    Float, Luminance, Outcome, RunConfig, Session, StrokeStyle,
};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file path.
    #[arg()]
    input: PathBuf,

    /// Number of pins surrounding the image.
    #[arg(short, long, default_value_t = 288)]
    pins: usize,

    /// Maximum number of lines to draw.
    #[arg(short, long, default_value_t = 4000)]
    lines: usize,

    /// Darkness removed under every drawn line.
    #[arg(short = 'w', long, default_value_t = 20.0)]
    line_weight: f32,

    /// Thread width in pixels.
    #[arg(long, default_value_t = 1.0)]
    line_width: f32,

    /// Contrast level applied to the image before computing.
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    contrast: f32,

    /// Exponent rewarding longer lines, zero disables it.
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    distance_bias: f32,

    /// Opacity of every thread in the rendered outputs.
    #[arg(short, long, default_value_t = 0.1)]
    opacity: f32,

    /// Size in pixels of the side of the square the image is resized to.
    #[arg(short, long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..))]
    resolution: u32,

    /// Precision of calculations (Single/Double).
    #[arg(long, default_value_t = Precision::Single)]
    precision: Precision,

    /// Worker threads used to score candidate lines.
    #[arg(short, long, default_value_t = num_cpus::get())]
    threads: usize,

    /// Saves an intermediate svg every this many lines.
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Stops computing after this many seconds and keeps what was drawn.
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Clone, Copy, Debug)]
enum Precision {
    Single,
    Double,
}

impl ValueEnum for Precision {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Single, Self::Double]
    }

    fn to_possible_value<'a>(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Single => clap::builder::PossibleValue::new("Single")
                .alias("single")
                .alias("f32"),
            Self::Double => clap::builder::PossibleValue::new("Double")
                .alias("double")
                .alias("f64"),
        })
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("Single"),
            Self::Double => f.write_str("Double"),
        }
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Invalid file name: {}", .0.display())]
    FileName(PathBuf),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Session(#[from] session::Error),
    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Reports progress on stderr, once per percent.
#[derive(Default)]
struct Progress {
    percent: Option<usize>,
}

impl Verboser for Progress {
    fn verbose(&mut self, message: Message) {
        match message {
            Message::PlacingPin(_) => {}
            Message::Preprocessing => log::info!("preprocessing image"),
            Message::Computing(done, total) => {
                let percent = if total == 0 { 100 } else { done * 100 / total };
                if self.percent != Some(percent) {
                    self.percent = Some(percent);
                    eprint!("\rcomputing lines... {percent:>3}%");
                    let _ = io::stderr().flush();
                }
            }
        }
    }
}

impl Progress {
    fn finish(&mut self) {
        if self.percent.take().is_some() {
            eprintln!();
        }
    }
}

/// Where every output of a run is written.
struct Outputs {
    folder: PathBuf,
    stem: String,
}

impl Outputs {
    fn new(input: &Path) -> Result<Self, Error> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::FileName(input.to_path_buf()))?;
        let folder = input.parent().unwrap_or(Path::new(".")).join("output");
        std::fs::create_dir_all(&folder).map_err(|source| Error::Write {
            path: folder.clone(),
            source,
        })?;
        Ok(Self {
            folder,
            stem: stem.to_owned(),
        })
    }

    fn path(&self, suffix: &str, extension: &str) -> PathBuf {
        self.folder
            .join(format!("{}{}.{}", self.stem, suffix, extension))
    }

    fn write(&self, path: PathBuf, contents: impl AsRef<[u8]>) -> Result<(), Error> {
        std::fs::write(&path, contents).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;
        log::info!("saved {}", path.display());
        Ok(())
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let result = match args.precision {
        Precision::Single => with_precision::<f32>(&args),
        Precision::Double => with_precision::<f64>(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn with_precision<S: Float>(args: &Args) -> Result<(), Error>
where
    f32: AsPrimitive<S>,
    usize: AsPrimitive<S>,
    u8: AsPrimitive<S>,
{
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()?;
    let outputs = Outputs::new(&args.input)?;
    let config = RunConfig {
        pins: args.pins,
        lines: args.lines,
        line_weight: args.line_weight.as_(),
        line_width: args.line_width.as_(),
        contrast: args.contrast.as_(),
        distance_bias: args.distance_bias.as_(),
    };

    let image = image::open(&args.input).map_err(|source| Error::Open {
        path: args.input.clone(),
        source,
    })?;
    let side = image.width().min(image.height());
    let image = image
        .crop_imm(
            (image.width() - side) / 2,
            (image.height() - side) / 2,
            side,
            side,
        )
        .resize_exact(
            args.resolution,
            args.resolution,
            image::imageops::FilterType::Lanczos3,
        );
    let mut raw = Luminance::<S>::from_rgb_average(&image);
    raw.mask_inscribed_circle();
    let grid = *raw.grid();

    let mut progress = Progress::default();
    let mut session = Session::new();
    session.set_style(StrokeStyle {
        width: config.line_width,
        opacity: args.opacity.as_(),
    });
    session.load_image(raw, config.contrast, &mut progress);
    session.start(config, &mut progress)?;

    let deadline = args
        .timeout
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let timed_out = || deadline.is_some_and(|deadline| Instant::now() >= deadline);
    let mut snapshot = 1;
    let outcome = loop {
        let mut remaining = args.interval.unwrap_or(u64::MAX);
        let outcome = session.compute(&mut progress, || {
            if timed_out() || remaining == 0 {
                return true;
            }
            remaining -= 1;
            false
        })?;
        if outcome != Outcome::Cancelled || timed_out() {
            break outcome;
        }
        progress.finish();
        if let Some(scene) = session.scene() {
            let path = outputs.path(&format!("_{snapshot}"), "svg");
            outputs.write(path, scene.to_svg(grid).to_string())?;
        }
        snapshot += 1;
    };
    progress.finish();
    match outcome {
        Outcome::Finished => log::info!("drew {} lines", session.history().len()),
        Outcome::Exhausted => log::warn!(
            "stopped after {} lines, no pin left to reach",
            session.history().len()
        ),
        Outcome::Cancelled => log::warn!(
            "timed out after {} lines",
            session.history().len()
        ),
    }

    if let Some(scene) = session.scene() {
        outputs.write(outputs.path("", "svg"), scene.to_svg(grid).to_string())?;
        let path = outputs.path("", "png");
        scene.render(grid).save(&path).map_err(|source| Error::Save {
            path: path.clone(),
            source,
        })?;
        log::info!("saved {}", path.display());
    }
    if let Some(algorithm) = session.algorithm() {
        outputs.write(outputs.path("", "txt"), algorithm.history().instructions())?;
    }
    Ok(())
}
