//! Jigsaw Puzzle
//!
//! Cuts an image into interlocking pieces from the command line: print the
//! piece layout or a single outline, export the puzzle as SVG, or shuffle and
//! resume a saved game.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jigsaw::geometry::{build_outline, compute_box, GridSpec, PiecePosition};
use jigsaw::persistence::{JsonFileStore, NullStore, PuzzleStore};
use jigsaw::puzzle::{Puzzle, PuzzleConfig, StartOutcome};
use jigsaw::source::{ImageFileLoader, ScalePolicy, Viewport};
use jigsaw::{grid, visualization};

/// Cuts images into interlocking jigsaw pieces.
#[derive(Parser)]
#[command(name = "jigsaw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// A grid over a source of known size.
#[derive(Args)]
struct GridArgs {
    #[arg(long, default_value_t = 8)]
    columns: u32,
    #[arg(long, default_value_t = 5)]
    rows: u32,
    /// Source width in pixels.
    #[arg(long)]
    width: u32,
    /// Source height in pixels.
    #[arg(long)]
    height: u32,
}

impl GridArgs {
    fn grid(&self) -> Result<GridSpec> {
        GridSpec::new(self.columns, self.rows, self.width, self.height).context("invalid grid")
    }
}

/// Building a puzzle from an image file.
#[derive(Args)]
struct PuzzleArgs {
    /// Image to cut.
    image: PathBuf,
    /// JSON puzzle config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    columns: Option<u32>,
    #[arg(long)]
    rows: Option<u32>,
    #[arg(long, value_enum)]
    scale: Option<ScalePolicy>,
    /// Seed for reproducible shuffles.
    #[arg(long)]
    seed: Option<u64>,
    /// Tag pieces for drop shadows.
    #[arg(long)]
    shadows: bool,
    #[arg(long, default_value_t = 1280)]
    viewport_width: u32,
    #[arg(long, default_value_t = 800)]
    viewport_height: u32,
}

impl PuzzleArgs {
    fn config(&self) -> Result<PuzzleConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("cannot read config {}", path.display()))?;
                PuzzleConfig::from_json(&contents)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => PuzzleConfig::default(),
        };
        if let Some(columns) = self.columns {
            config.columns = columns;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(scale) = self.scale {
            config.scale_policy = scale;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.shadows |= self.shadows;
        Ok(config)
    }

    fn build(&self, store: Box<dyn PuzzleStore>) -> Result<Puzzle> {
        let url = self
            .image
            .to_str()
            .context("image path is not valid UTF-8")?;
        let viewport = Viewport::new(self.viewport_width, self.viewport_height);
        let puzzle = Puzzle::build(self.config()?, &ImageFileLoader, url, viewport, store)?;
        Ok(puzzle)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print every piece's box and edge shapes.
    Layout(GridArgs),
    /// Print the SVG path of one piece.
    Outline {
        #[command(flatten)]
        grid: GridArgs,
        #[arg(long)]
        column: u32,
        #[arg(long)]
        row: u32,
    },
    /// Export the puzzle as an SVG document.
    Svg {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        /// Shuffle the pieces instead of showing them solved.
        #[arg(long)]
        blend: bool,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resume the saved game for an image, or start a shuffled one.
    Play {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        /// Where progress is kept.
        #[arg(long, default_value = "puzzle.json")]
        state: PathBuf,
        /// Solve the puzzle before saving.
        #[arg(long)]
        resolve: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Layout(args) => print!("{}", grid::format_layout(&args.grid()?)),
        Command::Outline { grid, column, row } => run_outline(&grid, column, row)?,
        Command::Svg {
            puzzle,
            blend,
            output,
        } => run_svg(&puzzle, blend, output)?,
        Command::Play {
            puzzle,
            state,
            resolve,
        } => run_play(&puzzle, state, resolve)?,
    }

    Ok(())
}

/// Prints the outline of the piece at (`column`, `row`).
fn run_outline(args: &GridArgs, column: u32, row: u32) -> Result<()> {
    let grid = args.grid()?;
    let position = PiecePosition::new(column, row);
    anyhow::ensure!(
        grid.contains(position),
        "piece {position} is outside a {}x{} grid",
        grid.columns(),
        grid.rows()
    );
    let piece_box = compute_box(position, &grid);
    println!("{}", build_outline(position, &grid, &piece_box));
    Ok(())
}

/// Renders the puzzle to SVG.
fn run_svg(args: &PuzzleArgs, blend: bool, output: Option<PathBuf>) -> Result<()> {
    let mut puzzle = args.build(Box::new(NullStore))?;
    if blend {
        puzzle.blend();
    } else {
        puzzle.resolve();
    }
    puzzle.teardown();

    let svg = visualization::document(&puzzle);
    match output {
        Some(path) => {
            fs::write(&path, svg).with_context(|| format!("cannot write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{svg}"),
    }
    Ok(())
}

/// Restores or shuffles a game and saves it back.
fn run_play(args: &PuzzleArgs, state: PathBuf, resolve: bool) -> Result<()> {
    let mut puzzle = args.build(Box::new(JsonFileStore::new(&state)))?;
    match puzzle.restore_or_blend() {
        StartOutcome::Restored => println!("Resumed puzzle from {}", state.display()),
        StartOutcome::Blended => println!("Started a new puzzle"),
    }
    if resolve {
        puzzle.resolve();
    }
    puzzle.teardown();

    println!(
        "{} of {} pieces in place{}",
        puzzle.locked_count(),
        puzzle.pieces().len(),
        if puzzle.is_solved() { ", solved" } else { "" }
    );
    Ok(())
}
