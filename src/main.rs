use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use ratatui::prelude::Rect;

use bsp_tiles::constants::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use bsp_tiles::script::{self, Command, SCRIPT_HELP};
use bsp_tiles::tracing_sub::{self, LogTarget};
use bsp_tiles::{DropBehavior, TileController};

#[derive(Parser, Debug)]
#[command(
    name = "bsp-tiles",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replay tile layout edits and print the resulting partition",
    after_help = SCRIPT_HELP
)]
struct Cli {
    /// Canvas width in cells.
    #[arg(long, default_value_t = DEFAULT_CANVAS_WIDTH)]
    width: u16,

    /// Canvas height in cells.
    #[arg(long, default_value_t = DEFAULT_CANVAS_HEIGHT)]
    height: u16,

    /// Seed for tile colors. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Remove the dragged tile from its origin after a drop.
    #[arg(long)]
    move_on_drop: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Commands to replay, one per argument (e.g. "split 0 v").
    #[arg(value_name = "COMMAND")]
    commands: Vec<String>,
}

struct ReplayConfig {
    area: Rect,
    seed: Option<u64>,
    drop_behavior: DropBehavior,
    commands: Vec<Command>,
}

impl TryFrom<&Cli> for ReplayConfig {
    type Error = String;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        if cli.width == 0 || cli.height == 0 {
            return Err("canvas width and height must be at least 1".to_string());
        }
        let commands = script::parse_script(&cli.commands).map_err(|err| err.to_string())?;
        Ok(Self {
            area: Rect {
                x: 0,
                y: 0,
                width: cli.width,
                height: cli.height,
            },
            seed: cli.seed,
            drop_behavior: if cli.move_on_drop {
                DropBehavior::Move
            } else {
                DropBehavior::Copy
            },
            commands,
        })
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let target = match &cli.log_file {
        Some(path) => LogTarget::file(path)?,
        None => LogTarget::Stderr,
    };
    tracing_sub::init(tracing_sub::level_for_verbosity(cli.verbose), target);

    let config = ReplayConfig::try_from(&cli)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let controller = match config.seed {
        Some(seed) => TileController::seeded(config.area, seed),
        None => TileController::new(config.area),
    };
    let mut controller = controller.with_drop_behavior(config.drop_behavior);

    for (index, command) in config.commands.iter().enumerate() {
        script::apply(&mut controller, command).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("command {} (`{command}`): {err}", index + 1),
            )
        })?;
    }

    let mut stdout = io::stdout().lock();
    print_layout(&mut stdout, &controller)?;
    stdout.flush()
}

fn print_layout(out: &mut impl Write, controller: &TileController) -> io::Result<()> {
    if let Some(shape) = controller.tree().shape(controller.root()) {
        writeln!(out, "{shape}")?;
    }
    for (index, (leaf, rect)) in controller.regions().into_iter().enumerate() {
        let color = controller
            .tree()
            .color(leaf)
            .map(|c| c.to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "{index:>3} {color} x={} y={} w={} h={}",
            rect.x, rect.y, rect.width, rect.height
        )?;
    }
    Ok(())
}
