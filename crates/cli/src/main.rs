mod runner;
mod scene;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use director_core::{Director, GridWorld};
use tracing_subscriber::EnvFilter;

use crate::scene::SceneFile;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Run natural-language director scripts against a grid scene.
#[derive(Parser)]
#[command(name = "director", version, about = "Director script runner")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log parsing and scheduling to stderr (overridden by DIRECTOR_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scene's script until every direction has finished
    Run {
        /// Path to the scene TOML file
        scene: PathBuf,
        /// Extra script lines, one command per line, run after the scene's own
        #[arg(long)]
        script: Option<PathBuf>,
        /// Give up after this many frames
        #[arg(long, default_value_t = 10_000)]
        frames: u64,
    },

    /// Parse a single command and print the directions it produces
    Parse {
        /// The command, e.g. "DIRECT PLAYER TO MOVE TO [3,12]"
        command: String,
        /// Scene to resolve actor names against
        #[arg(long)]
        scene: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            scene,
            script,
            frames,
        } => {
            runner::cmd_run(&scene, script.as_deref(), frames, cli.output, cli.quiet);
        }
        Commands::Parse { command, scene } => {
            cmd_parse(&command, scene.as_deref(), cli.output, cli.quiet);
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_env("DIRECTOR_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load a scene or exit with an error.
pub(crate) fn load_scene(path: &Path, output: OutputFormat, quiet: bool) -> (SceneFile, GridWorld) {
    let scene = match SceneFile::load(path) {
        Ok(scene) => scene,
        Err(msg) => {
            report_error(&format!("error: {}", msg), output, quiet);
            process::exit(1);
        }
    };
    match scene.world() {
        Ok(world) => (scene, world),
        Err(msg) => {
            report_error(&format!("error: {}", msg), output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_parse(command: &str, scene_path: Option<&Path>, output: OutputFormat, quiet: bool) {
    let (mut director, world) = match scene_path {
        Some(path) => {
            let (scene, world) = load_scene(path, output, quiet);
            (runner::director_for(&scene), world)
        }
        None => (Director::new(), GridWorld::new(0, 0)),
    };

    let directions = director.parse(&world, command);
    let summaries: Vec<_> = directions
        .iter()
        .map(|d| d.summary(director.scene()))
        .collect();

    match output {
        OutputFormat::Text => {
            if summaries.is_empty() && !quiet {
                println!("no directions");
            }
            for s in &summaries {
                let mut line = format!("{} {:?} {}", s.id, s.directed_to, s.verb);
                if !s.actors.is_empty() {
                    line.push_str(&format!(" actors=[{}]", s.actors.join(", ")));
                }
                if !s.adverbs.is_empty() {
                    line.push_str(&format!(" adverbs=[{}]", s.adverbs.join(", ")));
                }
                if !s.targets.is_empty() {
                    line.push_str(&format!(" targets=[{}]", s.targets.join(", ")));
                }
                for p in &s.phrases {
                    line.push_str(&format!(" {}=[{}]", p.preposition, p.targets.join(", ")));
                }
                if let Some(frames) = s.duration {
                    line.push_str(&format!(" for={}f", frames));
                }
                if let Some(frames) = s.delay {
                    line.push_str(&format!(" after={}f", frames));
                }
                if let Some(times) = s.repeat {
                    line.push_str(&format!(" repeat={}", times));
                }
                if s.is_async {
                    line.push_str(" async");
                }
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "directions": summaries,
                "diagnostics": director.diagnostics(),
            });
            match serde_json::to_string_pretty(&value) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    report_error(&format!("error: serialization failed: {}", e), output, quiet);
                    process::exit(1);
                }
            }
            return;
        }
    }
    runner::print_diagnostics(director.diagnostics(), quiet);
}

/// Report an error in the appropriate format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
