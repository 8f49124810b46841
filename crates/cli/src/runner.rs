//! Script runner: feeds a scene's commands to a Director and drives the
//! grid world until every direction has finished.

use std::path::Path;
use std::process;

use director_core::{Diagnostic, Director, GrammarRegistry, GridWorld, Heading, Host};
use serde::Serialize;

use crate::scene::SceneFile;
use crate::{load_scene, report_error, OutputFormat};

#[derive(Debug, Serialize)]
struct ActorReport {
    name: String,
    x: i32,
    y: i32,
    facing: Heading,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    frames: u64,
    actors: Vec<ActorReport>,
    diagnostics: &'a [Diagnostic],
}

/// A Director configured from the scene's `[director]` table.
pub(crate) fn director_for(scene: &SceneFile) -> Director {
    Director::with_config(GrammarRegistry::standard(), scene.director.clone())
}

/// Script lines with blanks and `#` comments removed.
fn script_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// One host frame: entities move, finished steps are reported, then the
/// Director ticks.
fn step(director: &mut Director, world: &mut GridWorld) {
    for entity in world.update() {
        director.actor_tick(entity);
    }
    director.tick(world);
}

pub(crate) fn cmd_run(
    scene_path: &Path,
    script_path: Option<&Path>,
    max_frames: u64,
    output: OutputFormat,
    quiet: bool,
) {
    let (scene, mut world) = load_scene(scene_path, output, quiet);

    let extra = match script_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                let msg = format!("error reading script '{}': {}", path.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        },
        None => String::new(),
    };

    let mut director = director_for(&scene);
    let mut frames = 0u64;
    let mut out_of_frames = false;

    let lines = scene
        .script
        .iter()
        .flat_map(|s| script_lines(s))
        .chain(script_lines(&extra));
    'script: for line in lines {
        tracing::info!(command = line, frame = director.frame(), "script");
        director.direct(&mut world, line);
        while director.is_waiting() {
            if frames >= max_frames {
                out_of_frames = true;
                break 'script;
            }
            step(&mut director, &mut world);
            frames += 1;
        }
    }
    while !out_of_frames && !director.is_idle() {
        if frames >= max_frames {
            out_of_frames = true;
            break;
        }
        step(&mut director, &mut world);
        frames += 1;
    }

    if out_of_frames {
        let msg = format!("error: script still running after {} frames", max_frames);
        report_error(&msg, output, quiet);
        process::exit(1);
    }

    let mut actors: Vec<ActorReport> = world
        .entities()
        .filter_map(|entity| {
            Some(ActorReport {
                name: world.name_of(entity)?,
                x: world.position(entity)?.x,
                y: world.position(entity)?.y,
                facing: world.facing(entity)?,
            })
        })
        .collect();
    actors.sort_by(|a, b| a.name.cmp(&b.name));

    let report = RunReport {
        frames,
        actors,
        diagnostics: director.diagnostics(),
    };
    match output {
        OutputFormat::Text => {
            if !quiet {
                println!("finished after {} frames", report.frames);
            }
            for a in &report.actors {
                println!("{} [{},{}] facing {}", a.name, a.x, a.y, a.facing);
            }
            print_diagnostics(report.diagnostics, quiet);
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                report_error(&format!("error: serialization failed: {}", e), output, quiet);
                process::exit(1);
            }
        },
    }
}

/// Text-mode diagnostics go to stderr so stdout stays the result.
pub(crate) fn print_diagnostics(diagnostics: &[Diagnostic], quiet: bool) {
    if quiet {
        return;
    }
    for d in diagnostics {
        eprintln!("{:?}: {}", d.severity, d.error);
    }
}
