//! CLI integration tests for the `run` and `parse` subcommands.
//!
//! Uses `assert_cmd` to spawn the `director` binary and verify exit
//! codes, stdout content, and stderr content. Scenes are written to a
//! fresh temp directory per test.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn director() -> Command {
    let mut cmd = cargo_bin_cmd!("director");
    cmd.env_remove("DIRECTOR_LOG");
    cmd
}

/// A 10x10 scene with HERO (the player) at [1,1] and GUARD at [6,6],
/// plus `extra` appended verbatim.
fn write_scene(dir: &TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("scene.toml");
    let text = format!(
        r#"width = 10
height = 10
player = "hero"
{extra}

[[actors]]
name = "hero"
id = 1
position = [1, 1]

[[actors]]
name = "guard"
id = 2
position = [6, 6]
"#
    );
    fs::write(&path, text).unwrap();
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    director()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Director script runner"));
}

#[test]
fn version_exits_0() {
    director()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("director"));
}

// ──────────────────────────────────────────────
// 2. run
// ──────────────────────────────────────────────

#[test]
fn run_moves_the_player() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(
        &dir,
        r#"script = ["DIRECT PLAYER TO MOVE EAST 2 THEN FACE NORTH"]"#,
    );
    director()
        .arg("run")
        .arg(&scene)
        .assert()
        .success()
        .stdout(predicate::str::contains("finished after"))
        .stdout(predicate::str::contains("HERO [3,1] facing NORTH"))
        .stdout(predicate::str::contains("GUARD [6,6] facing SOUTH"));
}

#[test]
fn run_appends_the_script_file() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "");
    let script = dir.path().join("moves.txt");
    fs::write(
        &script,
        concat!(
            "# guard first\n",
            "DIRECT GUARD TO MOVE NORTH 2\n",
            "\n",
            "DIRECTOR WAIT ALL\n",
            "DIRECT PLAYER TO FACE EAST\n",
        ),
    )
    .unwrap();
    director()
        .arg("run")
        .arg(&scene)
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("GUARD [6,4] facing NORTH"))
        .stdout(predicate::str::contains("HERO [1,1] facing EAST"));
}

#[test]
fn run_json_reports_actors_and_diagnostics() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, r#"script = ["DIRECT NOBODY TO DANCE"]"#);
    let out = director()
        .args(["--output", "json", "run"])
        .arg(&scene)
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["actors"].as_array().unwrap().len(), 2);
    assert_eq!(report["actors"][1]["name"], "HERO");
    assert!(!report["diagnostics"].as_array().unwrap().is_empty());
}

#[test]
fn run_gives_up_after_the_frame_budget() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, r#"script = ["DIRECT PLAYER TO MOVE TO [8,8]"]"#);
    director()
        .arg("run")
        .arg(&scene)
        .args(["--frames", "3"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("still running after 3 frames"));
}

#[test]
fn run_missing_scene_exits_1() {
    director()
        .args(["run", "does/not/exist.toml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading scene"));
}

#[test]
fn run_bad_toml_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "width = ten\n").unwrap();
    director()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error parsing scene"));
}

#[test]
fn run_unknown_player_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scene.toml");
    fs::write(&path, "width = 4\nheight = 4\nplayer = \"ghost\"\n").unwrap();
    director()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn quiet_suppresses_errors() {
    director()
        .args(["--quiet", "run", "does/not/exist.toml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 3. parse
// ──────────────────────────────────────────────

#[test]
fn parse_resolves_actors_against_the_scene() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "");
    director()
        .args(["parse", "DIRECT PLAYER TO MOVE TO [3,12]", "--scene"])
        .arg(&scene)
        .assert()
        .success()
        .stdout(predicate::str::contains("MOVE"))
        .stdout(predicate::str::contains("actors=[HERO]"));
}

#[test]
fn parse_json_lists_every_clause() {
    let out = director()
        .args([
            "--output",
            "json",
            "parse",
            "DIRECTOR WAIT FOR 2 FRAMES THEN WAIT FOR 3 FRAMES",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let directions = value["directions"].as_array().unwrap();
    assert_eq!(directions.len(), 2);
    assert_eq!(directions[0]["verb"], "WAIT");
    assert_eq!(directions[0]["directed_to"], "director");
    assert_eq!(directions[1]["duration"], 3);
}

#[test]
fn parse_without_directions_says_so() {
    director()
        .args(["parse", "DIRECT NOBODY TO DANCE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no directions"));
}
