//! End-to-end runs of the driver.

use std::fs;

use clap::Parser;
use rollout::{run, Args, EnvKind, PolicyKind};

fn args(line: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("rollout").chain(line.iter().copied())).unwrap()
}

#[test]
fn defaults_select_one_random_cartpole_episode() {
    let args = args(&[]);
    assert_eq!(args.env, EnvKind::Cartpole);
    assert_eq!(args.policy, PolicyKind::Random);
    assert_eq!(args.episodes, 1);
    assert_eq!(args.seed, None);
    assert_eq!(args.verbose, 0);
}

#[test]
fn unknown_environment_is_rejected() {
    let result = Args::try_parse_from(["rollout", "--env", "pendulum"]);
    assert!(result.is_err());
}

#[test]
fn cartpole_episodes_earn_one_per_step() {
    let summary = run(&args(&["--episodes", "3", "--seed", "1", "--policy", "heuristic"])).unwrap();
    assert_eq!(summary.seed, 1);
    assert_eq!(summary.episodes.len(), 3);
    for episode in &summary.episodes {
        assert!(episode.steps >= 1 && episode.steps <= 200);
        #[allow(clippy::cast_precision_loss)]
        let expected = episode.steps as f64;
        assert_eq!(episode.total_reward, expected);
        if episode.truncated {
            assert_eq!(episode.steps, 200);
        }
    }
}

#[test]
fn acrobot_runs_until_the_cap() {
    let summary = run(&args(&[
        "--env", "acrobot", "--seed", "2", "--max-steps", "20", "-vv",
    ]))
    .unwrap();
    let episode = &summary.episodes[0];
    assert_eq!(episode.steps, 20);
    assert_eq!(episode.total_reward, -20.0);
    assert!(episode.truncated);
    assert_eq!(summary.mean_return(), -20.0);
}

#[test]
fn same_seed_replays_the_run() {
    let line = ["--episodes", "2", "--seed", "5", "--max-steps", "30"];
    assert_eq!(run(&args(&line)).unwrap(), run(&args(&line)).unwrap());
}

#[test]
fn log_writes_telemetry_of_last_episode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cartpole.csv");
    let summary = run(&args(&[
        "--seed", "3", "--max-steps", "10", "--log", path.to_str().unwrap(),
    ]))
    .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Global.Time,q.slider_to_cart,q.cart_to_pole"));
    assert!(header.contains("Slider.position"));
    assert!(header.contains("u.slider_to_cart"));
    assert_eq!(lines.count(), summary.episodes[0].steps + 1);
}

#[test]
fn engine_options_overlay_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.json");
    fs::write(&path, r#"{ "stepper": { "solver": "explicit_euler", "dt_max": 0.0005 } }"#).unwrap();
    let summary = run(&args(&[
        "--seed", "4", "--max-steps", "5", "--engine-options", path.to_str().unwrap(),
    ]))
    .unwrap();
    assert_eq!(summary.episodes[0].steps, 5);
}

#[test]
fn misspelled_engine_option_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.json");
    fs::write(&path, r#"{ "stepper": { "dtmax": 0.0005 } }"#).unwrap();
    let result = run(&args(&["--engine-options", path.to_str().unwrap()]));
    assert!(result.is_err());
}

#[test]
fn render_prints_frames() {
    let summary = run(&args(&["--seed", "6", "--max-steps", "3", "--render"])).unwrap();
    assert_eq!(summary.episodes[0].steps, 3);
}
