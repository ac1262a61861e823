//! # Rollout Driver
//!
//! Wires a policy onto one of the environments and runs whole episodes,
//! reporting the return of each. The binary in `main.rs` parses [`Args`] and
//! calls [`run`]; tests call [`run`] directly.
//!
//! Episodes go through [`TimeLimit`] so they end at the task's usual step
//! cap. With `--log` the engine telemetry is switched back on and the last
//! episode is written as CSV. With `--engine-options` a JSON object is merged
//! key by key over the engine options the environment starts with.

pub mod policy;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use envs::{
    acrobot, cartpole, AcrobotEnv, CartPoleEnv, Env, InfoValue, RenderMode, Space, TimeLimit,
    TRUNCATED_KEY,
};
use physics::{Engine, EngineOptions, EngineTelemetryOptions, ModelOptions};
use serde_json::Value;

use crate::policy::{AcrobotHeuristic, CartPoleHeuristic, Policy, RandomPolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EnvKind {
    Cartpole,
    Acrobot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    Random,
    /// Hand-written controller of the selected task
    Heuristic,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "rollout")]
#[command(version, about = "Run episodes of a classic-control environment", long_about = None)]
pub struct Args {
    /// Environment to run
    #[arg(long, value_enum, default_value_t = EnvKind::Cartpole)]
    pub env: EnvKind,

    /// Number of episodes
    #[arg(long, default_value_t = 1)]
    pub episodes: usize,

    /// Seed of the environment and the policy, drawn from entropy if absent
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
    pub policy: PolicyKind,

    /// Episode step cap, the task's usual cap if absent
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Print a frame of the scene after every step
    #[arg(long)]
    pub render: bool,

    /// Write the telemetry of the last episode to this CSV file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// JSON file merged over the engine options
    #[arg(long)]
    pub engine_options: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSummary {
    pub steps: usize,
    pub total_reward: f64,
    /// Ended by the step cap rather than by the task.
    pub truncated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Seed actually used, useful to replay a run seeded from entropy.
    pub seed: u64,
    pub episodes: Vec<EpisodeSummary>,
}

impl Summary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_return(&self) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        let total: f64 = self.episodes.iter().map(|e| e.total_reward).sum();
        total / self.episodes.len() as f64
    }
}

/// Runs the episodes described by `args`.
///
/// # Errors
///
/// Fails when the environment cannot be built, an option overlay is invalid,
/// the simulation fails, or the telemetry log cannot be written.
pub fn run(args: &Args) -> Result<Summary> {
    match args.env {
        EnvKind::Cartpole => {
            let mut env = CartPoleEnv::new().context("failed to build the cart-pole environment")?;
            configure_engine(env.simulator_mut(), args)?;
            let cap = args.max_steps.unwrap_or(cartpole::MAX_EPISODE_STEPS);
            let mut env = TimeLimit::new(env, cap);
            let seed = env.seed(args.seed);
            let mut policy: Box<dyn Policy> = match args.policy {
                PolicyKind::Random => Box::new(random_policy(env.action_space(), seed)),
                PolicyKind::Heuristic => Box::new(CartPoleHeuristic),
            };
            let episodes = run_episodes(&mut env, policy.as_mut(), args)?;
            finish(env.inner().simulator(), args)?;
            Ok(Summary { seed, episodes })
        }
        EnvKind::Acrobot => {
            let mut env = AcrobotEnv::new().context("failed to build the acrobot environment")?;
            configure_engine(env.simulator_mut(), args)?;
            let cap = args.max_steps.unwrap_or(acrobot::MAX_EPISODE_STEPS);
            let mut env = TimeLimit::new(env, cap);
            let seed = env.seed(args.seed);
            let mut policy: Box<dyn Policy> = match args.policy {
                PolicyKind::Random => Box::new(random_policy(env.action_space(), seed)),
                PolicyKind::Heuristic => Box::new(AcrobotHeuristic),
            };
            let episodes = run_episodes(&mut env, policy.as_mut(), args)?;
            finish(env.inner().simulator(), args)?;
            Ok(Summary { seed, episodes })
        }
    }
}

fn random_policy(space: &Space, seed: u64) -> RandomPolicy {
    // Offset so the policy does not replay the environment's draws.
    RandomPolicy::new(space.size(), seed.wrapping_add(1))
}

fn configure_engine(engine: &mut Engine, args: &Args) -> Result<()> {
    if let Some(path) = &args.engine_options {
        let options = load_overlay(engine.options(), path)?;
        engine
            .set_options(options)
            .with_context(|| format!("invalid engine options in {}", path.display()))?;
        tracing::info!(path = %path.display(), "engine options applied");
    }
    if args.log.is_some() {
        let mut options = engine.options().clone();
        options.telemetry = EngineTelemetryOptions::default();
        engine.set_options(options)?;
        engine.set_model_options(ModelOptions::default());
    }
    Ok(())
}

fn load_overlay(base: &EngineOptions, path: &Path) -> Result<EngineOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read engine options {}", path.display()))?;
    let overlay: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse engine options {}", path.display()))?;
    let mut merged = serde_json::to_value(base)?;
    merge(&mut merged, overlay);
    serde_json::from_value(merged)
        .with_context(|| format!("unknown or mistyped engine option in {}", path.display()))
}

/// Overwrites `base` with `overlay`, recursing into objects present in both.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn run_episodes<E>(env: &mut E, policy: &mut dyn Policy, args: &Args) -> Result<Vec<EpisodeSummary>>
where
    E: Env<Action = usize, Observation = [f64; 4]>,
{
    let mut episodes = Vec::with_capacity(args.episodes);
    for episode in 0..args.episodes {
        let mut observation = env.reset()?;
        let mut summary = EpisodeSummary { steps: 0, total_reward: 0.0, truncated: false };
        loop {
            let action = policy.act(&observation);
            let step = env.step(action)?;
            summary.steps += 1;
            summary.total_reward += step.reward;
            if args.render {
                println!("{}", env.render(RenderMode::Human)?);
            }
            observation = step.observation;
            if step.terminal {
                summary.truncated =
                    step.info.get(TRUNCATED_KEY) == Some(&InfoValue::Bool(true));
                break;
            }
        }
        tracing::info!(
            episode,
            steps = summary.steps,
            total_reward = summary.total_reward,
            truncated = summary.truncated,
            "episode finished"
        );
        episodes.push(summary);
    }
    env.close();
    Ok(episodes)
}

fn finish(engine: &Engine, args: &Args) -> Result<()> {
    if let Some(path) = &args.log {
        engine.write_log(path)?;
        tracing::info!(path = %path.display(), rows = engine.telemetry().len(), "telemetry written");
    }
    Ok(())
}
