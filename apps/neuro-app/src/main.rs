//! Panda reach command-line runner.
//!
//! Provides two modes of operation:
//! - `run`: Roll out random-policy episodes on the kinematic backend
//! - `info`: Print the scene's spaces and episode settings

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use neuro_core::prelude::*;
use neuro_env::env::OBSERVATION_BOUND;
use neuro_env::prelude::*;
use neuro_env::world::GOAL_DIM;
use neuro_sim::KinematicBackend;

const DEFAULT_SCENE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/panda.toml");

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Goal-conditioned Panda reach environment.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Scene configuration file.
    #[arg(short, long, global = true, default_value = DEFAULT_SCENE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run random-policy episodes and print statistics.
    Run {
        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: u32,

        /// Override the scene's step budget.
        #[arg(short, long)]
        max_steps: Option<u32>,

        /// Random seed. Falls back to the scene seed, then to entropy.
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Print observation/action spaces and episode settings.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RunStats {
    episodes: u32,
    successes: u32,
    total_steps: u64,
}

fn build_env(config: &Path) -> Result<NeuroRoboticsEnv<KinematicBackend>, NeuroError> {
    let scene = SceneConfig::from_file(config)?;
    NeuroRoboticsEnv::new(KinematicBackend::new(), scene)
}

fn run_episodes(
    config: &Path,
    episodes: u32,
    max_steps: Option<u32>,
    seed: Option<u64>,
) -> Result<RunStats, NeuroError> {
    let env = build_env(config)?;
    let mut env = match max_steps {
        Some(max) => TimeLimit::new(env, max),
        None => TimeLimit::from_config(env),
    };

    let root = env.seed(seed)?;
    info!(seed = root, max_steps = env.max_episode_steps(), "starting rollouts");
    let mut policy_rng = SeedHierarchy::new(root).subsystem_rng("policy");
    let action_space = env.env().action_space().clone();

    let mut stats = RunStats::default();
    for ep in 0..episodes {
        env.reset()?;
        let outcome = loop {
            let action = action_space.sample(&mut policy_rng);
            let step = env.step(&action)?;
            if step.done || step.info.truncated {
                break step;
            }
        };

        let episode = env.env().episode();
        let success = outcome.info.is_success;
        println!(
            "episode {}: steps={}, reward={:.1}, success={success}",
            ep + 1,
            episode.step_count,
            episode.total_reward
        );
        stats.episodes += 1;
        stats.successes += u32::from(success);
        stats.total_steps += u64::from(episode.step_count);
    }

    env.close();
    Ok(stats)
}

fn run_info(config: &Path) -> Result<(), NeuroError> {
    let scene = SceneConfig::from_file(config)?;
    scene.validate()?;
    let observation_space = ObservationSpace::goal_conditioned(OBSERVATION_DIM, GOAL_DIM, OBSERVATION_BOUND);
    let action_space = ActionSpace::normalized(ACTION_DIM);

    println!("neuro v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("scene:        {}", config.display());
    println!("robot:        {}", scene.robot.description.display());
    println!("observation:  {:?}", observation_space.shape());
    println!("action:       {:?}", action_space.shape());
    println!("control dt:   {:.3} s", scene.sim.control_dt());
    println!("threshold:    {} m", scene.episode.distance_threshold);
    match scene.episode.max_episode_steps {
        Some(max) => println!("max steps:    {max}"),
        None => println!("max steps:    unlimited"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<(), NeuroError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run {
            episodes,
            max_steps,
            seed,
        }) => {
            let stats = run_episodes(&cli.config, episodes, max_steps, seed)?;
            println!(
                "\ntotal: episodes={}, successes={}, steps={}",
                stats.episodes, stats.successes, stats.total_steps
            );
            if stats.successes == 0 && stats.episodes > 0 {
                warn!("no episode reached the goal");
            }
        }
        Some(Commands::Info) => run_info(&cli.config)?,
        None => {
            run_episodes(&cli.config, 1, None, None)?;
        }
    }
    Ok(())
}
