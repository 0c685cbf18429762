use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use rs_panda_ik::config::PandaConfig;
use rs_panda_ik::franka::FrankaPanda;
use rs_panda_ik::kinematics_impl::PandaKinematics;
use rs_panda_ik::simulation::KinematicSimulation;
use rs_panda_ik::test_poses::{hardcore_test_ee_poses, repeat};
use rs_panda_ik::utils::{format_joints, format_pos_quat};

/// Drives the simulated Panda through the hardcore test poses.
#[derive(Parser, Debug)]
#[command(version, about = "Franka Panda inverse kinematics demo")]
struct Args {
    /// Number of environments to spawn.
    #[arg(long = "num_envs", default_value_t = 64)]
    num_envs: usize,

    /// IK solver: cpu, gpu, levenberg_marquardt, jacobian or pinocchio_cpu.
    #[arg(long, default_value = "cpu")]
    ik_solver: String,

    /// YAML configuration, defaults are used if not given.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Physics steps to wait for the joints to settle, overrides the configuration.
    #[arg(long)]
    max_steps: Option<usize>,

    /// Steps to keep running with the gripper closed at the end.
    #[arg(long, default_value_t = 100)]
    run_steps: usize,

    /// Report solver timing.
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => PandaConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => PandaConfig::default(),
    };
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps;
    }
    config.verbose |= args.verbose;

    let articulation = KinematicSimulation::new(args.num_envs);
    let mut robot = FrankaPanda::new(articulation, Arc::new(PandaKinematics::default()), &config);
    let solver = robot.ik().resolve(&args.ik_solver);
    info!("{} environments, solver {}", args.num_envs, solver);

    robot.reset();
    for pose in hardcore_test_ee_poses() {
        let targets = repeat(&pose, args.num_envs);
        let (success, outcome) = robot
            .goto_ee_pos_quat(&targets, config.max_steps, solver)
            .context("Inverse kinematics failed")?;
        let solved = success.iter().filter(|s| **s).count();
        if solved < success.len() {
            warn!("{}: solved {} of {}", format_pos_quat(&pose), solved, success.len());
        } else {
            info!("{}: solved", format_pos_quat(&pose));
        }
        if let Some(joints) = robot.joint_position().first() {
            info!("{:?}, joints {}", outcome, format_joints(joints));
        }
    }

    robot.close_gripper();
    robot.let_run(args.run_steps);
    info!("Done after {} physics steps", robot.articulation().steps());
    Ok(())
}
