//! # taskik Control Unit
//!
//! Runs the task-space IK torque controller against the simulated joint
//! backend from `taskik_hal`.
//!
//! Loads the controller config and the chain description, builds the DH
//! serial chain and simulated joints, performs RT setup and enters the
//! cycle loop. Desired-pose and gain updates arrive as text lines on stdin
//! (`pose X Y Z`, `gains ...`) and are applied asynchronously.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use taskik_common::kinematics::KinematicModel;
use taskik_control_unit::command::console::run_console;
use taskik_control_unit::config::{ControllerConfig, load_config};
use taskik_control_unit::cycle::{CycleRunner, rt_setup};
use taskik_hal::{SerialChain, SimulatedJoints, load_chain_config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// taskik Control Unit: task-space IK torque control loop
#[derive(Parser, Debug)]
#[command(name = "taskik_control_unit")]
#[command(version)]
#[command(about = "Task-space differential IK controller with per-joint PID torque output")]
struct Args {
    /// Controller configuration TOML.
    #[arg(long, default_value = "config/controller.toml")]
    config: PathBuf,

    /// Chain description TOML (segments, root/tip, simulation).
    #[arg(long, default_value = "config/chain.toml")]
    chain: PathBuf,

    /// Stop after this many cycles (default: run until Ctrl-C).
    #[arg(long)]
    cycles: Option<u64>,

    /// CPU core to pin the cycle thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Log at DEBUG regardless of `[shared] log_level`.
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // The log level lives in the config, so load it before the subscriber
    // exists and report a failure once tracing is up.
    let config = load_config(&args.config);
    let directive = match &config {
        Ok(cfg) => cfg.log_directive(args.verbose),
        Err(_) if args.verbose => "debug",
        Err(_) => "info",
    };
    setup_tracing(&args, directive);

    info!("taskik Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("taskik Control Unit shutdown complete");
}

fn run(args: &Args, config: &ControllerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let chain_config = load_chain_config(&args.chain)?;
    let chain = SerialChain::from_config(&chain_config)?;
    let joints = SimulatedJoints::from_config(chain.joint_count(), &chain_config.simulation)?;

    info!(
        "Config OK: service={}, cycle_time={}µs, joints={}",
        config.shared.service_name,
        config.cycle_time_us,
        chain.joint_count()
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::Release);
    })?;

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let mut runner = CycleRunner::new(chain, joints, config, running.clone())?;
    if let Some(cycles) = args.cycles {
        runner = runner.with_max_cycles(cycles);
    }

    // The console thread blocks on stdin and is not joined; it ends with the process.
    let handle = runner.controller().handle();
    let console_running = running.clone();
    std::thread::Builder::new()
        .name("taskik-console".to_string())
        .spawn(move || run_console(std::io::stdin().lock(), &handle, &console_running))?;

    if let Err(e) = runner.run_with(|sim, dt| sim.step(dt)) {
        error!("cycle loop error: {e}");
        return Err(Box::new(e));
    }
    running.store(false, Ordering::Release);

    let pose = runner.controller().measured_pose();
    info!(
        "final tip position ({:.4}, {:.4}, {:.4}), task error {:.2e}",
        pose.position.x,
        pose.position.y,
        pose.position.z,
        runner.controller().task_error().fixed_rows::<3>(0).norm()
    );
    Ok(())
}

/// Setup tracing subscriber. `RUST_LOG` wins over the configured directive.
fn setup_tracing(args: &Args, directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
