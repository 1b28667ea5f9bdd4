//! Periodic cycle: read → compute → write at the configured period.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the requested CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! All four are no-ops without the `rt` feature.
//!
//! ## Cycle Loop
//! With `rt`: absolute-time sleep on `CLOCK_MONOTONIC`, a single overrun is
//! fatal. Without: `std::thread::sleep` pacing, overruns are only counted.
//! Either loop ends when the shared `running` flag is cleared or the
//! optional cycle limit is reached.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use taskik_common::actuator::ActuatorInterface;
use taskik_common::error::ControlError;
use taskik_common::kinematics::KinematicModel;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ControllerConfig;
use crate::controller::{CycleOutcome, TaskController};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
    /// Cycles that re-emitted the previous torque.
    pub held_cycles: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
            held_cycles: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during RT setup or cycle execution.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
    /// Controller rejected setup or a cycle.
    #[error("controller error: {0}")]
    Controller(#[from] ControlError),
    /// Cycle overrun detected (RT build only).
    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun {
        /// Actual cycle duration [ns].
        actual_ns: i64,
        /// Configured cycle budget [ns].
        budget_ns: i64,
    },
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the cycle never page-faults on it.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup sequence. Call once on the cycle thread before `run()`.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    debug!("RT setup done (core {cpu_core}, priority {rt_priority})");
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Drives a [`TaskController`] against an [`ActuatorInterface`] at a fixed
/// period until stopped.
pub struct CycleRunner<K: KinematicModel, A: ActuatorInterface> {
    controller: TaskController<K>,
    actuators: A,
    running: Arc<AtomicBool>,
    cycle_time_ns: i64,
    dt: f64,
    max_cycles: Option<u64>,
    stats: CycleStats,
}

impl<K: KinematicModel, A: ActuatorInterface> CycleRunner<K, A> {
    /// Build the controller and start it from the current actuator state.
    ///
    /// # Errors
    /// `CycleError::Controller` if setup or start fails.
    pub fn new(
        model: K,
        actuators: A,
        config: &ControllerConfig,
        running: Arc<AtomicBool>,
    ) -> Result<Self, CycleError> {
        let mut controller = TaskController::new(model, config)?;
        controller.start(&actuators)?;
        Ok(Self {
            controller,
            actuators,
            running,
            cycle_time_ns: i64::from(config.cycle_time_us) * 1000,
            dt: config.cycle_time_s(),
            max_cycles: None,
            stats: CycleStats::new(),
        })
    }

    /// Stop after `cycles` cycles even if `running` is still set.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    #[inline]
    pub fn controller(&self) -> &TaskController<K> {
        &self.controller
    }

    #[inline]
    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Run until stopped.
    pub fn run(&mut self) -> Result<(), CycleError> {
        self.run_with(|_, _| {})
    }

    /// Run until stopped, calling `plant(actuators, dt)` after every write.
    ///
    /// Simulated backends use `plant` to advance their dynamics.
    ///
    /// # Errors
    /// `CycleError::CycleOverrun` on the first overrun (RT build only), or
    /// `CycleError::RtSetup` if the monotonic clock cannot be read.
    pub fn run_with(&mut self, plant: impl FnMut(&mut A, f64)) -> Result<(), CycleError> {
        info!(
            "cycle loop entered: period {} us, {} joints",
            self.cycle_time_ns / 1000,
            self.controller.joint_count()
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(plant);
        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(plant);

        info!(
            "cycle loop left after {} cycles (avg {} ns, max {} ns, {} overruns, {} held)",
            self.stats.cycle_count,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns,
            self.stats.overruns,
            self.stats.held_cycles
        );
        result
    }

    fn should_continue(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self
                .max_cycles
                .is_none_or(|limit| self.stats.cycle_count < limit)
    }

    /// One controller update plus plant step.
    fn cycle_body(&mut self, plant: &mut impl FnMut(&mut A, f64)) -> Result<(), CycleError> {
        if let CycleOutcome::Held(_) = self.controller.update(self.dt, &mut self.actuators)? {
            self.stats.held_cycles += 1;
        }
        plant(&mut self.actuators, self.dt);
        Ok(())
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, mut plant: impl FnMut(&mut A, f64)) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        while self.should_continue() {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let wake_latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();

            self.cycle_body(&mut plant)?;

            let cycle_end = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns, wake_latency_ns);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, mut plant: impl FnMut(&mut A, f64)) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(self.cycle_time_ns as u64);

        while self.should_continue() {
            let cycle_start = Instant::now();

            self.cycle_body(&mut plant)?;

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
            }

            if let Some(remaining) = period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// `a − b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
