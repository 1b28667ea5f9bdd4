//! Line-oriented text commands for the update surface.
//!
//! ```text
//! pose X Y Z              desired tip position [m]
//! gains KP_0 .. KI_{N-1}  2N gains, all Kp then all Ki
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use taskik_common::error::ControlError;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::surface::ControllerHandle;

/// Decoded console command.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Set the desired tip position.
    Pose { x: f64, y: f64, z: f64 },
    /// Replace all gains from a flat `[Kp.., Ki..]` payload.
    Gains(Vec<f64>),
}

/// Malformed console line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (expected 'pose' or 'gains')")]
    UnknownCommand(String),
    #[error("'{0}' is not a number")]
    BadNumber(String),
    #[error("'pose' takes 3 values, got {0}")]
    PoseArity(usize),
    #[error("'gains' needs at least one value")]
    EmptyGains,
}

/// Decode one line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let keyword = words.next().unwrap_or_default();
    let values = words
        .map(|w| w.parse::<f64>().map_err(|_| ParseError::BadNumber(w.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    match keyword.to_ascii_lowercase().as_str() {
        "pose" => match values.as_slice() {
            &[x, y, z] => Ok(Some(ConsoleCommand::Pose { x, y, z })),
            other => Err(ParseError::PoseArity(other.len())),
        },
        "gains" if values.is_empty() => Err(ParseError::EmptyGains),
        "gains" => Ok(Some(ConsoleCommand::Gains(values))),
        _ => Err(ParseError::UnknownCommand(keyword.to_string())),
    }
}

/// Route a decoded command to the controller.
pub fn dispatch(handle: &ControllerHandle, command: &ConsoleCommand) -> Result<(), ControlError> {
    match command {
        ConsoleCommand::Pose { x, y, z } => handle.set_desired_pose(*x, *y, *z),
        ConsoleCommand::Gains(values) => handle.set_gains(values),
    }
}

/// Read commands from `reader` until EOF or until `running` is cleared.
///
/// Malformed lines and rejected updates are logged and skipped.
pub fn run_console<R: BufRead>(reader: R, handle: &ControllerHandle, running: &Arc<AtomicBool>) {
    info!(
        "command console ready: 'pose X Y Z' or 'gains' with {} values",
        2 * handle.joint_count()
    );
    for line in reader.lines() {
        if !running.load(Ordering::Acquire) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("console read failed: {e}");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some(command)) => {
                if dispatch(handle, &command).is_ok() {
                    debug!("applied {command:?}");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("ignored console line: {e}"),
        }
    }
    debug!("command console closed");
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::surface::SharedCommands;
    use crate::control::pid::{GainSet, PidGains};
    use nalgebra::Vector3;
    use std::io::Cursor;

    fn handle(n: usize) -> ControllerHandle {
        let gains = GainSet::uniform(
            n,
            PidGains {
                kp: 100.0,
                ki: 1.0,
                kd: 0.0,
            },
        );
        ControllerHandle::new(Arc::new(SharedCommands::new(n, gains)))
    }

    #[test]
    fn parse_pose() {
        assert_eq!(
            parse_line("pose 0.1 -0.2 3e-1").unwrap(),
            Some(ConsoleCommand::Pose {
                x: 0.1,
                y: -0.2,
                z: 0.3
            })
        );
        assert!(parse_line("  POSE 1 2 3 ").unwrap().is_some());
    }

    #[test]
    fn parse_gains() {
        assert_eq!(
            parse_line("gains 10 20 0.1 0.2").unwrap(),
            Some(ConsoleCommand::Gains(vec![10.0, 20.0, 0.1, 0.2]))
        );
    }

    #[test]
    fn parse_ignores_blank_and_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# pose 1 2 3").unwrap(), None);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            parse_line("jump 1").unwrap_err(),
            ParseError::UnknownCommand("jump".to_string())
        );
        assert_eq!(parse_line("pose 1 2").unwrap_err(), ParseError::PoseArity(2));
        assert_eq!(
            parse_line("pose 1 two 3").unwrap_err(),
            ParseError::BadNumber("two".to_string())
        );
        assert_eq!(parse_line("gains").unwrap_err(), ParseError::EmptyGains);
    }

    #[test]
    fn console_applies_valid_lines_and_skips_bad_ones() {
        let h = handle(2);
        let running = Arc::new(AtomicBool::new(true));
        let input = "pose 0.5 0.0 0.25\nbogus\ngains 1 2 3\ngains 10 20 0.5 0.6\n";
        run_console(Cursor::new(input), &h, &running);

        assert_eq!(h.desired_pose().position, Vector3::new(0.5, 0.0, 0.25));
        assert_eq!(h.gains().get(1).kp, 20.0);
        assert_eq!(h.gains().get(1).ki, 0.6);
        assert_eq!(h.rejected_updates(), 1);
    }

    #[test]
    fn console_stops_when_flag_cleared() {
        let h = handle(1);
        let running = Arc::new(AtomicBool::new(false));
        run_console(Cursor::new("pose 1 1 1\n"), &h, &running);
        assert_eq!(h.desired_pose().position, Vector3::zeros());
    }
}
