use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::JobError;
use crate::types::RunMode;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs an external command to completion and reports its exit code.
pub trait ProcessRunner {
    fn status(&self, cmd: &mut Command) -> Result<i32, JobError>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn status(&self, cmd: &mut Command) -> Result<i32, JobError> {
        (**self).status(cmd)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    run_mode: RunMode,
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(run_mode: RunMode) -> Self {
        Self {
            run_mode,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ProcessRunner for SystemRunner {
    fn status(&self, cmd: &mut Command) -> Result<i32, JobError> {
        maybe_print_command(cmd, self.run_mode);
        if self.run_mode.dry_run {
            return Ok(0);
        }
        let program = program_name(cmd);
        let mut child = cmd.spawn().map_err(|source| JobError::Spawn {
            program: program.clone(),
            source,
        })?;
        let status = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit, &program)?,
            None => child.wait().map_err(|source| JobError::Wait {
                program: program.clone(),
                source,
            })?,
        };
        Ok(status.code().unwrap_or(1))
    }
}

fn wait_with_deadline(child: &mut Child, limit: Duration, program: &str) -> Result<ExitStatus, JobError> {
    let deadline = Instant::now() + limit;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(JobError::Timeout {
                        program: program.to_string(),
                        secs: limit.as_secs(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                return Err(JobError::Wait {
                    program: program.to_string(),
                    source,
                })
            }
        }
    }
}

pub fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().to_string()
}

pub fn command_line(cmd: &Command) -> String {
    let mut parts = vec![program_name(cmd)];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().to_string()));
    parts.join(" ")
}

pub fn maybe_print_command(cmd: &Command, run_mode: RunMode) {
    if run_mode.dry_run {
        tracing::info!("dry-run: {}", command_line(cmd));
    } else if run_mode.verbose {
        tracing::info!("exec: {}", command_line(cmd));
    } else {
        tracing::debug!("exec: {}", command_line(cmd));
    }
}

/// `program` itself, or `sudo program` when privileged.
pub fn privileged_command(program: &str, privileged: bool) -> Command {
    if privileged {
        let mut cmd = Command::new("sudo");
        cmd.arg(program);
        cmd
    } else {
        Command::new(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_program_and_args() {
        let mut cmd = privileged_command("rsync", true);
        cmd.arg("-a").arg("/src/").arg("/dst/");
        assert_eq!(command_line(&cmd), "sudo rsync -a /src/ /dst/");
        assert_eq!(program_name(&cmd), "sudo");
    }

    #[test]
    fn dry_run_does_not_spawn() {
        let runner = SystemRunner::new(RunMode {
            dry_run: true,
            verbose: false,
        });
        let mut cmd = Command::new("/nonexistent/program");
        assert_eq!(runner.status(&mut cmd).expect("dry-run"), 0);
    }

    #[test]
    fn exit_codes_are_reported() {
        let runner = SystemRunner::default();
        assert_eq!(runner.status(&mut Command::new("true")).expect("true"), 0);
        assert_eq!(runner.status(&mut Command::new("false")).expect("false"), 1);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let runner = SystemRunner::default();
        let err = runner
            .status(&mut Command::new("/nonexistent/program"))
            .unwrap_err();
        assert!(matches!(err, JobError::Spawn { .. }));
    }

    #[test]
    fn slow_command_is_killed_at_the_deadline() {
        let runner = SystemRunner::default().with_timeout(Some(Duration::from_millis(200)));
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let started = Instant::now();
        let err = runner.status(&mut cmd).unwrap_err();
        assert!(matches!(err, JobError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
