use std::fmt;
use std::process::Command;

use crate::config::model::TransferSettings;
use crate::error::JobError;
use crate::job::{Failure, ResolvedJob};
use crate::util::command::{privileged_command, program_name, ProcessRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Copy `source` to `destination` with the transfer tool.
    Transfer,
    /// Abort the run unless `destination` exists.
    AssertExists,
    /// Run the command name itself as a program.
    Generic(String),
}

impl CommandKind {
    /// Case-insensitive lookup. Anything unrecognised runs as a program,
    /// keeping its original spelling.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        match name.to_ascii_lowercase().as_str() {
            "transfer" | "rsync" => CommandKind::Transfer,
            "assert-exists" | "fail" => CommandKind::AssertExists,
            _ => CommandKind::Generic(name.to_string()),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Transfer => f.write_str("transfer"),
            CommandKind::AssertExists => f.write_str("assert-exists"),
            CommandKind::Generic(program) => write!(f, "exec {}", program),
        }
    }
}

pub struct Registry<R> {
    transfer: TransferSettings,
    runner: R,
}

impl<R: ProcessRunner> Registry<R> {
    pub fn new(transfer: TransferSettings, runner: R) -> Self {
        Self { transfer, runner }
    }

    pub fn dispatch(&self, job: &ResolvedJob) -> Result<(), Failure> {
        match &job.kind {
            CommandKind::Transfer => {
                let mut cmd = self.transfer_command(job);
                self.run_checked(&mut cmd).map_err(Failure::Continue)
            }
            CommandKind::AssertExists => assert_exists(job).map_err(Failure::Abort),
            CommandKind::Generic(program) => {
                let mut cmd = generic_command(program, job);
                self.run_checked(&mut cmd).map_err(Failure::Continue)
            }
        }
    }

    fn transfer_command(&self, job: &ResolvedJob) -> Command {
        let mut cmd = privileged_command(&self.transfer.program, self.transfer.privileged);
        cmd.args(job.params.split_whitespace())
            .arg(&job.source)
            .arg(&job.destination);
        cmd
    }

    fn run_checked(&self, cmd: &mut Command) -> Result<(), JobError> {
        let rc = self.runner.status(cmd)?;
        if rc != 0 {
            return Err(JobError::Exit {
                program: program_name(cmd),
                code: rc,
            });
        }
        Ok(())
    }
}

/// `program params... [source] [destination]`. An empty source is left out
/// as well as an empty destination, so `touch,,,/mnt/stamp` runs
/// `touch /mnt/stamp` rather than passing `""` as an argument.
fn generic_command(program: &str, job: &ResolvedJob) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(job.params.split_whitespace());
    if !job.source.is_empty() {
        cmd.arg(&job.source);
    }
    if !job.destination.as_os_str().is_empty() {
        cmd.arg(&job.destination);
    }
    cmd
}

fn assert_exists(job: &ResolvedJob) -> Result<(), JobError> {
    if job.destination.as_os_str().is_empty() || !job.destination.exists() {
        return Err(JobError::PreconditionFailed(job.destination.clone()));
    }
    tracing::debug!("precondition met: {} exists", job.destination.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::util::command::command_line;

    /// Records every command line and answers with scripted exit codes.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub calls: RefCell<Vec<String>>,
        pub failing: Vec<String>,
    }

    impl RecordingRunner {
        pub fn failing_on(needle: &str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                failing: vec![needle.to_string()],
            }
        }
    }

    impl ProcessRunner for RecordingRunner {
        fn status(&self, cmd: &mut Command) -> Result<i32, JobError> {
            let line = command_line(cmd);
            let rc = if self.failing.iter().any(|f| line.contains(f)) { 23 } else { 0 };
            self.calls.borrow_mut().push(line);
            Ok(rc)
        }
    }

    fn job(kind: CommandKind, params: &str, source: &str, destination: &str) -> ResolvedJob {
        ResolvedJob {
            kind,
            params: params.to_string(),
            source: source.to_string(),
            destination: PathBuf::from(destination),
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(CommandKind::parse("RSYNC"), CommandKind::Transfer);
        assert_eq!(CommandKind::parse("Transfer"), CommandKind::Transfer);
        assert_eq!(CommandKind::parse("Assert-Exists"), CommandKind::AssertExists);
        assert_eq!(CommandKind::parse("fail"), CommandKind::AssertExists);
        assert_eq!(
            CommandKind::parse("MyTool"),
            CommandKind::Generic("MyTool".to_string())
        );
    }

    #[test]
    fn transfer_builds_argument_vector() {
        let runner = RecordingRunner::default();
        let registry = Registry::new(TransferSettings::default(), &runner);
        registry
            .dispatch(&job(
                CommandKind::Transfer,
                "-rtD --modify-window=1 --size-only",
                "/home/ada/my notes/",
                "/mnt/backup/3/",
            ))
            .expect("dispatch");
        let calls = runner.calls.borrow();
        assert_eq!(
            calls.as_slice(),
            ["rsync -rtD --modify-window=1 --size-only /home/ada/my notes/ /mnt/backup/3/"]
        );
    }

    #[test]
    fn privileged_transfer_goes_through_sudo() {
        let runner = RecordingRunner::default();
        let transfer = TransferSettings {
            program: "rsync".to_string(),
            privileged: true,
        };
        let registry = Registry::new(transfer, &runner);
        registry
            .dispatch(&job(CommandKind::Transfer, "-av", "/library/", "/mnt/library/"))
            .expect("dispatch");
        assert_eq!(
            runner.calls.borrow().as_slice(),
            ["sudo rsync -av /library/ /mnt/library/"]
        );
    }

    #[test]
    fn non_zero_exit_continues() {
        let runner = RecordingRunner::failing_on("rsync");
        let registry = Registry::new(TransferSettings::default(), &runner);
        let err = registry
            .dispatch(&job(CommandKind::Transfer, "-a", "/src/", "/dst/"))
            .unwrap_err();
        match err {
            Failure::Continue(JobError::Exit { program, code }) => {
                assert_eq!(program, "rsync");
                assert_eq!(code, 23);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_command_runs_literally() {
        let runner = RecordingRunner::default();
        let registry = Registry::new(TransferSettings::default(), &runner);
        registry
            .dispatch(&job(
                CommandKind::parse("TarUp"),
                "-c -f",
                "/src/",
                "",
            ))
            .expect("dispatch");
        assert_eq!(runner.calls.borrow().as_slice(), ["TarUp -c -f /src/"]);
    }

    #[test]
    fn generic_command_skips_empty_source() {
        let runner = RecordingRunner::default();
        let registry = Registry::new(TransferSettings::default(), &runner);
        registry
            .dispatch(&job(CommandKind::parse("touch"), "", "", "/mnt/stamp"))
            .expect("dispatch");
        assert_eq!(runner.calls.borrow().as_slice(), ["touch /mnt/stamp"]);
    }

    #[test]
    fn assert_exists_aborts_without_running_anything() {
        let tmp = TempDir::new().expect("tempdir");
        let runner = RecordingRunner::default();
        let registry = Registry::new(TransferSettings::default(), &runner);
        let missing = tmp.path().join("marker");
        let err = registry
            .dispatch(&job(CommandKind::AssertExists, "", "", missing.to_str().unwrap()))
            .unwrap_err();
        assert!(matches!(err, Failure::Abort(JobError::PreconditionFailed(ref p)) if *p == missing));
        std::fs::write(&missing, b"").expect("touch");
        registry
            .dispatch(&job(CommandKind::AssertExists, "", "", missing.to_str().unwrap()))
            .expect("marker present");
        assert!(runner.calls.borrow().is_empty());
    }
}
