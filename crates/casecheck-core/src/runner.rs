//! Runs one test case against one executable.

use crate::cases::TestCase;
use crate::compare::evaluate_case;
use crate::domain::{CapturedOutput, CheckFailure};
use crate::numerics::NumericTolerance;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Command prefix that launches the candidate inside a sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxWrapper {
    pub program: String,
    pub args: Vec<String>,
}

impl SandboxWrapper {
    pub const DEFAULT_COMMAND: &'static str = "firejail --quiet";

    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a wrapper command line on whitespace. `None` for a blank line.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self::new(program, words.collect()))
    }

    pub fn firejail() -> Self {
        Self::new("firejail", vec!["--quiet".to_string()])
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    pub sandbox: Option<SandboxWrapper>,
    pub tolerance: NumericTolerance,
    pub verbose: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CaseRunner {
    config: RunnerConfig,
}

impl CaseRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs `case` against `executable` once. `None` means every declared
    /// check passed.
    pub fn run(&self, case: &TestCase, executable: &Path) -> Option<CheckFailure> {
        let output = match self.capture(executable, &case.stdin_bytes()) {
            Ok(output) => output,
            Err(source) => {
                tracing::warn!(executable = %executable.display(), %source, "spawn failed");
                return Some(CheckFailure::new(format!(
                    "failed to execute '{}': {}",
                    executable.display(),
                    source
                )));
            }
        };
        evaluate_case(case, &output, self.config.tolerance)
    }

    pub fn command_for(&self, executable: &Path) -> Command {
        match &self.config.sandbox {
            Some(wrapper) => {
                let mut command = Command::new(&wrapper.program);
                command.args(&wrapper.args).arg(executable);
                command
            }
            None => Command::new(executable),
        }
    }

    /// Spawns the invocation, feeds `stdin` and waits for the child to exit.
    pub fn capture(&self, executable: &Path, stdin: &[u8]) -> io::Result<CapturedOutput> {
        let mut command = self.command_for(executable);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(?command, stdin_bytes = stdin.len(), "spawning candidate");

        let mut child = command.spawn()?;
        let child_stdin = child.stdin.take();

        // Input is written from its own thread so a child that fills its
        // output pipes before draining stdin cannot deadlock the run.
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match child_stdin {
                Some(mut pipe) => pipe.write_all(stdin),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            match writer.join() {
                Ok(Err(source)) if source.kind() != io::ErrorKind::BrokenPipe => {
                    tracing::warn!(%source, "failed to write candidate stdin");
                }
                Err(_) => tracing::warn!("stdin writer thread panicked"),
                _ => {}
            }
            output
        })?;

        let (stdout, stderr) = decode_streams(&output.stdout, &output.stderr);
        tracing::debug!(
            exit_code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "candidate exited"
        );
        Ok(CapturedOutput::new(output.status.code(), stdout, stderr))
    }
}

/// Decodes both streams as UTF-8, or both as Latin-9 if either is invalid.
pub fn decode_streams(stdout: &[u8], stderr: &[u8]) -> (String, String) {
    match (std::str::from_utf8(stdout), std::str::from_utf8(stderr)) {
        (Ok(stdout), Ok(stderr)) => (stdout.to_string(), stderr.to_string()),
        _ => {
            tracing::warn!("candidate output is not valid UTF-8; decoding as ISO-8859-15");
            (decode_latin9(stdout), decode_latin9(stderr))
        }
    }
}

/// ISO-8859-15 maps every byte to a character, so this never fails.
pub fn decode_latin9(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&byte| match byte {
            0xA4 => '\u{20AC}',
            0xA6 => '\u{0160}',
            0xA8 => '\u{0161}',
            0xB4 => '\u{017D}',
            0xB8 => '\u{017E}',
            0xBC => '\u{0152}',
            0xBD => '\u{0153}',
            0xBE => '\u{0178}',
            other => char::from(other),
        })
        .collect()
}
