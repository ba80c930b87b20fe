use super::CliError;
use anyhow::Context;
use casecheck_core::cases::load_cases;
use casecheck_core::collapse_dirs::{CollapseAction, collapse_subdirectories};
use casecheck_core::domain::CaseCheckError;
use casecheck_core::numerics::NumericTolerance;
use casecheck_core::runner::{CaseRunner, RunnerConfig, SandboxWrapper};
use casecheck_core::session::run_session;
use std::path::PathBuf;

pub(super) struct RunCasesArgs {
    pub(super) cases: PathBuf,
    pub(super) executables: Vec<PathBuf>,
    pub(super) verbose: bool,
    pub(super) sandbox: Option<SandboxWrapper>,
    pub(super) tolerance: NumericTolerance,
}

pub(super) fn run_cases_command(args: RunCasesArgs) -> Result<i32, CliError> {
    let cases = load_cases(&args.cases)
        .map_err(|error| CliError::Harness(CaseCheckError::from(error)))?;
    tracing::debug!(
        path = %args.cases.display(),
        cases = cases.len(),
        executables = args.executables.len(),
        "loaded test cases"
    );

    let runner = CaseRunner::new(RunnerConfig {
        sandbox: args.sandbox,
        tolerance: args.tolerance,
        verbose: args.verbose,
    });

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_session(&cases, &args.executables, &runner, &mut out)
        .context("failed to write test transcript")?;
    Ok(0)
}

pub(super) fn run_collapse_dirs_command(dir: PathBuf, separator: &str) -> Result<i32, CliError> {
    let report = collapse_subdirectories(&dir, separator)
        .map_err(|error| CliError::Harness(CaseCheckError::from(error)))?;

    for action in &report.actions {
        match action {
            CollapseAction::Renamed { from, to } => {
                println!("renamed {} -> {}", from.display(), to.display());
            }
            CollapseAction::Removed { path, prefix } => {
                println!(
                    "removed {} (duplicate of '{}')",
                    path.display(),
                    prefix.to_string_lossy()
                );
            }
        }
    }
    println!(
        "{} renamed, {} removed",
        report.renamed_count(),
        report.removed_count()
    );
    Ok(0)
}
