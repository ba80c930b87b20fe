mod commands;
mod logging;

use casecheck_core::collapse_dirs::DEFAULT_SEPARATOR;
use casecheck_core::domain::CaseCheckError;
use casecheck_core::numerics::NumericTolerance;
use casecheck_core::runner::SandboxWrapper;
use clap::Parser;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    logging::init();
    report_exit(run(std::env::args().skip(1)))
}

pub fn run_collapse_dirs_from_env() -> i32 {
    logging::init();
    report_exit(run_collapse_dirs(std::env::args().skip(1)))
}

fn report_exit(result: Result<i32, CliError>) -> i32 {
    match result {
        Ok(code) => code,
        Err(error) => {
            let harness_error = error.as_harness_error();
            eprintln!("{}", harness_error.diagnostic_line());
            eprintln!("{}", harness_error.fatal_exit_line());
            harness_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cli = parse_args::<Cli, _, _>("casecheck", args)?;
    match cli {
        Some(cli) => commands::run_cases_command(cli.into_args()?),
        None => Ok(0),
    }
}

pub fn run_collapse_dirs<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cli = parse_args::<CollapseDirsCli, _, _>("casecheck-collapse-dirs", args)?;
    match cli {
        Some(cli) => commands::run_collapse_dirs_command(cli.dir, &cli.separator),
        None => Ok(0),
    }
}

/// `Ok(None)` when clap already printed help or version output.
fn parse_args<P, I, S>(program_name: &str, args: I) -> Result<Option<P>, CliError>
where
    P: Parser,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(program_name.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match P::try_parse_from(&full_args) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(None)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "casecheck",
    version,
    about = "Run executables against JSON test cases and check their observable behavior"
)]
struct Cli {
    /// JSON file containing the test cases
    #[arg(value_name = "CASES")]
    cases: PathBuf,

    /// Executables to test, in order
    #[arg(value_name = "EXECUTABLE", required = true)]
    executables: Vec<PathBuf>,

    /// Print the raw output and extracted values when a numeric check fails
    #[arg(long)]
    verbose: bool,

    /// Launch every executable through the sandbox wrapper
    #[arg(long, alias = "firejail")]
    sandbox: bool,

    /// Sandbox wrapper command line, prepended to each executable
    #[arg(long, value_name = "CMD", default_value = SandboxWrapper::DEFAULT_COMMAND)]
    sandbox_command: String,

    /// Relative tolerance for close_values
    #[arg(long, value_name = "F", default_value_t = NumericTolerance::DEFAULT_REL_TOL)]
    rel_tol: f64,

    /// Absolute tolerance for close_values
    #[arg(long, value_name = "F", default_value_t = NumericTolerance::DEFAULT_ABS_TOL)]
    abs_tol: f64,
}

impl Cli {
    fn into_args(self) -> Result<commands::RunCasesArgs, CliError> {
        for (flag, value) in [("--rel-tol", self.rel_tol), ("--abs-tol", self.abs_tol)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CliError::Usage(format!(
                    "Invalid value '{}' for '{}'; expected a non-negative number.",
                    value, flag
                )));
            }
        }

        let sandbox = if self.sandbox {
            let wrapper =
                SandboxWrapper::from_command_line(&self.sandbox_command).ok_or_else(|| {
                    CliError::Usage("'--sandbox-command' must not be empty.".to_string())
                })?;
            Some(wrapper)
        } else {
            None
        };

        Ok(commands::RunCasesArgs {
            cases: self.cases,
            executables: self.executables,
            verbose: self.verbose,
            sandbox,
            tolerance: NumericTolerance {
                rel_tol: self.rel_tol,
                abs_tol: self.abs_tol,
            },
        })
    }
}

#[derive(Parser)]
#[command(
    name = "casecheck-collapse-dirs",
    version,
    about = "Rename each `prefix<SEP>suffix` subdirectory to `prefix`, deleting later duplicates"
)]
struct CollapseDirsCli {
    /// Directory whose immediate subdirectories are collapsed
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Separator marking the end of the kept prefix
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    separator: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Harness(CaseCheckError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_harness_error(&self) -> CaseCheckError {
        match self {
            Self::Usage(message) => {
                CaseCheckError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Harness(error) => error.clone(),
            Self::Internal(error) => CaseCheckError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
