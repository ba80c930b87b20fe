use crate::cases::TestCase;
use crate::runner::CaseRunner;
use std::io::{self, Write};
use std::path::PathBuf;

/// Runs every case against every executable, streaming the transcript to `out`.
///
/// Case outcomes never affect the return value; only write errors do.
pub fn run_session<W: Write>(
    cases: &[TestCase],
    executables: &[PathBuf],
    runner: &CaseRunner,
    out: &mut W,
) -> io::Result<()> {
    for executable in executables {
        tracing::info!(executable = %executable.display(), cases = cases.len(), "testing executable");
        writeln!(out, "{}", executable.display())?;

        for (index, case) in cases.iter().enumerate() {
            write!(out, "test {}: ", case.label(index))?;
            out.flush()?;

            match runner.run(case, executable) {
                None => writeln!(out, "OK")?,
                Some(failure) => {
                    if runner.config().verbose {
                        if let Some(diagnostics) = &failure.diagnostics {
                            writeln!(out, "{}", diagnostics)?;
                        }
                    }
                    writeln!(out, "{}", failure.message)?;
                }
            }
        }
        writeln!(out)?;
    }
    out.flush()
}
