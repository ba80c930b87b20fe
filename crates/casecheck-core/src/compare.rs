//! Expectation checks applied to a captured process run.
//!
//! Each check returns `Ok(())` on success or a [`CheckFailure`]. The case
//! evaluator walks [`CheckField::ORDER`] and stops at the first failure.

use crate::cases::TestCase;
use crate::domain::{CapturedOutput, CheckFailure, CheckField};
use crate::numerics::{NumericTolerance, closest, format_value, within_tolerance};
use regex::Regex;
use similar::TextDiff;
use std::sync::LazyLock;

pub type CheckOutcome = Result<(), CheckFailure>;

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?[0-9]+\.?[0-9]*(?:[eE][-+]?[0-9]+)?")
        .expect("number pattern should compile")
});

const DIFF_CONTEXT_LINES: usize = 3;

/// Runs every declared check in fixed order; returns the first failure.
pub fn evaluate_case(
    case: &TestCase,
    output: &CapturedOutput,
    tolerance: NumericTolerance,
) -> Option<CheckFailure> {
    CheckField::ORDER.iter().copied().find_map(|field| {
        let outcome = check_field(field, case, output, tolerance)?;
        match outcome {
            Ok(()) => {
                tracing::debug!(field = %field, "check passed");
                None
            }
            Err(failure) => {
                tracing::debug!(field = %field, "check failed");
                Some(failure)
            }
        }
    })
}

/// `None` when the case does not declare `field`.
fn check_field(
    field: CheckField,
    case: &TestCase,
    output: &CapturedOutput,
    tolerance: NumericTolerance,
) -> Option<CheckOutcome> {
    match field {
        CheckField::Error => Some(check_error(case.error, output)),
        CheckField::Stdout => case
            .stdout
            .as_deref()
            .map(|expected| check_stdout(expected, output)),
        CheckField::Stderr => case
            .stderr
            .as_deref()
            .map(|expected| check_stderr(expected, output)),
        CheckField::InStdout => case
            .in_stdout
            .as_deref()
            .map(|substrings| check_in_stdout(substrings, output)),
        CheckField::CloseValues => case
            .close_values
            .as_deref()
            .map(|targets| check_close_values(targets, output, tolerance)),
    }
}

pub fn check_error(expected_error: bool, output: &CapturedOutput) -> CheckOutcome {
    match (expected_error, output.succeeded()) {
        (true, true) => Err(CheckFailure::new("should have returned an error")),
        (false, false) => Err(CheckFailure::new("should not have returned an error")),
        _ => Ok(()),
    }
}

pub fn check_stdout(expected: &str, output: &CapturedOutput) -> CheckOutcome {
    check_exact_text(expected, &output.stdout, "differences in output")
}

pub fn check_stderr(expected: &str, output: &CapturedOutput) -> CheckOutcome {
    check_exact_text(expected, &output.stderr, "differences in standard error")
}

fn check_exact_text(expected: &str, obtained: &str, heading: &str) -> CheckOutcome {
    if expected == obtained {
        return Ok(());
    }
    Err(CheckFailure::new(format!(
        "{}\n{}",
        heading,
        unified_diff(expected, obtained)
    )))
}

/// Line-based unified diff labelled `expected` / `obtained`. A missing final
/// newline on either side is shown with a `\ No newline at end of file` line.
pub fn unified_diff(expected: &str, obtained: &str) -> String {
    let diff = TextDiff::from_lines(expected, obtained);
    diff.unified_diff()
        .context_radius(DIFF_CONTEXT_LINES)
        .header("expected", "obtained")
        .to_string()
        .trim_end_matches('\n')
        .to_string()
}

pub fn check_in_stdout(substrings: &[String], output: &CapturedOutput) -> CheckOutcome {
    match substrings
        .iter()
        .find(|substring| !output.stdout.contains(substring.as_str()))
    {
        Some(missing) => Err(CheckFailure::new(format!(
            "expected string {} not in output",
            quote_text(missing)
        ))),
        None => Ok(()),
    }
}

/// Quotes `text` for failure messages: single quotes unless the text holds a
/// single quote and no double quote, with control characters escaped.
fn quote_text(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(quote);
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            ch if ch == quote => {
                quoted.push('\\');
                quoted.push(ch);
            }
            ch if ch.is_ascii_control() => {
                quoted.push_str(&format!("\\x{:02x}", u32::from(ch)));
            }
            ch => quoted.push(ch),
        }
    }
    quoted.push(quote);
    quoted
}

/// Integer targets keep their JSON spelling (`5`); float targets render
/// through [`format_value`] (`5.0`).
fn format_target(target: &serde_json::Number) -> String {
    match target.as_f64() {
        Some(value) if target.is_f64() => format_value(value),
        _ => target.to_string(),
    }
}

pub fn check_close_values(
    targets: &[serde_json::Number],
    output: &CapturedOutput,
    tolerance: NumericTolerance,
) -> CheckOutcome {
    let values = extract_sorted_values(&output.stdout);
    if values.is_empty() {
        if targets.is_empty() {
            return Ok(());
        }
        return Err(CheckFailure::new("numeric values expected in the output"));
    }

    for target in targets {
        let target_value = target.as_f64().unwrap_or(f64::NAN);
        let nearest = closest(&values, target_value);
        if !within_tolerance(target_value, nearest, tolerance) {
            return Err(CheckFailure::new(format!(
                "{} expected in the output, closest value is {}",
                format_target(target),
                format_value(nearest)
            ))
            .with_diagnostics(format!(
                "output: {}\nvalues: {}",
                output.stdout,
                render_values(&values)
            )));
        }
    }
    Ok(())
}

/// Every float-looking token in `text`, parsed and sorted ascending.
pub fn extract_sorted_values(text: &str) -> Vec<f64> {
    let mut values = NUMBER_PATTERN
        .find_iter(text)
        .filter_map(|token| token.as_str().parse::<f64>().ok())
        .collect::<Vec<_>>();
    values.sort_by(f64::total_cmp);
    values
}

fn render_values(values: &[f64]) -> String {
    let rendered = values
        .iter()
        .map(|value| format_value(*value))
        .collect::<Vec<_>>();
    format!("[{}]", rendered.join(", "))
}
