#![cfg(unix)]

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

#[test]
fn runs_every_case_for_every_executable_in_order() {
    let temp = TempDir::new().expect("tempdir should be created");
    let cases_path = write_file(
        temp.path(),
        "cases.json",
        r#"
        [
          { "name": "sum", "numeric_input": [2, 3], "close_values": [5.0] },
          { "input": "bad\n", "error": true },
          { "stdout": "hello\n" }
        ]
        "#,
    );
    let good = write_file(
        temp.path(),
        "good.sh",
        "read a\nread b\nif [ \"$a\" = bad ]; then exit 1; fi\nif [ -n \"$a\" ]; then echo $((a + b)); else echo hello; fi\n",
    );
    let lazy = write_file(temp.path(), "lazy.sh", "printf hello\n");

    let output = run_casecheck(&[
        OsStr::new("--sandbox"),
        OsStr::new("--sandbox-command"),
        OsStr::new("sh"),
        cases_path.as_os_str(),
        good.as_os_str(),
        lazy.as_os_str(),
    ]);

    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = format!(
        "{good}\n\
         test 0 (sum): OK\n\
         test 1: OK\n\
         test 2: OK\n\
         \n\
         {lazy}\n\
         test 0 (sum): numeric values expected in the output\n\
         test 1: should have returned an error\n\
         test 2: differences in output\n\
         --- expected\n\
         +++ obtained\n\
         @@ -1 +1 @@\n\
         -hello\n\
         +hello\n\
         \\ No newline at end of file\n\
         \n",
        good = good.display(),
        lazy = lazy.display()
    );
    assert_eq!(stdout, expected);
}

#[test]
fn failing_cases_do_not_change_exit_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let cases_path = write_file(temp.path(), "cases.json", r#"[{ "in_stdout": ["bar"] }]"#);

    let output = run_casecheck(&[
        cases_path.as_os_str(),
        temp.path().join("does-not-exist").as_os_str(),
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("test 0: failed to execute"),
        "spawn failure should be reported inline"
    );
}

#[test]
fn verbose_mode_prints_numeric_diagnostics() {
    let temp = TempDir::new().expect("tempdir should be created");
    let cases_path = write_file(temp.path(), "cases.json", r#"[{ "close_values": [2.0] }]"#);
    let script = write_file(temp.path(), "values.sh", "echo 1 3\n");

    let quiet = run_casecheck(&[
        OsStr::new("--sandbox"),
        OsStr::new("--sandbox-command"),
        OsStr::new("sh"),
        cases_path.as_os_str(),
        script.as_os_str(),
    ]);
    let quiet_stdout = String::from_utf8_lossy(&quiet.stdout);
    assert!(quiet_stdout.contains("test 0: 2.0 expected in the output, closest value is 1.0\n"));
    assert!(!quiet_stdout.contains("values: "));

    let verbose = run_casecheck(&[
        OsStr::new("--verbose"),
        OsStr::new("--firejail"),
        OsStr::new("--sandbox-command"),
        OsStr::new("sh"),
        cases_path.as_os_str(),
        script.as_os_str(),
    ]);
    let verbose_stdout = String::from_utf8_lossy(&verbose.stdout);
    assert!(verbose_stdout.contains("test 0: output: 1 3\n\nvalues: [1.0, 3.0]\n"));
    assert!(verbose_stdout.contains("2.0 expected in the output, closest value is 1.0\n"));
}

#[test]
fn custom_tolerance_widens_close_values_check() {
    let temp = TempDir::new().expect("tempdir should be created");
    let cases_path = write_file(temp.path(), "cases.json", r#"[{ "close_values": [3.14] }]"#);
    let script = write_file(temp.path(), "pi.sh", "echo 3.14159\n");

    let output = run_casecheck(&[
        OsStr::new("--abs-tol"),
        OsStr::new("0.01"),
        OsStr::new("--sandbox"),
        OsStr::new("--sandbox-command"),
        OsStr::new("sh"),
        cases_path.as_os_str(),
        script.as_os_str(),
    ]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("test 0: OK\n"));
}

#[test]
fn invalid_case_file_is_fatal() {
    let temp = TempDir::new().expect("tempdir should be created");
    let cases_path = write_file(
        temp.path(),
        "cases.json",
        r#"[{ "input": "1", "numeric_input": [1] }]"#,
    );

    let output = run_casecheck(&[cases_path.as_os_str(), OsStr::new("/bin/true")]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty(), "nothing should run");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(
        "ERROR: [INPUT.CASE_SPEC] case 0 declares both 'input' and 'numeric_input'"
    ));
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
}

#[test]
fn missing_case_file_is_io_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = run_casecheck(&[
        temp.path().join("missing.json").as_os_str(),
        OsStr::new("/bin/true"),
    ]);

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[IO.CASE_FILE]"));
}

#[test]
fn usage_errors_exit_with_input_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let cases_path = write_file(temp.path(), "cases.json", "[]");

    let no_executables = run_casecheck(&[cases_path.as_os_str()]);
    assert_eq!(no_executables.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&no_executables.stderr).contains("[INPUT.CLI_USAGE]"));

    let negative = run_casecheck(&[
        OsStr::new("--rel-tol=-1"),
        cases_path.as_os_str(),
        OsStr::new("/bin/true"),
    ]);
    assert_eq!(negative.status.code(), Some(2));
}

#[test]
fn help_exits_successfully() {
    let output = run_casecheck(&[OsStr::new("--help")]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--sandbox"));
}

#[test]
fn collapse_dirs_binary_renames_and_removes() {
    let temp = TempDir::new().expect("tempdir should be created");
    for name in ["ana_1", "ana_2", "ben_9"] {
        fs::create_dir(temp.path().join(name)).expect("subdir should be created");
    }

    let output = Command::new(env!("CARGO_BIN_EXE_casecheck-collapse-dirs"))
        .arg(temp.path())
        .arg("--separator")
        .arg("_")
        .output()
        .expect("collapse binary should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.contains("(duplicate of 'ana')"));
    assert!(stdout.ends_with("2 renamed, 1 removed\n"));
    assert!(temp.path().join("ana").is_dir());
    assert!(temp.path().join("ben").is_dir());
    assert!(!temp.path().join("ana_2").exists());
}

fn run_casecheck(args: &[&OsStr]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_casecheck"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("casecheck binary should run")
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("file should be written");
    path
}
