// fusion_replay/tests/cli_exit.rs

//! Runs the built binary to check its exit status and messages.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fusion_replay(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fusion_replay"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn tmp_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name)
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_missing_input_file_fails() {
    let input = tmp_path("does_not_exist/in.txt");
    let output = tmp_path("cli_exit_unused_out.txt");
    let result = fusion_replay(&[input.to_str().unwrap(), output.to_str().unwrap()]);

    assert!(!result.status.success());
    let stderr = stderr_of(&result);
    assert!(
        stderr.starts_with(&format!("Cannot open input file: {}", input.display())),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_unwritable_output_file_fails() {
    let input = tmp_path("cli_exit_in.txt");
    std::fs::write(&input, "L 1.0 2.0 0\n").unwrap();
    let output = tmp_path("no_such_dir/out.txt");
    let result = fusion_replay(&[input.to_str().unwrap(), output.to_str().unwrap()]);

    assert!(!result.status.success());
    let stderr = stderr_of(&result);
    assert!(
        stderr.starts_with(&format!("Cannot open output file: {}", output.display())),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_wrong_argument_count_fails() {
    let result = fusion_replay(&["only_one_arg.txt"]);
    assert!(!result.status.success());
    assert!(stderr_of(&result).contains("Usage"));
}

#[test]
fn test_successful_run_writes_records() {
    let input = tmp_path("cli_exit_ok_in.txt");
    let output = tmp_path("cli_exit_ok_out.txt");
    std::fs::write(&input, "L 1.0 2.0 0\nR 2.3 1.1 0.5 100000\n").unwrap();

    let result = fusion_replay(&[input.to_str().unwrap(), output.to_str().unwrap()]);
    assert!(result.status.success(), "stderr: {}", stderr_of(&result));

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 2);
    assert!(written.lines().all(|l| l.split('\t').count() == 7));
}
