//! Test assertion helpers.

use std::process::Output;

use envsec::error::Error;

/// Assert that a command output was successful.
pub fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!("Command failed:\n{}", stderr(output));
    }
}

/// Assert that a command output failed.
pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "Expected command to fail but it succeeded"
    );
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Assert stderr contains a string.
pub fn assert_stderr_contains(output: &Output, expected: &str) {
    let err = stderr(output);
    assert!(
        err.contains(expected),
        "stderr missing '{}', got: {}",
        expected,
        err
    );
}

/// Names of the entries, in order.
pub fn names(entries: &[envsec::core::domain::SecretEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

/// Every error inside an aggregate, or the error itself.
pub fn constituents(err: &Error) -> Vec<&Error> {
    match err.as_aggregate() {
        Some(agg) => agg.errors().iter().collect(),
        None => vec![err],
    }
}
