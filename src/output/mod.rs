// Output formatting utilities for the `jtupdate` CLI.

use std::io::IsTerminal;

// Colors for terminal output (when supported)
pub const RED: &str = "\x1b[0;31m";
pub const GREEN: &str = "\x1b[0;32m";
pub const YELLOW: &str = "\x1b[1;33m";
pub const CYAN: &str = "\x1b[0;36m";
pub const BOLD: &str = "\x1b[1m";
pub const NC: &str = "\x1b[0m"; // No Color

/// Check if stdout is a terminal (for color output)
#[inline]
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Print info message
pub fn info(msg: &str) {
    let color = if is_terminal() { GREEN } else { "" };
    let reset = if is_terminal() { NC } else { "" };
    println!("{}[INFO]{} {}", color, reset, msg);
}

/// Print warning message
pub fn warn(msg: &str) {
    let color = if is_terminal() { YELLOW } else { "" };
    let reset = if is_terminal() { NC } else { "" };
    eprintln!("{}[WARN]{} {}", color, reset, msg);
}

/// Print error message
pub fn error(msg: &str) {
    let color = if is_terminal() { RED } else { "" };
    let reset = if is_terminal() { NC } else { "" };
    eprintln!("{}[ERROR]{} {}", color, reset, msg);
}

/// Print section header
pub fn header(msg: &str) {
    let bold = if is_terminal() { BOLD } else { "" };
    let reset = if is_terminal() { NC } else { "" };
    println!("{}===>{} {}", bold, reset, msg);
    println!();
}

/// Print a diagnostic/dump line.
pub fn dump(line: &str) {
    let color = if is_terminal() { CYAN } else { "" };
    let reset = if is_terminal() { NC } else { "" };
    println!("{}[dump]{} {}", color, reset, line);
}

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_FIXTURE_NOT_FOUND: i32 = 3;
pub const EXIT_INVALID_FIXTURE: i32 = 4;

/// Exit with usage error
pub fn exit_usage(msg: &str) -> ! {
    error(msg);
    std::process::exit(EXIT_USAGE);
}

/// Exit with fixture-not-found error
pub fn exit_fixture_not_found(path: &str) -> ! {
    error(&format!("Fixture not found: {}", path));
    std::process::exit(EXIT_FIXTURE_NOT_FOUND);
}

/// Exit with an invalid-fixture error
pub fn exit_invalid_fixture(msg: &str) -> ! {
    error(&format!("Invalid fixture: {}", msg));
    std::process::exit(EXIT_INVALID_FIXTURE);
}

/// Error codes for JSON error responses.
pub const E_FIXTURE_NOT_FOUND: &str = "E001";
pub const E_INVALID_FIXTURE: &str = "E002";
pub const E_CFG_ERROR: &str = "E003";

/// Common remediation messages.
pub const R_HINT_FIXTURE_SCHEMA: &str =
    "See the fixture schema documented on `jtupdate::cli::fixture::ThreadRequest`";

/// JSON output wrapper: every subcommand's structured result is wrapped the
/// same way so scripted callers get a stable envelope regardless of verb.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JsonResponse<T> {
    pub schema_version: String,
    pub tool: String,
    pub data: T,
}

impl<T: serde::Serialize> JsonResponse<T> {
    pub fn new(data: T) -> Self {
        JsonResponse { schema_version: "1.0.0".to_string(), tool: "jtupdate".to_string(), data }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Error response format for JSON mode
#[derive(Debug, Clone, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl JsonError {
    pub fn new(category: &str, message: &str, code: &str) -> Self {
        JsonError { error: category.to_string(), message: message.to_string(), code: code.to_string(), remediation: None }
    }

    pub fn with_remediation(mut self, remediation: &str) -> Self {
        self.remediation = Some(remediation.to_string());
        self
    }

    pub fn fixture_not_found(path: &str) -> Self {
        Self::new("FixtureNotFound", &format!("Fixture not found: {}", path), E_FIXTURE_NOT_FOUND)
    }

    pub fn invalid_fixture(message: &str) -> Self {
        Self::new("InvalidFixture", message, E_INVALID_FIXTURE).with_remediation(R_HINT_FIXTURE_SCHEMA)
    }
}
