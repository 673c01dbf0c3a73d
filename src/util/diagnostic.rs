//! User-facing diagnostic messages.
//!
//! Every configuration error carries the offending path and, where one
//! exists, a suggested fix.

use std::fmt;
use std::path::PathBuf;

/// Help texts shared by several commands.
pub mod suggestions {
    pub const BUILD_FAILED: &str = "Run `forge build --verbose` to see the commands that were run";

    /// `forge test` found nothing to build.
    pub const NO_TESTS: &str = "Add test sources under `test/` in a `lib` or `dll` project";

    /// `forge run` was used on a library.
    pub const NOT_RUNNABLE: &str = "Only projects with `type = exe` in forge.ini can be run";
}

const RED: &str = "\x1b[1;31m";
const GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// An error report: message, the project or file it concerns and any
/// number of `help:` lines.
#[derive(Debug, Clone, Default)]
pub struct Diagnostic {
    pub message: String,
    pub location: Option<PathBuf>,
    pub help: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.help.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for the terminal, with ANSI colors when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let paint = |code: &str, label: &str| {
            if color {
                format!("{code}{label}{RESET}")
            } else {
                label.to_string()
            }
        };

        let mut out = format!("{}: {}\n", paint(RED, "error"), self.message);
        if let Some(path) = &self.location {
            out += &format!("  --> {}\n", path.display());
        }
        for line in &self.help {
            out += &format!("{}: {}\n", paint(GREEN, "help"), line);
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
