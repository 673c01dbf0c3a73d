//! Centralized shell output.
//!
//! All user-facing status lines go through [`Shell`]. Commands pick a
//! semantic [`Status`]; the shell handles alignment, color and verbosity.
//! Status lines go to stderr, captured tool output is echoed to stdout.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only
    Quiet,
    /// Default: status messages
    #[default]
    Normal,
    /// --verbose: also every command line that is run
    Verbose,
}

/// When to emit ANSI colors (`--color`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Only when stderr is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

/// The verb printed right-aligned in front of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // green
    Created,
    Finished,
    Removed,
    Ended,

    // cyan
    Building,
    Compiling,
    Generating,
    Linking,
    Archiving,
    Running,

    // yellow
    Skipped,
    Warning,

    // red
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "Created",
            Status::Finished => "Finished",
            Status::Removed => "Removed",
            Status::Ended => "Ended",
            Status::Building => "Building",
            Status::Compiling => "Compiling",
            Status::Generating => "Generating",
            Status::Linking => "Linking",
            Status::Archiving => "Archiving",
            Status::Running => "Running",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Created | Status::Finished | Status::Removed | Status::Ended => "\x1b[1;32m",
            Status::Building
            | Status::Compiling
            | Status::Generating
            | Status::Linking
            | Status::Archiving
            | Status::Running => "\x1b[1;36m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Destination of every user-facing line Forge prints.
#[derive(Debug, Clone, Copy)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };
        Shell::new(verbosity, color)
    }

    /// A shell that prints nothing but errors, without color.
    pub fn quiet() -> Self {
        Shell {
            verbosity: Verbosity::Quiet,
            use_color: false,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print `{status:>12} {message}` to stderr.
    ///
    /// Format: `{status:>12} {message}`. In quiet mode only errors print.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }
        eprintln!("{}", self.status_line(status, msg));
    }

    /// A status line as [`Shell::status`] prints it.
    pub fn status_line(&self, status: Status, msg: impl Display) -> String {
        format!("{} {}", self.format_status(status), msg)
    }

    /// Print a status message only in verbose mode.
    pub fn verbose(&self, status: Status, msg: impl Display) {
        if self.is_verbose() {
            self.status(status, msg);
        }
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    pub fn error(&self, msg: impl Display) {
        self.status(Status::Error, msg);
    }

    /// Echo captured tool output verbatim to stdout.
    pub fn print_lines(&self, lines: &[String]) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
        let _ = out.flush();
    }

    fn format_status(&self, status: Status) -> String {
        let label = format!("{:>width$}", status.as_str(), width = STATUS_WIDTH);
        if self.use_color {
            format!("{}{}\x1b[0m", status.color_code(), label)
        } else {
            label
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}
