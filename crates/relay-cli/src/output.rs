//! Colored terminal output for the `relay` commands.
//!
//! Uses `termcolor`; honors `NO_COLOR` and the `--color` flag.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::commands::check::{Generated, GeneratedKind};

/// Resolve `ColorChoice` from the CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled writer over stdout and stderr.
pub struct StyledOutput {
    stdout: StandardStream,
    stderr: StandardStream,
}

impl StyledOutput {
    /// Create a writer with the given color choice.
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
            stderr: StandardStream::stderr(choice),
        }
    }

    fn styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.stdout.set_color(&spec);
        let _ = write!(self.stdout, "{}", text);
        let _ = self.stdout.reset();
    }

    /// Bold text.
    pub fn bold(&mut self, text: &str) {
        self.styled(text, None, true);
    }

    /// Cyan text.
    pub fn info(&mut self, text: &str) {
        self.styled(text, Some(Color::Cyan), false);
    }

    /// Dim text.
    pub fn dim(&mut self, text: &str) {
        self.styled(text, Some(Color::White), false);
    }

    /// Plain text.
    pub fn plain(&mut self, text: &str) {
        let _ = write!(self.stdout, "{}", text);
    }

    /// Newline.
    pub fn newline(&mut self) {
        let _ = writeln!(self.stdout);
    }

    /// One generated member: `Owner#member(shape)` in bold, the rest dimmed.
    pub fn generated(&mut self, item: &Generated) {
        match item.kind {
            GeneratedKind::Forwarder => self.bold(&item.owner),
            GeneratedKind::Proxy => self.info(&item.owner),
        }
        let (head, tail) = item
            .description
            .split_once(" -> ")
            .unwrap_or((item.description.as_str(), ""));
        self.bold(&format!("#{}", head));
        if !tail.is_empty() {
            self.dim(&format!(" -> {}", tail));
        }
        self.newline();
    }

    /// Green summary line.
    pub fn summary(&mut self, text: &str) {
        self.styled(text, Some(Color::Green), true);
        self.newline();
    }

    /// Yellow warning on stderr.
    pub fn warning(&mut self, text: &str) {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Yellow)).set_bold(true);
        let _ = self.stderr.set_color(&spec);
        let _ = write!(self.stderr, "warning");
        let _ = self.stderr.reset();
        let _ = writeln!(self.stderr, ": {}", text);
    }

    /// Flush stdout.
    pub fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}
