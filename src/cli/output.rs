//! Colored terminal output for registry operations
//!
//! Every line carries the icon of its kind: 🔎 lookups, ✅ successes,
//! ❌ failures, 🚨 unexpected errors. Failures and their details go to
//! stderr and survive `--quiet`.

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.verbose, self.quiet)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    fn line(&self, icon: &str, color: Option<Color>, bold: bool, message: &str) {
        if self.quiet {
            return;
        }

        let mut buffer = self.bufwtr.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(color).set_bold(bold));
        let _ = writeln!(&mut buffer, "{icon}  {message}");
        let _ = buffer.reset();
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print a registry lookup result
    pub fn lookup(&self, message: &str) {
        self.line("🔎", None, false, message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.line("✅", Some(Color::Green), false, message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        self.line("⚠", Some(Color::Yellow), false, message);
    }

    /// Print a failed step (always shown)
    pub fn failure(&self, message: &str) {
        self.stderr_line(&format!("❌  {message}"), Some(Color::Red), false);
    }

    /// Print an unexpected error (always shown)
    pub fn alert(&self, message: &str) {
        self.stderr_line(&format!("🚨  {message}"), Some(Color::Red), true);
    }

    /// Print a fatal error (always shown)
    pub fn error(&self, message: &str) {
        self.stderr_line(&format!("✗  {message}"), Some(Color::Red), true);
    }

    /// Print the cause under a failure, alert or error (always shown)
    pub fn detail(&self, message: &str) {
        self.stderr_line(&format!("    {message}"), None, false);
    }

    fn stderr_line(&self, line: &str, color: Option<Color>, bold: bool) {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();

        if buffer
            .set_color(ColorSpec::new().set_fg(color).set_bold(bold))
            .is_err()
            || writeln!(&mut buffer, "{line}").is_err()
            || buffer.reset().is_err()
            || bufwtr.print(&buffer).is_err()
        {
            // Stderr failed - fallback to stdout as last resort
            println!("{line}");
        }
    }

    /// Print recovery suggestions (respects quiet mode)
    pub fn suggestions(&self, suggestions: &[String]) {
        if suggestions.is_empty() || self.is_quiet() {
            return;
        }

        self.println("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            self.println(&format!("  • {}", suggestion));
        }
    }

    /// Print a verbose message (only in verbose mode)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            self.line("→", Some(Color::Blue), false, message);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }

        let mut buffer = self.bufwtr.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = writeln!(&mut buffer, "═══ {} ═══", title);
        let _ = buffer.reset();
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print indented text (for details under a step)
    pub fn indent(&self, message: &str) {
        if self.quiet {
            return;
        }

        let mut buffer = self.bufwtr.buffer();
        let _ = writeln!(&mut buffer, "    {}", message);
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.quiet {
            return;
        }

        let mut buffer = self.bufwtr.buffer();
        let _ = writeln!(&mut buffer, "{}", message);
        let _ = self.bufwtr.print(&buffer);
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}
