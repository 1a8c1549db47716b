//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
    dim: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
            dim: Style::new().dim(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a highlighted message (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    /// Print a `label: value` detail line with a dimmed label.
    pub(crate) fn detail(&self, label: &str, value: &str) {
        let _ = self
            .term
            .write_line(&format!("  {} {value}", self.dim.apply_to(format!("{label}:"))));
    }

    /// Rewrite the current line in place (progress display).
    pub(crate) fn status(&self, msg: &str) {
        if self.term.is_term() {
            let _ = self.term.clear_line();
            let _ = self.term.write_str(msg);
        }
    }

    /// Finish a line started with [`Output::status`].
    pub(crate) fn end_status(&self) {
        if self.term.is_term() {
            let _ = self.term.clear_line();
        }
    }
}
