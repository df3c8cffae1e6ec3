//! Terminal output helpers shared by the subcommands.

use serde::Serialize;

/// Global output flags, resolved once in `main`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Human-readable lines are suppressed in JSON and quiet modes.
    pub fn is_human(&self) -> bool {
        !self.json && !self.quiet
    }

    pub fn ok_sym(&self) -> &'static str {
        "[OK]"
    }

    pub fn warn_sym(&self) -> &'static str {
        "[!!]"
    }

    pub fn line(&self, text: impl AsRef<str>) {
        if self.is_human() {
            println!("{}", text.as_ref());
        }
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}
