//! User facing output
//!
//! Progress lines (library version, match found, action taken) go to stdout
//! and can be silenced with `-q`. Diagnostics always go to stderr. Both are
//! prefixed with the program name, which lives here instead of in a global.

use std::fmt;

#[derive(Debug, Clone)]
pub struct Console {
    program: String,
    quiet: bool,
}

impl Console {
    pub fn new(program: impl Into<String>, quiet: bool) -> Self {
        Self {
            program: program.into(),
            quiet,
        }
    }

    /// Informational output, dropped in quiet mode
    pub fn progress(&self, args: fmt::Arguments<'_>) {
        if !self.quiet {
            println!("{}", self.line(args));
        }
    }

    /// Error output, never suppressed
    pub fn diagnostic(&self, args: fmt::Arguments<'_>) {
        eprintln!("{}", self.line(args));
    }

    fn line(&self, args: fmt::Arguments<'_>) -> String {
        format!("{}: {}", self.program, args)
    }
}
