use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use console::style;
use dialoguer::Confirm;

static VERBOSITY: AtomicU8 = AtomicU8::new(0);
static QUIET: AtomicBool = AtomicBool::new(false);

/// Applies the global `-v`, `-q` and `--no-color` flags. Results printed to
/// stdout are unaffected; only diagnostics on stderr are.
pub fn configure(verbosity: u8, quiet: bool, no_color: bool) {
    VERBOSITY.store(verbosity, Ordering::Relaxed);
    QUIET.store(quiet, Ordering::Relaxed);
    if no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn info(message: &str) {
    if is_quiet() {
        return;
    }
    let _ = writeln!(io::stderr(), "{}", message);
}

pub fn debug(message: &str) {
    if VERBOSITY.load(Ordering::Relaxed) == 0 {
        return;
    }
    let _ = writeln!(io::stderr(), "{} {}", style("debug").dim(), message);
}

pub fn warn(message: &str) {
    let _ = writeln!(io::stderr(), "{}", style(message).yellow());
}

pub fn error(message: &str) {
    let _ = writeln!(io::stderr(), "{}", style(message).red());
}

pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, dialoguer::Error> {
    if assume_yes {
        return Ok(true);
    }

    Confirm::new().with_prompt(prompt).default(false).interact()
}
