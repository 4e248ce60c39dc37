//! Terminal progress for interactive runs

use crate::inventory::api::ProgressObserver;
use std::io::Write;
use std::sync::Mutex;

const BRAILLE_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Spinner only when stderr is a terminal and info logging is off
pub fn should_show_spinner() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr()) && !log::log_enabled!(log::Level::Info)
}

/// Redraws a single status line on stderr as units finish
#[derive(Debug, Default)]
pub struct ProgressSpinner {
    frame_index: Mutex<usize>,
}

impl ProgressSpinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next status line; advances the animation
    fn frame(&self, completed: usize, total: usize) -> String {
        let Ok(mut index) = self.frame_index.lock() else {
            return String::new();
        };
        let frame = BRAILLE_FRAMES[*index];
        *index = (*index + 1) % BRAILLE_FRAMES.len();
        let percent = if total > 0 { completed * 100 / total } else { 100 };
        format!("{frame} Scanning: {completed}/{total} work units ({percent}%)")
    }

    fn draw(line: &str) {
        eprint!("\r\x1b[2K{line}");
        let _ = std::io::stderr().flush();
    }
}

impl ProgressObserver for ProgressSpinner {
    fn units_planned(&self, total: usize) {
        Self::draw(&self.frame(0, total));
    }

    fn unit_finished(&self, completed: usize, total: usize) {
        Self::draw(&self.frame(completed, total));
    }

    fn finished(&self) {
        eprint!("\r\x1b[2K");
        let _ = std::io::stderr().flush();
    }
}
