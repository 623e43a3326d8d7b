//! Spinner shown while a request walks its candidates

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICKS: &[&str] = &[
    "\u{2800}", "\u{2801}", "\u{2803}", "\u{2807}", "\u{280f}", "\u{281f}", "\u{283f}",
    "\u{287f}", "\u{28ff}", "\u{28fe}", "\u{28fc}", "\u{28f8}", "\u{28f0}", "\u{28e0}",
    "\u{28c0}", "\u{2880}", "\u{2800}",
];

pub struct WaitSpinner {
    bar: ProgressBar,
}

impl WaitSpinner {
    /// Start spinning with `msg`; hidden when stderr is not a terminal
    pub fn start(msg: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg} {elapsed:.dim}") {
            bar.set_style(style.tick_strings(TICKS));
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Stop and clear the spinner
    pub fn stop(self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for WaitSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
