//! Line input for the chat shell

use async_trait::async_trait;
use crossterm::style::{Color, Stylize};
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;

/// Where the chat shell gets its next line from
#[async_trait]
pub trait LineSource: Send {
    /// Next trimmed line, or None when the session should end
    async fn next_line(&mut self, color: Color) -> Option<String>;
}

/// Interactive stdin prompt.
///
/// Stdin is read on a plain thread and handed over a channel, so waiting for
/// input never blocks the runtime and can be raced against Ctrl+C.
pub struct PromptHandler {
    /// Label shown before the cursor, e.g. the user's name
    label: String,
    lines: mpsc::UnboundedReceiver<String>,
}

impl PromptHandler {
    pub fn new(label: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Self {
            label: label.into(),
            lines: rx,
        }
    }
}

#[async_trait]
impl LineSource for PromptHandler {
    /// Display the prompt and wait for a line.
    /// Returns None on EOF (Ctrl+D), a read error or Ctrl+C.
    async fn next_line(&mut self, color: Color) -> Option<String> {
        print!("{} ", format!("{} >", self.label).with(color));
        io::stdout().flush().ok()?;

        tokio::select! {
            line = self.lines.recv() => line.map(|l| l.trim().to_string()),
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        }
    }
}

impl Default for PromptHandler {
    fn default() -> Self {
        Self::new("you")
    }
}
