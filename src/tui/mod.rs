//! Terminal UI for the orchestrator CLI
//!
//! Rendering helpers shared by the one-shot commands, plus an interactive
//! mentor chat that keeps conversation history across turns.

pub mod commands;
pub mod prompt;
pub mod renderer;
pub mod spinner;
pub mod theme;

use crate::api::{HistoryMessage, Role, TaskKind};
use crate::orchestrator::Orchestrator;

use commands::{parse_command, render_help, SlashCommand};
use prompt::{LineSource, PromptHandler};
use renderer::TerminalRenderer;
use spinner::WaitSpinner;

use anyhow::Result;
use std::str::FromStr;
use tracing::debug;

/// Messages kept for the next turn's context
const MAX_HISTORY: usize = 20;

enum CommandResult {
    Continue,
    Exit,
}

/// Multi-turn chat with one mentor persona
pub struct ChatShell {
    orchestrator: Orchestrator,
    mentor: String,
    renderer: TerminalRenderer,
    /// Stdin prompt unless replaced with [`ChatShell::with_input`]
    input: Option<Box<dyn LineSource>>,
    history: Vec<HistoryMessage>,
    turns: usize,
    session_cost: f64,
}

impl ChatShell {
    pub fn new(orchestrator: Orchestrator, mentor: impl Into<String>) -> Self {
        Self {
            orchestrator,
            mentor: mentor.into(),
            renderer: TerminalRenderer::new(),
            input: None,
            history: Vec::new(),
            turns: 0,
            session_cost: 0.0,
        }
    }

    /// Replace stdin with another line source
    pub fn with_input(mut self, input: impl LineSource + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    fn mentor_name(&self) -> String {
        self.orchestrator
            .personas()
            .lookup(&self.mentor)
            .name
            .clone()
    }

    /// Run the chat loop until /quit, EOF or Ctrl+C at the prompt
    pub async fn run(&mut self) -> Result<()> {
        let providers: Vec<String> = self
            .orchestrator
            .route(TaskKind::BusinessAdvice)
            .names()
            .into_iter()
            .map(String::from)
            .collect();
        let providers: Vec<&str> = providers.iter().map(String::as_str).collect();
        self.renderer
            .render_banner(env!("CARGO_PKG_VERSION"), &self.mentor_name(), &providers);

        let mut lines = self
            .input
            .take()
            .unwrap_or_else(|| Box::new(PromptHandler::default()) as Box<dyn LineSource>);

        loop {
            let Some(input) = lines.next_line(self.renderer.prompt_color()).await else {
                break;
            };
            if input.is_empty() {
                continue;
            }

            if let Some(cmd) = parse_command(&input) {
                match self.handle_command(cmd) {
                    CommandResult::Continue => continue,
                    CommandResult::Exit => break,
                }
            }

            self.process_message(&input).await;
        }

        self.render_session_summary();
        Ok(())
    }

    fn handle_command(&mut self, cmd: SlashCommand) -> CommandResult {
        match cmd {
            SlashCommand::Help => render_help(&self.renderer),
            SlashCommand::Quit => return CommandResult::Exit,
            SlashCommand::Clear => {
                self.history.clear();
                self.renderer.render_success("Conversation history cleared");
            }
            SlashCommand::Mentor(None) => {
                self.renderer
                    .render_system(&format!("Current mentor: {} ({})", self.mentor_name(), self.mentor));
            }
            SlashCommand::Mentor(Some(id)) => {
                if !self.orchestrator.personas().contains(&id) {
                    self.renderer
                        .render_info(&format!("Unknown mentor '{}', using a neutral persona", id));
                }
                self.mentor = id;
                self.history.clear();
                self.renderer
                    .render_success(&format!("Now talking to {}", self.mentor_name()));
            }
            SlashCommand::Personas => self.renderer.render_personas(self.orchestrator.personas()),
            SlashCommand::Report => self.renderer.render_report(&self.orchestrator.report()),
            SlashCommand::Route(task) => self.render_routes(task.as_deref()),
            SlashCommand::Unknown(cmd) => {
                self.renderer
                    .render_error(&format!("Unknown command {}, try /help", cmd));
            }
        }
        CommandResult::Continue
    }

    fn render_routes(&self, task: Option<&str>) {
        match task.map(TaskKind::from_str) {
            None => {
                for task in TaskKind::ALL {
                    self.renderer.render_route(task, &self.orchestrator.route(task));
                }
            }
            Some(Ok(task)) => self.renderer.render_route(task, &self.orchestrator.route(task)),
            Some(Err(e)) => self.renderer.render_error(&e),
        }
    }

    async fn process_message(&mut self, input: &str) {
        let spinner = WaitSpinner::start(&format!("{} is thinking...", self.mentor_name()));

        // Ctrl+C drops the in-flight request; the provider is debited for it
        let outcome = tokio::select! {
            result = self.orchestrator.mentor_reply(&self.mentor, input, &self.history) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        spinner.stop();

        match outcome {
            None => self.renderer.render_info("Request cancelled"),
            Some(Err(err)) => self.renderer.render_orchestrator_error(&err),
            Some(Ok(reply)) => {
                self.renderer.render_mentor_reply(&self.mentor_name(), &reply);
                self.turns += 1;
                self.session_cost += reply.cost;

                self.history.push(HistoryMessage {
                    role: Role::User,
                    content: input.to_string(),
                });
                self.history.push(HistoryMessage {
                    role: Role::Assistant,
                    content: reply.text,
                });
                if self.history.len() > MAX_HISTORY {
                    let excess = self.history.len() - MAX_HISTORY;
                    self.history.drain(..excess);
                }
                debug!(turns = self.turns, history = self.history.len(), "turn complete");
            }
        }
    }

    fn render_session_summary(&self) {
        println!();
        self.renderer.render_system(&format!(
            "{} turn(s), estimated cost ${:.4}",
            self.turns, self.session_cost
        ));
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AdapterKind;
    use crate::config::{ConfigBuilder, CredentialStore, ProviderDescriptor};
    use crate::orchestrator::scripted::ScriptedAdapter;
    use async_trait::async_trait;
    use crossterm::style::Color;
    use std::collections::VecDeque;
    use std::sync::Arc;

    struct ScriptedLines(VecDeque<String>);

    impl ScriptedLines {
        fn new<const N: usize>(lines: [&str; N]) -> Self {
            Self(lines.iter().map(|l| l.to_string()).collect())
        }
    }

    #[async_trait]
    impl LineSource for ScriptedLines {
        async fn next_line(&mut self, _color: Color) -> Option<String> {
            self.0.pop_front()
        }
    }

    fn shell(adapter: &Arc<ScriptedAdapter>) -> ChatShell {
        let config = ConfigBuilder::empty()
            .provider(ProviderDescriptor::new("a", AdapterKind::OpenAi, "test-model"))
            .build();
        let orchestrator = Orchestrator::builder(config)
            .credentials(CredentialStore::new().with("a", "k"))
            .adapter("a", adapter.clone())
            .build()
            .unwrap();
        ChatShell::new(orchestrator, "elon_musk")
    }

    #[tokio::test]
    async fn test_chat_loop_runs_turns_and_commands() {
        let adapter = ScriptedAdapter::replying("Hire slowly and fire fast. Keep the bar high.");
        let mut shell = shell(&adapter).with_input(ScriptedLines::new([
            "how do I hire?",
            "",
            "/clear",
            "and pricing?",
            "/quit",
            "never sent",
        ]));

        shell.run().await.unwrap();

        assert_eq!(adapter.calls(), 2);
        assert_eq!(shell.turns, 2);
        // /clear dropped the first exchange
        assert_eq!(shell.history.len(), 2);
        assert_eq!(shell.history[0].role, Role::User);
        assert_eq!(shell.history[0].content, "and pricing?");
        assert_eq!(shell.history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_end_of_input_ends_session() {
        let adapter = ScriptedAdapter::replying("Start with the customer and work back.");
        let mut shell = shell(&adapter).with_input(ScriptedLines::new(["what first?"]));

        shell.run().await.unwrap();

        assert_eq!(shell.turns, 1);
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let adapter = ScriptedAdapter::replying("Think in decades, not quarters.");
        let questions: Vec<String> = (0..12).map(|i| format!("question {}", i)).collect();
        let mut shell = shell(&adapter).with_input(ScriptedLines(questions.into()));

        shell.run().await.unwrap();

        assert_eq!(shell.turns, 12);
        assert_eq!(shell.history.len(), MAX_HISTORY);
        assert_eq!(shell.history[0].content, "question 2");
    }
}
