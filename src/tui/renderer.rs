//! Terminal rendering with markdown support

use crossterm::style::{Color, Stylize};
use termimad::MadSkin;

use super::theme::Theme;
use crate::api::{AiResponse, TaskKind};
use crate::orchestrator::{AttemptDiagnostic, MentorReply, OrchestratorError, Report};
use crate::persona::PersonaTable;
use crate::router::Route;

/// Terminal renderer with markdown and styled output
pub struct TerminalRenderer {
    theme: Theme,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        let theme = Theme::default();
        let skin = Self::build_skin(&theme);
        Self { theme, skin }
    }

    fn build_skin(theme: &Theme) -> MadSkin {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(to_termimad_color(theme.title));
        skin.bold.set_fg(to_termimad_color(Color::White));
        skin.italic.set_fg(to_termimad_color(Color::DarkYellow));
        skin.inline_code.set_fg(to_termimad_color(Color::Green));
        skin.code_block.set_fg(to_termimad_color(Color::Green));
        skin
    }

    /// Render the chat banner
    pub fn render_banner(&self, version: &str, mentor: &str, providers: &[&str]) {
        println!();
        println!("{}", "  AI Orchestrator Mentor Chat".with(self.theme.title));
        println!(
            "  {} {}",
            "v".with(self.theme.dim),
            version.with(self.theme.dim)
        );
        println!(
            "  {} {}",
            "Mentor:".with(self.theme.dim),
            mentor.with(self.theme.mentor),
        );
        let chain = if providers.is_empty() {
            "none (set an API key)".to_string()
        } else {
            providers.join(" -> ")
        };
        println!(
            "  {} {}",
            "Providers:".with(self.theme.dim),
            chain.with(self.theme.stats),
        );
        println!(
            "  {}",
            "Type /help for commands, /quit to exit".with(self.theme.dim)
        );
        println!();
    }

    /// Render a completion, as markdown when it has markdown elements
    pub fn render_markdown(&self, content: &str) {
        if has_markdown_elements(content) {
            self.skin.print_text(content);
        } else {
            println!("{}", content);
        }
    }

    /// Usage line after an `ask` response
    pub fn render_response_footer(&self, response: &AiResponse) {
        println!(
            "\n  {} {} via {} | {} tokens | {} ms | ${:.4} | confidence {:.2}",
            "\u{2022}".with(self.theme.dim),
            response
                .metadata_value("task_kind")
                .unwrap_or("-")
                .with(self.theme.dim),
            response.provider_used.as_str().with(self.theme.stats),
            format!("{}", response.tokens_used).with(self.theme.stats),
            format!("{}", response.latency_ms).with(self.theme.stats),
            response.cost_estimate,
            response.confidence,
        );
        println!();
    }

    /// A mentor reply with its name header and mood
    pub fn render_mentor_reply(&self, mentor: &str, reply: &MentorReply) {
        println!(
            "{} {}",
            format!("{}:", mentor).with(self.theme.mentor),
            format!("[{}]", reply.emotion).with(self.theme.dim)
        );
        self.render_markdown(&reply.text);
        println!(
            "\n  {} {} | {} ms | ${:.4}",
            "\u{2022}".with(self.theme.dim),
            reply.provider_used.as_str().with(self.theme.stats),
            format!("{}", reply.latency_ms).with(self.theme.stats),
            reply.cost,
        );
        println!();
    }

    /// Orchestrator failure, with one line per candidate for exhaustion
    pub fn render_orchestrator_error(&self, err: &OrchestratorError) {
        self.render_error(&err.to_string());
        match err {
            OrchestratorError::NoProvider => self.render_info(
                "Set ANTHROPIC_API_KEY, OPENAI_API_KEY, GOOGLE_AI_API_KEY or YANDEX_API_KEY",
            ),
            OrchestratorError::Exhausted { attempts } => {
                for attempt in attempts {
                    self.render_diagnostic(attempt);
                }
            }
        }
    }

    fn render_diagnostic(&self, diagnostic: &AttemptDiagnostic) {
        let color = if diagnostic.kind.counts_as_attempt() {
            self.theme.error
        } else {
            self.theme.warning
        };
        println!(
            "    {:<12} {} {}",
            diagnostic.provider.as_str().with(self.theme.stats),
            diagnostic.kind.to_string().with(color),
            diagnostic.message.as_str().with(self.theme.dim),
        );
    }

    /// Health, cache and rate usage overview
    pub fn render_report(&self, report: &Report) {
        println!();
        self.render_system("Provider health");
        println!(
            "  {:<12} {:>8} {:>8} {:>8} {:>10} {:>12}",
            "provider", "attempts", "ok", "failed", "success", "latency"
        );
        for (name, snapshot) in &report.providers {
            let available = report.available_providers.iter().any(|p| p == name);
            let label = if available {
                name.as_str().with(self.theme.stats)
            } else {
                name.as_str().with(self.theme.dim)
            };
            let latency = snapshot
                .ewma_latency_ms
                .map(|ms| format!("{:.0} ms", ms))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<12} {:>8} {:>8} {:>8} {:>9.1}% {:>12}",
                label,
                snapshot.attempts,
                snapshot.successes,
                snapshot.failures,
                snapshot.success_rate * 100.0,
                latency,
            );
            if let Some(usage) = report.rate_usage.get(name) {
                self.render_info(&format!(
                    "  {} requests in window, {} tokens today",
                    usage.requests_in_window, usage.tokens_today
                ));
            }
        }

        println!();
        self.render_info(&format!(
            "{} of {} providers credentialed: {}",
            report.available_providers.len(),
            report.configured_providers,
            report.available_providers.join(", ")
        ));
        self.render_info(&format!(
            "Cache: {} entries, {} hits, {} misses ({:.1}% hit rate)",
            report.cache_size,
            report.cache.total_hits,
            report.cache.total_misses,
            report.cache.hit_rate * 100.0
        ));
        println!();
    }

    /// Candidate order for one task kind
    pub fn render_route(&self, task: TaskKind, route: &Route) {
        let order = if route.is_empty() {
            "(none)".to_string()
        } else {
            route
                .candidates
                .iter()
                .map(|c| {
                    if c.specialized {
                        format!("{}*", c.name)
                    } else {
                        c.name.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" -> ")
        };
        println!(
            "  {:<20} {}",
            task.as_str().with(self.theme.command),
            order.with(self.theme.stats)
        );
        for skipped in &route.circuit_open {
            self.render_info(&format!("    {} skipped (circuit open)", skipped.name));
        }
    }

    pub fn render_personas(&self, personas: &PersonaTable) {
        for (id, persona) in personas.iter() {
            println!(
                "  {:<18} {}",
                id.with(self.theme.command),
                persona.name.as_str().with(self.theme.mentor)
            );
        }
    }

    /// Render a system message
    pub fn render_system(&self, msg: &str) {
        println!(
            "  {} {}",
            "\u{25b6}".with(self.theme.system),
            msg.with(self.theme.system)
        );
    }

    /// Render an error message
    pub fn render_error(&self, msg: &str) {
        println!(
            "  {} {}",
            "\u{2717}".with(self.theme.error),
            msg.with(self.theme.error)
        );
    }

    /// Render a success message
    pub fn render_success(&self, msg: &str) {
        println!(
            "  {} {}",
            "\u{2713}".with(self.theme.success),
            msg.with(self.theme.success)
        );
    }

    /// Render info text
    pub fn render_info(&self, msg: &str) {
        println!("  {}", msg.with(self.theme.dim));
    }

    pub fn prompt_color(&self) -> Color {
        self.theme.prompt
    }

    pub fn command_color(&self) -> Color {
        self.theme.command
    }

    pub fn dim_color(&self) -> Color {
        self.theme.dim
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if content has markdown elements worth rendering
fn has_markdown_elements(content: &str) -> bool {
    content.contains("```")
        || content.contains("## ")
        || content.contains("# ")
        || content.contains("**")
        || content.contains("| ")
        || content.contains("- ")
}

/// Convert crossterm Color to termimad color
fn to_termimad_color(color: Color) -> termimad::crossterm::style::Color {
    use termimad::crossterm::style::Color as Mad;
    match color {
        Color::Black => Mad::Black,
        Color::DarkGrey => Mad::DarkGrey,
        Color::Red => Mad::Red,
        Color::Green => Mad::Green,
        Color::Yellow => Mad::Yellow,
        Color::DarkYellow => Mad::DarkYellow,
        Color::Blue => Mad::Blue,
        Color::Magenta => Mad::Magenta,
        Color::Cyan => Mad::Cyan,
        Color::White => Mad::White,
        Color::Grey => Mad::Grey,
        _ => Mad::Reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_detection() {
        assert!(has_markdown_elements("```rust\nfn main() {}\n```"));
        assert!(has_markdown_elements("## Plan"));
        assert!(has_markdown_elements("- first\n- second"));
        assert!(!has_markdown_elements("Plain sentence."));
    }
}
