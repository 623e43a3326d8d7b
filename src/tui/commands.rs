//! Slash command parsing for the chat shell

use crossterm::style::Stylize;

#[derive(Debug, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Quit,
    /// Forget the conversation history
    Clear,
    /// Show or switch the mentor
    Mentor(Option<String>),
    Personas,
    Report,
    /// Candidate order for one task kind, or all of them
    Route(Option<String>),
    Unknown(String),
}

/// Parse a slash command from user input.
/// Returns None if the input is not a slash command.
pub fn parse_command(input: &str) -> Option<SlashCommand> {
    let input = input.trim();
    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input.split_whitespace();
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::to_string);

    Some(match cmd.as_str() {
        "/help" | "/h" | "/?" => SlashCommand::Help,
        "/quit" | "/q" | "/exit" => SlashCommand::Quit,
        "/clear" | "/cls" => SlashCommand::Clear,
        "/mentor" | "/m" => SlashCommand::Mentor(arg),
        "/personas" => SlashCommand::Personas,
        "/report" | "/stats" => SlashCommand::Report,
        "/route" => SlashCommand::Route(arg),
        _ => SlashCommand::Unknown(cmd),
    })
}

/// Render help text for all slash commands
pub fn render_help(renderer: &super::renderer::TerminalRenderer) {
    let cmd_color = renderer.command_color();
    let dim_color = renderer.dim_color();

    println!();
    renderer.render_system("Available commands:");
    println!();

    let commands = [
        ("/help", "Show this help message"),
        ("/quit", "Exit the chat"),
        ("/clear", "Forget the conversation history"),
        ("/mentor [id]", "Show or switch the mentor"),
        ("/personas", "List available mentors"),
        ("/report", "Show provider health and cache statistics"),
        ("/route [task]", "Show provider order per task kind"),
    ];

    for (cmd, desc) in &commands {
        println!("  {:<20} {}", cmd.with(cmd_color), desc.with(dim_color));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse_command("how do I raise a seed round?"), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/q"), Some(SlashCommand::Quit));
        assert_eq!(parse_command("  /HELP "), Some(SlashCommand::Help));
        assert_eq!(parse_command("/mentor"), Some(SlashCommand::Mentor(None)));
        assert_eq!(
            parse_command("/mentor jeff_bezos"),
            Some(SlashCommand::Mentor(Some("jeff_bezos".to_string())))
        );
        assert_eq!(
            parse_command("/route code_generation"),
            Some(SlashCommand::Route(Some("code_generation".to_string())))
        );
        assert_eq!(
            parse_command("/bogus"),
            Some(SlashCommand::Unknown("/bogus".to_string()))
        );
    }
}
