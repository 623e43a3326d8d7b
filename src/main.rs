//! ai-orchestrator CLI - route prompts across LLM providers with fallback

use ai_orchestrator::{
    api::{AiRequest, TaskKind},
    config::{Config, CredentialStore, CONFIG_PATH_ENV},
    orchestrator::Orchestrator,
    tui::{renderer::TerminalRenderer, spinner::WaitSpinner, ChatShell},
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ai-orchestrator")]
#[command(about = "Route AI requests across multiple LLM providers with caching and fallback")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Config file (default: ~/.config/ai-orchestrator/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt through the orchestrator
    Ask {
        /// Prompt text
        prompt: String,

        /// Task kind (code_generation, mobile_development, conversation, ...)
        #[arg(short, long, default_value = "conversation")]
        task: TaskKind,

        /// Mentor persona id
        #[arg(short, long)]
        mentor: Option<String>,

        /// Sampling temperature (0.0 - 1.0)
        #[arg(long)]
        temperature: Option<f32>,

        /// Max tokens for the completion
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Get one reply from a mentor persona
    Mentor {
        /// Message to the mentor
        message: String,

        /// Mentor persona id
        #[arg(short, long, default_value = "elon_musk")]
        mentor: String,

        /// Print the reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive multi-turn chat with a mentor
    Chat {
        /// Mentor persona id
        #[arg(short, long, default_value = "elon_musk")]
        mentor: String,
    },

    /// Show provider health, credentials and cache state
    Report {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show provider order for each task kind
    Providers,

    /// List mentor personas
    Personas,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Show {
        /// Show only one section (orchestrator, providers, personas)
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Print the config file path
    Path,

    /// Validate configuration and list credentialed providers
    Validate,

    /// Store an API key inline for one provider
    SetKey {
        /// Provider name as configured
        provider: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = cli.config.unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Ask {
            prompt,
            task,
            mentor,
            temperature,
            max_tokens,
            json,
        } => {
            let mut request = AiRequest::new(task, prompt);
            if let Some(mentor) = mentor {
                request = request.with_mentor(mentor);
            }
            if let Some(temperature) = temperature {
                request = request.with_temperature(temperature);
            }
            if let Some(max_tokens) = max_tokens {
                request = request.with_max_tokens(max_tokens);
            }
            run_ask(&path, request, json).await?;
        }
        Commands::Mentor {
            message,
            mentor,
            json,
        } => {
            run_mentor(&path, &mentor, &message, json).await?;
        }
        Commands::Chat { mentor } => {
            let orchestrator = build_orchestrator(&path)?;
            ChatShell::new(orchestrator, mentor).run().await?;
        }
        Commands::Report { json } => {
            let orchestrator = build_orchestrator(&path)?;
            let report = orchestrator.report();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                TerminalRenderer::new().render_report(&report);
            }
        }
        Commands::Providers => show_providers(&path)?,
        Commands::Personas => {
            let orchestrator = build_orchestrator(&path)?;
            TerminalRenderer::new().render_personas(orchestrator.personas());
        }
        Commands::Config(cmd) => run_config_command(&path, cmd)?,
    }

    Ok(())
}

fn build_orchestrator(path: &PathBuf) -> Result<Orchestrator> {
    let config = Config::load_from(path.clone())
        .with_context(|| format!("loading {}", path.display()))?;
    let orchestrator = Orchestrator::from_config(config)?;
    Ok(orchestrator)
}

async fn run_ask(path: &PathBuf, request: AiRequest, json: bool) -> Result<()> {
    let orchestrator = build_orchestrator(path)?;
    let renderer = TerminalRenderer::new();

    info!(task = %request.task_kind, "sending request");
    let spinner = WaitSpinner::start(&format!("{}...", request.task_kind));
    let result = orchestrator.process(&request).await;
    spinner.stop();

    match result {
        Ok(response) if json => println!("{}", serde_json::to_string_pretty(&response)?),
        Ok(response) => {
            renderer.render_markdown(&response.content);
            renderer.render_response_footer(&response);
        }
        Err(err) => {
            renderer.render_orchestrator_error(&err);
            bail!("request failed");
        }
    }

    Ok(())
}

async fn run_mentor(path: &PathBuf, mentor: &str, message: &str, json: bool) -> Result<()> {
    let orchestrator = build_orchestrator(path)?;
    let renderer = TerminalRenderer::new();
    let name = orchestrator.personas().lookup(mentor).name.clone();

    let spinner = WaitSpinner::start(&format!("{} is thinking...", name));
    let result = orchestrator.mentor_reply(mentor, message, &[]).await;
    spinner.stop();

    match result {
        Ok(reply) if json => println!("{}", serde_json::to_string_pretty(&reply)?),
        Ok(reply) => renderer.render_mentor_reply(&name, &reply),
        Err(err) => {
            renderer.render_orchestrator_error(&err);
            bail!("mentor reply failed");
        }
    }

    Ok(())
}

fn show_providers(path: &PathBuf) -> Result<()> {
    let orchestrator = build_orchestrator(path)?;
    let renderer = TerminalRenderer::new();

    println!();
    renderer.render_system("Configured providers");
    for descriptor in orchestrator.providers() {
        let status = if orchestrator.is_credentialed(&descriptor.name) {
            "credentialed"
        } else {
            "NO API KEY"
        };
        println!(
            "  {:<12} tier {} | {:<10} | {:<28} | {} ({})",
            descriptor.name,
            descriptor.priority,
            descriptor.adapter,
            descriptor.model,
            status,
            descriptor.credential_env
        );
    }

    println!();
    renderer.render_system("Candidate order per task kind (* = specialized)");
    for task in TaskKind::ALL {
        renderer.render_route(task, &orchestrator.route(task));
    }
    println!();

    Ok(())
}

fn run_config_command(path: &PathBuf, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => config_init(path, force)?,
        ConfigCommands::Show { section } => config_show(path, section)?,
        ConfigCommands::Path => config_path(path),
        ConfigCommands::Validate => config_validate(path)?,
        ConfigCommands::SetKey { provider } => config_set_key(path, &provider)?,
    }
    Ok(())
}

fn config_init(path: &PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    Config::default().save_to(path.clone())?;

    println!("Configuration file created at: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set environment variables for the providers you use:");
    println!("     export ANTHROPIC_API_KEY=...");
    println!("     export OPENAI_API_KEY=...");
    println!("     export GOOGLE_AI_API_KEY=...");
    println!("     export YANDEX_API_KEY=... YANDEX_FOLDER_ID=...");
    println!("  2. Or store a key inline:");
    println!("     ai-orchestrator config set-key claude");

    Ok(())
}

fn config_show(path: &PathBuf, section: Option<String>) -> Result<()> {
    let mut config = Config::load_from(path.clone())?;

    // Mask inline API keys
    for provider in &mut config.providers {
        if provider.api_key.is_some() {
            provider.api_key = Some("***".to_string());
        }
    }

    let display = match section.as_deref().map(str::to_lowercase).as_deref() {
        None => toml::to_string_pretty(&config)?,
        Some("orchestrator") => toml::to_string_pretty(&config.orchestrator)?,
        Some("providers") => {
            let mut out = String::new();
            for provider in &config.providers {
                out.push_str(&format!("# {}\n{}\n", provider.name, toml::to_string_pretty(provider)?));
            }
            out
        }
        Some("personas") => toml::to_string_pretty(&config.personas)?,
        Some(other) => {
            println!("Unknown section: {}", other);
            println!("Available: orchestrator, providers, personas");
            return Ok(());
        }
    };

    println!("{}", display);

    println!("\n--- Environment Variables ---");
    let mut vars: Vec<&str> = config
        .providers
        .iter()
        .map(|p| p.credential_env.as_str())
        .collect();
    vars.extend(["YANDEX_FOLDER_ID", CONFIG_PATH_ENV]);
    for var in vars {
        let state = match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => "set",
            _ => "not set",
        };
        println!("{}: {}", var, state);
    }

    Ok(())
}

fn config_path(path: &PathBuf) {
    println!("{}", path.display());

    if path.exists() {
        println!("(file exists)");
    } else {
        println!("(file does not exist - run 'config init' to create)");
    }
}

fn config_validate(path: &PathBuf) -> Result<()> {
    let config = Config::load_from(path.clone())?;

    match config.validate() {
        Ok(()) => {
            println!("Configuration is valid!");
            println!();

            let credentials = CredentialStore::from_env(&config.providers);
            println!("Configured providers:");
            for provider in &config.providers {
                if credentials.has(&provider.name) {
                    println!("  {} ({}): ready (model: {})", provider.name, provider.label, provider.model);
                } else {
                    println!(
                        "  {} ({}): NO API KEY (set {})",
                        provider.name, provider.label, provider.credential_env
                    );
                }
            }

            if credentials.is_empty() {
                println!();
                println!("No provider is credentialed; every request will fail.");
            }
        }
        Err(e) => {
            println!("Configuration validation failed:");
            println!("  {}", e);
        }
    }

    Ok(())
}

fn config_set_key(path: &PathBuf, provider: &str) -> Result<()> {
    use std::io::{self, BufRead, Write};

    // Raw file contents: env overrides must not be written back
    let config = Config::load_raw(path.clone())?;
    let Some(descriptor) = config.provider(provider) else {
        let names: Vec<&str> = config.providers.iter().map(|p| p.name.as_str()).collect();
        bail!("Unknown provider '{}'. Configured: {}", provider, names.join(", "));
    };

    print!("Enter API key for {} ({}): ", descriptor.name, descriptor.label);
    io::stdout().flush()?;

    let mut key = String::new();
    io::stdin().lock().read_line(&mut key)?;
    let key = key.trim();
    if key.is_empty() {
        println!("No key entered, nothing changed");
        return Ok(());
    }

    Config::set_api_key(path.clone(), provider, key)?;
    println!("Stored API key for {} in {}", provider, path.display());

    Ok(())
}
