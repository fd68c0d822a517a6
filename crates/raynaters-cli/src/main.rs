use std::io::{self, BufRead, Write};

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use raynaters_core::{
    AutomationProposal, ChatSession, CompanionChat, Config, GeminiClient, OllamaClient,
    ProposalGenerator, Provider,
};
use raynaters_core::ai::DEFAULT_OLLAMA_URL;
use raynaters_core::config::GEMINI_KEY_VARS;
use raynaters_core::widget::nudge_for;

#[derive(Parser)]
#[command(name = "raynaters")]
#[command(about = "Draft automation proposals and chat with the Raynaters AI companion")]
struct Cli {
    /// Provider to use instead of the configured one (gemini, ollama)
    #[arg(long, global = true)]
    provider: Option<String>,
    /// Model to use instead of the configured default
    #[arg(long, global = true)]
    model: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an automation proposal for a manual process
    Propose {
        /// Description of the manual process or pain point
        description: String,
        /// Print the raw proposal as JSON
        #[arg(long)]
        json: bool,
    },
    /// Chat with the AI companion
    Chat,
    /// Show the companion's line for a page section
    Nudge {
        /// Section id (hero, features, testimonials, automation, contact)
        section: String,
    },
    /// List available models for the selected provider
    Models,
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Choose the provider (gemini, ollama)
    SetProvider { provider: String },
    /// Choose the default model
    SetModel { model: String },
    /// Store a Gemini API key
    SetKey { key: String },
    /// Point at a different Ollama server
    SetOllamaUrl { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let provider_override = cli
        .provider
        .as_deref()
        .map(|p| Provider::from_str(p).ok_or_else(|| anyhow!("Unknown provider: {}", p)))
        .transpose()?;

    match cli.command {
        Commands::Propose { description, json } => {
            let config = load_config_or_default();
            propose(&config, provider_override, cli.model.as_deref(), &description, json).await?
        }
        Commands::Chat => {
            let config = load_config_or_default();
            chat(&config, provider_override, cli.model.as_deref()).await?
        }
        Commands::Nudge { section } => println!("{}", nudge_for(&section).cyan()),
        Commands::Models => {
            let config = load_config_or_default();
            list_models(&config, provider_override).await?
        }
        Commands::Config { action } => configure(action.unwrap_or(ConfigAction::Show))?,
    }

    Ok(())
}

/// Read-only commands fall back to defaults when the saved settings are
/// unreadable; `config` subcommands never do.
fn load_config_or_default() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!("ignoring unreadable config, using defaults: {:#}", e);
        Config::new()
    })
}

async fn propose(
    config: &Config,
    provider: Option<Provider>,
    model: Option<&str>,
    description: &str,
    json: bool,
) -> Result<()> {
    if description.trim().is_empty() {
        return Err(anyhow!("Describe the process you want to automate"));
    }

    let connection = config.connect(provider, model)?;
    let generator = ProposalGenerator::new(connection.backend, &connection.model);

    eprintln!("🤖 Drafting a proposal with {}...\n", connection.model.bold().magenta());

    run_proposal(&generator, description, json, &mut io::stdout().lock()).await
}

/// Generate and print one proposal. A failed generation is reported on
/// stderr and returned so the process exits non-zero.
async fn run_proposal(
    generator: &ProposalGenerator,
    description: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    match generator.generate_proposal(description).await {
        Ok(proposal) if json => writeln!(out, "{}", serde_json::to_string_pretty(&proposal)?)?,
        Ok(proposal) => print_proposal(&proposal, out)?,
        Err(e) => {
            eprintln!("{}. Check your connection and try again.", "Something went wrong".red());
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_proposal(proposal: &AutomationProposal, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "Proposed Solution".bold().green())?;
    writeln!(out, "{}\n", proposal.strategy)?;

    writeln!(out, "{}", "Sample Output".bold().green())?;
    writeln!(out, "{}\n", proposal.sample_output)?;

    writeln!(out, "{}", "Projected Efficiency".bold().green())?;
    let peak = proposal
        .efficiency_series
        .iter()
        .map(|p| p.value)
        .fold(0.0_f64, f64::max);
    for point in &proposal.efficiency_series {
        let width = if peak > 0.0 {
            ((point.value / peak) * 30.0).round().max(0.0) as usize
        } else {
            0
        };
        writeln!(
            out,
            "  {:<10} {} {}",
            point.label,
            "█".repeat(width).blue(),
            point.value.to_string().dimmed()
        )?;
    }
    Ok(())
}

async fn chat(config: &Config, provider: Option<Provider>, model: Option<&str>) -> Result<()> {
    let connection = config.connect(provider, model)?;
    let companion = CompanionChat::new(connection.backend, &connection.model);
    let mut session = ChatSession::new();

    if let Some(greeting) = session.turns().first() {
        println!("{} {}", "Raynaters:".bold().cyan(), greeting.content);
    }
    println!("{}", "Type 'exit' to leave.".dimmed());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "you>".bold().yellow());
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        if let Some(reply) = session.send(&companion, text).await {
            println!("{} {}\n", "Raynaters:".bold().cyan(), reply.content);
        }
    }

    Ok(())
}

async fn list_models(config: &Config, provider: Option<Provider>) -> Result<()> {
    let provider = match provider {
        Some(provider) => provider,
        None => config.provider()?,
    };

    println!("\n{}", format!("🤖 {} models", provider.display_name()).bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    match provider {
        Provider::Gemini => {
            for model in GeminiClient::list_models() {
                println!("  • {}", model.green());
            }
        }
        Provider::Ollama => {
            let url = config.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
            match OllamaClient::new(url).list_models().await {
                Ok(models) if models.is_empty() => {
                    println!("{}", "No models found. Pull a model with: ollama pull llama3.2".yellow());
                }
                Ok(models) => {
                    for model in models {
                        println!("  • {}", model.green());
                    }
                }
                Err(e) => {
                    println!("{}: {}", "Error connecting to Ollama".red(), e);
                    println!("Make sure Ollama is running: {}", "ollama serve".bold());
                }
            }
        }
    }

    Ok(())
}

fn configure(action: ConfigAction) -> Result<()> {
    if let ConfigAction::Show = action {
        return show_config(&Config::load()?);
    }

    // Saved settings are only changed through a strict load, so an
    // unreadable file is reported instead of being replaced.
    Config::update(|config| {
        match action {
            ConfigAction::Show => {}
            ConfigAction::SetProvider { provider } => {
                let provider = Provider::from_str(&provider)
                    .ok_or_else(|| anyhow!("Unknown provider: {}", provider))?;
                config.provider = Some(provider.as_str().to_string());
            }
            ConfigAction::SetModel { model } => config.default_model = Some(model),
            ConfigAction::SetKey { key } => config.gemini_api_key = Some(key),
            ConfigAction::SetOllamaUrl { url } => config.ollama_url = Some(url),
        }
        Ok(())
    })?;
    println!("{}", "Settings saved.".green());
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let key_source = if GEMINI_KEY_VARS.iter().any(|var| std::env::var(var).is_ok()) {
        "env"
    } else if config.gemini_api_key.is_some() {
        "config"
    } else {
        "not set"
    };
    println!("config file:   {}", Config::get_config_path()?.display());
    println!("provider:      {}", config.provider.as_deref().unwrap_or("gemini"));
    println!("model:         {}", config.model_for(config.provider()?, None));
    println!("gemini key:    {}", key_source);
    println!(
        "ollama url:    {}",
        config.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    const PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn generator(server: &MockServer) -> ProposalGenerator {
        let backend = Arc::new(GeminiClient::with_base_url("test-key", &server.base_url()));
        ProposalGenerator::new(backend, "gemini-2.5-flash")
    }

    #[tokio::test]
    async fn failed_proposal_is_returned_as_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(503).body("overloaded");
            })
            .await;

        let mut out = Vec::new();
        let result = run_proposal(&generator(&server), "copy leads by hand", false, &mut out).await;

        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn json_flag_prints_camel_case_proposal() {
        let server = MockServer::start_async().await;
        let payload = json!({
            "strategy": "Sync the sheet nightly.",
            "sampleOutput": "{\"imported\": 3}",
            "efficiencySeries": [{ "label": "Month 1", "value": 5 }]
        });
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).json_body(json!({
                    "candidates": [{ "content": { "parts": [{ "text": payload.to_string() }] } }]
                }));
            })
            .await;

        let mut out = Vec::new();
        run_proposal(&generator(&server), "copy leads by hand", true, &mut out)
            .await
            .unwrap();

        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["strategy"], "Sync the sheet nightly.");
        assert_eq!(printed["efficiencySeries"][0]["label"], "Month 1");
    }
}
