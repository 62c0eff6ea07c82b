//! # pcapchat CLI
//!
//! Conversational analysis of packet captures. Point it at a `.pcap`
//! file, ask questions, get answers grounded in the extracted fields.
//!
//! ```bash
//! # one-shot question
//! pcapchat ask capture.pcap "which domains were accessed?"
//!
//! # interactive session (/reset clears history, /quit exits)
//! pcapchat chat capture.pcap
//!
//! # list known provider/model pairs
//! pcapchat models
//! ```
//!
//! Requires the credential for the selected provider in the environment
//! (`OPENAI_API_KEY` or `GROQ_API_KEY`); embeddings always use
//! `OPENAI_API_KEY`. `tshark` must be on PATH.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use pcapchat::config::{load_config, Config, Provider};
use pcapchat::session::Session;

/// pcapchat — ask an LLM about a packet capture, grounded in its
/// tshark-extracted fields.
#[derive(Parser)]
#[command(
    name = "pcapchat",
    about = "Conversational packet-capture analysis grounded in tshark field extraction",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply if absent.
    #[arg(long, global = true, default_value = "./config/pcapchat.toml")]
    config: PathBuf,

    /// Override the generation provider (`openai` or `groq`).
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Override the generation model name.
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question about a capture and print the answer.
    Ask {
        /// Capture file to analyze.
        capture: PathBuf,

        /// The question to ask.
        question: String,
    },

    /// Start an interactive chat session over a capture.
    ///
    /// `/reset` clears the conversation history (the index is kept),
    /// `/quit` exits.
    Chat {
        /// Capture file to analyze.
        capture: PathBuf,
    },

    /// List providers and the model names known to work with them.
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    apply_overrides(&mut config, cli.provider.as_deref(), cli.model.as_deref())?;

    match cli.command {
        Commands::Ask { capture, question } => {
            let mut session = init_session(config, capture).await?;
            let answer = session.answer(&question).await?;
            println!("{}", answer);
        }
        Commands::Chat { capture } => {
            let mut session = init_session(config, capture).await?;
            run_repl(&mut session).await?;
        }
        Commands::Models => {
            for provider in [Provider::OpenAi, Provider::Groq] {
                println!("{:?} (credential: {}):", provider, provider.credential_var());
                for model in provider.known_models() {
                    println!("  {}", model);
                }
            }
        }
    }

    Ok(())
}

fn apply_overrides(
    config: &mut Config,
    provider: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    if let Some(p) = provider {
        config.generation.provider = match p.to_ascii_lowercase().as_str() {
            "openai" => Provider::OpenAi,
            "groq" => Provider::Groq,
            other => bail!("unknown provider: '{}'. Use openai or groq.", other),
        };
    }
    if let Some(m) = model {
        config.generation.model = m.to_string();
    }
    Ok(())
}

async fn init_session(config: Config, capture: PathBuf) -> Result<Session> {
    if !capture.exists() {
        bail!("capture file not found: {}", capture.display());
    }
    let mut session = Session::new(config);
    session.set_capture_path(capture);
    let summary = session.initialize().await?;
    println!(
        "Processed {} packets, indexed {} segments.",
        summary.packet_count, summary.segment_count
    );
    if let Some(csv) = summary.csv_path {
        println!("Raw field table: {}", csv.display());
    }
    Ok(session)
}

async fn run_repl(session: &mut Session) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                println!("Conversation history cleared.");
            }
            question => match session.answer(question).await {
                Ok(answer) => println!("{}", answer),
                // The question and a placeholder answer are already in
                // history; the session stays usable.
                Err(e) => eprintln!("error: {:#}", e),
            },
        }
    }

    Ok(())
}
