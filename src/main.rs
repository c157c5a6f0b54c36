use anyhow::Result;
use clap::Parser;
use clap_repl::reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory};
use clap_repl::ClapEditor;
use console::style;
use election_registry::{config::Config, demo, Address};
use rocket::http::Method;
use rocket_cors::{AllowedOrigins, CorsOptions};
use tracing_subscriber::EnvFilter;

/// Second signer used by the demo run.
const DEMO_VOTER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    cli_main()?;

    Ok(())
}

#[derive(Parser, Clone, Debug)]
#[command(name = "")]
pub enum Command {
    /// Serve the registry over HTTP
    StartServer,
    /// Run a scripted election against an in-process registry
    Demo,
}

fn process_command(command: Command) -> Result<()> {
    match command {
        Command::StartServer => {
            rocket::execute(start_server())?;
        }
        Command::Demo => {
            run_demo()?;
        }
    }
    Ok(())
}

pub fn cli_main() -> Result<()> {
    let prompt = DefaultPrompt {
        left_prompt: DefaultPromptSegment::Basic("registry-cli".to_owned()),
        ..DefaultPrompt::default()
    };
    let rl = ClapEditor::<Command>::builder()
        .with_prompt(Box::new(prompt))
        .with_editor_hook(|reed| {
            match FileBackedHistory::with_file(10000, "/tmp/registry-cli-history".into()) {
                Ok(history) => reed.with_history(Box::new(history)),
                Err(e) => {
                    tracing::warn!("command history disabled: {e}");
                    reed
                }
            }
        })
        .build();
    rl.repl(|command| {
        if let Err(e) = process_command(command) {
            tracing::error!("{e}");
        }
    });

    Ok(())
}

pub async fn start_server() -> Result<()> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true);

    let _ = election_registry::build()
        .attach(cors.to_cors()?)
        .launch()
        .await?;
    Ok(())
}

fn run_demo() -> Result<()> {
    let config: Config = rocket::Config::figment().extract()?;
    let voter: Address = DEMO_VOTER.parse()?;
    let (events, winner) = demo::run(config.owner(), voter)?;

    for record in &events {
        println!(
            "{} {}",
            style(record.event.name()).cyan(),
            serde_json::to_string(&record.event)?
        );
    }
    println!(
        "Winner: {} ({} votes)",
        style(&winner.name).green().bold(),
        winner.vote_count
    );
    Ok(())
}
