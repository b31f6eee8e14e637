use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use carelink_lib::commands::{self, DashboardNotice};
use carelink_lib::models::{ChatMessage, FileAttachment, LoginForm, Role, Submission};
use carelink_lib::services::config_service::EffectiveConfig;
use carelink_lib::services::file_service::load_attachment;
use carelink_lib::services::key_service;
use carelink_lib::services::notifier::EventBus;
use carelink_lib::{App, Screen};

const ENV_LOG: &str = "CARELINK_LOG";

#[derive(Debug, Parser)]
#[command(name = "carelink", version, about = "Patient dashboard AI assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in, then land on the dashboard.
    Login {
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        birthdate: String,
    },
    /// Ask from the dashboard box; --open-chat continues in the chat view.
    Ask {
        message: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        eli5: bool,
        #[arg(long)]
        open_chat: bool,
    },
    /// Interactive chat. `/attach <path>`, `/eli5` and `/quit` are understood.
    Chat {
        #[arg(long)]
        eli5: bool,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the API key found in a Python settings file.
    ExtractKey { path: PathBuf },
    Glossary {
        #[command(subcommand)]
        action: GlossaryAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Set { key: String, value: String },
}

#[derive(Debug, Subcommand)]
enum GlossaryAction {
    /// Terms from one article.
    Read { url: String },
    /// Find articles about a topic and collect their terms.
    Study {
        topic: String,
        #[arg(long, default_value_t = 3)]
        max: usize,
    },
}

fn init_tracing(config: &EffectiveConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn print_message(message: &ChatMessage) {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    if let Some(attachment) = &message.attachment {
        println!("📎 Attached: {}", attachment.name);
    }
    println!("{}: {}", who, message.content);
}

async fn open_attachment(path: Option<PathBuf>) -> Result<Option<FileAttachment>> {
    match path {
        Some(path) => Ok(Some(
            load_attachment(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
        )),
        None => Ok(None),
    }
}

async fn run_chat(app: &App, mut simplify: bool) -> Result<()> {
    app.navigate(Screen::Chat);
    let chat = app.chat();
    if let Some(greeting) = chat.placeholder() {
        println!("{}", greeting);
    }

    let mut pending_file: Option<FileAttachment> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        if line == "/eli5" {
            simplify = !simplify;
            println!("simple explanations {}", if simplify { "on" } else { "off" });
            continue;
        }
        if let Some(path) = line.strip_prefix("/attach ") {
            pending_file = open_attachment(Some(PathBuf::from(path.trim()))).await?;
            continue;
        }

        let mut submission = Submission::text(line).simplified(simplify);
        submission.file = pending_file.take();
        let reply = chat.submit(submission).await?;
        print_message(&reply);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::get_config().context("loading config")?;
    init_tracing(&config);
    info!(version = env!("CARGO_PKG_VERSION"), "carelink starting");

    match cli.command {
        Command::Login {
            name,
            password,
            birthdate,
        } => {
            let app = App::new(&config, EventBus::new())?;
            let outcome = app.login(&LoginForm { name, password, birthdate }).await;
            if let Some(notice) = outcome.notice() {
                println!("{}", notice);
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Ask {
            message,
            file,
            eli5,
            open_chat,
        } => {
            let app = App::new(&config, EventBus::new())?;
            app.navigate(Screen::Home);
            let dashboard = app.dashboard();
            dashboard.set_simplify(eli5);

            let file = open_attachment(file).await?;
            let notice = match (message, file) {
                (Some(message), file) => dashboard.ask(&message, file).await?,
                (None, Some(file)) => dashboard.upload(file).await?,
                (None, None) => anyhow::bail!("nothing to ask: give a message or --file"),
            };
            match &notice {
                DashboardNotice::Answer(text) => println!("{}", text),
                DashboardNotice::Alert(text) => eprintln!("⚠️ {}", text),
            }

            if open_chat && matches!(notice, DashboardNotice::Answer(_)) {
                dashboard.continue_conversation();
                app.chat().process_pending().await?;
                if app.screen() == Screen::Chat {
                    println!("--- chat ---");
                    app.chat().messages().iter().for_each(print_message);
                }
            }
        }
        Command::Chat { eli5 } => {
            let app = App::new(&config, EventBus::global().clone())?;
            run_chat(&app, eli5).await?;
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                let stored = commands::get_stored_config()?;
                println!("{}", serde_json::to_string_pretty(&stored)?);
                println!("ai endpoint: {}", config.ai_endpoint);
                println!("login endpoint: {}", config.login_endpoint);
            }
            ConfigAction::Set { key, value } => {
                commands::set_config_value(&key, &value)?;
                println!("{} updated", key);
            }
        },
        Command::ExtractKey { path } => {
            let keys = key_service::extract_api_key_from_file(&path)?;
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
        Command::Glossary { action } => match action {
            GlossaryAction::Read { url } => {
                let glossary = commands::read_article(&url).await?;
                for entry in glossary.entries() {
                    println!("{}: {}", entry.term, entry.definition);
                }
            }
            GlossaryAction::Study { topic, max } => {
                let (articles, glossary) = commands::study_topic(&topic, max).await?;
                for article in &articles {
                    println!("{} <{}>", article.website_name, article.url);
                }
                println!("---");
                for entry in glossary.entries() {
                    println!("{}: {}", entry.term, entry.definition);
                }
            }
        },
    }

    Ok(())
}
