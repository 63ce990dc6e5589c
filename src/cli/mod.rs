//! Command-line interface

pub mod admin;
pub mod config;
pub mod fetch;
pub mod watch;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use url::Url;

use crate::api::ApiClient;
use crate::config::{state_dir, Config};

#[derive(Parser)]
#[command(name = "dlwatch", version, about = "Watch server-driven download jobs from the terminal")]
pub struct Cli {
    /// Job server base URL (overrides the config file)
    #[arg(long, global = true, env = "DLWATCH_SERVER")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a download job and follow its progress
    Watch(watch::WatchArgs),
    /// Open the interactive monitor with an empty link
    Tui,
    /// Show whether the admin session is logged in
    Status,
    /// Log in as admin
    Login(admin::LoginArgs),
    /// End the admin session
    Logout,
    /// Set the admin download path on the server
    SetPath(admin::SetPathArgs),
    /// Download a finished artifact by the path the job announced
    Fetch(fetch::FetchArgs),
    /// Show or initialise the config file
    Config(config::ConfigArgs),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Commands that hand the terminal to the TUI log to a file instead of stderr.
    pub fn uses_tui(&self) -> bool {
        match self {
            Commands::Tui => true,
            Commands::Watch(args) => !args.plain,
            _ => false,
        }
    }
}

/// Everything a command needs to talk to the job server.
pub struct Context {
    pub config: Config,
    pub server: Url,
    pub http: reqwest::Client,
}

impl Context {
    pub fn new(config: Config, server_override: Option<&str>) -> Result<Self> {
        let raw = server_override.unwrap_or(&config.server_url);
        let server = Url::parse(raw).with_context(|| format!("invalid server URL '{}'", raw))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("dlwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            config,
            server,
            http,
        })
    }

    pub fn api(&self) -> ApiClient {
        let api = ApiClient::new(self.http.clone(), self.server.clone());
        match state_dir() {
            Ok(dir) => api.with_cookie_store(&dir),
            Err(e) => {
                tracing::warn!("session cookie will not persist: {}", e);
                api
            }
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let server = cli.server.as_deref();
    let ctx = || -> Result<Context> { Context::new(Config::load()?, server) };

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Watch(args) => watch::run(&ctx()?, args).await,
        Commands::Tui => crate::tui::run(&ctx()?, None).await,
        Commands::Status => admin::status(&ctx()?).await,
        Commands::Login(args) => admin::login(&ctx()?, args).await,
        Commands::Logout => admin::logout(&ctx()?).await,
        Commands::SetPath(args) => admin::set_path(&ctx()?, args).await,
        Commands::Fetch(args) => fetch::run(&ctx()?, args).await,
        Commands::Config(args) => config::run(args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dlwatch", &mut std::io::stdout());
            Ok(())
        }
    }
}
