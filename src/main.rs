use anyhow::Result;
use clap::Parser;
use dlwatch::cli::Cli;
use dlwatch::{config, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let uses_tui = cli.command.as_ref().map_or(true, |c| c.uses_tui());
    if uses_tui {
        match config::state_dir() {
            Ok(dir) => {
                if let Err(e) = logging::init_file(&dir) {
                    eprintln!("Warning: could not open log file: {}", e);
                }
            }
            Err(e) => eprintln!("Warning: {}", e),
        }
    } else {
        logging::init_stderr();
    }

    dlwatch::cli::run(cli).await
}
