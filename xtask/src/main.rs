use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Regenerate docs/cli.md from the clap definitions
    GenDocs {
        #[arg(long, default_value = "docs/cli.md")]
        out: PathBuf,
    },
}

fn main() -> std::io::Result<()> {
    match Cli::parse().command {
        Command::GenDocs { out } => {
            let markdown = clap_markdown::help_markdown::<dlwatch::cli::Cli>();
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out, markdown)?;
            println!("Wrote {}", out.display());
        }
    }
    Ok(())
}
