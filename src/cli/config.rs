//! `dlwatch config` command implementation

use anyhow::{bail, Result};
use clap::Args;

use crate::config::{config_path, Config};

#[derive(Args)]
pub struct ConfigArgs {
    /// Write a config file with the default values
    #[arg(long)]
    init: bool,

    /// Overwrite an existing file when used with --init
    #[arg(long, requires = "init")]
    force: bool,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let path = config_path()?;

    if args.init {
        if path.exists() && !args.force {
            bail!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            );
        }
        Config::default().save_to(&path)?;
        println!("✓ Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = Config::load_from(&path)?;
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
