//! `dlwatch fetch` command implementation

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;

use super::Context;
use crate::monitor::ResultArtifact;

#[derive(Args)]
pub struct FetchArgs {
    /// Path as announced by the job, e.g. `1f0c.../My%20Song.mp3`
    raw_path: String,

    /// Target directory (defaults to the configured download dir)
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

pub async fn run(ctx: &Context, args: FetchArgs) -> Result<()> {
    let artifact = ResultArtifact::from_raw(&args.raw_path);
    let dir = args.dir.unwrap_or_else(|| ctx.config.download_dir());

    println!("Fetching {} ...", artifact.url(&ctx.server));
    let written = ctx
        .api()
        .fetch_artifact(&artifact, &dir)
        .await
        .with_context(|| format!("failed to fetch {}", artifact.display_name()))?;

    println!("✓ Saved {}", written.display());
    Ok(())
}
