//! `dlwatch watch` command implementation

use anyhow::{bail, Result};
use clap::Args;
use std::io::{self, Write};

use super::Context;
use crate::monitor::{Controller, MonitorError, ResultSurface, SessionOutcome, Surface};
use crate::transport::SseSource;

#[derive(Args)]
pub struct WatchArgs {
    /// Link to download (Spotify, YouTube, ...)
    pub link: String,

    /// Print to stdout instead of opening the interactive monitor
    #[arg(long)]
    pub plain: bool,

    /// Fetch the finished artifact even when `auto_fetch` is off in the config
    #[arg(long)]
    pub fetch: bool,
}

pub async fn run(ctx: &Context, args: WatchArgs) -> Result<()> {
    if !args.plain {
        return crate::tui::run(ctx, Some(args.link)).await;
    }

    let source = SseSource::new(ctx.http.clone(), ctx.server.clone());
    let mut controller = Controller::new(source, ctx.config.monitor.settings());
    let mut surface = Surface::new();
    let mut reporter = PlainReporter::default();
    let mut out = io::stdout();

    if let Err(e) = controller.start_monitoring(&args.link, &mut surface) {
        bail!("{}", e);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while controller.has_pending_work() {
        tokio::select! {
            wake = controller.next_wake() => {
                controller.handle(wake, &mut surface);
                reporter.render(&surface, &mut out)?;
            }
            _ = &mut ctrl_c => {
                bail!("Interrupted");
            }
        }
    }

    match controller.outcome() {
        Some(SessionOutcome::Completed(artifact)) => {
            println!("{}", artifact.url(&ctx.server));
            if args.fetch || ctx.config.auto_fetch {
                let written = ctx
                    .api()
                    .fetch_artifact(artifact, &ctx.config.download_dir())
                    .await?;
                println!("✓ Saved {}", written.display());
            }
            Ok(())
        }
        Some(outcome) => match outcome.error() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        },
        None => bail!("{}", MonitorError::ConnectionLost),
    }
}

/// Prints what changed on the surface since the last call.
#[derive(Default)]
pub struct PlainReporter {
    logs_generation: u64,
    logs_seen: u64,
    progress_seen: u64,
    last_percent: Option<u8>,
    result: ResultSurface,
}

impl PlainReporter {
    pub fn render(&mut self, surface: &Surface, out: &mut impl Write) -> io::Result<()> {
        let total = surface.logs.appended_total();
        if surface.logs.generation() != self.logs_generation {
            self.logs_generation = surface.logs.generation();
            self.logs_seen = 0;
        }
        let fresh = ((total - self.logs_seen) as usize).min(surface.logs.len());
        for entry in surface.logs.entries().skip(surface.logs.len() - fresh) {
            writeln!(out, "{}", entry.text)?;
        }
        self.logs_seen = total;

        let progress = &surface.progress;
        if progress.update_count() != self.progress_seen {
            self.progress_seen = progress.update_count();
            if progress.visible && self.last_percent != Some(progress.value) {
                writeln!(out, "[{:>3}%]", progress.value)?;
                self.last_percent = Some(progress.value);
            }
        }

        if surface.result != self.result {
            self.result = surface.result.clone();
            let text = self.result.text();
            if !text.is_empty() {
                writeln!(out, "{}", text)?;
            }
        }

        out.flush()
    }
}
