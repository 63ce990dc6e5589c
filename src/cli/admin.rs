//! `dlwatch status|login|logout|set-path` command implementations

use anyhow::{bail, Result};
use clap::Args;
use std::io::{self, Write};

use super::Context;

#[derive(Args)]
pub struct LoginArgs {
    /// Admin username (prompted when omitted)
    #[arg(short, long, env = "DLWATCH_USERNAME")]
    username: Option<String>,

    /// Admin password (prompted when omitted)
    #[arg(short, long, env = "DLWATCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args)]
pub struct SetPathArgs {
    /// Directory on the server where admin downloads are stored
    path: String,
}

pub async fn status(ctx: &Context) -> Result<()> {
    let status = ctx.api().check_status().await?;
    if status.logged_in {
        println!("✓ Logged in as admin on {}", ctx.server);
    } else {
        println!("Not logged in on {}", ctx.server);
    }
    Ok(())
}

pub async fn login(ctx: &Context, args: LoginArgs) -> Result<()> {
    let username = match args.username {
        Some(u) => u,
        None => prompt("Username: ")?,
    };
    let password = match args.password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };

    if ctx.api().login(&username, &password).await? {
        println!("✓ Login successful!");
        Ok(())
    } else {
        bail!("Login failed. Try again.");
    }
}

pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.api().logout().await?;
    println!("✓ Logged out");
    Ok(())
}

pub async fn set_path(ctx: &Context, args: SetPathArgs) -> Result<()> {
    let response = ctx.api().set_path(&args.path).await?;
    if !response.success {
        bail!(
            "Error: {}",
            response.message.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    println!(
        "✓ Download path set successfully to: {}",
        response.new_path.unwrap_or(args.path)
    );
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    let response = response.trim().to_string();
    if response.is_empty() {
        bail!("{} cannot be empty", label.trim_end_matches([':', ' ']));
    }
    Ok(response)
}
