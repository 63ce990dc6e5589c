//! Interactive terminal monitor

mod app;
mod components;
mod dialogs;
mod render;
mod styles;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;

use crate::cli::Context;
pub use app::App;

pub async fn run(ctx: &Context, initial_link: Option<String>) -> Result<()> {
    let mut app = App::new(ctx);
    if let Some(link) = initial_link {
        app.start_with(link);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));

    let result = match Terminal::new(CrosstermBackend::new(io::stdout())) {
        Ok(mut terminal) => {
            let result = app.run(&mut terminal).await;
            let _ = terminal.show_cursor();
            result
        }
        Err(e) => Err(e.into()),
    };

    restore_terminal();
    let _ = std::panic::take_hook();
    result
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}
