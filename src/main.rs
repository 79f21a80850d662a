use std::{
    io::{self, Write},
    panic,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    execute,
    style::ResetColor,
    terminal::{self as crossterm_terminal, LeaveAlternateScreen, disable_raw_mode},
};
use tracing::info;
use tuirealm::{
    PollStrategy,
    terminal::{CrosstermTerminalAdapter, TerminalBridge},
};

use ysm::{
    app::App,
    backup::backup_db_file,
    db::Database,
    install::{install, verify_installation},
    keybindings::Keybindings,
    logging::{init_logging, print_log_location},
    model::Channels,
    realm::{RootId, apply_message, init_application, seed_viewport, should_quit},
    reconcile::sync_subscriptions,
    settings::{AppPaths, Settings},
    youtube::YoutubeClient,
};

#[derive(Parser, Debug)]
#[command(
    name = "ysm",
    about = "Terminal manager for tagging and publishing YouTube subscriptions",
    long_about = "Keeps a local copy of your YouTube subscriptions, lets you tag and annotate \
                  channels, and renders them to an HTML page.",
    version = env!("YSM_BUILD_VERSION"),
    author
)]
struct Cli {
    /// Create the config and data directories, default template and settings file, then exit
    #[arg(long)]
    install: bool,
}

static TERMINAL_RESTORED: AtomicBool = AtomicBool::new(false);

fn main() -> Result<()> {
    let log_path = match init_logging() {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("warning: failed to initialize logging: {err}");
            None
        }
    };
    if let Some(path) = log_path.as_ref() {
        install_panic_hook_with_log(path.clone());
    }

    let result = run_app();
    if let Some(path) = log_path.as_ref() {
        print_log_location(path);
    }
    result
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::discover()?;

    if cli.install {
        for line in install(&paths).context("installation failed")? {
            println!("{line}");
            info!("{line}");
        }
        return Ok(());
    }

    verify_installation(&paths)?;
    let settings = Settings::load(&paths)?;
    println!("Using settings file: {}", paths.settings_file().display());

    if let Some(outcome) = backup_db_file(&settings.db_file, settings.backup_copies)
        .context("failed to back up database")?
    {
        println!("Backed up database to: {}", outcome.created.display());
        for removed in &outcome.removed {
            println!("Removed old backup: {}", removed.display());
        }
    }

    let db = Database::open(&settings.db_file)?;
    let channels = Channels::load(&db).context("failed to load channels")?;
    if settings.refresh || channels.is_empty() {
        println!("Fetching subscriptions from YouTube...");
        let mut client =
            YoutubeClient::new(settings.youtube.clone(), paths.credentials_file())?;
        let report = sync_subscriptions(&db, &mut client)?;
        for line in report.lines() {
            println!("{line}");
        }
        info!(
            inserted = report.inserted.len(),
            updated = report.updated.len(),
            deleted = report.deleted.len(),
            "subscriptions reconciled"
        );
    }

    let app = Arc::new(Mutex::new(App::new(db, settings, Keybindings::load())?));

    let _guard = TerminalGuard;
    let mut terminal = setup_terminal()?;
    let mut realm = init_application(Arc::clone(&app))?;
    seed_viewport(
        &app,
        crossterm_terminal::size().context("failed to read terminal size")?,
    )?;

    let mut redraw = true;
    while !should_quit(&app)? {
        if redraw {
            terminal
                .draw(|frame| realm.view(&RootId::Root, frame, frame.area()))
                .context("failed to render frame")?;
            redraw = false;
        }

        let messages = realm
            .tick(PollStrategy::Once)
            .context("failed to process tui-realm tick")?;

        if !messages.is_empty() {
            redraw = true;
        }

        for message in messages {
            apply_message(&app, message)?;
        }
    }

    let _ = terminal.disable_raw_mode();
    let _ = terminal.leave_alternate_screen();
    let _ = terminal.clear_screen();
    TERMINAL_RESTORED.store(true, Ordering::SeqCst);

    Ok(())
}

fn setup_terminal() -> Result<TerminalBridge<CrosstermTerminalAdapter>> {
    TERMINAL_RESTORED.store(false, Ordering::SeqCst);

    let mut terminal =
        TerminalBridge::new_crossterm().context("failed to initialize terminal bridge")?;

    terminal
        .enable_raw_mode()
        .context("failed to enable raw mode")?;
    terminal
        .enter_alternate_screen()
        .context("failed to enter alternate screen")?;

    Ok(terminal)
}

fn install_panic_hook_with_log(log_path: PathBuf) {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        eprintln!();
        eprintln!("  Log file: {}", log_path.display());
        eprintln!();
        previous_hook(panic_info);
    }));
}

fn restore_terminal() -> Result<()> {
    if TERMINAL_RESTORED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let _ = disable_raw_mode();

    let mut stderr = io::stderr();
    let _ = execute!(stderr, LeaveAlternateScreen, Show, ResetColor);
    let _ = stderr.write_all(b"\x1b[?1049l\x1b[?2004l\x1b[?7h\x1b[?25h\x1b[0m\x1b[2J\x1b[H");
    let _ = stderr.flush();

    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}
