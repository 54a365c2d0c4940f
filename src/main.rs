//! src/main.rs – rime launcher: profile, catalog, terminal and event loop
mod grid_view;
mod navigator;
mod palette;
mod workspace;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::event::Event;
use tui::{backend::CrosstermBackend, Terminal};

use crate::workspace::{Status, Workspace};
use rime::config::Config;
use rime::session::{Catalog, Session};
use rime::sharing::{ClientOptions, Profile, ProfileLocator, RestClient, SharingClient};

#[cfg(unix)]
use libc::{SIGHUP, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/*──────────────────────── CLI ──────────────────────────────────*/
#[derive(Parser)]
#[command(name = "rime")]
#[command(about = "Terminal browser for Delta Sharing tables", long_about = None)]
struct Cli {
    /// Profile file, optionally followed by `#share.schema.table`
    #[arg(short, long, value_name = "PATH[#share.schema.table]")]
    profile: Option<String>,

    /// Directory for log files (default: `logs` next to the executable)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

/*──────────────────────── terminal ─────────────────────────────*/
fn restore_terminal() {
    let mut out = io::stdout();
    let _ = crossterm::execute!(
        out,
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    );
    let _ = out.flush();
    let _ = crossterm::terminal::disable_raw_mode();
}

/*──────────────────────── main ────────────────────────────────*/
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    /* Load configuration; a broken file only costs a status message */
    let (config, config_error) = match Config::load() {
        Ok(cfg) => (cfg, None),
        Err(e) => (Config::default(), Some(format!("{e:#}"))),
    };

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| Config::home_dir().join("logs"));
    let _logging = rime::logging::init(&log_dir, &config.log_filter);

    let Some(profile_arg) = cli.profile.clone().or_else(|| config.profile.clone()) else {
        eprintln!("error: no profile given (use --profile or set `profile` in config.toml)");
        process::exit(1);
    };
    let locator = ProfileLocator::parse(&profile_arg);

    /* Client + catalog: failures here are fatal */
    let client = match open_client(&locator, &config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "could not open sharing client");
            eprintln!("Could not open sharing client: {e:#}");
            process::exit(1);
        }
    };
    let catalog = match Catalog::load(client.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "could not list shared tables");
            eprintln!("Could not list shared tables: {e}");
            process::exit(1);
        }
    };

    run_interactive(Session::new(client, catalog), &locator, config_error)
}

fn open_client(locator: &ProfileLocator, config: &Config) -> anyhow::Result<Arc<dyn SharingClient>> {
    let profile = Profile::from_file(&locator.path)
        .with_context(|| format!("loading profile {}", locator.path.display()))?;
    let options = ClientOptions {
        batch_rows: config.batch_rows,
        timeout: config.request_timeout(),
    };
    let client = RestClient::new(profile, options)?;
    tracing::info!(endpoint = client.endpoint(), "sharing client ready");
    Ok(Arc::new(client))
}

fn run_interactive(
    session: Session,
    locator: &ProfileLocator,
    config_error: Option<String>,
) -> anyhow::Result<()> {
    let redraw = session.redraw().clone();
    let mut workspace = Workspace::new(session);

    if let Some(coordinate) = &locator.table {
        match workspace.session.catalog().locate(coordinate) {
            Some(path) => workspace.preselect(path),
            None => workspace.set_status(Status::Error(format!(
                "table {}.{}.{} not found",
                coordinate.share, coordinate.schema, coordinate.table
            ))),
        }
    }
    if let Some(msg) = config_error {
        workspace.set_status(Status::Error(msg));
    }

    /* ───── SIGHUP/SIGTERM: give the terminal back before exiting ───── */
    #[cfg(unix)]
    {
        let mut signals = Signals::new([SIGHUP, SIGTERM])?;
        std::thread::Builder::new()
            .name("signals".into())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    tracing::info!(signal = sig, "terminating");
                    restore_terminal();
                    process::exit(0);
                }
            })?;
    }

    /* Crossterm / TUI init */
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut term = Terminal::new(backend)?;

    let result = event_loop(&mut term, &mut workspace, &redraw);
    restore_terminal();
    tracing::info!("bye");
    result
}

fn event_loop(
    term: &mut Terminal<CrosstermBackend<io::Stdout>>,
    workspace: &mut Workspace,
    redraw: &rime::RedrawSignal,
) -> anyhow::Result<()> {
    let tick = Duration::from_millis(100);
    let mut last_draw = Instant::now();
    let mut dirty = true;

    'main: loop {
        if workspace.poll_projections() {
            dirty = true;
        }
        if redraw.take() {
            dirty = true;
        }

        if crossterm::event::poll(tick)? {
            match crossterm::event::read()? {
                Event::Key(k) if workspace.handle_key(k)? => break 'main, // Ctrl-Q
                Event::Key(_) => dirty = true,
                Event::Mouse(m) => {
                    workspace.handle_mouse(m);
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        let had_status = workspace.status.is_some();
        workspace.update();
        if had_status != workspace.status.is_some() {
            dirty = true;
        }

        if dirty && last_draw.elapsed() >= Duration::from_millis(15) {
            workspace.render(term)?;
            last_draw = Instant::now();
            dirty = false;
        }
    }
    Ok(())
}
