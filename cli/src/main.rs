// SPDX-License-Identifier: MIT OR Apache-2.0

//! People Nearby CLI
//!
//! Runs the People Nearby screen against an in-process nearby server seeded
//! from a JSON scenario, and prints the list as it changes. Without
//! `--watch` the list is printed once; with `--interactive` rows can be
//! activated from stdin.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use peers_nearby_cli::render::render_entries;
use peers_nearby_cli::scenario::Scenario;
use peers_nearby_cli::ConsoleNavigation;
use peers_nearby_core::{Coordinate, PeersNearbyEntry};
use peers_nearby_network::{
    config, system_clock, FixedLocation, HttpGeocoder, MemoryPeerStore, NearbyConfig,
    NearbyTransport, PeersNearbyScreen, ScreenDependencies, ScreenEvent, ScreenState,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(
    name = "peers-nearby",
    about = "Browse people, groups and channels near a position",
    version
)]
struct Args {
    /// Device latitude (overrides the scenario viewer)
    #[clap(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Device longitude (overrides the scenario viewer)
    #[clap(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// JSON scenario describing the neighbourhood
    #[clap(short, long)]
    scenario: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Locale used for distance units
    #[clap(long)]
    locale: Option<String>,

    /// Enable debug logging
    #[clap(long)]
    debug: bool,

    /// Become visible before printing
    #[clap(long)]
    make_visible: bool,

    /// Keep printing changes for this many seconds
    #[clap(long)]
    watch: Option<u64>,

    /// Read commands from stdin
    #[clap(short, long)]
    interactive: bool,
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(args: &Args) -> Result<NearbyConfig> {
    let mut settings = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config().unwrap_or_else(|e| {
            warn!(error = %e, "Using default configuration");
            NearbyConfig::default()
        }),
    };
    if let Some(locale) = &args.locale {
        settings.locale = locale.clone();
    }
    Ok(settings)
}

fn viewer_position(args: &Args, scenario: &Scenario) -> Result<Option<Coordinate>> {
    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Ok(Some(
            Coordinate::new(lat, lon).context("Invalid --lat/--lon")?,
        )),
        (None, None) => Ok(scenario.viewer),
        _ => Err(anyhow!("--lat and --lon must be given together")),
    }
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let settings = load_settings(&args)?;
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    let viewer = viewer_position(&args, &scenario)?;

    let clock = system_clock();
    let server = Arc::new(scenario.build_server(clock.clone(), settings.push_buffer_size));
    let store = Arc::new(MemoryPeerStore::new());
    scenario.seed(&server, &store, clock())?;

    let location = match viewer {
        Some(coordinate) => FixedLocation::new(coordinate),
        None => {
            warn!("No viewer position; the list will stay empty");
            FixedLocation::unavailable()
        }
    };

    let mut deps = ScreenDependencies::new(
        server.clone(),
        Arc::new(location),
        store,
        Arc::new(ConsoleNavigation),
        scenario.account_peer_id(),
    )
    .with_clock(clock);
    if let Some(url) = &settings.geocoder_url {
        let language = settings.locale.replace('_', "-");
        let geocoder = HttpGeocoder::new(url.clone())
            .with_language(language)
            .with_timeout(settings.geocoder_timeout());
        deps = deps.with_geocoder(Arc::new(geocoder));
    }

    // Upper bound for the first answer when no event arrives
    let first_answer = settings.location_timeout() + Duration::from_secs(5);
    let screen = PeersNearbyScreen::start(deps, settings);
    let mut events = screen.events();

    if scenario.visible || args.make_visible {
        screen.toggle_visibility(true);
    }

    let mut state = screen.state();
    let first = tokio::select! {
        result = state.wait_for(|s| s.data.is_some()) => result.map(|s| s.clone()).ok(),
        _ = wait_location_unavailable(&mut events) => None,
        _ = tokio::time::sleep(first_answer) => None,
    };
    print_state(&screen, &first.unwrap_or_else(|| screen.current()));

    if args.interactive {
        run_interactive(&screen, server).await?;
    } else if let Some(secs) = args.watch {
        watch(&screen, Duration::from_secs(secs)).await;
    }

    screen.dispose();
    info!("Done");
    Ok(())
}

async fn wait_location_unavailable(events: &mut tokio::sync::broadcast::Receiver<ScreenEvent>) {
    loop {
        match events.recv().await {
            Ok(ScreenEvent::LocationUnavailable) => return,
            Ok(_) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                std::future::pending::<()>().await;
            }
        }
    }
}

fn print_state(screen: &PeersNearbyScreen, state: &ScreenState) {
    let ctx = screen.row_context();
    let entries = state.entries(ctx.strings);
    println!("{}", render_entries(&entries, &ctx));
}

/// Print every state change until `duration` passes or Ctrl+C
async fn watch(screen: &PeersNearbyScreen, duration: Duration) {
    let mut state = screen.state();
    state.mark_unchanged();
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = signal::ctrl_c() => {
                println!("\nReceived Ctrl+C, shutting down...");
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().clone();
                print_state(screen, &current);
            }
        }
    }
}

/// A parsed stdin command
#[derive(Debug, PartialEq)]
enum Command {
    Show,
    Refresh,
    Visible(bool),
    Activate(usize),
    CreateGroup,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command> {
    let mut parts = line.split_whitespace();
    let command = match parts.next() {
        None | Some("show") | Some("ls") => Command::Show,
        Some("refresh") | Some("r") => Command::Refresh,
        Some("visible") => Command::Visible(true),
        Some("hide") => Command::Visible(false),
        Some("group") => Command::CreateGroup,
        Some("open") => {
            let index = parts
                .next()
                .ok_or_else(|| anyhow!("open needs a row number"))?
                .parse()
                .context("Row number must be a positive integer")?;
            Command::Activate(index)
        }
        Some("help") | Some("?") => Command::Help,
        Some("quit") | Some("q") | Some("exit") => Command::Quit,
        Some(other) => return Err(anyhow!("Unknown command: {}", other)),
    };
    Ok(command)
}

/// Actionable rows in display order
fn actionable_rows(entries: &[PeersNearbyEntry]) -> Vec<&PeersNearbyEntry> {
    entries
        .iter()
        .filter(|entry| {
            !matches!(
                entry,
                PeersNearbyEntry::Header { .. }
                    | PeersNearbyEntry::UsersHeader { .. }
                    | PeersNearbyEntry::GroupsHeader { .. }
                    | PeersNearbyEntry::ChannelsHeader { .. }
                    | PeersNearbyEntry::Empty { .. }
            )
        })
        .collect()
}

fn print_rows(screen: &PeersNearbyScreen) {
    let entries = screen.entries();
    let ctx = screen.row_context();
    for (index, row) in actionable_rows(&entries).into_iter().enumerate() {
        let title = match row {
            PeersNearbyEntry::Visibility { title, .. }
            | PeersNearbyEntry::CreateGroup { title, .. } => title.clone(),
            PeersNearbyEntry::User { entry, .. }
            | PeersNearbyEntry::Group { entry, .. }
            | PeersNearbyEntry::Channel { entry, .. } => match row.subtitle(&ctx) {
                Some(subtitle) => format!("{} - {}", entry.peer.title, subtitle),
                None => entry.peer.title.clone(),
            },
            _ => continue,
        };
        println!("{:>3}. {}", index + 1, title);
    }
}

async fn run_interactive(
    screen: &PeersNearbyScreen,
    server: Arc<peers_nearby_network::LocalNearbyServer>,
) -> Result<()> {
    let mut stdin_lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut events = screen.events();
    let mut state = screen.state();
    state.mark_unchanged();

    print_rows(screen);
    println!("Commands: show, open <n>, visible, hide, group, refresh, quit");

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("\nReceived Ctrl+C, shutting down...");
                break;
            }

            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                state.borrow_and_update();
                print_rows(screen);
            }

            event = events.recv() => {
                match event {
                    Ok(ScreenEvent::VisibilityUpdated { visible }) => {
                        println!("Visibility: {}", if visible { "on" } else { "off" });
                    }
                    Ok(ScreenEvent::VisibilityUpdateFailed { error, .. }) => {
                        eprintln!("Visibility update failed: {}", error);
                    }
                    Ok(ScreenEvent::LocationUnavailable) => eprintln!("Location unavailable"),
                    Ok(ScreenEvent::CreateGroupCheckFailed { error }) => {
                        eprintln!("Cannot check group availability: {}", error);
                    }
                    Err(_) => {}
                }
            }

            result = stdin_lines.next_line() => {
                let line = match result {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("Error reading input: {}", e);
                        continue;
                    }
                };

                match parse_command(line.trim()) {
                    Ok(Command::Show) => print_state(screen, &screen.current()),
                    Ok(Command::Refresh) => screen.refresh(),
                    Ok(Command::Visible(visible)) => screen.toggle_visibility(visible),
                    Ok(Command::CreateGroup) => {
                        if !screen.open_create_group() {
                            println!("Address not known yet");
                        }
                    }
                    Ok(Command::Activate(index)) => {
                        let entries = screen.entries();
                        let rows = actionable_rows(&entries);
                        match index.checked_sub(1).and_then(|i| rows.get(i)) {
                            Some(row) => {
                                screen.activate(row);
                            }
                            None => eprintln!("No row {}", index),
                        }
                    }
                    Ok(Command::Help) => {
                        println!("Commands: show, open <n>, visible, hide, group, refresh, quit");
                        println!("Can create a local group: {}", group_availability(&server).await);
                    }
                    Ok(Command::Quit) => break,
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
    }

    Ok(())
}

async fn group_availability(server: &peers_nearby_network::LocalNearbyServer) -> &'static str {
    match server.can_create_located_group().await {
        Ok(true) => "yes",
        Ok(false) => "no",
        Err(_) => "unknown",
    }
}
