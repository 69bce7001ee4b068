use pawswipe::config::Settings;
use pawswipe::core::{DeckMode, FavoriteDeck, FavoriteInterlock, Settled, ToggleOutcome};
use pawswipe::models::{Candidate, Offset, SwipeDirection};
use pawswipe::services::{
    CandidateSource, DecisionRecorder, EventSink, PetApiClient, SessionEvent,
};
use pawswipe::session::{LoadReport, SwipeSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str =
    "commands: like | skip | drag <dx> [dy] | fav | expand | reload | favorites | home | show | help | quit";

/// Prints session events for the terminal user
struct TerminalSink;

impl EventSink for TerminalSink {
    fn emit(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::CandidateChanged(Some(candidate)) => print_candidate(&candidate),
            SessionEvent::CandidateChanged(None) => println!("(no pets to show)"),
            SessionEvent::Decision(decision) => {
                println!("-> {:?} {} (#{})", decision.direction, decision.candidate_id, decision.sequence)
            }
            SessionEvent::QueueExhausted { radius_km } => {
                println!("No more pets within {}km. Type `expand` to search further.", radius_km)
            }
            SessionEvent::RadiusCapped => println!("Search radius is already at its maximum."),
            SessionEvent::FetchFailed { message } => println!("Could not load pets ({}). Type `reload` to retry.", message),
            SessionEvent::PersistFailed { candidate_id, message } => {
                println!("Adoption request for {} was not saved: {}", candidate_id, message)
            }
            SessionEvent::FavoriteRemoved { candidate_id } => println!("Removed {} from favorites", candidate_id),
        }
    }
}

fn print_candidate(candidate: &Candidate) {
    let details: Vec<String> = [
        candidate.species.clone(),
        candidate.breed.clone(),
        candidate.distance_km.map(|d| format!("{:.1}km away", d)),
    ]
    .into_iter()
    .flatten()
    .collect();
    println!("Now showing: {} [{}] {}", candidate.name, candidate.id, details.join(", "));
}

/// Poll the session at frame cadence until the running animation settles
async fn run_animation<S, R, K>(session: &mut SwipeSession<S, R, K>, frame: Duration) -> Option<Settled>
where
    S: CandidateSource,
    R: DecisionRecorder,
    K: EventSink,
{
    let mut interval = tokio::time::interval(frame);
    while session.controller().is_animating() {
        interval.tick().await;
        if let Some(settled) = session.tick(Instant::now()).await {
            return Some(settled);
        }
    }
    None
}

fn init_logging(settings: &Settings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

/// Swipe commands shared by the home and favorites screens. Returns false
/// when `command` is not one of them.
async fn swipe_command<S, R, K>(
    session: &mut SwipeSession<S, R, K>,
    command: &str,
    args: &[&str],
    frame: Duration,
) -> bool
where
    S: CandidateSource,
    R: DecisionRecorder,
    K: EventSink,
{
    match command {
        "like" | "l" | "skip" | "s" => {
            let direction = if command.starts_with('l') {
                SwipeDirection::Like
            } else {
                SwipeDirection::Skip
            };
            if session.trigger_programmatic(direction, Instant::now()).is_some() {
                run_animation(session, frame).await;
            } else {
                println!("Nothing to swipe right now.");
            }
        }
        "drag" => {
            let dx = args.first().and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
            let dy = args.get(1).and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
            if session.pointer_down(Instant::now()) {
                session.pointer_move(Offset::new(dx, dy));
                if session.pointer_up(Instant::now()).is_some() {
                    if let Some(Settled::Reset) = run_animation(session, frame).await {
                        println!("Not far enough, card snapped back.");
                    }
                }
            }
        }
        "reload" | "r" => {
            if let Err(e) = session.reload().await {
                warn!("Reload failed: {}", e);
            }
        }
        _ => return false,
    }
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Favorites,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;
    init_logging(&settings);
    info!("Configuration loaded successfully");

    let api = PetApiClient::new(
        settings.api.base_url.clone(),
        settings.api.auth_token.clone(),
        Duration::from_secs(settings.api.timeout_secs),
    )?;
    info!("Pet API client initialized for {}", api.base_url());

    let favorites = Arc::new(FavoriteInterlock::new(api.clone(), settings.favorite_lock_timeout()));
    if let Err(e) = favorites.refresh().await {
        warn!("Could not load favorites: {}", e);
    }

    let animation = settings.animation_config();
    let frame = animation.frame_interval;
    let mut home = SwipeSession::new(
        api.clone(),
        api,
        TerminalSink,
        settings.gesture_config(),
        animation,
        settings.radius_policy(),
    );
    let deck = FavoriteDeck::new(Arc::clone(&favorites));
    let mut favorites_screen = SwipeSession::new(
        deck.clone(),
        deck,
        TerminalSink,
        settings.gesture_config(),
        animation,
        settings.radius_policy(),
    )
    .with_mode(DeckMode::FavoriteRemoval);

    let mut screen = Screen::Home;
    if let Err(e) = home.focus().await {
        error!("Initial load failed: {}", e);
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        let handled = match screen {
            Screen::Home => swipe_command(&mut home, command, args, frame).await,
            Screen::Favorites => swipe_command(&mut favorites_screen, command, args, frame).await,
        };
        if handled {
            continue;
        }

        match command {
            "fav" | "f" if screen == Screen::Home => {
                let Some(id) = home.current().map(|c| c.id.clone()) else {
                    println!("No pet selected.");
                    continue;
                };
                match favorites.toggle(&id).await {
                    Ok(ToggleOutcome::Added(_)) => println!("Added {} to favorites", id),
                    Ok(ToggleOutcome::Removed { .. }) => println!("Removed {} from favorites", id),
                    Ok(ToggleOutcome::Rejected) => {}
                    Err(e) => println!("Favorite update failed: {}", e),
                }
            }
            "expand" | "e" if screen == Screen::Home => match home.expand_radius().await {
                Ok(LoadReport::Applied(outcome)) => info!("Expanded search: {:?}", outcome),
                Ok(_) => {}
                Err(e) => warn!("Expansion reload failed: {}", e),
            },
            "favorites" | "favs" if screen == Screen::Home => {
                home.blur();
                screen = Screen::Favorites;
                println!("Favorites: swipe a card either way to remove it. Type `home` to go back.");
                if let Err(e) = favorites_screen.focus().await {
                    error!("Could not load favorites: {}", e);
                }
            }
            "home" if screen == Screen::Favorites => {
                favorites_screen.blur();
                screen = Screen::Home;
                if let Err(e) = home.focus().await {
                    error!("Reload failed: {}", e);
                }
            }
            "show" => {
                let snapshot = home.queue().snapshot();
                let current = match screen {
                    Screen::Home => home.current(),
                    Screen::Favorites => favorites_screen.current(),
                };
                match current {
                    Some(candidate) => print_candidate(candidate),
                    None => println!("(no pets to show)"),
                }
                println!(
                    "radius {}km, {} in deck, {} decided, {} favorites",
                    snapshot.radius_km,
                    snapshot.len,
                    snapshot.excluded,
                    favorites.favorites().len()
                );
            }
            "help" | "?" => println!("{}", HELP),
            "quit" | "q" => break,
            other => println!("Unknown command `{}`. {}", other, HELP),
        }
    }

    home.blur();
    favorites_screen.blur();
    info!("Session closed");
    Ok(())
}
