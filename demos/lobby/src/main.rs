//! End-to-end lobby lifecycle over the loopback provider.
//!
//! Drives the full command → completion → event cycle from the host's
//! perspective: login, host a private duo session, watch the roster fill
//! and the advertising toggle flip, start the match, tear it all down.
//!
//! Run with `cargo run -p lobby-demo` (set `RUST_LOG=debug` for provider
//! internals).

use matchlink::{EventReceiver, SessionCoordinator, SessionEvent};
use matchlink_provider::{CompletionReceiver, LoopbackProvider};
use matchlink_types::{
    LoginCredentials, MatchType, PlayerId, SessionConfig, generate_join_code,
};
use tracing_subscriber::EnvFilter;

const HOST: PlayerId = PlayerId(1);
const GUEST: PlayerId = PlayerId(2);

/// Feeds every queued provider completion into the coordinator, then
/// prints the events it raised. The loopback provider completes each
/// request immediately, so one pump settles each command.
fn pump(
    coord: &mut SessionCoordinator<LoopbackProvider>,
    completions: &mut CompletionReceiver,
    events: &mut EventReceiver,
) {
    while let Ok(completion) = completions.try_recv() {
        coord.handle_completion(completion);
    }
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::RosterChanged { roster } => {
                tracing::info!(?roster, "roster changed");
            }
            other => tracing::info!(event = ?other, "session event"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (provider, mut completions) = LoopbackProvider::new();
    let mut coord = SessionCoordinator::builder()
        .provider(provider)
        .local_user(HOST)
        .build();
    let mut events = coord.subscribe();

    // 1. Log in through the interactive portal flow.
    coord.login(LoginCredentials::portal())?;
    pump(&mut coord, &mut completions, &mut events);
    tracing::info!(username = coord.player_username(), "logged in");

    // 2. Host a private duo session behind a rolled join code.
    let join_code = generate_join_code();
    tracing::info!(join_code, "hosting private session");
    let config = SessionConfig::new(2, MatchType::Duo)?.private(join_code);
    coord.create_session(config)?;
    pump(&mut coord, &mut completions, &mut events);

    // 3. Players arrive: the host registers, then a guest. The second
    //    registration fills the session and the advertising toggle hides
    //    it from search.
    coord.on_player_joined(HOST, coord.player_username().to_string());
    pump(&mut coord, &mut completions, &mut events);
    coord.on_player_joined(GUEST, "guest");
    pump(&mut coord, &mut completions, &mut events);
    tracing::info!(
        advertising = coord.is_advertising(),
        roster = ?coord.roster(),
        "lobby is full"
    );

    // 4. Kick off the match.
    coord.start_session()?;
    pump(&mut coord, &mut completions, &mut events);

    // 5. Back to the main menu: destroy the session and tear down.
    coord.destroy_session()?;
    pump(&mut coord, &mut completions, &mut events);
    coord.teardown();

    Ok(())
}
