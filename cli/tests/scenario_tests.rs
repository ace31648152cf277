// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end runs of seeded scenarios through the screen and text renderer.

use std::sync::Arc;
use std::time::Duration;

use peers_nearby_cli::render::render_entries;
use peers_nearby_cli::scenario::Scenario;
use peers_nearby_cli::ConsoleNavigation;
use peers_nearby_network::{
    system_clock, FixedLocation, MemoryPeerStore, NearbyConfig, PeersNearbyScreen,
    ScreenDependencies, ScreenState, UnitsConfig,
};

const NEIGHBOURHOOD: &str = r#"{
    "account": {"id": 1, "title": "Me"},
    "viewer": {"latitude": 52.3676, "longitude": 4.9041},
    "peers": [
        {"id": 42, "kind": "user", "title": "Ada", "username": "ada",
         "latitude": 52.3700, "longitude": 4.9041},
        {"id": 10, "kind": "group", "title": "Dog walkers", "members": 12,
         "latitude": 52.3650, "longitude": 4.9000},
        {"id": 11, "kind": "channel", "title": "Canal news", "members": 800,
         "latitude": 52.3600, "longitude": 4.9100},
        {"id": 43, "kind": "user", "title": "Gone", "ttl_secs": -10,
         "latitude": 52.3676, "longitude": 4.9041}
    ]
}"#;

fn start(scenario: &Scenario) -> PeersNearbyScreen {
    let clock = system_clock();
    let server = Arc::new(scenario.build_server(clock.clone(), 16));
    let store = Arc::new(MemoryPeerStore::new());
    scenario.seed(&server, &store, clock()).unwrap();

    let location = match scenario.viewer {
        Some(viewer) => FixedLocation::new(viewer),
        None => FixedLocation::unavailable(),
    };
    let deps = ScreenDependencies::new(
        server,
        Arc::new(location),
        store,
        Arc::new(ConsoleNavigation),
        scenario.account_peer_id(),
    )
    .with_clock(clock);
    let config = NearbyConfig {
        units: UnitsConfig::Metric,
        ..NearbyConfig::default()
    };
    PeersNearbyScreen::start(deps, config)
}

async fn first_data(screen: &PeersNearbyScreen) -> ScreenState {
    let mut state = screen.state();
    let data = tokio::time::timeout(Duration::from_secs(10), state.wait_for(|s| s.data.is_some()))
        .await
        .expect("no data within timeout")
        .expect("screen closed")
        .clone();
    data
}

#[tokio::test]
async fn test_scenario_renders_all_sections() {
    let scenario = Scenario::from_json(NEIGHBOURHOOD).unwrap();
    let screen = start(&scenario);
    let state = first_data(&screen).await;

    let data = state.data.as_ref().unwrap();
    assert_eq!(data.users.len(), 1, "expired peer must not be listed");
    assert_eq!(data.groups.len(), 1);
    assert_eq!(data.channels.len(), 1);

    let ctx = screen.row_context();
    let text = render_entries(&state.entries(ctx.strings), &ctx);
    assert!(text.contains("PEOPLE NEARBY"));
    assert!(text.contains("  [Make Myself Visible]"));
    assert!(text.contains("  Ada (@ada) - "));
    assert!(text.contains("12 members"));
    assert!(text.contains("CHANNELS NEARBY"));
    assert!(text.contains("800 subscribers"));
    assert!(!text.contains("Gone"));

    assert!(screen.dispose());
}

#[tokio::test]
async fn test_scenario_visible_account_is_listed() {
    let scenario = Scenario::from_json(NEIGHBOURHOOD).unwrap();
    let screen = start(&scenario);
    screen.toggle_visibility(true);

    let mut state = screen.state();
    let state = tokio::time::timeout(
        Duration::from_secs(10),
        state.wait_for(|s| {
            s.data
                .as_ref()
                .map_or(false, |d| d.users.iter().any(|u| u.peer.id == scenario.account_peer_id()))
        }),
    )
    .await
    .expect("self entry did not appear")
    .expect("screen closed")
    .clone();

    let ctx = screen.row_context();
    let text = render_entries(&state.entries(ctx.strings), &ctx);
    assert!(text.contains("  [Stop Showing Me]"));
    assert!(text.contains("  Me - visible until"));
}

#[tokio::test]
async fn test_scenario_without_viewer_stays_empty() {
    let scenario = Scenario::from_json(r#"{"peers": []}"#).unwrap();
    let screen = start(&scenario);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let state = screen.current();
    assert!(state.data.is_none());
    assert!(state.location_unavailable);
    assert!(!state.display_loading);
}
