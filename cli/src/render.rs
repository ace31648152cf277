// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain text rendering of the People Nearby list for the CLI.

use peers_nearby_core::{PeersNearbyEntry, RowContext};

/// Render rows as indented text, one row per line
pub fn render_entries(entries: &[PeersNearbyEntry], ctx: &RowContext<'_>) -> String {
    let mut output = String::new();
    let mut section = None;

    for entry in entries {
        // Blank line between sections
        if section.is_some() && section != Some(entry.section()) {
            output.push('\n');
        }
        section = Some(entry.section());

        let line = match entry {
            PeersNearbyEntry::Header { text } => text.clone(),
            PeersNearbyEntry::UsersHeader { text, loading }
            | PeersNearbyEntry::GroupsHeader { text, loading } => with_loading(text, *loading),
            PeersNearbyEntry::ChannelsHeader { text } => text.clone(),
            PeersNearbyEntry::Empty { text } => format!("  {}", text),
            PeersNearbyEntry::Visibility { title, .. }
            | PeersNearbyEntry::CreateGroup { title, .. } => format!("  [{}]", title),
            PeersNearbyEntry::User { entry: peer_entry, .. }
            | PeersNearbyEntry::Group { entry: peer_entry, .. }
            | PeersNearbyEntry::Channel { entry: peer_entry, .. } => {
                let mut line = format!("  {}", peer_entry.peer.title);
                if let Some(username) = &peer_entry.peer.username {
                    line.push_str(&format!(" (@{})", username));
                }
                if let Some(subtitle) = entry.subtitle(ctx) {
                    line.push_str(" - ");
                    line.push_str(&subtitle);
                }
                line
            }
        };
        output.push_str(&line);
        output.push('\n');
    }

    output
}

fn with_loading(text: &str, loading: bool) -> String {
    if loading {
        format!("{} ...", text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peers_nearby_core::{
        list_entries, DateTimeFormat, DistanceFormatter, DistancePrecision, DistanceUnits, Peer,
        PeerId, PeerNearbyEntry, PeersNearbyData, PresentationStrings,
    };

    #[test]
    fn test_render_entries() {
        let strings = PresentationStrings::default();
        let mut data = PeersNearbyData::empty(52.0, 4.0, Some("Dam".into()));
        data.users.push(PeerNearbyEntry::new(
            Peer::user(42, "Ada").with_username("ada"),
            None,
            500,
            650,
        ));
        let entries = list_entries(Some(&data), &strings, false);
        let ctx = RowContext {
            strings: &strings,
            distance: DistanceFormatter::new(DistanceUnits::Metric, DistancePrecision::Adaptive),
            date_time: DateTimeFormat::default(),
            account_peer_id: PeerId::user(1),
            now: 0,
        };

        let text = render_entries(&entries, &ctx);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], strings.discover_description);
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "PEOPLE NEARBY");
        assert_eq!(lines[3], "  [Make Myself Visible]");
        assert_eq!(lines[4], "  Ada (@ada) - 650 m away");
        assert!(text.contains("GROUPS NEARBY\n  [Create a Local Group]\n"));
        assert!(!text.contains("CHANNELS NEARBY"));
    }

    #[test]
    fn test_loading_headers() {
        let strings = PresentationStrings::default();
        let entries = list_entries(None, &strings, true);
        let ctx = RowContext {
            strings: &strings,
            distance: DistanceFormatter::default(),
            date_time: DateTimeFormat::default(),
            account_peer_id: PeerId::user(1),
            now: 0,
        };
        let text = render_entries(&entries, &ctx);
        assert!(text.contains("PEOPLE NEARBY ...\n"));
        assert!(text.contains("GROUPS NEARBY ...\n"));
    }
}
