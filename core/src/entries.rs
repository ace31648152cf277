// SPDX-License-Identifier: MIT OR Apache-2.0

//! List rows of the People Nearby screen.
//!
//! Each row has a stable id, a section and value equality so a list
//! component can compute minimal updates between two row vectors.

use crate::distance::DistanceFormatter;
use crate::expiry::DateTimeFormat;
use crate::snapshot::{PeerNearbyEntry, PeersNearbyData};
use crate::strings::PresentationStrings;
use crate::PeerId;

/// Sections of the list, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeersNearbySection {
    Header,
    Users,
    Groups,
    Channels,
}

/// One row of the list
#[derive(Debug, Clone, PartialEq)]
pub enum PeersNearbyEntry {
    Header {
        text: String,
    },
    UsersHeader {
        text: String,
        loading: bool,
    },
    Empty {
        text: String,
    },
    Visibility {
        title: String,
        /// The account is visible and the row stops it
        stop: bool,
    },
    User {
        index: i32,
        entry: PeerNearbyEntry,
    },
    GroupsHeader {
        text: String,
        loading: bool,
    },
    CreateGroup {
        title: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        address: Option<String>,
    },
    Group {
        index: i32,
        entry: PeerNearbyEntry,
    },
    ChannelsHeader {
        text: String,
    },
    Channel {
        index: i32,
        entry: PeerNearbyEntry,
    },
}

/// Inputs needed to render row subtitles
#[derive(Debug, Clone)]
pub struct RowContext<'a> {
    pub strings: &'a PresentationStrings,
    pub distance: DistanceFormatter,
    pub date_time: DateTimeFormat,
    pub account_peer_id: PeerId,
    /// Current unix time
    pub now: i64,
}

impl PeersNearbyEntry {
    pub fn section(&self) -> PeersNearbySection {
        match self {
            PeersNearbyEntry::Header { .. } => PeersNearbySection::Header,
            PeersNearbyEntry::UsersHeader { .. }
            | PeersNearbyEntry::Empty { .. }
            | PeersNearbyEntry::Visibility { .. }
            | PeersNearbyEntry::User { .. } => PeersNearbySection::Users,
            PeersNearbyEntry::GroupsHeader { .. }
            | PeersNearbyEntry::CreateGroup { .. }
            | PeersNearbyEntry::Group { .. } => PeersNearbySection::Groups,
            PeersNearbyEntry::ChannelsHeader { .. } | PeersNearbyEntry::Channel { .. } => {
                PeersNearbySection::Channels
            }
        }
    }

    /// Row identity. Users take ids 4..1000 and groups 1002..2000, so ids
    /// stay distinct for up to `MAX_USER_ROWS` users and `MAX_GROUP_ROWS` groups.
    pub fn stable_id(&self) -> i32 {
        match self {
            PeersNearbyEntry::Header { .. } => 0,
            PeersNearbyEntry::UsersHeader { .. } => 1,
            PeersNearbyEntry::Empty { .. } => 2,
            PeersNearbyEntry::Visibility { .. } => 3,
            PeersNearbyEntry::User { index, .. } => {
                debug_assert!(*index < MAX_USER_ROWS, "user row {} collides with groups", index);
                4 + index
            }
            PeersNearbyEntry::GroupsHeader { .. } => 1000,
            PeersNearbyEntry::CreateGroup { .. } => 1001,
            PeersNearbyEntry::Group { index, .. } => {
                debug_assert!(
                    *index < MAX_GROUP_ROWS,
                    "group row {} collides with channels",
                    index
                );
                1002 + index
            }
            PeersNearbyEntry::ChannelsHeader { .. } => 2000,
            PeersNearbyEntry::Channel { index, .. } => 2001 + index,
        }
    }

    /// The nearby peer a row shows, if it is a peer row
    pub fn peer_entry(&self) -> Option<&PeerNearbyEntry> {
        match self {
            PeersNearbyEntry::User { entry, .. }
            | PeersNearbyEntry::Group { entry, .. }
            | PeersNearbyEntry::Channel { entry, .. } => Some(entry),
            _ => None,
        }
    }

    /// Secondary text of peer rows
    pub fn subtitle(&self, ctx: &RowContext<'_>) -> Option<String> {
        match self {
            PeersNearbyEntry::User { entry, .. } => {
                if entry.peer.id == ctx.account_peer_id {
                    let until = ctx.date_time.human_readable(entry.expires, ctx.now);
                    Some(ctx.strings.visible_until(&until))
                } else {
                    Some(distance_text(ctx, entry))
                }
            }
            PeersNearbyEntry::Group { entry, .. } => {
                let distance = distance_text(ctx, entry);
                match entry.cached.and_then(|c| c.member_count) {
                    Some(count) if count > 0 => {
                        Some(format!("{}, {}", distance, ctx.strings.members(count)))
                    }
                    Some(_) => Some(format!("{}, {}", distance, ctx.strings.no_members)),
                    None => Some(distance),
                }
            }
            PeersNearbyEntry::Channel { entry, .. } => {
                let distance = distance_text(ctx, entry);
                match entry.cached.and_then(|c| c.member_count) {
                    Some(count) => {
                        Some(format!("{}, {}", distance, ctx.strings.subscribers(count)))
                    }
                    None => Some(distance),
                }
            }
            _ => None,
        }
    }
}

fn distance_text(ctx: &RowContext<'_>, entry: &PeerNearbyEntry) -> String {
    ctx.strings
        .distance_away(&ctx.distance.string_for_distance(entry.distance))
}

/// User rows with distinct stable ids
pub const MAX_USER_ROWS: i32 = 996;

/// Group rows with distinct stable ids
pub const MAX_GROUP_ROWS: i32 = 998;

fn indexed(entries: &[PeerNearbyEntry]) -> impl Iterator<Item = (i32, PeerNearbyEntry)> + '_ {
    (0..).zip(entries.iter().cloned())
}

/// Rows for the current snapshot, ordered by stable id
pub fn list_entries(
    data: Option<&PeersNearbyData>,
    strings: &PresentationStrings,
    display_loading: bool,
) -> Vec<PeersNearbyEntry> {
    let loading = display_loading && data.is_none();
    let mut entries = vec![
        PeersNearbyEntry::Header {
            text: strings.discover_description.clone(),
        },
        PeersNearbyEntry::UsersHeader {
            text: strings.users_header.to_uppercase(),
            loading,
        },
    ];

    if let Some(data) = data {
        if data.users.is_empty() {
            entries.push(PeersNearbyEntry::Empty {
                text: strings.users_empty.clone(),
            });
        }
    }

    let visible = data.is_some_and(|d| d.is_self_visible);
    entries.push(PeersNearbyEntry::Visibility {
        title: if visible {
            strings.make_invisible.clone()
        } else {
            strings.make_visible.clone()
        },
        stop: visible,
    });

    if let Some(data) = data {
        entries.extend(
            indexed(&data.users).map(|(index, entry)| PeersNearbyEntry::User { index, entry }),
        );
    }

    entries.push(PeersNearbyEntry::GroupsHeader {
        text: strings.groups_header.to_uppercase(),
        loading,
    });
    entries.push(PeersNearbyEntry::CreateGroup {
        title: strings.create_group.clone(),
        latitude: data.map(|d| d.latitude),
        longitude: data.map(|d| d.longitude),
        address: data.and_then(|d| d.address.clone()),
    });

    if let Some(data) = data {
        entries.extend(
            indexed(&data.groups).map(|(index, entry)| PeersNearbyEntry::Group { index, entry }),
        );

        if !data.channels.is_empty() {
            entries.push(PeersNearbyEntry::ChannelsHeader {
                text: strings.channels_header.to_uppercase(),
            });
            entries.extend(
                indexed(&data.channels)
                    .map(|(index, entry)| PeersNearbyEntry::Channel { index, entry }),
            );
        }
    }

    entries
}

/// How the list should move from one snapshot to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTransition {
    /// Replace the list with a crossfade instead of animating row changes
    pub crossfade: bool,
    pub animate_changes: bool,
}

impl ListTransition {
    /// Crossfade when the users or groups section toggles between empty and non-empty
    pub fn between(previous: Option<&PeersNearbyData>, next: Option<&PeersNearbyData>) -> Self {
        let users_empty =
            |d: Option<&PeersNearbyData>| d.map(|d| d.users.is_empty()).unwrap_or(true);
        let groups_empty =
            |d: Option<&PeersNearbyData>| d.map(|d| d.groups.is_empty()).unwrap_or(true);
        let crossfade = users_empty(previous) != users_empty(next)
            || groups_empty(previous) != groups_empty(next);
        Self {
            crossfade,
            animate_changes: !crossfade,
        }
    }
}

impl Default for ListTransition {
    fn default() -> Self {
        Self {
            crossfade: false,
            animate_changes: true,
        }
    }
}
