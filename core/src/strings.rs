// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display strings used by the list rows.

use serde::{Deserialize, Serialize};

/// Texts shown on the People Nearby screen.
///
/// Templates use `{}` as the single placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationStrings {
    pub title: String,
    pub discover_description: String,
    pub users_header: String,
    pub users_empty: String,
    pub groups_header: String,
    pub channels_header: String,
    pub make_visible: String,
    pub make_invisible: String,
    pub create_group: String,
    pub distance_away: String,
    pub visible_until: String,
    pub members: String,
    pub no_members: String,
    pub subscribers: String,
    pub located_groups_too_much: String,
}

impl Default for PresentationStrings {
    fn default() -> Self {
        Self {
            title: "People Nearby".to_string(),
            discover_description: concat!(
                "Quickly add people nearby who are also viewing this section ",
                "and discover local group chats."
            )
            .to_string(),
            users_header: "People nearby".to_string(),
            users_empty: "Looking for users around you...".to_string(),
            groups_header: "Groups nearby".to_string(),
            channels_header: "Channels nearby".to_string(),
            make_visible: "Make Myself Visible".to_string(),
            make_invisible: "Stop Showing Me".to_string(),
            create_group: "Create a Local Group".to_string(),
            distance_away: "{} away".to_string(),
            visible_until: "visible until {}".to_string(),
            members: "{} members".to_string(),
            no_members: "no members".to_string(),
            subscribers: "{} subscribers".to_string(),
            located_groups_too_much: concat!(
                "Sorry, you have too many location-based groups already. ",
                "Please delete one of your existing ones first."
            )
            .to_string(),
        }
    }
}

impl PresentationStrings {
    pub fn distance_away(&self, distance: &str) -> String {
        fill(&self.distance_away, distance)
    }

    pub fn visible_until(&self, time: &str) -> String {
        fill(&self.visible_until, time)
    }

    pub fn members(&self, count: i32) -> String {
        fill(&self.members, &count.to_string())
    }

    pub fn subscribers(&self, count: i32) -> String {
        fill(&self.subscribers, &count.to_string())
    }
}

fn fill(template: &str, value: &str) -> String {
    template.replacen("{}", value, 1)
}
