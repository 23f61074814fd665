//! Badges and point milestones for students

use serde::{Deserialize, Serialize};

/// Badge tier earned from a mean waste percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BadgeLevel {
    Platinum,
    Gold,
    Silver,
    Bronze,
    Beginner,
}

/// Badge as shown to students
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub level: BadgeLevel,
    pub emoji: String,
    pub description: String,
}

/// Ordered `(max mean waste %, level, emoji, description)` tiers
pub const BADGE_TIERS: [(f64, BadgeLevel, &str, &str); 4] = [
    (10.0, BadgeLevel::Platinum, "🏆", "Zero-Waste Champion"),
    (20.0, BadgeLevel::Gold, "🥇", "Eco Warrior"),
    (35.0, BadgeLevel::Silver, "🥈", "Planet Protector"),
    (50.0, BadgeLevel::Bronze, "🥉", "Getting There"),
];

const BEGINNER_BADGE: (BadgeLevel, &str, &str) = (BadgeLevel::Beginner, "🌱", "Room to Grow");

/// Assign a badge from mean waste percentage
pub fn assign_badge(avg_waste_pct: f64) -> Badge {
    let (level, emoji, description) = BADGE_TIERS
        .iter()
        .find(|(max_waste, ..)| avg_waste_pct <= *max_waste)
        .map(|(_, level, emoji, description)| (*level, *emoji, *description))
        .unwrap_or(BEGINNER_BADGE);

    Badge {
        level,
        emoji: emoji.to_string(),
        description: description.to_string(),
    }
}

/// Ordered `(points, title)` milestones
pub const MILESTONES: [(u32, &str); 5] = [
    (50, "Waste Warrior"),
    (100, "Eco Champion"),
    (250, "Planet Saver"),
    (500, "Sustainability Hero"),
    (1000, "Zero-Waste Legend"),
];

/// Next achievement for a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextGoal {
    Milestone {
        points_needed: u32,
        next_badge: String,
        at: String,
    },
    MaxLevel {
        message: String,
        next_badge: String,
    },
}

impl NextGoal {
    pub fn is_max_level(&self) -> bool {
        matches!(self, NextGoal::MaxLevel { .. })
    }
}

/// First milestone strictly above `current_points`, or the terminal level
pub fn next_goal(current_points: u32) -> NextGoal {
    MILESTONES
        .iter()
        .find(|(points, _)| current_points < *points)
        .map(|(points, title)| NextGoal::Milestone {
            points_needed: points - current_points,
            next_badge: title.to_string(),
            at: format!("{} points", points),
        })
        .unwrap_or_else(|| NextGoal::MaxLevel {
            message: "Max level reached!".to_string(),
            next_badge: "Legend Status".to_string(),
        })
}
