//! Textual guidance for dining staff and students

/// Food-level guidance for a dish's mean waste percentage across scans
pub fn food_recommendation(avg_waste: f64) -> String {
    let whole = avg_waste as i64;
    if avg_waste > 50.0 {
        format!("⚠️ High waste ({}%). Consider removing or replacing.", whole)
    } else if avg_waste > 35.0 {
        "⚡ Reduce portion size by 30-40%.".to_string()
    } else if avg_waste > 20.0 {
        "📊 Monitor closely. Offer smaller portion option.".to_string()
    } else {
        format!("✓ Popular item ({}% waste). Maintain current approach.", whole)
    }
}

/// Mean waste above which the week's worst dish gets a priority callout
pub const PRIORITY_WASTE_THRESHOLD: f64 = 40.0;

/// Strategic suggestions appended to every weekly report
pub const STANDING_RECOMMENDATIONS: [&str; 3] = [
    "💡 Implement 'start small, come back' signage at serving stations.",
    "📊 Survey students on portion preferences for high-waste items.",
    "♻️ Share weekly waste data with students to increase awareness.",
];

/// Week-level guidance seeded by the worst offender `(food, mean waste %)`
pub fn weekly_recommendations(top_offender: Option<(&str, f64)>) -> Vec<String> {
    let mut recommendations = Vec::with_capacity(STANDING_RECOMMENDATIONS.len() + 1);

    if let Some((food, avg_waste_pct)) = top_offender {
        if avg_waste_pct > PRIORITY_WASTE_THRESHOLD {
            recommendations.push(format!(
                "🚨 Priority: Address {} (avg waste: {:.1}%). Consider portion reduction or menu replacement.",
                food, avg_waste_pct
            ));
        }
    }

    recommendations.extend(STANDING_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    recommendations
}

/// Student tips for a plate-level waste fraction in [0, 1]
pub fn tips_from_waste(waste_fraction: f64) -> Vec<String> {
    let tips: &[&str] = if waste_fraction <= 0.1 {
        &["🎉 Amazing job! Clean plate champion!"]
    } else if waste_fraction <= 0.25 {
        &["Great effort! Keep it up.", "You're being mindful of portions."]
    } else if waste_fraction <= 0.40 {
        &[
            "💡 Try taking smaller portions initially.",
            "You can always go back for seconds!",
        ]
    } else {
        &[
            "💡 Consider starting with half portions.",
            "Ask dining staff about smaller serving options.",
            "Try one item at a time - you can always get more!",
        ]
    };
    tips.iter().map(|t| t.to_string()).collect()
}
