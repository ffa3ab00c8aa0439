//! Condition label to emoji icon lookup.

/// Icon used when no keyword matches.
pub const UNKNOWN_ICON: &str = "🌤️";

/// Ordered `(keyword, icon)` priority list, matched case-insensitively as
/// substrings. A keyword always precedes any shorter keyword it contains,
/// so the first hit in table order is also the longest one.
pub const CONDITION_ICONS: &[(&str, &str)] = &[
    ("partly cloudy", "🌤️"),
    ("thunderstorm", "⛈️"),
    ("drizzle", "🌦️"),
    ("cloudy", "⛅"),
    ("clouds", "☁️"),
    ("rainy", "⛈️"),
    ("rain", "🌧️"),
    ("snow", "❄️"),
    ("mist", "🌫️"),
    ("fog", "🌫️"),
    ("haze", "🌫️"),
    ("sunny", "🌞"),
    ("clear", "☀️"),
];

/// Icon for a provider condition label such as "Clouds" or "light rain".
pub fn icon_for(condition: &str) -> &'static str {
    let condition = condition.to_lowercase();
    CONDITION_ICONS
        .iter()
        .find(|(keyword, _)| condition.contains(keyword))
        .map(|(_, icon)| *icon)
        .unwrap_or(UNKNOWN_ICON)
}
