/// Well-known cities offered when a search finds nothing.
pub const REFERENCE_CITIES: &[&str] = &[
    "London",
    "Paris",
    "New York",
    "Tokyo",
    "Sydney",
    "Berlin",
    "Madrid",
    "Rome",
    "Moscow",
    "Beijing",
    "Dubai",
    "Mumbai",
    "Toronto",
    "Chicago",
    "Los Angeles",
    "San Francisco",
    "Seattle",
    "Miami",
    "Boston",
    "Amsterdam",
    "Barcelona",
    "Singapore",
    "Hong Kong",
    "Bangkok",
    "Cairo",
    "Istanbul",
    "Mexico City",
    "Rio de Janeiro",
    "Buenos Aires",
    "Cape Town",
];

pub const MAX_SUGGESTIONS: usize = 3;

/// Up to three reference cities that look like `input`, in reference-list
/// order. A city matches when it starts with the same letter, when it
/// contains an input of 3+ characters, or when an input of 5+ characters
/// contains it.
pub fn suggest_cities(input: &str) -> Vec<&'static str> {
    let needle = input.trim().to_lowercase();
    let Some(first) = needle.chars().next() else {
        return Vec::new();
    };
    let len = needle.chars().count();

    REFERENCE_CITIES
        .iter()
        .copied()
        .filter(|city| {
            let candidate = city.to_lowercase();
            candidate.starts_with(first)
                || (len >= 3 && candidate.contains(&needle))
                || (len >= 5 && needle.contains(&candidate))
        })
        .take(MAX_SUGGESTIONS)
        .collect()
}
