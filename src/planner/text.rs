//! Text normalization, phrase heuristics, and caption assembly.

use crate::domain::Track;

/// Engagement-bait phrases capped per week. Matched as lowercase
/// substrings over the combined beat lines and caption.
pub const ANTI_ALGORITHM_PHRASES: &[&str] = &[
    "the algorithm",
    "shadowban",
    "stop scrolling",
    "don't scroll",
    "before this gets taken down",
    "for you page",
    "the fyp",
];

/// Lowercased, whitespace-collapsed form used for exact-text cooldowns.
pub fn normalize_exact(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// The first `words` words of a line, normalized. Lines opening the same
/// way read as repeats even when the tail differs.
pub fn word_prefix(s: &str, words: usize) -> String {
    normalize_exact(s)
        .split(' ')
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Caption form used for exact cooldowns: hashtag tokens dropped before
/// normalizing, so the same caption with a rotated tag set still matches.
pub fn normalize_caption(s: &str) -> String {
    let kept: Vec<&str> = s.split_whitespace().filter(|w| !w.starts_with('#')).collect();
    kept.join(" ").to_lowercase()
}

/// Whether the text trips the anti-algorithm phrase list.
pub fn matches_anti_algorithm(text: &str) -> bool {
    let lower = text.to_lowercase();
    ANTI_ALGORITHM_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Render a caption template, substituting `{track}` and `{artist}`.
pub fn render_caption(template: &str, track: &Track) -> String {
    template
        .replace("{track}", &track.title)
        .replace("{artist}", &track.artist)
}

/// Append up to `max` hashtags from the pool, in pool order.
pub fn append_hashtags(caption: &str, pool: &[String], max: usize) -> String {
    let base = caption.trim();
    if max == 0 || pool.is_empty() {
        return base.to_string();
    }
    let tags = pool.iter().take(max).cloned().collect::<Vec<_>>().join(" ");
    if base.is_empty() {
        tags
    } else {
        format!("{base} {tags}")
    }
}
