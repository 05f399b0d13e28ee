// src/search/fuzz.rs
//
// Similarity scorers on a 0..=100 scale. Everything below `weighted_ratio`
// works on strings that are already normalized.

use std::collections::BTreeSet;

/// Levenshtein similarity of the two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best `ratio` of the shorter string against every equally long window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    if short_len == 0 {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let long_chars: Vec<char> = long.chars().collect();
    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(short, &candidate));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// `ratio` after sorting the tokens of both strings.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

struct TokenSets<'a> {
    common: Vec<&'a str>,
    only_a: Vec<&'a str>,
    only_b: Vec<&'a str>,
}

impl<'a> TokenSets<'a> {
    fn new(a: &'a str, b: &'a str) -> Self {
        let sa: BTreeSet<&str> = a.split_whitespace().collect();
        let sb: BTreeSet<&str> = b.split_whitespace().collect();
        Self {
            common: sa.intersection(&sb).copied().collect(),
            only_a: sa.difference(&sb).copied().collect(),
            only_b: sb.difference(&sa).copied().collect(),
        }
    }
}

fn join_nonempty(head: &str, tail: &[&str]) -> String {
    let tail = tail.join(" ");
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail,
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}

/// Compares the shared tokens against each side's full token set; a string
/// whose tokens are a subset of the other's scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let sets = TokenSets::new(a, b);
    if !sets.common.is_empty() && (sets.only_a.is_empty() || sets.only_b.is_empty()) {
        return 100.0;
    }

    let common = sets.common.join(" ");
    let with_a = join_nonempty(&common, &sets.only_a);
    let with_b = join_nonempty(&common, &sets.only_b);

    let mut best = ratio(&with_a, &with_b);
    if !common.is_empty() {
        best = best.max(ratio(&common, &with_a)).max(ratio(&common, &with_b));
    }
    best
}

/// Partial matching over token-sorted and token-set forms. Any shared token
/// scores 100.
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let sets = TokenSets::new(a, b);
    if !sets.common.is_empty() {
        return 100.0;
    }
    let sorted = partial_ratio(&sorted_tokens(a), &sorted_tokens(b));
    let diff = partial_ratio(&sets.only_a.join(" "), &sets.only_b.join(" "));
    sorted.max(diff)
}

/// Lowercased form used for scoring: Unicode letters and digits are kept,
/// everything else splits tokens.
fn match_form(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-order- and case-insensitive similarity in 0..=100.
///
/// Both inputs go through `match_form` first. Close-in-length strings are
/// scored on the plain ratio plus down-weighted token variants; strings of
/// very different length fall through to partial matching instead.
pub fn weighted_ratio(query: &str, choice: &str) -> u8 {
    const UNBASE_SCALE: f64 = 0.95;

    let a = match_form(query);
    let b = match_form(choice);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (la, lb) = (a.chars().count() as f64, b.chars().count() as f64);
    let len_ratio = la.max(lb) / la.min(lb);

    let mut best = ratio(&a, &b);
    if len_ratio < 1.5 {
        best = best
            .max(token_sort_ratio(&a, &b) * UNBASE_SCALE)
            .max(token_set_ratio(&a, &b) * UNBASE_SCALE);
    } else {
        let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
        best = best
            .max(partial_ratio(&a, &b) * partial_scale)
            .max(partial_token_ratio(&a, &b) * UNBASE_SCALE * partial_scale);
    }

    best.floor().clamp(0.0, 100.0) as u8
}
