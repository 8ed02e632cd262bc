//! Free-text location parsing into a canonical (city, remote) pair.

/// Result of [`normalize_location`]. `city` and `remote` are independent:
/// "NYC / Remote" yields both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationNorm {
    pub city: Option<&'static str>,
    pub remote: bool,
}

// Alias -> canonical city, checked per token by exact match after cleaning.
// Unrecognized tokens are ignored; a city is never fabricated from them.
const CITY_ALIASES: &[(&str, &str)] = &[
    ("new york", "New York"),
    ("new york city", "New York"),
    ("nyc", "New York"),
    ("ny", "New York"),
    ("manhattan", "New York"),
    ("brooklyn", "New York"),
    ("san francisco", "San Francisco"),
    ("sf", "San Francisco"),
    ("los angeles", "Los Angeles"),
    ("la", "Los Angeles"),
    ("london", "London"),
    ("london uk", "London"),
    ("berlin", "Berlin"),
    ("amsterdam", "Amsterdam"),
    ("chicago", "Chicago"),
    ("austin", "Austin"),
    ("seattle", "Seattle"),
    ("boston", "Boston"),
    ("denver", "Denver"),
    ("atlanta", "Atlanta"),
    ("toronto", "Toronto"),
];

const REMOTE_MARKERS: &[&str] = &["remote", "work from home", "wfh", "hybrid"];

/// Parse a raw location string into a canonical city and a remote flag.
///
/// The string is lowercased, split on common separators (`/ , | ;` and the
/// words "or"/"and"), and each token is cleaned of parenthetical text and
/// matched against the alias table. When several tokens carry recognized
/// cities ("NYC / Chicago"), the first token in input order wins. Remote
/// markers are detected on the whole string, independent of city matching.
pub fn normalize_location(raw: &str) -> LocationNorm {
    let lower = raw.to_lowercase();
    let remote = REMOTE_MARKERS.iter().any(|marker| lower.contains(marker));

    let mut city = None;
    for token in split_tokens(&lower) {
        let hit = CITY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, canonical)| *canonical);
        if let Some(canonical) = hit {
            city = Some(canonical);
            break;
        }
    }

    LocationNorm { city, remote }
}

fn split_tokens(lower: &str) -> Vec<String> {
    lower
        .split(['/', ',', '|', ';'])
        .flat_map(|fragment| fragment.split(" or "))
        .flat_map(|fragment| fragment.split(" and "))
        .map(strip_parenthetical)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

fn strip_parenthetical(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut depth = 0usize;
    for ch in fragment.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_and_remote_are_not_mutually_exclusive() {
        let loc = normalize_location("NYC / Remote");
        assert_eq!(loc.city, Some("New York"));
        assert!(loc.remote);
    }

    #[test]
    fn aliases_map_to_one_canonical_name() {
        for raw in ["nyc", "New York City", "NY", "Brooklyn"] {
            assert_eq!(normalize_location(raw).city, Some("New York"), "{raw}");
        }
    }

    #[test]
    fn unrecognized_tokens_never_fabricate_a_city() {
        let loc = normalize_location("Gotham City");
        assert_eq!(loc.city, None);
        assert!(!loc.remote);
    }

    #[test]
    fn first_recognized_token_wins_on_conflicts() {
        assert_eq!(normalize_location("NYC / Chicago").city, Some("New York"));
        assert_eq!(normalize_location("Chicago / NYC").city, Some("Chicago"));
    }

    #[test]
    fn remote_markers_are_detected_without_a_city() {
        for raw in ["Remote", "work from home", "WFH", "Hybrid (2 days)"] {
            assert!(normalize_location(raw).remote, "{raw}");
        }
        assert_eq!(normalize_location("Remote").city, None);
    }

    #[test]
    fn separators_and_parentheticals_are_handled() {
        assert_eq!(
            normalize_location("London (HQ) or Berlin").city,
            Some("London")
        );
        assert_eq!(normalize_location("Austin; Denver").city, Some("Austin"));
        assert_eq!(normalize_location("Boston | Toronto").city, Some("Boston"));
    }

    #[test]
    fn normalization_is_idempotent_and_pure() {
        let raw = "San Francisco, Hybrid";
        assert_eq!(normalize_location(raw), normalize_location(raw));
    }
}
