use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

static EPISODE_RE: OnceLock<Regex> = OnceLock::new();

fn episode_re() -> &'static Regex {
    EPISODE_RE.get_or_init(|| Regex::new(r"(S\d{2}E\d{2})(?:\D|$)").expect("episode pattern is valid"))
}

/// Pulls the `S01E02`-style id out of each label, dropping labels without one.
/// Season and episode are exactly two digits each.
/// The result is deduplicated and sorted, which for zero-padded ids is also
/// airing order.
pub fn extract_episode_ids<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .filter_map(|label| {
            episode_re()
                .captures(label.as_ref())
                .map(|caps| caps[1].to_string())
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_episode_token() {
        let ids = extract_episode_ids([
            "The.Show.S01E02.1080p.WEB-DL",
            "The.Show.S01E01.720p",
            "Trailer",
        ]);
        assert_eq!(ids, vec!["S01E01", "S01E02"]);
    }

    #[test]
    fn sorts_across_seasons() {
        let ids = extract_episode_ids(["S02E01", "S01E10", "S01E02"]);
        assert_eq!(ids, vec!["S01E02", "S01E10", "S02E01"]);
    }

    #[test]
    fn deduplicates_repeated_releases() {
        let ids = extract_episode_ids(["Show S01E03 HDR", "Show S01E03 SDR", "Show S01E03"]);
        assert_eq!(ids, vec!["S01E03"]);
    }

    #[test]
    fn is_idempotent() {
        let once = extract_episode_ids(["x S03E04 y", "S01E01", "nothing", "S03E04"]);
        let twice = extract_episode_ids(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn unpadded_or_overlong_ids_are_not_episodes() {
        let ids = extract_episode_ids(["Show.S1E2.720p", "Show.S01E021.720p", "Show.S01E03"]);
        assert_eq!(ids, vec!["S01E03"]);
    }

    #[test]
    fn no_matches_is_empty() {
        assert!(extract_episode_ids(["Season one", "E01", "s01e01"]).is_empty());
        assert!(extract_episode_ids(Vec::<String>::new()).is_empty());
    }
}
