//! Heuristic suffix stripping.
//!
//! The stemmer proposes base forms for a normalized key and asks the caller
//! whether each one is a headword. It never guesses beyond what the
//! dictionary confirms.

use serde::Serialize;

/// A strippable ending and the shortest base it may leave behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixRule {
    pub suffix: &'static str,
    pub min_base_len: usize,
}

/// Tried in this order; the first confirmed base wins.
pub const SUFFIX_RULES: &[SuffixRule] = &[
    SuffixRule { suffix: "ing", min_base_len: 2 },
    SuffixRule { suffix: "ed", min_base_len: 2 },
    SuffixRule { suffix: "s", min_base_len: 3 },
    SuffixRule { suffix: "es", min_base_len: 2 },
    SuffixRule { suffix: "er", min_base_len: 3 },
    SuffixRule { suffix: "est", min_base_len: 3 },
    SuffixRule { suffix: "ly", min_base_len: 3 },
    SuffixRule { suffix: "tion", min_base_len: 3 },
    SuffixRule { suffix: "ment", min_base_len: 3 },
];

/// How a surface form reached its headword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MatchPath {
    Direct,
    /// "cats" -> "cat"
    Suffix { suffix: &'static str },
    /// "running" -> "runn" -> "run"
    UndoubledConsonant { suffix: &'static str },
    /// "practicing" -> "practic" -> "practice"
    SilentE { suffix: &'static str },
}

/// Runs the suffix rules over `key` and returns the first base accepted by
/// `exists`, with the path that produced it.
pub fn stem<F>(key: &str, exists: F) -> Option<(String, MatchPath)>
where
    F: Fn(&str) -> bool,
{
    for rule in SUFFIX_RULES {
        let Some(base) = key.strip_suffix(rule.suffix) else {
            continue;
        };
        if base.len() < rule.min_base_len {
            continue;
        }

        if exists(base) {
            return Some((base.to_string(), MatchPath::Suffix { suffix: rule.suffix }));
        }

        // Keys are ASCII, so byte indexing is char indexing.
        let bytes = base.as_bytes();
        let doubled = bytes.len() >= 2 && bytes[bytes.len() - 1] == bytes[bytes.len() - 2];

        if doubled {
            let undoubled = &base[..base.len() - 1];
            if exists(undoubled) {
                return Some((
                    undoubled.to_string(),
                    MatchPath::UndoubledConsonant { suffix: rule.suffix },
                ));
            }
        } else {
            let restored = format!("{base}e");
            if exists(&restored) {
                return Some((restored, MatchPath::SilentE { suffix: rule.suffix }));
            }
        }
    }

    None
}
