use echolex_protocol::{Breakdown, DictionaryRecord};

fn part(text: &str) -> Option<String> {
    Some(text.to_string())
}

fn family(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Minimal table served when the dictionary resource is unavailable.
pub fn builtin_records() -> Vec<DictionaryRecord> {
    vec![
        DictionaryRecord {
            canonical_key: "pronounce".to_string(),
            translation: part("发音"),
            breakdown: Some(Breakdown {
                prefix: part("pro"),
                prefix_meaning: part("forward, out"),
                root: part("nounce"),
                root_meaning: part("to announce, report"),
                ..Breakdown::default()
            }),
            association: part("Announce a word out loud."),
            family: family(&["pronunciation", "announce", "denounce"]),
        },
        DictionaryRecord {
            canonical_key: "practice".to_string(),
            translation: part("练习"),
            breakdown: Some(Breakdown {
                root: part("pract"),
                root_meaning: part("to do, to act"),
                suffix: part("ice"),
                suffix_meaning: part("act or state"),
                ..Breakdown::default()
            }),
            association: part("Doing something again and again."),
            family: family(&["practical", "practitioner", "practise"]),
        },
        DictionaryRecord {
            canonical_key: "repeat".to_string(),
            translation: part("重复"),
            breakdown: Some(Breakdown {
                prefix: part("re"),
                prefix_meaning: part("again"),
                root: part("peat"),
                root_meaning: part("to seek"),
                ..Breakdown::default()
            }),
            association: None,
            family: family(&["repetition", "repeatedly"]),
        },
        DictionaryRecord {
            canonical_key: "speak".to_string(),
            translation: part("说"),
            breakdown: None,
            association: None,
            family: family(&["speaker", "speech", "spoken"]),
        },
        DictionaryRecord {
            canonical_key: "listen".to_string(),
            translation: part("听"),
            breakdown: None,
            association: None,
            family: family(&["listener"]),
        },
    ]
}
