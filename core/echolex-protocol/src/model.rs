use rkyv::{Archive, Deserialize, Serialize};
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Shown in place of a missing translation.
pub const MISSING_TRANSLATION: &str = "N/A";

/// Prefix / root / suffix decomposition of a headword. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
#[archive(check_bytes)]
pub struct Breakdown {
    pub prefix: Option<String>,
    pub prefix_meaning: Option<String>,
    pub root: Option<String>,
    pub root_meaning: Option<String>,
    pub suffix: Option<String>,
    pub suffix_meaning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
#[archive(check_bytes)]
pub struct DictionaryRecord {
    /// Lowercase `[a-z]+` headword. Filled from the map key when loading JSON.
    pub canonical_key: String,
    pub translation: Option<String>,
    pub breakdown: Option<Breakdown>,
    #[cfg_attr(feature = "serde", serde(alias = "mnemonic"))]
    pub association: Option<String>,
    pub family: Vec<String>,
}

impl DictionaryRecord {
    pub fn new(canonical_key: impl Into<String>) -> Self {
        Self {
            canonical_key: canonical_key.into(),
            ..Self::default()
        }
    }

    pub fn display_translation(&self) -> &str {
        self.translation
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(MISSING_TRANSLATION)
    }

    pub fn has_family(&self) -> bool {
        !self.family.is_empty()
    }
}

/// Container written by the lexicon compiler and loaded by the store.
#[derive(Debug, Clone, Default, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Lexicon {
    pub version: u32,
    pub entries: Vec<DictionaryRecord>,
}
