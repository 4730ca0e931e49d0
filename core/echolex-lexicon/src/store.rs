use std::collections::{BTreeMap, HashMap};

use echolex_protocol::{DictionaryRecord, Lexicon};
use rkyv::ser::{serializers::AllocSerializer, Serializer};
use rkyv::{AlignedVec, Deserialize as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::LexiconError;
use crate::fallback::builtin_records;
use crate::normalize::normalize;
use crate::stemmer::{stem, MatchPath};

/// Version stamped into archives written by this crate.
pub const LEXICON_VERSION: u32 = 1;

/// A resolved click on a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub record: DictionaryRecord,
    /// Always a key of the store that produced this result.
    pub matched_key: String,
    /// The text exactly as clicked.
    pub surface: String,
    pub path: MatchPath,
}

/// Accepted JSON layouts: an object keyed by headword, or a `Lexicon`.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonSource {
    Keyed(BTreeMap<String, DictionaryRecord>),
    Listed(Lexicon),
}

/// Read-only headword table.
#[derive(Debug, Clone, Default)]
pub struct LexiconStore {
    version: u32,
    entries: HashMap<String, DictionaryRecord>,
}

impl LexiconStore {
    /// Builds a store, normalizing every key. Records whose key normalizes to
    /// nothing are skipped; a later duplicate replaces the earlier record.
    pub fn from_records<I>(version: u32, records: I) -> Self
    where
        I: IntoIterator<Item = DictionaryRecord>,
    {
        let mut entries = HashMap::new();

        for mut record in records {
            let key = normalize(&record.canonical_key);
            if key.is_empty() {
                warn!(key = %record.canonical_key, "skipping dictionary entry with no usable key");
                continue;
            }
            record.canonical_key = key.clone();
            if entries.insert(key.clone(), record).is_some() {
                warn!(%key, "duplicate dictionary entry, keeping the last one");
            }
        }

        Self { version, entries }
    }

    /// The embedded table used when the real dictionary cannot be loaded.
    pub fn builtin() -> Self {
        Self::from_records(0, builtin_records())
    }

    pub fn from_json(json: &str) -> Result<Self, LexiconError> {
        let store = match serde_json::from_str::<JsonSource>(json)? {
            JsonSource::Keyed(map) => Self::from_records(
                LEXICON_VERSION,
                map.into_iter().map(|(key, mut record)| {
                    record.canonical_key = key;
                    record
                }),
            ),
            JsonSource::Listed(lexicon) => Self::from_records(lexicon.version, lexicon.entries),
        };

        store.non_empty()
    }

    /// Validates and loads an archive written by [`LexiconStore::to_archive`].
    pub fn from_archive(bytes: &[u8]) -> Result<Self, LexiconError> {
        // Validation needs the archive aligned; buffers handed over from JS are not.
        let mut aligned = AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);

        let archived = rkyv::check_archived_root::<Lexicon>(aligned.as_slice())
            .map_err(|e| LexiconError::Archive(format!("{e:?}")))?;
        let lexicon: Lexicon = archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|e| LexiconError::Archive(format!("{e:?}")))?;

        Self::from_records(lexicon.version, lexicon.entries).non_empty()
    }

    pub fn from_json_or_builtin(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|e| {
            warn!(error = %e, "falling back to the built-in dictionary");
            Self::builtin()
        })
    }

    pub fn from_archive_or_builtin(bytes: &[u8]) -> Self {
        Self::from_archive(bytes).unwrap_or_else(|e| {
            warn!(error = %e, "falling back to the built-in dictionary");
            Self::builtin()
        })
    }

    /// Entries sorted by key, so equal stores produce equal archives.
    pub fn to_lexicon(&self) -> Lexicon {
        let mut entries: Vec<DictionaryRecord> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.canonical_key.cmp(&b.canonical_key));
        Lexicon {
            version: self.version.max(LEXICON_VERSION),
            entries,
        }
    }

    pub fn to_archive(&self) -> Result<AlignedVec, LexiconError> {
        let lexicon = self.to_lexicon();
        let mut serializer = AllocSerializer::<1024>::default();
        serializer
            .serialize_value(&lexicon)
            .map_err(|e| LexiconError::Archive(format!("{e:?}")))?;
        Ok(serializer.into_serializer().into_inner())
    }

    fn non_empty(self) -> Result<Self, LexiconError> {
        if self.entries.is_empty() {
            return Err(LexiconError::Empty);
        }
        debug!(entries = self.entries.len(), version = self.version, "dictionary loaded");
        Ok(self)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&DictionaryRecord> {
        self.entries.get(key)
    }

    /// Resolves a clicked word: normalize, direct match, then the stemmer.
    /// A miss is `None`, never an error.
    pub fn lookup(&self, surface: &str) -> Option<LookupResult> {
        let key = normalize(surface);
        if key.is_empty() {
            trace!(%surface, "nothing to look up");
            return None;
        }

        let (matched_key, path) = if self.contains(&key) {
            (key, MatchPath::Direct)
        } else {
            stem(&key, |base| self.contains(base))?
        };

        let record = self.entries.get(&matched_key)?.clone();
        trace!(%surface, %matched_key, ?path, "lookup resolved");

        Some(LookupResult {
            record,
            matched_key,
            surface: surface.to_string(),
            path,
        })
    }

    /// Family members that are headwords themselves, in family order.
    pub fn related<'a>(&'a self, record: &DictionaryRecord) -> Vec<&'a DictionaryRecord> {
        record
            .family
            .iter()
            .map(|word| normalize(word))
            .filter(|key| *key != record.canonical_key)
            .filter_map(|key| self.entries.get(&key))
            .collect()
    }
}
