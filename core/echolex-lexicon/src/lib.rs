//! Dictionary store and word lookup for clicked words.

pub mod error;
pub mod fallback;
pub mod normalize;
pub mod stemmer;
pub mod store;

pub use error::LexiconError;
pub use normalize::normalize;
pub use stemmer::{MatchPath, SuffixRule, SUFFIX_RULES};
pub use store::{LexiconStore, LookupResult, LEXICON_VERSION};
