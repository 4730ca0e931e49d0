#![no_std] // Shared with the wasm platform

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod ids;
pub mod token;

pub use ids::{SessionId, WordIndex};
pub use token::{Span, Token, TokenKind};

pub mod model;
pub use model::*;
