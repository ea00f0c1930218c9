//! Wire codec subsystem.
//!
//! # Data Flow
//! ```text
//! raw query / POST body
//!     → form.rs (split on `&` / `;`, split pairs on first `=`)
//!     → percent.rs (decode key and value independently)
//!     → FormValues (multi-valued, first value wins on lookup)
//!
//! response result payload
//!     → percent.rs (encode everything outside the safe set)
//!     → writer assembles `field=value&...`
//! ```
//!
//! # Design Decisions
//! - Pure functions, no state
//! - Decoding is tolerant: one bad pair never hides the others
//! - `+` is a literal plus, not a space

pub mod form;
pub mod percent;

pub use form::{parse_form_encoded, FormValues};
pub use percent::{percent_decode, percent_encode};

use thiserror::Error;

/// Error raised while decoding form-encoded data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A `%` not followed by two hex digits.
    #[error("invalid escape {escape:?} at byte {offset}")]
    InvalidEscape { offset: usize, escape: String },

    /// The decoded bytes do not form valid UTF-8.
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}
