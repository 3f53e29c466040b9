//! Dictionary-driven transliteration.
//!
//! A rule table maps literal patterns to replacements. Text is scanned left
//! to right; at each position the longest pattern that matches
//! case-insensitively is replaced, with the replacement recased to follow
//! the matched text (`SHCH` -> `Щ`, `Shch` -> `Щ`, `shch` -> `щ`). Anything
//! unmatched is copied through. Patterns and input are compared in NFC.
//!
//! ```
//! use translit::Engine;
//!
//! let engine = Engine::build([("a", "X"), ("ab", "Y")]).unwrap();
//! assert_eq!(engine.transliterate("abac").unwrap(), "YXc");
//! ```

pub mod config;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod rules;
pub mod scanner;

pub use config::Settings;
pub use dictionary::{Dictionary, DictionaryInfo};
pub use engine::Engine;
pub use error::{Error, Result};
pub use rules::{Rule, RuleTable};
pub use scanner::{CaseShape, Scanner, Step};
