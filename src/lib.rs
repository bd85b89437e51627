//! # freedsl
//!
//! Free monads over user-defined instruction sets.
//!
//! ## Overview
//!
//! Declare the primitive instructions of a small language once, and obtain
//! sequencing (`map`, `chain`, `apply`, `seq`) over programs built from them
//! for free. Programs are inert, immutable data; interpreters are supplied
//! later, and the same program can be run by any number of them (pure,
//! mutating, logging, testing).
//!
//! - **Instruction sets**: [`InstructionSet`](typeclass::InstructionSet) and
//!   [`Cases`](typeclass::Cases)
//! - **Programs**: [`Free`](control::Free) with stack-safe evaluation
//! - **Example DSLs**: a key-value store and an HTTP response builder
//!
//! ## Feature Flags
//!
//! - `kvs`: Key-value store DSL
//! - `http`: HTTP response DSL (enables `serde` and `serde_json`)
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use freedsl::dsl::kvs::{self, Store};
//!
//! let script = kvs::modify("tommy", |value| value.to_uppercase()).seq(kvs::get("tommy"));
//!
//! let store = Store::from([
//!     ("tommy".to_string(), "howdy".to_string()),
//!     ("tammy".to_string(), "aloha".to_string()),
//! ]);
//! let (value, updated) = kvs::run_pure(&script, &store);
//!
//! assert_eq!(value.as_deref(), Some("HOWDY"));
//! assert_eq!(updated["tammy"], "aloha");
//! assert_eq!(store["tommy"], "howdy");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports the program type and the instruction set traits.
///
/// # Usage
///
/// ```rust
/// use freedsl::prelude::*;
/// ```
pub mod prelude {
    pub use crate::control::{Free, FreeError, Step, lift};
    pub use crate::typeclass::{Cases, InstructionSet};
}

pub mod control;
pub mod typeclass;

#[cfg(any(feature = "kvs", feature = "http"))]
pub mod dsl;
