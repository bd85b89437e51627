//! Free programs and their evaluators.
//!
//! - [`Free`]: a program over an instruction set, built as inert data
//! - [`Step`]: the one-step view of a program returned by [`Free::resume`]
//! - [`FreeError`]: failures of fallible evaluation
//!
//! # Examples
//!
//! ## Building and Interpreting
//!
//! ```rust
//! use freedsl::dsl::kvs::{self, Store};
//!
//! let program = kvs::put("greeting", "hello").seq(kvs::get("greeting"));
//!
//! let mut store = Store::new();
//! let value = kvs::run_mutable(&program, &mut store);
//! assert_eq!(value.as_deref(), Some("hello"));
//! ```
//!
//! ## Reusing a Prefix
//!
//! ```rust
//! use freedsl::dsl::http::{self, Response};
//!
//! let base = http::status_code(200).seq(http::body("Hello"));
//! let with_header = base.clone().seq(http::add_header("Origin", "example.com"));
//!
//! let plain = http::render(&base, &Response::default());
//! let extended = http::render(&with_header, &Response::default());
//! assert!(plain.headers.is_empty());
//! assert_eq!(extended.headers.len(), 1);
//! ```

mod error;
mod free;
mod node;
mod pending;

pub use error::FreeError;
pub use free::{Free, Step, lift};
