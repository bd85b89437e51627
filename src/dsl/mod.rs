//! Example DSLs built on [`Free`](crate::control::Free).
//!
//! Each DSL provides its instruction set, smart constructors that lift single
//! instructions, derived helpers written with ordinary monadic sequencing, and
//! several interpreters for the same programs.

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "kvs")]
pub mod kvs;
