//! Traits a DSL implements to be used with [`Free`](crate::control::Free).
//!
//! - [`InstructionSet`]: the instruction functor, emulated with a generic
//!   associated type because Rust has no higher-kinded types
//! - [`Cases`]: exhaustive case dispatch over one instruction set

mod instruction;

pub use instruction::{Cases, InstructionSet};
