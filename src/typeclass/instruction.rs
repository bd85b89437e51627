//! Instruction functors - the vocabulary a free program is built from.
//!
//! A DSL describes its primitive operations as an enum whose variants carry
//! the operation's data plus one or more *continuation slots*. The slot type
//! is left generic so that the same enum can hold plain values (when an
//! instruction is first lifted), nested programs (inside a [`Free`]), or
//! anything else an interpreter needs.
//!
//! Rust has no higher-kinded types, so the DSL is represented by a brand type
//! implementing [`InstructionSet`], whose generic associated type names the
//! instruction enum for any slot type.
//!
//! # Laws
//!
//! ## Identity Law
//!
//! ```text
//! S::map_next(&instruction, |next| next.clone()) == instruction
//! ```
//!
//! ## Composition Law
//!
//! ```text
//! S::map_next(&S::map_next(&instruction, f), g) == S::map_next(&instruction, |next| g(&f(next)))
//! ```
//!
//! # Examples
//!
//! ```rust
//! use freedsl::typeclass::InstructionSet;
//!
//! enum Console {}
//!
//! enum ConsoleInstruction<K> {
//!     Print { line: String, next: K },
//! }
//!
//! impl InstructionSet for Console {
//!     type Instruction<K> = ConsoleInstruction<K>;
//!
//!     fn map_next<K, L, F>(instruction: &ConsoleInstruction<K>, function: F) -> ConsoleInstruction<L>
//!     where
//!         K: 'static,
//!         L: 'static,
//!         F: Fn(&K) -> L + Clone + 'static,
//!     {
//!         match instruction {
//!             ConsoleInstruction::Print { line, next } => ConsoleInstruction::Print {
//!                 line: line.clone(),
//!                 next: function(next),
//!             },
//!         }
//!     }
//!
//!     fn tag<K>(instruction: &ConsoleInstruction<K>) -> &'static str {
//!         match instruction {
//!             ConsoleInstruction::Print { .. } => "Print",
//!         }
//!     }
//! }
//!
//! let print = ConsoleInstruction::Print { line: "hi".to_string(), next: 1 };
//! let mapped = Console::map_next(&print, |next| next + 1);
//! assert!(matches!(mapped, ConsoleInstruction::Print { next: 2, .. }));
//! assert_eq!(Console::tag(&mapped), "Print");
//! ```
//!
//! [`Free`]: crate::control::Free

/// A brand type describing one DSL's instruction functor.
///
/// Implementors are usually uninhabited enums (`enum Kvs {}`); only the
/// associated items matter.
pub trait InstructionSet: 'static {
    /// The instruction enum with its continuation slots of type `K`.
    type Instruction<K>;

    /// Replaces every continuation slot of `instruction` with `function`
    /// applied to it, leaving the rest of the instruction data unchanged.
    ///
    /// Instructions are mapped by reference because free programs share their
    /// nodes. Slots that are functions of an interpreter-supplied value (such as
    /// the result of a lookup) are composed with `function` rather than called.
    fn map_next<K, L, F>(instruction: &Self::Instruction<K>, function: F) -> Self::Instruction<L>
    where
        K: 'static,
        L: 'static,
        F: Fn(&K) -> L + Clone + 'static;

    /// A stable name identifying which primitive `instruction` is.
    ///
    /// Used for diagnostics only, never for control flow.
    fn tag<K>(instruction: &Self::Instruction<K>) -> &'static str;
}

/// Case handlers for every instruction of `S` whose continuation slots hold `K`.
///
/// Interpreters match exhaustively on the instruction enum, so one missing a
/// case fails to compile. The bundled DSLs also declare a handler trait with
/// one method per primitive (such as
/// [`KvsCases`](crate::dsl::kvs::KvsCases)) bridged to `Cases` with a blanket
/// implementation.
pub trait Cases<S: InstructionSet, K> {
    /// What every case evaluates to.
    type Output;

    /// Dispatches `instruction` to the handler for its variant.
    fn dispatch(&mut self, instruction: S::Instruction<K>) -> Self::Output;
}
