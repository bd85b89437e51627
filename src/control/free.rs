//! Free monad over an instruction functor.
//!
//! Turns any [`InstructionSet`] into a monad: programs are built as inert data
//! with `lift`, `map`, `chain`, `apply` and `seq`, and only run when an
//! interpreter is supplied to [`Free::go`], [`Free::go_cata`] or one of the
//! folds.
//!
//! # Design
//!
//! ```text
//! Free<S, A> = Pure(A)
//!            | Impure(S::Instruction<Free<S, A>>)
//! ```
//!
//! `Free` is a cheap handle over reference-counted, immutable nodes. Cloning a
//! program shares it, so one prefix can be extended in several directions
//! without copying or interference.
//!
//! `chain` does not walk the program. It records the continuation in a bind
//! node, and [`Free::resume`] reassociates leading binds with a heap-allocated
//! stack whenever the `Pure`/`Impure` view is needed. Evaluating or dropping a
//! program uses constant native stack however long it is.
//!
//! # Examples
//!
//! ```rust
//! use freedsl::control::Free;
//! use freedsl::typeclass::InstructionSet;
//! use std::rc::Rc;
//!
//! enum Counter {}
//!
//! enum CounterInstruction<K> {
//!     Get(Rc<dyn Fn(i32) -> K>),
//!     Put(i32, K),
//! }
//!
//! impl InstructionSet for Counter {
//!     type Instruction<K> = CounterInstruction<K>;
//!
//!     fn map_next<K, L, F>(instruction: &CounterInstruction<K>, function: F) -> CounterInstruction<L>
//!     where
//!         K: 'static,
//!         L: 'static,
//!         F: Fn(&K) -> L + Clone + 'static,
//!     {
//!         match instruction {
//!             CounterInstruction::Get(next) => {
//!                 let next = Rc::clone(next);
//!                 CounterInstruction::Get(Rc::new(move |value: i32| function(&next(value))))
//!             }
//!             CounterInstruction::Put(value, next) => CounterInstruction::Put(*value, function(next)),
//!         }
//!     }
//!
//!     fn tag<K>(instruction: &CounterInstruction<K>) -> &'static str {
//!         match instruction {
//!             CounterInstruction::Get(_) => "Get",
//!             CounterInstruction::Put(..) => "Put",
//!         }
//!     }
//! }
//!
//! let get = || Free::<Counter, i32>::lift(CounterInstruction::Get(Rc::new(|value: i32| value)));
//! let put = |value: i32| Free::<Counter, ()>::lift(CounterInstruction::Put(value, ()));
//!
//! let program = get().chain(move |x| put(x + 1)).seq(get());
//!
//! let mut state = 10;
//! let result = program.go(|instruction| match instruction {
//!     CounterInstruction::Get(next) => next(state),
//!     CounterInstruction::Put(value, next) => {
//!         state = value;
//!         next
//!     }
//! });
//!
//! assert_eq!(result, 11);
//! assert_eq!(state, 11);
//! ```

use std::fmt::{self, Debug, Display, Formatter};
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{debug, trace};

use super::error::FreeError;
use super::node::{Arrow, Core, Erased, Node, View};
use crate::typeclass::{Cases, InstructionSet};

/// Reads an erased value back at its original type.
fn unerase<A: Clone + 'static>(value: Erased, context: &'static str) -> Result<A, FreeError> {
    value
        .downcast::<A>()
        .map(|typed| Rc::try_unwrap(typed).unwrap_or_else(|shared| A::clone(&shared)))
        .map_err(|_| FreeError::TypeMismatch { context })
}

/// A program over the instructions of `S` producing a value of type `A`.
///
/// # Type Parameters
///
/// * `S` - The instruction set (brand type implementing [`InstructionSet`])
/// * `A` - The result type of the program
///
/// # Laws
///
/// - **Left Identity**: `Free::pure(a).chain(f) == f(a)`
/// - **Right Identity**: `m.chain(Free::pure) == m`
/// - **Associativity**: `m.chain(f).chain(g) == m.chain(|x| f(x).chain(g))`
///
/// Equality here means equal results and equal effects under any interpreter.
///
/// # Stack Safety
///
/// `chain`, `map`, `seq` and `apply` are O(1) and never walk the program.
/// `resume`, `go`, `go_cata`, `go_with_state` and `Drop` run in constant
/// native stack depth.
///
/// # Note
///
/// Results must be `Clone` because a shared program may be interpreted any
/// number of times. Handles are not `Send`: programs are single-threaded data.
pub struct Free<S: InstructionSet, A> {
    core: Core<S>,
    _result: PhantomData<fn() -> A>,
}

/// One step of a program: either finished, or waiting on an instruction whose
/// continuation slots hold the rest of the program.
pub enum Step<S: InstructionSet, A> {
    /// The program has finished with this value.
    Pure(A),
    /// The next instruction to interpret.
    Impure(S::Instruction<Free<S, A>>),
}

impl<S: InstructionSet, A> Clone for Free<S, A> {
    fn clone(&self) -> Self {
        Self::from_core(self.core.clone())
    }
}

impl<S: InstructionSet, A> Free<S, A> {
    #[inline]
    const fn from_core(core: Core<S>) -> Self {
        Self {
            core,
            _result: PhantomData,
        }
    }
}

impl<S: InstructionSet, A: Clone + 'static> Free<S, A> {
    /// Wraps a plain value as a program that performs no instruction.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use freedsl::control::Free;
    /// use freedsl::dsl::kvs::Kvs;
    ///
    /// let program: Free<Kvs, i32> = Free::pure(42);
    /// assert_eq!(program.go(|_| unreachable!()), 42);
    /// ```
    #[inline]
    pub fn pure(value: A) -> Self {
        Self::from_core(Core::pure(Rc::new(value)))
    }

    /// Alias for `pure`.
    #[inline]
    pub fn of(value: A) -> Self {
        Self::pure(value)
    }

    /// Builds a program whose head is `instruction`; its continuation slots
    /// already hold the rest of the program.
    pub fn impure(instruction: S::Instruction<Self>) -> Self {
        Self::from_core(Core::impure(S::map_next(&instruction, |next: &Self| {
            next.core.clone()
        })))
    }

    /// Lifts one instruction into a one-step program whose result is whatever
    /// value the instruction's continuation slot holds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use freedsl::control::{Free, Step};
    /// use freedsl::dsl::kvs::{Kvs, KvsInstruction};
    ///
    /// let program: Free<Kvs, ()> = Free::lift(KvsInstruction::Delete {
    ///     key: "tommy".to_string(),
    ///     next: (),
    /// });
    /// assert!(matches!(program.resume(), Step::Impure(KvsInstruction::Delete { .. })));
    /// ```
    pub fn lift(instruction: S::Instruction<A>) -> Self {
        Self::from_core(Core::impure(S::map_next(&instruction, |value: &A| {
            Core::pure(Rc::new(value.clone()))
        })))
    }

    /// Applies a function to the result of the program (Functor `fmap`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use freedsl::control::Free;
    /// use freedsl::dsl::kvs::Kvs;
    ///
    /// let doubled = Free::<Kvs, i32>::pure(21).map(|x| x * 2);
    /// assert_eq!(doubled.go(|_| unreachable!()), 42);
    /// ```
    #[inline]
    pub fn map<B, F>(self, function: F) -> Free<S, B>
    where
        B: Clone + 'static,
        F: Fn(A) -> B + 'static,
    {
        self.chain(move |value| Free::pure(function(value)))
    }

    /// Continues the program with the program `function` builds from its
    /// result (Monad `bind`/`>>=`).
    ///
    /// A `Pure` program is substituted into `function` immediately; otherwise
    /// the continuation is recorded and only called during interpretation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use freedsl::control::Free;
    /// use freedsl::dsl::kvs::Kvs;
    ///
    /// let program = Free::<Kvs, i32>::pure(21).chain(|x| Free::pure(x * 2));
    /// assert_eq!(program.go(|_| unreachable!()), 42);
    /// ```
    pub fn chain<B, F>(self, function: F) -> Free<S, B>
    where
        B: Clone + 'static,
        F: Fn(A) -> Free<S, B> + 'static,
    {
        if let Some(value) = self.core.pure_value()
            && let Ok(value) = unerase::<A>(value, "pure value")
        {
            return function(value);
        }

        let arrow: Arrow<S> = Rc::new(move |value: Erased| {
            let value = unerase::<A>(value, "continuation input")
                .expect("Type mismatch in continuation application");
            function(value).core
        });
        Free::from_core(Core::bind(self.core, arrow))
    }

    /// Alias for `chain`.
    #[inline]
    pub fn and_then<B, F>(self, function: F) -> Free<S, B>
    where
        B: Clone + 'static,
        F: Fn(A) -> Free<S, B> + 'static,
    {
        self.chain(function)
    }

    /// Applies the function this program produces to the result of `argument`.
    ///
    /// Instructions of `self` run before those of `argument`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use freedsl::control::Free;
    /// use freedsl::dsl::kvs::Kvs;
    ///
    /// let function = Free::<Kvs, fn(i32) -> i32>::pure(|x| x + 1);
    /// let program = function.apply(Free::pure(41));
    /// assert_eq!(program.go(|_| unreachable!()), 42);
    /// ```
    pub fn apply<B, C>(self, argument: Free<S, B>) -> Free<S, C>
    where
        A: Fn(B) -> C,
        B: Clone + 'static,
        C: Clone + 'static,
    {
        self.chain(move |function: A| argument.clone().map(move |value| function(value)))
    }

    /// Runs `next` after this program, discarding this program's result.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use freedsl::control::Free;
    /// use freedsl::dsl::kvs::Kvs;
    ///
    /// let program = Free::<Kvs, &str>::pure("ignored").seq(Free::pure(42));
    /// assert_eq!(program.go(|_| unreachable!()), 42);
    /// ```
    #[inline]
    pub fn seq<B>(self, next: Free<S, B>) -> Free<S, B>
    where
        B: Clone + 'static,
    {
        if self.core.pure_value().is_some() {
            return next;
        }
        Free::from_core(Core::sequence(self.core, next.core))
    }

    /// Alias for `seq`.
    #[inline]
    pub fn then<B>(self, next: Free<S, B>) -> Free<S, B>
    where
        B: Clone + 'static,
    {
        self.seq(next)
    }

    /// Exposes the program's head as a [`Step`].
    ///
    /// # Panics
    ///
    /// Panics if an erased value has an unexpected type, which indicates a bug
    /// in the engine rather than in the program.
    pub fn resume(&self) -> Step<S, A> {
        self.try_resume().expect("Final result type mismatch")
    }

    /// Exposes the program's head as a [`Step`] with Result-based error handling.
    ///
    /// # Errors
    ///
    /// Returns `Err(FreeError::TypeMismatch)` if the finished value does not
    /// have type `A`.
    pub fn try_resume(&self) -> Result<Step<S, A>, FreeError> {
        match self.core.resume(Self::from_core) {
            View::Pure(value) => unerase(value, "final result").map(Step::Pure),
            View::Impure(instruction) => Ok(Step::Impure(instruction)),
        }
    }

    /// Folds the program's head with one handler per constructor.
    ///
    /// The fold does not recurse: `on_impure` receives the instruction with the
    /// rest of the program in its slots and decides itself whether, and in what
    /// order, to continue.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use freedsl::control::Free;
    /// use freedsl::dsl::kvs::{self, Kvs};
    ///
    /// let describe = |program: &Free<Kvs, ()>| {
    ///     program.cata(|()| "done".to_string(), |instruction| instruction.to_string())
    /// };
    /// assert_eq!(describe(&kvs::delete("tommy")), "Delete(tommy)");
    /// assert_eq!(describe(&Free::pure(())), "done");
    /// ```
    pub fn cata<R>(
        &self,
        on_pure: impl FnOnce(A) -> R,
        on_impure: impl FnOnce(S::Instruction<Self>) -> R,
    ) -> R {
        match self.resume() {
            Step::Pure(value) => on_pure(value),
            Step::Impure(instruction) => on_impure(instruction),
        }
    }

    /// Folds the program's head, ignoring its final value.
    ///
    /// A finished program yields `result`; otherwise the instruction is handed
    /// straight to `cases`.
    pub fn cata_const<R, C>(&self, result: R, cases: &mut C) -> R
    where
        C: Cases<S, Self, Output = R>,
    {
        match self.resume() {
            Step::Pure(_) => result,
            Step::Impure(instruction) => cases.dispatch(instruction),
        }
    }

    /// Runs the program to completion.
    ///
    /// `interpret` consumes one instruction and returns the program to resume,
    /// typically one of the instruction's continuations after performing its
    /// effect. Evaluation ends when a `Pure` program is reached; an interpreter
    /// that never returns one never finishes.
    ///
    /// # Panics
    ///
    /// Panics if an erased value has an unexpected type, which indicates a bug
    /// in the engine rather than in the program.
    pub fn go<F>(self, interpret: F) -> A
    where
        F: FnMut(S::Instruction<Self>) -> Self,
    {
        self.try_go(interpret).expect("Final result type mismatch")
    }

    /// Runs the program to completion with Result-based error handling.
    ///
    /// # Errors
    ///
    /// Returns `Err(FreeError::TypeMismatch)` if an erased value has an
    /// unexpected type.
    pub fn try_go<F>(self, interpret: F) -> Result<A, FreeError>
    where
        F: FnMut(S::Instruction<Self>) -> Self,
    {
        self.evaluate(None, interpret)
    }

    /// Runs the program, interpreting at most `limit` instructions.
    ///
    /// # Errors
    ///
    /// Returns `Err(FreeError::StepLimitExceeded)` if the program still has an
    /// instruction to interpret after `limit` steps.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use freedsl::control::FreeError;
    /// use freedsl::dsl::kvs::{self, KvsInstruction};
    ///
    /// let program = kvs::put("a", "1").seq(kvs::put("b", "2"));
    /// let result = program.try_go_bounded(1, |instruction| match instruction {
    ///     KvsInstruction::Get { next, .. } => next(None),
    ///     KvsInstruction::Put { next, .. } | KvsInstruction::Delete { next, .. } => next,
    /// });
    /// assert_eq!(result, Err(FreeError::StepLimitExceeded { limit: 1 }));
    /// ```
    pub fn try_go_bounded<F>(self, limit: usize, interpret: F) -> Result<A, FreeError>
    where
        F: FnMut(S::Instruction<Self>) -> Self,
    {
        self.evaluate(Some(limit), interpret)
    }

    /// Runs the program, dispatching every instruction to `cases`.
    pub fn go_cata<C>(self, cases: &mut C) -> A
    where
        C: Cases<S, Self, Output = Self>,
    {
        self.go(|instruction| cases.dispatch(instruction))
    }

    /// Runs the program while threading `state` through every step.
    ///
    /// Suited to pure interpreters: `step` receives the current state and an
    /// instruction and returns the next state and the program to resume.
    ///
    /// # Panics
    ///
    /// Panics if an erased value has an unexpected type, which indicates a bug
    /// in the engine rather than in the program.
    pub fn go_with_state<T, F>(self, mut state: T, mut step: F) -> (T, A)
    where
        F: FnMut(T, S::Instruction<Self>) -> (T, Self),
    {
        let mut current = self;
        loop {
            match current.resume() {
                Step::Pure(value) => return (state, value),
                Step::Impure(instruction) => {
                    trace!(instruction = S::tag(&instruction), "folding instruction");
                    let (next_state, next) = step(state, instruction);
                    state = next_state;
                    current = next;
                }
            }
        }
    }

    fn evaluate<F>(self, limit: Option<usize>, mut interpret: F) -> Result<A, FreeError>
    where
        F: FnMut(S::Instruction<Self>) -> Self,
    {
        let mut current = self;
        let mut steps = 0_usize;
        loop {
            match current.try_resume()? {
                Step::Pure(value) => {
                    debug!(steps, "free program completed");
                    return Ok(value);
                }
                Step::Impure(instruction) => {
                    if limit.is_some_and(|limit| steps >= limit) {
                        debug!(steps, "free program exceeded its step limit");
                        return Err(FreeError::StepLimitExceeded { limit: steps });
                    }
                    steps += 1;
                    trace!(
                        step = steps,
                        instruction = S::tag(&instruction),
                        "interpreting instruction"
                    );
                    current = interpret(instruction);
                }
            }
        }
    }
}

/// Lifts one instruction into a one-step program.
///
/// Free-function form of [`Free::lift`].
#[inline]
pub fn lift<S: InstructionSet, A: Clone + 'static>(instruction: S::Instruction<A>) -> Free<S, A> {
    Free::lift(instruction)
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<S: InstructionSet, A: Debug + 'static> Debug for Free<S, A> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self.core.node() {
            Node::Pure(value) => match value.downcast_ref::<A>() {
                Some(value) => formatter.debug_tuple("Pure").field(value).finish(),
                None => formatter.debug_tuple("Pure").field(&"<erased>").finish(),
            },
            Node::Impure(instruction) => formatter
                .debug_tuple("Impure")
                .field(&S::tag(instruction))
                .finish(),
            Node::Bind { pending, .. } => formatter
                .debug_struct("Bind")
                .field("source", &"<program>")
                .field("pending", &pending.len())
                .finish(),
        }
    }
}

impl<S: InstructionSet, A: Display + 'static> Display for Free<S, A> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self.core.node() {
            Node::Pure(value) => match value.downcast_ref::<A>() {
                Some(value) => write!(formatter, "Pure({value})"),
                None => write!(formatter, "Pure(<erased>)"),
            },
            Node::Impure(instruction) => write!(formatter, "Impure({})", S::tag(instruction)),
            Node::Bind { pending, .. } => write!(formatter, "Bind(<{} pending>)", pending.len()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
