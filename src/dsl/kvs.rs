//! Key-value store DSL.
//!
//! Three primitives are enough to script a key-value store:
//!
//! - `Get`: read a key, continuing with its value (or `None`)
//! - `Put`: write a value under a key
//! - `Delete`: remove a key
//!
//! Everything else, such as [`modify`], is built from these with ordinary
//! `chain`/`seq` sequencing. A script can then be run by any interpreter in
//! this module without being rebuilt.
//!
//! # Examples
//!
//! ```rust
//! use freedsl::dsl::kvs::{self, Store};
//!
//! let script = kvs::put("counter", "1").seq(kvs::delete("stale")).seq(kvs::get("counter"));
//!
//! let mut store = Store::from([("stale".to_string(), "x".to_string())]);
//! let value = kvs::run_mutable(&script, &mut store);
//!
//! assert_eq!(value.as_deref(), Some("1"));
//! assert!(!store.contains_key("stale"));
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;
use tracing::info;

use crate::control::Free;
use crate::typeclass::{Cases, InstructionSet};

/// The store scripts run against.
pub type Store = BTreeMap<String, String>;

/// Continuation of a `Get`, fed the value found under the key.
pub type Lookup<K> = Rc<dyn Fn(Option<String>) -> K>;

/// Brand type of the key-value store instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kvs {}

/// One key-value store instruction with continuation slot `K`.
pub enum KvsInstruction<K> {
    /// Reads `key`.
    Get {
        /// The key to read.
        key: String,
        /// Continues with the value found, `None` if the key is absent.
        next: Lookup<K>,
    },
    /// Writes `value` under `key`, replacing any previous value.
    Put {
        /// The key to write.
        key: String,
        /// The value to store.
        value: String,
        /// The rest of the program.
        next: K,
    },
    /// Removes `key` if present.
    Delete {
        /// The key to remove.
        key: String,
        /// The rest of the program.
        next: K,
    },
}

impl InstructionSet for Kvs {
    type Instruction<K> = KvsInstruction<K>;

    fn map_next<K, L, F>(instruction: &KvsInstruction<K>, function: F) -> KvsInstruction<L>
    where
        K: 'static,
        L: 'static,
        F: Fn(&K) -> L + Clone + 'static,
    {
        match instruction {
            KvsInstruction::Get { key, next } => {
                let next = Rc::clone(next);
                KvsInstruction::Get {
                    key: key.clone(),
                    next: Rc::new(move |value: Option<String>| function(&next(value))),
                }
            }
            KvsInstruction::Put { key, value, next } => KvsInstruction::Put {
                key: key.clone(),
                value: value.clone(),
                next: function(next),
            },
            KvsInstruction::Delete { key, next } => KvsInstruction::Delete {
                key: key.clone(),
                next: function(next),
            },
        }
    }

    fn tag<K>(instruction: &KvsInstruction<K>) -> &'static str {
        match instruction {
            KvsInstruction::Get { .. } => "Get",
            KvsInstruction::Put { .. } => "Put",
            KvsInstruction::Delete { .. } => "Delete",
        }
    }
}

impl<K> Display for KvsInstruction<K> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get { key, .. } => write!(formatter, "Get({key})"),
            Self::Put { key, value, .. } => write!(formatter, "Put({key}, {value})"),
            Self::Delete { key, .. } => write!(formatter, "Delete({key})"),
        }
    }
}

/// Handlers for every key-value store instruction.
///
/// Implementing this trait makes a type usable with [`Free::go_cata`] and
/// [`Free::cata_const`] for programs over [`Kvs`].
pub trait KvsCases<K> {
    /// What every handler evaluates to.
    type Output;

    /// Handles `Get`.
    fn get(&mut self, key: String, next: Lookup<K>) -> Self::Output;

    /// Handles `Put`.
    fn put(&mut self, key: String, value: String, next: K) -> Self::Output;

    /// Handles `Delete`.
    fn delete(&mut self, key: String, next: K) -> Self::Output;
}

impl<K, C: KvsCases<K>> Cases<Kvs, K> for C {
    type Output = C::Output;

    fn dispatch(&mut self, instruction: KvsInstruction<K>) -> Self::Output {
        match instruction {
            KvsInstruction::Get { key, next } => self.get(key, next),
            KvsInstruction::Put { key, value, next } => self.put(key, value, next),
            KvsInstruction::Delete { key, next } => self.delete(key, next),
        }
    }
}

// =============================================================================
// Smart Constructors
// =============================================================================

/// Reads `key`, producing its value or `None`.
pub fn get(key: impl Into<String>) -> Free<Kvs, Option<String>> {
    Free::lift(KvsInstruction::Get {
        key: key.into(),
        next: Rc::new(|value: Option<String>| value),
    })
}

/// Writes `value` under `key`.
pub fn put(key: impl Into<String>, value: impl Into<String>) -> Free<Kvs, ()> {
    Free::lift(KvsInstruction::Put {
        key: key.into(),
        value: value.into(),
        next: (),
    })
}

/// Removes `key`.
pub fn delete(key: impl Into<String>) -> Free<Kvs, ()> {
    Free::lift(KvsInstruction::Delete {
        key: key.into(),
        next: (),
    })
}

/// Replaces the value under `key` with `function` applied to it.
///
/// Does nothing when `key` is absent.
pub fn modify<F>(key: impl Into<String>, function: F) -> Free<Kvs, ()>
where
    F: Fn(String) -> String + 'static,
{
    let key = key.into();
    get(key.clone()).chain(move |value| match value {
        Some(value) => put(key.clone(), function(value)),
        None => Free::pure(()),
    })
}

// =============================================================================
// Interpreters
// =============================================================================

/// Applies instructions directly to a borrowed store.
struct MutableStore<'a> {
    store: &'a mut Store,
}

impl<K> KvsCases<K> for MutableStore<'_> {
    type Output = K;

    fn get(&mut self, key: String, next: Lookup<K>) -> K {
        next(self.store.get(&key).cloned())
    }

    fn put(&mut self, key: String, value: String, next: K) -> K {
        self.store.insert(key, value);
        next
    }

    fn delete(&mut self, key: String, next: K) -> K {
        self.store.remove(&key);
        next
    }
}

/// Runs `program` against an immutable store.
///
/// Returns the program's result together with the updated store; `store`
/// itself is left untouched.
pub fn run_pure<A: Clone + 'static>(program: &Free<Kvs, A>, store: &Store) -> (A, Store) {
    let (store, value) =
        program
            .clone()
            .go_with_state(store.clone(), |mut store, instruction| match instruction {
                KvsInstruction::Get { key, next } => {
                    let value = store.get(&key).cloned();
                    (store, next(value))
                }
                KvsInstruction::Put { key, value, next } => {
                    store.insert(key, value);
                    (store, next)
                }
                KvsInstruction::Delete { key, next } => {
                    store.remove(&key);
                    (store, next)
                }
            });
    (value, store)
}

/// Runs `program`, mutating `store` in place.
pub fn run_mutable<A: Clone + 'static>(program: &Free<Kvs, A>, store: &mut Store) -> A {
    program.clone().go_cata(&mut MutableStore { store })
}

/// Runs `program` like [`run_mutable`], emitting an `info` event per instruction.
pub fn run_logged<A: Clone + 'static>(program: &Free<Kvs, A>, store: &mut Store) -> A {
    let mut interpreter = MutableStore { store };
    program.clone().go(|instruction| {
        info!(instruction = %instruction, "executing kvs instruction");
        Cases::<Kvs, _>::dispatch(&mut interpreter, instruction)
    })
}

/// Runs `program` against a copy of `store` and returns every instruction it
/// executed, rendered in execution order.
pub fn describe<A: Clone + 'static>(program: &Free<Kvs, A>, store: &Store) -> Vec<String> {
    let mut scratch = store.clone();
    let mut interpreter = MutableStore {
        store: &mut scratch,
    };
    let mut transcript = Vec::new();
    program.clone().go(|instruction| {
        transcript.push(instruction.to_string());
        Cases::<Kvs, _>::dispatch(&mut interpreter, instruction)
    });
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Step;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> Store {
        Store::from([
            ("tommy".to_string(), "howdy".to_string()),
            ("tammy".to_string(), "aloha".to_string()),
        ])
    }

    fn script() -> Free<Kvs, Option<String>> {
        modify("tommy", |value| value.to_uppercase()).seq(get("tommy"))
    }

    #[rstest]
    #[case(get("a").seq(Free::pure(())), "Get")]
    #[case(put("a", "1"), "Put")]
    #[case(delete("a"), "Delete")]
    fn constructors_lift_one_instruction(#[case] program: Free<Kvs, ()>, #[case] expected: &str) {
        let Step::Impure(instruction) = program.resume() else {
            panic!("Expected Impure");
        };
        assert_eq!(Kvs::tag(&instruction), expected);
    }

    #[rstest]
    fn get_continues_with_lookup_result() {
        let Step::Impure(KvsInstruction::Get { key, next }) = get("tommy").resume() else {
            panic!("Expected Get");
        };
        assert_eq!(key, "tommy");
        assert!(matches!(next(Some("x".to_string())).resume(), Step::Pure(Some(value)) if value == "x"));
        assert!(matches!(next(None).resume(), Step::Pure(None)));
    }

    #[rstest]
    #[case(KvsInstruction::Get { key: "k".to_string(), next: Rc::new(|_: Option<String>| ()) }, "Get(k)")]
    #[case(KvsInstruction::Put { key: "k".to_string(), value: "v".to_string(), next: () }, "Put(k, v)")]
    #[case(KvsInstruction::Delete { key: "k".to_string(), next: () }, "Delete(k)")]
    fn instruction_display(#[case] instruction: KvsInstruction<()>, #[case] expected: &str) {
        assert_eq!(instruction.to_string(), expected);
    }

    #[rstest]
    fn run_pure_leaves_input_untouched(store: Store) {
        let (value, updated) = run_pure(&script(), &store);
        assert_eq!(value.as_deref(), Some("HOWDY"));
        assert_eq!(updated["tommy"], "HOWDY");
        assert_eq!(updated["tammy"], "aloha");
        assert_eq!(store["tommy"], "howdy");
    }

    #[rstest]
    fn run_mutable_updates_store(mut store: Store) {
        let value = run_mutable(&script(), &mut store);
        assert_eq!(value.as_deref(), Some("HOWDY"));
        assert_eq!(store["tommy"], "HOWDY");
        assert_eq!(store["tammy"], "aloha");
    }

    #[rstest]
    fn run_logged_matches_run_mutable(store: Store) {
        let mut logged = store.clone();
        let mut plain = store;
        assert_eq!(run_logged(&script(), &mut logged), run_mutable(&script(), &mut plain));
        assert_eq!(logged, plain);
    }

    #[rstest]
    fn modify_missing_key_does_nothing(store: Store) {
        let program = modify("nobody", |value| value + "!");
        let ((), updated) = run_pure(&program, &store);
        assert_eq!(updated, store);
        assert_eq!(describe(&program, &store), vec!["Get(nobody)"]);
    }

    #[rstest]
    fn delete_removes_key(store: Store) {
        let program = delete("tammy").seq(get("tammy"));
        let (value, updated) = run_pure(&program, &store);
        assert_eq!(value, None);
        assert!(!updated.contains_key("tammy"));
    }

    #[rstest]
    fn describe_lists_executed_instructions(store: Store) {
        assert_eq!(
            describe(&script(), &store),
            vec!["Get(tommy)", "Put(tommy, HOWDY)", "Get(tommy)"]
        );
        assert_eq!(store["tommy"], "howdy");
    }

    #[rstest]
    fn building_a_script_touches_nothing(store: Store) {
        let before = store.clone();
        let _script = script().seq(delete("tammy")).seq(put("new", "value"));
        assert_eq!(store, before);
    }
}
