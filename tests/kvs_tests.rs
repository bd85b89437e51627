#![cfg(feature = "kvs")]
//! Integration tests for the key-value store DSL.
//!
//! The same scripts are run through every interpreter and must agree.

use freedsl::control::{Free, FreeError};
use freedsl::dsl::kvs::{self, Kvs, KvsCases, KvsInstruction, Lookup, Store};
use rstest::{fixture, rstest};

#[fixture]
fn store() -> Store {
    Store::from([
        ("tommy".to_string(), "howdy".to_string()),
        ("tammy".to_string(), "aloha".to_string()),
    ])
}

fn uppercase_tommy() -> Free<Kvs, Option<String>> {
    kvs::modify("tommy", |value| value.to_uppercase()).chain(|()| kvs::get("tommy"))
}

// =============================================================================
// Scenario
// =============================================================================

#[rstest]
fn pure_interpreter_runs_scenario(store: Store) {
    let (value, updated) = kvs::run_pure(&uppercase_tommy(), &store);

    assert_eq!(value.as_deref(), Some("HOWDY"));
    assert_eq!(
        updated,
        Store::from([
            ("tommy".to_string(), "HOWDY".to_string()),
            ("tammy".to_string(), "aloha".to_string()),
        ])
    );
}

#[rstest]
fn mutable_interpreter_matches_pure(store: Store) {
    let (pure_value, pure_store) = kvs::run_pure(&uppercase_tommy(), &store);

    let mut literal = store;
    let value = kvs::run_mutable(&uppercase_tommy(), &mut literal);

    assert_eq!(value, pure_value);
    assert_eq!(literal, pure_store);
}

#[rstest]
fn logged_interpreter_matches_pure(store: Store) {
    let (pure_value, pure_store) = kvs::run_pure(&uppercase_tommy(), &store);

    let mut logged = store;
    let value = kvs::run_logged(&uppercase_tommy(), &mut logged);

    assert_eq!(value, pure_value);
    assert_eq!(logged, pure_store);
}

#[rstest]
fn describe_records_execution_order(store: Store) {
    let script = kvs::delete("tammy")
        .seq(kvs::put("new", "value"))
        .seq(uppercase_tommy());
    assert_eq!(
        kvs::describe(&script, &store),
        vec![
            "Delete(tammy)",
            "Put(new, value)",
            "Get(tommy)",
            "Put(tommy, HOWDY)",
            "Get(tommy)",
        ]
    );
}

// =============================================================================
// Reuse
// =============================================================================

#[rstest]
fn script_can_be_rerun_on_its_own_output(store: Store) {
    let script = kvs::modify("tommy", |value| format!("{value}!"));
    let (_, once) = kvs::run_pure(&script, &store);
    let (_, twice) = kvs::run_pure(&script, &once);
    assert_eq!(twice["tommy"], "howdy!!");
}

#[rstest]
fn extending_script_does_not_change_it(store: Store) {
    let base = kvs::put("a", "1");
    let extended = base.clone().seq(kvs::delete("a"));

    let (_, after_base) = kvs::run_pure(&base, &store);
    let (_, after_extended) = kvs::run_pure(&extended, &store);

    assert_eq!(after_base.get("a").map(String::as_str), Some("1"));
    assert!(!after_extended.contains_key("a"));
}

// =============================================================================
// Custom Interpreters
// =============================================================================

/// Read-only interpreter that refuses writes by ending the program early.
struct ReadOnly<'a> {
    store: &'a Store,
    rejected: Vec<String>,
}

impl<A: Clone + 'static> KvsCases<Free<Kvs, Option<A>>> for ReadOnly<'_> {
    type Output = Free<Kvs, Option<A>>;

    fn get(&mut self, key: String, next: Lookup<Free<Kvs, Option<A>>>) -> Self::Output {
        next(self.store.get(&key).cloned())
    }

    fn put(&mut self, key: String, _value: String, _next: Self::Output) -> Self::Output {
        self.rejected.push(key);
        Free::pure(None)
    }

    fn delete(&mut self, key: String, _next: Self::Output) -> Self::Output {
        self.rejected.push(key);
        Free::pure(None)
    }
}

#[rstest]
fn interpreter_can_short_circuit(store: Store) {
    let script = kvs::get("tammy").chain(|greeting| {
        kvs::put("tommy", greeting.unwrap_or_default()).map(|()| Some(1))
    });
    let mut interpreter = ReadOnly {
        store: &store,
        rejected: Vec::new(),
    };
    assert_eq!(script.go_cata(&mut interpreter), None);
    assert_eq!(interpreter.rejected, vec!["tommy"]);
}

#[rstest]
fn interpreter_sees_every_instruction_variant() {
    let script = kvs::put("k", "v").seq(kvs::get("k")).chain(|_| kvs::delete("k"));
    let mut tags = Vec::new();
    script.go(|instruction| {
        tags.push(instruction.to_string());
        match instruction {
            KvsInstruction::Get { next, .. } => next(Some("v".to_string())),
            KvsInstruction::Put { next, .. } | KvsInstruction::Delete { next, .. } => next,
        }
    });
    assert_eq!(tags, vec!["Put(k, v)", "Get(k)", "Delete(k)"]);
}

#[rstest]
fn bounded_run_reports_exhausted_budget(store: Store) {
    let mut scratch = store;
    let result = uppercase_tommy().try_go_bounded(2, |instruction| match instruction {
        KvsInstruction::Get { key, next } => next(scratch.get(&key).cloned()),
        KvsInstruction::Put { key, value, next } => {
            scratch.insert(key, value);
            next
        }
        KvsInstruction::Delete { key, next } => {
            scratch.remove(&key);
            next
        }
    });
    assert_eq!(result, Err(FreeError::StepLimitExceeded { limit: 2 }));
}

// =============================================================================
// Stack Safety
// =============================================================================

#[rstest]
fn long_script_runs_in_every_interpreter() {
    let mut script = kvs::put("count", "0");
    for _ in 0..20_000 {
        script = script.seq(kvs::modify("count", |value| {
            (value.parse::<u32>().unwrap_or(0) + 1).to_string()
        }));
    }
    let script = script.seq(kvs::get("count"));

    let (value, _) = kvs::run_pure(&script, &Store::new());
    assert_eq!(value.as_deref(), Some("20000"));

    let mut store = Store::new();
    assert_eq!(kvs::run_mutable(&script, &mut store).as_deref(), Some("20000"));
}

#[rstest]
fn right_folded_script_runs_and_drops() {
    let script = (0..100_000)
        .rev()
        .fold(kvs::get("k99999"), |rest, index| kvs::put(format!("k{index}"), "v").seq(rest));

    let (value, store) = kvs::run_pure(&script, &Store::new());
    assert_eq!(value.as_deref(), Some("v"));
    assert_eq!(store.len(), 100_000);
    drop(script);
}
