//! Runs one key-value store script through every interpreter.
//!
//! ```text
//! RUST_LOG=debug cargo run --example kvs_script
//! ```

use freedsl::dsl::kvs::{self, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn initial_store() -> Store {
    Store::from([
        ("tommy".to_string(), "howdy".to_string()),
        ("tammy".to_string(), "aloha".to_string()),
    ])
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,freedsl=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let script = kvs::modify("tommy", |value| value.to_uppercase()).chain(|()| kvs::get("tommy"));

    let store = initial_store();
    for line in kvs::describe(&script, &store) {
        tracing::info!(%line, "planned instruction");
    }

    let (value, updated) = kvs::run_pure(&script, &store);
    tracing::info!(?value, ?updated, original = ?store, "pure interpreter finished");

    let mut mutable = initial_store();
    let value = kvs::run_logged(&script, &mut mutable);
    tracing::info!(?value, store = ?mutable, "mutable interpreter finished");
}
