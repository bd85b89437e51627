//! Builds HTTP responses from reusable scripts.
//!
//! ```text
//! cargo run --example http_response
//! ```

use freedsl::dsl::http::{self, Response};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), serde_json::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,freedsl=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let script = http::body("Hello World!")
        .seq(http::status_code(200))
        .seq(http::add_header("Content-Type", "text/plain"))
        .seq(http::add_header("Origin", "http://www.example.com"));

    let by_primitives = script
        .clone()
        .seq(http::remove_header("Content-Type"))
        .seq(http::add_header("Content-Type", "application/json"))
        .seq(http::body(serde_json::to_string(&json!({"text": "Hello World!"}))?));

    let by_helper = script.clone().seq(http::json(&json!({"text": "Hello World!"}))?);

    let empty = Response::default();
    let plain = http::render(&script, &empty);
    let first = http::render(&by_primitives, &empty);
    let second = http::render(&by_helper, &empty);

    tracing::info!(response = %serde_json::to_string(&plain)?, "plain text response");
    tracing::info!(response = %serde_json::to_string(&first)?, "json response");
    tracing::info!(equal = first == second, "helper matches primitives");

    let mut created = Response::default();
    http::apply_to(&http::created().seq(http::plain_text("made it")), &mut created);
    tracing::info!(response = %serde_json::to_string(&created)?, "created response");

    Ok(())
}
