#![cfg(feature = "http")]
//! Integration tests for the HTTP response DSL.

use freedsl::control::Free;
use freedsl::dsl::http::{self, Http, HttpCases, Response};
use rstest::rstest;
use serde_json::json;
use std::collections::BTreeMap;

fn hello() -> Free<Http, ()> {
    http::body("Hello World!")
        .seq(http::status_code(200))
        .seq(http::add_header("Content-Type", "text/plain"))
        .seq(http::add_header("Origin", "http://www.example.com"))
}

// =============================================================================
// Scenarios
// =============================================================================

#[rstest]
fn basic_response() {
    let response = http::render(&hello(), &Response::default());

    assert_eq!(
        serde_json::to_value(&response).expect("serializable response"),
        json!({
            "headers": {
                "Content-Type": "text/plain",
                "Origin": "http://www.example.com",
            },
            "statusCode": 200,
            "body": "Hello World!",
        })
    );
}

#[rstest]
fn json_helper_equals_primitive_script() {
    let by_primitives = hello()
        .seq(http::remove_header("Content-Type"))
        .seq(http::add_header("Content-Type", "application/json"))
        .seq(http::body(
            serde_json::to_string(&json!({"text": "Hello World!"})).expect("serializable body"),
        ));
    let by_helper =
        hello().seq(http::json(&json!({"text": "Hello World!"})).expect("serializable body"));

    let start = Response::default();
    assert_eq!(http::render(&by_primitives, &start), http::render(&by_helper, &start));
}

#[rstest]
fn base_script_is_unchanged_by_extension() {
    let base = hello();
    let _json = base.clone().seq(http::json(&json!({"text": "hi"})).expect("serializable body"));

    let response = http::render(&base, &Response::default());
    assert_eq!(response.headers["Content-Type"], "text/plain");
    assert_eq!(response.body, "Hello World!");
}

// =============================================================================
// Interpreters
// =============================================================================

#[rstest]
#[case(http::ok(), 200)]
#[case(http::created(), 201)]
#[case(http::not_found(), 404)]
#[case(http::internal_error(), 500)]
fn apply_to_sets_status(#[case] status: Free<Http, ()>, #[case] expected: u16) {
    let mut response = Response::default();
    http::apply_to(&http::plain_text("x").seq(status), &mut response);
    assert_eq!(response.status_code, expected);
    assert_eq!(response.headers["Content-Type"], "text/plain");
}

#[rstest]
fn render_starts_from_given_response() {
    let start = Response {
        headers: BTreeMap::from([("Server".to_string(), "freedsl".to_string())]),
        status_code: 500,
        body: "old".to_string(),
    };
    let rendered = http::render(&http::ok().seq(http::plain_text("new")), &start);

    assert_eq!(rendered.headers.len(), 2);
    assert_eq!(rendered.status_code, 200);
    assert_eq!(rendered.body, "new");
    assert_eq!(start.body, "old");
}

#[rstest]
fn apply_to_returns_program_result() {
    let program = http::ok().map(|()| "sent");
    let mut response = Response::default();
    assert_eq!(http::apply_to(&program, &mut response), "sent");
}

/// Interpreter that only records which headers a program touches.
#[derive(Default)]
struct HeaderAudit {
    touched: Vec<String>,
}

impl<K> HttpCases<K> for HeaderAudit {
    type Output = K;

    fn add_header(&mut self, name: String, _value: String, next: K) -> K {
        self.touched.push(format!("+{name}"));
        next
    }

    fn remove_header(&mut self, name: String, next: K) -> K {
        self.touched.push(format!("-{name}"));
        next
    }

    fn status_code(&mut self, _code: u16, next: K) -> K {
        next
    }

    fn body(&mut self, _content: String, next: K) -> K {
        next
    }
}

#[rstest]
fn custom_handler_via_go_cata() {
    let program = hello().seq(http::replace_header("Origin", "http://localhost"));
    let mut audit = HeaderAudit::default();
    program.go_cata(&mut audit);
    assert_eq!(
        audit.touched,
        vec!["+Content-Type", "+Origin", "-Origin", "+Origin"]
    );
}

#[rstest]
fn long_response_program_renders() {
    let mut program = http::ok();
    for index in 0..50_000 {
        program = program.seq(http::add_header(format!("X-{}", index % 10), index.to_string()));
    }
    let rendered = http::render(&program, &Response::default());
    assert_eq!(rendered.headers.len(), 10);
    assert_eq!(rendered.headers["X-9"], "49999");
}
