//! HTTP response DSL.
//!
//! Models the response side of an HTTP server with four primitives: adding a
//! header, removing a header, setting the status code and setting the body.
//! Status shortcuts and helpers such as [`replace_header`] and [`json`] are
//! ordinary programs built from those primitives.
//!
//! # Examples
//!
//! ```rust
//! use freedsl::dsl::http::{self, Response};
//!
//! let script = http::body("Hello World!")
//!     .seq(http::status_code(200))
//!     .seq(http::add_header("Content-Type", "text/plain"));
//!
//! let response = http::render(&script, &Response::default());
//! assert_eq!(response.status_code, 200);
//! assert_eq!(response.headers["Content-Type"], "text/plain");
//! assert_eq!(response.body, "Hello World!");
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use crate::control::Free;
use crate::typeclass::{Cases, InstructionSet};

/// Brand type of the HTTP response instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Http {}

/// One response-building instruction with continuation slot `K`.
pub enum HttpInstruction<K> {
    /// Sets header `name` to `value`.
    AddHeader {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
        /// The rest of the program.
        next: K,
    },
    /// Removes header `name` if present.
    RemoveHeader {
        /// Header name.
        name: String,
        /// The rest of the program.
        next: K,
    },
    /// Sets the status code.
    StatusCode {
        /// The status code.
        code: u16,
        /// The rest of the program.
        next: K,
    },
    /// Sets the body.
    Body {
        /// The body content.
        content: String,
        /// The rest of the program.
        next: K,
    },
}

impl InstructionSet for Http {
    type Instruction<K> = HttpInstruction<K>;

    fn map_next<K, L, F>(instruction: &HttpInstruction<K>, function: F) -> HttpInstruction<L>
    where
        K: 'static,
        L: 'static,
        F: Fn(&K) -> L + Clone + 'static,
    {
        match instruction {
            HttpInstruction::AddHeader { name, value, next } => HttpInstruction::AddHeader {
                name: name.clone(),
                value: value.clone(),
                next: function(next),
            },
            HttpInstruction::RemoveHeader { name, next } => HttpInstruction::RemoveHeader {
                name: name.clone(),
                next: function(next),
            },
            HttpInstruction::StatusCode { code, next } => HttpInstruction::StatusCode {
                code: *code,
                next: function(next),
            },
            HttpInstruction::Body { content, next } => HttpInstruction::Body {
                content: content.clone(),
                next: function(next),
            },
        }
    }

    fn tag<K>(instruction: &HttpInstruction<K>) -> &'static str {
        match instruction {
            HttpInstruction::AddHeader { .. } => "AddHeader",
            HttpInstruction::RemoveHeader { .. } => "RemoveHeader",
            HttpInstruction::StatusCode { .. } => "StatusCode",
            HttpInstruction::Body { .. } => "Body",
        }
    }
}

impl<K> Display for HttpInstruction<K> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddHeader { name, value, .. } => write!(formatter, "AddHeader({name}: {value})"),
            Self::RemoveHeader { name, .. } => write!(formatter, "RemoveHeader({name})"),
            Self::StatusCode { code, .. } => write!(formatter, "StatusCode({code})"),
            Self::Body { content, .. } => write!(formatter, "Body({content})"),
        }
    }
}

/// Handlers for every response-building instruction.
pub trait HttpCases<K> {
    /// What every handler evaluates to.
    type Output;

    /// Handles `AddHeader`.
    fn add_header(&mut self, name: String, value: String, next: K) -> Self::Output;

    /// Handles `RemoveHeader`.
    fn remove_header(&mut self, name: String, next: K) -> Self::Output;

    /// Handles `StatusCode`.
    fn status_code(&mut self, code: u16, next: K) -> Self::Output;

    /// Handles `Body`.
    fn body(&mut self, content: String, next: K) -> Self::Output;
}

impl<K, C: HttpCases<K>> Cases<Http, K> for C {
    type Output = C::Output;

    fn dispatch(&mut self, instruction: HttpInstruction<K>) -> Self::Output {
        match instruction {
            HttpInstruction::AddHeader { name, value, next } => self.add_header(name, value, next),
            HttpInstruction::RemoveHeader { name, next } => self.remove_header(name, next),
            HttpInstruction::StatusCode { code, next } => self.status_code(code, next),
            HttpInstruction::Body { content, next } => self.body(content, next),
        }
    }
}

/// A plain response value interpreters write into.
///
/// The default response has no headers, status code `0` and an empty body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Headers by name.
    pub headers: BTreeMap<String, String>,
    /// Status code, `0` until set.
    pub status_code: u16,
    /// Body content.
    pub body: String,
}

// =============================================================================
// Smart Constructors
// =============================================================================

/// Sets header `name` to `value`.
pub fn add_header(name: impl Into<String>, value: impl Into<String>) -> Free<Http, ()> {
    Free::lift(HttpInstruction::AddHeader {
        name: name.into(),
        value: value.into(),
        next: (),
    })
}

/// Removes header `name`.
pub fn remove_header(name: impl Into<String>) -> Free<Http, ()> {
    Free::lift(HttpInstruction::RemoveHeader {
        name: name.into(),
        next: (),
    })
}

/// Sets the status code.
pub fn status_code(code: u16) -> Free<Http, ()> {
    Free::lift(HttpInstruction::StatusCode { code, next: () })
}

/// Sets the body.
pub fn body(content: impl Into<String>) -> Free<Http, ()> {
    Free::lift(HttpInstruction::Body {
        content: content.into(),
        next: (),
    })
}

/// `200 OK`.
pub fn ok() -> Free<Http, ()> {
    status_code(200)
}

/// `201 Created`.
pub fn created() -> Free<Http, ()> {
    status_code(201)
}

/// `404 Not Found`.
pub fn not_found() -> Free<Http, ()> {
    status_code(404)
}

/// `500 Internal Server Error`.
pub fn internal_error() -> Free<Http, ()> {
    status_code(500)
}

/// Removes header `name`, then sets it to `value`.
pub fn replace_header(name: impl Into<String>, value: impl Into<String>) -> Free<Http, ()> {
    let name = name.into();
    remove_header(name.clone()).seq(add_header(name, value))
}

/// Sets a `text/plain` body.
pub fn plain_text(text: impl Into<String>) -> Free<Http, ()> {
    replace_header("Content-Type", "text/plain").seq(body(text))
}

/// Sets `value` serialized as JSON as the body, with an `application/json`
/// content type.
///
/// # Errors
///
/// Returns the serializer's error if `value` cannot be represented as JSON.
///
/// # Examples
///
/// ```rust
/// use freedsl::dsl::http::{self, Response};
/// use std::collections::BTreeMap;
///
/// let payload = BTreeMap::from([("text", "Hello World!")]);
/// let script = http::json(&payload).unwrap();
///
/// let response = http::render(&script, &Response::default());
/// assert_eq!(response.body, r#"{"text":"Hello World!"}"#);
/// assert_eq!(response.headers["Content-Type"], "application/json");
/// ```
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Free<Http, ()>, serde_json::Error> {
    let content = serde_json::to_string(value)?;
    Ok(replace_header("Content-Type", "application/json").seq(body(content)))
}

// =============================================================================
// Interpreters
// =============================================================================

/// Writes every instruction into a borrowed response.
struct Writer<'a> {
    response: &'a mut Response,
}

impl<K> HttpCases<K> for Writer<'_> {
    type Output = K;

    fn add_header(&mut self, name: String, value: String, next: K) -> K {
        self.response.headers.insert(name, value);
        next
    }

    fn remove_header(&mut self, name: String, next: K) -> K {
        self.response.headers.remove(&name);
        next
    }

    fn status_code(&mut self, code: u16, next: K) -> K {
        self.response.status_code = code;
        next
    }

    fn body(&mut self, content: String, next: K) -> K {
        self.response.body = content;
        next
    }
}

/// Like [`Writer`], but reports the continuation as `Some` so that a finished
/// program can be told apart by `cata_const`.
struct Rendering<'a>(Writer<'a>);

impl<K> HttpCases<K> for Rendering<'_> {
    type Output = Option<K>;

    fn add_header(&mut self, name: String, value: String, next: K) -> Option<K> {
        Some(self.0.add_header(name, value, next))
    }

    fn remove_header(&mut self, name: String, next: K) -> Option<K> {
        Some(self.0.remove_header(name, next))
    }

    fn status_code(&mut self, code: u16, next: K) -> Option<K> {
        Some(self.0.status_code(code, next))
    }

    fn body(&mut self, content: String, next: K) -> Option<K> {
        Some(self.0.body(content, next))
    }
}

/// Interprets `program` against a copy of `response` and returns the result.
///
/// The program's final value is ignored.
pub fn render<A: Clone + 'static>(program: &Free<Http, A>, response: &Response) -> Response {
    let mut rendered = response.clone();
    let mut current = program.clone();
    while let Some(next) = current.cata_const(
        None,
        &mut Rendering(Writer {
            response: &mut rendered,
        }),
    ) {
        current = next;
    }
    rendered
}

/// Interprets `program`, writing into `response` in place.
pub fn apply_to<A: Clone + 'static>(program: &Free<Http, A>, response: &mut Response) -> A {
    program.clone().go_cata(&mut Writer { response })
}
