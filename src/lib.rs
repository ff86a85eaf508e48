use std::collections::{HashMap, HashSet};
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

mod colonizer;
mod dom;
mod host;
mod html;
mod keyboard;
mod page;
mod pattern;
mod selector;

pub use colonizer::{
    BASE_SELECTOR, ColonizerConfig, DEFAULT_INSERT_LENGTHS, DEFAULT_PASSTHROUGH_KEY_CODES,
    DEFAULT_SEPARATOR, NAME_SUFFIX_SELECTOR, TIME_FIELD_CLASS_SELECTOR, TimeFieldAutoColonizer,
};
pub use dom::NodeId;
pub use host::{ElementQuery, FieldHost, KeyDownListener, KeyDownRegistry};
pub use keyboard::{Key, KeyboardEvent};
pub use page::{Page, ReadyState};

use dom::{Dom, Element};
use pattern::{Regex, RegexError};
use selector::{SelectorCombinator, SelectorPart, SelectorStep, parse_selector_groups};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    InvalidPattern(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::InvalidPattern(msg) => write!(f, "invalid separator pattern: {msg}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

impl From<RegexError> for Error {
    fn from(value: RegexError) -> Self {
        Self::InvalidPattern(value.to_string())
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut it = value.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        let Some(ch) = it.next() else {
            return out;
        };
        out.push(ch);
    }
    if it.next().is_some() {
        out.push_str("...");
    }
    out
}
