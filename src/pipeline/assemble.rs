//! Assembly of streamed model text into JSON.
//!
//! ## Why is this necessary?
//!
//! The model answers with text, not JSON values. Even well-prompted models
//! wrap the object in ` ```json ... ``` ` fences or add a sentence before it,
//! and while streaming, the text is a prefix that stops mid-string or
//! mid-number. Two entry points handle the two cases:
//!
//! - [`parse_final`]: the full response. Strip fences and chatter, parse.
//! - [`repair_prefix`] / [`PrefixScanner`]: a partial response. Cut back to
//!   the last point where every value is complete, then close the open
//!   containers. The result always parses and only ever contains values the
//!   model has finished, so partial validation never sees a truncated
//!   `"riskLevel": 8` that will become `85`.

use crate::error::SchemaError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```\s*$").unwrap());

/// Remove a markdown code fence wrapping the whole response.
pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => trimmed,
    }
}

/// Parse a finished response into a JSON value.
///
/// The first balanced `{...}` that parses to a non-empty object wins, so
/// prose with braces before or after it is ignored. This is the same object
/// [`PrefixScanner`] reports as complete while streaming.
pub fn parse_final(text: &str) -> Result<Value, SchemaError> {
    let body = strip_code_fences(text);
    let mut scanner = PrefixScanner::default();
    scanner.advance(body);
    if let Some(root) = scanner.root {
        return Ok(root);
    }
    // An unbalanced brace in leading prose swallows the scan; retry each
    // opening brace on its own.
    if let Some(value) = first_object(body) {
        return Ok(value);
    }
    match scanner.fallback {
        Some(empty) => Ok(empty),
        None if scanner.start.is_some() => Err(SchemaError::NotJson {
            detail: "response ended before the JSON object was complete".into(),
        }),
        None => Err(SchemaError::NotJson {
            detail: "no JSON object found in response".into(),
        }),
    }
}

fn first_object(body: &str) -> Option<Value> {
    body.match_indices('{').find_map(|(i, _)| {
        let mut values = serde_json::Deserializer::from_str(&body[i..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Object(map))) if !map.is_empty() => Some(Value::Object(map)),
            _ => None,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    Object { after_colon: bool },
    Array,
}

impl Frame {
    fn closer(self) -> char {
        match self {
            Frame::Object { .. } => '}',
            Frame::Array => ']',
        }
    }
}

/// Incremental scanner over an append-only buffer of model text.
///
/// Each call to [`advance`](Self::advance) resumes where the previous one
/// stopped, so a stream of `n` bytes is scanned in `O(n)` overall. The
/// scanner tracks the current root-object candidate and the last offset at
/// which every value inside it was complete.
#[derive(Debug, Default)]
pub struct PrefixScanner {
    pos: usize,
    start: Option<usize>,
    stack: Vec<Frame>,
    in_string: bool,
    string_is_value: bool,
    escaped: bool,
    // Absolute byte offset (exclusive) and open frames at the last safe point.
    safe: Option<(usize, Vec<Frame>)>,
    root: Option<Value>,
    fallback: Option<Value>,
}

impl PrefixScanner {
    /// The finished root object, once one has closed and parsed.
    pub fn root(&self) -> Option<&Value> {
        self.root.as_ref()
    }

    /// Scan the bytes of `text` not seen yet. `text` must extend the text
    /// passed to earlier calls.
    ///
    /// Returns `true` when [`snapshot`](Self::snapshot) may have changed.
    pub fn advance(&mut self, text: &str) -> bool {
        let mut changed = false;
        while self.root.is_none() && self.pos < text.len() {
            let Some(start) = self.start else {
                match text[self.pos..].find('{') {
                    Some(offset) => {
                        let start = self.pos + offset;
                        self.start = Some(start);
                        self.stack.push(Frame::Object { after_colon: false });
                        self.safe = Some((start + 1, self.stack.clone()));
                        self.pos = start + 1;
                        changed = true;
                    }
                    None => self.pos = text.len(),
                }
                continue;
            };

            let Some(ch) = text[self.pos..].chars().next() else {
                break;
            };
            let i = self.pos;
            self.pos += ch.len_utf8();

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_string = false;
                    if self.string_is_value {
                        self.safe = Some((i + 1, self.stack.clone()));
                        changed = true;
                    }
                }
                continue;
            }

            match ch {
                '"' => {
                    self.in_string = true;
                    self.string_is_value = match self.stack.last() {
                        Some(Frame::Object { after_colon }) => *after_colon,
                        Some(Frame::Array) => true,
                        None => false,
                    };
                }
                '{' | '[' => {
                    self.stack.push(if ch == '{' {
                        Frame::Object { after_colon: false }
                    } else {
                        Frame::Array
                    });
                    self.safe = Some((i + 1, self.stack.clone()));
                    changed = true;
                }
                '}' | ']' => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        self.close_root(text, start, i);
                        changed = true;
                        continue;
                    }
                    self.safe = Some((i + 1, self.stack.clone()));
                    changed = true;
                }
                ':' => {
                    if let Some(Frame::Object { after_colon }) = self.stack.last_mut() {
                        *after_colon = true;
                    }
                }
                ',' => {
                    self.safe = Some((i, self.stack.clone()));
                    changed = true;
                    if let Some(Frame::Object { after_colon }) = self.stack.last_mut() {
                        *after_colon = false;
                    }
                }
                _ => {}
            }
        }
        changed
    }

    /// The candidate `text[start..=end]` is balanced. Keep it if it is a
    /// non-empty object; otherwise resume the search after it (empty object)
    /// or just past its opening brace (prose such as `{as requested}`).
    fn close_root(&mut self, text: &str, start: usize, end: usize) {
        match serde_json::from_str::<Value>(&text[start..=end]) {
            Ok(Value::Object(map)) if !map.is_empty() => {
                self.root = Some(Value::Object(map));
                return;
            }
            Ok(empty @ Value::Object(_)) => {
                self.fallback.get_or_insert(empty);
            }
            _ => self.pos = start + 1,
        }
        self.start = None;
        self.stack.clear();
        self.safe = None;
        self.in_string = false;
        self.escaped = false;
    }

    /// The largest parseable object implied by the text scanned so far.
    ///
    /// `text` must be the buffer last passed to [`advance`](Self::advance).
    pub fn snapshot(&self, text: &str) -> Option<Value> {
        if let Some(root) = &self.root {
            return Some(root.clone());
        }
        let (Some(start), Some((end, frames))) = (self.start, self.safe.as_ref()) else {
            return self.fallback.clone();
        };
        let mut repaired = text[start..*end].to_string();
        for frame in frames.iter().rev() {
            repaired.push(frame.closer());
        }
        serde_json::from_str(&repaired).ok()
    }
}

/// Turn a streamed prefix into the largest parseable JSON object it implies.
///
/// Returns `None` until the opening `{` has arrived. Incomplete trailing
/// values (strings, numbers, literals, dangling keys) are dropped rather than
/// guessed at.
pub fn repair_prefix(text: &str) -> Option<Value> {
    let mut scanner = PrefixScanner::default();
    scanner.advance(text);
    scanner.snapshot(text)
}
