//! Minimal ArchieML parser for exported documents.
//!
//! Covers the subset writers actually use in copy documents: `key:
//! value` lines with dotted keys, `{scope}` blocks, `[array]` blocks
//! (both `*` items and keyed object groups), multi-line values closed
//! by `:end`, and `:skip`/`:endskip`. Unrecognized lines are ignored,
//! as the format requires. Pure transformation, no I/O.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9_.-]+)\s*:\s*(.*)$").expect("key regex"));

static SCOPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\{\s*([A-Za-z0-9_.-]*)\s*\}\s*$").expect("scope regex"));

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[\s*([A-Za-z0-9_.-]*)\s*\]\s*$").expect("array regex"));

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*\s*(.*)$").expect("item regex"));

/// Parse ArchieML text into an insertion-ordered JSON object.
pub fn parse(text: &str) -> Map<String, Value> {
    Parser::default().run(text)
}

#[derive(Default)]
struct Parser {
    root: Map<String, Value>,
    scope: Vec<String>,
    array: Option<ArrayContext>,
    pending: Option<Pending>,
    skipping: bool,
}

struct ArrayContext {
    /// Absolute path the array commits to, captured at open time.
    path: Vec<String>,
    items: Vec<Value>,
    /// First key seen in a keyed array; a repeat starts the next object.
    first_key: Option<String>,
    current: Option<Map<String, Value>>,
}

/// A scalar already committed as single-line, buffering lines in case a
/// later `:end` turns it into a multi-line value.
struct Pending {
    path: Vec<String>,
    first_line: String,
    buffer: Vec<String>,
}

impl Parser {
    fn run(mut self, text: &str) -> Map<String, Value> {
        for line in text.lines() {
            self.line(line);
        }
        self.commit_array();
        self.root
    }

    fn line(&mut self, line: &str) {
        let trimmed = line.trim();

        if self.skipping {
            if trimmed.eq_ignore_ascii_case(":endskip") {
                self.skipping = false;
            }
            return;
        }
        if trimmed.eq_ignore_ascii_case(":skip") {
            self.pending = None;
            self.skipping = true;
            return;
        }
        if trimmed.eq_ignore_ascii_case(":end") {
            if let Some(pending) = self.pending.take() {
                let mut value = pending.first_line;
                for extra in &pending.buffer {
                    value.push('\n');
                    value.push_str(extra);
                }
                set_path(&mut self.root, &pending.path, Value::String(value.trim_end().into()));
            }
            return;
        }

        if let Some(captures) = ARRAY_RE.captures(line) {
            self.pending = None;
            self.commit_array();
            let name = &captures[1];
            if !name.is_empty() {
                let mut path = self.scope.clone();
                path.extend(name.split('.').map(str::to_string));
                self.array = Some(ArrayContext {
                    path,
                    items: Vec::new(),
                    first_key: None,
                    current: None,
                });
            }
            return;
        }

        if let Some(captures) = SCOPE_RE.captures(line) {
            self.pending = None;
            self.commit_array();
            let name = &captures[1];
            self.scope = if name.is_empty() {
                Vec::new()
            } else {
                name.split('.').map(str::to_string).collect()
            };
            return;
        }

        if let Some(array) = self.array.as_mut() {
            if let Some(captures) = ITEM_RE.captures(line) {
                array.items.push(Value::String(captures[1].trim_end().into()));
                return;
            }
            if let Some(captures) = KEY_RE.captures(line) {
                let key = captures[1].to_string();
                let value = Value::String(captures[2].trim_end().into());

                let is_repeat = array.first_key.as_deref() == Some(key.as_str());
                if array.first_key.is_none() {
                    array.first_key = Some(key.clone());
                }
                if is_repeat {
                    // The repeated first key starts the next object.
                    if let Some(done) = array.current.take() {
                        array.items.push(Value::Object(done));
                    }
                }
                match array.current.as_mut() {
                    Some(current) if !is_repeat => {
                        current.insert(key, value);
                    }
                    _ => {
                        let mut object = Map::new();
                        object.insert(key, value);
                        array.current = Some(object);
                    }
                }
                return;
            }
            return;
        }

        if let Some(captures) = KEY_RE.captures(line) {
            let mut path = self.scope.clone();
            path.extend(captures[1].split('.').map(str::to_string));
            let first_line = captures[2].trim_end().to_string();
            set_path(&mut self.root, &path, Value::String(first_line.clone()));
            self.pending = Some(Pending {
                path,
                first_line,
                buffer: Vec::new(),
            });
            return;
        }

        if let Some(pending) = self.pending.as_mut() {
            pending.buffer.push(line.to_string());
        }
    }

    fn commit_array(&mut self) {
        if let Some(mut array) = self.array.take() {
            if let Some(current) = array.current.take() {
                array.items.push(Value::Object(current));
            }
            set_path(&mut self.root, &array.path, Value::Array(array.items));
        }
    }
}

/// Insert a value at a dotted path, creating intermediate objects.
/// Non-object intermediates are overwritten, matching last-write-wins.
fn set_path(root: &mut Map<String, Value>, path: &[String], value: Value) {
    let mut node = root;
    for key in &path[..path.len() - 1] {
        let entry = node
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        node = entry.as_object_mut().expect("just ensured object");
    }
    node.insert(path[path.len() - 1].clone(), value);
}
