//! Bounded, tagged representation of an untrusted settings patch.
//!
//! A `MergePatch` is an owned tree of `PatchValue`s. It is only ever built
//! through the constructors below, which enforce the size, depth and width
//! limits before the merge engine sees a single key. It is plain data: there
//! is no object graph behind it and nothing a key can resolve through.

use serde_json::{Map, Value};

use crate::errors::{MergeError, ROOT_PATH};

/// Nesting allowed anywhere in a request envelope. Stays below the JSON
/// parser's recursion limit; the selected field is held to `max_depth`.
const ENVELOPE_NESTING_GUARD: usize = 100;

/// Bounds applied while building a `MergePatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentLimits {
    /// Maximum serialized size in bytes.
    pub max_document_bytes: usize,
    /// Maximum nesting depth; the root object is depth 1.
    pub max_depth: usize,
    /// Maximum entries per object and elements per array.
    pub max_keys_per_level: usize,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_document_bytes: 16 * 1024,
            max_depth: 8,
            max_keys_per_level: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<PatchValue>),
    Object(PatchObject),
}

impl PatchValue {
    /// Short type name used in validation messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

/// Object node. Entries follow the key order of the parsed JSON map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchObject {
    entries: Vec<(String, PatchValue)>,
}

impl PatchObject {
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PatchValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PatchValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validated patch document whose root is an object.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePatch {
    root: PatchObject,
}

impl MergePatch {
    /// Parse a serialized patch document.
    ///
    /// # Errors
    /// `TooLarge`, `TooDeep`, `TooWide` when a bound is exceeded,
    /// `MalformedDocument` for invalid JSON or a non-object root.
    pub fn from_slice(bytes: &[u8], limits: &DocumentLimits) -> Result<Self, MergeError> {
        check_size(bytes, limits)?;
        check_raw_depth(bytes, limits.max_depth, limits.max_depth)?;
        let value = parse_json(bytes)?;
        Self::from_value(&value, limits)
    }

    /// Parse a request body of the form `{"<field>": <patch>, ...}` and build
    /// the patch from `<field>`. Other envelope members are ignored and only
    /// the field itself counts against `max_depth`.
    ///
    /// # Errors
    /// Same as [`MergePatch::from_slice`]; a missing `field` or a non-object
    /// envelope is `MalformedDocument`.
    pub fn from_envelope(
        bytes: &[u8],
        field: &str,
        limits: &DocumentLimits,
    ) -> Result<Self, MergeError> {
        check_size(bytes, limits)?;
        let guard = limits.max_depth.saturating_add(1).max(ENVELOPE_NESTING_GUARD);
        check_raw_depth(bytes, guard, limits.max_depth)?;
        let value = parse_json(bytes)?;
        let Value::Object(envelope) = value else {
            return Err(MergeError::malformed(
                ROOT_PATH,
                "request body must be a JSON object",
            ));
        };
        let inner = envelope
            .get(field)
            .ok_or_else(|| MergeError::malformed(ROOT_PATH, format!("missing field '{field}'")))?;
        Self::from_value(inner, limits)
    }

    /// Build a patch from an already parsed JSON value.
    ///
    /// # Errors
    /// `TooDeep`, `TooWide` when a bound is exceeded, `MalformedDocument` when
    /// the root is not an object.
    pub fn from_value(value: &Value, limits: &DocumentLimits) -> Result<Self, MergeError> {
        let Value::Object(map) = value else {
            return Err(MergeError::malformed(
                ROOT_PATH,
                format!("expected object, found {}", json_kind(value)),
            ));
        };
        let root = convert_object(map, "", 1, limits)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &PatchObject {
        &self.root
    }

    /// Nesting depth of the document (root object counts as 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self
            .root
            .entries()
            .map(|(_, v)| value_depth(v))
            .max()
            .unwrap_or(0)
    }
}

fn value_depth(value: &PatchValue) -> usize {
    match value {
        PatchValue::Object(obj) => 1 + obj.entries().map(|(_, v)| value_depth(v)).max().unwrap_or(0),
        PatchValue::Array(items) => 1 + items.iter().map(value_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Join a parent path and a key into a dotted path.
///
/// Keys that are empty or hold anything besides ASCII alphanumerics, `_`
/// and `-` are written as a quoted JSON string in brackets, so
/// `{"a.b": 1}` yields `["a.b"]` while `{"a": {"b": 1}}` yields `a.b`.
#[must_use]
pub fn child_path(parent: &str, key: &str) -> String {
    if needs_quoting(key) {
        format!("{parent}[{}]", Value::String(key.to_owned()))
    } else if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty()
        || !key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT_PATH.to_owned()
    } else {
        path.to_owned()
    }
}

fn check_size(bytes: &[u8], limits: &DocumentLimits) -> Result<(), MergeError> {
    if bytes.len() > limits.max_document_bytes {
        return Err(MergeError::TooLarge {
            size: bytes.len(),
            max: limits.max_document_bytes,
        });
    }
    Ok(())
}

/// Reject input nested deeper than `allowed` before handing it to the JSON
/// parser. `max_depth` is only reported in the error.
fn check_raw_depth(bytes: &[u8], allowed: usize, max_depth: usize) -> Result<(), MergeError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &b in bytes {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > allowed {
                    return Err(MergeError::TooDeep { max_depth });
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn parse_json(bytes: &[u8]) -> Result<Value, MergeError> {
    serde_json::from_slice(bytes).map_err(|e| MergeError::malformed(ROOT_PATH, e.to_string()))
}

fn convert_object(
    map: &Map<String, Value>,
    path: &str,
    level: usize,
    limits: &DocumentLimits,
) -> Result<PatchObject, MergeError> {
    if level > limits.max_depth {
        return Err(MergeError::TooDeep {
            max_depth: limits.max_depth,
        });
    }
    if map.len() > limits.max_keys_per_level {
        return Err(MergeError::TooWide {
            path: display_path(path),
            max_keys: limits.max_keys_per_level,
        });
    }

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let child = child_path(path, key);
        entries.push((key.clone(), convert(value, &child, level, limits)?));
    }
    Ok(PatchObject { entries })
}

fn convert(
    value: &Value,
    path: &str,
    level: usize,
    limits: &DocumentLimits,
) -> Result<PatchValue, MergeError> {
    Ok(match value {
        Value::Null => PatchValue::Null,
        Value::Bool(b) => PatchValue::Bool(*b),
        Value::Number(n) => PatchValue::Number(n.clone()),
        Value::String(s) => PatchValue::String(s.clone()),
        Value::Object(map) => PatchValue::Object(convert_object(map, path, level + 1, limits)?),
        Value::Array(items) => {
            if level + 1 > limits.max_depth {
                return Err(MergeError::TooDeep {
                    max_depth: limits.max_depth,
                });
            }
            if items.len() > limits.max_keys_per_level {
                return Err(MergeError::TooWide {
                    path: display_path(path),
                    max_keys: limits.max_keys_per_level,
                });
            }
            let converted = items
                .iter()
                .enumerate()
                .map(|(i, item)| convert(item, &format!("{path}[{i}]"), level + 1, limits))
                .collect::<Result<Vec<_>, _>>()?;
            PatchValue::Array(converted)
        }
    })
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
