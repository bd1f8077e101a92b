// Request validation primitives
// Every input (path, query, body) is coerced and checked field by field.
// Violations are collected so one response reports every bad field at once.

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

// ===== ERROR LOCATION =====

/// One step of an error location: an object key or a list index
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocSegment {
    Key(String),
    Index(usize),
}

/// Where a violation happened, e.g. `["body", "item", "price"]`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Loc(Vec<LocSegment>);

impl Loc {
    fn source(source: &str, name: &str) -> Self {
        Loc(vec![
            LocSegment::Key(source.to_string()),
            LocSegment::Key(name.to_string()),
        ])
    }

    pub fn path(name: &str) -> Self {
        Self::source("path", name)
    }

    pub fn query(name: &str) -> Self {
        Self::source("query", name)
    }

    pub fn body() -> Self {
        Loc(vec![LocSegment::Key("body".to_string())])
    }

    pub fn key(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(LocSegment::Key(name.to_string()));
        Loc(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(LocSegment::Index(index));
        Loc(segments)
    }
}

// ===== ERROR KINDS =====

/// What went wrong with a single field
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    Missing,
    NotAString,
    NotAnInteger,
    NotAFloat,
    NotABool,
    NotAList,
    NotAnObject,
    TooShort(usize),
    TooLong(usize),
    PatternMismatch(String),
    NotGreaterThan(i64),
    NotLessOrEqual(i64),
    NotAnEnumMember(&'static [&'static str]),
    UrlScheme,
    UrlSchemeNotPermitted(&'static [&'static str]),
    UrlHost,
    JsonDecode(String),
    NotAFile,
}

impl ErrorKind {
    pub fn message(&self) -> String {
        match self {
            ErrorKind::Missing => "field required".to_string(),
            ErrorKind::NotAString => "str type expected".to_string(),
            ErrorKind::NotAnInteger => "value is not a valid integer".to_string(),
            ErrorKind::NotAFloat => "value is not a valid float".to_string(),
            ErrorKind::NotABool => "value could not be parsed to a boolean".to_string(),
            ErrorKind::NotAList => "value is not a valid list".to_string(),
            ErrorKind::NotAnObject => "value is not a valid dict".to_string(),
            ErrorKind::TooShort(n) => format!("ensure this value has at least {} characters", n),
            ErrorKind::TooLong(n) => format!("ensure this value has at most {} characters", n),
            ErrorKind::PatternMismatch(p) => format!("string does not match regex \"{}\"", p),
            ErrorKind::NotGreaterThan(n) => format!("ensure this value is greater than {}", n),
            ErrorKind::NotLessOrEqual(n) => {
                format!("ensure this value is less than or equal to {}", n)
            }
            ErrorKind::NotAnEnumMember(members) => {
                let permitted: Vec<String> = members.iter().map(|m| format!("'{}'", m)).collect();
                format!(
                    "value is not a valid enumeration member; permitted: {}",
                    permitted.join(", ")
                )
            }
            ErrorKind::UrlScheme => "invalid or missing URL scheme".to_string(),
            ErrorKind::UrlSchemeNotPermitted(_) => "URL scheme not permitted".to_string(),
            ErrorKind::UrlHost => "URL host invalid".to_string(),
            ErrorKind::JsonDecode(reason) => reason.clone(),
            ErrorKind::NotAFile => "expected an uploaded file".to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Missing => "value_error.missing",
            ErrorKind::NotAString => "type_error.str",
            ErrorKind::NotAnInteger => "type_error.integer",
            ErrorKind::NotAFloat => "type_error.float",
            ErrorKind::NotABool => "type_error.bool",
            ErrorKind::NotAList => "type_error.list",
            ErrorKind::NotAnObject => "type_error.dict",
            ErrorKind::TooShort(_) => "value_error.any_str.min_length",
            ErrorKind::TooLong(_) => "value_error.any_str.max_length",
            ErrorKind::PatternMismatch(_) => "value_error.str.regex",
            ErrorKind::NotGreaterThan(_) => "value_error.number.not_gt",
            ErrorKind::NotLessOrEqual(_) => "value_error.number.not_le",
            ErrorKind::NotAnEnumMember(_) => "type_error.enum",
            ErrorKind::UrlScheme | ErrorKind::UrlSchemeNotPermitted(_) => "value_error.url.scheme",
            ErrorKind::UrlHost => "value_error.url.host",
            ErrorKind::JsonDecode(_) => "value_error.jsondecode",
            ErrorKind::NotAFile => "value_error",
        }
    }

    pub fn context(&self) -> Option<Value> {
        match self {
            ErrorKind::TooShort(n) | ErrorKind::TooLong(n) => Some(json!({ "limit_value": n })),
            ErrorKind::NotGreaterThan(n) | ErrorKind::NotLessOrEqual(n) => {
                Some(json!({ "limit_value": n }))
            }
            ErrorKind::PatternMismatch(p) => Some(json!({ "pattern": p })),
            ErrorKind::NotAnEnumMember(members) => Some(json!({ "enum_values": members })),
            ErrorKind::UrlSchemeNotPermitted(schemes) => {
                Some(json!({ "allowed_schemes": schemes }))
            }
            _ => None,
        }
    }
}

/// A single entry of a 422 response's `detail` list
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Keys and list indices leading to the bad input
    #[schema(value_type = Vec<Object>)]
    pub loc: Loc,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub ctx: Option<Value>,
}

impl ErrorDetail {
    pub fn new(loc: Loc, kind: &ErrorKind) -> Self {
        Self {
            loc,
            msg: kind.message(),
            kind: kind.code().to_string(),
            ctx: kind.context(),
        }
    }
}

// ===== COLLECTOR =====

/// Accumulates violations while a request is being decoded
#[derive(Debug, Default)]
pub struct Violations {
    details: Vec<ErrorDetail>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error (if any) at `loc` and pass the value through
    pub fn check<T>(&mut self, loc: Loc, result: Result<T, ErrorKind>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(kind) => {
                self.details.push(ErrorDetail::new(loc, &kind));
                None
            }
        }
    }

    /// Build the decoded value once every field has been checked.
    /// `build` runs only when nothing was recorded.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, Vec<ErrorDetail>> {
        if !self.details.is_empty() {
            return Err(self.details);
        }
        build().ok_or_else(|| vec![ErrorDetail::new(Loc::default(), &ErrorKind::Missing)])
    }
}

// ===== STRING COERCION (path, query, header) =====

pub fn required<T>(value: Option<T>) -> Result<T, ErrorKind> {
    value.ok_or(ErrorKind::Missing)
}

pub fn parse_int(raw: &str) -> Result<i64, ErrorKind> {
    raw.trim().parse::<i64>().map_err(|_| ErrorKind::NotAnInteger)
}

/// Finite decimal only; `inf` and `nan` spellings are not numbers on the wire
pub fn parse_float(raw: &str) -> Result<f64, ErrorKind> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ErrorKind::NotAFloat),
    }
}

pub fn parse_bool(raw: &str) -> Result<bool, ErrorKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" | "t" | "y" => Ok(true),
        "0" | "false" | "off" | "no" | "f" | "n" => Ok(false),
        _ => Err(ErrorKind::NotABool),
    }
}

// ===== CONSTRAINTS =====

pub fn min_length(value: String, limit: usize) -> Result<String, ErrorKind> {
    if value.chars().count() < limit {
        return Err(ErrorKind::TooShort(limit));
    }
    Ok(value)
}

pub fn max_length(value: String, limit: usize) -> Result<String, ErrorKind> {
    if value.chars().count() > limit {
        return Err(ErrorKind::TooLong(limit));
    }
    Ok(value)
}

pub fn matches(value: String, pattern: &Regex) -> Result<String, ErrorKind> {
    if !pattern.is_match(&value) {
        return Err(ErrorKind::PatternMismatch(pattern.as_str().to_string()));
    }
    Ok(value)
}

pub fn greater_than(value: i64, limit: i64) -> Result<i64, ErrorKind> {
    if value <= limit {
        return Err(ErrorKind::NotGreaterThan(limit));
    }
    Ok(value)
}

pub fn less_or_equal(value: i64, limit: i64) -> Result<i64, ErrorKind> {
    if value > limit {
        return Err(ErrorKind::NotLessOrEqual(limit));
    }
    Ok(value)
}

pub fn float_greater_than(value: f64, limit: i64) -> Result<f64, ErrorKind> {
    // NaN fails the comparison and is rejected too
    if !(value > limit as f64) {
        return Err(ErrorKind::NotGreaterThan(limit));
    }
    Ok(value)
}

const URL_MAX_LENGTH: usize = 2083;
const HTTP_SCHEMES: &[&str] = &["http", "https"];

/// Absolute http(s) URL with a host. The original text is kept as-is.
pub fn http_url(value: String) -> Result<String, ErrorKind> {
    let value = max_length(value, URL_MAX_LENGTH)?;
    let parsed = url::Url::parse(&value).map_err(|_| ErrorKind::UrlScheme)?;
    if !HTTP_SCHEMES.contains(&parsed.scheme()) {
        return Err(ErrorKind::UrlSchemeNotPermitted(HTTP_SCHEMES));
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(value),
        _ => Err(ErrorKind::UrlHost),
    }
}

// ===== JSON COERCION (request bodies) =====

/// Decoding from an already-parsed JSON document
pub trait FromJson: Sized {
    fn from_json(value: &Value, loc: &Loc, violations: &mut Violations) -> Option<Self>;
}

pub fn as_object(value: &Value) -> Result<&Map<String, Value>, ErrorKind> {
    value.as_object().ok_or(ErrorKind::NotAnObject)
}

/// Look up a field, treating an explicit `null` as absent
pub fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).filter(|v| !v.is_null())
}

pub fn json_string(value: &Value) -> Result<String, ErrorKind> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ErrorKind::NotAString),
    }
}

pub fn json_float(value: &Value) -> Result<f64, ErrorKind> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(ErrorKind::NotAFloat),
        Value::String(s) => parse_float(s),
        _ => Err(ErrorKind::NotAFloat),
    }
}

pub fn json_int(value: &Value) -> Result<i64, ErrorKind> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(ErrorKind::NotAnInteger),
            }
        }
        Value::String(s) => parse_int(s),
        _ => Err(ErrorKind::NotAnInteger),
    }
}

/// A list of strings, reporting each bad element at its own index
pub fn json_string_list(value: &Value, loc: &Loc, violations: &mut Violations) -> Option<Vec<String>> {
    let elements = violations.check(loc.clone(), value.as_array().ok_or(ErrorKind::NotAList))?;
    let mut out = Vec::with_capacity(elements.len());
    let mut ok = true;
    for (i, element) in elements.iter().enumerate() {
        match violations.check(loc.index(i), json_string(element)) {
            Some(s) => out.push(s),
            None => ok = false,
        }
    }
    ok.then_some(out)
}
