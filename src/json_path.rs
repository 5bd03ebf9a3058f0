//! Minimal JSON path support for schema-declared paths.
//!
//! Handles the subset the ApiSchema uses: `$`, `.property`, `[*]` and `[n]`.
//! Selection returns the concrete path of every match so callers can attribute
//! messages to the element they came from.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPathError {
    #[error("JSON path must start with '$': {0}")]
    MissingRoot(String),

    #[error("Invalid JSON path segment in {path}: {segment}")]
    InvalidSegment { path: String, segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Property(String),
    Wildcard,
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(path: &str) -> Result<Self, JsonPathError> {
        let rest = path
            .strip_prefix('$')
            .ok_or_else(|| JsonPathError::MissingRoot(path.to_string()))?;

        let mut segments = Vec::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next == '.' || next == '[' {
                            break;
                        }
                        name.push(next);
                        chars.next();
                    }
                    if name.is_empty() {
                        return Err(JsonPathError::InvalidSegment {
                            path: path.to_string(),
                            segment: ".".to_string(),
                        });
                    }
                    segments.push(Segment::Property(name));
                }
                '[' => {
                    let mut inner = String::new();
                    for next in chars.by_ref() {
                        if next == ']' {
                            break;
                        }
                        inner.push(next);
                    }
                    let segment = if inner == "*" {
                        Segment::Wildcard
                    } else if let Ok(index) = inner.parse::<usize>() {
                        Segment::Index(index)
                    } else if let Some(name) = inner
                        .strip_prefix('\'')
                        .and_then(|s| s.strip_suffix('\''))
                    {
                        Segment::Property(name.to_string())
                    } else {
                        return Err(JsonPathError::InvalidSegment {
                            path: path.to_string(),
                            segment: format!("[{}]", inner),
                        });
                    };
                    segments.push(segment);
                }
                other => {
                    return Err(JsonPathError::InvalidSegment {
                        path: path.to_string(),
                        segment: other.to_string(),
                    })
                }
            }
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Wildcard))
    }

    /// Last property name in the path (`$.a[*].b` -> `b`)
    pub fn last_property(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            Segment::Property(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Property name holding the first wildcard array (`$.gradeLevels[*].x` -> `gradeLevels`)
    pub fn array_property(&self) -> Option<&str> {
        let position = self
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Wildcard))?;
        self.segments[..position].iter().rev().find_map(|s| match s {
            Segment::Property(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// All values matched by the path
    pub fn select<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        self.select_with_paths(root)
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }

    /// All values matched by the path, with the concrete path of each match
    pub fn select_with_paths<'a>(&self, root: &'a Value) -> Vec<(String, &'a Value)> {
        let mut current = vec![("$".to_string(), root)];
        for segment in &self.segments {
            let mut next = Vec::new();
            for (path, value) in current {
                match segment {
                    Segment::Property(name) => {
                        if let Some(child) = value.get(name.as_str()) {
                            next.push((format!("{}.{}", path, name), child));
                        }
                    }
                    Segment::Wildcard => {
                        if let Value::Array(items) = value {
                            for (i, item) in items.iter().enumerate() {
                                next.push((format!("{}[{}]", path, i), item));
                            }
                        }
                    }
                    Segment::Index(i) => {
                        if let Some(item) = value.get(*i) {
                            next.push((format!("{}[{}]", path, i), item));
                        }
                    }
                }
            }
            current = next;
        }
        current
    }

    pub fn first<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.select(root).into_iter().next()
    }

    /// Applies `f` to every matched value in place
    pub fn for_each_mut<F>(&self, root: &mut Value, mut f: F)
    where
        F: FnMut(&mut Value),
    {
        visit_mut(root, &self.segments, &mut f);
    }
}

fn visit_mut<F>(value: &mut Value, segments: &[Segment], f: &mut F)
where
    F: FnMut(&mut Value),
{
    let Some((head, tail)) = segments.split_first() else {
        f(value);
        return;
    };
    match head {
        Segment::Property(name) => {
            if let Some(child) = value.get_mut(name.as_str()) {
                visit_mut(child, tail, f);
            }
        }
        Segment::Wildcard => {
            if let Value::Array(items) = value {
                for item in items.iter_mut() {
                    visit_mut(item, tail, f);
                }
            }
        }
        Segment::Index(i) => {
            if let Some(item) = value.get_mut(*i) {
                visit_mut(item, tail, f);
            }
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Renders a scalar JSON value the way identities and references store it
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_segments() {
        let path = JsonPath::parse("$.classPeriods[*].classPeriodReference.schoolId").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Property("classPeriods".into()),
                Segment::Wildcard,
                Segment::Property("classPeriodReference".into()),
                Segment::Property("schoolId".into()),
            ]
        );
        assert_eq!(path.last_property(), Some("schoolId"));
        assert_eq!(path.array_property(), Some("classPeriods"));
        assert!(path.has_wildcard());
    }

    #[test]
    fn test_parse_rejects_missing_root() {
        assert!(matches!(
            JsonPath::parse("a.b"),
            Err(JsonPathError::MissingRoot(_))
        ));
        assert!(JsonPath::parse("$.").is_err());
    }

    #[test]
    fn test_select_with_wildcards() {
        let body = json!({"items": [{"n": 1}, {"n": 2}, {"x": 3}]});
        let path = JsonPath::parse("$.items[*].n").unwrap();
        let selected = path.select_with_paths(&body);
        assert_eq!(
            selected,
            vec![("$.items[0].n".to_string(), &json!(1)), ("$.items[1].n".to_string(), &json!(2))]
        );
    }

    #[test]
    fn test_for_each_mut_rewrites_in_place() {
        let mut body = json!({"items": [{"n": "1"}, {"n": "2"}]});
        let path = JsonPath::parse("$.items[*].n").unwrap();
        path.for_each_mut(&mut body, |v| *v = json!(0));
        assert_eq!(body, json!({"items": [{"n": 0}, {"n": 0}]}));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("abc")), "abc");
        assert_eq!(value_to_string(&json!(255901)), "255901");
        assert_eq!(value_to_string(&json!(true)), "true");
    }
}
