//! Duplicate JSON property detection.
//!
//! `serde_json::Value` keeps only the last of two equal keys, so the raw body
//! text is walked with a seeded visitor that sees every key as written.

use indexmap::IndexSet;
use serde::de::{DeserializeSeed, Deserializer, Error as DeError, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::types::ValidationFailures;

/// Wording policy for duplicate-property failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePropertyStrategy {
    /// "An item with the same key has already been added."
    #[default]
    SameKey,
    /// "This property is duplicated."
    Duplicated,
}

impl DuplicatePropertyStrategy {
    pub fn message(&self) -> &'static str {
        match self {
            DuplicatePropertyStrategy::SameKey => "An item with the same key has already been added.",
            DuplicatePropertyStrategy::Duplicated => "This property is duplicated.",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "same-key" | "samekey" | "same_key" => Some(DuplicatePropertyStrategy::SameKey),
            "duplicated" | "repeated" => Some(DuplicatePropertyStrategy::Duplicated),
            _ => None,
        }
    }
}

/// Every distinct JSON path whose key appears more than once in its object,
/// in the order first found
pub fn find_duplicate_paths(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let mut duplicates = IndexSet::new();
    let mut deserializer = serde_json::Deserializer::from_str(body);
    Scanner {
        path: "$".to_string(),
        duplicates: &mut duplicates,
    }
    .deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(duplicates.into_iter().collect())
}

/// Failures for every duplicated path, one message per path
pub fn check_duplicate_properties(
    body: &str,
    strategy: DuplicatePropertyStrategy,
) -> Result<ValidationFailures, serde_json::Error> {
    let mut failures = ValidationFailures::new();
    for path in find_duplicate_paths(body)? {
        failures.add(path, strategy.message());
    }
    Ok(failures)
}

struct Scanner<'a> {
    path: String,
    duplicates: &'a mut IndexSet<String>,
}

impl<'de, 'a> DeserializeSeed<'de> for Scanner<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'a> Visitor<'de> for Scanner<'a> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E>(self, _: bool) -> Result<(), E>
    where
        E: DeError,
    {
        Ok(())
    }

    fn visit_i64<E>(self, _: i64) -> Result<(), E>
    where
        E: DeError,
    {
        Ok(())
    }

    fn visit_u64<E>(self, _: u64) -> Result<(), E>
    where
        E: DeError,
    {
        Ok(())
    }

    fn visit_f64<E>(self, _: f64) -> Result<(), E>
    where
        E: DeError,
    {
        Ok(())
    }

    fn visit_str<E>(self, _: &str) -> Result<(), E>
    where
        E: DeError,
    {
        Ok(())
    }

    fn visit_unit<E>(self) -> Result<(), E>
    where
        E: DeError,
    {
        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let Scanner { path, duplicates } = self;
        let mut index = 0usize;
        loop {
            let seed = Scanner {
                path: format!("{}[{}]", path, index),
                duplicates: &mut *duplicates,
            };
            if seq.next_element_seed(seed)?.is_none() {
                break;
            }
            index += 1;
        }
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let Scanner { path, duplicates } = self;
        let mut seen = HashSet::new();
        while let Some(key) = map.next_key::<String>()? {
            let child = format!("{}.{}", path, key);
            if !seen.insert(key) {
                duplicates.insert(child.clone());
            }
            map.next_value_seed(Scanner {
                path: child,
                duplicates: &mut *duplicates,
            })?;
        }
        Ok(())
    }
}
