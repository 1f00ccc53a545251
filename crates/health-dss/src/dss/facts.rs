//! Normalized, fully-defaulted fact maps consumed by rule evaluation.
//!
//! Each domain declares its facts once through [`fact_keys!`]: the dotted path rules refer to
//! and the default value written before extraction starts. A [`FactMap`] is always built from
//! those defaults, so every fact a rule can reference is present before evaluation.

use std::fmt;
use std::marker::PhantomData;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Primitive value held by a fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl FactValue {
    pub const fn kind(&self) -> FactKind {
        match self {
            FactValue::Bool(_) => FactKind::Bool,
            FactValue::Number(_) => FactKind::Number,
            FactValue::Text(_) => FactKind::Text,
            FactValue::Null => FactKind::Null,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FactValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Number(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Text(value)
    }
}

/// Shape of a fact value, used in load-time checks and evaluation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    Bool,
    Number,
    Text,
    Null,
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FactKind::Bool => "boolean",
            FactKind::Number => "number",
            FactKind::Text => "string",
            FactKind::Null => "null",
        };
        f.write_str(label)
    }
}

/// Typed key of a domain fact. Implemented through [`fact_keys!`].
pub trait FactKey: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every key, in declaration order. `ALL[k.index()] == k`.
    const ALL: &'static [Self];

    fn index(self) -> usize;
    fn path(self) -> &'static str;
    fn default_value(self) -> FactValue;

    fn from_path(path: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.path() == path)
    }
}

pub(crate) fn absent() -> FactValue {
    FactValue::Bool(false)
}

pub(crate) fn zero() -> FactValue {
    FactValue::Number(0.0)
}

pub(crate) fn text(value: &str) -> FactValue {
    FactValue::Text(value.to_string())
}

/// Declares a fact key enum together with each fact's path and default.
macro_rules! fact_keys {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $path:literal = $default:expr,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)+
        }

        impl $crate::dss::facts::FactKey for $name {
            const ALL: &'static [Self] = &[$(Self::$variant,)+];

            fn index(self) -> usize {
                self as usize
            }

            fn path(self) -> &'static str {
                match self {
                    $(Self::$variant => $path,)+
                }
            }

            fn default_value(self) -> $crate::dss::facts::FactValue {
                match self {
                    $(Self::$variant => $default,)+
                }
            }
        }
    };
}

pub(crate) use fact_keys;

/// Flat key → value map for one individual.
#[derive(Clone, PartialEq)]
pub struct FactMap<K: FactKey> {
    values: Vec<FactValue>,
    keys: PhantomData<K>,
}

impl<K: FactKey> FactMap<K> {
    pub fn with_defaults() -> Self {
        Self {
            values: K::ALL.iter().map(|key| key.default_value()).collect(),
            keys: PhantomData,
        }
    }

    pub fn get(&self, key: K) -> &FactValue {
        &self.values[key.index()]
    }

    pub fn set(&mut self, key: K, value: impl Into<FactValue>) {
        self.values[key.index()] = value.into();
    }

    /// True only when the fact holds boolean `true`.
    pub fn is_set(&self, key: K) -> bool {
        matches!(self.get(key), FactValue::Bool(true))
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &FactValue)> {
        K::ALL.iter().copied().zip(self.values.iter())
    }
}

impl<K: FactKey> Default for FactMap<K> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<K: FactKey> fmt::Debug for FactMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(key, value)| (key.path(), value)))
            .finish()
    }
}

impl<K: FactKey> Serialize for FactMap<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.path(), value)?;
        }
        map.end()
    }
}

/// Canonical gender encoding shared by both domains.
///
/// Source records use `F`/`M` in some places and `Female`/`Male` in others. Both are accepted
/// here; the fact map and every rule only ever see [`Gender::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

impl Gender {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("f") | Some("female") => Gender::Female,
            Some("m") | Some("male") => Gender::Male,
            _ => Gender::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::Unknown => "Unknown",
        }
    }
}
