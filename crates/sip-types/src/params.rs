//! Generic `;key=value` parameter lists.
//!
//! URI parameters, Contact ext-opts (`expires`, `q`, `+sip.instance`,
//! `reg-id`, `pub-gruu`, `temp-gruu`, `gr`, …) and Via/To/From tag params all
//! follow the same shape, so they share one small ordered map rather than a
//! bespoke struct per header.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An ordered `;name` or `;name=value` parameter list.
///
/// `BTreeMap` keeps iteration deterministic, which matters for the
/// registrar's wire-observable `expires` normalization and for tests that
/// assert on synthesized URIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params(BTreeMap<String, Option<String>>);

impl Params {
    /// An empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, overwriting any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), Some(value.into()));
        self
    }

    /// Set a valueless flag parameter (e.g. `;lr`, `;gr`).
    pub fn set_flag(&mut self, name: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), None);
        self
    }

    /// Remove a parameter.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.0.remove(name);
        self
    }

    /// Value of `name`, if present and valued.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }

    /// Whether `name` is present at all (valued or a bare flag).
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style flag setter.
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.set_flag(name);
        self
    }

    /// Iterate `(name, value)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl std::fmt::Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, value) in self.iter() {
            match value {
                Some(v) => write!(f, ";{name}={v}")?,
                None => write!(f, ";{name}")?,
            }
        }
        Ok(())
    }
}
