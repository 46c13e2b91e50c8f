use std::collections::BTreeMap;
use std::ffi::OsString;

use serde::{Deserialize, Serialize};

use crate::error::ConfigIssue;

/// Process-wide variables handed to the entry process at launch.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EnvironmentProfile {
    variables: BTreeMap<String, String>,
}

impl EnvironmentProfile {
    /// Builds an empty profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, replacing any earlier value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Overlays `other` on top of this profile; `other` wins on conflicts.
    pub fn merge(&mut self, other: Self) {
        self.variables.extend(other.variables);
    }

    /// Looks up a configured value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Iterates over the variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of configured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns true when no variables are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub(crate) fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (name, value) in &self.variables {
            if !is_valid_name(name) {
                issues.push(ConfigIssue::InvalidEnvironmentName { name: name.clone() });
            } else if value.contains('\0') {
                issues.push(ConfigIssue::InvalidEnvironmentValue { name: name.clone() });
            }
        }
        issues
    }
}

impl<K, V> FromIterator<(K, V)> for EnvironmentProfile
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            variables: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Variable names that must be set and non-empty before launch.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RequiredEnvironment {
    names: Vec<String>,
}

impl RequiredEnvironment {
    /// Builds the requirement list.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Required names in declaration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the names missing from both the profile and the inherited
    /// environment, as seen through `lookup`.
    ///
    /// A profile entry takes precedence because it overrides the inherited
    /// value at launch.
    pub fn missing<F>(&self, profile: &EnvironmentProfile, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        self.names
            .iter()
            .filter(|name| {
                let name = name.as_str();
                let present = match profile.get(name) {
                    Some(value) => !value.is_empty(),
                    None => lookup(name).is_some_and(|value| !value.is_empty()),
                };
                !present
            })
            .cloned()
            .collect()
    }

    pub(crate) fn issues(&self) -> Vec<ConfigIssue> {
        self.names
            .iter()
            .filter(|name| !is_valid_name(name))
            .map(|name| ConfigIssue::InvalidEnvironmentName { name: name.clone() })
            .collect()
    }
}

/// Parses a `NAME=VALUE` pair supplied on the command line.
///
/// # Errors
///
/// Returns a message when the `=` separator is missing or the name is empty.
pub fn parse_assignment(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_owned(), value.to_owned())),
        _ => Err(format!("expected NAME=VALUE, got '{input}'")),
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}
