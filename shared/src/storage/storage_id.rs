use std::{fmt, str::FromStr};

use super::error::StorageIdError;

const DEFAULT_NAMESPACE: &str = "minecraft";

/// Namespaced identifier (`namespace:path`) a Storage is registered and
/// serialized under
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageId {
    full: String,
    separator: usize,
}

impl StorageId {
    /// Parses `namespace:path`; a bare `path` lands in the default namespace
    pub fn parse(input: &str) -> Result<Self, StorageIdError> {
        let (namespace, path) = match input.split_once(':') {
            Some((namespace, path)) => (namespace, path),
            None => (DEFAULT_NAMESPACE, input),
        };
        Self::new(namespace, path)
    }

    pub fn new(namespace: &str, path: &str) -> Result<Self, StorageIdError> {
        if namespace.is_empty() || path.is_empty() {
            return Err(StorageIdError::Empty {
                input: format!("{}:{}", namespace, path),
            });
        }
        if let Some(character) = namespace.chars().find(|c| !valid_namespace_char(*c)) {
            return Err(StorageIdError::InvalidNamespace {
                namespace: namespace.to_string(),
                character,
            });
        }
        if let Some(character) = path.chars().find(|c| !valid_path_char(*c)) {
            return Err(StorageIdError::InvalidPath {
                path: path.to_string(),
                character,
            });
        }

        Ok(Self {
            full: format!("{}:{}", namespace, path),
            separator: namespace.len(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.full[..self.separator]
    }

    pub fn path(&self) -> &str {
        &self.full[self.separator + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }
}

fn valid_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

fn valid_path_char(c: char) -> bool {
    valid_namespace_char(c) || c == '/'
}

impl FromStr for StorageId {
    type Err = StorageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}
