//! Alias table with transitive resolution.

use confmap_core::ConfigError;
use std::collections::{HashMap, HashSet};

/// A mapping from declared key to target key.
///
/// Aliases chain: with `a -> b` and `b -> c`, resolving `a` yields `c`.
/// A chain that revisits a key is rejected at resolution time.
///
/// # Example
/// ```ignore
/// let mut aliases = AliasTable::new();
/// aliases.alias("a", "b").alias("b", "set");
/// assert_eq!(aliases.resolve("a")?, "set");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    /// Create an empty alias table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `from` as an alias of `to`, replacing any previous target.
    pub fn alias(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.aliases.insert(from.into(), to.into());
        self
    }

    /// Remove an alias, returning its target.
    pub fn remove(&mut self, from: &str) -> Option<String> {
        self.aliases.remove(from)
    }

    /// The direct target of `key`, without following the chain.
    pub fn target(&self, key: &str) -> Option<&str> {
        self.aliases.get(key).map(String::as_str)
    }

    /// Follow the alias chain for `key` to its terminal key.
    ///
    /// A key without an alias resolves to itself.
    pub fn resolve(&self, key: &str) -> Result<String, ConfigError> {
        let mut current = key;
        let mut visited = HashSet::new();
        let mut chain = vec![key.to_owned()];
        visited.insert(key);

        while let Some(next) = self.target(current) {
            chain.push(next.to_owned());
            if !visited.insert(next) {
                #[cfg(feature = "tracing")]
                tracing::warn!(key, chain = ?chain, "alias cycle");
                return Err(ConfigError::AliasCycle {
                    key: key.to_owned(),
                    chain,
                });
            }
            current = next;
        }

        Ok(current.to_owned())
    }

    /// Iterate over `(from, to)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Get the number of declared aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Check if no aliases are declared.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
