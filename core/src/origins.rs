//! # Origin Ledger
//!
//! Tracks, per configuration key, the ordered list of sources that
//! contributed or overrode its value. The ledger is rebuilt from empty on
//! every load cycle; a later source overwriting an earlier one's value
//! appends to the chain rather than replacing it, so the full override
//! history stays visible.

use std::collections::BTreeMap;

/// Per-key chains of source identifiers, in chronological overlay order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginLedger {
    chains: BTreeMap<String, Vec<String>>,
}

impl OriginLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `origin` to the chain of every listed key.
    pub fn record<I, S>(&mut self, keys: I, origin: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.chains
                .entry(key.as_ref().to_string())
                .or_default()
                .push(origin.to_string());
        }
    }

    /// Prepends `origin` to the chain of every listed key.
    ///
    /// Defaults are conceptually applied before all other sources, so their
    /// origin goes to the front of the chain even though defaulting runs
    /// after the overlay.
    pub fn record_defaults<I, S>(&mut self, keys: I, origin: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let chain = self.chains.entry(key.as_ref().to_string()).or_default();
            chain.insert(0, origin.to_string());
        }
    }

    /// Folds a plugin's own per-load origin bookkeeping into the ledger.
    ///
    /// If a key's existing chain already ends with the incoming chain
    /// (position by position), the plugin reported the same chain again and
    /// nothing is appended; otherwise the incoming chain is appended.
    pub fn merge(&mut self, incoming: &BTreeMap<String, Vec<String>>) {
        for (key, chain) in incoming {
            let existing = self.chains.entry(key.clone()).or_default();
            if !existing.ends_with(chain) {
                existing.extend(chain.iter().cloned());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.chains.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.chains
            .iter()
            .map(|(key, chain)| (key.as_str(), chain.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Keeps only the chains whose key satisfies the predicate.
    ///
    /// Used after validation to drop chains for keys that did not make it
    /// into the snapshot, keeping the ledger and snapshot key sets aligned.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.chains.retain(|key, _| keep(key));
    }
}
