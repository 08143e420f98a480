use alloy::primitives::Address;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accepted-token symbols for a single chain.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TokenBook {
    tokens: BTreeMap<String, Address>,
    chain_id: u64,
}

impl TokenBook {
    pub fn new(chain_id: u64) -> Self {
        Self {
            tokens: BTreeMap::new(),
            chain_id,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Builder-style insert. `None` entries are skipped so that blank
    /// literals never end up as the zero address.
    pub fn with(mut self, symbol: &str, address: Option<Address>) -> Self {
        if let Some(address) = address {
            self.add(symbol, address);
        }
        self
    }

    pub fn add(&mut self, symbol: &str, address: Address) {
        debug!("Token {} -> {} (chain {})", symbol, address, self.chain_id);
        self.tokens.insert(symbol.to_string(), address);
    }

    pub fn get(&self, symbol: &str) -> Option<Address> {
        self.tokens.get(symbol).copied()
    }

    pub fn remove(&mut self, symbol: &str) -> Option<Address> {
        self.tokens.remove(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.tokens.contains_key(symbol)
    }

    /// Reverse lookup, first symbol wins when aliases share an address.
    pub fn symbol_of(&self, address: Address) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(_, a)| **a == address)
            .map(|(s, _)| s.as_str())
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.tokens.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.tokens.iter().map(|(s, a)| (s.as_str(), *a))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
