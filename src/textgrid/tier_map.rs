/*!
 * Ordered mapping from tier name to tier.
 *
 * Tier order is part of the document: it is the order tiers are written in.
 * Storage is a vector in insertion order plus a name to index lookup.
 */

use std::collections::HashMap;

use super::tier::Tier;
use crate::errors::{Result, TextgridError};

#[derive(Debug, Clone, Default)]
pub struct TierMap {
    tiers: Vec<Tier>,
    index: HashMap<String, usize>,
}

impl TierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Tier> {
        self.index.get(name).map(|&i| &self.tiers[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Names in tier order
    pub fn names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tier> {
        self.tiers.iter()
    }

    /// Appends a tier; its name must be new
    pub fn push(&mut self, tier: Tier) -> Result<()> {
        let position = self.tiers.len();
        self.insert_at(position, tier)
    }

    /// Inserts a tier at `position`, shifting later tiers back
    pub fn insert_at(&mut self, position: usize, tier: Tier) -> Result<()> {
        if self.contains(tier.name()) {
            return Err(TextgridError::DuplicateTierName(tier.name().to_string()));
        }
        let position = position.min(self.tiers.len());
        self.tiers.insert(position, tier);
        self.reindex();
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Tier> {
        let position = self.position(name)?;
        let tier = self.tiers.remove(position);
        self.reindex();
        Some(tier)
    }

    /// Puts `tier` in the slot of `name`; the new name may differ but must not clash
    pub fn replace(&mut self, name: &str, tier: Tier) -> Result<Tier> {
        let position = self.position(name).ok_or_else(|| TextgridError::TierNotFound(name.to_string()))?;
        if tier.name() != name && self.contains(tier.name()) {
            return Err(TextgridError::DuplicateTierName(tier.name().to_string()));
        }
        let old = std::mem::replace(&mut self.tiers[position], tier);
        self.reindex();
        Ok(old)
    }

    fn reindex(&mut self) {
        self.index = self.tiers.iter().enumerate().map(|(i, t)| (t.name().to_string(), i)).collect();
    }
}

impl PartialEq for TierMap {
    fn eq(&self, other: &Self) -> bool {
        self.tiers == other.tiers
    }
}

impl<'a> IntoIterator for &'a TierMap {
    type Item = &'a Tier;
    type IntoIter = std::slice::Iter<'a, Tier>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiers.iter()
    }
}

impl IntoIterator for TierMap {
    type Item = Tier;
    type IntoIter = std::vec::IntoIter<Tier>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiers.into_iter()
    }
}
