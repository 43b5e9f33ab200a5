use crate::cache::Set;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// Recency and validity live in the blocks themselves, stamped by the cache's logical clock, so a
/// policy only has to look at the set to choose a victim
pub trait ReplacementPolicy {
    /// Used by the cache to choose which way of a set is overwritten on a miss
    ///
    /// The cache handles any write-back of the victim before installing the new line over it
    ///
    /// # Arguments
    ///
    /// * `set`: The set the missing address maps to
    ///
    /// returns: usize, the way index of the victim within the set
    fn select_victim(&mut self, set: &Set) -> usize;
}

/// Least Recently Used replacement policy
///
/// Invalid ways are always filled first, in way order. Once a set is full, the way with the
/// smallest `last_used` stamp is evicted, with ties going to the lower way index
#[derive(Debug, Default, Copy, Clone)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn select_victim(&mut self, set: &Set) -> usize {
        let ways = set.ways();
        let mut min_value = u64::MAX;
        let mut min_index = 0;
        let mut index = 0;
        while index < ways.len() {
            let block = &ways[index];
            // Cold fill, no need to look any further
            if !block.valid {
                return index;
            }
            // Strictly less, so the first of several equal stamps wins
            if block.last_used < min_value {
                min_value = block.last_used;
                min_index = index;
            }
            index += 1;
        }
        min_index
    }
}
