use std::fmt::{Display, Formatter};
use std::io::Write;
use serde::Serialize;
use crate::cache::{Cache, CacheTrait, Statistics};
use crate::config::{CacheConfig, Placement, WritePolicy};
use crate::replacement_policies::ReplacementPolicy;

/// The outcome of replaying a trace against one configuration
///
/// Displays as the ten field record line: cache size, block size, placement, ways, write policy,
/// requests, hits, hit rate, bytes to cache, bytes to memory
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub cache_size: u64,
    pub block_size: u64,
    pub placement: Placement,
    pub num_ways: u64,
    pub write_policy: WritePolicy,
    pub total_requests: u64,
    pub total_hits: u64,
    pub hit_rate: f64,
    pub bytes_to_cache: u64,
    pub bytes_to_memory: u64,
}

impl ResultRecord {
    pub fn new(config: &CacheConfig, num_ways: u64, statistics: &Statistics) -> Self {
        Self {
            cache_size: config.cache_size,
            block_size: config.block_size,
            placement: config.placement,
            num_ways,
            write_policy: config.write_policy,
            total_requests: statistics.total_requests,
            total_hits: statistics.total_hits,
            hit_rate: statistics.hit_rate(),
            bytes_to_cache: statistics.bytes_to_cache,
            bytes_to_memory: statistics.bytes_to_memory,
        }
    }
}

impl<R: ReplacementPolicy> From<&Cache<R>> for ResultRecord {
    fn from(cache: &Cache<R>) -> Self {
        Self::new(cache.config(), cache.num_ways(), cache.statistics())
    }
}

impl Display for ResultRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {:.2} {} {}",
            self.cache_size,
            self.block_size,
            self.placement.code(),
            self.num_ways,
            self.write_policy.code(),
            self.total_requests,
            self.total_hits,
            self.hit_rate,
            self.bytes_to_cache,
            self.bytes_to_memory,
        )
    }
}

/// Writes one newline terminated record line per result, in order
pub fn write_records<'a, W: Write>(records: impl IntoIterator<Item = &'a ResultRecord>, mut writer: W) -> std::io::Result<()> {
    for record in records {
        writeln!(writer, "{record}")?;
    }
    writer.flush()
}
