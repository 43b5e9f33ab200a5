use log::trace;
use crate::address::{AddressDecoder, DecodedAddress};
use crate::config::{CacheConfig, ConfigError, Placement, WritePolicy, WORD_SIZE};
use crate::replacement_policies::{LeastRecentlyUsed, ReplacementPolicy};

/// A generic trait for caches driven by a trace
///
/// The sweep only ever uses `Cache<LeastRecentlyUsed>`, but replaying through the trait keeps the
/// driver independent of the replacement policy with no overhead, as it is statically dispatched
pub trait CacheTrait {
    /// Splits an address into its tag, set index, and block offset
    fn decode(&self, address: u64) -> DecodedAddress;

    /// Reads the line holding `address`, returning true on a cache hit, and false otherwise
    ///
    /// On both hits and misses, the implementation must update its statistics and recency
    /// metadata. A miss always installs the line
    fn read(&mut self, address: u64) -> bool;

    /// Writes to the line holding `address`, returning true on a cache hit, and false otherwise
    ///
    /// Misses allocate the line, as for reads
    fn write(&mut self, address: u64) -> bool;

    /// The statistics gathered so far
    fn statistics(&self) -> &Statistics;

    /// Gets the block size used by this cache
    fn get_block_size(&self) -> u64;

    /// Gets the number of lines which have never been filled. Useful for analysing cache
    /// performance or debugging
    fn get_uninitialised_line_count(&self) -> usize;
}

/// Running counters for a single cache
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total_requests: u64,
    pub total_hits: u64,
    /// Whole blocks fetched from memory, one per miss
    pub bytes_to_cache: u64,
    /// Write-through words plus written back dirty blocks
    pub bytes_to_memory: u64,
}

impl Statistics {
    pub fn misses(&self) -> u64 {
        self.total_requests - self.total_hits
    }

    /// The fraction of requests which hit, or 0 if there were no requests
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.total_hits as f64 / self.total_requests as f64
    }
}

/// Metadata for one cache line. No data is stored, only what decides hits and evictions
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Block {
    pub valid: bool,
    pub dirty: bool,
    pub tag: u64,
    /// The cache's logical clock when this line was last touched
    pub last_used: u64,
}

/// Every line a given index may occupy. The number of ways is fixed when the cache is built
#[derive(Debug, Clone)]
pub struct Set {
    ways: Box<[Block]>,
}

impl Set {
    fn new(num_ways: usize) -> Self {
        Self {
            ways: vec![Block::default(); num_ways].into_boxed_slice(),
        }
    }

    pub fn ways(&self) -> &[Block] {
        &self.ways
    }

    /// Finds the way holding a valid copy of `tag`
    pub fn find(&self, tag: u64) -> Option<usize> {
        self.ways.iter().position(|block| block.valid && block.tag == tag)
    }
}

/// A single level cache, parameterised by a replacement policy
///
/// Sets are held in one boxed slice indexed by the decoded set index, and each set in turn holds
/// a boxed slice of ways. Neither ever grows after construction
pub struct Cache<R: ReplacementPolicy = LeastRecentlyUsed> {
    config: CacheConfig,
    decoder: AddressDecoder,
    num_ways: u64,
    num_sets: u64,
    sets: Box<[Set]>,
    replacement_policy: R,
    statistics: Statistics,
    // Logical clock, advanced each time a line is touched
    access_count: u64,
}

impl Cache<LeastRecentlyUsed> {
    /// Creates a cold LRU cache for a configuration
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        Self::with_policy(config, LeastRecentlyUsed)
    }
}

impl<R: ReplacementPolicy> Cache<R> {
    /// Creates a cold cache for a configuration, using the given replacement policy
    ///
    /// # Arguments
    ///
    /// * `config`: The geometry and write policy
    /// * `policy`: The replacement policy used to choose victims on a miss
    ///
    /// returns: Result<Cache<R>, ConfigError>, failing if the geometry can't be built
    pub fn with_policy(config: CacheConfig, policy: R) -> Result<Self, ConfigError> {
        if config.cache_size == 0 {
            return Err(ConfigError::ZeroCacheSize);
        }
        if config.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        let num_blocks = config.cache_size / config.block_size;
        let (num_ways, num_sets) = match config.placement.fixed_ways() {
            Some(ways) => {
                if num_blocks < ways {
                    return Err(ConfigError::TooFewBlocks { num_blocks, num_ways: ways });
                }
                (ways, num_blocks / ways)
            }
            None => {
                if num_blocks == 0 {
                    return Err(ConfigError::TooFewBlocks { num_blocks, num_ways: 1 });
                }
                (num_blocks, 1)
            }
        };
        let fully_associative = config.placement == Placement::FullyAssociative;
        Ok(Self {
            config,
            decoder: AddressDecoder::new(config.block_size, num_sets, fully_associative),
            num_ways,
            num_sets,
            sets: (0..num_sets).map(|_| Set::new(num_ways as usize)).collect(),
            replacement_policy: policy,
            statistics: Statistics::default(),
            access_count: 0,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn num_ways(&self) -> u64 {
        self.num_ways
    }

    pub fn num_sets(&self) -> u64 {
        self.num_sets
    }

    pub fn num_blocks(&self) -> u64 {
        self.num_ways * self.num_sets
    }

    pub fn offset_bits(&self) -> u32 {
        self.decoder.offset_bits()
    }

    pub fn set_bits(&self) -> u32 {
        self.decoder.set_bits()
    }

    pub fn tag_shift(&self) -> u32 {
        self.decoder.tag_shift()
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    /// The set at a decoded index
    pub fn set(&self, index: usize) -> &Set {
        &self.sets[index]
    }

    /// Advances the logical clock and stamps a line with it
    fn touch(&mut self, index: usize, way: usize) -> &mut Block {
        self.access_count += 1;
        let block = &mut self.sets[index].ways[way];
        block.last_used = self.access_count;
        block
    }

    /// Shared hit path, returns the way which hit
    fn lookup(&mut self, tag: u64, index: usize) -> Option<usize> {
        self.statistics.total_requests += 1;
        let way = self.sets[index].find(tag)?;
        self.statistics.total_hits += 1;
        Some(way)
    }

    /// Shared miss path. Fetches the block, writes back a dirty victim if needed, and installs
    /// the new line clean. Returns the way it was installed in
    fn allocate(&mut self, tag: u64, index: usize) -> usize {
        self.statistics.bytes_to_cache += self.config.block_size;
        let way = self.replacement_policy.select_victim(&self.sets[index]);
        let victim = self.sets[index].ways[way];
        if self.config.write_policy == WritePolicy::WriteBack && victim.valid && victim.dirty {
            self.statistics.bytes_to_memory += self.config.block_size;
        }
        trace!(
            "miss on set {index}, tag {tag:#x} placed in way {way} (evicted valid: {}, dirty: {})",
            victim.valid,
            victim.dirty
        );
        let block = self.touch(index, way);
        block.valid = true;
        block.dirty = false;
        block.tag = tag;
        way
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn decode(&self, address: u64) -> DecodedAddress {
        self.decoder.decode(address)
    }

    fn read(&mut self, address: u64) -> bool {
        let tag = self.decoder.tag(address);
        let index = self.decoder.index(address);
        match self.lookup(tag, index) {
            Some(way) => {
                self.touch(index, way);
                true
            }
            None => {
                self.allocate(tag, index);
                false
            }
        }
    }

    fn write(&mut self, address: u64) -> bool {
        let tag = self.decoder.tag(address);
        let index = self.decoder.index(address);
        let (hit, way) = match self.lookup(tag, index) {
            Some(way) => {
                self.touch(index, way);
                (true, way)
            }
            None => (false, self.allocate(tag, index)),
        };
        match self.config.write_policy {
            WritePolicy::WriteBack => self.sets[index].ways[way].dirty = true,
            WritePolicy::WriteThrough => self.statistics.bytes_to_memory += WORD_SIZE,
        }
        hit
    }

    fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    fn get_block_size(&self) -> u64 {
        self.config.block_size
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.sets.iter().flat_map(|set| set.ways.iter()).filter(|block| !block.valid).count()
    }
}
