use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// The cache sizes, in bytes, swept by default: 1K, 2K, 8K and 64K
pub const DEFAULT_CACHE_SIZES: [u64; 4] = [1024, 2048, 8192, 65536];

/// The block sizes, in bytes, swept by default
pub const DEFAULT_BLOCK_SIZES: [u64; 4] = [4, 8, 32, 256];

/// Bytes sent to memory by a single write-through store
pub const WORD_SIZE: u64 = 4;

/// How blocks are placed into the cache - direct mapped, 2way, 4way, or fully associative
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    #[serde(alias = "direct", alias = "dm", alias = "DM")]
    DirectMapped,
    #[serde(alias = "2way", alias = "2w", alias = "2W")]
    TwoWay,
    #[serde(alias = "4way", alias = "4w", alias = "4W")]
    FourWay,
    #[serde(alias = "full", alias = "fa", alias = "FA")]
    FullyAssociative,
}

impl Placement {
    /// Every placement, in sweep order
    pub const ALL: [Placement; 4] = [
        Placement::DirectMapped,
        Placement::TwoWay,
        Placement::FourWay,
        Placement::FullyAssociative,
    ];

    /// The code used for this placement in result records
    pub fn code(&self) -> &'static str {
        match self {
            Placement::DirectMapped => "DM",
            Placement::TwoWay => "2W",
            Placement::FourWay => "4W",
            Placement::FullyAssociative => "FA",
        }
    }

    /// The number of ways per set, or None if this depends on the cache geometry
    pub fn fixed_ways(&self) -> Option<u64> {
        match self {
            Placement::DirectMapped => Some(1),
            Placement::TwoWay => Some(2),
            Placement::FourWay => Some(4),
            Placement::FullyAssociative => None,
        }
    }
}

impl FromStr for Placement {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DM" => Ok(Placement::DirectMapped),
            "2W" => Ok(Placement::TwoWay),
            "4W" => Ok(Placement::FourWay),
            "FA" => Ok(Placement::FullyAssociative),
            _ => Err(ConfigError::UnknownPlacement(s.to_string())),
        }
    }
}

/// When writes reach memory - on eviction of a dirty line, or immediately
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WritePolicy {
    #[serde(alias = "wb", alias = "WB")]
    WriteBack,
    #[serde(alias = "wt", alias = "WT")]
    WriteThrough,
}

impl WritePolicy {
    /// Every write policy, in sweep order
    pub const ALL: [WritePolicy; 2] = [WritePolicy::WriteBack, WritePolicy::WriteThrough];

    /// The code used for this policy in result records
    pub fn code(&self) -> &'static str {
        match self {
            WritePolicy::WriteBack => "WB",
            WritePolicy::WriteThrough => "WT",
        }
    }
}

impl FromStr for WritePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WB" => Ok(WritePolicy::WriteBack),
            "WT" => Ok(WritePolicy::WriteThrough),
            _ => Err(ConfigError::UnknownWritePolicy(s.to_string())),
        }
    }
}

/// A configuration for a single cache
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub cache_size: u64,
    pub block_size: u64,
    pub placement: Placement,
    pub write_policy: WritePolicy,
}

impl Display for CacheConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.cache_size, self.block_size, self.placement.code(), self.write_policy.code())
    }
}

/// The set of values swept over. Every combination of the four lists is simulated, with cache
/// size varying slowest and write policy fastest
///
/// Missing fields fall back to the default sweep, so `{}` is the full 128 configuration sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_cache_sizes")]
    pub cache_sizes: Vec<u64>,
    #[serde(default = "default_block_sizes")]
    pub block_sizes: Vec<u64>,
    #[serde(default = "default_placements")]
    pub placements: Vec<Placement>,
    #[serde(default = "default_write_policies")]
    pub write_policies: Vec<WritePolicy>,
}

impl SweepConfig {
    /// Enumerates every configuration in sweep order
    pub fn configurations(&self) -> impl Iterator<Item = CacheConfig> + '_ {
        self.cache_sizes.iter().flat_map(move |&cache_size| {
            self.block_sizes.iter().flat_map(move |&block_size| {
                self.placements.iter().flat_map(move |&placement| {
                    self.write_policies.iter().map(move |&write_policy| CacheConfig {
                        cache_size,
                        block_size,
                        placement,
                        write_policy,
                    })
                })
            })
        })
    }

    /// The number of configurations the sweep enumerates, including any which will be skipped
    pub fn len(&self) -> usize {
        self.cache_sizes.len() * self.block_sizes.len() * self.placements.len() * self.write_policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            cache_sizes: default_cache_sizes(),
            block_sizes: default_block_sizes(),
            placements: default_placements(),
            write_policies: default_write_policies(),
        }
    }
}

fn default_cache_sizes() -> Vec<u64> {
    DEFAULT_CACHE_SIZES.to_vec()
}

fn default_block_sizes() -> Vec<u64> {
    DEFAULT_BLOCK_SIZES.to_vec()
}

fn default_placements() -> Vec<Placement> {
    Placement::ALL.to_vec()
}

fn default_write_policies() -> Vec<WritePolicy> {
    WritePolicy::ALL.to_vec()
}

/// Reasons a cache can't be built from a configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroCacheSize,
    ZeroBlockSize,
    /// The cache holds fewer blocks than a single set needs
    TooFewBlocks { num_blocks: u64, num_ways: u64 },
    UnknownPlacement(String),
    UnknownWritePolicy(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroCacheSize => write!(f, "Cache size must be greater than zero"),
            ConfigError::ZeroBlockSize => write!(f, "Block size must be greater than zero"),
            ConfigError::TooFewBlocks { num_blocks, num_ways } => {
                write!(f, "A cache of {num_blocks} blocks can't hold a single {num_ways} way set")
            }
            ConfigError::UnknownPlacement(code) => write!(f, "Unknown placement type '{code}'"),
            ConfigError::UnknownWritePolicy(code) => write!(f, "Unknown write policy '{code}'"),
        }
    }
}

impl Error for ConfigError {}
