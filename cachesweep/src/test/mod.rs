mod cache_tests;

use crate::config::{CacheConfig, Placement, WritePolicy};
use crate::trace::{Access, Operation};

pub fn config(cache_size: u64, block_size: u64, placement: Placement, write_policy: WritePolicy) -> CacheConfig {
    CacheConfig {
        cache_size,
        block_size,
        placement,
        write_policy,
    }
}

pub fn read(address: u64) -> Operation {
    Operation { access: Access::Read, address }
}

pub fn write(address: u64) -> Operation {
    Operation { access: Access::Write, address }
}

/// A mixed trace with loops, strided sweeps and some scattered accesses, roughly a third writes
pub fn synthetic_trace(length: usize) -> Vec<Operation> {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    (0..length as u64)
        .map(|i| {
            // xorshift, so the trace is the same every run
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let address = match i % 4 {
                0 => (i * 4) % 4096,
                1 => 0x8000 + (i % 64) * 8,
                2 => state % 0x20000,
                _ => (i * 260) % 0x10000,
            };
            if state % 3 == 0 { write(address) } else { read(address) }
        })
        .collect()
}

/// Creates a unique path in the temporary directory for a test
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("cachesweep-test-{}-{name}", std::process::id()))
}
