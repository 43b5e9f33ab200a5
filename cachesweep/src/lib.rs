//! # CacheSweep
//!
//! CacheSweep is a library for comparing single level cache configurations against a memory
//! access trace
//!
//! It provides an LRU cache model parameterised by size, block size, placement and write policy,
//! and a sweep driver which replays the same trace against a fresh cache for every configuration,
//! producing one result record each
//!
//! Only hits, misses and traffic are modelled: no data values, timing, or multi-level hierarchy

/// Splits addresses into tag, set index and block offset
pub mod address;

/// Contains the cache implementation, its blocks and sets, and the statistics it gathers
pub mod cache;

/// Contains the cache and sweep configurations, which can be deserialised from JSON
pub mod config;

/// Opens trace files, telling missing and empty files apart from ones with records
pub mod io;

/// Contains the provided replacement policy, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the result record produced for each configuration, and its line format
pub mod result;

/// Contains the driver which runs every configuration against a trace
pub mod sweep;

/// Contains the trace record format and its parser
pub mod trace;

// Generated from the build.rs, private
mod hex {
    include!(concat!(env!("OUT_DIR"), "/hex.rs"));
}
#[cfg(test)]
mod test;

/// Contains utilities for finding trace files
pub mod util;
