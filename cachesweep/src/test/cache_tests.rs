use crate::cache::{Cache, CacheTrait, Set};
use crate::config::{ConfigError, Placement, SweepConfig, WritePolicy};
use crate::replacement_policies::{LeastRecentlyUsed, ReplacementPolicy};
use crate::sweep::replay;
use crate::test::{config, read, synthetic_trace, write};
use Placement::*;
use WritePolicy::*;

fn tags(cache: &Cache, index: usize) -> Vec<Option<u64>> {
    cache.set(index).ways().iter().map(|b| b.valid.then_some(b.tag)).collect()
}

#[test]
fn geometry_matches_cache_size() {
    for c in SweepConfig::default().configurations() {
        let cache = Cache::new(c).unwrap();
        if c.placement == FullyAssociative {
            assert_eq!(cache.num_ways(), c.cache_size / c.block_size, "{c}");
            assert_eq!(cache.num_sets(), 1, "{c}");
            assert_eq!(cache.set_bits(), 0, "{c}");
        } else {
            assert_eq!(cache.num_sets() * cache.num_ways() * c.block_size, c.cache_size, "{c}");
        }
        assert_eq!(cache.num_blocks(), c.cache_size / c.block_size);
        assert_eq!(1u64 << cache.offset_bits(), c.block_size);
        assert_eq!(cache.tag_shift(), cache.offset_bits() + cache.set_bits());
        assert_eq!(cache.get_uninitialised_line_count() as u64, cache.num_blocks());
    }
}

#[test]
fn direct_mapped_derived_fields() {
    let cache = Cache::new(config(32, 4, DirectMapped, WriteBack)).unwrap();
    assert_eq!(cache.num_sets(), 8);
    assert_eq!(cache.num_ways(), 1);
    assert_eq!(cache.offset_bits(), 2);
    assert_eq!(cache.set_bits(), 3);
    assert_eq!(cache.tag_shift(), 5);
}

#[test]
fn fully_associative_ignores_index_bits() {
    let cache = Cache::new(config(1024, 8, FullyAssociative, WriteBack)).unwrap();
    assert_eq!(cache.num_ways(), 128);
    let decoded = cache.decode(0xFFF8);
    assert_eq!(decoded.index, 0);
    assert_eq!(decoded.tag, 0xFFF8 >> 3);
}

#[test]
fn conflicting_tags_evict_each_other() {
    let mut cache = Cache::new(config(32, 4, DirectMapped, WriteBack)).unwrap();
    assert!(!cache.read(0x00));
    assert!(!cache.read(0x20));
    assert_eq!(tags(&cache, 0), vec![Some(1)]);
    assert!(!cache.read(0x00));
    assert_eq!(cache.statistics().total_requests, 3);
    assert_eq!(cache.statistics().total_hits, 0);
}

#[test]
fn hit_after_install() {
    let mut cache = Cache::new(config(32, 4, DirectMapped, WriteBack)).unwrap();
    assert!(!cache.read(0x00));
    assert!(cache.read(0x00));
    let stats = cache.statistics();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.total_hits, 1);
    assert_eq!(stats.bytes_to_cache, 4);
    assert_eq!(stats.bytes_to_memory, 0);
    assert_eq!(cache.access_count(), 2);
}

#[test]
fn same_block_different_offset_hits() {
    let mut cache = Cache::new(config(32, 4, DirectMapped, WriteThrough)).unwrap();
    assert!(!cache.read(0x40));
    assert!(cache.read(0x43));
    assert!(!cache.read(0x44));
}

#[test]
fn dirty_victim_is_written_back() {
    let mut cache = Cache::new(config(8, 4, DirectMapped, WriteBack)).unwrap();
    assert_eq!(cache.num_sets(), 2);
    assert!(!cache.write(0x00));
    assert_eq!(cache.statistics().bytes_to_memory, 0);
    assert!(cache.set(0).ways()[0].dirty);
    assert!(!cache.write(0x08));
    let stats = cache.statistics();
    assert_eq!(stats.bytes_to_memory, 4);
    assert_eq!(stats.bytes_to_cache, 8);
    assert!(cache.set(0).ways()[0].dirty);
}

#[test]
fn clean_victim_is_not_written_back() {
    let mut cache = Cache::new(config(8, 4, DirectMapped, WriteBack)).unwrap();
    cache.read(0x00);
    cache.read(0x08);
    assert_eq!(cache.statistics().bytes_to_memory, 0);
    assert!(!cache.set(0).ways()[0].dirty);
}

#[test]
fn write_back_hit_marks_line_dirty() {
    let mut cache = Cache::new(config(16, 4, TwoWay, WriteBack)).unwrap();
    cache.read(0x00);
    assert!(cache.write(0x00));
    assert!(cache.set(0).ways()[0].dirty);
    assert_eq!(cache.statistics().bytes_to_memory, 0);
    // Fill the other way, then push the dirty line out
    cache.read(0x08);
    cache.read(0x20);
    assert_eq!(cache.statistics().bytes_to_memory, 4);
    assert_eq!(tags(&cache, 0), vec![Some(4), Some(1)]);
}

#[test]
fn write_through_sends_a_word_per_write() {
    let mut cache = Cache::new(config(8, 4, DirectMapped, WriteThrough)).unwrap();
    assert!(!cache.write(0x00));
    assert!(cache.write(0x00));
    assert!(!cache.write(0x08));
    cache.read(0x00);
    let stats = cache.statistics();
    assert_eq!(stats.bytes_to_memory, 12);
    assert_eq!(stats.bytes_to_cache, 12);
    assert!(cache.set(0).ways().iter().all(|b| !b.dirty));
}

#[test]
fn write_through_traffic_ignores_hits_and_misses() {
    let trace = synthetic_trace(3000);
    let writes = trace.iter().filter(|op| op.access == crate::trace::Access::Write).count() as u64;
    for placement in Placement::ALL {
        let mut cache = Cache::new(config(2048, 32, placement, WriteThrough)).unwrap();
        replay(&mut cache, &trace);
        assert_eq!(cache.statistics().bytes_to_memory, 4 * writes);
    }
}

#[test]
fn least_recently_used_way_is_evicted() {
    // 2 sets of 2 ways, 0x00, 0x08, 0x10 and 0x18 all map to set 0
    let mut cache = Cache::new(config(16, 4, TwoWay, WriteBack)).unwrap();
    let trace = [read(0x00), read(0x08), read(0x00), read(0x10)];
    replay(&mut cache, &trace);
    assert_eq!(tags(&cache, 0), vec![Some(0), Some(2)]);
    assert!(cache.read(0x00));
    assert!(!cache.read(0x08));
    assert_eq!(tags(&cache, 0), vec![Some(0), Some(1)]);
    assert_eq!(cache.statistics().total_requests, 6);
    assert_eq!(cache.statistics().total_hits, 2);
    assert_eq!(tags(&cache, 1), vec![None, None]);
}

#[test]
fn invalid_ways_fill_in_order() {
    let mut cache = Cache::new(config(64, 4, FullyAssociative, WriteBack)).unwrap();
    cache.read(0x100);
    cache.read(0x200);
    cache.read(0x300);
    let filled = tags(&cache, 0);
    assert_eq!(&filled[..4], &[Some(0x40), Some(0x80), Some(0xC0), None]);
    assert_eq!(cache.get_uninitialised_line_count(), 13);
}

#[test]
fn lru_prefers_first_invalid_then_oldest() {
    let mut cache = Cache::new(config(16, 4, FourWay, WriteBack)).unwrap();
    let mut policy = LeastRecentlyUsed;
    assert_eq!(policy.select_victim(cache.set(0)), 0);
    cache.read(0x00);
    cache.read(0x04);
    assert_eq!(policy.select_victim(cache.set(0)), 2);
    cache.read(0x08);
    cache.read(0x0C);
    cache.read(0x00);
    assert_eq!(policy.select_victim(cache.set(0)), 1);
}

#[test]
fn first_access_is_always_a_miss() {
    for c in SweepConfig::default().configurations() {
        let mut cache = Cache::new(c).unwrap();
        assert!(!cache.read(0xDEAD_BEEF), "{c}");
        let mut cache = Cache::new(c).unwrap();
        assert!(!cache.write(0), "{c}");
    }
}

#[test]
fn no_duplicate_tags_within_a_set() {
    let trace = synthetic_trace(5000);
    for placement in Placement::ALL {
        let mut cache = Cache::new(config(1024, 8, placement, WriteBack)).unwrap();
        replay(&mut cache, &trace);
        for index in 0..cache.num_sets() as usize {
            let mut resident: Vec<u64> = cache.set(index).ways().iter().filter(|b| b.valid).map(|b| b.tag).collect();
            let count = resident.len();
            resident.sort_unstable();
            resident.dedup();
            assert_eq!(resident.len(), count);
        }
    }
}

#[test]
fn clock_advances_once_per_request() {
    let trace = synthetic_trace(1000);
    let mut cache = Cache::new(config(1024, 32, FourWay, WriteThrough)).unwrap();
    replay(&mut cache, &trace);
    assert_eq!(cache.access_count(), 1000);
    assert_eq!(cache.statistics().total_requests, 1000);
}

#[test]
fn hit_rate_of_empty_cache_is_zero() {
    let cache = Cache::new(config(1024, 4, DirectMapped, WriteBack)).unwrap();
    assert_eq!(cache.statistics().hit_rate(), 0.0);
}

#[test]
fn invalid_geometry_is_rejected() {
    assert_eq!(Cache::new(config(0, 4, DirectMapped, WriteBack)).err(), Some(ConfigError::ZeroCacheSize));
    assert_eq!(Cache::new(config(1024, 0, TwoWay, WriteThrough)).err(), Some(ConfigError::ZeroBlockSize));
    assert_eq!(
        Cache::new(config(8, 4, FourWay, WriteBack)).err(),
        Some(ConfigError::TooFewBlocks { num_blocks: 2, num_ways: 4 })
    );
    assert_eq!(Cache::new(config(2, 4, FullyAssociative, WriteBack)).err(), Some(ConfigError::TooFewBlocks { num_blocks: 0, num_ways: 1 }));
    // Any block count works when there is only one set
    assert_eq!(Cache::new(config(12, 4, FullyAssociative, WriteBack)).unwrap().num_ways(), 3);
}

#[test]
fn uneven_geometries_are_built() {
    let cache = Cache::new(config(96, 4, TwoWay, WriteBack)).unwrap();
    assert_eq!(cache.num_sets(), 12);
    assert_eq!(cache.set_bits(), 3);
    assert_eq!(cache.get_uninitialised_line_count(), 24);

    let cache = Cache::new(config(1024, 12, DirectMapped, WriteBack)).unwrap();
    assert_eq!(cache.num_blocks(), 85);
    assert_eq!(cache.offset_bits(), 3);
    assert_eq!(cache.set_bits(), 6);
    assert_eq!(cache.decode(0x1F).offset, 11);

    // 3 sets index with a single bit, so 0x00 and 0x08 share set 0
    let mut cache = Cache::new(config(12, 4, DirectMapped, WriteBack)).unwrap();
    assert_eq!((cache.num_sets(), cache.set_bits(), cache.offset_bits()), (3, 1, 2));
    replay(&mut cache, &[read(0x00), read(0x08), read(0x00)]);
    assert_eq!(cache.statistics().total_requests, 3);
    assert_eq!(cache.statistics().total_hits, 0);
    assert_eq!(cache.get_uninitialised_line_count(), 2);
}

/// Always evicts the last way, even when others are empty
struct LastWay;

impl ReplacementPolicy for LastWay {
    fn select_victim(&mut self, set: &Set) -> usize {
        set.ways().len() - 1
    }
}

#[test]
fn custom_replacement_policy() {
    let mut cache = Cache::with_policy(config(16, 4, FourWay, WriteBack), LastWay).unwrap();
    cache.read(0x00);
    cache.read(0x04);
    assert!(!cache.read(0x00));
    assert_eq!(cache.get_uninitialised_line_count(), 3);
    assert_eq!(cache.statistics().total_hits, 0);
    assert_eq!(cache.get_block_size(), 4);
}

#[test]
fn write_then_read_sequence() {
    let mut cache = Cache::new(config(32, 4, DirectMapped, WriteBack)).unwrap();
    let trace = [write(0x00), read(0x00), write(0x20), read(0x00)];
    replay(&mut cache, &trace);
    let stats = cache.statistics();
    assert_eq!(stats.total_hits, 1);
    assert_eq!(stats.bytes_to_cache, 12);
    // 0x00 was dirty when 0x20 evicted it, 0x20 was dirty when 0x00 came back
    assert_eq!(stats.bytes_to_memory, 8);
}
