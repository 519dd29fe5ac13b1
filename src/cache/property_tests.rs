//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check both cache policies against a simple recency model.

use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::cache::{LruCache, ResultCache, TtlCache, TtlCacheConfig};

// == Strategies ==
/// Small key space so gets hit and puts evict
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..12
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: u32 },
    Get { key: u8 },
    Invalidate { key: u8 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

fn build_cache(use_ttl: bool, capacity: usize) -> Box<dyn ResultCache<u8, u32>> {
    if use_ttl {
        let config = TtlCacheConfig::default().with_max_entries(capacity);
        Box::new(TtlCache::new(config).unwrap())
    } else {
        Box::new(LruCache::new(capacity).unwrap())
    }
}

// == Recency Model ==
/// Least recently used at the front.
struct Model {
    capacity: usize,
    order: VecDeque<(u8, u32)>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn take(&mut self, key: u8) -> Option<(u8, u32)> {
        let pos = self.order.iter().position(|(k, _)| *k == key)?;
        self.order.remove(pos)
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        match self.take(key) {
            Some(entry) => {
                self.hits += 1;
                self.order.push_back(entry);
                Some(entry.1)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn put(&mut self, key: u8, value: u32) {
        if self.take(key).is_none() && self.order.len() >= self.capacity {
            self.order.pop_front();
            self.evictions += 1;
        }
        self.order.push_back((key, value));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Both policies agree with the model on every read, never exceed their
    // capacity, and count hits, misses and evictions exactly.
    #[test]
    fn prop_matches_recency_model(
        capacity in 1usize..6,
        use_ttl in any::<bool>(),
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let cache = build_cache(use_ttl, capacity);
        let mut model = Model::new(capacity);

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    cache.insert(key, Arc::new(value));
                    model.put(key, value);
                }
                CacheOp::Get { key } => {
                    let got = cache.get(&key).map(|v| *v);
                    prop_assert_eq!(got, model.get(key));
                }
                CacheOp::Invalidate { key } => {
                    prop_assert_eq!(cache.invalidate(&key), model.take(key).is_some());
                }
            }
            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.len(), model.order.len());
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, model.hits);
        prop_assert_eq!(stats.misses, model.misses);
        prop_assert_eq!(stats.evictions, model.evictions);
        prop_assert_eq!(stats.expirations, 0);
        prop_assert_eq!(stats.total_entries, model.order.len());
    }

    // Hit rate is always within [0, 1] and complements the miss rate.
    #[test]
    fn prop_rates_are_consistent(gets in prop::collection::vec(key_strategy(), 1..60)) {
        let cache = LruCache::new(4).unwrap();
        for key in 0u8..4 {
            cache.put(key, u32::from(key));
        }
        for key in gets {
            cache.get(&key);
        }

        let stats = cache.stats();
        prop_assert!((0.0..=1.0).contains(&stats.hit_rate()));
        prop_assert!((stats.hit_rate() + stats.miss_rate() - 1.0).abs() < 1e-9);
        prop_assert_eq!(stats.request_count(), stats.hits + stats.misses);
    }
}
