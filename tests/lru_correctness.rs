#![allow(clippy::unwrap_used, missing_docs)]

use std::num::NonZeroUsize;

use nfs_handle_cache::cache::eviction::lru::LruMap;

fn lru(capacity: usize) -> LruMap<u64, &'static str> {
    LruMap::new(NonZeroUsize::new(capacity).unwrap())
}

fn keys(map: &LruMap<u64, &'static str>) -> Vec<u64> {
    map.iter().map(|(k, _)| *k).collect()
}

#[test]
fn evicts_least_recently_inserted() {
    let mut map = lru(2);
    assert!(map.insert(1, "one").is_none());
    assert!(map.insert(2, "two").is_none());

    let evicted = map.insert(3, "three");
    assert_eq!(evicted, Some((1, "one")), "key 1 should be evicted first");
    assert_eq!(keys(&map), vec![2, 3]);
}

#[test]
fn get_moves_key_to_back() {
    let mut map = lru(3);
    map.insert(1, "one");
    map.insert(2, "two");
    map.insert(3, "three");

    assert_eq!(map.get(&1), Some(&"one"));
    assert_eq!(keys(&map), vec![2, 3, 1]);

    let evicted = map.insert(4, "four");
    assert_eq!(
        evicted,
        Some((2, "two")),
        "key 2 should be evicted since key 1 was accessed"
    );
}

#[test]
fn peek_does_not_affect_order() {
    let mut map = lru(2);
    map.insert(1, "one");
    map.insert(2, "two");

    assert_eq!(map.peek(&1), Some(&"one"));
    assert_eq!(map.insert(3, "three"), Some((1, "one")));
}

#[test]
fn peek_mut_updates_in_place_without_refreshing() {
    let mut map = lru(2);
    map.insert(1, "one");
    map.insert(2, "two");

    *map.peek_mut(&1).unwrap() = "uno";
    assert_eq!(keys(&map), vec![1, 2]);
    assert_eq!(map.peek(&1), Some(&"uno"));
}

#[test]
fn overwrite_refreshes_and_never_evicts() {
    let mut map = lru(2);
    map.insert(1, "one");
    map.insert(2, "two");

    assert!(map.insert(1, "uno").is_none());
    assert_eq!(map.len(), 2);
    assert_eq!(keys(&map), vec![2, 1]);
}

#[test]
fn touch_missing_key_is_false() {
    let mut map = lru(1);
    assert!(!map.touch(&7));
    assert!(map.get(&7).is_none());
}

#[test]
fn remove_frees_capacity() {
    let mut map = lru(2);
    map.insert(1, "one");
    map.insert(2, "two");

    assert_eq!(map.remove(&1), Some("one"));
    assert!(map.insert(3, "three").is_none());
    assert_eq!(keys(&map), vec![2, 3]);
}

#[test]
fn never_exceeds_capacity() {
    let mut map = lru(5);
    for i in 0u64..100 {
        map.insert(i, "v");
        assert!(map.len() <= map.capacity());
    }
    assert_eq!(keys(&map), vec![95, 96, 97, 98, 99]);
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct OpaqueKey(u64);

#[test]
fn touch_reorders_keys_that_cannot_be_cloned() {
    let mut map = LruMap::new(NonZeroUsize::new(2).unwrap());
    map.insert(OpaqueKey(1), "one");
    map.insert(OpaqueKey(2), "two");

    assert!(map.touch(&OpaqueKey(1)));
    assert_eq!(map.insert(OpaqueKey(3), "three"), Some((OpaqueKey(2), "two")));
    assert_eq!(map.get(&OpaqueKey(1)), Some(&"one"));
}
