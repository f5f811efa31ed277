#![no_std]

// Map names and layouts shared between userspace and the eBPF object.
// Keep this crate `no_std` friendly so it can be used from eBPF code.

pub const MAP_HASH: &str = "hash_map";
pub const MAP_LRU_HASH: &str = "lru_hash_map";
pub const MAP_PERCPU_HASH: &str = "percpu_hash_map";
pub const MAP_LRU_PERCPU_HASH: &str = "percpu_lru_hash_map";
pub const MAP_ARRAY: &str = "array_map";
pub const MAP_PERCPU_ARRAY: &str = "percpu_array_map";
pub const MAP_LPM_TRIE: &str = "lpm_trie_map";
pub const MAP_QUEUE: &str = "queue_map";

/// `max_entries` of every map except the trie.
pub const DEFAULT_MAX_ENTRIES: u32 = 10;
/// `max_entries` of the trie. Allocated lazily, see [`LPM_TRIE_FLAGS`].
pub const LPM_TRIE_MAX_ENTRIES: u32 = 255;

/// `BPF_F_NO_PREALLOC`; the kernel refuses LPM tries without it.
pub const LPM_TRIE_FLAGS: u32 = 1;

/// Prefix length, in bits, of an exact-match trie key over a `u32`.
pub const LPM_EXACT_PREFIX_LEN: u32 = u32::BITS;
