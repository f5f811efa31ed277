use std::fmt;

use map_populator_common::{
    DEFAULT_MAX_ENTRIES, LPM_TRIE_MAX_ENTRIES, MAP_ARRAY, MAP_HASH, MAP_LPM_TRIE, MAP_LRU_HASH,
    MAP_LRU_PERCPU_HASH, MAP_PERCPU_ARRAY, MAP_PERCPU_HASH,
};

/// Layout of a map key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyShape {
    /// A bare `u32`.
    Scalar,
    /// `{ prefix_len: u32, data: u32 }`, as the LPM trie expects.
    Prefix,
}

/// Layout of a map value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueShape {
    /// A single `u32`.
    Scalar,
    /// One `u32` per possible CPU.
    PerCpu,
}

/// Map kinds the populator knows how to write.
///
/// Queue and stack maps are left out on purpose: there is no userspace push
/// protocol for them here.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MapKind {
    Hash,
    LruHash,
    PerCpuHash,
    LruPerCpuHash,
    Array,
    PerCpuArray,
    LpmTrie,
}

impl MapKind {
    /// Every kind, in the order they are populated.
    pub const ALL: [MapKind; 7] = [
        MapKind::Hash,
        MapKind::LruHash,
        MapKind::PerCpuHash,
        MapKind::LruPerCpuHash,
        MapKind::Array,
        MapKind::PerCpuArray,
        MapKind::LpmTrie,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MapKind::Hash => "hash",
            MapKind::LruHash => "lru-hash",
            MapKind::PerCpuHash => "percpu-hash",
            MapKind::LruPerCpuHash => "lru-percpu-hash",
            MapKind::Array => "array",
            MapKind::PerCpuArray => "percpu-array",
            MapKind::LpmTrie => "prefix-trie",
        }
    }

    /// Name of the map in the eBPF object.
    pub fn map_name(self) -> &'static str {
        match self {
            MapKind::Hash => MAP_HASH,
            MapKind::LruHash => MAP_LRU_HASH,
            MapKind::PerCpuHash => MAP_PERCPU_HASH,
            MapKind::LruPerCpuHash => MAP_LRU_PERCPU_HASH,
            MapKind::Array => MAP_ARRAY,
            MapKind::PerCpuArray => MAP_PERCPU_ARRAY,
            MapKind::LpmTrie => MAP_LPM_TRIE,
        }
    }

    pub fn key_shape(self) -> KeyShape {
        match self {
            MapKind::LpmTrie => KeyShape::Prefix,
            MapKind::Hash
            | MapKind::LruHash
            | MapKind::PerCpuHash
            | MapKind::LruPerCpuHash
            | MapKind::Array
            | MapKind::PerCpuArray => KeyShape::Scalar,
        }
    }

    pub fn value_shape(self) -> ValueShape {
        match self {
            MapKind::PerCpuHash | MapKind::LruPerCpuHash | MapKind::PerCpuArray => {
                ValueShape::PerCpu
            }
            MapKind::Hash | MapKind::LruHash | MapKind::Array | MapKind::LpmTrie => {
                ValueShape::Scalar
            }
        }
    }

    /// Whether the kernel drops the least recently used entry when full.
    /// Writes behave the same either way.
    pub fn is_evicting(self) -> bool {
        matches!(self, MapKind::LruHash | MapKind::LruPerCpuHash)
    }

    /// `max_entries` the map is declared with in the eBPF object.
    pub fn capacity(self) -> u32 {
        match self {
            MapKind::LpmTrie => LPM_TRIE_MAX_ENTRIES,
            _ => DEFAULT_MAX_ENTRIES,
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
