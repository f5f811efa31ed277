#![no_std]
#![no_main]

use aya_ebpf::macros::map;
use aya_ebpf::maps::{
    Array, HashMap, LpmTrie, LruHashMap, LruPerCpuHashMap, PerCpuArray, PerCpuHashMap, Queue,
};
use map_populator_common::{DEFAULT_MAX_ENTRIES, LPM_TRIE_FLAGS, LPM_TRIE_MAX_ENTRIES};

// Userspace fills every map below once at startup, except the queue.

#[map(name = "hash_map")]
static HASH_MAP: HashMap<u32, u32> = HashMap::<u32, u32>::with_max_entries(DEFAULT_MAX_ENTRIES, 0);

#[map(name = "lru_hash_map")]
static LRU_HASH_MAP: LruHashMap<u32, u32> =
    LruHashMap::<u32, u32>::with_max_entries(DEFAULT_MAX_ENTRIES, 0);

#[map(name = "percpu_hash_map")]
static PERCPU_HASH_MAP: PerCpuHashMap<u32, u32> =
    PerCpuHashMap::<u32, u32>::with_max_entries(DEFAULT_MAX_ENTRIES, 0);

#[map(name = "percpu_lru_hash_map")]
static PERCPU_LRU_HASH_MAP: LruPerCpuHashMap<u32, u32> =
    LruPerCpuHashMap::<u32, u32>::with_max_entries(DEFAULT_MAX_ENTRIES, 0);

#[map(name = "array_map")]
static ARRAY_MAP: Array<u32> = Array::<u32>::with_max_entries(DEFAULT_MAX_ENTRIES, 0);

#[map(name = "percpu_array_map")]
static PERCPU_ARRAY_MAP: PerCpuArray<u32> =
    PerCpuArray::<u32>::with_max_entries(DEFAULT_MAX_ENTRIES, 0);

// Keys are `{ prefix_len: u32, data: u32 }`.
#[map(name = "lpm_trie_map")]
static LPM_TRIE_MAP: LpmTrie<u32, u32> =
    LpmTrie::<u32, u32>::with_max_entries(LPM_TRIE_MAX_ENTRIES, LPM_TRIE_FLAGS);

#[map(name = "queue_map")]
static QUEUE_MAP: Queue<u32> = Queue::<u32>::with_max_entries(DEFAULT_MAX_ENTRIES, 0);

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}
