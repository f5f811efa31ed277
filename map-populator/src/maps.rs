use anyhow::{Context, Result};
use aya::Ebpf;
use aya::maps::{
    Array, HashMap, LpmTrie, MapData, PerCpuArray, PerCpuHashMap, PerCpuValues, lpm_trie::Key,
};
use log::debug;

use crate::encode::{EncodedKey, EncodedValue, PopulationEntry};
use crate::kind::MapKind;
use crate::populate::{MapSet, MapWriter, WriteError};

/// Owned aya handle for one map. The fd closes on drop.
pub enum AyaMap {
    /// Plain and LRU hash maps share one userspace type.
    Hash(HashMap<MapData, u32, u32>),
    /// Plain and LRU per-CPU hash maps share one userspace type.
    PerCpuHash(PerCpuHashMap<MapData, u32, u32>),
    Array(Array<MapData, u32>),
    PerCpuArray(PerCpuArray<MapData, u32>),
    LpmTrie(LpmTrie<MapData, u32, u32>),
}

impl AyaMap {
    /// Moves `kind`'s map out of `bpf` and checks it has the expected type.
    pub fn take(bpf: &mut Ebpf, kind: MapKind) -> Result<Self> {
        let name = kind.map_name();
        let map = bpf
            .take_map(name)
            .with_context(|| format!("map {name} not found"))?;
        let handle = match kind {
            MapKind::Hash | MapKind::LruHash => AyaMap::Hash(
                HashMap::try_from(map).with_context(|| format!("{name} has unexpected type"))?,
            ),
            MapKind::PerCpuHash | MapKind::LruPerCpuHash => AyaMap::PerCpuHash(
                PerCpuHashMap::try_from(map)
                    .with_context(|| format!("{name} has unexpected type"))?,
            ),
            MapKind::Array => AyaMap::Array(
                Array::try_from(map).with_context(|| format!("{name} has unexpected type"))?,
            ),
            MapKind::PerCpuArray => AyaMap::PerCpuArray(
                PerCpuArray::try_from(map)
                    .with_context(|| format!("{name} has unexpected type"))?,
            ),
            MapKind::LpmTrie => AyaMap::LpmTrie(
                LpmTrie::try_from(map).with_context(|| format!("{name} has unexpected type"))?,
            ),
        };
        debug!("took {name} as {kind}");
        Ok(handle)
    }

    fn type_name(&self) -> &'static str {
        match self {
            AyaMap::Hash(_) => "hash",
            AyaMap::PerCpuHash(_) => "per-cpu hash",
            AyaMap::Array(_) => "array",
            AyaMap::PerCpuArray(_) => "per-cpu array",
            AyaMap::LpmTrie(_) => "lpm trie",
        }
    }
}

impl MapWriter for AyaMap {
    fn put(&mut self, entry: PopulationEntry) -> Result<(), WriteError> {
        let PopulationEntry { key, value, .. } = entry;
        match (self, key, value) {
            (AyaMap::Hash(map), EncodedKey::Index(k), EncodedValue::Scalar(v)) => {
                map.insert(k, v, 0)?
            }
            (AyaMap::PerCpuHash(map), EncodedKey::Index(k), EncodedValue::PerCpu(values)) => {
                map.insert(k, per_cpu_values(values)?, 0)?
            }
            (AyaMap::Array(map), EncodedKey::Index(k), EncodedValue::Scalar(v)) => {
                map.set(k, v, 0)?
            }
            (AyaMap::PerCpuArray(map), EncodedKey::Index(k), EncodedValue::PerCpu(values)) => {
                map.set(k, per_cpu_values(values)?, 0)?
            }
            (
                AyaMap::LpmTrie(map),
                EncodedKey::Prefix { prefix_len, data },
                EncodedValue::Scalar(v),
            ) => map.insert(&Key::new(prefix_len, data), v, 0)?,
            (map, key, value) => {
                return Err(WriteError::ShapeMismatch {
                    map: map.type_name(),
                    found: entry_shape(&key, &value),
                });
            }
        }
        Ok(())
    }
}

/// The kernel only takes per-CPU values sized to the possible CPU count.
fn per_cpu_values(values: Vec<u32>) -> Result<PerCpuValues<u32>, WriteError> {
    let width = values.len();
    PerCpuValues::try_from(values).map_err(|source| WriteError::PerCpuWidth { width, source })
}

fn entry_shape(key: &EncodedKey, value: &EncodedValue) -> &'static str {
    match (key, value) {
        (EncodedKey::Index(_), EncodedValue::Scalar(_)) => "index/scalar",
        (EncodedKey::Index(_), EncodedValue::PerCpu(_)) => "index/per-cpu",
        (EncodedKey::Prefix { .. }, EncodedValue::Scalar(_)) => "prefix/scalar",
        (EncodedKey::Prefix { .. }, EncodedValue::PerCpu(_)) => "prefix/per-cpu",
    }
}

/// Every registered map, taken out of a loaded object.
///
/// Dropping this closes the handles.
pub struct LoadedMaps {
    maps: Vec<(MapKind, AyaMap)>,
}

impl LoadedMaps {
    pub fn take_all(bpf: &mut Ebpf) -> Result<Self> {
        let maps = MapKind::ALL
            .into_iter()
            .map(|kind| AyaMap::take(bpf, kind).map(|map| (kind, map)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { maps })
    }
}

impl MapSet for LoadedMaps {
    fn writer(&mut self, kind: MapKind) -> Option<&mut dyn MapWriter> {
        self.maps
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .map(|(_, map)| map as &mut dyn MapWriter)
    }
}
