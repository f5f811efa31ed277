use std::num::NonZeroUsize;

use map_populator_common::LPM_EXACT_PREFIX_LEN;

use crate::kind::{KeyShape, MapKind, ValueShape};
use crate::rng::ValueSource;

/// Key as it is handed to the map.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EncodedKey {
    Index(u32),
    Prefix { prefix_len: u32, data: u32 },
}

/// Value as it is handed to the map.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EncodedValue {
    Scalar(u32),
    /// One slot per CPU, in CPU order.
    PerCpu(Vec<u32>),
}

impl EncodedValue {
    /// Number of `u32` slots carried.
    pub fn width(&self) -> usize {
        match self {
            EncodedValue::Scalar(_) => 1,
            EncodedValue::PerCpu(values) => values.len(),
        }
    }
}

/// One insertion: built, written, then dropped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PopulationEntry {
    pub index: u32,
    pub key: EncodedKey,
    pub value: EncodedValue,
}

/// Builds keys and values following each kind's layout.
#[derive(Clone, Copy, Debug)]
pub struct Encoder {
    nr_cpus: NonZeroUsize,
}

impl Encoder {
    pub fn new(nr_cpus: NonZeroUsize) -> Self {
        Self { nr_cpus }
    }

    pub fn nr_cpus(&self) -> usize {
        self.nr_cpus.get()
    }

    /// Value width a kind's entries carry.
    pub fn value_width(&self, kind: MapKind) -> usize {
        match kind.value_shape() {
            ValueShape::Scalar => 1,
            ValueShape::PerCpu => self.nr_cpus(),
        }
    }

    pub fn encode(&self, kind: MapKind, index: u32, source: &mut ValueSource) -> PopulationEntry {
        PopulationEntry {
            index,
            key: encode_key(kind, index),
            value: self.encode_value(kind, source),
        }
    }

    fn encode_value(&self, kind: MapKind, source: &mut ValueSource) -> EncodedValue {
        match kind.value_shape() {
            ValueShape::Scalar => EncodedValue::Scalar(source.next_u32()),
            ValueShape::PerCpu => {
                EncodedValue::PerCpu((0..self.nr_cpus()).map(|_| source.next_u32()).collect())
            }
        }
    }
}

/// Keys only depend on the index, never on drawn values.
fn encode_key(kind: MapKind, index: u32) -> EncodedKey {
    match kind.key_shape() {
        KeyShape::Scalar => EncodedKey::Index(index),
        KeyShape::Prefix => EncodedKey::Prefix {
            prefix_len: LPM_EXACT_PREFIX_LEN,
            data: index,
        },
    }
}
