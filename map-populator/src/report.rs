use log::info;
use serde_json::{Map as JsonMap, Number as JsonNumber, Value};

use crate::kind::MapKind;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KindReport {
    pub kind: MapKind,
    pub entries: u32,
    /// `u32` slots per entry: 1, or the CPU count for per-CPU kinds.
    pub value_width: usize,
}

/// What a successful population run wrote.
#[derive(Clone, Debug)]
pub struct PopulationReport {
    seed: u64,
    nr_cpus: usize,
    kinds: Vec<KindReport>,
}

impl PopulationReport {
    pub fn new(seed: u64, nr_cpus: usize) -> Self {
        Self {
            seed,
            nr_cpus,
            kinds: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: KindReport) {
        self.kinds.push(kind);
    }

    pub fn kinds(&self) -> &[KindReport] {
        &self.kinds
    }

    pub fn total_entries(&self) -> u64 {
        self.kinds().iter().map(|k| k.entries as u64).sum()
    }

    pub fn log(&self) {
        info!(
            "seed {} across {} cpus, {} entries total",
            self.seed,
            self.nr_cpus,
            self.total_entries()
        );
        for k in self.kinds() {
            info!(
                "  {:<16} {:<20} entries={} width={} evicting={}",
                k.kind.label(),
                k.kind.map_name(),
                k.entries,
                k.value_width,
                k.kind.is_evicting()
            );
        }
    }

    /// JSON object with `seed`, `cpus` and one element per kind under `maps`.
    pub fn to_json(&self) -> Value {
        let maps = self
            .kinds()
            .iter()
            .map(|k| {
                let mut obj = JsonMap::new();
                obj.insert("kind".to_string(), Value::String(k.kind.label().to_string()));
                obj.insert(
                    "map".to_string(),
                    Value::String(k.kind.map_name().to_string()),
                );
                obj.insert("entries".to_string(), Value::Number(k.entries.into()));
                obj.insert(
                    "value_width".to_string(),
                    Value::Number(JsonNumber::from(k.value_width)),
                );
                obj.insert("evicting".to_string(), Value::Bool(k.kind.is_evicting()));
                Value::Object(obj)
            })
            .collect();

        let mut root = JsonMap::new();
        root.insert("seed".to_string(), Value::Number(self.seed.into()));
        root.insert("cpus".to_string(), Value::Number(JsonNumber::from(self.nr_cpus)));
        root.insert("maps".to_string(), Value::Array(maps));
        Value::Object(root)
    }
}
