use std::io;

use aya::maps::MapError;
use log::{debug, info, trace};
use thiserror::Error;

use crate::encode::{Encoder, PopulationEntry};
use crate::kind::MapKind;
use crate::report::{KindReport, PopulationReport};
use crate::rng::ValueSource;

/// Entries written per kind unless configured otherwise.
pub const DEFAULT_ENTRIES: u32 = 5;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("map {map} does not accept a {found} entry")]
    ShapeMismatch {
        map: &'static str,
        found: &'static str,
    },
    #[error("per-cpu value with {width} slots rejected")]
    PerCpuWidth {
        width: usize,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Map(#[from] MapError),
}

#[derive(Debug, Error)]
pub enum PopulateError {
    #[error("{kind}: {count} entries requested but the map holds at most {capacity}")]
    CountExceedsCapacity {
        kind: MapKind,
        count: u32,
        capacity: u32,
    },
    #[error("{kind}: map {} not found in the loaded object", .kind.map_name())]
    MissingMap { kind: MapKind },
    #[error("{kind}: failed to write entry {index}")]
    Write {
        kind: MapKind,
        index: u32,
        #[source]
        source: WriteError,
    },
}

/// Write side of a single map handle.
pub trait MapWriter {
    fn put(&mut self, entry: PopulationEntry) -> Result<(), WriteError>;
}

/// Lends one writer per map kind.
pub trait MapSet {
    fn writer(&mut self, kind: MapKind) -> Option<&mut dyn MapWriter>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlanStep {
    pub kind: MapKind,
    pub count: u32,
}

/// How many entries go into each kind, in population order.
#[derive(Clone, Debug)]
pub struct PopulationPlan {
    steps: Vec<PlanStep>,
}

impl PopulationPlan {
    /// Every registered kind gets `count` entries.
    pub fn uniform(count: u32) -> Self {
        Self {
            steps: MapKind::ALL
                .into_iter()
                .map(|kind| PlanStep { kind, count })
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn with_count(mut self, kind: MapKind, count: u32) -> Self {
        for step in self.steps.iter_mut().filter(|s| s.kind == kind) {
            step.count = count;
        }
        self
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// A count must stay strictly below the declared capacity.
    pub fn validate(&self) -> Result<(), PopulateError> {
        for step in &self.steps {
            let capacity = step.kind.capacity();
            if step.count >= capacity {
                return Err(PopulateError::CountExceedsCapacity {
                    kind: step.kind,
                    count: step.count,
                    capacity,
                });
            }
        }
        Ok(())
    }
}

impl Default for PopulationPlan {
    fn default() -> Self {
        Self::uniform(DEFAULT_ENTRIES)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PopulationState {
    NotStarted,
    /// Index into the plan's steps.
    Populating(usize),
    Completed,
    Failed { kind: MapKind, index: u32 },
}

/// Writes indices `0..count` of `kind`, stopping at the first failure.
///
/// Returns the number of entries written.
pub fn populate(
    kind: MapKind,
    writer: &mut dyn MapWriter,
    count: u32,
    encoder: &Encoder,
    source: &mut ValueSource,
) -> Result<u32, PopulateError> {
    for index in 0..count {
        let entry = encoder.encode(kind, index, source);
        debug!(
            "{kind}[{}] <- {:?} = {:?} ({} slots)",
            entry.index,
            entry.key,
            entry.value,
            entry.value.width()
        );
        writer
            .put(entry)
            .map_err(|source| PopulateError::Write {
                kind,
                index,
                source,
            })?;
    }
    Ok(count)
}

/// Runs a [`PopulationPlan`] against a set of maps.
pub struct Populator {
    encoder: Encoder,
    state: PopulationState,
}

impl Populator {
    pub fn new(encoder: Encoder) -> Self {
        Self {
            encoder,
            state: PopulationState::NotStarted,
        }
    }

    pub fn state(&self) -> PopulationState {
        self.state
    }

    /// Populates every step in order. Nothing is written unless the plan is
    /// valid and every map is present; after that the first write failure
    /// ends the run and earlier writes stay in place.
    pub fn run(
        &mut self,
        plan: &PopulationPlan,
        maps: &mut dyn MapSet,
        source: &mut ValueSource,
    ) -> Result<PopulationReport, PopulateError> {
        plan.validate()?;
        for step in plan.steps() {
            if maps.writer(step.kind).is_none() {
                return Err(PopulateError::MissingMap { kind: step.kind });
            }
        }

        let mut report = PopulationReport::new(source.seed(), self.encoder.nr_cpus());
        for (pos, step) in plan.steps().iter().enumerate() {
            self.transition(PopulationState::Populating(pos));
            let writer = maps
                .writer(step.kind)
                .ok_or(PopulateError::MissingMap { kind: step.kind })?;
            match populate(step.kind, writer, step.count, &self.encoder, source) {
                Ok(written) => {
                    info!(
                        "{}: wrote {written} entries into {}",
                        step.kind,
                        step.kind.map_name()
                    );
                    report.push(KindReport {
                        kind: step.kind,
                        entries: written,
                        value_width: self.encoder.value_width(step.kind),
                    });
                }
                Err(err) => {
                    if let PopulateError::Write { kind, index, .. } = &err {
                        self.transition(PopulationState::Failed {
                            kind: *kind,
                            index: *index,
                        });
                    }
                    return Err(err);
                }
            }
        }
        self.transition(PopulationState::Completed);
        Ok(report)
    }

    fn transition(&mut self, next: PopulationState) {
        trace!("population state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZeroUsize;

    use super::*;
    use crate::encode::{EncodedKey, EncodedValue};

    struct MemoryMap {
        capacity: u32,
        entries: HashMap<EncodedKey, EncodedValue>,
        attempts: Vec<u32>,
        fail_at: Option<u32>,
    }

    impl MemoryMap {
        fn new(kind: MapKind) -> Self {
            Self {
                capacity: kind.capacity(),
                entries: HashMap::new(),
                attempts: Vec::new(),
                fail_at: None,
            }
        }
    }

    impl MapWriter for MemoryMap {
        fn put(&mut self, entry: PopulationEntry) -> Result<(), WriteError> {
            self.attempts.push(entry.index);
            if self.fail_at == Some(entry.index) || self.entries.len() as u32 >= self.capacity {
                return Err(MapError::OutOfBounds {
                    index: entry.index,
                    max_entries: self.capacity,
                }
                .into());
            }
            self.entries.insert(entry.key, entry.value);
            Ok(())
        }
    }

    struct MemoryMaps {
        maps: Vec<(MapKind, MemoryMap)>,
    }

    impl MemoryMaps {
        fn all() -> Self {
            Self {
                maps: MapKind::ALL
                    .into_iter()
                    .map(|kind| (kind, MemoryMap::new(kind)))
                    .collect(),
            }
        }

        fn get(&self, kind: MapKind) -> &MemoryMap {
            &self.maps.iter().find(|(k, _)| *k == kind).unwrap().1
        }

        fn get_mut(&mut self, kind: MapKind) -> &mut MemoryMap {
            &mut self.maps.iter_mut().find(|(k, _)| *k == kind).unwrap().1
        }
    }

    impl MapSet for MemoryMaps {
        fn writer(&mut self, kind: MapKind) -> Option<&mut dyn MapWriter> {
            self.maps
                .iter_mut()
                .find(|(k, _)| *k == kind)
                .map(|(_, map)| map as &mut dyn MapWriter)
        }
    }

    fn encoder(cpus: usize) -> Encoder {
        Encoder::new(NonZeroUsize::new(cpus).unwrap())
    }

    fn sorted_keys(map: &MemoryMap) -> Vec<EncodedKey> {
        let mut keys: Vec<_> = map.entries.keys().copied().collect();
        keys.sort_by_key(|k| match k {
            EncodedKey::Index(i) => *i,
            EncodedKey::Prefix { data, .. } => *data,
        });
        keys
    }

    #[test]
    fn populates_every_kind_with_dense_keys() {
        let mut maps = MemoryMaps::all();
        let mut populator = Populator::new(encoder(2));
        let mut source = ValueSource::from_seed(9);
        let report = populator
            .run(&PopulationPlan::default(), &mut maps, &mut source)
            .unwrap();

        assert_eq!(populator.state(), PopulationState::Completed);
        assert_eq!(report.kinds().len(), MapKind::ALL.len());
        for kind in MapKind::ALL {
            let keys = sorted_keys(maps.get(kind));
            let expected: Vec<_> = (0..DEFAULT_ENTRIES)
                .map(|i| match kind {
                    MapKind::LpmTrie => EncodedKey::Prefix {
                        prefix_len: 32,
                        data: i,
                    },
                    _ => EncodedKey::Index(i),
                })
                .collect();
            assert_eq!(keys, expected, "{kind}");
        }
    }

    #[test]
    fn per_cpu_entries_match_cpu_count() {
        let mut maps = MemoryMaps::all();
        let mut populator = Populator::new(encoder(4));
        let mut source = ValueSource::from_seed(21);
        populator
            .run(&PopulationPlan::uniform(5), &mut maps, &mut source)
            .unwrap();

        let map = maps.get(MapKind::PerCpuHash);
        assert_eq!(
            sorted_keys(map),
            (0..5).map(EncodedKey::Index).collect::<Vec<_>>()
        );
        for value in map.entries.values() {
            assert_eq!(value.width(), 4);
        }
        for kind in [MapKind::LruPerCpuHash, MapKind::PerCpuArray] {
            assert!(maps.get(kind).entries.values().all(|v| v.width() == 4));
        }
    }

    #[test]
    fn failure_stops_kind_and_later_kinds() {
        let mut maps = MemoryMaps::all();
        maps.get_mut(MapKind::PerCpuHash).fail_at = Some(2);
        let mut populator = Populator::new(encoder(2));
        let mut source = ValueSource::from_seed(1);

        let err = populator
            .run(&PopulationPlan::default(), &mut maps, &mut source)
            .unwrap_err();
        match err {
            PopulateError::Write { kind, index, .. } => {
                assert_eq!(kind, MapKind::PerCpuHash);
                assert_eq!(index, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            populator.state(),
            PopulationState::Failed {
                kind: MapKind::PerCpuHash,
                index: 2
            }
        );

        let failed = maps.get(MapKind::PerCpuHash);
        assert_eq!(failed.attempts, [0, 1, 2]);
        assert_eq!(
            sorted_keys(failed),
            [EncodedKey::Index(0), EncodedKey::Index(1)]
        );
        assert_eq!(maps.get(MapKind::LruHash).entries.len(), 5);
        for kind in [
            MapKind::LruPerCpuHash,
            MapKind::Array,
            MapKind::PerCpuArray,
            MapKind::LpmTrie,
        ] {
            assert!(maps.get(kind).attempts.is_empty(), "{kind}");
        }
    }

    #[test]
    fn error_message_names_kind_and_index() {
        let mut map = MemoryMap::new(MapKind::Array);
        map.fail_at = Some(2);
        let mut source = ValueSource::from_seed(1);
        let err = populate(MapKind::Array, &mut map, 5, &encoder(1), &mut source).unwrap_err();
        assert_eq!(err.to_string(), "array: failed to write entry 2");
    }

    #[test]
    fn count_at_capacity_is_rejected_before_writing() {
        let mut maps = MemoryMaps::all();
        let plan = PopulationPlan::uniform(3).with_count(MapKind::Array, MapKind::Array.capacity());
        let mut populator = Populator::new(encoder(2));
        let mut source = ValueSource::from_seed(1);

        let err = populator.run(&plan, &mut maps, &mut source).unwrap_err();
        assert!(matches!(
            err,
            PopulateError::CountExceedsCapacity {
                kind: MapKind::Array,
                count: 10,
                capacity: 10
            }
        ));
        assert_eq!(populator.state(), PopulationState::NotStarted);
        assert!(maps.maps.iter().all(|(_, m)| m.attempts.is_empty()));
    }

    #[test]
    fn count_just_below_capacity_fits() {
        let mut maps = MemoryMaps::all();
        let plan = PopulationPlan::uniform(DEFAULT_ENTRIES)
            .with_count(MapKind::Hash, MapKind::Hash.capacity() - 1);
        let mut populator = Populator::new(encoder(1));
        let mut source = ValueSource::from_seed(1);

        populator.run(&plan, &mut maps, &mut source).unwrap();
        assert_eq!(maps.get(MapKind::Hash).entries.len(), 9);
    }

    #[test]
    fn zero_count_writes_nothing() {
        let mut maps = MemoryMaps::all();
        let mut populator = Populator::new(encoder(1));
        let mut source = ValueSource::from_seed(1);

        let report = populator
            .run(&PopulationPlan::uniform(0), &mut maps, &mut source)
            .unwrap();
        assert!(maps.maps.iter().all(|(_, m)| m.attempts.is_empty()));
        assert!(report.kinds().iter().all(|k| k.entries == 0));
        assert_eq!(populator.state(), PopulationState::Completed);
    }

    #[test]
    fn missing_map_is_reported_before_writing() {
        let mut maps = MemoryMaps::all();
        maps.maps.retain(|(k, _)| *k != MapKind::LpmTrie);
        let mut populator = Populator::new(encoder(1));
        let mut source = ValueSource::from_seed(1);

        let err = populator
            .run(&PopulationPlan::default(), &mut maps, &mut source)
            .unwrap_err();
        assert!(matches!(
            err,
            PopulateError::MissingMap {
                kind: MapKind::LpmTrie
            }
        ));
        assert!(maps.maps.iter().all(|(_, m)| m.attempts.is_empty()));
    }

    #[test]
    fn report_widths_match_written_values() {
        let mut maps = MemoryMaps::all();
        let report = Populator::new(encoder(3))
            .run(
                &PopulationPlan::default(),
                &mut maps,
                &mut ValueSource::from_seed(8),
            )
            .unwrap();

        assert_eq!(report.total_entries(), 5 * MapKind::ALL.len() as u64);
        for k in report.kinds() {
            let map = maps.get(k.kind);
            assert_eq!(map.entries.len() as u32, k.entries, "{}", k.kind);
            assert!(
                map.entries.values().all(|v| v.width() == k.value_width),
                "{}",
                k.kind
            );
        }
        let json = report.to_json();
        assert_eq!(json["maps"].as_array().unwrap().len(), MapKind::ALL.len());
        assert_eq!(json["maps"][2]["value_width"], 3);
    }

    #[test]
    fn seeds_change_values_not_keys() {
        let mut first = MemoryMaps::all();
        let mut second = MemoryMaps::all();
        Populator::new(encoder(2))
            .run(
                &PopulationPlan::default(),
                &mut first,
                &mut ValueSource::from_seed(100),
            )
            .unwrap();
        Populator::new(encoder(2))
            .run(
                &PopulationPlan::default(),
                &mut second,
                &mut ValueSource::from_seed(200),
            )
            .unwrap();

        let mut any_value_differs = false;
        for kind in MapKind::ALL {
            let (a, b) = (first.get(kind), second.get(kind));
            assert_eq!(sorted_keys(a), sorted_keys(b), "{kind}");
            any_value_differs |= a.entries.iter().any(|(k, v)| b.entries[k] != *v);
        }
        assert!(any_value_differs);
    }
}
