use super::pair::Pair;
use super::traits::Handle;

use rustc_hash::FxHashMap;

/// Lifecycle of a pair that is currently interacting
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PairState {
    /// Confirmed this tick, not the tick before
    Started,
    /// Confirmed this tick and the tick before
    Ongoing,
}

/// The three-way difference between two consecutive ticks, each list sorted
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Events<ID> {
    pub ended: Vec<Pair<ID>>,
    pub ongoing: Vec<Pair<ID>>,
    pub started: Vec<Pair<ID>>,
}

impl<ID> Default for Events<ID> {
    fn default() -> Self {
        Self{ended: Vec::new(), ongoing: Vec::new(), started: Vec::new()}
    }
}

impl<ID> Events<ID> {
    pub fn is_empty(&self) -> bool {
        self.ended.is_empty() && self.ongoing.is_empty() && self.started.is_empty()
    }

    pub fn clear(&mut self) {
        self.ended.clear();
        self.ongoing.clear();
        self.started.clear();
    }
}

#[derive(Clone, Copy, Debug)]
struct PairRecord {
    state: PairState,
    last_tick: u64,
}

/// The set of interacting pairs and their lifecycle
///
/// A record exists exactly for the pairs confirmed by the latest `update`.
#[derive(Clone, Debug)]
pub struct PairRegistry<ID>
where
    ID: Handle
{
    records: FxHashMap<Pair<ID>, PairRecord>,
    events: Events<ID>,
    tick: u64,
}

impl<ID> PairRegistry<ID>
where
    ID: Handle
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut records = FxHashMap::default();
        records.reserve(capacity);
        Self{records, events: Events::default(), tick: 0}
    }

    /// Replace the confirmed set, returning what started, continued and ended
    ///
    /// Repeated pairs in `confirmed` count once.
    pub fn update(&mut self, confirmed: &[Pair<ID>]) -> &Events<ID> {
        self.tick += 1;
        let tick = self.tick;
        let Self{records, events, ..} = &mut *self;
        events.clear();

        for &pair in confirmed {
            let record = records.entry(pair).or_insert(PairRecord{
                state: PairState::Started,
                last_tick: 0,
            });
            if record.last_tick == tick {
                continue;
            }
            if record.last_tick == 0 {
                events.started.push(pair);
            } else {
                record.state = PairState::Ongoing;
                events.ongoing.push(pair);
            }
            record.last_tick = tick;
        }

        records.retain(|&pair, record| {
            if record.last_tick == tick {
                true
            } else {
                events.ended.push(pair);
                false
            }
        });

        events.ended.sort_unstable();
        events.ongoing.sort_unstable();
        events.started.sort_unstable();
        &self.events
    }

    /// The events produced by the latest `update`
    pub fn events(&self) -> &Events<ID> {
        &self.events
    }

    pub fn state(&self, pair: Pair<ID>) -> Option<PairState> {
        self.records.get(&pair).map(|record| record.state)
    }

    pub fn contains(&self, pair: Pair<ID>) -> bool {
        self.records.contains_key(&pair)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (Pair<ID>, PairState)> + 'a {
        self.records.iter().map(|(&pair, record)| (pair, record.state))
    }

    /// Every interacting pair involving `id`, sorted
    pub fn pairs_of(&self, id: ID) -> Vec<Pair<ID>> {
        let mut pairs: Vec<Pair<ID>> = self.records.keys()
            .copied()
            .filter(|pair| pair.contains(id))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

impl<ID> Default for PairRegistry<ID>
where
    ID: Handle
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(lhs: u32, rhs: u32) -> Pair<u32> {
        Pair::new(lhs, rhs).unwrap()
    }

    #[test]
    fn lifecycle() {
        let p = pair(1, 2);
        let mut registry = PairRegistry::new();

        assert!(registry.update(&[]).is_empty());
        assert!(registry.is_empty());

        let events = registry.update(&[p]).clone();
        assert_eq!(events.started, vec![p]);
        assert!(events.ongoing.is_empty() && events.ended.is_empty());
        assert_eq!(registry.state(p), Some(PairState::Started));

        let events = registry.update(&[p]).clone();
        assert_eq!(events.ongoing, vec![p]);
        assert!(events.started.is_empty() && events.ended.is_empty());
        assert_eq!(registry.state(p), Some(PairState::Ongoing));

        let events = registry.update(&[]).clone();
        assert_eq!(events.ended, vec![p]);
        assert!(events.started.is_empty() && events.ongoing.is_empty());
        assert_eq!(registry.state(p), None);
    }

    #[test]
    fn three_way_diff() {
        let mut registry = PairRegistry::new();
        registry.update(&[pair(1, 2), pair(3, 4), pair(5, 6)]);
        let events = registry.update(&[pair(7, 8), pair(5, 6), pair(1, 2)]).clone();
        assert_eq!(events, Events{
            ended: vec![pair(3, 4)],
            ongoing: vec![pair(1, 2), pair(5, 6)],
            started: vec![pair(7, 8)],
        });

        let mut records: Vec<(Pair<u32>, PairState)> = registry.iter().collect();
        records.sort_unstable_by_key(|&(pair, _)| pair);
        assert_eq!(records, vec![
            (pair(1, 2), PairState::Ongoing),
            (pair(5, 6), PairState::Ongoing),
            (pair(7, 8), PairState::Started)]);
    }

    #[test]
    fn duplicates_count_once() {
        let mut registry = PairRegistry::new();
        let events = registry.update(&[pair(2, 1), pair(1, 2), pair(1, 2)]).clone();
        assert_eq!(events.started, vec![pair(1, 2)]);
        assert_eq!(registry.len(), 1);
        let events = registry.update(&[pair(1, 2), pair(1, 2)]).clone();
        assert_eq!(events.ongoing, vec![pair(1, 2)]);
    }

    #[test]
    fn pairs_of_handle() {
        let mut registry = PairRegistry::new();
        registry.update(&[pair(1, 2), pair(2, 3), pair(4, 5)]);
        assert_eq!(registry.pairs_of(2), vec![pair(1, 2), pair(2, 3)]);
        assert!(registry.pairs_of(9).is_empty());
        assert!(registry.contains(pair(5, 4)));
    }
}
