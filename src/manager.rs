use super::candidates::CandidateGenerator;
use super::error::InteractionError;
use super::geom::Shape;
use super::index::SpatialIndex;
use super::narrow::{NarrowPhase, RadiusOverlap};
use super::pair::Pair;
use super::registry::{Events, PairRegistry, PairState};
use super::traits::Handle;

use cgmath::BaseFloat;
use rustc_hash::FxHashSet;

#[cfg(feature="parallel")]
use rayon::prelude::*;

#[cfg(feature="parallel")]
use std::cell::RefCell;

#[cfg(feature="parallel")]
use thread_local::ThreadLocal;

/// Which list of a tick's [`Events`] a handler is receiving
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Phase {
    Ended,
    Ongoing,
    Started,
}

/// Receives the pair events of every tick
///
/// Each tick, every handler sees all `ended` pairs, then every handler sees all `ongoing` pairs, then
/// every handler sees all `started` pairs.  Slices may be empty.  Closures taking
/// `(Phase, &[Pair<ID>])` are handlers.
pub trait InteractionHandler<ID> {
    fn ended(&mut self, _pairs: &[Pair<ID>]) {}
    fn ongoing(&mut self, _pairs: &[Pair<ID>]) {}
    fn started(&mut self, _pairs: &[Pair<ID>]) {}
}

impl<ID, F> InteractionHandler<ID> for F
where
    F: FnMut(Phase, &[Pair<ID>])
{
    fn ended(&mut self, pairs: &[Pair<ID>]) {
        self(Phase::Ended, pairs)
    }

    fn ongoing(&mut self, pairs: &[Pair<ID>]) {
        self(Phase::Ongoing, pairs)
    }

    fn started(&mut self, pairs: &[Pair<ID>]) {
        self(Phase::Started, pairs)
    }
}

/// Construction parameters for an [`InteractionManager`]
///
/// Capacities are hints only.
#[cfg_attr(feature="serde", derive(Deserialize, Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config<S> {
    pub cell_size: S,
    pub object_capacity: Option<usize>,
    pub pair_capacity: Option<usize>,
}

impl<S> Config<S>
where
    S: BaseFloat
{
    pub fn new(cell_size: S) -> Self {
        Self{cell_size, object_capacity: None, pair_capacity: None}
    }

    pub fn with_cell_size(&mut self, cell_size: S) -> &mut Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_object_capacity(&mut self, capacity: usize) -> &mut Self {
        self.object_capacity = Some(capacity);
        self
    }

    pub fn with_pair_capacity(&mut self, capacity: usize) -> &mut Self {
        self.pair_capacity = Some(capacity);
        self
    }

    pub fn build<ID, N>(&self, narrow_phase: N) -> Result<InteractionManager<ID, S, N>, InteractionError<ID>>
    where
        ID: Handle,
        N: NarrowPhase<ID, S>
    {
        let reach = narrow_phase.reach();
        if !(reach.is_finite() && reach >= S::zero()) {
            return Err(InteractionError::InvalidConfiguration(
                format!("narrow phase reach must be finite and non-negative (got {:?})", reach)));
        }
        if reach > self.cell_size {
            return Err(InteractionError::InvalidConfiguration(
                format!("narrow phase reach {:?} exceeds cell size {:?}", reach, self.cell_size)));
        }

        let objects = self.object_capacity.unwrap_or(0);
        let pairs = self.pair_capacity.unwrap_or(0);
        Ok(InteractionManager{
            index: SpatialIndex::with_capacity(self.cell_size, objects)?,
            generator: CandidateGenerator::with_capacity(pairs),
            narrow_phase,
            registry: PairRegistry::with_capacity(pairs),
            handlers: Vec::new(),
            pending: Vec::with_capacity(objects),
            live: FxHashSet::default(),
            departed: Vec::new(),
            confirmed: Vec::with_capacity(pairs),
            ticks: 0,
            #[cfg(feature="parallel")]
            candidates: Vec::new(),
            #[cfg(feature="parallel")]
            confirmed_tls: ThreadLocal::new(),
        })
    }
}

/// Tracks which pairs of objects interact, tick by tick
///
/// Each [`tick`](InteractionManager::tick) takes the full set of live objects.  Handles missing from a
/// tick are dropped, so their pairs end on that tick.

pub struct InteractionManager<ID, S, N>
where
    ID: Handle,
    S: BaseFloat
{
    index: SpatialIndex<ID, S>,
    generator: CandidateGenerator<ID>,
    narrow_phase: N,
    registry: PairRegistry<ID>,
    handlers: Vec<Box<dyn InteractionHandler<ID>>>,
    pending: Vec<(ID, Shape<S>)>,
    live: FxHashSet<ID>,
    departed: Vec<ID>,
    confirmed: Vec<Pair<ID>>,
    ticks: u64,

    #[cfg(feature="parallel")]
    candidates: Vec<Pair<ID>>,
    #[cfg(feature="parallel")]
    confirmed_tls: ThreadLocal<RefCell<Vec<Pair<ID>>>>,
}

impl<ID, S> InteractionManager<ID, S, RadiusOverlap>
where
    ID: Handle,
    S: BaseFloat
{
    /// A manager confirming pairs whose extents, read as radii, overlap
    pub fn new(cell_size: S) -> Result<Self, InteractionError<ID>> {
        Config::new(cell_size).build(RadiusOverlap)
    }
}

impl<ID, S, N> InteractionManager<ID, S, N>
where
    ID: Handle,
    S: BaseFloat,
    N: NarrowPhase<ID, S>
{
    pub fn add_handler<H>(&mut self, handler: H)
    where
        H: InteractionHandler<ID> + 'static
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn index(&self) -> &SpatialIndex<ID, S> {
        &self.index
    }

    pub fn registry(&self) -> &PairRegistry<ID> {
        &self.registry
    }

    pub fn narrow_phase(&self) -> &N {
        &self.narrow_phase
    }

    /// The events of the latest tick
    pub fn events(&self) -> &Events<ID> {
        self.registry.events()
    }

    pub fn state(&self, pair: Pair<ID>) -> Option<PairState> {
        self.registry.state(pair)
    }

    pub fn interactions_of(&self, id: ID) -> Vec<Pair<ID>> {
        self.registry.pairs_of(id)
    }

    pub fn cell_size(&self) -> S {
        self.index.cell_size()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Advance one frame
    ///
    /// `updates` is every live object with its shape for this tick.  If any shape is invalid the tick
    /// fails with `InvalidShape` and nothing changes.  Candidates sharing no collision group never reach
    /// the narrow phase.
    pub fn tick<I>(&mut self, updates: I) -> Result<&Events<ID>, InteractionError<ID>>
    where
        I: IntoIterator<Item = (ID, Shape<S>)>
    {
        self.refresh(updates)?;

        self.confirmed.clear();
        let index = &self.index;
        let narrow_phase = &self.narrow_phase;
        let mut candidates = 0usize;
        for pair in self.generator.pairs(index) {
            candidates += 1;
            if Self::confirms(index, narrow_phase, pair) {
                self.confirmed.push(pair);
            }
        }

        Ok(self.finish(candidates))
    }

    /// [`tick`]: struct.InteractionManager.html#method.tick
    /// Parallel version of [`tick`]
    ///
    /// Runs the narrow phase on the rayon thread pool.  Produces the same events as `tick`.
    #[cfg(feature="parallel")]
    pub fn par_tick<I>(&mut self, updates: I) -> Result<&Events<ID>, InteractionError<ID>>
    where
        I: IntoIterator<Item = (ID, Shape<S>)>,
        S: Send + Sync,
        N: Sync
    {
        self.refresh(updates)?;

        self.candidates.clear();
        self.candidates.extend(self.generator.pairs(&self.index));

        for set in self.confirmed_tls.iter_mut() {
            set.get_mut().clear();
        }

        let index = &self.index;
        let narrow_phase = &self.narrow_phase;
        let confirmed_tls = &self.confirmed_tls;
        self.candidates.par_iter().for_each(|&pair| {
            if Self::confirms(index, narrow_phase, pair) {
                confirmed_tls
                    .get_or(|| RefCell::new(Vec::new()))
                    .borrow_mut()
                    .push(pair);
            }
        });

        self.confirmed.clear();
        for set in self.confirmed_tls.iter_mut() {
            self.confirmed.extend(set.get_mut().drain(..));
        }

        let candidates = self.candidates.len();
        Ok(self.finish(candidates))
    }

    fn confirms(index: &SpatialIndex<ID, S>, narrow_phase: &N, pair: Pair<ID>) -> bool {
        match (index.shape(pair.lhs()), index.shape(pair.rhs())) {
            (Some(lhs), Some(rhs)) => lhs.groups.shares(rhs.groups) && narrow_phase.confirms(pair, lhs, rhs),
            _ => false
        }
    }

    /// Validate and apply a tick's updates, then drop handles that were not updated
    fn refresh<I>(&mut self, updates: I) -> Result<(), InteractionError<ID>>
    where
        I: IntoIterator<Item = (ID, Shape<S>)>
    {
        self.pending.clear();
        self.pending.extend(updates);

        let index = &self.index;
        if let Some(&(id, _)) = self.pending.iter().find(|(_, shape)| index.cell_range(shape).is_none()) {
            return Err(InteractionError::InvalidShape(id));
        }

        self.live.clear();
        for &(id, shape) in self.pending.iter() {
            self.live.insert(id);
            if self.index.contains(id) {
                self.index.relocate(id, shape)?;
            } else {
                self.index.insert(id, shape)?;
            }
        }

        let live = &self.live;
        self.departed.clear();
        self.departed.extend(self.index.handles().filter(|id| !live.contains(id)));
        for &id in self.departed.iter() {
            self.index.remove(id)?;
            trace!("deregistered {:?}", id);
        }

        Ok(())
    }

    /// Diff the confirmed set and deliver the events to every handler
    fn finish(&mut self, candidates: usize) -> &Events<ID> {
        self.ticks += 1;
        let events = self.registry.update(&self.confirmed);

        for handler in self.handlers.iter_mut() {
            handler.ended(&events.ended);
        }
        for handler in self.handlers.iter_mut() {
            handler.ongoing(&events.ongoing);
        }
        for handler in self.handlers.iter_mut() {
            handler.started(&events.started);
        }

        debug!("tick {}: {} objects in {} cells, {} candidates, {} confirmed ({} started, {} ongoing, {} ended)",
            self.ticks,
            self.index.len(),
            self.index.occupied_cell_count(),
            candidates,
            self.confirmed.len(),
            events.started.len(),
            events.ongoing.len(),
            events.ended.len());

        events
    }
}
