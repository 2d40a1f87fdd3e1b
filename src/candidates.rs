use super::index::{CellKey, CellMembers, SpatialIndex};
use super::pair::Pair;
use super::traits::Handle;

use cgmath::BaseFloat;
use rustc_hash::FxHashSet;

use std::collections::hash_map;

/// East, south-west, south and south-east
///
/// Together with the cell itself this is half of the 3x3 neighborhood: every adjacent pair of cells is
/// visited from exactly one side.
const FORWARD_NEIGHBORS: [(i32, i32); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

/// Produces the broad-phase candidate pairs of a `SpatialIndex`
///
/// Owns the set used to drop duplicates from objects spanning several cells, so repeated ticks reuse
/// its allocation.
#[derive(Clone, Debug)]
pub struct CandidateGenerator<ID>
where
    ID: Handle
{
    seen: FxHashSet<Pair<ID>>,
}

impl<ID> CandidateGenerator<ID>
where
    ID: Handle
{
    pub fn new() -> Self {
        Self{seen: FxHashSet::default()}
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut seen = FxHashSet::default();
        seen.reserve(capacity);
        Self{seen}
    }

    /// Lazily yield every pair of handles in the same or adjacent cells, once each
    ///
    /// Order is unspecified.
    pub fn pairs<'a, S>(&'a mut self, index: &'a SpatialIndex<ID, S>) -> Candidates<'a, ID, S>
    where
        S: BaseFloat
    {
        self.seen.clear();
        Candidates{
            index,
            cells: index.cell_map(),
            seen: &mut self.seen,
            cell: None,
            step: 0,
            lhs: &[],
            rhs: &[],
            i: 0,
            j: 0,
            same_cell: true,
        }
    }
}

/// Iterator returned by [`CandidateGenerator::pairs`]
pub struct Candidates<'a, ID, S>
where
    ID: Handle,
    S: BaseFloat
{
    index: &'a SpatialIndex<ID, S>,
    cells: hash_map::Iter<'a, CellKey, CellMembers<ID>>,
    seen: &'a mut FxHashSet<Pair<ID>>,
    cell: Option<(CellKey, &'a [ID])>,
    step: usize,
    lhs: &'a [ID],
    rhs: &'a [ID],
    i: usize,
    j: usize,
    same_cell: bool,
}

impl<'a, ID, S> Candidates<'a, ID, S>
where
    ID: Handle,
    S: BaseFloat
{
    fn begin(&mut self, lhs: &'a [ID], rhs: &'a [ID], same_cell: bool) {
        self.lhs = lhs;
        self.rhs = rhs;
        self.same_cell = same_cell;
        self.i = 0;
        self.j = if same_cell { 1 } else { 0 };
    }

    /// Move on to the next (cell, neighbor) block; `false` once the grid is exhausted
    fn advance(&mut self) -> bool {
        loop {
            if let Some((key, members)) = self.cell {
                let step = self.step;
                self.step += 1;
                if step == 0 {
                    self.begin(members, members, true);
                    return true;
                }
                if let Some(&(dcol, drow)) = FORWARD_NEIGHBORS.get(step - 1) {
                    let index = self.index;
                    let neighbor = key.offset(dcol, drow)
                        .and_then(|neighbor| index.cell(neighbor));
                    if let Some(neighbor) = neighbor {
                        self.begin(members, neighbor, false);
                        return true;
                    }
                    continue;
                }
            }
            match self.cells.next() {
                Some((&key, members)) => {
                    self.cell = Some((key, members.as_slice()));
                    self.step = 0;
                }
                None => {
                    self.cell = None;
                    self.lhs = &[];
                    return false;
                }
            }
        }
    }
}

impl<'a, ID, S> Iterator for Candidates<'a, ID, S>
where
    ID: Handle,
    S: BaseFloat
{
    type Item = Pair<ID>;

    fn next(&mut self) -> Option<Pair<ID>> {
        loop {
            if self.i >= self.lhs.len() {
                if !self.advance() {
                    return None;
                }
                continue;
            }
            if self.j >= self.rhs.len() {
                self.i += 1;
                self.j = if self.same_cell { self.i + 1 } else { 0 };
                continue;
            }

            let (lhs, rhs) = (self.lhs[self.i], self.rhs[self.j]);
            self.j += 1;

            if let Some(pair) = Pair::new(lhs, rhs) {
                if self.seen.insert(pair) {
                    return Some(pair);
                }
            }
        }
    }
}
