// gridphase, 20261019

use super::error::InteractionError;
use super::geom::{Bounds, Shape};
use super::traits::Handle;

use cgmath::{BaseFloat, Point2};
use num_traits::NumCast;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use std::collections::hash_map;
use std::convert::TryFrom;
use std::fmt::{Debug, Formatter};

/// Objects spanning more cells than this are logged; they usually mean the cell size is too small
const LARGE_OBJECT_CELLS: u64 = 16;

pub(crate) type CellMembers<ID> = SmallVec<[ID; 8]>;

/// A grid cell, `floor(position / cell_size)` on each axis
///
/// Rows grow with `y`.  `Ord` is row-major so sorted keys read like the grid.
#[cfg_attr(feature="serde", derive(Deserialize, Serialize))]
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct CellKey {
    pub row: i32,
    pub col: i32,
}

impl CellKey {
    pub fn new(col: i32, row: i32) -> Self {
        Self{row, col}
    }

    /// The key `(dcol, drow)` away, or `None` past the edge of the grid
    pub fn offset(self, dcol: i32, drow: i32) -> Option<Self> {
        Some(Self::new(self.col.checked_add(dcol)?, self.row.checked_add(drow)?))
    }

    fn of_point<S>(point: Point2<S>, cell_size: S) -> Option<Self>
    where
        S: BaseFloat
    {
        Some(Self::new(
            <i32 as NumCast>::from((point.x / cell_size).floor())?,
            <i32 as NumCast>::from((point.y / cell_size).floor())?))
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.row, self.col).cmp(&(other.row, other.col))
    }
}

impl Debug for CellKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "CellKey{{col={}, row={}}}", self.col, self.row)
    }
}

/// An inclusive rectangle of cells
#[cfg_attr(feature="serde", derive(Deserialize, Serialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CellRange {
    pub min: CellKey,
    pub max: CellKey,
}

impl CellRange {
    pub fn new(min: CellKey, max: CellKey) -> Self {
        Self{min, max}
    }

    pub fn single(key: CellKey) -> Self {
        Self::new(key, key)
    }

    /// The cells overlapped by a closed bounding box
    pub fn covering<S>(bounds: Bounds<Point2<S>>, cell_size: S) -> Option<Self>
    where
        S: BaseFloat
    {
        let min = CellKey::of_point(bounds.min, cell_size)?;
        let max = CellKey::of_point(bounds.max, cell_size)?;
        if min.col > max.col || min.row > max.row {
            return None;
        }
        Some(Self::new(min, max))
    }

    pub fn contains(self, key: CellKey) -> bool {
        self.min.col <= key.col && key.col <= self.max.col &&
        self.min.row <= key.row && key.row <= self.max.row
    }

    pub fn intersects(self, other: Self) -> bool {
        self.min.col <= other.max.col && other.min.col <= self.max.col &&
        self.min.row <= other.max.row && other.min.row <= self.max.row
    }

    /// Grow by `cells` on every side, saturating at the edge of the grid
    pub fn dilate(self, cells: u32) -> Self {
        let cells = i32::try_from(cells).unwrap_or(i32::max_value());
        Self::new(
            CellKey::new(self.min.col.saturating_sub(cells), self.min.row.saturating_sub(cells)),
            CellKey::new(self.max.col.saturating_add(cells), self.max.row.saturating_add(cells)))
    }

    /// Number of cells in the range, saturating at `u64::MAX`
    pub fn len(self) -> u64 {
        let span = |min: i32, max: i32| (<i64 as From<i32>>::from(max) - <i64 as From<i32>>::from(min) + 1) as u64;
        span(self.min.col, self.max.col).saturating_mul(span(self.min.row, self.max.row))
    }

    /// Every key in the range, row by row
    pub fn iter(self) -> impl Iterator<Item = CellKey> {
        let (min_col, max_col) = (self.min.col, self.max.col);
        (self.min.row..=self.max.row)
            .flat_map(move |row| (min_col..=max_col).map(move |col| CellKey::new(col, row)))
    }
}

#[derive(Clone, Copy, Debug)]
struct Occupancy<S> {
    shape: Shape<S>,
    cells: CellRange,
}

/// A uniform grid of square cells mapping space to the handles inside it
///
/// `cells` and `objects` are kept as mutual inverses: a handle is listed in a cell exactly when that
/// cell falls inside the handle's `CellRange`.  Cells with no members are not stored.
///
/// Every mutation validates its input before touching either map, so a failed call changes nothing.

#[derive(Clone)]
pub struct SpatialIndex<ID, S>
where
    ID: Handle,
    S: BaseFloat
{
    cell_size: S,
    cells: FxHashMap<CellKey, CellMembers<ID>>,
    objects: FxHashMap<ID, Occupancy<S>>,
}

impl<ID, S> SpatialIndex<ID, S>
where
    ID: Handle,
    S: BaseFloat
{
    pub fn new(cell_size: S) -> Result<Self, InteractionError<ID>> {
        Self::with_capacity(cell_size, 0)
    }

    pub fn with_capacity(cell_size: S, objects: usize) -> Result<Self, InteractionError<ID>> {
        if !(cell_size.is_finite() && cell_size > S::zero()) {
            return Err(InteractionError::InvalidConfiguration(
                format!("cell size must be finite and positive (got {:?})", cell_size)));
        }
        let mut cells = FxHashMap::default();
        cells.reserve(objects);
        let mut objects_ = FxHashMap::default();
        objects_.reserve(objects);
        Ok(Self{cell_size, cells, objects: objects_})
    }

    pub fn cell_size(&self) -> S {
        self.cell_size
    }

    /// The cells a shape would occupy, or `None` if it cannot be placed on the grid
    pub fn cell_range(&self, shape: &Shape<S>) -> Option<CellRange> {
        Self::range_of(shape, self.cell_size)
    }

    fn range_of(shape: &Shape<S>, cell_size: S) -> Option<CellRange> {
        if !shape.is_valid() {
            return None;
        }
        CellRange::covering(shape.bounds(), cell_size)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ID) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn shape(&self, id: ID) -> Option<&Shape<S>> {
        self.objects.get(&id).map(|occupancy| &occupancy.shape)
    }

    pub fn cells_of(&self, id: ID) -> Option<CellRange> {
        self.objects.get(&id).map(|occupancy| occupancy.cells)
    }

    /// Members of a single cell, in no particular order
    pub fn cell(&self, key: CellKey) -> Option<&[ID]> {
        self.cells.get(&key).map(|members| members.as_slice())
    }

    pub fn handles<'a>(&'a self) -> impl Iterator<Item = ID> + 'a {
        self.objects.keys().copied()
    }

    pub fn occupied_cells<'a>(&'a self) -> impl Iterator<Item = CellKey> + 'a {
        self.cells.keys().copied()
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn cell_map(&self) -> hash_map::Iter<CellKey, CellMembers<ID>> {
        self.cells.iter()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.objects.clear();
    }

    pub fn insert(&mut self, id: ID, shape: Shape<S>) -> Result<(), InteractionError<ID>> {
        if self.objects.contains_key(&id) {
            return Err(InteractionError::DuplicateHandle(id));
        }
        let range = self.cell_range(&shape)
            .ok_or(InteractionError::InvalidShape(id))?;

        Self::check_span(id, range);
        for key in range.iter() {
            self.cells.entry(key).or_default().push(id);
        }
        self.objects.insert(id, Occupancy{shape, cells: range});
        trace!("inserted {:?} into {:?}", id, range);
        Ok(())
    }

    /// Remove a handle from every cell it occupies, returning its last shape
    pub fn remove(&mut self, id: ID) -> Result<Shape<S>, InteractionError<ID>> {
        let occupancy = self.objects.remove(&id)
            .ok_or(InteractionError::UnknownHandle(id))?;
        for key in occupancy.cells.iter() {
            self.detach(key, id);
        }
        trace!("removed {:?} from {:?}", id, occupancy.cells);
        Ok(occupancy.shape)
    }

    /// Move a handle to a new shape, touching only the cells it enters or leaves
    ///
    /// Returns `false` if the handle's cells did not change (its shape is still updated).
    pub fn relocate(&mut self, id: ID, shape: Shape<S>) -> Result<bool, InteractionError<ID>> {
        let cell_size = self.cell_size;
        let occupancy = self.objects.get_mut(&id)
            .ok_or(InteractionError::UnknownHandle(id))?;
        let range = Self::range_of(&shape, cell_size)
            .ok_or(InteractionError::InvalidShape(id))?;

        let old = occupancy.cells;
        occupancy.shape = shape;
        if old == range {
            return Ok(false);
        }
        occupancy.cells = range;

        Self::check_span(id, range);
        for key in old.iter().filter(|&key| !range.contains(key)) {
            self.detach(key, id);
        }
        for key in range.iter().filter(|&key| !old.contains(key)) {
            self.cells.entry(key).or_default().push(id);
        }
        trace!("relocated {:?} from {:?} to {:?}", id, old, range);
        Ok(true)
    }

    /// The union of handles found in a range of cells, sorted and without duplicates
    pub fn query_region(&self, range: CellRange) -> Vec<ID> {
        let mut found = Vec::new();
        if range.len() <= self.cells.len() as u64 {
            for key in range.iter() {
                if let Some(members) = self.cells.get(&key) {
                    found.extend(members.iter().copied());
                }
            }
        } else {
            for (_, members) in self.cells.iter().filter(|&(&key, _)| range.contains(key)) {
                found.extend(members.iter().copied());
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Handles in the cells overlapped by `bounds`; `None` if the bounds cannot be placed on the grid
    pub fn query_bounds(&self, bounds: Bounds<Point2<S>>) -> Option<Vec<ID>> {
        CellRange::covering(bounds, self.cell_size)
            .map(|range| self.query_region(range))
    }

    /// Handles within `radius` cells of the cells occupied by `id`, excluding `id`
    pub fn neighbors(&self, id: ID, radius: u32) -> Result<Vec<ID>, InteractionError<ID>> {
        let range = self.cells_of(id)
            .ok_or(InteractionError::UnknownHandle(id))?;
        let mut found = self.query_region(range.dilate(radius));
        found.retain(|&other| other != id);
        Ok(found)
    }

    fn detach(&mut self, key: CellKey, id: ID) {
        if let hash_map::Entry::Occupied(mut entry) = self.cells.entry(key) {
            let members = entry.get_mut();
            if let Some(position) = members.iter().position(|&member| member == id) {
                members.swap_remove(position);
            }
            if members.is_empty() {
                entry.remove();
            }
        }
    }

    fn check_span(id: ID, range: CellRange) {
        if range.len() > LARGE_OBJECT_CELLS {
            warn!("{:?} spans {} cells; increase the cell size or split large objects", id, range.len());
        }
    }

    /// Panics unless `cells` and `objects` are mutual inverses
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (&key, members) in self.cells.iter() {
            assert!(!members.is_empty(), "empty cell {:?} retained", key);
            for &id in members.iter() {
                let occupancy = self.objects.get(&id)
                    .unwrap_or_else(|| panic!("{:?} listed in {:?} but not registered", id, key));
                assert!(occupancy.cells.contains(key), "{:?} listed in {:?} outside its range", id, key);
                assert_eq!(members.iter().filter(|&&member| member == id).count(), 1);
            }
        }
        for (&id, occupancy) in self.objects.iter() {
            for key in occupancy.cells.iter() {
                let listed = self.cells.get(&key)
                    .map_or(false, |members| members.contains(&id));
                assert!(listed, "{:?} missing from {:?}", id, key);
            }
        }
    }
}
