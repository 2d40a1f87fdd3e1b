// gridphase, 20261019

//! Broad-phase interaction tracking for 2D objects
//!
//! Objects are hashed into a uniform grid of square cells.  Each tick, pairs sharing a cell or sitting in
//! adjacent cells become candidates, a [`NarrowPhase`] test confirms or rejects them, and a
//! [`PairRegistry`] turns the confirmed set into `ended`, `ongoing` and `started` events.
//!
//! ```
//! use gridphase::{InteractionManager, Pair, Shape};
//!
//! let mut manager = InteractionManager::<u32, f32, _>::new(10.0).unwrap();
//! let events = manager.tick(vec![
//!     (1, Shape::circle(1.0, 1.0, 1.0)),
//!     (2, Shape::circle(2.0, 2.0, 1.0)),
//!     (3, Shape::circle(90.0, 90.0, 1.0))]).unwrap();
//! assert_eq!(events.started, vec![Pair::new(1, 2).unwrap()]);
//! ```

extern crate cgmath;
extern crate num_traits;
extern crate rustc_hash;
extern crate smallvec;

#[macro_use]
extern crate log;

#[cfg(feature="serde")]
#[macro_use]
extern crate serde;

mod candidates;
mod error;
mod geom;
mod index;
mod manager;
mod narrow;
mod pair;
mod registry;
mod traits;

pub use candidates::{CandidateGenerator, Candidates};
pub use error::InteractionError;
pub use geom::{Bounds, Extent, Groups, Shape};
pub use index::{CellKey, CellRange, SpatialIndex};
pub use manager::{Config, InteractionHandler, InteractionManager, Phase};
pub use narrow::{AabbOverlap, NarrowPhase, RadiusOverlap, ShapeOverlap, WithinRange};
pub use pair::Pair;
pub use registry::{Events, PairRegistry, PairState};
pub use traits::Handle;
