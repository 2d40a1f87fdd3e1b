use super::geom::{Extent, Shape};
use super::pair::Pair;

use cgmath::{BaseFloat, MetricSpace, Vector2};

/// The exact test run on each broad-phase candidate
///
/// Implementations must be pure: the manager may call `confirms` in any order, and from several threads
/// with the `parallel` feature.  Any `Fn(Pair<ID>, &Shape<S>, &Shape<S>) -> bool` is a `NarrowPhase`.
pub trait NarrowPhase<ID, S>
where
    S: BaseFloat
{
    fn confirms(&self, pair: Pair<ID>, lhs: &Shape<S>, rhs: &Shape<S>) -> bool;

    /// The largest gap between two bounding boxes this test may still confirm
    ///
    /// Candidates only come from adjacent cells, so this may not exceed the cell size.
    fn reach(&self) -> S {
        S::zero()
    }
}

impl<ID, S, F> NarrowPhase<ID, S> for F
where
    S: BaseFloat,
    F: Fn(Pair<ID>, &Shape<S>, &Shape<S>) -> bool
{
    fn confirms(&self, pair: Pair<ID>, lhs: &Shape<S>, rhs: &Shape<S>) -> bool {
        self(pair, lhs, rhs)
    }
}

/// Centre distance no greater than the sum of both extents read as radii
#[derive(Clone, Copy, Debug, Default)]
pub struct RadiusOverlap;

impl<ID, S> NarrowPhase<ID, S> for RadiusOverlap
where
    S: BaseFloat
{
    fn confirms(&self, _: Pair<ID>, lhs: &Shape<S>, rhs: &Shape<S>) -> bool {
        let reach = lhs.extent.radius() + rhs.extent.radius();
        lhs.position.distance2(rhs.position) <= reach * reach
    }
}

/// Overlap of the closed bounding boxes
#[derive(Clone, Copy, Debug, Default)]
pub struct AabbOverlap;

impl<ID, S> NarrowPhase<ID, S> for AabbOverlap
where
    S: BaseFloat
{
    fn confirms(&self, _: Pair<ID>, lhs: &Shape<S>, rhs: &Shape<S>) -> bool {
        lhs.bounds().intersects(rhs.bounds())
    }
}

/// Exact overlap of circles, boxes and points
#[derive(Clone, Copy, Debug, Default)]
pub struct ShapeOverlap;

impl<ID, S> NarrowPhase<ID, S> for ShapeOverlap
where
    S: BaseFloat
{
    fn confirms(&self, _: Pair<ID>, lhs: &Shape<S>, rhs: &Shape<S>) -> bool {
        within(lhs, rhs, S::zero())
    }
}

/// Shapes whose surfaces are at most `range` apart
///
/// `range` is measured like [`ShapeOverlap`], so `range = 0` matches it exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WithinRange<S> {
    pub range: S,
}

impl<S> WithinRange<S> {
    pub fn new(range: S) -> Self {
        Self{range}
    }
}

impl<ID, S> NarrowPhase<ID, S> for WithinRange<S>
where
    S: BaseFloat
{
    fn confirms(&self, _: Pair<ID>, lhs: &Shape<S>, rhs: &Shape<S>) -> bool {
        within(lhs, rhs, self.range)
    }

    fn reach(&self) -> S {
        self.range
    }
}

fn within<S>(lhs: &Shape<S>, rhs: &Shape<S>, range: S) -> bool
where
    S: BaseFloat
{
    match (lhs.extent, rhs.extent) {
        (Extent::Radius(lhs_radius), Extent::Radius(rhs_radius)) => {
            let reach = lhs_radius + rhs_radius + range;
            lhs.position.distance2(rhs.position) <= reach * reach
        }
        (Extent::HalfExtents(_), Extent::HalfExtents(_)) => {
            box_box(lhs, rhs, range)
        }
        (Extent::Radius(radius), Extent::HalfExtents(_)) => {
            circle_box(lhs.position, radius + range, rhs)
        }
        (Extent::HalfExtents(_), Extent::Radius(radius)) => {
            circle_box(rhs.position, radius + range, lhs)
        }
    }
}

/// Euclidean gap between two boxes; the per-axis gaps are zero where the boxes overlap on that axis
fn box_box<S>(lhs: &Shape<S>, rhs: &Shape<S>, range: S) -> bool
where
    S: BaseFloat
{
    let (lhs, rhs) = (lhs.bounds(), rhs.bounds());
    let dx = (rhs.min.x - lhs.max.x).max(lhs.min.x - rhs.max.x).max(S::zero());
    let dy = (rhs.min.y - lhs.max.y).max(lhs.min.y - rhs.max.y).max(S::zero());
    dx * dx + dy * dy <= range * range
}

fn circle_box<S>(centre: cgmath::Point2<S>, radius: S, boxed: &Shape<S>) -> bool
where
    S: BaseFloat
{
    let nearest = boxed.bounds().closest_point(centre);
    let offset: Vector2<S> = nearest - centre;
    offset.x * offset.x + offset.y * offset.y <= radius * radius
}
