use cgmath::{BaseFloat, Point2, Vector2};

use std::ops::BitOr;

/// The collision groups an object belongs to, one bit per group
///
/// Two objects can only interact when they share at least one group.  Objects belong to every group
/// unless told otherwise.
#[cfg_attr(feature="serde", derive(Deserialize, Serialize))]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Groups(pub u32);

impl Groups {
    pub const ALL: Groups = Groups(!0);
    pub const NONE: Groups = Groups(0);

    /// The single group `index`, or `None` past the 32 available groups
    pub fn group(index: u32) -> Option<Self> {
        1u32.checked_shl(index).map(Groups)
    }

    pub fn shares(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for Groups {
    fn default() -> Self {
        Groups::ALL
    }
}

impl BitOr for Groups {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Groups(self.0 | other.0)
    }
}

/// The spatial reach of an object around its position
///
/// A point is a zero radius.
#[cfg_attr(feature="serde", derive(Deserialize, Serialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Extent<S> {
    Radius(S),
    HalfExtents(Vector2<S>),
}

impl<S> Extent<S>
where
    S: BaseFloat
{
    pub fn point() -> Self {
        Extent::Radius(S::zero())
    }

    /// Half the size of the axis-aligned box enclosing this extent
    pub fn half_size(self) -> Vector2<S> {
        match self {
            Extent::Radius(radius) => Vector2::new(radius, radius),
            Extent::HalfExtents(half) => half,
        }
    }

    /// The extent read as a radius
    ///
    /// Half-extents give their inscribed radius (the smaller axis), so the circle never leaves the box
    /// the grid indexes.
    pub fn radius(self) -> S {
        match self {
            Extent::Radius(radius) => radius,
            Extent::HalfExtents(half) => half.x.min(half.y),
        }
    }

    pub fn is_valid(self) -> bool {
        let half = self.half_size();
        half.x.is_finite() && half.y.is_finite() &&
        half.x >= S::zero() && half.y >= S::zero()
    }
}

/// A participant's position, extent and collision groups for a single tick
#[cfg_attr(feature="serde", derive(Deserialize, Serialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shape<S> {
    pub position: Point2<S>,
    pub extent: Extent<S>,
    pub groups: Groups,
}

impl<S> Shape<S>
where
    S: BaseFloat
{
    pub fn new(position: Point2<S>, extent: Extent<S>) -> Self {
        Self{position, extent, groups: Groups::ALL}
    }

    pub fn with_groups(self, groups: Groups) -> Self {
        Self{groups, ..self}
    }

    pub fn point(x: S, y: S) -> Self {
        Self::new(Point2::new(x, y), Extent::point())
    }

    pub fn circle(x: S, y: S, radius: S) -> Self {
        Self::new(Point2::new(x, y), Extent::Radius(radius))
    }

    pub fn aabb(x: S, y: S, half_width: S, half_height: S) -> Self {
        Self::new(Point2::new(x, y), Extent::HalfExtents(Vector2::new(half_width, half_height)))
    }

    pub fn is_valid(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.extent.is_valid()
    }

    pub fn bounds(&self) -> Bounds<Point2<S>> {
        let half = self.extent.half_size();
        Bounds::new(self.position - half, self.position + half)
    }
}

/// An axis-aligned bounding box, closed on every side
#[cfg_attr(feature="serde", derive(Deserialize, Serialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds<Point> {
    pub min: Point,
    pub max: Point
}

impl<Point> Bounds<Point> {
    pub fn new(min: Point, max: Point) -> Self {
        Self{min, max}
    }
}

impl<S> Bounds<Point2<S>>
where
    S: BaseFloat
{
    pub fn intersects(self, other: Self) -> bool {
        self.min.x <= other.max.x &&
        self.min.y <= other.max.y &&
        self.max.x >= other.min.x &&
        self.max.y >= other.min.y
    }

    pub fn contains_point(self, point: Point2<S>) -> bool {
        self.min.x <= point.x &&
        self.min.y <= point.y &&
        self.max.x >= point.x &&
        self.max.y >= point.y
    }

    /// Grow every side by `margin`
    pub fn expand(self, margin: S) -> Self {
        let margin = Vector2::new(margin, margin);
        Self::new(self.min - margin, self.max + margin)
    }

    /// The point inside the box nearest to `point`
    pub fn closest_point(self, point: Point2<S>) -> Point2<S> {
        Point2::new(
            point.x.max(self.min.x).min(self.max.x),
            point.y.max(self.min.y).min(self.max.y))
    }
}
