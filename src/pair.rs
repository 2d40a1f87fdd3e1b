use super::traits::Handle;

/// An unordered pair of distinct handles, stored lower handle first
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Pair<ID>(ID, ID);

impl<ID> Pair<ID>
where
    ID: Handle
{
    /// Canonicalize `{lhs, rhs}`; `None` for a self pair
    pub fn new(lhs: ID, rhs: ID) -> Option<Self> {
        if lhs < rhs {
            Some(Pair(lhs, rhs))
        } else if rhs < lhs {
            Some(Pair(rhs, lhs))
        } else {
            None
        }
    }

    pub fn lhs(self) -> ID {
        self.0
    }

    pub fn rhs(self) -> ID {
        self.1
    }

    pub fn contains(self, id: ID) -> bool {
        self.0 == id || self.1 == id
    }

    /// The partner of `id` in this pair
    pub fn other(self, id: ID) -> Option<ID> {
        if self.0 == id {
            Some(self.1)
        } else if self.1 == id {
            Some(self.0)
        } else {
            None
        }
    }

    /// The handles in canonical order
    pub fn into_tuple(self) -> (ID, ID) {
        (self.0, self.1)
    }
}
