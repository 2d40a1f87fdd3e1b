// gridphase, 20261019

use std::fmt::Debug;
use std::hash::Hash;

/// Thread-safety required of handles when the narrow phase may run on the rayon pool
#[cfg(feature="parallel")]
pub trait Shareable: Send + Sync {}

#[cfg(feature="parallel")]
impl<T: Send + Sync> Shareable for T {}

#[cfg(not(feature="parallel"))]
pub trait Shareable {}

#[cfg(not(feature="parallel"))]
impl<T> Shareable for T {}

/// An opaque, caller-owned object identifier
///
/// Handles are compared to canonicalize pairs, so `Ord` must be a total order that stays stable for
/// as long as the handle is live.  The index and registry hash handles and copy them freely; they
/// never create one.
pub trait Handle: Copy + Hash + Ord + Debug + Shareable {}

impl<T> Handle for T
where
    T: Copy + Hash + Ord + Debug + Shareable
{}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
    struct Entity {
        generation: u16,
        slot: u32,
    }

    fn lowest<ID: Handle>(handles: &[ID]) -> Option<ID> {
        handles.iter().copied().min()
    }

    #[test]
    fn custom_handles() {
        let handles = [
            Entity{generation: 2, slot: 0},
            Entity{generation: 1, slot: 7},
            Entity{generation: 1, slot: 3}];
        assert_eq!(lowest(&handles), Some(Entity{generation: 1, slot: 3}));
        assert_eq!(lowest(&[(4u8, 'b'), (4u8, 'a')]), Some((4, 'a')));
        assert_eq!(lowest::<u64>(&[]), None);
    }
}
