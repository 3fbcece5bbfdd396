//! Actor identifiers and their allocator.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Monotonic allocator. Ids are opaque externally and never reused within an
/// engine instance.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_actor: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_actor(&mut self) -> ActorId {
        let id = ActorId(self.next_actor);
        self.next_actor = self.next_actor.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_actor(), ActorId(0));
        assert_eq!(alloc.alloc_actor(), ActorId(1));
        assert_eq!(alloc.alloc_actor(), ActorId(2));
    }
}
