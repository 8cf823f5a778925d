//! Pool allocator for search labels.
//!
//! Storage grows in blocks that double in size. Released slots form an
//! intrusive free list that is used before the arena grows. Clearing keeps
//! the first block so repeated searches do not reallocate.

use std::mem;
use std::ops::Index;

use super::SearchError;

/// Handle to a label in a [`LabelArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(u32);

impl LabelId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(T),
    Free { next: Option<u32> },
}

#[derive(Debug)]
pub struct LabelArena<T> {
    blocks: Vec<Vec<Slot<T>>>,
    first_block: usize,
    /// Slots handed out by bump allocation.
    bumped: usize,
    free_head: Option<u32>,
    live: usize,
}

impl<T> LabelArena<T> {
    /// Creates an arena whose first block holds `first_block` labels.
    pub fn new(first_block: usize) -> Self {
        let first_block = first_block.max(1);
        Self {
            blocks: vec![Vec::with_capacity(first_block)],
            first_block,
            bumped: 0,
            free_head: None,
            live: 0,
        }
    }

    /// Block index and offset of slot `id`.
    ///
    /// Block `b` has capacity `first_block << b` and starts at slot
    /// `first_block * (2^b - 1)`.
    fn locate(&self, id: usize) -> (usize, usize) {
        let block = (id / self.first_block + 1).ilog2() as usize;
        let start = self.first_block * ((1 << block) - 1);
        (block, id - start)
    }

    fn slot_mut(&mut self, id: u32) -> Option<&mut Slot<T>> {
        let (block, offset) = self.locate(id as usize);
        self.blocks.get_mut(block)?.get_mut(offset)
    }

    /// Stores `value`, reusing a released slot if there is one.
    pub fn alloc(&mut self, value: T) -> Result<LabelId, SearchError> {
        if let Some(head) = self.free_head {
            let slot = self.slot_mut(head).ok_or(SearchError::ArenaExhausted)?;
            let Slot::Free { next } = *slot else {
                return Err(SearchError::ArenaExhausted);
            };
            *slot = Slot::Occupied(value);
            self.free_head = next;
            self.live += 1;
            return Ok(LabelId(head));
        }

        let id = u32::try_from(self.bumped).map_err(|_| SearchError::ArenaExhausted)?;
        let (block, _) = self.locate(self.bumped);
        if block == self.blocks.len() {
            let capacity = self
                .first_block
                .checked_shl(block as u32)
                .ok_or(SearchError::ArenaExhausted)?;
            let mut storage = Vec::new();
            storage
                .try_reserve_exact(capacity)
                .map_err(|_| SearchError::ArenaExhausted)?;
            self.blocks.push(storage);
        }
        self.blocks[block].push(Slot::Occupied(value));
        self.bumped += 1;
        self.live += 1;
        Ok(LabelId(id))
    }

    /// Releases a slot, returning its value. Memory stays in the arena.
    pub fn dealloc(&mut self, id: LabelId) -> Option<T> {
        let next = self.free_head;
        let slot = self.slot_mut(id.0)?;
        if matches!(slot, Slot::Free { .. }) {
            return None;
        }
        let Slot::Occupied(value) = mem::replace(slot, Slot::Free { next }) else {
            return None;
        };
        self.free_head = Some(id.0);
        self.live -= 1;
        Some(value)
    }

    pub fn get(&self, id: LabelId) -> Option<&T> {
        let (block, offset) = self.locate(id.index());
        match self.blocks.get(block)?.get(offset)? {
            Slot::Occupied(value) => Some(value),
            Slot::Free { .. } => None,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Drops every label and all blocks but the first.
    pub fn clear(&mut self) {
        self.blocks.truncate(1);
        if let Some(first) = self.blocks.first_mut() {
            first.clear();
        }
        self.bumped = 0;
        self.free_head = None;
        self.live = 0;
    }

    /// Bytes reserved by all blocks.
    pub fn bytes_in_use(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.capacity() * mem::size_of::<Slot<T>>())
            .sum()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl<T> Index<LabelId> for LabelArena<T> {
    type Output = T;

    /// Panics if the slot was released.
    fn index(&self, id: LabelId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("label {} was released", id.0),
        }
    }
}
