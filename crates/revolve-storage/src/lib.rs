//! Storage tier abstractions (§4.1): fixed-capacity snapshot stores shared
//! by the Classic Revolve (`save`/`load`, explicit keys) and H-Revolve
//! (`push`/`peek`/`pop`, stack discipline) schedulers.

mod byteslab;
mod disk;
mod memory;

pub use byteslab::ByteSlabStorage;
pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use revolve_model::{Element, StorageError};

/// One live or to-be-restored buffer, tagged with its shape so heterogeneous
/// multi-buffer snapshots round-trip correctly. `shape`'s product is the
/// buffer's element count.
pub struct BufferRef<'a, E> {
    pub data: &'a [E],
    pub shape: &'a [usize],
}

pub struct BufferMut<'a, E> {
    pub data: &'a mut [E],
    pub shape: &'a [usize],
}

impl<'a, E> BufferRef<'a, E> {
    pub fn new(data: &'a [E], shape: &'a [usize]) -> Self {
        BufferRef { data, shape }
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

impl<'a, E> BufferMut<'a, E> {
    pub fn new(data: &'a mut [E], shape: &'a [usize]) -> Self {
        BufferMut { data, shape }
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// Contract shared by the Memory, Disk, and byte-slab tiers. `save`/`load`
/// address slots directly by key; `push`/`peek`/`pop` treat the tier as a
/// LIFO stack via an internal `stack_top`. Mixing both interfaces on one
/// tier instance is undefined, per §4.1.
pub trait Storage<E: Element> {
    /// Fixed number of checkpoint slots `C`.
    fn capacity(&self) -> u32;

    /// Current stack pointer; -1 when empty. Only meaningful to
    /// `push`/`peek`/`pop` callers.
    fn stack_top(&self) -> i32;

    fn save(&mut self, key: u32, buffers: &[BufferRef<'_, E>]) -> Result<(), StorageError>;

    fn load(&mut self, key: u32, buffers: &mut [BufferMut<'_, E>]) -> Result<(), StorageError>;

    fn push(&mut self, buffers: &[BufferRef<'_, E>]) -> Result<(), StorageError> {
        let next = self.stack_top() + 1;
        if next as u32 >= self.capacity() {
            return Err(StorageError::Full);
        }
        self.save(next as u32, buffers)?;
        self.set_stack_top(next);
        Ok(())
    }

    fn peek(&mut self, buffers: &mut [BufferMut<'_, E>]) -> Result<(), StorageError> {
        if self.stack_top() < 0 {
            return Ok(());
        }
        self.load(self.stack_top() as u32, buffers)
    }

    fn pop(&mut self, buffers: &mut [BufferMut<'_, E>]) -> Result<(), StorageError> {
        if self.stack_top() < 0 {
            return Err(StorageError::Empty);
        }
        self.load(self.stack_top() as u32, buffers)?;
        self.set_stack_top(self.stack_top() - 1);
        Ok(())
    }

    /// Internal to the default push/pop implementations above; tiers track
    /// their own `stack_top` field.
    #[doc(hidden)]
    fn set_stack_top(&mut self, value: i32);
}

/// Validates that a slot's declared shapes (recorded at `save` time) match
/// the shapes a caller is now presenting to `load`/`peek`/`pop`, and that
/// the total element count fits within `per_slot_capacity`.
pub(crate) fn total_len<E>(buffers: &[BufferRef<'_, E>]) -> usize {
    buffers.iter().map(BufferRef::len).sum()
}

pub(crate) fn total_len_mut<E>(buffers: &[BufferMut<'_, E>]) -> usize {
    buffers.iter().map(BufferMut::len).sum()
}

pub(crate) fn shapes_of<E>(buffers: &[BufferRef<'_, E>]) -> Vec<Vec<usize>> {
    buffers.iter().map(|b| b.shape.to_vec()).collect()
}

pub(crate) fn shapes_match_mut<E>(buffers: &[BufferMut<'_, E>], recorded: &[Vec<usize>]) -> bool {
    buffers.len() == recorded.len()
        && buffers
            .iter()
            .zip(recorded.iter())
            .all(|(b, s)| b.shape == s.as_slice())
}
