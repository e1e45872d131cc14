use crate::{shapes_match_mut, shapes_of, total_len, BufferMut, BufferRef, Storage};
use ndarray::{s, Array2};
use revolve_model::{Element, StorageError};

/// One contiguous `C x S` slab of the element type; slot `k` is row `k`.
/// Zero I/O cost — `save`/`load` are plain element-wise copies.
pub struct MemoryStorage<E: Element> {
    slab: Array2<E>,
    shapes: Vec<Option<Vec<Vec<usize>>>>,
    stack_top: i32,
    capacity: u32,
    slot_size: usize,
}

impl<E: Element> MemoryStorage<E> {
    /// `capacity` slots, each holding up to `slot_size` elements (`S`).
    pub fn new(capacity: u32, slot_size: usize) -> Self {
        let slab = Array2::from_elem((capacity as usize, slot_size), E::default());
        MemoryStorage {
            slab,
            shapes: vec![None; capacity as usize],
            stack_top: -1,
            capacity,
            slot_size,
        }
    }
}

impl<E: Element> Storage<E> for MemoryStorage<E> {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn stack_top(&self) -> i32 {
        self.stack_top
    }

    fn set_stack_top(&mut self, value: i32) {
        self.stack_top = value;
    }

    fn save(&mut self, key: u32, buffers: &[BufferRef<'_, E>]) -> Result<(), StorageError> {
        let n = total_len(buffers);
        if n > self.slot_size {
            return Err(StorageError::Overflow {
                key,
                size: n,
                capacity: self.slot_size,
            });
        }
        let mut row = self.slab.row_mut(key as usize);
        let mut offset = 0;
        for b in buffers {
            row.slice_mut(s![offset..offset + b.data.len()])
                .assign(&ndarray::ArrayView1::from(b.data));
            offset += b.data.len();
        }
        self.shapes[key as usize] = Some(shapes_of(buffers));
        tracing::trace!(target: "revolve.storage.memory", key, n, "saved");
        Ok(())
    }

    fn load(&mut self, key: u32, buffers: &mut [BufferMut<'_, E>]) -> Result<(), StorageError> {
        let recorded = self.shapes[key as usize]
            .clone()
            .ok_or(StorageError::Uninitialized { key })?;
        if !shapes_match_mut(buffers, &recorded) {
            return Err(StorageError::ShapeMismatch { key });
        }
        let row = self.slab.row(key as usize);
        let mut offset = 0;
        for b in buffers.iter_mut() {
            let src = row.slice(s![offset..offset + b.data.len()]);
            b.data.copy_from_slice(src.as_slice().expect("row is contiguous"));
            offset += b.data.len();
        }
        tracing::trace!(target: "revolve.storage.memory", key, "loaded");
        Ok(())
    }
}
