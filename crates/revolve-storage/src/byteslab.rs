use crate::{total_len, BufferMut, BufferRef, Storage};
use revolve_compression::{compress_elements, decompress_elements, CompressedObject, CompressionAdapter};
use revolve_model::{Element, ElementKind, StorageError};
use std::marker::PhantomData;

#[derive(Clone)]
struct CompressedEntry {
    shape: Vec<usize>,
    dtype: ElementKind,
    scheme_metadata: Vec<u8>,
    len: usize,
}

/// One `C x S x itemsize` byte slab plus a per-key vector of compressed
/// entries (one per buffer in the snapshot, in order). `save` runs each
/// buffer through the adapter's compressor and concatenates the results
/// into the slot; `load` walks the recorded entries, slices each range back
/// out, and decompresses. The sum of compressed sizes for a slot must not
/// exceed `S * itemsize` (detected at `save`, §4.1).
pub struct ByteSlabStorage<E: Element> {
    slab: Vec<u8>,
    slot_capacity_bytes: usize,
    capacity: u32,
    stack_top: i32,
    adapter: CompressionAdapter,
    entries: Vec<Option<Vec<CompressedEntry>>>,
    _element: PhantomData<E>,
}

impl<E: Element> ByteSlabStorage<E> {
    pub fn new(capacity: u32, slot_size: usize, adapter: CompressionAdapter) -> Self {
        let slot_capacity_bytes = slot_size * E::KIND.itemsize();
        ByteSlabStorage {
            slab: vec![0u8; capacity as usize * slot_capacity_bytes],
            slot_capacity_bytes,
            capacity,
            stack_top: -1,
            adapter,
            entries: vec![None; capacity as usize],
            _element: PhantomData,
        }
    }
}

impl<E: Element> Storage<E> for ByteSlabStorage<E> {
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
        let mut concatenated = Vec::new();
        let mut entries = Vec::with_capacity(buffers.len());
        for b in buffers {
            let object = compress_elements(&self.adapter, b.data, b.shape);
            entries.push(CompressedEntry {
                shape: object.shape.clone(),
                dtype: object.dtype,
                scheme_metadata: object.scheme_metadata.clone(),
                len: object.bytes.len(),
            });
            concatenated.extend_from_slice(&object.bytes);
        }
        if concatenated.len() > self.slot_capacity_bytes {
            return Err(StorageError::Overflow {
                key,
                size: concatenated.len(),
                capacity: self.slot_capacity_bytes,
            });
        }
        let start = key as usize * self.slot_capacity_bytes;
        self.slab[start..start + concatenated.len()].copy_from_slice(&concatenated);
        tracing::trace!(
            target: "revolve.storage.byteslab",
            key,
            raw_count = total_len(buffers),
            compressed_bytes = concatenated.len(),
            "saved"
        );
        self.entries[key as usize] = Some(entries);
        Ok(())
    }

    fn load(&mut self, key: u32, buffers: &mut [BufferMut<'_, E>]) -> Result<(), StorageError> {
        let entries = self.entries[key as usize]
            .clone()
            .ok_or(StorageError::Uninitialized { key })?;
        if entries.len() != buffers.len()
            || entries
                .iter()
                .zip(buffers.iter())
                .any(|(e, b)| e.shape != b.shape)
        {
            return Err(StorageError::ShapeMismatch { key });
        }
        let start = key as usize * self.slot_capacity_bytes;
        let mut cursor = start;
        for (entry, b) in entries.iter().zip(buffers.iter_mut()) {
            let object = CompressedObject {
                bytes: self.slab[cursor..cursor + entry.len].to_vec(),
                shape: entry.shape.clone(),
                dtype: entry.dtype,
                scheme_metadata: entry.scheme_metadata.clone(),
            };
            let decompressed: Vec<E> = decompress_elements(&self.adapter, &object)?;
            b.data.copy_from_slice(&decompressed);
            cursor += entry.len;
        }
        tracing::trace!(target: "revolve.storage.byteslab", key, "loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revolve_compression::{init_compression, CompressionScheme};

    #[test]
    fn round_trips_through_zstd() {
        let adapter = init_compression(CompressionScheme::Zstd { level: 3 });
        let mut storage = ByteSlabStorage::<f64>::new(2, 16, adapter);
        let shape = [16usize];
        let data: Vec<f64> = (0..16).map(|i| i as f64).collect();
        storage.save(0, &[BufferRef::new(&data, &shape)]).unwrap();

        let mut out = vec![0.0; 16];
        storage
            .load(0, &mut [BufferMut::new(&mut out, &shape)])
            .unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn overflowing_slot_capacity_is_overflow() {
        let adapter = init_compression(CompressionScheme::None);
        let mut storage = ByteSlabStorage::<f64>::new(1, 2, adapter);
        let shape = [4usize];
        let data = [1.0, 2.0, 3.0, 4.0];
        let err = storage.save(0, &[BufferRef::new(&data, &shape)]).unwrap_err();
        assert!(matches!(err, StorageError::Overflow { .. }));
    }
}
