use crate::{shapes_match_mut, shapes_of, total_len, BufferMut, BufferRef, Storage};
use revolve_model::{Element, StorageError};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

enum Layout {
    /// One append-friendly binary file; slot `k` begins at `k * slot_size *
    /// itemsize` bytes. No header — shapes live only in `shapes` below and
    /// are lost if the process dies, per §6.
    SingleFile { file: File, path: PathBuf },
    /// One file per key, named with a timestamp + pid to avoid collisions
    /// across concurrent runs sharing a directory.
    PerFile { files: HashMap<u32, PathBuf> },
}

/// Either a single seekable binary file or one file per key, both rooted at
/// `dir`. Removes `dir` on drop unless `keep_files` was set.
pub struct DiskStorage<E: Element> {
    dir: PathBuf,
    capacity: u32,
    slot_size: usize,
    stack_top: i32,
    shapes: Vec<Option<Vec<Vec<usize>>>>,
    layout: Layout,
    keep_files: bool,
    _element: PhantomData<E>,
}

impl<E: Element> DiskStorage<E> {
    pub fn single_file(dir: impl AsRef<Path>, capacity: u32, slot_size: usize, keep_files: bool) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("revolve_{}_{}.bin", std::process::id(), timestamp()));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len((capacity as u64) * (slot_size as u64) * ((E::KIND.itemsize() as u64)))?;
        Ok(DiskStorage {
            dir,
            capacity,
            slot_size,
            stack_top: -1,
            shapes: vec![None; capacity as usize],
            layout: Layout::SingleFile { file, path },
            keep_files,
            _element: PhantomData,
        })
    }

    pub fn per_file(dir: impl AsRef<Path>, capacity: u32, slot_size: usize, keep_files: bool) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(DiskStorage {
            dir,
            capacity,
            slot_size,
            stack_top: -1,
            shapes: vec![None; capacity as usize],
            layout: Layout::PerFile {
                files: HashMap::new(),
            },
            keep_files,
            _element: PhantomData,
        })
    }

    /// Size in bytes of the backing single file, for callers (and tests)
    /// that want to assert `file_size == C * S * itemsize` (S4).
    pub fn file_size(&self) -> std::io::Result<u64> {
        match &self.layout {
            Layout::SingleFile { path, .. } => Ok(fs::metadata(path)?.len()),
            Layout::PerFile { .. } => {
                let mut total = 0;
                for entry in fs::read_dir(&self.dir)? {
                    total += entry?.metadata()?.len();
                }
                Ok(total)
            }
        }
    }

    fn write_bytes(&mut self, key: u32, bytes: &[u8]) -> std::io::Result<()> {
        match &mut self.layout {
            Layout::SingleFile { file, .. } => {
                let offset = (key as u64) * (self.slot_size as u64) * ((E::KIND.itemsize() as u64));
                file.seek(SeekFrom::Start(offset))?;
                file.write_all(bytes)?;
                file.flush()?;
            }
            Layout::PerFile { files } => {
                if let Some(old) = files.remove(&key) {
                    let _ = fs::remove_file(old);
                }
                let path = self.dir.join(format!(
                    "revolve_ckp{}_{}_{}.bin",
                    key,
                    std::process::id(),
                    timestamp()
                ));
                let mut f = File::create(&path)?;
                f.write_all(bytes)?;
                f.flush()?;
                files.insert(key, path);
            }
        }
        Ok(())
    }

    fn read_bytes(&mut self, key: u32, len: usize) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        match &mut self.layout {
            Layout::SingleFile { file, .. } => {
                let offset = (key as u64) * (self.slot_size as u64) * ((E::KIND.itemsize() as u64));
                file.seek(SeekFrom::Start(offset))?;
                file.read_exact(&mut buf)?;
            }
            Layout::PerFile { files } => {
                let path = files.get(&key).expect("save recorded this key's path");
                let mut f = File::open(path)?;
                f.read_exact(&mut buf)?;
            }
        }
        Ok(buf)
    }
}

impl<E: Element> Storage<E> for DiskStorage<E> {
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
        let mut flat = Vec::with_capacity(n);
        for b in buffers {
            flat.extend_from_slice(b.data);
        }
        let bytes = E::to_le_bytes_vec(&flat);
        self.write_bytes(key, &bytes)
            .map_err(|e| StorageError::Io(format!("write failed for key {key}: {e}")))?;
        self.shapes[key as usize] = Some(shapes_of(buffers));
        tracing::trace!(target: "revolve.storage.disk", key, n, "saved");
        Ok(())
    }

    fn load(&mut self, key: u32, buffers: &mut [BufferMut<'_, E>]) -> Result<(), StorageError> {
        let recorded = self.shapes[key as usize]
            .clone()
            .ok_or(StorageError::Uninitialized { key })?;
        if !shapes_match_mut(buffers, &recorded) {
            return Err(StorageError::ShapeMismatch { key });
        }
        let n: usize = recorded.iter().map(|s| s.iter().product::<usize>()).sum();
        let byte_len = n * E::KIND.itemsize();
        let bytes = self
            .read_bytes(key, byte_len)
            .map_err(|e| StorageError::Io(format!("read failed for key {key}: {e}")))?;
        let flat = E::from_le_bytes_vec(&bytes);
        let mut offset = 0;
        for b in buffers.iter_mut() {
            b.data.copy_from_slice(&flat[offset..offset + b.data.len()]);
            offset += b.data.len();
        }
        tracing::trace!(target: "revolve.storage.disk", key, "loaded");
        Ok(())
    }
}

impl<E: Element> Drop for DiskStorage<E> {
    fn drop(&mut self) {
        if !self.keep_files {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }
}

fn timestamp() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the epoch")
        .as_nanos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferRef;

    #[test]
    fn single_file_round_trips_and_reports_size() {
        let tmp = tempfile::tempdir().unwrap();
        let mut storage = DiskStorage::<f64>::single_file(tmp.path(), 4, 8, false).unwrap();
        let shape = [8usize];
        let data = [1.0; 8];
        storage.save(1, &[BufferRef::new(&data, &shape)]).unwrap();

        let mut out = [0.0; 8];
        storage
            .load(1, &mut [BufferMut::new(&mut out, &shape)])
            .unwrap();
        assert_eq!(out, data);
        assert_eq!(storage.file_size().unwrap(), 4 * 8 * 8);
    }

    #[test]
    fn per_file_round_trips_and_overwrites_key() {
        let tmp = tempfile::tempdir().unwrap();
        let mut storage = DiskStorage::<f32>::per_file(tmp.path(), 2, 4, false).unwrap();
        let shape = [4usize];
        storage
            .save(0, &[BufferRef::new(&[1.0, 1.0, 1.0, 1.0], &shape)])
            .unwrap();
        storage
            .save(0, &[BufferRef::new(&[2.0, 2.0, 2.0, 2.0], &shape)])
            .unwrap();

        let mut out = [0.0f32; 4];
        storage
            .load(0, &mut [BufferMut::new(&mut out, &shape)])
            .unwrap();
        assert_eq!(out, [2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn drop_removes_directory_unless_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("ckp");
        {
            let _storage = DiskStorage::<f32>::single_file(&dir, 1, 1, false).unwrap();
            assert!(dir.exists());
        }
        assert!(!dir.exists());
    }
}
