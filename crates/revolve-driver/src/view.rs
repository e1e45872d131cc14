use revolve_model::{Element, ElementKind};
use revolve_storage::{BufferMut, BufferRef};

/// The adapter between a user's live buffers and the checkpointing runtime
/// (§4.5). One `CheckpointView` per sweep. `get_data` and
/// `get_data_location` may return views over the same underlying storage —
/// the split exists to document which direction data flows, not because
/// implementations must keep two copies.
pub trait CheckpointView<E: Element> {
    fn dtype(&self) -> ElementKind {
        E::KIND
    }

    /// Total element count across all live buffers; must match what the
    /// driver observes when it reads `get_data`/`get_data_location`.
    fn size(&self) -> usize;

    fn nbytes(&self) -> usize {
        self.size() * self.dtype().itemsize()
    }

    /// Buffers holding the live values at step `t`, for the driver to copy
    /// into storage.
    fn get_data(&self, t: u32) -> Vec<BufferRef<'_, E>>;

    /// Buffers to overwrite with values read back from storage.
    fn get_data_location(&mut self, t: u32) -> Vec<BufferMut<'_, E>>;
}
