use thiserror::Error;

/// Fails at construction time, before a sweep ever begins.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigurationError {
    #[error("n_timesteps must be provided and nonzero")]
    MissingTimesteps,
    #[error("n_checkpoints must be at least 1")]
    ZeroCheckpoints,
    #[error("storage tier list is empty")]
    EmptyStorageList,
    #[error(
        "tiers must be listed in nondecreasing write/read cost order (violated at tier {index})"
    )]
    TiersOutOfOrder { index: usize },
    #[error("H-Revolve requires n_checkpoints == n_timesteps (got {n_checkpoints} vs {n_timesteps})")]
    CheckpointTimestepMismatch {
        n_checkpoints: u32,
        n_timesteps: u32,
    },
}

/// Fails at the offending storage call.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StorageError {
    #[error("tier is at capacity (stack_top has reached C-1)")]
    Full,
    #[error("pop/peek on an empty stack (stack_top == -1)")]
    Empty,
    #[error("load of key {key} before it was ever saved")]
    Uninitialized { key: u32 },
    #[error("compressed payload for key {key} exceeds slot capacity ({size} > {capacity})")]
    Overflow {
        key: u32,
        size: usize,
        capacity: usize,
    },
    #[error("buffer shape at load does not match the shape recorded at save for key {key}")]
    ShapeMismatch { key: u32 },
    #[error("decompression failed: {0}")]
    Decompression(#[from] CompressionError),
    #[error("disk I/O failed: {0}")]
    Io(String),
}

/// Indicates the driver received an Action kind it does not handle for the
/// current phase. Always a programming error, never a runtime condition.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SchedulerError {
    #[error("unrecognized or out-of-phase action: {description}")]
    UnknownAction { description: String },
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CompressionError {
    #[error("decompressed payload has length {actual}, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("decompressed payload has dtype {actual:?}, expected {expected:?}")]
    DtypeMismatch {
        expected: crate::ElementKind,
        actual: crate::ElementKind,
    },
    #[error("compression backend failed: {0}")]
    Backend(String),
}

/// Top-level error, composed from the per-layer kinds above via `#[from]` so
/// callers that don't care which layer failed can just propagate one type.
#[derive(Debug, Error)]
pub enum RevolveError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Compression(#[from] CompressionError),
}
