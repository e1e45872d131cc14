use crate::driver::{Driver, DriverMode};
use crate::operator::Operator;
use crate::view::CheckpointView;
use revolve_compression::{init_compression, CompressionScheme};
use revolve_model::{Architecture, Element, RevolveError, StorageError, Tier};
use revolve_schedulers::{ClassicRevolve, HRevolve, Scheduler};
use revolve_storage::{ByteSlabStorage, DiskStorage, MemoryStorage, Storage};
use std::path::PathBuf;

/// Options accepted by `SingleLevelRevolver::new`, mirroring §6's
/// `SingleLevelRevolver(view, fwd, rev, n_checkpoints, n_timesteps, [,
/// disk=false, filedir, single_file=true, compression=None])`.
#[derive(Debug, Clone, Default)]
pub struct SingleLevelOptions {
    pub disk: bool,
    pub filedir: Option<PathBuf>,
    pub single_file: bool,
    pub compression: Option<CompressionScheme>,
    pub keep_files: bool,
}

/// One storage tier's checkpoint backend, independent of its DP cost
/// profile (`size`/`w`/`r`, carried separately in `TierSpec`).
pub enum TierBackend {
    Memory,
    Disk {
        dir: PathBuf,
        single_file: bool,
        keep_files: bool,
    },
    Compressed(CompressionScheme),
}

pub struct TierSpec {
    pub size: u32,
    pub w: f64,
    pub r: f64,
    pub backend: TierBackend,
}

fn build_storage<E: Element + 'static>(
    backend: &TierBackend,
    capacity: u32,
    slot_size: usize,
) -> Result<Box<dyn Storage<E>>, RevolveError> {
    Ok(match backend {
        TierBackend::Memory => Box::new(MemoryStorage::<E>::new(capacity, slot_size)),
        TierBackend::Disk {
            dir,
            single_file,
            keep_files,
        } => {
            let storage = if *single_file {
                DiskStorage::<E>::single_file(dir.clone(), capacity, slot_size, *keep_files)
            } else {
                DiskStorage::<E>::per_file(dir.clone(), capacity, slot_size, *keep_files)
            }
            .map_err(|e| {
                RevolveError::Storage(StorageError::Io(format!(
                    "failed to open disk tier at {}: {e}",
                    dir.display()
                )))
            })?;
            Box::new(storage)
        }
        TierBackend::Compressed(scheme) => {
            let adapter = init_compression(scheme.clone());
            Box::new(ByteSlabStorage::<E>::new(capacity, slot_size, adapter))
        }
    })
}

/// Wraps a `Driver` running the Classic Revolve scheduler (§4.2) over a
/// single storage tier.
pub struct SingleLevelRevolver<E, V, F, R>
where
    E: Element + 'static,
    V: CheckpointView<E>,
    F: Operator,
    R: Operator,
{
    driver: Driver<E, V, F, R, ClassicRevolve>,
}

impl<E, V, F, R> SingleLevelRevolver<E, V, F, R>
where
    E: Element + 'static,
    V: CheckpointView<E>,
    F: Operator,
    R: Operator,
{
    pub fn new(
        view: V,
        fwd: F,
        rev: R,
        n_checkpoints: u32,
        n_timesteps: u32,
        options: SingleLevelOptions,
    ) -> Result<Self, RevolveError> {
        let slot_size = view.size();
        let scheduler = ClassicRevolve::new(n_checkpoints, n_timesteps)?;
        let backend = if let Some(scheme) = &options.compression {
            TierBackend::Compressed(scheme.clone())
        } else if options.disk {
            TierBackend::Disk {
                dir: options
                    .filedir
                    .clone()
                    .unwrap_or_else(std::env::temp_dir),
                single_file: options.single_file,
                keep_files: options.keep_files,
            }
        } else {
            TierBackend::Memory
        };
        let storage = build_storage::<E>(&backend, n_checkpoints, slot_size)?;
        let driver = Driver::new(view, fwd, rev, scheduler, vec![storage], DriverMode::Classic);
        Ok(SingleLevelRevolver { driver })
    }

    pub fn apply_forward(&mut self) -> Result<(), RevolveError> {
        self.driver.apply_forward()
    }

    pub fn apply_reverse(&mut self) -> Result<(), RevolveError> {
        self.driver.apply_reverse()
    }

    pub fn profiler(&self) -> &crate::profiler::Profiler {
        self.driver.profiler()
    }

    pub fn ratio(&self) -> f64 {
        self.driver.scheduler().ratio()
    }
}

/// Wraps a `Driver` running the H-Revolve scheduler (§4.3) over a
/// multi-tier architecture.
pub struct MultiLevelRevolver<E, V, F, R>
where
    E: Element + 'static,
    V: CheckpointView<E>,
    F: Operator,
    R: Operator,
{
    driver: Driver<E, V, F, R, HRevolve>,
}

impl<E, V, F, R> MultiLevelRevolver<E, V, F, R>
where
    E: Element + 'static,
    V: CheckpointView<E>,
    F: Operator,
    R: Operator,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        view: V,
        fwd: F,
        rev: R,
        n_timesteps: u32,
        tiers: Vec<TierSpec>,
        uf: f64,
        ub: f64,
    ) -> Result<Self, RevolveError> {
        let slot_size = view.size();
        let architecture = Architecture::new(
            tiers
                .iter()
                .map(|t| Tier::new(t.size, t.w, t.r))
                .collect(),
        )?;
        let scheduler = HRevolve::new(n_timesteps, n_timesteps, &architecture, uf, ub)?;
        let storages = tiers
            .iter()
            .map(|t| build_storage::<E>(&t.backend, t.size, slot_size))
            .collect::<Result<Vec<_>, _>>()?;
        let driver = Driver::new(
            view,
            fwd,
            rev,
            scheduler,
            storages,
            DriverMode::Hierarchical,
        );
        Ok(MultiLevelRevolver { driver })
    }

    pub fn apply_forward(&mut self) -> Result<(), RevolveError> {
        self.driver.apply_forward()
    }

    pub fn apply_reverse(&mut self) -> Result<(), RevolveError> {
        self.driver.apply_reverse()
    }

    pub fn profiler(&self) -> &crate::profiler::Profiler {
        self.driver.profiler()
    }

    pub fn ratio(&self) -> f64 {
        self.driver.scheduler().ratio()
    }

    pub fn makespan(&self) -> Option<f64> {
        self.driver.scheduler().makespan()
    }
}
