//! Demo entrypoint: runs a toy Increment/Decrement simulation through both
//! revolver facades and reports the scheduler's recomputation ratio and the
//! profiler's per-section timings.
use std::cell::UnsafeCell;
use std::rc::Rc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use revolve_driver::{
    CheckpointView, MultiLevelRevolver, Operator, SingleLevelOptions, SingleLevelRevolver,
    TierBackend, TierSpec,
};
use revolve_storage::{BufferMut, BufferRef};
use tracing::info;

/// Demonstrates the single- and multi-level checkpoint revolvers over a
/// toy operator (forward adds 1 per step, reverse subtracts 1).
#[derive(Parser, Debug)]
#[command(name = "revolve", version, about = "Checkpointing runtime demo")]
struct Args {
    #[command(subcommand)]
    mode: Mode,
    /// Number of simulated timesteps.
    #[arg(long, default_value_t = 20)]
    timesteps: u32,
    /// Number of elements in the toy state vector.
    #[arg(long, default_value_t = 8)]
    width: usize,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Classic Revolve over a single in-memory tier.
    Single {
        /// Checkpoint slot budget.
        #[arg(long, default_value_t = 4)]
        checkpoints: u32,
    },
    /// H-Revolve over two in-memory tiers, sized after S5.
    Multi,
}

/// A buffer shared between the operator closures and the checkpoint view.
///
/// SAFETY: the driver never invokes `Operator::apply` and
/// `CheckpointView::get_data`/`get_data_location` concurrently or
/// reentrantly, so the single `&mut [f64]` handed out at a time is never
/// aliased.
#[derive(Clone)]
struct SharedBuffer(Rc<UnsafeCell<Vec<f64>>>);

impl SharedBuffer {
    fn new(width: usize) -> Self {
        SharedBuffer(Rc::new(UnsafeCell::new(vec![0.0; width])))
    }

    #[allow(clippy::mut_from_ref)]
    fn as_mut(&self) -> &mut [f64] {
        unsafe { &mut *self.0.get() }
    }
}

struct CounterView {
    buffer: SharedBuffer,
    shape: Vec<usize>,
}

impl CheckpointView<f64> for CounterView {
    fn size(&self) -> usize {
        self.buffer.as_mut().len()
    }

    fn get_data(&self, _t: u32) -> Vec<BufferRef<'_, f64>> {
        vec![BufferRef::new(self.buffer.as_mut(), &self.shape)]
    }

    fn get_data_location(&mut self, _t: u32) -> Vec<BufferMut<'_, f64>> {
        vec![BufferMut::new(self.buffer.as_mut(), &self.shape)]
    }
}

fn forward_operator(buffer: SharedBuffer) -> impl Operator {
    move |t_start: u32, t_end: u32| {
        let delta = (t_end - t_start) as f64;
        for v in buffer.as_mut() {
            *v += delta;
        }
    }
}

fn reverse_operator(buffer: SharedBuffer) -> impl Operator {
    move |t_start: u32, t_end: u32| {
        let delta = (t_end - t_start) as f64;
        for v in buffer.as_mut() {
            *v -= delta;
        }
    }
}

fn configure_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn report(label: &str, buffer: &SharedBuffer, ratio: f64, makespan: Option<f64>) {
    println!("{label}: final buffer = {:?}", buffer.as_mut());
    println!("{label}: recomputation ratio = {ratio:.3}");
    if let Some(m) = makespan {
        println!("{label}: modeled makespan = {m:.3}");
    }
}

fn main() -> Result<()> {
    configure_logging();
    let args = Args::parse();
    info!(target: "revolve.cli", timesteps = args.timesteps, width = args.width, "startup");

    let buffer = SharedBuffer::new(args.width);
    let shape = vec![args.width];
    let view = CounterView {
        buffer: buffer.clone(),
        shape,
    };

    match args.mode {
        Mode::Single { checkpoints } => {
            let mut revolver = SingleLevelRevolver::new(
                view,
                forward_operator(buffer.clone()),
                reverse_operator(buffer.clone()),
                checkpoints,
                args.timesteps,
                SingleLevelOptions::default(),
            )?;
            revolver.apply_forward()?;
            revolver.apply_reverse()?;
            report("single", &buffer, revolver.ratio(), None);
            for entry in revolver.profiler().summary() {
                println!("  {:?}/{:?}: {} calls, {:?}", entry.section, entry.action, entry.calls, entry.total);
            }
        }
        Mode::Multi => {
            let tiers = vec![
                TierSpec {
                    size: 2,
                    w: 0.0,
                    r: 0.0,
                    backend: TierBackend::Memory,
                },
                TierSpec {
                    size: args.timesteps,
                    w: 2.0,
                    r: 2.0,
                    backend: TierBackend::Memory,
                },
            ];
            let mut revolver = MultiLevelRevolver::new(
                view,
                forward_operator(buffer.clone()),
                reverse_operator(buffer.clone()),
                args.timesteps,
                tiers,
                1.0,
                1.0,
            )?;
            revolver.apply_forward()?;
            revolver.apply_reverse()?;
            report("multi", &buffer, revolver.ratio(), revolver.makespan());
            for entry in revolver.profiler().summary() {
                println!("  {:?}/{:?}: {} calls, {:?}", entry.section, entry.action, entry.calls, entry.total);
            }
        }
    }

    Ok(())
}
