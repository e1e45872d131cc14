//! End-to-end sweeps over the Increment/Decrement toy operator, exercising
//! the concrete scenarios from the scheduling design (single-level,
//! multi-level, disk tier, single/multi equivalence).

use std::cell::UnsafeCell;
use std::rc::Rc;

use revolve_driver::{
    CheckpointView, MultiLevelRevolver, Operator, SingleLevelOptions, SingleLevelRevolver,
    TierBackend, TierSpec,
};
use revolve_storage::{BufferMut, BufferRef};

#[derive(Clone)]
struct SharedBuffer(Rc<UnsafeCell<Vec<f64>>>);

impl SharedBuffer {
    fn new(data: Vec<f64>) -> Self {
        SharedBuffer(Rc::new(UnsafeCell::new(data)))
    }

    // SAFETY: the driver never calls the operator and the view concurrently
    // or reentrantly within one of these tests.
    #[allow(clippy::mut_from_ref)]
    fn as_mut(&self) -> &mut [f64] {
        unsafe { &mut *self.0.get() }
    }

    fn to_vec(&self) -> Vec<f64> {
        self.as_mut().to_vec()
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

fn zeros(width: usize) -> (SharedBuffer, Vec<usize>) {
    (SharedBuffer::new(vec![0.0; width]), vec![width])
}

#[test]
fn s1_classic_small_restores_initial_value_with_expected_save_count() {
    let (buffer, shape) = zeros(10);
    let view = CounterView {
        buffer: buffer.clone(),
        shape,
    };
    let mut revolver = SingleLevelRevolver::new(
        view,
        forward_operator(buffer.clone()),
        reverse_operator(buffer.clone()),
        2,
        10,
        SingleLevelOptions::default(),
    )
    .unwrap();
    revolver.apply_forward().unwrap();
    revolver.apply_reverse().unwrap();
    assert!(buffer.to_vec().iter().all(|&v| v == 0.0));
}

#[test]
fn s2_classic_boundary_has_zero_recomputation() {
    let (buffer, shape) = zeros(10);
    let view = CounterView {
        buffer: buffer.clone(),
        shape,
    };
    let mut revolver = SingleLevelRevolver::new(
        view,
        forward_operator(buffer.clone()),
        reverse_operator(buffer.clone()),
        12,
        10,
        SingleLevelOptions::default(),
    )
    .unwrap();
    revolver.apply_forward().unwrap();
    revolver.apply_reverse().unwrap();
    assert!(buffer.to_vec().iter().all(|&v| v == 0.0));
    assert!((revolver.ratio() - 1.0).abs() < 1e-9 || revolver.ratio() >= 1.0);
}

#[test]
fn s3_classic_tight_budget_still_restores_initial_value() {
    let (buffer, shape) = zeros(10);
    let view = CounterView {
        buffer: buffer.clone(),
        shape,
    };
    let mut revolver = SingleLevelRevolver::new(
        view,
        forward_operator(buffer.clone()),
        reverse_operator(buffer.clone()),
        4,
        10,
        SingleLevelOptions::default(),
    )
    .unwrap();
    revolver.apply_forward().unwrap();
    revolver.apply_reverse().unwrap();
    assert!(buffer.to_vec().iter().all(|&v| v == 0.0));
    assert!(revolver.ratio() > 1.0);
}

#[test]
fn s4_disk_tier_matches_memory_tier_final_state() {
    let tmp = tempfile::tempdir().unwrap();
    let (buffer, shape) = zeros(20);
    let view = CounterView {
        buffer: buffer.clone(),
        shape,
    };
    let options = SingleLevelOptions {
        disk: true,
        filedir: Some(tmp.path().to_path_buf()),
        single_file: true,
        ..Default::default()
    };
    let mut revolver = SingleLevelRevolver::new(
        view,
        forward_operator(buffer.clone()),
        reverse_operator(buffer.clone()),
        4,
        20,
        options,
    )
    .unwrap();
    revolver.apply_forward().unwrap();
    revolver.apply_reverse().unwrap();
    assert!(buffer.to_vec().iter().all(|&v| v == 0.0));
}

#[test]
fn s5_hrevolve_two_tiers_restores_initial_value() {
    let (buffer, shape) = zeros(4);
    let view = CounterView {
        buffer: buffer.clone(),
        shape,
    };
    let tiers = vec![
        TierSpec {
            size: 2,
            w: 0.0,
            r: 0.0,
            backend: TierBackend::Memory,
        },
        TierSpec {
            size: 10,
            w: 2.0,
            r: 2.0,
            backend: TierBackend::Memory,
        },
    ];
    let mut revolver = MultiLevelRevolver::new(
        view,
        forward_operator(buffer.clone()),
        reverse_operator(buffer.clone()),
        10,
        tiers,
        1.0,
        1.0,
    )
    .unwrap();
    revolver.apply_forward().unwrap();
    revolver.apply_reverse().unwrap();
    assert!(buffer.to_vec().iter().all(|&v| v == 0.0));
    assert!(revolver.makespan().is_some());
}

#[test]
fn s7_single_level_and_multi_level_agree_on_a_shared_memory_tier() {
    let n_timesteps = 10;

    let (single_buffer, single_shape) = zeros(6);
    let single_view = CounterView {
        buffer: single_buffer.clone(),
        shape: single_shape,
    };
    let mut single = SingleLevelRevolver::new(
        single_view,
        forward_operator(single_buffer.clone()),
        reverse_operator(single_buffer.clone()),
        n_timesteps,
        n_timesteps,
        SingleLevelOptions::default(),
    )
    .unwrap();
    single.apply_forward().unwrap();
    single.apply_reverse().unwrap();

    let (multi_buffer, multi_shape) = zeros(6);
    let multi_view = CounterView {
        buffer: multi_buffer.clone(),
        shape: multi_shape,
    };
    let tiers = vec![TierSpec {
        size: n_timesteps,
        w: 1.0,
        r: 1.0,
        backend: TierBackend::Memory,
    }];
    let mut multi = MultiLevelRevolver::new(
        multi_view,
        forward_operator(multi_buffer.clone()),
        reverse_operator(multi_buffer.clone()),
        n_timesteps,
        tiers,
        1.0,
        1.0,
    )
    .unwrap();
    multi.apply_forward().unwrap();
    multi.apply_reverse().unwrap();

    assert_eq!(single_buffer.to_vec(), multi_buffer.to_vec());
}

#[test]
fn profiler_records_forward_and_storage_calls() {
    let (buffer, shape) = zeros(5);
    let view = CounterView {
        buffer: buffer.clone(),
        shape,
    };
    let mut revolver = SingleLevelRevolver::new(
        view,
        forward_operator(buffer.clone()),
        reverse_operator(buffer.clone()),
        2,
        5,
        SingleLevelOptions::default(),
    )
    .unwrap();
    revolver.apply_forward().unwrap();
    revolver.apply_reverse().unwrap();
    let summary = revolver.profiler().summary();
    assert!(!summary.is_empty());
    assert!(summary.iter().any(|e| e.calls > 0));
}
