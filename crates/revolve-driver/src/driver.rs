use crate::operator::Operator;
use crate::profiler::{Profiler, Section};
use crate::view::CheckpointView;
use revolve_model::{Action, ActionKind, Element, RevolveError, SchedulerError, ANCHOR_CKP, ANCHOR_TIER};
use revolve_schedulers::Scheduler;
use revolve_storage::Storage;

/// Which storage discipline the scheduler driving this sweep expects
/// (§4.1): Classic Revolve addresses tiers by explicit key (`save`/`load`),
/// H-Revolve treats them as LIFO stacks (`push`/`peek`/`pop`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverMode {
    Classic,
    Hierarchical,
}

/// The state machine described in §4.4: two externally visible
/// transitions, each driving the scheduler until it yields the sentinel
/// ending that phase. Owns the checkpoint view, the forward/reverse
/// operators, the scheduler, and every storage tier for the sweep's
/// duration (§5 — exclusive ownership, no shared mutable state crosses
/// this boundary).
pub struct Driver<E, V, F, R, S>
where
    E: Element,
    V: CheckpointView<E>,
    F: Operator,
    R: Operator,
    S: Scheduler,
{
    view: V,
    fwd: F,
    rev: R,
    scheduler: S,
    storages: Vec<Box<dyn Storage<E>>>,
    mode: DriverMode,
    anchor: Vec<Vec<E>>,
    profiler: Profiler,
    pending_seed: Option<Action>,
}

impl<E, V, F, R, S> Driver<E, V, F, R, S>
where
    E: Element,
    V: CheckpointView<E>,
    F: Operator,
    R: Operator,
    S: Scheduler,
{
    pub fn new(
        view: V,
        fwd: F,
        rev: R,
        scheduler: S,
        storages: Vec<Box<dyn Storage<E>>>,
        mode: DriverMode,
    ) -> Self {
        let anchor = view
            .get_data(0)
            .into_iter()
            .map(|b| b.data.to_vec())
            .collect();
        Driver {
            view,
            fwd,
            rev,
            scheduler,
            storages,
            mode,
            anchor,
            profiler: Profiler::new(),
            pending_seed: None,
        }
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Drives the scheduler through the forward phase (§4.4's forward
    /// dispatch table) until it yields `LastForward` (Classic Revolve) or
    /// `Reverse` (H-Revolve, stashed as the reverse phase's seed).
    pub fn apply_forward(&mut self) -> Result<(), RevolveError> {
        loop {
            let action = self.scheduler.next();
            match action.kind {
                ActionKind::Advance => {
                    let (old_capo, capo) = (action.old_capo, action.capo);
                    self.profiler
                        .time(Section::Forward, action.kind, || self.fwd.apply(old_capo, capo));
                }
                ActionKind::TakeShot => self.take_shot(&action)?,
                ActionKind::Discard => self.discard(&action)?,
                ActionKind::LastForward => {
                    let (old_capo, capo) = (action.old_capo, action.capo);
                    self.profiler
                        .time(Section::Forward, action.kind, || self.fwd.apply(old_capo, capo));
                    return Ok(());
                }
                ActionKind::Reverse => {
                    self.pending_seed = Some(action);
                    return Ok(());
                }
                other => {
                    return Err(SchedulerError::UnknownAction {
                        description: format!("{other:?} is not valid during the forward phase"),
                    }
                    .into())
                }
            }
        }
    }

    /// Drives the scheduler through the reverse phase (§4.4's reverse
    /// dispatch table) until `Terminate`. If `apply_forward` stashed a
    /// seed action (H-Revolve), it is consumed first as `rev(capo,
    /// capo+1)` only — never with the embedded recomputation step the
    /// general `Reverse` rule carries, since there is nothing to recompute
    /// at the very end of the forward sweep.
    pub fn apply_reverse(&mut self) -> Result<(), RevolveError> {
        if let Some(seed) = self.pending_seed.take() {
            let capo = seed.capo;
            self.profiler
                .time(Section::Reverse, ActionKind::ReverseStart, || {
                    self.rev.apply(capo, capo + 1)
                });
        }
        loop {
            let action = self.scheduler.next();
            match action.kind {
                ActionKind::ReverseStart => {
                    let capo = action.capo;
                    self.profiler.time(Section::Reverse, action.kind, || {
                        self.rev.apply(capo, capo + 1)
                    });
                }
                ActionKind::Advance => {
                    let (old_capo, capo) = (action.old_capo, action.capo);
                    self.profiler
                        .time(Section::Forward, action.kind, || self.fwd.apply(old_capo, capo));
                }
                ActionKind::TakeShot => self.take_shot(&action)?,
                ActionKind::Restore => self.restore(&action)?,
                ActionKind::Discard => self.discard(&action)?,
                ActionKind::Reverse => {
                    let capo = action.capo;
                    self.profiler
                        .time(Section::Forward, action.kind, || self.fwd.apply(capo, capo + 1));
                    self.profiler
                        .time(Section::Reverse, action.kind, || self.rev.apply(capo, capo + 1));
                }
                ActionKind::Terminate => return Ok(()),
                other => {
                    return Err(SchedulerError::UnknownAction {
                        description: format!("{other:?} is not valid during the reverse phase"),
                    }
                    .into())
                }
            }
        }
    }

    fn take_shot(&mut self, action: &Action) -> Result<(), RevolveError> {
        let tier = action.storage_index as usize;
        let buffers = self.view.get_data(action.capo);
        let storage = &mut self.storages[tier];
        let ckp = action.ckp;
        let mode = self.mode;
        self.profiler
            .time(Section::Storage, action.kind, || match mode {
                DriverMode::Classic => storage.save(ckp, &buffers),
                DriverMode::Hierarchical => storage.push(&buffers),
            })?;
        Ok(())
    }

    fn restore(&mut self, action: &Action) -> Result<(), RevolveError> {
        if action.ckp == ANCHOR_CKP && action.storage_index == ANCHOR_TIER {
            self.restore_anchor();
            return Ok(());
        }
        let tier = action.storage_index as usize;
        let mut buffers = self.view.get_data_location(action.capo);
        let storage = &mut self.storages[tier];
        let ckp = action.ckp;
        let mode = self.mode;
        self.profiler
            .time(Section::Storage, action.kind, || match mode {
                DriverMode::Classic => storage.load(ckp, &mut buffers),
                DriverMode::Hierarchical => storage.peek(&mut buffers),
            })?;
        Ok(())
    }

    fn discard(&mut self, action: &Action) -> Result<(), RevolveError> {
        let tier = action.storage_index as usize;
        let mut buffers = self.view.get_data_location(action.capo);
        let storage = &mut self.storages[tier];
        self.profiler
            .time(Section::Storage, action.kind, || storage.pop(&mut buffers))?;
        Ok(())
    }

    fn restore_anchor(&mut self) {
        let mut targets = self.view.get_data_location(0);
        for (target, source) in targets.iter_mut().zip(self.anchor.iter()) {
            target.data.copy_from_slice(source);
        }
    }
}
