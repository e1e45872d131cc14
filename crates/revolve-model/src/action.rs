/// Sentinel `ckp`/`storage_index` marking a restore of the initial live
/// state (step 0) rather than a real counted checkpoint slot. Classic
/// Revolve never spends one of its `n_checkpoints` slots on step 0 — it is
/// the caller-supplied starting state, always recoverable at zero storage
/// cost — so the driver special-cases this sentinel instead of forwarding
/// it to a storage tier. See DESIGN.md for the rationale.
pub const ANCHOR_CKP: u32 = u32::MAX;
pub const ANCHOR_TIER: u32 = u32::MAX;

/// One step emitted by a scheduler. `old_capo..capo` is the forward segment
/// for `Advance`/`LastForward`; for `Reverse` the adjoint step is at `capo`.
///
/// Invariant: `old_capo <= capo`, enforced by the constructors below rather
/// than at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    pub kind: ActionKind,
    pub old_capo: u32,
    pub capo: u32,
    pub ckp: u32,
    pub storage_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    Advance,
    TakeShot,
    Restore,
    LastForward,
    Reverse,
    ReverseStart,
    Discard,
    Terminate,
}

impl Action {
    pub fn advance(old_capo: u32, capo: u32) -> Self {
        debug_assert!(old_capo <= capo);
        Action {
            kind: ActionKind::Advance,
            old_capo,
            capo,
            ckp: 0,
            storage_index: 0,
        }
    }

    pub fn take_shot(ckp: u32, capo: u32, storage_index: u32) -> Self {
        Action {
            kind: ActionKind::TakeShot,
            old_capo: capo,
            capo,
            ckp,
            storage_index,
        }
    }

    pub fn restore(ckp: u32, capo: u32, storage_index: u32) -> Self {
        Action {
            kind: ActionKind::Restore,
            old_capo: capo,
            capo,
            ckp,
            storage_index,
        }
    }

    pub fn last_forward(old_capo: u32, n_timesteps: u32) -> Self {
        debug_assert!(old_capo <= n_timesteps);
        Action {
            kind: ActionKind::LastForward,
            old_capo,
            capo: n_timesteps,
            ckp: 0,
            storage_index: 0,
        }
    }

    pub fn reverse_start(capo: u32) -> Self {
        Action {
            kind: ActionKind::ReverseStart,
            old_capo: capo,
            capo,
            ckp: 0,
            storage_index: 0,
        }
    }

    pub fn reverse(capo: u32) -> Self {
        Action {
            kind: ActionKind::Reverse,
            old_capo: capo,
            capo,
            ckp: 0,
            storage_index: 0,
        }
    }

    pub fn discard(ckp: u32, capo: u32, storage_index: u32) -> Self {
        Action {
            kind: ActionKind::Discard,
            old_capo: capo,
            capo,
            ckp,
            storage_index,
        }
    }

    pub fn terminate(capo: u32) -> Self {
        Action {
            kind: ActionKind::Terminate,
            old_capo: capo,
            capo,
            ckp: 0,
            storage_index: 0,
        }
    }
}
