//! Shared data types for the checkpointing runtime: the Action sum type
//! schedulers emit, the Architecture tier descriptor, the element-type
//! abstraction storage tiers and the compression adapter build on, and the
//! error kinds surfaced at the public API (§7).

mod action;
mod architecture;
mod element;
mod error;

pub use action::{Action, ActionKind, ANCHOR_CKP, ANCHOR_TIER};
pub use architecture::{Architecture, Tier};
pub use element::{Element, ElementKind};
pub use error::{
    CompressionError, ConfigurationError, RevolveError, SchedulerError, StorageError,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_preserves_old_capo_le_capo() {
        let a = Action::advance(3, 7);
        assert!(a.old_capo <= a.capo);
        assert_eq!(a.kind, ActionKind::Advance);
    }

    #[test]
    fn architecture_rejects_empty_list() {
        assert_eq!(
            Architecture::new(vec![]).unwrap_err(),
            ConfigurationError::EmptyStorageList
        );
    }

    #[test]
    fn architecture_checked_rejects_out_of_order_tiers() {
        let tiers = vec![Tier::new(2, 2.0, 2.0), Tier::new(10, 1.0, 1.0)];
        assert_eq!(
            Architecture::new_checked(tiers).unwrap_err(),
            ConfigurationError::TiersOutOfOrder { index: 1 }
        );
    }

    #[test]
    fn architecture_new_warns_but_accepts_out_of_order_tiers() {
        let tiers = vec![Tier::new(2, 2.0, 2.0), Tier::new(10, 1.0, 1.0)];
        assert!(Architecture::new(tiers).is_ok());
    }

    #[test]
    fn element_itemsize() {
        assert_eq!(ElementKind::F32.itemsize(), 4);
        assert_eq!(ElementKind::F64.itemsize(), 8);
    }
}
