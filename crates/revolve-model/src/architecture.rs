use crate::ConfigurationError;

/// One storage tier's static cost profile: capacity in checkpoint slots,
/// write cost, read cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub size: u32,
    pub w: f64,
    pub r: f64,
}

impl Tier {
    pub fn new(size: u32, w: f64, r: f64) -> Self {
        Tier { size, w, r }
    }
}

/// Ordered vector of tiers, fast/small first. `nondecreasing w/r` is
/// recommended for optimality, not enforced as a hard failure here —
/// `Architecture::new` returns `TiersOutOfOrder` only when a caller opts in
/// via `new_checked`; `new` mirrors the source's warn-and-continue stance.
#[derive(Debug, Clone, PartialEq)]
pub struct Architecture {
    tiers: Vec<Tier>,
}

impl Architecture {
    pub fn new(tiers: Vec<Tier>) -> Result<Self, ConfigurationError> {
        if tiers.is_empty() {
            return Err(ConfigurationError::EmptyStorageList);
        }
        if let Some(index) = first_out_of_order(&tiers) {
            tracing::warn!(
                target: "revolve.architecture",
                index,
                "tiers are not listed in nondecreasing write/read cost order; \
                 schedules built over this architecture are not guaranteed optimal"
            );
        }
        Ok(Architecture { tiers })
    }

    pub fn new_checked(tiers: Vec<Tier>) -> Result<Self, ConfigurationError> {
        if tiers.is_empty() {
            return Err(ConfigurationError::EmptyStorageList);
        }
        if let Some(index) = first_out_of_order(&tiers) {
            return Err(ConfigurationError::TiersOutOfOrder { index });
        }
        Ok(Architecture { tiers })
    }

    pub fn single_level(size: u32) -> Self {
        Architecture {
            tiers: vec![Tier::new(size, 1.0, 1.0)],
        }
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn size(&self, tier: usize) -> u32 {
        self.tiers[tier].size
    }
}

fn first_out_of_order(tiers: &[Tier]) -> Option<usize> {
    tiers
        .windows(2)
        .position(|w| w[1].w < w[0].w || w[1].r < w[0].r)
        .map(|i| i + 1)
}
