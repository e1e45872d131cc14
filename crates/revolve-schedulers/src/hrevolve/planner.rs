use revolve_model::Architecture;

/// The two DP tables from Herrmann-Pallez: `optp[k][l][m]` is the optimal
/// cost of the "prime" subproblem (the backward step already paid for),
/// `opt[k][l][m]` additionally pays the write cost to reach that state.
/// `k` ranges over tiers, `l` over remaining forward steps up to `lmax`,
/// `m` over the number of free slots on tier `k` (0..=tier k's capacity).
pub struct HOptTable {
    pub optp: Vec<Vec<Vec<f64>>>,
    pub opt: Vec<Vec<Vec<f64>>>,
}

/// Builds the HOpt table for `l = 0..=lmax` by the recurrence in
/// Herrmann-Pallez (ACM TOMS, 2020), §4.3. Entries that can never be
/// reached by a valid schedule (tier-0 with zero slots and `l >= 1`) are
/// left at `f64::INFINITY` so the minimizations below never select them.
pub fn build_hopt_table(lmax: u32, architecture: &Architecture, uf: f64, ub: f64) -> HOptTable {
    let k_levels = architecture.len();
    let lmax = lmax as usize;
    let sizes: Vec<usize> = architecture.tiers().iter().map(|t| t.size as usize).collect();
    let w: Vec<f64> = architecture.tiers().iter().map(|t| t.w).collect();
    let r: Vec<f64> = architecture.tiers().iter().map(|t| t.r).collect();

    let mut opt: Vec<Vec<Vec<f64>>> = (0..k_levels)
        .map(|k| vec![vec![f64::INFINITY; sizes[k] + 1]; lmax + 1])
        .collect();
    let mut optp: Vec<Vec<Vec<f64>>> = (0..k_levels)
        .map(|k| vec![vec![f64::INFINITY; sizes[k] + 1]; lmax + 1])
        .collect();

    for k in 0..k_levels {
        for m in 0..=sizes[k] {
            opt[k][0][m] = ub;
            optp[k][0][m] = ub;
        }
        for m in 0..=sizes[k] {
            if m == 0 && k == 0 {
                continue;
            }
            optp[k][1][m] = uf + 2.0 * ub + r[0];
            opt[k][1][m] = w[0] + optp[k][1][m];
        }
    }

    // k = 0
    let mmax0 = sizes[0];
    for l in 2..=lmax {
        optp[0][l][1] = (l as f64 + 1.0) * ub + (l as f64) * (l as f64 + 1.0) / 2.0 * uf
            + (l as f64) * r[0];
        opt[0][l][1] = w[0] + optp[0][l][1];
    }
    for m in 2..=mmax0 {
        for l in 2..=lmax {
            let mut best = optp[0][l][1];
            for j in 1..l {
                let candidate = j as f64 * uf + opt[0][l - j][m - 1] + r[0] + optp[0][j - 1][m];
                if candidate < best {
                    best = candidate;
                }
            }
            optp[0][l][m] = best;
            opt[0][l][m] = w[0] + optp[0][l][m];
        }
    }

    // k > 0
    for k in 1..k_levels {
        let mmax = sizes[k];
        for l in 2..=lmax {
            opt[k][l][0] = opt[k - 1][l][sizes[k - 1]];
        }
        for m in 1..=mmax {
            for l in 1..=lmax {
                let fallback = opt[k - 1][l][sizes[k - 1]];
                let mut best = fallback;
                for j in 1..l {
                    let candidate =
                        j as f64 * uf + opt[k][l - j][m - 1] + r[k] + optp[k][j - 1][m];
                    if candidate < best {
                        best = candidate;
                    }
                }
                optp[k][l][m] = best;
                opt[k][l][m] = fallback.min(w[k] + optp[k][l][m]);
            }
        }
    }

    HOptTable { optp, opt }
}

/// Index (1-based, `1..l`) of the **last** minimizer of `values[j-1]` over
/// `j in 1..l`. The tie-break matters: ties favor the larger `j`, matching
/// the reference recursion (§4.3).
pub fn last_argmin(values: &[f64]) -> usize {
    let mut best_index = 0;
    let mut best_value = values[0];
    for (i, &v) in values.iter().enumerate() {
        if v <= best_value {
            best_index = i;
            best_value = v;
        }
    }
    best_index + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use revolve_model::Tier;

    #[test]
    fn single_tier_opt_matches_classic_revolve_cost_shape() {
        let arch = Architecture::single_level(12);
        let table = build_hopt_table(10, &arch, 1.0, 1.0);
        assert_eq!(table.opt[0][0][5], 1.0);
        assert!(table.opt[0][10][12].is_finite());
    }

    #[test]
    fn two_tier_table_is_finite_at_top() {
        let arch = Architecture::new(vec![Tier::new(2, 0.0, 0.0), Tier::new(10, 2.0, 2.0)]).unwrap();
        let table = build_hopt_table(10, &arch, 1.0, 1.0);
        assert!(table.opt[1][10][10].is_finite());
    }

    #[test]
    fn last_argmin_breaks_ties_toward_larger_index() {
        assert_eq!(last_argmin(&[3.0, 1.0, 1.0, 2.0]), 3);
    }
}
