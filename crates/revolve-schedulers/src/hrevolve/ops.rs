use super::planner::{last_argmin, HOptTable};
use revolve_model::Architecture;

/// Abstract operation emitted by the recursive H-Revolve construction,
/// before translation into driver `Action`s. `Forwards(a, b)` is an
/// inclusive step range; `a == b` is the single-step case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Forwards(u32, u32),
    Backward(u32),
    Write(usize, u32),
    Read(usize, u32),
    Discard(usize, u32),
}

/// Builds the full action sequence for a sweep of `lmax` forward steps
/// under `architecture`, flattening directly into one `Vec<Op>` rather
/// than building the reference implementation's tree of nested
/// sub-sequences and concatenating afterward.
pub fn build_op_sequence(lmax: u32, architecture: &Architecture, uf: f64, ub: f64) -> Vec<Op> {
    let table = build_hopt_table(lmax, architecture, uf, ub);
    let top_k = architecture.len() - 1;
    let top_cmem = architecture.size(top_k);
    let mut out = Vec::new();
    hrevolve(lmax, top_k, top_cmem, 0, architecture, &table, uf, ub, &mut out);
    out
}

fn build_hopt_table(lmax: u32, architecture: &Architecture, uf: f64, ub: f64) -> HOptTable {
    super::planner::build_hopt_table(lmax, architecture, uf, ub)
}

#[allow(clippy::too_many_arguments)]
fn hrevolve(
    l: u32,
    k: usize,
    cmem: u32,
    offset: u32,
    arch: &Architecture,
    table: &HOptTable,
    uf: f64,
    ub: f64,
    out: &mut Vec<Op>,
) {
    if l == 0 {
        out.push(Op::Backward(offset));
        return;
    }
    if k == 0 && cmem == 0 {
        unreachable!("H-Revolve cannot execute a nonempty sweep with zero storage");
    }
    if l == 1 {
        out.push(Op::Write(0, offset));
        out.push(Op::Forwards(offset, offset));
        out.push(Op::Backward(offset + 1));
        out.push(Op::Read(0, offset));
        out.push(Op::Backward(offset));
        out.push(Op::Discard(0, offset));
        return;
    }
    if k == 0 {
        out.push(Op::Write(0, offset));
        hrevolve_aux(l, 0, cmem, offset, arch, table, uf, ub, out);
        return;
    }
    let w_k = arch.tiers()[k].w;
    let lower_size = arch.size(k - 1) as usize;
    if w_k + table.optp[k][l as usize][cmem as usize] < table.opt[k - 1][l as usize][lower_size] {
        out.push(Op::Write(k, offset));
        hrevolve_aux(l, k, cmem, offset, arch, table, uf, ub, out);
    } else {
        hrevolve(l, k - 1, arch.size(k - 1), offset, arch, table, uf, ub, out);
    }
}

#[allow(clippy::too_many_arguments)]
fn hrevolve_aux(
    l: u32,
    k: usize,
    cmem: u32,
    offset: u32,
    arch: &Architecture,
    table: &HOptTable,
    uf: f64,
    ub: f64,
    out: &mut Vec<Op>,
) {
    if cmem == 0 {
        unreachable!("hrevolve_aux must not be called with an exhausted tier budget");
    }
    if l == 0 {
        out.push(Op::Backward(offset));
        return;
    }
    let r0 = arch.tiers()[0].r;
    let rk = arch.tiers()[k].r;
    let w0 = arch.tiers()[0].w;
    if l == 1 {
        let prefer_tier0 = w0 + r0 < rk;
        if prefer_tier0 {
            out.push(Op::Write(0, offset));
        }
        out.push(Op::Forwards(offset, offset));
        out.push(Op::Backward(offset + 1));
        if prefer_tier0 {
            out.push(Op::Read(0, offset));
        } else {
            out.push(Op::Read(k, offset));
        }
        out.push(Op::Backward(offset));
        out.push(Op::Discard(0, offset));
        return;
    }
    if k == 0 && cmem == 1 {
        for index in (0..l).rev() {
            if index != l - 1 {
                out.push(Op::Read(0, offset));
            }
            out.push(Op::Forwards(offset, offset + index));
            out.push(Op::Backward(offset + index + 1));
        }
        out.push(Op::Read(0, offset));
        out.push(Op::Backward(offset));
        out.push(Op::Discard(0, offset));
        return;
    }
    if k == 0 {
        let candidates: Vec<f64> = (1..l)
            .map(|j| {
                j as f64 * uf
                    + table.opt[0][(l - j) as usize][(cmem - 1) as usize]
                    + r0
                    + table.optp[0][(j - 1) as usize][cmem as usize]
            })
            .collect();
        let best = candidates.iter().cloned().fold(f64::INFINITY, f64::min);
        if best < table.optp[0][l as usize][1] {
            let jmin = last_argmin(&candidates) as u32;
            out.push(Op::Forwards(offset, offset + jmin - 1));
            hrevolve(
                l - jmin,
                0,
                cmem - 1,
                offset + jmin,
                arch,
                table,
                uf,
                ub,
                out,
            );
            out.push(Op::Read(0, offset));
            hrevolve_aux(jmin - 1, 0, cmem, offset, arch, table, uf, ub, out);
        } else {
            hrevolve_aux(l, 0, 1, offset, arch, table, uf, ub, out);
        }
        return;
    }
    let candidates: Vec<f64> = (1..l)
        .map(|j| {
            j as f64 * uf
                + table.opt[k][(l - j) as usize][(cmem - 1) as usize]
                + rk
                + table.optp[k][(j - 1) as usize][cmem as usize]
        })
        .collect();
    let best = candidates.iter().cloned().fold(f64::INFINITY, f64::min);
    let lower_size = arch.size(k - 1) as usize;
    if best < table.opt[k - 1][l as usize][lower_size] {
        let jmin = last_argmin(&candidates) as u32;
        out.push(Op::Forwards(offset, offset + jmin - 1));
        hrevolve(
            l - jmin,
            k,
            cmem - 1,
            offset + jmin,
            arch,
            table,
            uf,
            ub,
            out,
        );
        out.push(Op::Read(k, offset));
        hrevolve_aux(jmin - 1, k, cmem, offset, arch, table, uf, ub, out);
    } else {
        hrevolve(l, k - 1, arch.size(k - 1), offset, arch, table, uf, ub, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revolve_model::Tier;

    #[test]
    fn single_tier_sequence_has_one_backward_per_timestep() {
        let arch = Architecture::single_level(4);
        let ops = build_op_sequence(10, &arch, 1.0, 1.0);
        let backwards = ops.iter().filter(|o| matches!(o, Op::Backward(_))).count();
        assert_eq!(backwards, 11); // one per step 0..=10, inclusive of the seed
    }

    #[test]
    fn two_tier_sequence_uses_both_tiers() {
        let arch =
            Architecture::new(vec![Tier::new(2, 0.0, 0.0), Tier::new(10, 2.0, 2.0)]).unwrap();
        let ops = build_op_sequence(10, &arch, 1.0, 1.0);
        let uses_tier1 = ops
            .iter()
            .any(|o| matches!(o, Op::Write(1, _) | Op::Read(1, _)));
        assert!(uses_tier1);
    }
}
