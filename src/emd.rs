/*
 * Copyright (c) 2021, 2022 Frank Fischer <frank-fischer@shadow-soft.de>
 *
 * This program is free software: you can redistribute it and/or
 * modify it under the terms of the GNU General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see  <http://www.gnu.org/licenses/>
 */

//! Earth mover's distance between histograms over a sparse arc set.
//!
//! The front end maps two histograms and a list of admissible
//! `(source bin, sink bin, cost)` entries onto a bipartite min-cost-flow
//! problem and runs the network simplex on it. Only the listed entries
//! may carry mass; a pair of histograms that cannot be matched over
//! them comes back as infeasible.

use crate::graph::{ArcList, Error, Result};
use crate::simplex::{NetworkSimplex, SolutionState};
use num_traits::{Bounded, FromPrimitive, NumAssign, NumCast, Signed};

/// Result of an EMD computation.
#[derive(Clone, Debug)]
pub struct EmdResult<F> {
    /// The optimal transport cost.
    pub cost: F,
    /// The transport plan as `(source bin, sink bin, mass)` entries
    /// with positive mass.
    pub plan: Vec<(usize, usize, F)>,
    /// Dual potentials of the source bins.
    pub source_potentials: Vec<F>,
    /// Dual potentials of the sink bins.
    pub sink_potentials: Vec<F>,
    /// Outcome of the underlying solver run.
    pub state: SolutionState,
    /// Number of pivots of the main loop.
    pub iterations: usize,
}

/// Compute the earth mover's distance between the histograms `a` and
/// `b` over the admissible arcs `arcs`.
///
/// Each entry of `arcs` is `(i, j, cost)` allowing mass to move from
/// source bin `i` to sink bin `j` at the given per-unit cost. The
/// masses of `a` and `b` must agree within `tolerance` (pass zero for
/// integer data); the same tolerance drives the solver's pricing test.
/// `max_iterations` caps the pivots of the main loop, 0 means
/// unbounded.
pub fn emd<F>(
    a: &[F],
    b: &[F],
    arcs: &[(usize, usize, F)],
    max_iterations: usize,
    tolerance: F,
) -> Result<EmdResult<F>>
where
    F: Bounded + NumCast + NumAssign + PartialOrd + Copy + FromPrimitive + Signed,
{
    let n = a.len();
    let m = b.len();

    let mut mass_a = F::zero();
    for &x in a {
        mass_a += x;
    }
    let mut mass_b = F::zero();
    for &x in b {
        mass_b += x;
    }
    if (mass_a - mass_b).abs() > tolerance {
        return Err(Error::UnbalancedSupply);
    }

    let mut g = ArcList::with_capacity(n + m, arcs.len());
    for (i, &x) in a.iter().enumerate() {
        g.set_supply(i, x);
    }
    for (j, &x) in b.iter().enumerate() {
        g.set_supply(n + j, -x);
    }
    for (e, &(i, j, cost)) in arcs.iter().enumerate() {
        if i >= n {
            return Err(Error::InvalidEndpoint { arc: e, node: i });
        }
        if j >= m {
            return Err(Error::InvalidEndpoint { arc: e, node: j });
        }
        g.add_arc(i, n + j, cost, F::max_value());
    }
    g.validate(tolerance)?;

    let mut spx = NetworkSimplex::new(&g);
    spx.tolerance = tolerance;
    spx.max_iterations = max_iterations;
    let state = spx.solve();

    let mut plan = Vec::new();
    for (e, &(i, j, _)) in arcs.iter().enumerate() {
        let f = spx.flow(e);
        if f > F::zero() {
            plan.push((i, j, f));
        }
    }

    Ok(EmdResult {
        cost: spx.value(),
        plan,
        source_potentials: spx.potentials()[..n].to_vec(),
        sink_potentials: spx.potentials()[n..].to_vec(),
        state,
        iterations: spx.num_iterations(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_transport() {
        let r = emd(&[1], &[1], &[(0, 0, 3)], 0, 0).unwrap();
        assert_eq!(r.state, SolutionState::Optimal);
        assert_eq!(r.cost, 3);
        assert_eq!(r.plan, vec![(0, 0, 1)]);
    }

    #[test]
    fn test_assignment() {
        let arcs = [(0, 0, 1), (0, 1, 2), (1, 0, 2), (1, 1, 1)];
        let r = emd(&[1, 1], &[1, 1], &arcs, 0, 0).unwrap();
        assert_eq!(r.state, SolutionState::Optimal);
        assert_eq!(r.cost, 2);
        assert_eq!(r.plan, vec![(0, 0, 1), (1, 1, 1)]);
    }

    #[test]
    fn test_sparse_mask_forces_detour() {
        // the cheap pairing is not admissible
        let arcs = [(0, 1, 1), (1, 0, 1)];
        let r = emd(&[2, 1], &[1, 2], &arcs, 0, 0).unwrap();
        assert_eq!(r.state, SolutionState::Optimal);
        assert_eq!(r.cost, 3);
    }

    #[test]
    fn test_infeasible_mask() {
        // sink bin 1 is unreachable
        let arcs = [(0, 0, 1), (1, 0, 1)];
        let r = emd(&[1, 1], &[1, 1], &arcs, 0, 0).unwrap();
        assert_eq!(r.state, SolutionState::Infeasible);
    }

    #[test]
    fn test_unbalanced_mass() {
        let err = emd(&[2], &[1], &[(0, 0, 1)], 0, 0).unwrap_err();
        assert_eq!(err, Error::UnbalancedSupply);
    }

    #[test]
    fn test_bad_bin_index() {
        let err = emd(&[1], &[1], &[(0, 1, 1)], 0, 0).unwrap_err();
        assert_eq!(err, Error::InvalidEndpoint { arc: 0, node: 1 });
    }

    #[test]
    fn test_float_histograms() {
        use approx::assert_relative_eq;

        let a = [0.5f64, 0.5];
        let b = [0.25, 0.75];
        let arcs = [(0, 0, 0.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 0.0)];
        let r = emd(&a, &b, &arcs, 0, 1e-9).unwrap();
        assert_eq!(r.state, SolutionState::Optimal);
        assert_relative_eq!(r.cost, 0.25, epsilon = 1e-9);
    }
}
