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

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use rs_emd::simplex::{network_simplex, NetworkSimplex, SolutionState};
use rs_emd::ArcList;

const INF: i64 = i64::MAX;

fn problem(num_nodes: usize, supplies: &[(usize, i64)], arcs: &[(usize, usize, i64)]) -> ArcList<i64> {
    let mut g = ArcList::with_capacity(num_nodes, arcs.len());
    for &(u, b) in supplies {
        g.set_supply(u, b);
    }
    for &(u, v, c) in arcs {
        g.add_arc(u, v, c, INF);
    }
    g
}

#[test]
fn test_trivial_transport() {
    let g = problem(2, &[(0, 1), (1, -1)], &[(0, 1, 3)]);
    let mut spx = NetworkSimplex::new(&g);
    assert_eq!(spx.solve(), SolutionState::Optimal);
    assert_eq!(spx.flows(), &[1]);
    assert_eq!(spx.value(), 3);
    assert_eq!(spx.potential(1) - spx.potential(0), 3);
}

#[test]
fn test_two_to_two_assignment() {
    let g = problem(
        4,
        &[(0, 1), (1, 1), (2, -1), (3, -1)],
        &[(0, 2, 1), (0, 3, 2), (1, 2, 2), (1, 3, 1)],
    );
    let mut spx = NetworkSimplex::new(&g);
    assert_eq!(spx.solve(), SolutionState::Optimal);
    assert_eq!(spx.flows(), &[1, 0, 0, 1]);
    assert_eq!(spx.value(), 2);
}

#[test]
fn test_bottleneck_routing() {
    let g = problem(3, &[(0, 2), (2, -2)], &[(0, 1, 1), (1, 2, 1)]);
    let mut spx = NetworkSimplex::new(&g);
    assert_eq!(spx.solve(), SolutionState::Optimal);
    assert_eq!(spx.flows(), &[2, 2]);
    assert_eq!(spx.value(), 4);
}

#[test]
fn test_infeasible_without_arcs() {
    let g = problem(2, &[(0, 1), (1, -1)], &[]);
    let mut spx = NetworkSimplex::new(&g);
    assert_eq!(spx.solve(), SolutionState::Infeasible);
    // the unroutable supply stays on the artificial arcs
    assert_eq!(spx.artificial_flow(0), 1);
    assert_eq!(spx.artificial_flow(1), 1);
}

#[test]
fn test_diagonal_optimum() {
    let supplies: Vec<(usize, i64)> = vec![(0, 1), (1, 1), (2, 1), (3, -1), (4, -1), (5, -1)];
    let mut arcs = Vec::new();
    for i in 0..3usize {
        for j in 3..6usize {
            arcs.push((i, j, (i as i64 - (j as i64 - 3)).abs()));
        }
    }
    let g = problem(6, &supplies, &arcs);
    let mut spx = NetworkSimplex::new(&g);
    assert_eq!(spx.solve(), SolutionState::Optimal);
    assert_eq!(spx.value(), 0);
    // the matching runs along the diagonal
    for (e, &(i, j, _)) in arcs.iter().enumerate() {
        assert_eq!(spx.flow(e), if j - 3 == i { 1 } else { 0 });
    }
}

#[test]
fn test_degenerate_pivots_terminate() {
    let g = problem(
        4,
        &[(0, 1), (3, -1)],
        &[(0, 1, 1), (0, 2, 1), (1, 3, 1), (2, 3, 1)],
    );
    let mut spx = NetworkSimplex::new(&g);
    // both routes are optimal; the solver must not stall on the tie
    spx.max_iterations = 100;
    assert_eq!(spx.solve(), SolutionState::Optimal);
    assert_eq!(spx.value(), 2);
}

#[test]
fn test_determinism() {
    let g = problem(
        4,
        &[(0, 2), (1, 1), (2, -1), (3, -2)],
        &[(0, 2, 1), (0, 3, 2), (1, 2, 2), (1, 3, 1), (0, 1, 1)],
    );
    let mut first = NetworkSimplex::new(&g);
    assert_eq!(first.solve(), SolutionState::Optimal);
    let mut second = NetworkSimplex::new(&g);
    assert_eq!(second.solve(), SolutionState::Optimal);
    assert_eq!(first.flows(), second.flows());
    assert_eq!(first.potentials(), second.potentials());
    assert_eq!(first.num_iterations(), second.num_iterations());
}

#[test]
fn test_arc_permutation_keeps_optimum() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 10usize;
    let mut supplies = vec![0i64; n];
    for _ in 0..20 {
        let u = rng.gen_range(0..n / 2);
        let v = rng.gen_range(n / 2..n);
        supplies[u] += 1;
        supplies[v] -= 1;
    }
    let mut arcs = Vec::new();
    for u in 0..n / 2 {
        for v in n / 2..n {
            arcs.push((u, v, rng.gen_range(1..30)));
        }
    }

    let supply_list: Vec<(usize, i64)> = supplies.iter().cloned().enumerate().collect();
    let g = problem(n, &supply_list, &arcs);
    let (value, _) = network_simplex(&g).expect("optimal solution");

    for _ in 0..5 {
        arcs.shuffle(&mut rng);
        let g = problem(n, &supply_list, &arcs);
        let (shuffled, _) = network_simplex(&g).expect("optimal solution");
        assert_eq!(value, shuffled);
    }
}

#[test]
fn test_duality() {
    // at the optimum the dual objective over the demands equals the cost
    let g = problem(
        5,
        &[(0, 3), (1, 2), (2, -1), (3, -2), (4, -2)],
        &[
            (0, 2, 4),
            (0, 3, 1),
            (1, 3, 6),
            (1, 4, 2),
            (0, 4, 7),
            (2, 3, 1),
        ],
    );
    let mut spx = NetworkSimplex::new(&g);
    assert_eq!(spx.solve(), SolutionState::Optimal);
    let mut dual = 0;
    for u in 0..5 {
        dual += -g.supply(u) * spx.potential(u);
    }
    assert_eq!(dual, spx.value());
}

#[test]
fn test_flow_conservation_random() {
    let mut rng = StdRng::seed_from_u64(0xbeef);
    for _ in 0..20 {
        let n = rng.gen_range(3..15);
        let mut g = ArcList::with_capacity(n, 3 * n);
        let mut left = 0i64;
        for u in 0..n - 1 {
            let b = rng.gen_range(-5..=5);
            g.set_supply(u, b);
            left -= b;
        }
        g.set_supply(n - 1, left);
        for _ in 0..3 * n {
            g.add_arc(
                rng.gen_range(0..n),
                rng.gen_range(0..n),
                rng.gen_range(0..10),
                INF,
            );
        }

        let mut spx = NetworkSimplex::new(&g);
        let state = spx.solve();
        if state != SolutionState::Optimal {
            assert_eq!(state, SolutionState::Infeasible);
            continue;
        }
        for u in 0..n {
            let mut excess = 0;
            for e in 0..g.num_arcs() {
                if g.source(e) == u {
                    excess += spx.flow(e);
                }
                if g.target(e) == u {
                    excess -= spx.flow(e);
                }
            }
            assert_eq!(excess, g.supply(u));
        }
    }
}

#[test]
fn test_float_costs() {
    use approx::assert_relative_eq;

    let mut g = ArcList::with_capacity(3, 3);
    g.set_supply(0, 1.5f64);
    g.set_supply(1, 0.5);
    g.set_supply(2, -2.0);
    g.add_arc(0, 2, 0.5, f64::MAX);
    g.add_arc(1, 2, 1.5, f64::MAX);
    g.add_arc(0, 1, 0.25, f64::MAX);
    let mut spx = NetworkSimplex::new(&g);
    spx.tolerance = 1e-9;
    assert_eq!(spx.solve(), SolutionState::Optimal);
    assert_relative_eq!(spx.value(), 1.5, epsilon = 1e-9);
}
