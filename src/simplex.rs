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

//! A primal network simplex implementation over explicit arc lists.
//!
//! The solver keeps a feasible spanning tree basis rooted at a
//! synthetic node and improves it by pivots until no non-basic arc
//! violates its optimality condition. The tree is encoded in flat
//! parallel arrays (`parent`, `pred`, `thread`, ...) so that every
//! pivot touches only the affected paths and the moved subtree.

use crate::graph::ArcList;
use crate::pricing::{ArcView, BlockSearch, PricingRule};
use num_traits::{Bounded, FromPrimitive, NumAssign, NumCast, Signed};

const STATE_UPPER: i8 = -1;
const STATE_TREE: i8 = 0;
const STATE_LOWER: i8 = 1;

/// Sentinel for "no node", used for the parent of the root.
const NONE: usize = usize::MAX;

/// Outcome of a solver run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolutionState {
    /// Unknown state, the problem has not been solved, yet
    Unknown,
    /// The problem has been solved to optimality
    Optimal,
    /// The problem is infeasible
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The iteration limit was hit while violating arcs remained
    IterationLimit,
    /// The problem failed validation before solving
    InvalidInput,
}

/// A primal network simplex algorithm.
///
/// All buffers are allocated up front from the problem dimensions; the
/// pivot loop mutates them in place and they remain readable after
/// `solve` returns. The artificial arcs keep their terminal flow so
/// that infeasibility can be inspected per node.
pub struct NetworkSimplex<'a, F, P = BlockSearch> {
    graph: &'a ArcList<F>,

    num_nodes: usize,
    num_arcs: usize,
    root: usize,

    // arc attributes; user arcs first, then one artificial arc per node
    sources: Vec<usize>,
    targets: Vec<usize>,
    costs: Vec<F>,
    caps: Vec<F>,
    flows: Vec<F>,
    state: Vec<i8>,

    // basis tree, indexed by node id; the root is at index num_nodes
    parent: Vec<usize>,
    pred: Vec<usize>,
    forward: Vec<bool>,
    thread: Vec<usize>,
    rev_thread: Vec<usize>,
    succ_num: Vec<usize>,
    last_succ: Vec<usize>,
    potentials: Vec<F>,

    /// The entering arc selection strategy.
    pub pricing: P,
    /// The pricing tolerance ε. Defaults to `F::zero()`, which is the
    /// exact test appropriate for integer values; floating-point
    /// callers should set a small positive value.
    pub tolerance: F,
    /// The infinite flow value.
    ///
    /// Capacities greater than or equal to this are considered
    /// unbounded. The default is `F::max_value()`.
    pub infinite: F,
    /// The artificial cost value.
    ///
    /// Should exceed the cost of any path the optimum could use. If
    /// `None` (the default) it is set to `(max(cost) + 1) * n`.
    pub artificial_cost: Option<F>,
    /// Pivot limit for the main loop; 0 means unbounded.
    pub max_iterations: usize,

    niter: usize,
    solution_state: SolutionState,

    // current pivot
    in_arc: usize,
    join: usize,
    u_in: usize,
    v_in: usize,
    u_out: usize,
    delta: F,
    dirty_revs: Vec<usize>,
}

impl<'a, F> NetworkSimplex<'a, F, BlockSearch>
where
    F: Bounded + NumCast + NumAssign + PartialOrd + Copy + FromPrimitive + Signed,
{
    pub fn new(graph: &'a ArcList<F>) -> Self {
        Self::with_pricing(graph, BlockSearch::new())
    }
}

impl<'a, F, P> NetworkSimplex<'a, F, P>
where
    F: Bounded + NumCast + NumAssign + PartialOrd + Copy + FromPrimitive + Signed,
    P: PricingRule<F>,
{
    pub fn with_pricing(graph: &'a ArcList<F>, pricing: P) -> Self {
        let n = graph.num_nodes();
        let m = graph.num_arcs();
        NetworkSimplex {
            graph,
            num_nodes: n,
            num_arcs: m,
            root: n,

            sources: vec![0; m + n],
            targets: vec![0; m + n],
            costs: vec![F::zero(); m + n],
            caps: vec![F::zero(); m + n],
            flows: vec![F::zero(); m + n],
            state: vec![STATE_LOWER; m + n],

            parent: vec![NONE; n + 1],
            pred: vec![NONE; n + 1],
            forward: vec![false; n + 1],
            thread: vec![0; n + 1],
            rev_thread: vec![0; n + 1],
            succ_num: vec![0; n + 1],
            last_succ: vec![0; n + 1],
            potentials: vec![F::zero(); n + 1],

            pricing,
            tolerance: F::zero(),
            infinite: F::max_value(),
            artificial_cost: None,
            max_iterations: 0,

            niter: 0,
            solution_state: SolutionState::Unknown,

            in_arc: 0,
            join: 0,
            u_in: 0,
            v_in: 0,
            u_out: 0,
            delta: F::zero(),
            dirty_revs: Vec::new(),
        }
    }

    pub fn as_graph(&self) -> &'a ArcList<F> {
        self.graph
    }

    /// The flow on user arc `e` of the latest computation.
    pub fn flow(&self, e: usize) -> F {
        self.flows[e]
    }

    /// The flows on all user arcs.
    pub fn flows(&self) -> &[F] {
        &self.flows[..self.num_arcs]
    }

    /// The potential (dual value) of node `u`.
    pub fn potential(&self, u: usize) -> F {
        self.potentials[u]
    }

    /// The potentials of all user nodes.
    pub fn potentials(&self) -> &[F] {
        &self.potentials[..self.num_nodes]
    }

    /// Terminal flow on the artificial arc of node `u`.
    ///
    /// A positive value after `solve` means the supply of `u` could not
    /// be routed over the user arcs.
    pub fn artificial_flow(&self, u: usize) -> F {
        self.flows[self.num_arcs + u]
    }

    /// Return the objective value of the latest computed flow.
    pub fn value(&self) -> F {
        let mut v = F::zero();
        for e in 0..self.num_arcs {
            v += self.flows[e] * self.costs[e];
        }
        v
    }

    pub fn num_iterations(&self) -> usize {
        self.niter
    }

    /// Return the solution state of the latest computation.
    pub fn solution_state(&self) -> SolutionState {
        self.solution_state
    }

    /// Solve the min-cost-flow problem.
    pub fn solve(&mut self) -> SolutionState {
        self.niter = 0;
        self.solution_state = SolutionState::Unknown;

        if self.graph.validate(self.tolerance).is_err() {
            self.solution_state = SolutionState::InvalidInput;
            return self.solution_state;
        }

        if self.num_nodes == 0 {
            self.solution_state = SolutionState::Optimal;
            return self.solution_state;
        }

        self.prepare_initial_basis();
        self.pricing.init(self.num_arcs);

        // heuristic initial pivots
        if !self.initial_pivots() {
            self.solution_state = SolutionState::Unbounded;
            return self.solution_state;
        }

        loop {
            let entering = self.pricing.find_entering(&ArcView {
                sources: &self.sources[..self.num_arcs],
                targets: &self.targets[..self.num_arcs],
                costs: &self.costs[..self.num_arcs],
                states: &self.state[..self.num_arcs],
                potentials: &self.potentials,
                tolerance: self.tolerance,
            });
            match entering {
                None => break,
                Some(e) => {
                    if self.max_iterations != 0 && self.niter >= self.max_iterations {
                        self.solution_state = SolutionState::IterationLimit;
                        return self.solution_state;
                    }
                    self.niter += 1;
                    self.in_arc = e;
                    if !self.pivot() {
                        self.solution_state = SolutionState::Unbounded;
                        return self.solution_state;
                    }
                }
            }
        }

        self.solution_state = if self.check_feasibility() {
            SolutionState::Optimal
        } else {
            SolutionState::Infeasible
        };
        self.solution_state
    }

    /// Build the star-shaped initial basis.
    ///
    /// Every node hangs off the synthetic root by an artificial arc
    /// carrying its full supply. Supply nodes point towards the root at
    /// zero cost, demand nodes are fed from the root at the artificial
    /// cost, which puts a high potential on them and makes real arcs
    /// into them strongly attractive to the pricing.
    fn prepare_initial_basis(&mut self) {
        let graph = self.graph;
        let n = self.num_nodes;
        let m = self.num_arcs;
        let root = self.root;

        for e in 0..m {
            self.sources[e] = graph.source(e);
            self.targets[e] = graph.target(e);
            self.costs[e] = graph.cost(e);
            self.caps[e] = graph.capacity(e);
            self.flows[e] = F::zero();
            self.state[e] = STATE_LOWER;
        }

        let art_cost = self.artificial_cost.unwrap_or_else(|| {
            let mut c = F::zero();
            for e in 0..m {
                if self.costs[e] > c {
                    c = self.costs[e];
                }
            }
            F::from_usize(n).unwrap() * (c + F::one())
        });

        self.potentials[root] = F::zero();
        self.parent[root] = NONE;
        self.pred[root] = NONE;
        self.forward[root] = false;
        self.thread[root] = 0;
        self.rev_thread[0] = root;
        self.succ_num[root] = n + 1;
        self.last_succ[root] = n - 1;

        for (u, &b) in graph.supplies().iter().enumerate() {
            let e = m + u;
            self.parent[u] = root;
            self.pred[u] = e;
            self.thread[u] = u + 1;
            self.rev_thread[u + 1] = u;
            self.succ_num[u] = 1;
            self.last_succ[u] = u;
            self.caps[e] = self.infinite;
            self.state[e] = STATE_TREE;
            if b >= F::zero() {
                self.forward[u] = true;
                self.potentials[u] = F::zero();
                self.sources[e] = u;
                self.targets[e] = root;
                self.flows[e] = b;
                self.costs[e] = F::zero();
            } else {
                self.forward[u] = false;
                self.potentials[u] = art_cost;
                self.sources[e] = root;
                self.targets[e] = u;
                self.flows[e] = -b;
                self.costs[e] = art_cost;
            }
        }
    }

    /// Heuristic initial pivots.
    ///
    /// Selects promising user arcs in one pass and pivots them in to
    /// drive flow off the artificial arcs early. Correctness does not
    /// depend on the selection; every candidate goes through the
    /// ordinary pivot machinery.
    ///
    /// Returns `false` if unboundedness has been detected.
    fn initial_pivots(&mut self) -> bool {
        let n = self.num_nodes;
        let mut supply_nodes = Vec::new();
        let mut demand_nodes = Vec::new();
        let mut total = F::zero();
        for u in 0..n {
            let b = self.graph.supply(u);
            if b > F::zero() {
                total += b;
                supply_nodes.push(u);
            } else if b < F::zero() {
                demand_nodes.push(u);
            }
        }

        // no supply, no flow
        if total.is_zero() {
            return true;
        }

        let candidates = if supply_nodes.len() == 1 && demand_nodes.len() == 1 {
            self.source_sink_path_arcs(supply_nodes[0], demand_nodes[0], total)
        } else if !demand_nodes.is_empty() {
            self.cheapest_in_arcs(&demand_nodes)
        } else {
            self.cheapest_out_arcs(&supply_nodes)
        };

        for e in candidates {
            if self.reduced_cost(e) >= F::zero() {
                continue;
            }
            self.in_arc = e;
            if !self.pivot() {
                return false;
            }
        }
        true
    }

    /// Reverse search from the sink towards the source, collecting user
    /// arcs with enough capacity to carry the whole supply.
    fn source_sink_path_arcs(&self, s: usize, t: usize, total: F) -> Vec<usize> {
        let n = self.num_nodes;
        let m = self.num_arcs;

        // incoming user arcs per node in CSR layout
        let mut first = vec![0usize; n + 1];
        for e in 0..m {
            first[self.targets[e] + 1] += 1;
        }
        for u in 0..n {
            first[u + 1] += first[u];
        }
        let mut inarcs = vec![0usize; m];
        let mut next = first.clone();
        for e in 0..m {
            inarcs[next[self.targets[e]]] = e;
            next[self.targets[e]] += 1;
        }

        let mut reached = vec![false; n];
        reached[t] = true;
        let mut stack = vec![t];
        let mut arcs = Vec::new();
        while let Some(v) = stack.pop() {
            if v == s {
                break;
            }
            for &e in &inarcs[first[v]..first[v + 1]] {
                let u = self.sources[e];
                if reached[u] || self.caps[e] < total {
                    continue;
                }
                reached[u] = true;
                arcs.push(e);
                stack.push(u);
            }
        }
        arcs
    }

    /// The cheapest incoming user arc of every demand node.
    fn cheapest_in_arcs(&self, demand_nodes: &[usize]) -> Vec<usize> {
        let mut is_demand = vec![false; self.num_nodes];
        for &u in demand_nodes {
            is_demand[u] = true;
        }
        let mut best: Vec<Option<usize>> = vec![None; self.num_nodes];
        for e in 0..self.num_arcs {
            let v = self.targets[e];
            if !is_demand[v] {
                continue;
            }
            match best[v] {
                Some(f) if self.costs[f] <= self.costs[e] => {}
                _ => best[v] = Some(e),
            }
        }
        demand_nodes.iter().filter_map(|&u| best[u]).collect()
    }

    /// The cheapest outgoing user arc of every supply node.
    fn cheapest_out_arcs(&self, supply_nodes: &[usize]) -> Vec<usize> {
        let mut is_supply = vec![false; self.num_nodes];
        for &u in supply_nodes {
            is_supply[u] = true;
        }
        let mut best: Vec<Option<usize>> = vec![None; self.num_nodes];
        for e in 0..self.num_arcs {
            let u = self.sources[e];
            if !is_supply[u] {
                continue;
            }
            match best[u] {
                Some(f) if self.costs[f] <= self.costs[e] => {}
                _ => best[u] = Some(e),
            }
        }
        supply_nodes.iter().filter_map(|&u| best[u]).collect()
    }

    /// Perform one pivot on `self.in_arc`.
    ///
    /// Returns `false` if the pivot exposes an unbounded direction.
    fn pivot(&mut self) -> bool {
        self.find_join();
        let change = self.find_leaving_arc();
        if self.delta >= self.infinite {
            return false;
        }
        self.apply_flow_change(change);
        if change {
            self.update_tree();
            self.update_potentials();
        }
        true
    }

    #[inline]
    fn reduced_cost(&self, e: usize) -> F {
        F::from(self.state[e]).unwrap()
            * (self.costs[e] + self.potentials[self.sources[e]] - self.potentials[self.targets[e]])
    }

    /// Lowest common ancestor of the entering arc's endpoints.
    ///
    /// Subtree sizes strictly grow towards the root, so repeatedly
    /// climbing from the node with the smaller subtree meets exactly at
    /// the common ancestor.
    fn find_join(&mut self) {
        let mut u = self.sources[self.in_arc];
        let mut v = self.targets[self.in_arc];
        while u != v {
            if self.succ_num[u] < self.succ_num[v] {
                u = self.parent[u];
            } else {
                v = self.parent[v];
            }
        }
        self.join = u;
    }

    /// Determine the augmentation value δ and the leaving arc.
    ///
    /// The entering arc closes a cycle made of the two tree paths from
    /// its endpoints to the join. The path scanned first is the one
    /// that loses flow on forward arcs; ties are broken strictly on the
    /// first path and non-strictly on the second, which is what keeps
    /// degenerate pivots from cycling.
    ///
    /// Returns `true` if a tree arc leaves the basis, `false` if the
    /// entering arc itself is blocking (bound swap).
    fn find_leaving_arc(&mut self) -> bool {
        let in_arc = self.in_arc;
        let (first, second) = if self.state[in_arc] == STATE_LOWER {
            (self.sources[in_arc], self.targets[in_arc])
        } else {
            (self.targets[in_arc], self.sources[in_arc])
        };

        self.delta = self.caps[in_arc];
        let mut result = 0;

        let mut u = first;
        while u != self.join {
            let e = self.pred[u];
            let d = if self.forward[u] {
                self.flows[e]
            } else if self.caps[e] >= self.infinite {
                self.infinite
            } else {
                self.caps[e] - self.flows[e]
            };
            if d < self.delta {
                self.delta = d;
                self.u_out = u;
                result = 1;
            }
            u = self.parent[u];
        }

        let mut u = second;
        while u != self.join {
            let e = self.pred[u];
            let d = if self.forward[u] {
                if self.caps[e] >= self.infinite {
                    self.infinite
                } else {
                    self.caps[e] - self.flows[e]
                }
            } else {
                self.flows[e]
            };
            if d <= self.delta {
                self.delta = d;
                self.u_out = u;
                result = 2;
            }
            u = self.parent[u];
        }

        if result == 1 {
            self.u_in = first;
            self.v_in = second;
        } else {
            self.u_in = second;
            self.v_in = first;
        }
        result != 0
    }

    /// Push δ around the pivot cycle and reclassify the arcs.
    fn apply_flow_change(&mut self, change: bool) {
        let in_arc = self.in_arc;
        let delta = self.delta;

        if delta > F::zero() {
            let val = F::from(self.state[in_arc]).unwrap() * delta;
            self.flows[in_arc] += val;
            let mut u = self.sources[in_arc];
            while u != self.join {
                let e = self.pred[u];
                self.flows[e] += if self.forward[u] { -val } else { val };
                u = self.parent[u];
            }
            let mut u = self.targets[in_arc];
            while u != self.join {
                let e = self.pred[u];
                self.flows[e] += if self.forward[u] { val } else { -val };
                u = self.parent[u];
            }
        }

        if change {
            self.state[in_arc] = STATE_TREE;
            let e_out = self.pred[self.u_out];
            self.state[e_out] = if self.flows[e_out].is_zero() {
                STATE_LOWER
            } else {
                STATE_UPPER
            };
        } else {
            self.state[in_arc] = -self.state[in_arc];
        }
    }

    /// Re-root the moved subtree at `u_in` and attach it below `v_in`.
    ///
    /// The subtree that hung off the leaving arc keeps its nodes but is
    /// re-rooted: the parent chain from `u_in` down to `u_out` is
    /// reversed and every stem node takes over the basis arc of its new
    /// child. The thread order is maintained by splicing the affected
    /// pieces, deferring `rev_thread` repairs until the links settle.
    fn update_tree(&mut self) {
        let u_in = self.u_in;
        let v_in = self.v_in;
        let u_out = self.u_out;
        let join = self.join;
        let in_arc = self.in_arc;

        let old_rev_thread = self.rev_thread[u_out];
        let old_succ_num = self.succ_num[u_out];
        let old_last_succ = self.last_succ[u_out];
        let v_out = self.parent[u_out];

        if u_in == u_out {
            // the moved subtree keeps its internal order
            self.parent[u_in] = v_in;
            self.pred[u_in] = in_arc;
            self.forward[u_in] = self.sources[in_arc] == u_in;

            if self.thread[v_in] != u_out {
                // splice the segment out of its old position ...
                let after = self.thread[old_last_succ];
                self.thread[old_rev_thread] = after;
                self.rev_thread[after] = old_rev_thread;
                // ... and back in right behind v_in
                let succ = self.thread[v_in];
                self.thread[v_in] = u_out;
                self.rev_thread[u_out] = v_in;
                self.thread[old_last_succ] = succ;
                self.rev_thread[succ] = old_last_succ;
            }
        } else {
            let thread_continue = if old_rev_thread == v_in {
                self.thread[old_last_succ]
            } else {
                self.thread[v_in]
            };

            // Walk the stem from u_in to u_out. Each iteration inserts
            // the next stem node behind the piece assembled so far,
            // unlinks that piece from its old position and reverses one
            // parent link.
            let mut stem = u_in;
            let mut par_stem = v_in;
            let mut last = self.last_succ[u_in];
            let mut after = self.thread[last];
            self.thread[v_in] = u_in;
            self.dirty_revs.clear();
            self.dirty_revs.push(v_in);
            while stem != u_out {
                let next_stem = self.parent[stem];
                self.thread[last] = next_stem;
                self.dirty_revs.push(last);

                let before = self.rev_thread[stem];
                self.thread[before] = after;
                self.rev_thread[after] = before;

                self.parent[stem] = par_stem;
                par_stem = stem;
                stem = next_stem;

                // the new piece ends where the subtree of its already
                // moved child began
                last = if self.last_succ[stem] == self.last_succ[par_stem] {
                    self.rev_thread[par_stem]
                } else {
                    self.last_succ[stem]
                };
                after = self.thread[last];
            }
            self.parent[u_out] = par_stem;

            self.thread[last] = thread_continue;
            self.rev_thread[thread_continue] = last;
            self.last_succ[u_out] = last;

            if old_rev_thread != v_in {
                self.thread[old_rev_thread] = after;
                self.rev_thread[after] = old_rev_thread;
            }

            for i in 0..self.dirty_revs.len() {
                let u = self.dirty_revs[i];
                self.rev_thread[self.thread[u]] = u;
            }

            // Reassign basis arcs along the reversed stem; each node
            // takes the arc of its new child with flipped direction.
            // Subtree sizes are rebuilt from the differences of the old
            // sizes along the stem.
            let mut tmp_sc = 0;
            let tmp_ls = self.last_succ[u_out];
            let mut u = u_out;
            let mut p = self.parent[u];
            while u != u_in {
                self.pred[u] = self.pred[p];
                self.forward[u] = !self.forward[p];
                tmp_sc += self.succ_num[u] - self.succ_num[p];
                self.succ_num[u] = tmp_sc;
                self.last_succ[p] = tmp_ls;
                u = p;
                p = self.parent[u];
            }
            self.pred[u_in] = in_arc;
            self.forward[u_in] = self.sources[in_arc] == u_in;
            self.succ_num[u_in] = old_succ_num;
        }

        // Fix subtree sizes and last successors outside the moved
        // subtree. The grown side runs from v_in up to the join, the
        // shrunken side from the old parent of u_out; above the join
        // only a tail that pointed into or right before the moved
        // segment can change.
        let s_tail = self.last_succ[u_in];

        let mut u = v_in;
        while u != join {
            self.succ_num[u] += old_succ_num;
            if self.last_succ[u] == v_in {
                self.last_succ[u] = s_tail;
            }
            u = self.parent[u];
        }

        let mut u = v_out;
        while u != join {
            self.succ_num[u] -= old_succ_num;
            if self.last_succ[u] == old_last_succ {
                self.last_succ[u] = old_rev_thread;
            }
            u = self.parent[u];
        }

        let mut u = join;
        while u != NONE {
            if self.last_succ[u] == old_last_succ {
                self.last_succ[u] = if old_rev_thread == v_in {
                    s_tail
                } else {
                    old_rev_thread
                };
            } else if self.last_succ[u] == v_in {
                self.last_succ[u] = s_tail;
            } else {
                break;
            }
            u = self.parent[u];
        }
    }

    /// Shift the potentials of the moved subtree uniformly so that the
    /// new basis arc has zero reduced cost. Differences inside the
    /// subtree are preserved, so all other tree conditions stay intact.
    fn update_potentials(&mut self) {
        let u_in = self.u_in;
        let v_in = self.v_in;
        let e = self.pred[u_in];
        let sigma = if self.forward[u_in] {
            self.potentials[v_in] - self.potentials[u_in] - self.costs[e]
        } else {
            self.potentials[v_in] - self.potentials[u_in] + self.costs[e]
        };
        let end = self.thread[self.last_succ[u_in]];
        let mut u = u_in;
        while u != end {
            self.potentials[u] += sigma;
            u = self.thread[u];
        }
    }

    fn check_feasibility(&self) -> bool {
        self.flows[self.num_arcs..]
            .iter()
            .all(|&f| f <= self.tolerance)
    }
}

/// Solve a min-cost-flow problem with a network simplex algorithm.
///
/// The function returns the objective value and the optimal flow on
/// success and `None` for any non-optimal outcome.
pub fn network_simplex<F>(g: &ArcList<F>) -> Option<(F, Vec<F>)>
where
    F: Bounded + NumCast + NumAssign + PartialOrd + Copy + FromPrimitive + Signed,
{
    let mut spx = NetworkSimplex::new(g);
    if spx.solve() == SolutionState::Optimal {
        Some((spx.value(), spx.flows().to_vec()))
    } else {
        None
    }
}
