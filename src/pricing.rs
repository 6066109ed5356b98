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

//! Entering-arc pricing rules.
//!
//! A pricing rule scans the non-basic arcs for one violating its
//! optimality condition. The solver is generic over the rule;
//! [`BlockSearch`] is the default and the right choice for almost all
//! instances. [`Dantzig`] (most negative reduced cost) and
//! [`FirstEligible`] (round robin) are mainly useful for comparison.

use num_traits::{NumCast, Signed};

/// Read-only view of the solver state a pricing rule may inspect.
///
/// The slices cover the non-artificial arcs only; artificial arcs never
/// re-enter the basis through pricing.
pub struct ArcView<'a, F> {
    pub(crate) sources: &'a [usize],
    pub(crate) targets: &'a [usize],
    pub(crate) costs: &'a [F],
    pub(crate) states: &'a [i8],
    pub(crate) potentials: &'a [F],
    pub(crate) tolerance: F,
}

impl<'a, F> ArcView<'a, F>
where
    F: NumCast + Signed + PartialOrd + Copy,
{
    pub fn num_arcs(&self) -> usize {
        self.costs.len()
    }

    /// The signed reduced cost of arc `e`.
    ///
    /// The state factor encodes the direction of improvement, so an arc
    /// violates its optimality condition iff this value is negative.
    #[inline]
    pub fn reduced_cost(&self, e: usize) -> F {
        unsafe {
            F::from(*self.states.get_unchecked(e)).unwrap()
                * (*self.costs.get_unchecked(e)
                    + *self.potentials.get_unchecked(*self.sources.get_unchecked(e))
                    - *self.potentials.get_unchecked(*self.targets.get_unchecked(e)))
        }
    }

    /// Whether a candidate with signed reduced cost `rc` is a violation
    /// worth pivoting on.
    ///
    /// The tolerance is scaled by the magnitudes of the potentials and
    /// the cost involved, so that it keeps working after the potentials
    /// have grown large. With a zero tolerance this is an exact test.
    #[inline]
    fn accepts(&self, e: usize, rc: F) -> bool {
        let mut a = self.potentials[self.sources[e]].abs();
        let b = self.potentials[self.targets[e]].abs();
        if b > a {
            a = b;
        }
        let c = self.costs[e].abs();
        if c > a {
            a = c;
        }
        rc < -self.tolerance * a
    }
}

/// An entering-arc selection strategy.
pub trait PricingRule<F> {
    /// Reset the rule for a problem with `num_arcs` non-artificial arcs.
    fn init(&mut self, num_arcs: usize);

    /// Find the next entering arc, or `None` if no arc violates its
    /// optimality condition (within the tolerance).
    fn find_entering(&mut self, view: &ArcView<F>) -> Option<usize>;
}

const MIN_BLOCK_SIZE: usize = 10;

/// Block search pricing.
///
/// Scans the arcs in blocks of roughly `⌈√m⌉` starting from a cursor
/// that wraps around the arc list, and returns the best violator found
/// as soon as a completed block contains one. Ties are broken towards
/// the first arc attaining the minimum.
#[derive(Clone, Debug, Default)]
pub struct BlockSearch {
    block_size: usize,
    next_arc: usize,
}

impl BlockSearch {
    pub fn new() -> Self {
        BlockSearch {
            block_size: 0,
            next_arc: 0,
        }
    }
}

impl<F> PricingRule<F> for BlockSearch
where
    F: NumCast + Signed + PartialOrd + Copy,
{
    fn init(&mut self, num_arcs: usize) {
        self.block_size = ((num_arcs as f64).sqrt().ceil() as usize).max(MIN_BLOCK_SIZE);
        self.next_arc = 0;
    }

    fn find_entering(&mut self, view: &ArcView<F>) -> Option<usize> {
        let m = view.num_arcs();
        if m == 0 {
            return None;
        }

        let mut min = F::zero();
        let mut in_arc = 0;
        let mut found = false;
        let mut cnt = self.block_size;

        for e in (self.next_arc..m).chain(0..self.next_arc) {
            let rc = view.reduced_cost(e);
            if rc < min {
                min = rc;
                in_arc = e;
                found = true;
            }
            cnt -= 1;
            if cnt == 0 {
                if found && view.accepts(in_arc, min) {
                    self.next_arc = (in_arc + 1) % m;
                    return Some(in_arc);
                }
                cnt = self.block_size;
            }
        }

        // Leftover partial block at the end of the sweep.
        if found && view.accepts(in_arc, min) {
            self.next_arc = (in_arc + 1) % m;
            return Some(in_arc);
        }
        None
    }
}

/// Dantzig's rule: scan all arcs, take the most negative reduced cost.
#[derive(Clone, Debug, Default)]
pub struct Dantzig;

impl<F> PricingRule<F> for Dantzig
where
    F: NumCast + Signed + PartialOrd + Copy,
{
    fn init(&mut self, _num_arcs: usize) {}

    fn find_entering(&mut self, view: &ArcView<F>) -> Option<usize> {
        let mut min = F::zero();
        let mut in_arc = None;
        for e in 0..view.num_arcs() {
            let rc = view.reduced_cost(e);
            if rc < min {
                min = rc;
                in_arc = Some(e);
            }
        }
        in_arc.filter(|&e| view.accepts(e, min))
    }
}

/// First eligible arc in round-robin order.
#[derive(Clone, Debug, Default)]
pub struct FirstEligible {
    next_arc: usize,
}

impl<F> PricingRule<F> for FirstEligible
where
    F: NumCast + Signed + PartialOrd + Copy,
{
    fn init(&mut self, _num_arcs: usize) {
        self.next_arc = 0;
    }

    fn find_entering(&mut self, view: &ArcView<F>) -> Option<usize> {
        let m = view.num_arcs();
        if m == 0 {
            return None;
        }
        for e in (self.next_arc..m).chain(0..self.next_arc) {
            let rc = view.reduced_cost(e);
            if rc < F::zero() && view.accepts(e, rc) {
                self.next_arc = (e + 1) % m;
                return Some(e);
            }
        }
        None
    }
}
