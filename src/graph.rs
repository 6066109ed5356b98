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

//! Sparse transport problems stored as flat arc lists.

use num_traits::Signed;
use std::error;
use std::fmt;

/// Error describing why a problem is not solvable as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The node supplies do not cancel (within the tolerance passed to
    /// [`ArcList::validate`]).
    UnbalancedSupply,
    /// An arc endpoint is not a valid node id.
    InvalidEndpoint { arc: usize, node: usize },
    /// An arc has a negative capacity.
    NegativeCapacity { arc: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Error::UnbalancedSupply => write!(fmt, "node supplies do not sum to zero"),
            Error::InvalidEndpoint { arc, node } => {
                write!(fmt, "arc {} references invalid node {}", arc, node)
            }
            Error::NegativeCapacity { arc } => write!(fmt, "arc {} has negative capacity", arc),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// A min-cost-flow problem over an explicit list of directed arcs.
///
/// Nodes are the integers `0..num_nodes`. Arcs are added one by one
/// before a solver is constructed; the solver never modifies the
/// problem. All attributes are kept in parallel flat vectors.
#[derive(Clone, Debug)]
pub struct ArcList<F> {
    num_nodes: usize,
    supplies: Vec<F>,
    sources: Vec<usize>,
    targets: Vec<usize>,
    costs: Vec<F>,
    capacities: Vec<F>,
}

impl<F> ArcList<F>
where
    F: Signed + PartialOrd + Copy,
{
    /// Create a problem with `num_nodes` nodes, no arcs and all supplies zero.
    pub fn new(num_nodes: usize) -> Self {
        Self::with_capacity(num_nodes, 0)
    }

    /// Create a problem with preallocated space for `num_arcs` arcs.
    pub fn with_capacity(num_nodes: usize, num_arcs: usize) -> Self {
        ArcList {
            num_nodes,
            supplies: vec![F::zero(); num_nodes],
            sources: Vec::with_capacity(num_arcs),
            targets: Vec::with_capacity(num_arcs),
            costs: Vec::with_capacity(num_arcs),
            capacities: Vec::with_capacity(num_arcs),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_arcs(&self) -> usize {
        self.sources.len()
    }

    /// Set the supply of node `u` (positive: source, negative: sink).
    pub fn set_supply(&mut self, u: usize, supply: F) {
        self.supplies[u] = supply;
    }

    pub fn supply(&self, u: usize) -> F {
        self.supplies[u]
    }

    /// Add an arc from `u` to `v` and return its id.
    ///
    /// Use a large sentinel capacity (e.g. `F::max_value()`) for
    /// uncapacitated arcs; the solver treats capacities at or above its
    /// `infinite` value as unbounded.
    pub fn add_arc(&mut self, u: usize, v: usize, cost: F, capacity: F) -> usize {
        self.sources.push(u);
        self.targets.push(v);
        self.costs.push(cost);
        self.capacities.push(capacity);
        self.sources.len() - 1
    }

    pub fn source(&self, e: usize) -> usize {
        self.sources[e]
    }

    pub fn target(&self, e: usize) -> usize {
        self.targets[e]
    }

    pub fn cost(&self, e: usize) -> F {
        self.costs[e]
    }

    pub fn capacity(&self, e: usize) -> F {
        self.capacities[e]
    }

    pub(crate) fn supplies(&self) -> &[F] {
        &self.supplies
    }

    /// Check that the problem is well-formed.
    ///
    /// `tolerance` bounds the acceptable supply imbalance; pass zero for
    /// exact (integer) data. An imbalance within the tolerance is left
    /// in place and ends up on the artificial arcs, where the solver's
    /// equally tolerant feasibility check ignores it.
    pub fn validate(&self, tolerance: F) -> Result<()> {
        for e in 0..self.num_arcs() {
            if self.sources[e] >= self.num_nodes {
                return Err(Error::InvalidEndpoint {
                    arc: e,
                    node: self.sources[e],
                });
            }
            if self.targets[e] >= self.num_nodes {
                return Err(Error::InvalidEndpoint {
                    arc: e,
                    node: self.targets[e],
                });
            }
            if self.capacities[e] < F::zero() {
                return Err(Error::NegativeCapacity { arc: e });
            }
        }

        let mut excess = F::zero();
        for &b in &self.supplies {
            excess = excess + b;
        }
        if excess.abs() > tolerance {
            return Err(Error::UnbalancedSupply);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_balanced() {
        let mut g = ArcList::new(2);
        g.set_supply(0, 4);
        g.set_supply(1, -4);
        g.add_arc(0, 1, 1, isize::MAX);
        assert_eq!(g.validate(0), Ok(()));
    }

    #[test]
    fn test_validate_unbalanced() {
        let mut g = ArcList::new(2);
        g.set_supply(0, 4);
        g.set_supply(1, -3);
        assert_eq!(g.validate(0), Err(Error::UnbalancedSupply));
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut g = ArcList::<isize>::new(2);
        g.add_arc(0, 2, 1, isize::MAX);
        assert_eq!(g.validate(0), Err(Error::InvalidEndpoint { arc: 0, node: 2 }));
    }

    #[test]
    fn test_validate_negative_capacity() {
        let mut g = ArcList::new(3);
        g.add_arc(0, 1, 1, isize::MAX);
        g.add_arc(1, 2, 1, -5);
        assert_eq!(g.validate(0), Err(Error::NegativeCapacity { arc: 1 }));
    }
}
