// Copyright (c) 2021, 2022 Frank Fischer <frank-fischer@shadow-soft.de>
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see  <http://www.gnu.org/licenses/>
//

//! A library for computing earth mover's distances over sparse arc
//! sets with a primal network simplex algorithm.
//!
//! The solver takes a balanced supply vector and an explicit list of
//! directed arcs with per-unit costs and optional capacities, and
//! returns a minimum-cost flow together with the dual node potentials.
//! [`emd`] wraps it for the common case of two histograms and a sparse
//! set of admissible transport pairs.
//!
//! # Example
//!
//! ```
//! use rs_emd::{emd, SolutionState};
//!
//! let a = [1, 1];
//! let b = [1, 1];
//! let arcs = [(0, 0, 1), (0, 1, 2), (1, 0, 2), (1, 1, 1)];
//! let result = emd(&a, &b, &arcs, 0, 0).unwrap();
//! assert_eq!(result.state, SolutionState::Optimal);
//! assert_eq!(result.cost, 2);
//! ```

pub mod graph;
pub use self::graph::ArcList;

pub mod pricing;
pub use self::pricing::{BlockSearch, Dantzig, FirstEligible, PricingRule};

pub mod simplex;
pub use self::simplex::{network_simplex, NetworkSimplex, SolutionState};

pub mod emd;
pub use self::emd::{emd, EmdResult};
