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

//! Solve a random sparse transport instance.

use std::error::Error;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustop::opts;
use time::OffsetDateTime;

use rs_emd::pricing::{Dantzig, FirstEligible, PricingRule};
use rs_emd::{ArcList, BlockSearch, NetworkSimplex, SolutionState};

fn run<P>(g: &ArcList<f64>, pricing: P) -> (SolutionState, f64, usize, f64)
where
    P: PricingRule<f64>,
{
    let mut spx = NetworkSimplex::with_pricing(g, pricing);
    spx.tolerance = 1e-9;
    let tstart = OffsetDateTime::now_utc();
    let state = spx.solve();
    let tend = OffsetDateTime::now_utc();
    (
        state,
        spx.value(),
        spx.num_iterations(),
        (tend - tstart).as_seconds_f64(),
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let (args, _) = opts! {
        synopsis "Solve a random sparse EMD instance with a network simplex algorithm.";
        opt bins:usize=1000, desc:"Number of bins per side";
        opt degree:usize=16, desc:"Number of admissible sinks per source bin";
        opt seed:u64=42, desc:"Random seed";
        opt dantzig:bool, desc:"Dantzig's rule pricing (most negative)";
        opt first_eligible:bool, desc:"First eligible arc pricing (round robin)";
    }
    .parse_or_exit();

    let n = args.bins;
    let mut rng = StdRng::seed_from_u64(args.seed);

    // positions of source and sink bins on the unit interval
    let xs: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    let xt: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();

    let mut g = ArcList::with_capacity(2 * n, n * args.degree);
    let mass = 1.0 / n as f64;
    for u in 0..n {
        g.set_supply(u, mass);
        g.set_supply(n + u, -mass);
    }
    for i in 0..n {
        for _ in 0..args.degree {
            let j = rng.gen_range(0..n);
            g.add_arc(i, n + j, (xs[i] - xt[j]).abs(), f64::MAX);
        }
    }

    println!("Number of bins      : {} + {}", n, n);
    println!("Number of arcs      : {}", g.num_arcs());

    let (state, value, niter, soltime) = if args.dantzig {
        run(&g, Dantzig)
    } else if args.first_eligible {
        run(&g, FirstEligible::default())
    } else {
        run(&g, BlockSearch::new())
    };

    println!();
    println!("Solution state      : {:?}", state);
    println!("Value               : {:.6}", value);
    println!("Time (seconds)      : {:.2}", soltime);
    println!("Iterations (total)  : {}", niter);

    Ok(())
}
