//! Alibaba Cloud DNS solver for ACME DNS-01 challenges
//!
//! Supported features:
//! - Publishing and removing challenge TXT records through Alibaba Cloud DNS
//! - Credentials inline in the solver config or referenced from Kubernetes secrets
//! - ACS3-HMAC-SHA256 request signing
//!
//! # Example
//! ```no_run
//! use alidns_webhook::client::{ChallengeRequest, ChallengeSolver};
//! use alidns_webhook::solver::AliDnsSolver;
//!
//! # async fn run(kube_config: kube::Config, request: ChallengeRequest) -> Result<(), Box<dyn std::error::Error>> {
//! let mut solver = AliDnsSolver::new();
//! solver.initialize(kube_config).await?;
//! solver.present(&request).await?;
//! solver.clean_up(&request).await?;
//! # Ok(())
//! # }
//! ```

// Copyright 2023 rust-dns-sdk authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod providers;
pub mod secret_store;
pub mod solver;
pub mod utils;

pub use client::{ChallengeRequest, ChallengeSolver};
pub use error::SolverError;
pub use solver::{get_rr, AliDnsSolver};
