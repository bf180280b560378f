// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Scope-partitioned logging.
//!
//! Code logs through named [`Scope`](logging::Scope)s registered in a
//! [`ScopeRegistry`](logging::ScopeRegistry). Each scope has its own output
//! level, stack trace level and caller reporting switch; all scopes share one
//! pipeline of sinks that [`configure`](logging::ScopeRegistry::configure)
//! rebuilds from [`Options`](config::Options).

pub mod cli;
pub mod config;
#[macro_use]
pub mod logging;
pub mod shutdown;

pub use config::Options;
pub use logging::{Level, LogError, RichError, Scope, ScopeRegistry};
