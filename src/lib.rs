// SPDX-License-Identifier: MIT OR Apache-2.0

//! msearch - one command line for several search modules
//!
//! Modules contribute their own options; the driver merges the shared
//! options into each of them, reorders loosely written command lines and
//! renders one combined usage text.

pub mod config;
pub mod driver;
pub mod errors;
pub mod grammar;
pub mod logging;
pub mod modules;
pub mod normalize;
pub mod output;
pub mod registry;
pub mod schema;
pub mod usage;
