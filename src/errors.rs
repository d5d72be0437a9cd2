// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types with helpful suggestions
//!
//! Every failure the driver can hit between module discovery and module
//! dispatch, with user-facing messages.

use std::fmt;

use thiserror::Error;

/// Capability a search module must expose to be registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CreateSubgrammar,
    Search,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::CreateSubgrammar => f.write_str("create_subgrammar"),
            Capability::Search => f.write_str("search"),
        }
    }
}

/// Why a module candidate could not be bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingFailure {
    MissingCapability(Capability),
    /// Name is empty
    Unnamed,
    /// Name is also a global option spelling
    ReservedName,
    /// Another module already registered under this name
    DuplicateName,
}

impl fmt::Display for BindingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingFailure::MissingCapability(capability) => {
                write!(f, "module lacks the `{capability}` capability")
            }
            BindingFailure::Unnamed => f.write_str("module has no name"),
            BindingFailure::ReservedName => {
                f.write_str("module name collides with a global option")
            }
            BindingFailure::DuplicateName => f.write_str("module name is already registered"),
        }
    }
}

/// Errors raised by the driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to bind search module '{module}': {reason}")]
    ModuleBinding {
        module: String,
        reason: BindingFailure,
    },

    #[error(
        "No search modules could be loaded\n\n\
         Suggestion: run with MSEARCH_LOG=warn to see why each module was excluded."
    )]
    NoModules,

    #[error(
        "Default module '{name}' is not available\n\n\
         Available modules: {}\n\n\
         Suggestion: set `default_module` in .msearchrc.toml to one of the modules above.",
        .available.join(", ")
    )]
    InvalidDefaultModule { name: String, available: Vec<String> },

    #[error("Module '{module}' declares '{spelling}', which is already used by {owner}")]
    OptionCollision {
        module: String,
        spelling: String,
        owner: String,
    },

    #[error("Module '{module}' declares positional argument '{id}'; modules may only add options")]
    ModulePositional { module: String, id: String },

    #[error(
        "Module '{module}' declares option '{id}' with neither a short nor a long spelling\n\n\
         Suggestion: give the option a `short` or `long` form."
    )]
    UnspelledOption { module: String, id: String },

    #[error("Unbalanced brackets in usage text at byte {offset}: {usage}")]
    UnbalancedUsage { usage: String, offset: usize },

    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("{module} search failed: {source:#}")]
    Search {
        module: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DriverError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::Parse(err) => err.exit_code(),
            _ => 1,
        }
    }

    /// True when the process can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DriverError::ModuleBinding { .. })
    }
}

pub type Result<T, E = DriverError> = std::result::Result<T, E>;
