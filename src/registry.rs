// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module registry
//!
//! Binds the known search modules into descriptors. A module must provide
//! both a subgrammar and a search capability; incomplete modules are left
//! out with a diagnostic instead of failing the whole run.

use std::collections::HashSet;
use std::fmt;

use crate::errors::{BindingFailure, Capability, DriverError, Result};
use crate::grammar::{ParsedArgs, SubgrammarBuilder};
use crate::output::Printer;

/// Contributes a module's options to its grammar
pub type SubgrammarFn = fn(&mut SubgrammarBuilder);

/// Runs a module's search, emitting results through the printer
pub type SearchFn = fn(&SearchRequest<'_>, &mut dyn Printer) -> anyhow::Result<()>;

/// Everything a module receives for one search
#[derive(Debug)]
pub struct SearchRequest<'a> {
    pub regex: &'a str,
    pub paths: &'a [String],
    pub args: &'a ParsedArgs,
    pub ignore_case: bool,
    pub verbose: bool,
    /// Directory names never descended into
    pub ignored_dirs: &'a [String],
}

/// A module as found, before its capabilities are checked
#[derive(Clone)]
pub struct ModuleCandidate {
    name: &'static str,
    version: Option<&'static str>,
    create_subgrammar: Option<SubgrammarFn>,
    search: Option<SearchFn>,
}

impl ModuleCandidate {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            version: None,
            create_subgrammar: None,
            search: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(mut self, version: &'static str) -> Self {
        self.version = Some(version);
        self
    }

    pub fn create_subgrammar(mut self, create_subgrammar: SubgrammarFn) -> Self {
        self.create_subgrammar = Some(create_subgrammar);
        self
    }

    pub fn search(mut self, search: SearchFn) -> Self {
        self.search = Some(search);
        self
    }

    fn bind(self) -> Result<ModuleDescriptor> {
        let failure = |reason| DriverError::ModuleBinding {
            module: self.name.to_string(),
            reason,
        };
        if self.name.is_empty() {
            return Err(failure(BindingFailure::Unnamed));
        }
        let Some(create_subgrammar) = self.create_subgrammar else {
            return Err(failure(BindingFailure::MissingCapability(
                Capability::CreateSubgrammar,
            )));
        };
        let Some(search) = self.search else {
            return Err(failure(BindingFailure::MissingCapability(Capability::Search)));
        };
        Ok(ModuleDescriptor {
            name: self.name,
            version: self.version,
            create_subgrammar,
            search,
        })
    }
}

impl fmt::Debug for ModuleCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCandidate")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("create_subgrammar", &self.create_subgrammar.is_some())
            .field("search", &self.search.is_some())
            .finish()
    }
}

/// A bound search module
#[derive(Clone)]
pub struct ModuleDescriptor {
    name: &'static str,
    version: Option<&'static str>,
    create_subgrammar: SubgrammarFn,
    search: SearchFn,
}

impl ModuleDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> Option<&'static str> {
        self.version
    }

    pub fn create_subgrammar(&self, builder: &mut SubgrammarBuilder) {
        (self.create_subgrammar)(builder)
    }

    pub fn search(&self, request: &SearchRequest<'_>, printer: &mut dyn Printer) -> anyhow::Result<()> {
        (self.search)(request, printer)
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{} {version}", self.name),
            None => f.write_str(self.name),
        }
    }
}

/// Ordered, validated collection of search modules
#[derive(Debug)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
    default_module: &'static str,
    diagnostics: Vec<DriverError>,
}

impl ModuleRegistry {
    /// Bind every candidate and order the survivors by name
    ///
    /// `reserved` holds spellings no module may be named after (the global
    /// options). Candidates that fail to bind are excluded and recorded in
    /// [`ModuleRegistry::diagnostics`].
    pub fn discover(
        candidates: Vec<ModuleCandidate>,
        default_module: &str,
        reserved: &[String],
    ) -> Result<Self> {
        let mut modules: Vec<ModuleDescriptor> = Vec::new();
        let mut diagnostics = Vec::new();
        let mut seen = HashSet::new();

        for candidate in candidates {
            let name = candidate.name;
            let bound = if reserved.iter().any(|spelling| spelling == name) {
                Err(DriverError::ModuleBinding {
                    module: name.to_string(),
                    reason: BindingFailure::ReservedName,
                })
            } else if seen.contains(name) {
                Err(DriverError::ModuleBinding {
                    module: name.to_string(),
                    reason: BindingFailure::DuplicateName,
                })
            } else {
                candidate.bind()
            };

            match bound {
                Ok(descriptor) => {
                    tracing::debug!(module = %descriptor, "registered search module");
                    seen.insert(name);
                    modules.push(descriptor);
                }
                Err(err) if err.is_recoverable() => {
                    tracing::warn!("{err}");
                    diagnostics.push(err);
                }
                Err(err) => return Err(err),
            }
        }

        if modules.is_empty() {
            return Err(DriverError::NoModules);
        }
        modules.sort_by_key(|module| module.name);

        let Some(default_module) = modules
            .iter()
            .map(|module| module.name)
            .find(|name| *name == default_module)
        else {
            return Err(DriverError::InvalidDefaultModule {
                name: default_module.to_string(),
                available: modules.iter().map(|module| module.name.to_string()).collect(),
            });
        };

        Ok(Self {
            modules,
            default_module,
            diagnostics,
        })
    }

    /// Registry of the built-in modules
    pub fn builtin(default_module: &str, reserved: &[String]) -> Result<Self> {
        Self::discover(crate::modules::candidates(), default_module, reserved)
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn into_modules(self) -> Vec<ModuleDescriptor> {
        self.modules
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|module| module.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|module| module.name).collect()
    }

    pub fn default_module(&self) -> &'static str {
        self.default_module
    }

    /// Binding failures of excluded candidates
    pub fn diagnostics(&self) -> &[DriverError] {
        &self.diagnostics
    }
}
