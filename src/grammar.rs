// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grammar assembly
//!
//! Builds the base grammar (global options plus module selection) and one
//! grammar per module (the module's own options plus every common and
//! positional argument, hidden from that module's help). Option spellings
//! are checked for collisions here, before anything is parsed.

use std::collections::HashMap;

use clap::{ArgMatches, Command};

use crate::errors::{DriverError, Result};
use crate::registry::ModuleDescriptor;
use crate::schema::{ArgClass, ArgumentSpec, Arity, SharedSchema};

/// Handed to a module's `create_subgrammar` to collect its options
#[derive(Debug)]
pub struct SubgrammarBuilder {
    module: &'static str,
    about: Option<&'static str>,
    specs: Vec<ArgumentSpec>,
}

impl SubgrammarBuilder {
    fn new(module: &'static str) -> Self {
        Self {
            module,
            about: None,
            specs: Vec::new(),
        }
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    /// One-line description shown in the module's help section
    pub fn about(&mut self, about: &'static str) -> &mut Self {
        self.about = Some(about);
        self
    }

    /// Declare a module option; the class is forced to [`ArgClass::Module`]
    pub fn arg(&mut self, spec: ArgumentSpec) -> &mut Self {
        self.specs.push(ArgumentSpec {
            class: ArgClass::Module,
            ..spec
        });
        self
    }
}

/// An argument bound into a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSpec {
    pub spec: ArgumentSpec,
    /// Suppressed from this grammar's own help and usage
    pub hidden: bool,
}

/// Parser description for the base command or one module
#[derive(Debug, Clone)]
pub struct Grammar {
    name: &'static str,
    about: Option<&'static str>,
    specs: Vec<BoundSpec>,
}

impl Grammar {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn about(&self) -> Option<&'static str> {
        self.about
    }

    pub fn specs(&self) -> &[BoundSpec] {
        &self.specs
    }

    /// Specs shown in this grammar's own usage and help
    pub fn visible(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.specs
            .iter()
            .filter(|bound| !bound.hidden)
            .map(|bound| &bound.spec)
    }

    /// Usage line of this grammar on its own: its name and visible options
    pub fn usage_line(&self) -> String {
        std::iter::once(self.name.to_string())
            .chain(self.visible().map(ArgumentSpec::usage_fragment))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(self.name)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .allow_missing_positional(true);
        if let Some(about) = self.about {
            command = command.about(about);
        }
        for bound in &self.specs {
            command = command.arg(bound.spec.to_clap_arg(bound.hidden));
        }
        command
    }
}

/// Value of one parsed argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Flag(bool),
    Value(Option<String>),
    List(Vec<String>),
}

/// Parsed arguments of one module invocation, keyed by spec id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    values: HashMap<&'static str, ArgValue>,
}

impl ParsedArgs {
    pub(crate) fn from_matches(grammar: &Grammar, matches: &ArgMatches) -> Self {
        let values = grammar
            .specs()
            .iter()
            .map(|bound| {
                let spec = &bound.spec;
                let value = match spec.arity {
                    Arity::Flag => ArgValue::Flag(matches.get_flag(spec.id)),
                    Arity::Single => ArgValue::Value(matches.get_one::<String>(spec.id).cloned()),
                    Arity::ZeroOrMore => ArgValue::List(
                        matches
                            .get_many::<String>(spec.id)
                            .map(|values| values.cloned().collect())
                            .unwrap_or_default(),
                    ),
                };
                (spec.id, value)
            })
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, id: &'static str, value: ArgValue) {
        self.values.insert(id, value);
    }

    /// True when the flag `id` was given
    pub fn flag(&self, id: &str) -> bool {
        matches!(self.values.get(id), Some(ArgValue::Flag(true)))
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        match self.values.get(id) {
            Some(ArgValue::Value(value)) => value.as_deref(),
            Some(ArgValue::List(values)) => values.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn values(&self, id: &str) -> &[String] {
        match self.values.get(id) {
            Some(ArgValue::List(values)) => values,
            Some(ArgValue::Value(Some(value))) => std::slice::from_ref(value),
            _ => &[],
        }
    }
}

/// The base grammar and one grammar per module
#[derive(Debug, Clone)]
pub struct GrammarSet {
    base: Grammar,
    modules: Vec<Grammar>,
    schema: SharedSchema,
}

impl GrammarSet {
    pub fn base(&self) -> &Grammar {
        &self.base
    }

    pub fn modules(&self) -> &[Grammar] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Grammar> {
        self.modules.iter().find(|grammar| grammar.name == name)
    }

    pub fn schema(&self) -> &SharedSchema {
        &self.schema
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(Grammar::name).collect()
    }

    /// Lower the whole grammar into one clap command; `usage` replaces
    /// clap's rendering in every error message
    pub fn to_command(&self, usage: &str) -> Command {
        let mut command = self
            .base
            .to_command()
            .disable_help_subcommand(true)
            .subcommand_required(true)
            .override_usage(usage.to_string());
        for module in &self.modules {
            command = command.subcommand(module.to_command().override_usage(usage.to_string()));
        }
        command
    }
}

/// Who owns a spelling while assembling
#[derive(Debug, Clone)]
enum Owner {
    Global,
    Common,
    Positional,
    Module(String),
}

impl Owner {
    fn describe(&self) -> String {
        match self {
            Owner::Global => "a global option".to_string(),
            Owner::Common => "a common option".to_string(),
            Owner::Positional => "a positional argument".to_string(),
            Owner::Module(name) => format!("module '{name}'"),
        }
    }
}

/// Assemble the base grammar and every module grammar
///
/// Fails with [`DriverError::OptionCollision`] when a module reuses a
/// spelling already owned by a shared argument or a previously assembled
/// module, or an argument id already used by a shared argument or by the
/// same module. Options without any spelling fail with
/// [`DriverError::UnspelledOption`].
pub fn assemble(
    prog: &'static str,
    schema: &SharedSchema,
    modules: &[ModuleDescriptor],
) -> Result<GrammarSet> {
    let mut spellings: HashMap<String, Owner> = HashMap::new();
    let mut ids: HashMap<&'static str, Owner> = HashMap::new();

    for spec in schema.specs() {
        let owner = match spec.class {
            ArgClass::Global => Owner::Global,
            ArgClass::Common => Owner::Common,
            ArgClass::Positional => Owner::Positional,
            ArgClass::Module => Owner::Module("shared schema".to_string()),
        };
        for spelling in spec.spellings() {
            spellings.insert(spelling, owner.clone());
        }
        ids.insert(spec.id, owner);
    }

    let base = Grammar {
        name: prog,
        about: None,
        specs: schema
            .global()
            .cloned()
            .map(|spec| BoundSpec {
                spec,
                hidden: false,
            })
            .collect(),
    };

    let mut grammars = Vec::with_capacity(modules.len());
    for descriptor in modules {
        let mut builder = SubgrammarBuilder::new(descriptor.name());
        descriptor.create_subgrammar(&mut builder);

        // Ids only need to be unique within one subcommand
        let mut module_ids = ids.clone();
        for spec in &builder.specs {
            if spec.is_positional() {
                return Err(DriverError::ModulePositional {
                    module: builder.module.to_string(),
                    id: spec.id.to_string(),
                });
            }
            let module_spellings = spec.spellings();
            if module_spellings.is_empty() {
                return Err(DriverError::UnspelledOption {
                    module: builder.module.to_string(),
                    id: spec.id.to_string(),
                });
            }
            if let Some(owner) = module_ids.get(spec.id) {
                return Err(collision(builder.module, spec.id, owner));
            }
            for spelling in module_spellings {
                if let Some(owner) = spellings.get(&spelling) {
                    return Err(collision(builder.module, &spelling, owner));
                }
                spellings.insert(spelling, Owner::Module(builder.module.to_string()));
            }
            module_ids.insert(spec.id, Owner::Module(builder.module.to_string()));
        }

        let mut specs: Vec<BoundSpec> = builder
            .specs
            .into_iter()
            .map(|spec| BoundSpec {
                spec,
                hidden: false,
            })
            .collect();
        specs.extend(
            schema
                .common()
                .chain(schema.positional())
                .cloned()
                .map(|spec| BoundSpec { spec, hidden: true }),
        );

        tracing::debug!(
            module = builder.module,
            options = specs.len(),
            "assembled module grammar"
        );
        grammars.push(Grammar {
            name: builder.module,
            about: builder.about,
            specs,
        });
    }

    Ok(GrammarSet {
        base,
        modules: grammars,
        schema: schema.clone(),
    })
}

fn collision(module: &str, spelling: &str, owner: &Owner) -> DriverError {
    DriverError::OptionCollision {
        module: module.to_string(),
        spelling: spelling.to_string(),
        owner: owner.describe(),
    }
}
