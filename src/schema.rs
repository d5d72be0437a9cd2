// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argument schema shared by the base command and every module
//!
//! An [`ArgumentSpec`] is the single source of truth for one logical
//! argument: it knows its spellings, how to render itself in a usage line and
//! in help text, and how to lower itself into a `clap::Arg`.

use clap::{Arg, ArgAction};

/// Which part of the command line an argument belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgClass {
    /// Exclusive, short-circuiting options (help, version)
    Global,
    /// Options every module accepts
    Common,
    /// Trailing paths and regex
    Positional,
    /// Options contributed by a single module
    Module,
}

/// Number of values an argument consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Option without a value
    Flag,
    /// Exactly one value
    Single,
    /// Any number of values, possibly none
    ZeroOrMore,
}

/// One logical argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub id: &'static str,
    pub class: ArgClass,
    pub short: Option<char>,
    pub long: Option<&'static str>,
    /// Order key among positionals
    pub position: Option<usize>,
    pub arity: Arity,
    pub default: Option<&'static str>,
    pub value_name: Option<&'static str>,
    pub help: &'static str,
}

impl ArgumentSpec {
    /// Boolean switch
    pub fn flag(id: &'static str, class: ArgClass) -> Self {
        Self {
            id,
            class,
            short: None,
            long: None,
            position: None,
            arity: Arity::Flag,
            default: None,
            value_name: None,
            help: "",
        }
    }

    /// Option taking a single value
    pub fn option(id: &'static str, class: ArgClass) -> Self {
        Self {
            arity: Arity::Single,
            ..Self::flag(id, class)
        }
    }

    /// Positional argument at `position` (0-based)
    pub fn positional(id: &'static str, position: usize, arity: Arity) -> Self {
        Self {
            position: Some(position),
            arity,
            ..Self::flag(id, ArgClass::Positional)
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn long(mut self, long: &'static str) -> Self {
        self.long = Some(long);
        self
    }

    pub fn default_value(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub fn value_name(mut self, value_name: &'static str) -> Self {
        self.value_name = Some(value_name);
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub fn is_positional(&self) -> bool {
        self.position.is_some()
    }

    /// Every literal token that selects this option, short form first
    pub fn spellings(&self) -> Vec<String> {
        let mut spellings = Vec::new();
        if let Some(short) = self.short {
            spellings.push(format!("-{short}"));
        }
        if let Some(long) = self.long {
            spellings.push(format!("--{long}"));
        }
        spellings
    }

    fn metavar(&self) -> String {
        self.value_name
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_uppercase())
    }

    /// Fragment this argument contributes to a usage line
    pub fn usage_fragment(&self) -> String {
        if self.is_positional() {
            let name = self.value_name.unwrap_or(self.id);
            return match self.arity {
                Arity::ZeroOrMore => format!("[{name} ...]"),
                Arity::Single | Arity::Flag => name.to_string(),
            };
        }

        let spelling = self
            .spellings()
            .into_iter()
            .next()
            .unwrap_or_else(|| self.id.to_string());
        match self.arity {
            Arity::Flag => format!("[{spelling}]"),
            Arity::Single | Arity::ZeroOrMore => format!("[{spelling} {}]", self.metavar()),
        }
    }

    /// Left column of this argument's help entry
    pub fn invocation(&self) -> String {
        if self.is_positional() {
            return self.value_name.unwrap_or(self.id).to_string();
        }
        let spellings = self.spellings();
        match self.arity {
            Arity::Flag => spellings.join(", "),
            Arity::Single | Arity::ZeroOrMore => {
                let metavar = self.metavar();
                spellings
                    .iter()
                    .map(|spelling| format!("{spelling} {metavar}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
    }

    /// Help text including the default, if any
    pub fn help_text(&self) -> String {
        match self.default {
            Some(default) => format!("{} (default: {default})", self.help),
            None => self.help.to_string(),
        }
    }

    /// Lower into a clap argument; `hidden` suppresses it from clap's help
    pub fn to_clap_arg(&self, hidden: bool) -> Arg {
        let mut arg = Arg::new(self.id).help(self.help).hide(hidden);

        if let Some(position) = self.position {
            arg = arg.index(position + 1);
            arg = match self.arity {
                Arity::ZeroOrMore => arg.num_args(1..).action(ArgAction::Append),
                Arity::Single | Arity::Flag => arg.required(self.default.is_none()),
            };
        } else {
            if let Some(short) = self.short {
                arg = arg.short(short);
            }
            if let Some(long) = self.long {
                arg = arg.long(long);
            }
            arg = match self.arity {
                Arity::Flag => arg.action(ArgAction::SetTrue),
                Arity::Single => arg.action(ArgAction::Set),
                Arity::ZeroOrMore => arg.action(ArgAction::Append),
            };
            if self.class == ArgClass::Global {
                arg = arg.exclusive(true);
            }
        }

        if let Some(value_name) = self.value_name {
            if self.arity != Arity::Flag {
                arg = arg.value_name(value_name);
            }
        }
        if let Some(default) = self.default {
            arg = arg.default_value(default);
        }
        arg
    }
}

/// The arguments shared by every grammar
#[derive(Debug, Clone)]
pub struct SharedSchema {
    specs: Vec<ArgumentSpec>,
}

impl SharedSchema {
    pub fn new(specs: Vec<ArgumentSpec>) -> Self {
        let mut specs = specs;
        // Positionals render and bind in position order regardless of declaration order
        specs.sort_by_key(|spec| spec.position);
        Self { specs }
    }

    pub fn specs(&self) -> &[ArgumentSpec] {
        &self.specs
    }

    pub fn of_class(&self, class: ArgClass) -> impl Iterator<Item = &ArgumentSpec> {
        self.specs.iter().filter(move |spec| spec.class == class)
    }

    pub fn global(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.of_class(ArgClass::Global)
    }

    pub fn common(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.of_class(ArgClass::Common)
    }

    pub fn positional(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.of_class(ArgClass::Positional)
    }

    /// Spellings of every global option, in declaration order
    pub fn global_spellings(&self) -> Vec<String> {
        self.global().flat_map(ArgumentSpec::spellings).collect()
    }

    /// Global spec selected by a literal token
    pub fn global_for(&self, token: &str) -> Option<&ArgumentSpec> {
        self.global()
            .find(|spec| spec.spellings().iter().any(|spelling| spelling == token))
    }
}

pub const HELP: &str = "help";
pub const VERSION: &str = "version";
pub const IGNORE_CASE: &str = "ignore_case";
pub const VERBOSE: &str = "verbose";
pub const PATHS: &str = "paths";
pub const REGEX: &str = "regex";

impl Default for SharedSchema {
    fn default() -> Self {
        Self::new(vec![
            ArgumentSpec::flag(HELP, ArgClass::Global)
                .short('h')
                .long("help")
                .help("Show this help message and exit"),
            ArgumentSpec::flag(VERSION, ArgClass::Global)
                .long("version")
                .help("Show version information for msearch and its modules and exit"),
            ArgumentSpec::flag(IGNORE_CASE, ArgClass::Common)
                .short('i')
                .long("ignore-case")
                .help("Match the regex case-insensitively"),
            ArgumentSpec::flag(VERBOSE, ArgClass::Common)
                .short('v')
                .long("verbose")
                .help("Print a summary of the search to stderr"),
            ArgumentSpec::positional(PATHS, 0, Arity::ZeroOrMore)
                .value_name("path")
                .default_value(".")
                .help("Paths to search"),
            ArgumentSpec::positional(REGEX, 1, Arity::Single)
                .value_name("regex")
                .help("Regular expression to search for"),
        ])
    }
}
