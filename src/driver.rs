// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level dispatch
//!
//! Normalizes the raw arguments, answers global options directly, and
//! otherwise parses the canonical command line and runs the selected module.

use clap::error::ErrorKind;

use crate::errors::{DriverError, Result};
use crate::grammar::{assemble, GrammarSet, ParsedArgs};
use crate::normalize::normalize;
use crate::output::{Printer, TerminalPrinter};
use crate::registry::{ModuleRegistry, SearchRequest};
use crate::schema::{SharedSchema, HELP, IGNORE_CASE, PATHS, REGEX, VERBOSE, VERSION};
use crate::usage::{self, UsageParts};

/// Program name shown in usage and version output
pub const PROG: &str = "msearch";

/// What a dispatch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Full help text for the caller to print
    Help(String),
    /// Combined version text for the caller to print
    Version(String),
    /// A module ran to completion
    Completed { module: &'static str, matches: usize },
}

#[derive(Debug)]
pub struct Driver {
    registry: ModuleRegistry,
    grammars: GrammarSet,
    ignored_dirs: Vec<String>,
    width: usize,
}

impl Driver {
    /// Assemble every module grammar against `schema`
    pub fn new(registry: ModuleRegistry, schema: &SharedSchema) -> Result<Self> {
        let grammars = assemble(PROG, schema, registry.modules())?;
        Ok(Self {
            registry,
            grammars,
            ignored_dirs: Vec::new(),
            width: usage::terminal_width(),
        })
    }

    pub fn ignored_dirs(mut self, ignored_dirs: Vec<String>) -> Self {
        self.ignored_dirs = ignored_dirs;
        self
    }

    /// Override the detected terminal width
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn grammars(&self) -> &GrammarSet {
        &self.grammars
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn usage(&self) -> Result<String> {
        usage::synthesize(&UsageParts::from_grammar(&self.grammars), self.width)
    }

    pub fn help(&self) -> Result<String> {
        usage::full_help(&self.grammars, self.width)
    }

    /// `msearch <version>` and one indented line per module
    pub fn version(&self) -> String {
        let mut lines = vec![format!("{PROG} {}", env!("CARGO_PKG_VERSION"))];
        lines.extend(
            self.registry
                .modules()
                .iter()
                .map(|module| format!("  {module}")),
        );
        lines.join("\n")
    }

    /// Dispatch `raw` (without the program name), printing results to stdout
    pub fn dispatch<S: AsRef<str>>(&self, raw: &[S]) -> Result<Outcome> {
        let mut printer = TerminalPrinter::stdout(self.width);
        self.dispatch_with(raw, &mut printer)
    }

    pub fn dispatch_with<S: AsRef<str>>(
        &self,
        raw: &[S],
        printer: &mut dyn Printer,
    ) -> Result<Outcome> {
        let schema = self.grammars.schema();
        let canonical = normalize(
            raw,
            &self.grammars.module_names(),
            &schema.global_spellings(),
            self.registry.default_module(),
        );

        if let [token] = canonical.tokens() {
            match schema.global_for(token).map(|spec| spec.id) {
                Some(HELP) => return Ok(Outcome::Help(self.help()?)),
                Some(VERSION) => return Ok(Outcome::Version(self.version())),
                _ => {}
            }
        }

        let usage = self.usage()?;
        let body = usage.strip_prefix("usage: ").unwrap_or(&usage);
        let mut command = self.grammars.to_command(body);
        let matches = command
            .try_get_matches_from_mut(std::iter::once(PROG.to_string()).chain(canonical.into_tokens()))?;

        let Some((name, sub_matches)) = matches.subcommand() else {
            return Err(command
                .error(ErrorKind::MissingSubcommand, "a search module is required")
                .into());
        };
        let (Some(grammar), Some(module)) = (self.grammars.module(name), self.registry.get(name))
        else {
            return Err(command
                .error(ErrorKind::InvalidSubcommand, format!("unknown module '{name}'"))
                .into());
        };

        let args = ParsedArgs::from_matches(grammar, sub_matches);
        let request = SearchRequest {
            regex: args.value(REGEX).unwrap_or_default(),
            paths: args.values(PATHS),
            args: &args,
            ignore_case: args.flag(IGNORE_CASE),
            verbose: args.flag(VERBOSE),
            ignored_dirs: &self.ignored_dirs,
        };
        tracing::debug!(module = name, regex = request.regex, paths = ?request.paths, "dispatching");

        let failed = |source: anyhow::Error| DriverError::Search {
            module: module.name().to_string(),
            source,
        };
        module.search(&request, printer).map_err(failed)?;
        printer.finish().map_err(|err| failed(err.into()))?;

        Ok(Outcome::Completed {
            module: module.name(),
            matches: printer.count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SubgrammarBuilder;
    use crate::modules::testing::Collect;
    use crate::output::SearchResult;
    use crate::registry::ModuleCandidate;
    use crate::schema::{ArgClass, ArgumentSpec};

    fn echo_subgrammar(builder: &mut SubgrammarBuilder) {
        builder
            .about("Echo the request back.")
            .arg(ArgumentSpec::flag("loud", ArgClass::Module).long("loud"));
    }

    /// Reports one result describing the request it received
    fn echo_search(request: &SearchRequest<'_>, printer: &mut dyn Printer) -> anyhow::Result<()> {
        let line = format!(
            "regex={} paths={} i={} v={} loud={}",
            request.regex,
            request.paths.join(","),
            request.ignore_case,
            request.verbose,
            request.args.flag("loud"),
        );
        printer.print(&SearchResult::new(line))?;
        Ok(())
    }

    fn failing_search(_: &SearchRequest<'_>, _: &mut dyn Printer) -> anyhow::Result<()> {
        anyhow::bail!("disk on fire")
    }

    fn plain(_: &mut SubgrammarBuilder) {}

    fn driver() -> Driver {
        let candidates = vec![
            ModuleCandidate::new("echo")
                .version("2.1")
                .create_subgrammar(echo_subgrammar)
                .search(echo_search),
            ModuleCandidate::new("broken")
                .create_subgrammar(plain)
                .search(failing_search),
        ];
        let schema = SharedSchema::default();
        let registry =
            ModuleRegistry::discover(candidates, "echo", &schema.global_spellings()).expect("registry");
        Driver::new(registry, &schema).expect("driver").width(78)
    }

    fn run(raw: &[&str]) -> Result<Vec<String>> {
        let mut collect = Collect::default();
        driver().dispatch_with(raw, &mut collect)?;
        Ok(collect.lines())
    }

    #[test]
    fn version_short_circuits_dispatch() {
        let outcome = driver()
            .dispatch_with(&["--version"], &mut Collect::default())
            .expect("dispatch");
        let expected = format!("msearch {}\n  broken\n  echo 2.1", env!("CARGO_PKG_VERSION"));
        assert_eq!(outcome, Outcome::Version(expected));
    }

    #[test]
    fn help_wins_over_everything_else() {
        let mut collect = Collect::default();
        let outcome = driver()
            .dispatch_with(&["echo", "needle", "-h", "--bogus"], &mut collect)
            .expect("dispatch");
        let Outcome::Help(text) = outcome else {
            panic!("expected help");
        };
        assert!(text.starts_with("usage: msearch [-h] [--version]"));
        assert!(text.contains("echo:\n  Echo the request back."));
        assert!(collect.results.is_empty());
    }

    #[test]
    fn default_module_receives_bare_regex() {
        assert_eq!(
            run(&["needle"]).expect("dispatch"),
            vec!["regex=needle paths=. i=false v=false loud=false"]
        );
    }

    #[test]
    fn module_selector_may_follow_options() {
        assert_eq!(
            run(&["-i", "--loud", "echo", "src", "lib", "needle"]).expect("dispatch"),
            vec!["regex=needle paths=src,lib i=true v=false loud=true"]
        );
    }

    #[test]
    fn completed_outcome_reports_module_and_count() {
        let outcome = driver()
            .dispatch_with(&["echo", "-v", "x"], &mut Collect::default())
            .expect("dispatch");
        assert_eq!(
            outcome,
            Outcome::Completed {
                module: "echo",
                matches: 1
            }
        );
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        let err = run(&[]).expect_err("no arguments");
        assert!(matches!(err, DriverError::Parse(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn parse_errors_use_synthesized_usage() {
        let err = run(&["echo", "--nope", "x"]).expect_err("unknown option");
        let DriverError::Parse(clap_err) = &err else {
            panic!("expected parse error, got {err:?}");
        };
        assert_eq!(clap_err.kind(), ErrorKind::UnknownArgument);
        assert!(clap_err.to_string().contains("msearch [-h] [--version]"));
    }

    #[test]
    fn search_failures_surface_with_module_name() {
        let err = run(&["broken", "x"]).expect_err("search fails");
        assert!(matches!(err, DriverError::Search { ref module, .. } if module == "broken"));
        assert_eq!(err.to_string(), "broken search failed: disk on fire");
        assert_eq!(err.exit_code(), 1);
    }
}
