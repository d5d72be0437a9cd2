// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in search modules
//!
//! Each module exposes `VERSION`, `create_subgrammar` and `search`.

pub mod dirs;
pub mod files;
pub mod symbols;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::registry::ModuleCandidate;

/// Every module known to this build
pub fn candidates() -> Vec<ModuleCandidate> {
    vec![
        ModuleCandidate::new("dirs")
            .version(dirs::VERSION)
            .create_subgrammar(dirs::create_subgrammar)
            .search(dirs::search),
        ModuleCandidate::new("files")
            .version(files::VERSION)
            .create_subgrammar(files::create_subgrammar)
            .search(files::search),
        ModuleCandidate::new("symbols")
            .version(symbols::VERSION)
            .create_subgrammar(symbols::create_subgrammar)
            .search(symbols::search),
    ]
}

/// Compile the user's regex
pub(crate) fn compile(regex: &str, ignore_case: bool) -> Result<Regex> {
    RegexBuilder::new(regex)
        .case_insensitive(ignore_case)
        .build()
        .with_context(|| format!("invalid regex '{regex}'"))
}

/// True when `name` is one of the ignored directory names
pub(crate) fn is_ignored_dir(name: &str, ignored_dirs: &[String]) -> bool {
    ignored_dirs.iter().any(|ignored| ignored == name)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io;

    use crate::grammar::ParsedArgs;
    use crate::output::{Printer, SearchResult};
    use crate::registry::SearchRequest;

    /// Keeps every printed result
    #[derive(Default)]
    pub struct Collect {
        pub results: Vec<SearchResult>,
    }

    impl Collect {
        pub fn lines(&self) -> Vec<String> {
            let mut lines: Vec<String> = self
                .results
                .iter()
                .map(|result| result.format(false, true))
                .collect();
            lines.sort();
            lines
        }
    }

    impl Printer for Collect {
        fn print(&mut self, result: &SearchResult) -> io::Result<()> {
            self.results.push(result.clone());
            Ok(())
        }

        fn count(&self) -> usize {
            self.results.len()
        }
    }

    pub fn request<'a>(
        regex: &'a str,
        paths: &'a [String],
        args: &'a ParsedArgs,
        ignored_dirs: &'a [String],
    ) -> SearchRequest<'a> {
        SearchRequest {
            regex,
            paths,
            args,
            ignore_case: false,
            verbose: false,
            ignored_dirs,
        }
    }
}
