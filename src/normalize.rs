// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line normalization
//!
//! Rewrites raw arguments into the order the parser expects: the module
//! selector first, followed by everything else in its original order.

/// Fewest tokens that can hold a module selector and a regex
const MIN_TOKENS_WITH_SELECTOR: usize = 2;

/// Arguments in canonical order: `[module, options..., paths..., regex]`,
/// or a lone global option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCommandLine(Vec<String>);

impl CanonicalCommandLine {
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.0
    }

    /// The selected module, if the first token names one
    pub fn module<'a>(&self, module_names: &[&'a str]) -> Option<&'a str> {
        let first = self.0.first()?;
        module_names.iter().copied().find(|name| name == first)
    }
}

/// Reorder `raw` so a module selector comes first
///
/// In priority order:
/// 1. empty input is returned unchanged;
/// 2. if any token is a global option spelling, the result is that token alone;
/// 3. fewer than two tokens get the default module prepended;
/// 4. otherwise the first token naming a module moves to the front, keeping
///    every other token in order, or the default module is prepended when
///    none does.
///
/// A path or regex that happens to equal a module name is taken as the
/// selector when it is the first such token.
pub fn normalize<S: AsRef<str>>(
    raw: &[S],
    module_names: &[&str],
    global_spellings: &[String],
    default_module: &str,
) -> CanonicalCommandLine {
    let tokens: Vec<String> = raw.iter().map(|token| token.as_ref().to_string()).collect();

    if tokens.is_empty() {
        return CanonicalCommandLine(tokens);
    }

    if let Some(global) = tokens
        .iter()
        .find(|token| global_spellings.iter().any(|spelling| spelling == *token))
    {
        tracing::debug!(option = %global, "global option short-circuits dispatch");
        return CanonicalCommandLine(vec![global.clone()]);
    }

    if tokens.len() < MIN_TOKENS_WITH_SELECTOR {
        return with_default(default_module, tokens);
    }

    match tokens
        .iter()
        .position(|token| module_names.iter().any(|name| name == token))
    {
        None => with_default(default_module, tokens),
        Some(0) => CanonicalCommandLine(tokens),
        Some(index) => {
            let mut tokens = tokens;
            let selector = tokens.remove(index);
            tracing::debug!(module = %selector, from = index, "moved module selector to front");
            tokens.insert(0, selector);
            CanonicalCommandLine(tokens)
        }
    }
}

fn with_default(default_module: &str, tokens: Vec<String>) -> CanonicalCommandLine {
    tracing::debug!(module = default_module, "no module selected, using default");
    let mut canonical = Vec::with_capacity(tokens.len() + 1);
    canonical.push(default_module.to_string());
    canonical.extend(tokens);
    CanonicalCommandLine(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULES: [&str; 3] = ["dirs", "files", "symbols"];

    fn globals() -> Vec<String> {
        vec!["-h".to_string(), "--help".to_string(), "--version".to_string()]
    }

    fn run(raw: &[&str]) -> Vec<String> {
        normalize(raw, &MODULES, &globals(), "files").into_tokens()
    }

    #[test]
    fn empty_input_is_unchanged() {
        assert!(run(&[]).is_empty());
    }

    #[test]
    fn global_option_wins_anywhere() {
        assert_eq!(run(&["--version"]), vec!["--version"]);
        assert_eq!(run(&["symbols", "-d", "--help", "main"]), vec!["--help"]);
        assert_eq!(run(&["-i", "x", "y", "-h"]), vec!["-h"]);
        assert_eq!(run(&["files", "--version", "-h"]), vec!["--version"]);
    }

    #[test]
    fn single_token_gets_default_module() {
        assert_eq!(run(&["pattern"]), vec!["files", "pattern"]);
        assert_eq!(run(&["dirs"]), vec!["files", "dirs"]);
    }

    #[test]
    fn module_token_moves_to_front() {
        assert_eq!(run(&["-i", "files", "pattern"]), vec!["files", "-i", "pattern"]);
        assert_eq!(
            run(&["-i", "src", "lib", "symbols", "main"]),
            vec!["symbols", "-i", "src", "lib", "main"]
        );
    }

    #[test]
    fn module_first_is_unchanged() {
        assert_eq!(run(&["dirs", "-v", "src", "mod"]), vec!["dirs", "-v", "src", "mod"]);
    }

    #[test]
    fn missing_module_prepends_default() {
        assert_eq!(run(&["-i", "src", "needle"]), vec!["files", "-i", "src", "needle"]);
    }

    #[test]
    fn first_module_name_wins() {
        // A regex spelled like a module is taken as the selector
        assert_eq!(run(&["-i", "dirs", "symbols"]), vec!["dirs", "-i", "symbols"]);
        assert_eq!(run(&["src", "files"]), vec!["files", "src"]);
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let samples: [&[&str]; 6] = [
            &["pattern"],
            &["-i", "files", "pattern"],
            &["-v", "src", "needle"],
            &["symbols", "-d", "main"],
            &["a", "b", "c", "dirs"],
            &["files"],
        ];
        for raw in samples {
            let once = normalize(raw, &MODULES, &globals(), "files");
            assert!(once.module(&MODULES).is_some());
            let twice = normalize(once.tokens(), &MODULES, &globals(), "files");
            assert_eq!(once, twice, "input {raw:?}");
        }
    }

    #[test]
    fn relative_order_is_preserved_for_every_position() {
        let others = ["-i", "-v", "src", "lib", "needle"];
        for k in 0..=others.len() {
            let mut raw: Vec<&str> = others.to_vec();
            raw.insert(k, "symbols");
            let mut expected = vec!["symbols"];
            expected.extend(others);
            assert_eq!(run(&raw), expected, "selector at {k}");
        }
    }

    #[test]
    fn canonical_line_reports_module() {
        let canonical = normalize(&["x", "dirs", "y"], &MODULES, &globals(), "files");
        assert_eq!(canonical.module(&MODULES), Some("dirs"));
        let global = normalize(&["--help"], &MODULES, &globals(), "files");
        assert_eq!(global.module(&MODULES), None);
    }
}
