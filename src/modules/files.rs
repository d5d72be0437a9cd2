// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search on the contents of files, line by line

use std::fs;
use std::path::Path;

use anyhow::Result;
use ignore::WalkBuilder;
use regex::Regex;

use crate::grammar::SubgrammarBuilder;
use crate::output::{Location, Printer, SearchResult};
use crate::registry::SearchRequest;

pub const VERSION: &str = "1.0";

/// Bytes inspected for a NUL when deciding whether a file is binary
const BINARY_PROBE_LEN: usize = 8 * 1024;

pub fn create_subgrammar(builder: &mut SubgrammarBuilder) {
    builder.about("Search recursively on the contents of any files in the given paths.");
}

pub fn search(request: &SearchRequest<'_>, printer: &mut dyn Printer) -> Result<()> {
    let regex = super::compile(request.regex, request.ignore_case)?;
    let mut scanned = 0usize;

    for root in request.paths {
        for entry in make_builder(root, request.ignored_dirs).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::trace!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                continue;
            }
            scanned += 1;
            search_file(entry.path(), &regex, printer)?;
        }
    }

    if request.verbose {
        eprintln!(
            "files: scanned {scanned} files, {} matching lines",
            printer.count()
        );
    }
    Ok(())
}

/// Walk everything under `root` except the ignored directories
fn make_builder(root: &str, ignored_dirs: &[String]) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let ignored_dirs = ignored_dirs.to_vec();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|kind| kind.is_dir());
        !(is_dir
            && entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| super::is_ignored_dir(name, &ignored_dirs)))
    });
    builder
}

fn search_file(path: &Path, regex: &Regex, printer: &mut dyn Printer) -> Result<()> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::trace!("skipping {}: {err}", path.display());
            return Ok(());
        }
    };
    if is_binary(&bytes) {
        tracing::trace!("skipping binary file {}", path.display());
        return Ok(());
    }

    let content = String::from_utf8_lossy(&bytes);
    for (index, line) in content.lines().enumerate() {
        if regex.is_match(line) {
            printer.print(
                &SearchResult::new(line.trim_end())
                    .at(Location::at_line(path, index + 1))
                    .highlighted(regex),
            )?;
        }
    }
    Ok(())
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_PROBE_LEN)].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ParsedArgs;
    use crate::modules::testing::{request, Collect};
    use std::path::MAIN_SEPARATOR;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("src")).expect("mkdir");
        fs::create_dir_all(dir.path().join(".svn")).expect("mkdir");
        fs::write(
            dir.path().join("src/lib.rs"),
            "fn main() {}\nfn helper() {}\n// Helper docs\n",
        )
        .expect("write");
        fs::write(dir.path().join("notes.txt"), "no match here\nhelper()\n").expect("write");
        fs::write(dir.path().join(".svn/entries"), "helper\n").expect("write");
        fs::write(dir.path().join("blob.bin"), b"helper\0\x01\x02").expect("write");
        dir
    }

    fn ignored() -> Vec<String> {
        vec![".git".to_string(), ".svn".to_string()]
    }

    fn relative(collect: &Collect, root: &TempDir) -> Vec<String> {
        let prefix = format!("{}{}", root.path().display(), MAIN_SEPARATOR);
        collect
            .lines()
            .into_iter()
            .map(|line| line.replacen(&prefix, "", 1).replace(MAIN_SEPARATOR, "/"))
            .collect()
    }

    #[test]
    fn reports_matching_lines_with_locations() {
        let dir = fixture();
        let paths = vec![dir.path().display().to_string()];
        let args = ParsedArgs::default();
        let ignored = ignored();
        let mut collect = Collect::default();

        search(&request("helper", &paths, &args, &ignored), &mut collect).expect("search");
        assert_eq!(
            relative(&collect, &dir),
            vec!["notes.txt:2 helper()", "src/lib.rs:2 fn helper() {}"]
        );
    }

    #[test]
    fn ignore_case_widens_matches() {
        let dir = fixture();
        let paths = vec![dir.path().display().to_string()];
        let args = ParsedArgs::default();
        let ignored = ignored();
        let mut collect = Collect::default();

        let mut req = request("helper", &paths, &args, &ignored);
        req.ignore_case = true;
        search(&req, &mut collect).expect("search");
        assert_eq!(
            relative(&collect, &dir),
            vec![
                "notes.txt:2 helper()",
                "src/lib.rs:2 fn helper() {}",
                "src/lib.rs:3 // Helper docs",
            ]
        );
    }

    #[test]
    fn searches_explicit_files() {
        let dir = fixture();
        let paths = vec![dir.path().join("notes.txt").display().to_string()];
        let args = ParsedArgs::default();
        let ignored = ignored();
        let mut collect = Collect::default();

        search(&request("match", &paths, &args, &ignored), &mut collect).expect("search");
        assert_eq!(relative(&collect, &dir), vec!["notes.txt:1 no match here"]);
    }

    #[test]
    fn invalid_regex_fails_the_search() {
        let dir = fixture();
        let paths = vec![dir.path().display().to_string()];
        let args = ParsedArgs::default();
        let ignored = ignored();
        let mut collect = Collect::default();

        assert!(search(&request("[", &paths, &args, &ignored), &mut collect).is_err());
    }

    #[test]
    fn binary_probe() {
        assert!(is_binary(b"abc\0def"));
        assert!(!is_binary(b"plain text"));
    }
}
