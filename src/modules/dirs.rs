// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search on the names of files and directories

use std::path::MAIN_SEPARATOR;

use anyhow::Result;
use walkdir::WalkDir;

use crate::grammar::SubgrammarBuilder;
use crate::output::{Printer, SearchResult};
use crate::registry::SearchRequest;
use crate::schema::{ArgClass, ArgumentSpec};

pub const VERSION: &str = "1.0";

const FULL_PATH: &str = "full_path";

pub fn create_subgrammar(builder: &mut SubgrammarBuilder) {
    builder
        .about("Search recursively on the names of files and directories in the given paths.")
        .arg(
            ArgumentSpec::flag(FULL_PATH, ArgClass::Module)
                .long("full-path")
                .help("Match the regex against the whole path instead of the entry name"),
        );
}

pub fn search(request: &SearchRequest<'_>, printer: &mut dyn Printer) -> Result<()> {
    let regex = super::compile(request.regex, request.ignore_case)?;
    // A separator in the regex only makes sense against the whole path
    let full_path = request.args.flag(FULL_PATH) || request.regex.contains(MAIN_SEPARATOR);
    let mut scanned = 0usize;

    for root in request.paths {
        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| super::is_ignored_dir(name, request.ignored_dirs)))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::trace!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            scanned += 1;

            let path = entry.path().display().to_string();
            let subject = if full_path {
                path.clone()
            } else {
                entry.file_name().to_string_lossy().into_owned()
            };
            if regex.is_match(&subject) {
                printer.print(&SearchResult::new(path).highlighted(&regex))?;
            }
        }
    }

    if request.verbose {
        eprintln!(
            "dirs: scanned {scanned} entries, {} matches",
            printer.count()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{ArgValue, ParsedArgs};
    use crate::modules::testing::{request, Collect};
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("src/parser")).expect("mkdir");
        fs::create_dir_all(dir.path().join(".git/parser")).expect("mkdir");
        fs::write(dir.path().join("src/parser/mod.rs"), "").expect("write");
        fs::write(dir.path().join("src/main.rs"), "").expect("write");
        fs::write(dir.path().join("README.md"), "").expect("write");
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
    fn matches_entry_names_and_skips_ignored_dirs() {
        let dir = fixture();
        let paths = vec![dir.path().display().to_string()];
        let args = ParsedArgs::default();
        let ignored = ignored();
        let mut collect = Collect::default();

        search(&request("parser", &paths, &args, &ignored), &mut collect).expect("search");
        assert_eq!(relative(&collect, &dir), vec!["src/parser"]);
    }

    #[test]
    fn name_match_ignores_parent_directories() {
        let dir = fixture();
        let paths = vec![dir.path().display().to_string()];
        let args = ParsedArgs::default();
        let ignored = ignored();
        let mut collect = Collect::default();

        search(&request("^src$", &paths, &args, &ignored), &mut collect).expect("search");
        assert_eq!(relative(&collect, &dir), vec!["src"]);
    }

    #[test]
    fn full_path_flag_matches_whole_path() {
        let dir = fixture();
        let paths = vec![dir.path().display().to_string()];
        let mut args = ParsedArgs::default();
        args.insert(FULL_PATH, ArgValue::Flag(true));
        let ignored = ignored();
        let mut collect = Collect::default();

        search(&request("parser.mod", &paths, &args, &ignored), &mut collect).expect("search");
        assert_eq!(relative(&collect, &dir), vec!["src/parser/mod.rs"]);
    }

    #[test]
    fn case_insensitive_search() {
        let dir = fixture();
        let paths = vec![dir.path().display().to_string()];
        let args = ParsedArgs::default();
        let ignored = ignored();
        let mut collect = Collect::default();

        let mut req = request("readme", &paths, &args, &ignored);
        search(&req, &mut collect).expect("search");
        assert!(collect.results.is_empty());

        req.ignore_case = true;
        search(&req, &mut collect).expect("search");
        assert_eq!(relative(&collect, &dir), vec!["README.md"]);
    }
}
