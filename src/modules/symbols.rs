// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search for symbols within object files and archives
//!
//! Symbol tables are read through `objdump -t -C` (or `-T` for the dynamic
//! table), so any format objdump understands can be searched.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::grammar::SubgrammarBuilder;
use crate::output::{Location, Printer, SearchResult};
use crate::registry::SearchRequest;
use crate::schema::{ArgClass, ArgumentSpec};

pub const VERSION: &str = "1.0";

const DYNAMIC: &str = "dynamic";

/// File suffixes examined when walking a directory
const OBJECT_SUFFIXES: &[&str] = &[".o", ".obj", ".a", ".so"];

static ELF_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+)\s(.{7})\s(\S+)\s(\S+)\s(.+)$").expect("valid regex"));
static ARCHIVE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*[Aa]rchive\s+(.+):$").expect("valid regex"));
static OBJECT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+):\s+file format").expect("valid regex"));

pub fn create_subgrammar(builder: &mut SubgrammarBuilder) {
    builder
        .about("Search for symbols within object files and archives in the given paths.")
        .arg(
            ArgumentSpec::flag(DYNAMIC, ArgClass::Module)
                .short('d')
                .long("dynamic")
                .help("Consider dynamic symbols"),
        );
}

pub fn search(request: &SearchRequest<'_>, printer: &mut dyn Printer) -> Result<()> {
    let regex = super::compile(request.regex, request.ignore_case)?;
    let objdump = which::which("objdump")
        .context("objdump not found in PATH; install binutils to search symbols")?;
    let dynamic = request.args.flag(DYNAMIC);
    let mut examined = 0usize;

    for root in request.paths {
        let root = Path::new(root);
        let files = if root.is_dir() {
            object_files_under(root, request.ignored_dirs)
        } else if root.is_file() {
            vec![root.to_path_buf()]
        } else {
            bail!("no such file or directory: {}", root.display());
        };

        for file in files {
            examined += 1;
            for object in read_symbols(&objdump, &file, dynamic)? {
                for symbol in object.symbols.iter().filter(|s| regex.is_match(&s.name)) {
                    printer.print(
                        &SearchResult::new(symbol.to_string())
                            .at(Location::new(&object.path))
                            .highlighted(&regex),
                    )?;
                }
            }
        }
    }

    if request.verbose {
        eprintln!(
            "symbols: examined {examined} files, {} matching symbols",
            printer.count()
        );
    }
    Ok(())
}

fn object_files_under(root: &Path, ignored_dirs: &[String]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| super::is_ignored_dir(name, ignored_dirs))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            OBJECT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Run objdump on `path` and parse its symbol table
fn read_symbols(objdump: &Path, path: &Path, dynamic: bool) -> Result<Vec<ObjectFile>> {
    let output = Command::new(objdump)
        .arg(if dynamic { "-T" } else { "-t" })
        .arg("-C")
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run {}", objdump.display()))?;
    if !output.status.success() {
        // Not an object file (or no dynamic table); nothing to search
        tracing::debug!(
            "objdump rejected {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Ok(Vec::new());
    }
    parse_objdump(path, &String::from_utf8_lossy(&output.stdout))
}

/// Symbol binding and type flags from objdump's flag columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolFlags {
    pub local: bool,
    pub global: bool,
    pub unique: bool,
    pub weak: bool,
    pub constructor: bool,
    pub warning: bool,
    pub indirect: bool,
    pub reloc: bool,
    pub debug: bool,
    pub dynamic: bool,
    pub function: bool,
    pub file: bool,
    pub object: bool,
}

impl SymbolFlags {
    /// Parse the seven ELF flag characters
    fn parse(flags: &str) -> Self {
        let columns: Vec<char> = flags.chars().collect();
        let at = |index: usize| columns.get(index).copied().unwrap_or(' ');
        Self {
            local: matches!(at(0), 'l' | '!'),
            global: matches!(at(0), 'g' | 'u' | '!'),
            unique: at(0) == 'u',
            weak: at(1) == 'w',
            constructor: at(2) == 'C',
            warning: at(3) == 'W',
            indirect: at(4) == 'i',
            reloc: at(4) == 'I',
            debug: at(5) == 'd',
            dynamic: at(5) == 'D',
            function: at(6) == 'F',
            file: at(6) == 'f',
            object: at(6) == 'O',
        }
    }

    fn labels(&self) -> Vec<&'static str> {
        [
            (self.unique, "unique"),
            (self.weak, "weak"),
            (self.constructor, "constructor"),
            (self.warning, "warning"),
            (self.indirect, "indirect reference"),
            (self.reloc, "reloc function"),
            (self.debug, "debug"),
            (self.dynamic, "dynamic"),
            (self.function, "function"),
            (self.file, "file"),
            (self.object, "object"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect()
    }
}

/// One symbol table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub section: String,
    pub value: u64,
    pub size: u64,
    pub flags: SymbolFlags,
}

impl Symbol {
    pub fn is_defined(&self) -> bool {
        self.section != "*UND*"
    }

    /// Parse an ELF symbol line; `None` for anything else
    pub fn parse(line: &str) -> Option<Self> {
        let caps = ELF_SYMBOL.captures(line)?;
        Some(Self {
            value: u64::from_str_radix(&caps[1], 16).ok()?,
            flags: SymbolFlags::parse(&caps[2]),
            section: caps[3].to_string(),
            size: u64::from_str_radix(&caps[4], 16).ok()?,
            name: caps[5].trim().to_string(),
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = if self.flags.global {
            "global"
        } else if self.flags.local {
            "local"
        } else {
            "-"
        };
        if self.is_defined() {
            write!(
                f,
                "{} [{scope}] section={} value=0x{:X} size=0x{:X}",
                self.name, self.section, self.value, self.size
            )?;
        } else {
            write!(f, "{} [{scope}] UNDEFINED", self.name)?;
        }
        let labels = self.flags.labels();
        if !labels.is_empty() {
            write!(f, " ({})", labels.join(", "))?;
        }
        Ok(())
    }
}

/// An object file, on disk or inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFile {
    /// `archive::member` for archive members
    pub path: String,
    pub symbols: Vec<Symbol>,
}

/// Parse objdump's symbol table output for `path`
pub fn parse_objdump(path: &Path, output: &str) -> Result<Vec<ObjectFile>> {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let Some(first) = lines.first() else {
        return Ok(Vec::new());
    };

    if let Some(caps) = ARCHIVE_HEADER.captures(first) {
        return parse_archive(&caps[1], &lines[1..]);
    }
    if let Some(caps) = OBJECT_HEADER.captures(first) {
        return Ok(vec![parse_object(&caps[1], &lines)]);
    }
    bail!("unexpected objdump output for {}", path.display())
}

fn parse_object(path: &str, lines: &[&str]) -> ObjectFile {
    let mut object = ObjectFile {
        path: path.to_string(),
        symbols: Vec::new(),
    };
    for line in lines {
        match Symbol::parse(line) {
            Some(symbol) => object.symbols.push(symbol),
            // The table is contiguous; stop at the first gap after it
            None if !object.symbols.is_empty() => break,
            None => {}
        }
    }
    object
}

fn parse_archive(archive: &str, lines: &[&str]) -> Result<Vec<ObjectFile>> {
    let mut objects: Vec<ObjectFile> = Vec::new();
    let mut collecting = false;

    for line in lines {
        if let Some(caps) = OBJECT_HEADER.captures(line) {
            objects.push(ObjectFile {
                path: format!("{archive}::{}", &caps[1]),
                symbols: Vec::new(),
            });
            collecting = true;
            continue;
        }
        let Some(current) = objects.last_mut() else {
            bail!("archive {archive} lists symbols before naming an object");
        };
        match Symbol::parse(line) {
            Some(symbol) if collecting => current.symbols.push(symbol),
            Some(_) => {}
            None => {
                if !current.symbols.is_empty() {
                    collecting = false;
                }
            }
        }
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ParsedArgs;
    use crate::modules::testing::{request, Collect};

    const OBJECT_OUTPUT: &str = "
math_mul.o:     file format elf64-x86-64

SYMBOL TABLE:
0000000000000000 l    df *ABS*\t0000000000000000 math_mul.c
0000000000000000 l    d  .text\t0000000000000000 .text
0000000000000000 g     F .text\t000000000000002e mul
000000000000002e g     F .text\t0000000000000018 div
0000000000000046 g     F .text\t000000000000001a mod
0000000000000000         *UND*\t0000000000000000 add
";

    const ARCHIVE_OUTPUT: &str = "
In archive libmath.a:

math_add.o:     file format elf64-x86-64

SYMBOL TABLE:
0000000000000000 l    df *ABS*\t0000000000000000 math_add.c
0000000000000000 g     F .text\t0000000000000014 add

math_mul.o:     file format elf64-x86-64

SYMBOL TABLE:
0000000000000000 g     F .text\t000000000000002e mul
0000000000000000         *UND*\t0000000000000000 add
";

    #[test]
    fn parses_object_symbol_table() {
        let objects = parse_objdump(Path::new("math_mul.o"), OBJECT_OUTPUT).expect("parse");
        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.path, "math_mul.o");
        let names: Vec<&str> = object.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["math_mul.c", ".text", "mul", "div", "mod", "add"]);

        let mul = &object.symbols[2];
        assert_eq!(mul.section, ".text");
        assert_eq!(mul.size, 0x2e);
        assert!(mul.flags.global && mul.flags.function && !mul.flags.local);
        assert_eq!(
            mul.to_string(),
            "mul [global] section=.text value=0x0 size=0x2E (function)"
        );

        let add = &object.symbols[5];
        assert!(!add.is_defined());
        assert_eq!(add.to_string(), "add [-] UNDEFINED");

        assert!(object.symbols[0].flags.file && object.symbols[0].flags.debug);
    }

    #[test]
    fn parses_archive_members() {
        let objects = parse_objdump(Path::new("libmath.a"), ARCHIVE_OUTPUT).expect("parse");
        let paths: Vec<&str> = objects.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["libmath.a::math_add.o", "libmath.a::math_mul.o"]);
        assert_eq!(objects[0].symbols.len(), 2);
        assert_eq!(objects[1].symbols.len(), 2);
        assert_eq!(objects[1].symbols[0].name, "mul");
    }

    #[test]
    fn empty_output_has_no_objects() {
        assert!(parse_objdump(Path::new("x.o"), "\n\n").expect("parse").is_empty());
    }

    #[test]
    fn unexpected_output_is_an_error() {
        let err = parse_objdump(Path::new("x.o"), "garbage\n").expect_err("unexpected");
        assert!(err.to_string().contains("unexpected objdump output for x.o"));
    }

    #[test]
    fn weak_and_unique_flags() {
        let flags = SymbolFlags::parse("uw    O");
        assert!(flags.unique && flags.global && flags.weak && flags.object);
        assert_eq!(flags.labels(), vec!["unique", "weak", "object"]);
        assert_eq!(SymbolFlags::parse("   "), SymbolFlags::default());
    }

    #[test]
    fn directory_walk_only_picks_object_files() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("build/.git")).expect("mkdir");
        for name in ["build/a.o", "build/libx.a", "build/readme.txt", "build/.git/z.o"] {
            std::fs::write(dir.path().join(name), "").expect("write");
        }
        let ignored = vec![".git".to_string()];
        let names: Vec<String> = object_files_under(dir.path(), &ignored)
            .into_iter()
            .map(|path| path.file_name().expect("name").to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.o", "libx.a"]);
    }

    #[test]
    fn missing_path_is_an_error() {
        if which::which("objdump").is_err() {
            return;
        }
        let paths = vec!["/definitely/not/here".to_string()];
        let args = ParsedArgs::default();
        let ignored = Vec::new();
        let mut collect = Collect::default();
        let err = search(&request("main", &paths, &args, &ignored), &mut collect)
            .expect_err("missing path");
        assert!(err.to_string().contains("no such file or directory"));
    }
}
