// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search results and printers
//!
//! Modules hand every match to a [`Printer`]; the driver decides which one.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use regex::Regex;

/// Marker placed where text was cut
const ELLIPSIS: &str = "...";

/// Narrowest a column may be condensed to before results are split over lines
const MIN_CONDENSED_WIDTH: usize = 16;

/// Where a match was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    /// 1-based line number, when the match is inside a text file
    pub line: Option<usize>,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line: None,
        }
    }

    pub fn at_line(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
        }
    }

    pub fn width(&self) -> usize {
        self.to_string().chars().count()
    }

    /// Cut the path from the left so the whole location fits `width`
    pub fn truncated(&self, width: usize) -> Self {
        let suffix = self.line.map_or(0, |line| line.to_string().len() + 1);
        let path_width = width.saturating_sub(suffix).max(ELLIPSIS.len() + 1);
        Self {
            path: PathBuf::from(ltrunc(&self.path.display().to_string(), path_width)),
            line: self.line,
        }
    }

    fn styled(&self, decorate: bool) -> String {
        let plain = self.to_string();
        if !decorate {
            return plain;
        }
        let path = self.path.display().to_string();
        let basename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dirname = path.strip_suffix(basename.as_str()).unwrap_or("");
        let mut styled = format!("{}{}", dirname.yellow(), basename.bold().yellow());
        if let Some(line) = self.line {
            styled.push_str(&format!(":{line}").yellow().to_string());
        }
        styled
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}", self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// One match reported by a module
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub matched: String,
    pub location: Option<Location>,
    /// Highlights the matching parts of `matched`
    pub highlight: Option<Regex>,
}

impl SearchResult {
    pub fn new(matched: impl Into<String>) -> Self {
        Self {
            matched: matched.into(),
            location: None,
            highlight: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn highlighted(mut self, regex: &Regex) -> Self {
        self.highlight = Some(regex.clone());
        self
    }

    fn styled_match(&self, decorate: bool) -> String {
        match (&self.highlight, decorate) {
            (Some(regex), true) => {
                let mut styled = String::with_capacity(self.matched.len());
                let mut last = 0;
                for hit in regex.find_iter(&self.matched) {
                    if hit.start() == hit.end() {
                        continue;
                    }
                    styled.push_str(&self.matched[last..hit.start()]);
                    styled.push_str(&hit.as_str().bold().red().to_string());
                    last = hit.end();
                }
                styled.push_str(&self.matched[last..]);
                styled
            }
            _ => self.matched.clone(),
        }
    }

    /// Copy with the location and match cut to the given widths; 0 leaves a
    /// column untouched
    pub fn condensed(&self, location_width: usize, match_width: usize) -> Self {
        Self {
            matched: rtrunc(&self.matched, match_width),
            location: self.location.as_ref().map(|location| {
                if location_width == 0 {
                    location.clone()
                } else {
                    location.truncated(location_width)
                }
            }),
            highlight: self.highlight.clone(),
        }
    }

    /// Render on one line, or location and match on separate lines
    pub fn format(&self, decorate: bool, single_line: bool) -> String {
        let matched = self.styled_match(decorate);
        match &self.location {
            Some(location) if single_line => format!("{} {matched}", location.styled(decorate)),
            Some(location) => format!("{}\n{matched}\n", location.styled(decorate)),
            None => matched,
        }
    }
}

/// Cut `text` from the left so it is at most `width` characters
pub fn ltrunc(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if width == 0 || len <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let tail: String = text.chars().skip(len - keep).collect();
    format!("{ELLIPSIS}{tail}")
}

/// Cut `text` from the right so it is at most `width` characters
pub fn rtrunc(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if width == 0 || len <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let head: String = text.chars().take(keep).collect();
    format!("{head}{ELLIPSIS}")
}

/// Receives results as a module produces them
pub trait Printer {
    fn print(&mut self, result: &SearchResult) -> io::Result<()>;

    /// Called once after the module returns
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Number of results printed so far
    fn count(&self) -> usize;
}

/// Streams results to a writer, one line each when they fit the console
///
/// A result too wide for the console first has its location condensed, then
/// its match, and is split over two lines only when neither fits.
pub struct TerminalPrinter<W: Write> {
    out: W,
    width: usize,
    decorate: bool,
    count: usize,
}

impl TerminalPrinter<io::Stdout> {
    pub fn stdout(width: usize) -> Self {
        Self::new(io::stdout(), width)
    }
}

impl<W: Write> TerminalPrinter<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width,
            decorate: colored::control::SHOULD_COLORIZE.should_colorize(),
            count: 0,
        }
    }

    pub fn decorate(mut self, decorate: bool) -> Self {
        self.decorate = decorate;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TerminalPrinter<W> {
    fn layout(&self, result: &SearchResult) -> String {
        let Some(location) = &result.location else {
            return result.format(self.decorate, true);
        };
        let location_width = location.width();
        let match_width = result.matched.chars().count();
        let width = self.width;

        if location_width + 1 + match_width <= width {
            result.format(self.decorate, true)
        } else if MIN_CONDENSED_WIDTH + 1 + match_width <= width {
            result
                .condensed(width - match_width - 1, 0)
                .format(self.decorate, true)
        } else if location_width + 1 + MIN_CONDENSED_WIDTH <= width {
            result
                .condensed(0, width - location_width - 1)
                .format(self.decorate, true)
        } else {
            result.format(self.decorate, false)
        }
    }
}

impl<W: Write> Printer for TerminalPrinter<W> {
    fn print(&mut self, result: &SearchResult) -> io::Result<()> {
        writeln!(self.out, "{}", self.layout(result))?;
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn count(&self) -> usize {
        self.count
    }
}
