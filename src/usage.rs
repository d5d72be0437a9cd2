// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage and help synthesis
//!
//! Builds one usage line covering the base command and every module, then
//! reflows it to the terminal width without ever breaking inside a bracketed
//! group.

use crate::errors::{DriverError, Result};
use crate::grammar::GrammarSet;
use crate::schema::ArgumentSpec;

const USAGE_PREFIX: &str = "usage: ";
const DEFAULT_COLUMNS: usize = 80;
const MARGIN: usize = 2;
/// Help entries wider than this put their description on the next line
const MAX_INVOCATION_WIDTH: usize = 24;

/// Usable width for usage and help text, from `COLUMNS`
pub fn terminal_width() -> usize {
    width_from(std::env::var("COLUMNS").ok().as_deref())
}

/// Width for a raw `COLUMNS` value; malformed or absent values use 80
pub fn width_from(columns: Option<&str>) -> usize {
    let columns = columns
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|columns| *columns > 0)
        .unwrap_or(DEFAULT_COLUMNS);
    columns.saturating_sub(MARGIN)
}

/// The pieces a combined usage line is made of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageParts {
    pub prog: String,
    pub global: Vec<String>,
    /// One usage line per module, e.g. `symbols [-d]`
    pub modules: Vec<String>,
    pub common: Vec<String>,
    pub positional: Vec<String>,
}

impl UsageParts {
    /// Collect the parts from an assembled grammar
    pub fn from_grammar(grammars: &GrammarSet) -> Self {
        let schema = grammars.schema();
        Self {
            prog: grammars.base().name().to_string(),
            global: grammars
                .base()
                .visible()
                .map(ArgumentSpec::usage_fragment)
                .collect(),
            modules: grammars.modules().iter().map(|g| g.usage_line()).collect(),
            common: schema.common().map(ArgumentSpec::usage_fragment).collect(),
            positional: schema.positional().map(ArgumentSpec::usage_fragment).collect(),
        }
    }

    /// Everything after the prefix, on one line
    fn line(&self) -> String {
        let mut pieces = vec![self.prog.clone()];
        pieces.extend(self.global.iter().cloned());
        if !self.modules.is_empty() {
            pieces.push(format!("[{}]", self.modules.join(" | ")));
        }
        pieces.extend(self.common.iter().cloned());
        pieces.extend(self.positional.iter().cloned());
        pieces.join(" ")
    }
}

/// Combined usage text, reflowed to `width`
pub fn synthesize(parts: &UsageParts, width: usize) -> Result<String> {
    let body = parts.line();
    let tokens = split_top_level(&body)?;
    Ok(pack(&tokens, USAGE_PREFIX, USAGE_PREFIX.len(), width).join("\n"))
}

/// Split `text` on whitespace that is outside every `[]`, `()` and `{}` pair
///
/// Unmatched or mismatched brackets are an error rather than being guessed at.
pub fn split_top_level(text: &str) -> Result<Vec<String>> {
    let unbalanced = |offset| DriverError::UnbalancedUsage {
        usage: text.to_string(),
        offset,
    };

    let mut tokens = Vec::new();
    let mut open: Vec<(char, usize)> = Vec::new();
    let mut start: Option<usize> = None;

    for (offset, ch) in text.char_indices() {
        match ch {
            '[' | '(' | '{' => open.push((ch, offset)),
            ']' | ')' | '}' => {
                let expected = match ch {
                    ']' => '[',
                    ')' => '(',
                    _ => '{',
                };
                match open.pop() {
                    Some((opener, _)) if opener == expected => {}
                    _ => return Err(unbalanced(offset)),
                }
            }
            _ => {}
        }

        if ch.is_whitespace() && open.is_empty() {
            if let Some(begin) = start.take() {
                tokens.push(text[begin..offset].to_string());
            }
        } else if start.is_none() {
            start = Some(offset);
        }
    }

    if let Some(&(_, offset)) = open.last() {
        return Err(unbalanced(offset));
    }
    if let Some(begin) = start {
        tokens.push(text[begin..].to_string());
    }
    Ok(tokens)
}

/// Greedily pack `tokens` into lines no wider than `width`
///
/// The first line starts with `prefix`, later ones with `indent` spaces. A
/// token that fits `width` only without the indent starts its line at column
/// 0; a token wider than `width` is kept whole, indented, on a line of its own.
pub fn pack<S: AsRef<str>>(tokens: &[S], prefix: &str, indent: usize, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = prefix.to_string();
    let mut line_width = prefix.chars().count();
    let mut filled = false;

    for token in tokens {
        let token = token.as_ref();
        let token_width = token.chars().count();
        if filled && line_width + 1 + token_width > width {
            let pad = if indent + token_width > width && token_width <= width {
                0
            } else {
                indent
            };
            lines.push(std::mem::replace(&mut line, " ".repeat(pad)));
            line_width = pad;
            filled = false;
        }
        if filled {
            line.push(' ');
            line_width += 1;
        }
        line.push_str(token);
        line_width += token_width;
        filled = true;
    }

    if filled || lines.is_empty() {
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// Full help text: combined usage, the shared options, then each module's
/// own options under its name
pub fn full_help(grammars: &GrammarSet, width: usize) -> Result<String> {
    let schema = grammars.schema();
    let mut sections = vec![synthesize(&UsageParts::from_grammar(grammars), width)?];

    sections.push(help_section("global options", grammars.base().visible(), width));
    sections.push(help_section("common options", schema.common(), width));
    sections.push(help_section("positional arguments", schema.positional(), width));

    for module in grammars.modules() {
        let mut section = format!("{}:", module.name());
        if let Some(about) = module.about() {
            section.push('\n');
            let words: Vec<&str> = about.split_whitespace().collect();
            section.push_str(&pack(&words, "  ", 2, width).join("\n"));
        }
        let entries = help_entries(module.visible(), width);
        if !entries.is_empty() {
            section.push('\n');
            section.push_str(&entries);
        }
        sections.push(section);
    }

    Ok(sections.join("\n\n"))
}

fn help_section<'a>(
    title: &str,
    specs: impl Iterator<Item = &'a ArgumentSpec>,
    width: usize,
) -> String {
    format!("{title}:\n{}", help_entries(specs, width))
}

fn help_entries<'a>(specs: impl Iterator<Item = &'a ArgumentSpec>, width: usize) -> String {
    let entries: Vec<(String, String)> = specs
        .map(|spec| (spec.invocation(), spec.help_text()))
        .collect();
    let column = entries
        .iter()
        .map(|(invocation, _)| invocation.chars().count())
        .filter(|len| *len <= MAX_INVOCATION_WIDTH)
        .max()
        .unwrap_or(0)
        + 4;

    let mut lines = Vec::new();
    for (invocation, help) in &entries {
        let words: Vec<&str> = help.split_whitespace().collect();
        let head = format!("  {invocation}");
        if head.chars().count() + 2 > column {
            lines.push(head);
            lines.extend(pack(&words, &" ".repeat(column), column, width));
        } else {
            let prefix = format!("{head:<column$}");
            lines.extend(pack(&words, &prefix, column, width));
        }
    }
    lines.join("\n")
}
