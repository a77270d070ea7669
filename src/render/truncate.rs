// src/render/truncate.rs

//! Width handling for lines that carry ANSI styling.
//!
//! Escape sequences take no columns on screen, so width is counted on the
//! visible characters only. One `char` counts as one column.

use std::borrow::Cow;

use crossterm::style::Stylize;

const ESC: char = '\u{1b}';
const BEL: char = '\u{7}';
const RESET: &str = "\u{1b}[0m";
const ELLIPSIS: &str = "…";

/// Piece of a styled line: either an escape sequence or one visible char.
enum Token<'a> {
    Escape(&'a str),
    Visible(char),
}

/// Split `line` into escape sequences and visible characters.
///
/// Recognises CSI (`ESC [ ... final`), OSC (`ESC ] ... BEL` or `ESC ] ... ESC \`)
/// and two-character escapes.
fn tokens(line: &str) -> impl Iterator<Item = Token<'_>> {
    let mut rest = line;
    std::iter::from_fn(move || {
        let mut chars = rest.char_indices();
        let (_, first) = chars.next()?;

        if first != ESC {
            rest = &rest[first.len_utf8()..];
            return Some(Token::Visible(first));
        }

        let end = match chars.next() {
            Some((_, '[')) => chars
                .find(|&(_, c)| ('@'..='~').contains(&c))
                .map(|(i, c)| i + c.len_utf8()),
            Some((_, ']')) => {
                let mut end = None;
                let mut prev = ']';
                for (i, c) in chars {
                    if c == BEL || (prev == ESC && c == '\\') {
                        end = Some(i + c.len_utf8());
                        break;
                    }
                    prev = c;
                }
                end
            }
            Some((i, c)) => Some(i + c.len_utf8()),
            None => None,
        }
        .unwrap_or(rest.len());

        let (escape, tail) = rest.split_at(end);
        rest = tail;
        Some(Token::Escape(escape))
    })
}

/// Number of columns `line` occupies once escapes are interpreted.
pub fn visible_width(line: &str) -> usize {
    tokens(line)
        .filter(|t| matches!(t, Token::Visible(_)))
        .count()
}

/// `line` with every escape sequence removed.
pub fn strip_styles(line: &str) -> String {
    tokens(line)
        .filter_map(|t| match t {
            Token::Visible(c) => Some(c),
            Token::Escape(_) => None,
        })
        .collect()
}

/// Shorten `line` to at most `columns` visible characters.
///
/// Lines that already fit are returned unchanged. Otherwise escape sequences
/// are copied verbatim, visible characters stop one column short of the
/// limit, a dimmed ellipsis fills that column, and a reset closes the line so
/// no style leaks into whatever is printed next.
pub fn truncate_line(line: &str, columns: usize) -> Cow<'_, str> {
    if visible_width(line) <= columns {
        return Cow::Borrowed(line);
    }

    let keep = columns.saturating_sub(1);
    let mut out = String::with_capacity(line.len() + 16);
    let mut width = 0;

    for token in tokens(line) {
        match token {
            Token::Escape(seq) => out.push_str(seq),
            Token::Visible(c) => {
                if width == keep {
                    break;
                }
                out.push(c);
                width += 1;
            }
        }
    }

    if columns > 0 {
        out.push_str(&ELLIPSIS.dim().to_string());
    }
    out.push_str(RESET);
    Cow::Owned(out)
}
