//! Tokenizing a testcase file into an ordered sequence of atoms.

use crate::error::{self, Error};
use std::fs;
use std::io::Write;
use std::path::Path;

/// The smallest reducible unit of a testcase: an opaque fragment of text.
pub type Atom = String;

/// The literal marker that begins a DD section.
pub const DD_BEGIN: &str = "DDBEGIN";

/// The literal marker that ends a DD section.
pub const DD_END: &str = "DDEND";

/// How the input file is cut up into atoms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tokenization {
    /// One atom per line, terminator retained.
    Line,

    /// One atom per character.
    Char,

    /// Atoms produced by the symbol-delimiter lexer, applied per line.
    SymbolDelimiter {
        /// Characters after which a new atom may begin.
        cut_before: String,
        /// Characters that terminate an atom.
        cut_after: String,
    },
}

impl Default for Tokenization {
    fn default() -> Self {
        Tokenization::Line
    }
}

/// A testcase: immutable `before`/`after` context plus a reducible sequence
/// of atoms.
///
/// The invariant that strategies must preserve: rewriting the file is always
/// `before ++ concat(parts) ++ after`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Testcase {
    /// Immutable content before the reducible region (or the whole file, if
    /// there is no `DDBEGIN`/`DDEND` section).
    pub before: String,

    /// The reducible atoms. Strategies only ever replace this field.
    pub parts: Vec<Atom>,

    /// Immutable content after the reducible region.
    pub after: String,

    /// The testcase file's extension (including the leading `.`, or empty).
    pub extension: String,
}

impl Testcase {
    /// The full rendered file contents.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.before.len() + self.after.len() + self.parts.iter().map(|p| p.len()).sum::<usize>(),
        );
        out.push_str(&self.before);
        for part in &self.parts {
            out.push_str(part);
        }
        out.push_str(&self.after);
        out
    }

    /// Atomically replace the file at `path` with `before ++ concat(parts)
    /// ++ after`.
    pub fn write(&self, path: &Path) -> error::Result<()> {
        let contents = self.render();

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_path = dir.join(format!(
            ".{}.tmp",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "lithium".into())
        ));

        {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(contents.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Split `s` into lines, each retaining its trailing `\n` (the final line
/// keeps none if the file doesn't end in a newline). Mirrors iterating a
/// Python file object line by line.
fn split_lines_keep_ends(s: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = s.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'\n' {
            lines.push(s[start..=i].to_string());
            start = i + 1;
        }
    }
    if start < s.len() {
        lines.push(s[start..].to_string());
    }
    lines
}

/// Tokenize a single line into atoms according to `tokenization`.
fn tokenize_line(line: &str, tokenization: &Tokenization) -> Vec<Atom> {
    match *tokenization {
        Tokenization::Line => vec![line.to_string()],
        Tokenization::Char => line.chars().map(|c| c.to_string()).collect(),
        Tokenization::SymbolDelimiter {
            ref cut_before,
            ref cut_after,
        } => tokenize_symbols(line, cut_before, cut_after),
    }
}

/// The symbol-delimiter lexer.
///
/// Each token is: an optional single leading character from `cut_before`,
/// followed by a maximal run of characters in neither class, terminated by a
/// single character from `cut_after`, end-of-line, or (without consuming it)
/// a character from `cut_before`.
///
/// This is a hand-written scanner rather than a `regex` crate pattern,
/// because the original lexer relies on a zero-width lookahead
/// (`(?=[cutBefore])`) that the `regex` crate's finite-automaton engine
/// doesn't support. The scanner always advances by at least one character
/// per token and never skips a character, so the concatenation of the
/// returned atoms always equals `line`.
fn tokenize_symbols(line: &str, cut_before: &str, cut_after: &str) -> Vec<Atom> {
    let cb: Vec<char> = cut_before.chars().collect();
    let ca: Vec<char> = cut_after.chars().collect();
    let chars: Vec<char> = line.chars().collect();

    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let start = i;

        if cb.contains(&chars[i]) {
            i += 1;
        }

        while i < chars.len() && !cb.contains(&chars[i]) && !ca.contains(&chars[i]) {
            i += 1;
        }

        if i < chars.len() && ca.contains(&chars[i]) {
            i += 1;
        }

        debug_assert!(i > start, "the scanner must always make progress");
        out.push(chars[start..i].iter().collect());
    }
    out
}

/// Load a testcase file, splitting it into atoms according to `tokenization`,
/// honoring an optional `DDBEGIN`/`DDEND` section.
pub fn read_testcase(path: &Path, tokenization: &Tokenization) -> error::Result<Testcase> {
    let contents =
        fs::read_to_string(path).map_err(|e| Error::Unreadable(path.to_path_buf(), e))?;
    let lines = split_lines_keep_ends(&contents);

    // Scan lines in order, the same way the original tool's first pass over
    // the file does: a DDEND seen before any DDBEGIN is an error, even if a
    // DDBEGIN shows up later on.
    let mut has_dd_begin = None;
    for (i, line) in lines.iter().enumerate() {
        if line.contains(DD_END) {
            return Err(Error::InvalidMarkers(format!(
                "the testcase ({}) has a line containing 'DDEND' without a line containing \
                 'DDBEGIN' before it.",
                path.display()
            )));
        }
        if line.contains(DD_BEGIN) {
            has_dd_begin = Some(i);
            break;
        }
    }

    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let (before, after, reducible_lines) = match has_dd_begin {
        None => (String::new(), String::new(), lines),
        Some(begin_idx) => {
            let before: String = lines[..=begin_idx].concat();

            let after_begin = &lines[(begin_idx + 1)..];
            let end_idx = after_begin.iter().position(|l| l.contains(DD_END));
            match end_idx {
                None => {
                    return Err(Error::InvalidMarkers(format!(
                        "the testcase ({}) has a line containing 'DDBEGIN' but no line \
                         containing 'DDEND'.",
                        path.display()
                    )));
                }
                Some(rel_end_idx) => {
                    let reducible = after_begin[..rel_end_idx].to_vec();
                    let after: String = after_begin[rel_end_idx..].concat();
                    (before, after, reducible)
                }
            }
        }
    };

    let mut parts: Vec<Atom> = reducible_lines
        .iter()
        .flat_map(|line| tokenize_line(line, tokenization))
        .collect();

    let mut after = after;
    if has_dd_begin.is_some() && *tokenization == Tokenization::Char && !parts.is_empty() {
        // Move the trailing newline of the last reducible line out of `parts`
        // so reduction can't merge the `DDEND` line with preceding content.
        parts.pop();
        after = format!("\n{}", after);
    }

    Ok(Testcase {
        before,
        parts,
        after,
        extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn line_tokenization() {
        let f = write_temp("a\nb\nc");
        let tc = read_testcase(f.path(), &Tokenization::Line).unwrap();
        assert_eq!(tc.parts, vec!["a\n", "b\n", "c"]);
        assert_eq!(tc.before, "");
        assert_eq!(tc.after, "");
    }

    #[test]
    fn char_tokenization() {
        let f = write_temp("ab\n");
        let tc = read_testcase(f.path(), &Tokenization::Char).unwrap();
        assert_eq!(tc.parts, vec!["a", "b", "\n"]);
    }

    #[test]
    fn dd_section_line_tokenization() {
        let f = write_temp("head\nDDBEGIN\na\nb\nDDEND\ntail\n");
        let tc = read_testcase(f.path(), &Tokenization::Line).unwrap();
        assert_eq!(tc.before, "head\nDDBEGIN\n");
        assert_eq!(tc.parts, vec!["a\n", "b\n"]);
        assert_eq!(tc.after, "DDEND\ntail\n");
        assert_eq!(tc.render(), "head\nDDBEGIN\na\nb\nDDEND\ntail\n");
    }

    #[test]
    fn dd_section_char_tokenization_moves_trailing_newline() {
        let f = write_temp("DDBEGIN\nab\nDDEND\n");
        let tc = read_testcase(f.path(), &Tokenization::Char).unwrap();
        // "ab\n" tokenized as chars is ['a','b','\n']; the trailing '\n'
        // moves into `after` so DDEND can't be merged with it.
        assert_eq!(tc.parts, vec!["a", "b"]);
        assert_eq!(tc.after, "\nDDEND\n");
        assert_eq!(tc.render(), "DDBEGIN\nab\nDDEND\n");
    }

    #[test]
    fn dd_end_without_dd_begin_is_invalid() {
        let f = write_temp("head\nDDEND\ntail\n");
        let err = read_testcase(f.path(), &Tokenization::Line).unwrap_err();
        assert!(matches!(err, Error::InvalidMarkers(_)));
    }

    #[test]
    fn dd_end_before_a_later_dd_begin_is_still_invalid() {
        // A DDEND that precedes the *first* DDBEGIN is rejected even though
        // the file does contain a DDBEGIN further down.
        let f = write_temp("DDEND\nfoo\nDDBEGIN\nbar\nDDEND\nbaz\n");
        let err = read_testcase(f.path(), &Tokenization::Line).unwrap_err();
        assert!(matches!(err, Error::InvalidMarkers(_)));
    }

    #[test]
    fn dd_begin_without_dd_end_is_invalid() {
        let f = write_temp("head\nDDBEGIN\ntail\n");
        let err = read_testcase(f.path(), &Tokenization::Line).unwrap_err();
        assert!(matches!(err, Error::InvalidMarkers(_)));
    }

    #[test]
    fn unreadable_file() {
        let err = read_testcase(Path::new("/does/not/exist"), &Tokenization::Line).unwrap_err();
        assert!(matches!(err, Error::Unreadable(..)));
    }

    #[test]
    fn symbol_delimiter_round_trips_concatenation() {
        let line = "foo.bar[baz]={qux};\n";
        let atoms = tokenize_symbols(line, "]}:", "?=;{[");
        assert_eq!(atoms.concat(), line);
    }

    #[test]
    fn symbol_delimiter_splits_on_defaults() {
        let atoms = tokenize_symbols("a=b;c", "]}:", "?=;{[");
        assert_eq!(atoms, vec!["a=", "b;", "c"]);
    }

    #[test]
    fn write_then_read_round_trips_concatenation() {
        let tc = Testcase {
            before: "pre-".into(),
            parts: vec!["a".into(), "b".into(), "c".into()],
            after: "-post".into(),
            extension: ".txt".into(),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.txt");
        tc.write(&path).unwrap();

        let round_tripped = read_testcase(&path, &Tokenization::Char).unwrap();
        assert_eq!(round_tripped.render(), tc.render());
    }
}
