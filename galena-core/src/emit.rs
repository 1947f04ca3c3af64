//! SMT-LIB v2 response printer.
//!
//! Every response is flushed immediately. The sink starts out as the
//! caller's output stream and can be redirected to a file by
//! `(set-option :regular-output-channel ...)`.

use crate::backend::SatResult;
use std::fs::File;
use std::io::{self, BufWriter, Write};

enum Sink<'a> {
    Main(&'a mut dyn Write),
    File(BufWriter<File>),
}

/// The response printer.
pub struct Printer<'a> {
    sink: Sink<'a>,
    /// Whether `success` is printed after commands (`:print-success`).
    pub print_success: bool,
}

impl<'a> Printer<'a> {
    /// A printer over the given output stream with `:print-success true`.
    pub fn new(out: &'a mut dyn Write) -> Self {
        Printer {
            sink: Sink::Main(out),
            print_success: true,
        }
    }

    /// The active output sink.
    pub fn writer(&mut self) -> &mut dyn Write {
        match &mut self.sink {
            Sink::Main(w) => *w,
            Sink::File(w) => w,
        }
    }

    /// Redirect all further responses to `path`.
    pub fn redirect(&mut self, path: &str) -> io::Result<()> {
        self.flush()?;
        self.sink = Sink::File(BufWriter::new(File::create(path)?));
        Ok(())
    }

    /// Flush the active sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer().flush()
    }

    /// `success` after a command, when enabled.
    pub fn success(&mut self) -> io::Result<()> {
        if self.print_success {
            writeln!(self.writer(), "success")?;
            self.flush()?;
        }
        Ok(())
    }

    /// `sat` / `unsat` / `unknown`.
    pub fn status(&mut self, result: SatResult) -> io::Result<()> {
        writeln!(self.writer(), "{result}")?;
        self.flush()
    }

    /// `unsupported` for commands outside the supported surface.
    pub fn unsupported(&mut self) -> io::Result<()> {
        writeln!(self.writer(), "unsupported")?;
        self.flush()
    }

    /// `(s1 s2 ...)` for `get-unsat-assumptions`.
    pub fn unsat_assumptions(&mut self, items: &[String]) -> io::Result<()> {
        let out = self.writer();
        write!(out, "(")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(out, " ")?;
            }
            write!(out, "{item}")?;
        }
        writeln!(out, ")")?;
        self.flush()
    }

    /// `((e1 v1) ... (en vn))` for `get-value`, each `ei` being the
    /// captured source text of the operand.
    pub fn values(&mut self, pairs: &[(String, String)]) -> io::Result<()> {
        let out = self.writer();
        write!(out, "(")?;
        for (src, val) in pairs {
            if pairs.len() > 1 {
                write!(out, "\n ")?;
            }
            write!(out, "({src} {val})")?;
        }
        if pairs.len() > 1 {
            writeln!(out)?;
        }
        writeln!(out, ")")?;
        self.flush()
    }

    /// The string constant of an `echo` command, verbatim.
    pub fn echo(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer(), "{text}")?;
        self.flush()
    }
}

/// Normalize captured source text: comments dropped, whitespace runs
/// collapsed to single spaces, no space after `(` or before `)`. Quoted
/// symbols and string literals are kept byte-for-byte.
pub(crate) fn normalize_source(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut pending_space = false;
    while let Some(c) = chars.next() {
        match c {
            ';' => {
                for n in chars.by_ref() {
                    if n == '\n' {
                        break;
                    }
                }
                pending_space = true;
            }
            c if c.is_ascii_whitespace() => pending_space = true,
            ')' => {
                out.push(')');
                pending_space = false;
            }
            c => {
                if pending_space && !out.is_empty() && !out.ends_with('(') {
                    out.push(' ');
                }
                pending_space = false;
                match c {
                    '"' => {
                        out.push('"');
                        while let Some(n) = chars.next() {
                            out.push(n);
                            if n == '\\' {
                                if let Some(e) = chars.next() {
                                    out.push(e);
                                }
                            } else if n == '"' {
                                break;
                            }
                        }
                    }
                    '|' => {
                        out.push('|');
                        for n in chars.by_ref() {
                            out.push(n);
                            if n == '|' {
                                break;
                            }
                        }
                    }
                    c => out.push(c),
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(normalize_source("x"), "x");
        assert_eq!(normalize_source("( bvnot   p )"), "(bvnot p)");
        assert_eq!(
            normalize_source("(bvadd x ; comment\n  (bvnot y))"),
            "(bvadd x (bvnot y))"
        );
        assert_eq!(normalize_source("|a  b|"), "|a  b|");
        assert_eq!(normalize_source("(f \"a ; b\")"), "(f \"a ; b\")");
    }

    #[test]
    fn value_pairs() {
        let mut buf = Vec::new();
        {
            let mut printer = Printer::new(&mut buf);
            printer
                .values(&[("x".to_string(), "#b0101".to_string())])
                .unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "((x #b0101))\n");

        let mut buf = Vec::new();
        {
            let mut printer = Printer::new(&mut buf);
            printer
                .values(&[
                    ("x".to_string(), "#b0".to_string()),
                    ("(bvnot x)".to_string(), "#b1".to_string()),
                ])
                .unwrap();
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "(\n (x #b0)\n ((bvnot x) #b1)\n)\n"
        );
    }
}
