//! Sort parsing.
//!
//! Sorts come from the backend's sort constructors; every handle obtained
//! here is pushed onto the parser's sort cache and released at teardown.
//! `Float16/32/64/128` are fixed floating-point formats, `Bool` is the
//! 1-bit bit-vector sort of this solver family, and `define-sort` /
//! `declare-sort` aliases resolve through the symbol table.

use crate::backend::SortId;
use crate::error::Result;
use crate::script::Parser;
use crate::token::{ArrayOp, BvOp, CoreOp, FpOp, Logic, Reserved, Tag, Token};
use tracing::debug;

impl<'a> Parser<'a> {
    /// Parse a sort whose first token is `tok`.
    pub(crate) fn parse_sort(&mut self, tok: Token, allow_array: bool) -> Result<SortId> {
        match tok.tag {
            Tag::Core(CoreOp::Bool) => {
                let sort = self.backend.bool_sort();
                self.sorts.push(sort);
                Ok(sort)
            }
            Tag::Fp(FpOp::Float16) => self.fixed_fp_sort(5, 11),
            Tag::Fp(FpOp::Float32) => self.fixed_fp_sort(8, 24),
            Tag::Fp(FpOp::Float64) => self.fixed_fp_sort(11, 53),
            Tag::Fp(FpOp::Float128) => self.fixed_fp_sort(15, 113),
            Tag::Fp(FpOp::RoundingModeSort) => {
                let sort = self.backend.rm_sort();
                self.sorts.push(sort);
                Ok(sort)
            }
            Tag::Lpar => {
                if allow_array {
                    let tok = self.read_token()?;
                    match tok.tag {
                        Tag::Array(ArrayOp::Array) => self.parse_array_sort(),
                        Tag::Eof => Err(self.perr(
                            tok.coo,
                            "expected '_' or 'Array' but reached end-of-file".into(),
                        )),
                        Tag::Reserved(Reserved::Underscore) => self.parse_bv_or_fp_sort(2),
                        _ => Err(self.perr(
                            tok.coo,
                            format!("expected '_' or 'Array' at '{}'", self.lexer.text()),
                        )),
                    }
                } else {
                    self.parse_bv_or_fp_sort(1)
                }
            }
            Tag::Symbol => {
                let sym = tok.sym.expect("symbol token");
                let entry = self.symbols.get(sym);
                if entry.is_sort {
                    Ok(entry.sort_alias.expect("sort alias set"))
                } else {
                    Err(self.perr(tok.coo, format!("invalid sort '{}'", self.lexer.text())))
                }
            }
            Tag::Eof => Err(self.perr(
                tok.coo,
                "reached end-of-file but expected '(' or sort keyword".into(),
            )),
            _ => Err(self.perr(
                tok.coo,
                format!("expected '(' or sort keyword at '{}'", self.lexer.text()),
            )),
        }
    }

    fn fixed_fp_sort(&mut self, eb: u32, sb: u32) -> Result<SortId> {
        let sort = self.backend.fp_sort(eb, sb);
        self.sorts.push(sort);
        Ok(sort)
    }

    /// `(Array <index> <element>)`; the `Array` token has been consumed.
    fn parse_array_sort(&mut self) -> Result<SortId> {
        if self.commands.set_logic > 0 && self.logic == Logic::QfBv {
            return Err(self.perr(self.lexer.coo(), "'Array' invalid for logic 'QF_BV'".into()));
        }
        let tok = self.read_token()?;
        let index = self.parse_sort(tok, false)?;
        let tok = self.read_token()?;
        let element = self.parse_sort(tok, false)?;
        self.read_rpar(" after element sort of Array")?;
        let sort = self.backend.array_sort(index, element);
        self.sorts.push(sort);
        Ok(sort)
    }

    /// `(_ BitVec n)` or `(_ FloatingPoint eb sb)`. `skiptokens` counts how
    /// many of the leading `(` `_` have already been consumed.
    pub(crate) fn parse_bv_or_fp_sort(&mut self, skiptokens: u32) -> Result<SortId> {
        debug_assert!(skiptokens <= 2);
        if skiptokens < 1 {
            self.read_lpar("")?;
        }
        if skiptokens < 2 {
            let tok = self.read_token()?;
            if tok.tag == Tag::Eof {
                return Err(self.perr(tok.coo, "expected '_' but reached end-of-file".into()));
            }
            if tok.tag != Tag::Reserved(Reserved::Underscore) {
                return Err(
                    self.perr(tok.coo, format!("expected '_' at '{}'", self.lexer.text()))
                );
            }
        }
        let tok = self.read_token()?;
        let is_fp = match tok.tag {
            Tag::Bv(BvOp::BitVec) => false,
            Tag::Fp(FpOp::FloatingPoint) => true,
            Tag::Eof => {
                return Err(self.perr(
                    tok.coo,
                    "expected 'BitVec' or 'FloatingPoint' but reached end-of-file".into(),
                ));
            }
            _ => {
                return Err(self.perr(
                    tok.coo,
                    format!(
                        "expected 'BitVec' or 'FloatingPoint' at '{}'",
                        self.lexer.text()
                    ),
                ));
            }
        };
        let width = self.parse_bit_width()?;
        let (sort, msg) = if is_fp {
            let width_sb = self.parse_bit_width()?;
            debug!(eb = width, sb = width_sb, "parsed floating-point sort");
            (
                self.backend.fp_sort(width, width_sb),
                " to close floating-point sort",
            )
        } else {
            debug!(width, "parsed bit-vector sort");
            (self.backend.bv_sort(width), " to close bit-vector sort")
        };
        self.sorts.push(sort);
        self.read_rpar(msg)?;
        Ok(sort)
    }

    /// A non-zero bit width given as a decimal numeral.
    pub(crate) fn parse_bit_width(&mut self) -> Result<u32> {
        let tok = self.read_token()?;
        match tok.tag {
            Tag::Eof => Err(self.perr(
                tok.coo,
                "expected bit-width but reached end-of-file".into(),
            )),
            Tag::Real => Err(self.perr(
                tok.coo,
                format!(
                    "invalid bit-width '{}', expected integer",
                    self.lexer.text()
                ),
            )),
            Tag::Decimal => {
                if self.lexer.text() == "0" {
                    return Err(self.perr(tok.coo, "invalid zero bit-width".into()));
                }
                self.str_to_u32(tok.coo, true)
            }
            _ => Err(self.perr(
                tok.coo,
                format!("expected bit-width at '{}'", self.lexer.text()),
            )),
        }
    }
}
