//! Command driver.
//!
//! [`Parser`] owns the lexer, symbol table, work stack and printer for one
//! parse session and borrows the backend and the output stream. It reads
//! top-level commands, drives the term parser for assertion and value
//! contexts, keeps `push`/`pop` in lock-step with the symbol table and the
//! backend's assertion stack, and infers the logic from observed features
//! when no `set-logic` was given.

use crate::backend::{Backend, NodeId, SatResult, SortId};
use crate::emit::{Printer, normalize_source};
use crate::error::{Coo, GalenaError, Result};
use crate::lexer::Lexer;
use crate::symtab::{SymbolId, SymbolTable};
use crate::term::{Work, WorkItem};
use crate::token::{Cmd, Kw, Logic, Tag, Token};
use std::io::Write;
use tracing::{debug, warn};

/// Options of a parse session.
#[derive(Debug, Clone)]
pub struct ParserOpts {
    /// Treat `|x|` and `x` as the same name (on by default, matching the
    /// solver this front end was written for; turn off for strict SMT-LIB
    /// distinctness).
    pub quote_equiv: bool,
}

impl Default for ParserOpts {
    fn default() -> Self {
        ParserOpts { quote_equiv: true }
    }
}

/// Outcome of parsing a script.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The logic set by `set-logic` or inferred from observed features.
    pub logic: Logic,
    /// Status from the last `check-sat` (or a `set-info :status`).
    pub status: SatResult,
    /// Number of `check-sat` invocations forwarded to the backend.
    pub nsatcalls: u32,
}

#[derive(Debug, Default)]
pub(crate) struct Commands {
    pub all: u32,
    pub set_logic: u32,
    pub asserts: u32,
    pub check_sat: u32,
    pub exits: u32,
    pub model: bool,
}

/// The SMT-LIB front end.
pub struct Parser<'a> {
    pub(crate) backend: &'a mut dyn Backend,
    pub(crate) lexer: Lexer<'a>,
    pub(crate) symbols: SymbolTable,
    pub(crate) printer: Printer<'a>,
    pub(crate) file: String,
    pub(crate) work: Vec<WorkItem>,
    pub(crate) open: u32,
    pub(crate) isvarbinding: bool,
    pub(crate) sorted_var: bool,
    pub(crate) expecting_body: Option<&'static str>,
    pub(crate) bound_vars: u32,
    pub(crate) need_arrays: bool,
    pub(crate) need_functions: bool,
    pub(crate) need_quantifiers: bool,
    pub(crate) sorts: Vec<SortId>,
    pub(crate) assumptions: Vec<NodeId>,
    pub(crate) commands: Commands,
    pub(crate) logic: Logic,
    pub(crate) status: SatResult,
    pub(crate) nsatcalls: u32,
    done: bool,
}

impl<'a> Parser<'a> {
    /// A parser with the default options over `input`, reporting errors
    /// against `name`.
    pub fn new(
        backend: &'a mut dyn Backend,
        input: &'a str,
        name: &str,
        out: &'a mut dyn Write,
    ) -> Self {
        Self::with_options(backend, None, input, name, out, ParserOpts::default())
    }

    /// A parser with explicit options and an optional prefix buffer lexed
    /// before `input`.
    pub fn with_options(
        backend: &'a mut dyn Backend,
        prefix: Option<&'a str>,
        input: &'a str,
        name: &str,
        out: &'a mut dyn Write,
        opts: ParserOpts,
    ) -> Self {
        Parser {
            backend,
            lexer: Lexer::new(prefix, input, name),
            symbols: SymbolTable::with_options(opts.quote_equiv),
            printer: Printer::new(out),
            file: name.to_string(),
            work: Vec::new(),
            open: 0,
            isvarbinding: false,
            sorted_var: false,
            expecting_body: None,
            bound_vars: 0,
            need_arrays: false,
            need_functions: false,
            need_quantifiers: false,
            sorts: Vec::new(),
            assumptions: Vec::new(),
            commands: Commands::default(),
            logic: Logic::QfBv,
            status: SatResult::Unknown,
            nsatcalls: 0,
            done: false,
        }
    }

    /// Run the script to completion (or the first error).
    pub fn parse(mut self) -> Result<ParseResult> {
        loop {
            if !self.read_command()? {
                break;
            }
            if self.done || self.backend.terminate() {
                break;
            }
        }
        if !self.backend.terminate() {
            self.finish_warnings();
        }
        self.infer_logic();
        Ok(ParseResult {
            logic: self.logic,
            status: self.status,
            nsatcalls: self.nsatcalls,
        })
    }

    // ---- plumbing -------------------------------------------------------

    pub(crate) fn perr(&self, coo: Coo, msg: String) -> GalenaError {
        GalenaError::Parse {
            file: self.file.clone(),
            coo,
            msg,
        }
    }

    pub(crate) fn read_token(&mut self) -> Result<Token> {
        self.lexer.read_token(&mut self.symbols)
    }

    pub(crate) fn read_rpar(&mut self, msg: &str) -> Result<()> {
        let tok = self.read_token()?;
        if tok.tag == Tag::Eof {
            return Err(self.perr(tok.coo, format!("expected ')'{msg} at end-of-file")));
        }
        if tok.tag != Tag::Rpar {
            return Err(self.perr(
                tok.coo,
                format!("expected ')'{msg} at '{}'", self.lexer.text()),
            ));
        }
        Ok(())
    }

    pub(crate) fn read_lpar(&mut self, msg: &str) -> Result<()> {
        let tok = self.read_token()?;
        if tok.tag == Tag::Eof {
            return Err(self.perr(tok.coo, format!("expected '('{msg} at end-of-file")));
        }
        if tok.tag != Tag::Lpar {
            return Err(self.perr(
                tok.coo,
                format!("expected '('{msg} at '{}'", self.lexer.text()),
            ));
        }
        Ok(())
    }

    pub(crate) fn read_symbol(&mut self, errmsg: &str) -> Result<SymbolId> {
        let tok = self.read_token()?;
        if tok.tag == Tag::Eof {
            return Err(self.perr(
                tok.coo,
                format!("expected symbol{errmsg} but reached end-of-file"),
            ));
        }
        if tok.tag != Tag::Symbol {
            return Err(self.perr(
                tok.coo,
                format!("expected symbol{errmsg} at '{}'", self.lexer.text()),
            ));
        }
        Ok(tok.sym.expect("symbol token"))
    }

    pub(crate) fn str_to_u32(&self, coo: Coo, allow_zero: bool) -> Result<u32> {
        let text = self.lexer.text();
        let value: u32 = text
            .parse()
            .map_err(|_| self.perr(coo, format!("invalid 32-bit integer '{text}'")))?;
        if !allow_zero && value == 0 {
            return Err(self.perr(
                coo,
                format!("expected positive non-zero 32-bit integer at '{text}'"),
            ));
        }
        Ok(value)
    }

    pub(crate) fn parse_u32(&mut self, allow_zero: bool) -> Result<u32> {
        let tok = self.read_token()?;
        if tok.tag == Tag::Eof {
            return Err(self.perr(
                tok.coo,
                "expected decimal constant but reached end-of-file".into(),
            ));
        }
        if tok.tag != Tag::Decimal {
            return Err(self.perr(
                tok.coo,
                format!("expected decimal constant at '{}'", self.lexer.text()),
            ));
        }
        self.str_to_u32(tok.coo, allow_zero)
    }

    /// Skip balanced s-expressions until `initial` parentheses are closed.
    fn skip_sexprs(&mut self, initial: u32) -> Result<()> {
        let mut open = initial;
        while open > 0 {
            let tok = self.read_token()?;
            match tok.tag {
                Tag::Eof => {
                    return Err(self.perr(tok.coo, "')' missing at end-of-file".into()));
                }
                Tag::Lpar => open += 1,
                Tag::Rpar => open -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    // ---- commands -------------------------------------------------------

    /// Read and execute one command. Returns `false` at end of input or at
    /// the `)` closing a `(model ...)` block.
    fn read_command(&mut self) -> Result<bool> {
        let tok = self.read_token()?;
        if self.commands.model && tok.tag == Tag::Rpar {
            self.commands.model = false;
            return Ok(false);
        }
        if tok.tag == Tag::Eof {
            if self.commands.model {
                return Err(self.perr(tok.coo, "expected ')' after 'model' at end-of-file".into()));
            }
            return Ok(false);
        }
        if tok.tag != Tag::Lpar {
            return Err(self.perr(
                tok.coo,
                format!("expected '(' at '{}'", self.lexer.text()),
            ));
        }
        let tok = self.read_token()?;
        if tok.tag == Tag::Eof {
            return Err(self.perr(
                self.lexer.last_coo(),
                "unexpected end-of-file after '('".into(),
            ));
        }
        let Tag::Command(cmd) = tok.tag else {
            return Err(self.perr(
                tok.coo,
                format!("expected command at '{}'", self.lexer.text()),
            ));
        };
        if self.commands.model && cmd != Cmd::DefineFun {
            return Err(self.perr(tok.coo, "expected 'define-fun' after 'model'".into()));
        }
        match cmd {
            Cmd::SetLogic => self.cmd_set_logic()?,
            Cmd::CheckSat => {
                self.read_rpar(" after 'check-sat'")?;
                self.do_check_sat()?;
            }
            Cmd::CheckSatAssuming => self.cmd_check_sat_assuming()?,
            Cmd::DeclareFun => {
                self.cmd_declare_fun(false)?;
                self.printer.success()?;
            }
            Cmd::DeclareConst => {
                self.cmd_declare_fun(true)?;
                self.printer.success()?;
            }
            Cmd::DefineFun => {
                self.cmd_define_fun()?;
                self.printer.success()?;
            }
            Cmd::DeclareSort => {
                self.cmd_declare_sort()?;
                self.printer.success()?;
            }
            Cmd::DefineSort => {
                self.cmd_define_sort()?;
                self.printer.success()?;
            }
            Cmd::Assert => self.cmd_assert()?,
            Cmd::Echo => self.cmd_echo()?,
            Cmd::Exit => {
                self.read_rpar(" after 'exit'")?;
                self.commands.exits += 1;
                self.done = true;
                self.printer.success()?;
            }
            Cmd::GetModel => self.cmd_get_model()?,
            Cmd::GetUnsatAssumptions => self.cmd_get_unsat_assumptions()?,
            Cmd::GetValue => self.cmd_get_value()?,
            Cmd::Model => {
                if self.commands.model {
                    return Err(self.perr(tok.coo, "nesting models is invalid".into()));
                }
                self.commands.model = true;
                loop {
                    if !self.read_command()? || self.backend.terminate() {
                        break;
                    }
                }
            }
            Cmd::SetInfo => {
                self.cmd_set_info()?;
                self.printer.success()?;
            }
            Cmd::SetOption => {
                self.cmd_set_option()?;
                self.printer.success()?;
            }
            Cmd::Push => {
                let level = self.parse_u32(true)?;
                self.read_rpar(" after 'push'")?;
                for _ in 0..level {
                    self.symbols.open_scope();
                }
                self.backend.push(level);
                self.printer.success()?;
            }
            Cmd::Pop => {
                let level = self.parse_u32(true)?;
                self.read_rpar(" after 'pop'")?;
                if level > self.symbols.level() {
                    return Err(self.perr(
                        tok.coo,
                        format!(
                            "popping more scopes ({level}) than created via push ({})",
                            self.symbols.level()
                        ),
                    ));
                }
                for _ in 0..level {
                    self.symbols.close_scope(&mut *self.backend);
                }
                self.backend.pop(level);
                self.printer.success()?;
            }
            Cmd::GetInfo | Cmd::GetOption => {
                let arg = self.read_token()?;
                if !matches!(arg.tag, Tag::Keyword(_) | Tag::Attribute) {
                    return Err(self.perr(
                        arg.coo,
                        format!("expected keyword at '{}'", self.lexer.text()),
                    ));
                }
                self.read_rpar(" after keyword")?;
                self.printer.unsupported()?;
            }
            Cmd::GetAssertions | Cmd::GetAssignment | Cmd::GetProof | Cmd::GetUnsatCore => {
                return Err(self.perr(
                    tok.coo,
                    format!("unsupported command '{}'", self.lexer.text()),
                ));
            }
        }
        self.commands.all += 1;
        Ok(true)
    }

    fn cmd_set_logic(&mut self) -> Result<()> {
        let tok = self.read_token()?;
        if tok.tag == Tag::Eof {
            return Err(self.perr(
                self.lexer.last_coo(),
                "unexpected end-of-file after 'set-logic'".into(),
            ));
        }
        let Tag::Logic(logic) = tok.tag else {
            return Err(self.perr(
                tok.coo,
                format!("expected logic at '{}'", self.lexer.text()),
            ));
        };
        self.logic = match logic {
            Logic::QfBv => Logic::QfBv,
            Logic::QfAufbv | Logic::QfUfbv | Logic::QfAbv => Logic::QfAufbv,
            Logic::Abv => Logic::QfAbv,
            Logic::Bv => Logic::Bv,
            Logic::Ufbv => Logic::QfUfbv,
            Logic::QfFp | Logic::QfBvfp => Logic::QfFp,
            Logic::All => Logic::All,
            _ => {
                return Err(self.perr(
                    tok.coo,
                    format!("unsupported logic '{}'", self.lexer.text()),
                ));
            }
        };
        debug!(logic = %self.logic, "set logic");
        self.read_rpar(" after logic")?;
        if self.commands.set_logic > 0 {
            warn!("additional 'set-logic' command");
        }
        self.commands.set_logic += 1;
        self.printer.success()?;
        Ok(())
    }

    fn cmd_assert(&mut self) -> Result<()> {
        let (exp, coo) = self.parse_term()?;
        if self.backend.is_array(exp) {
            self.backend.release(exp);
            return Err(self.perr(coo, "assert argument is an array and not a formula".into()));
        }
        if let Err(err) = self.read_rpar(" after asserted expression") {
            self.backend.release(exp);
            return Err(err);
        }
        if !self.is_boolean_exp(exp) {
            let width = self.backend.bv_width(exp);
            self.backend.release(exp);
            return Err(self.perr(coo, format!("assert argument is a bit-vector of length {width}")));
        }
        self.backend.assert_formula(exp);
        self.backend.release(exp);
        self.commands.asserts += 1;
        self.printer.success()?;
        Ok(())
    }

    fn do_check_sat(&mut self) -> Result<()> {
        for node in std::mem::take(&mut self.assumptions) {
            self.backend.release(node);
        }
        if self.commands.check_sat > 0 && self.backend.get_option("incremental").unwrap_or(0) == 0 {
            warn!("additional 'check-sat' command");
        }
        self.commands.check_sat += 1;
        let result = self.backend.check_sat();
        self.nsatcalls += 1;
        self.status = result;
        self.printer.status(result)?;
        Ok(())
    }

    fn cmd_check_sat_assuming(&mut self) -> Result<()> {
        self.read_lpar(" after 'check-sat-assuming'")?;
        if self.backend.get_option("incremental").unwrap_or(0) == 0 {
            return Err(self.perr(self.lexer.coo(), "incremental solving is not enabled".into()));
        }
        let (exps, _spans) = self.read_exp_list()?;
        let mut bad: Option<GalenaError> = None;
        for (exp, coo) in &exps {
            if self.backend.is_array(*exp) {
                bad = Some(
                    self.perr(*coo, "assumption argument is an array and not a formula".into()),
                );
                break;
            }
            if !self.is_boolean_exp(*exp) {
                let width = self.backend.bv_width(*exp);
                bad = Some(self.perr(
                    *coo,
                    format!("assumption argument is a bit-vector of length {width}"),
                ));
                break;
            }
            self.backend.assume(*exp);
        }
        if let Some(err) = bad {
            self.release_exps(exps);
            return Err(err);
        }
        if let Err(err) = self.read_rpar(" after 'check-sat-assuming'") {
            self.release_exps(exps);
            return Err(err);
        }
        self.do_check_sat()?;
        // assumption handles stay alive until the next check-sat so that
        // get-unsat-assumptions can refer to them
        self.assumptions = exps.into_iter().map(|(exp, _)| exp).collect();
        Ok(())
    }

    fn release_exps(&mut self, exps: Vec<(NodeId, Coo)>) {
        for (exp, _) in exps {
            self.backend.release(exp);
        }
    }

    /// Parse a parenthesized list of terms, capturing the source byte span
    /// of each for `get-value` echoing. Consumes the closing `)` of the
    /// list.
    fn read_exp_list(&mut self) -> Result<(Vec<(NodeId, Coo)>, Vec<(usize, usize)>)> {
        let mut exps: Vec<(NodeId, Coo)> = Vec::new();
        let mut spans = Vec::new();
        let mut tok = self.read_token()?;
        loop {
            let start = self.lexer.token_start();
            match self.parse_term_with(Some(tok)) {
                Ok((exp, coo)) => {
                    spans.push((start, self.lexer.offset()));
                    exps.push((exp, coo));
                }
                Err(err) => {
                    self.release_exps(exps);
                    return Err(err);
                }
            }
            tok = self.read_token()?;
            if tok.tag == Tag::Rpar || tok.tag == Tag::Eof {
                break;
            }
        }
        Ok((exps, spans))
    }

    fn cmd_get_value(&mut self) -> Result<()> {
        self.read_lpar(" after 'get-value'")?;
        if self.backend.get_option("produce-models").unwrap_or(0) == 0 {
            return Err(self.perr(self.lexer.coo(), "model generation is not enabled".into()));
        }
        let (exps, spans) = self.read_exp_list()?;
        if let Err(err) = self.read_rpar(" after 'get-value'") {
            self.release_exps(exps);
            return Err(err);
        }
        if self.status == SatResult::Sat {
            let pairs: Vec<(String, String)> = exps
                .iter()
                .zip(&spans)
                .map(|((exp, _), &(start, end))| {
                    (
                        normalize_source(&self.lexer.slice(start, end)),
                        self.backend.value_smt2(*exp),
                    )
                })
                .collect();
            self.printer.values(&pairs)?;
        }
        self.release_exps(exps);
        Ok(())
    }

    fn cmd_get_model(&mut self) -> Result<()> {
        self.read_rpar(" after 'get-model'")?;
        if self.backend.get_option("produce-models").unwrap_or(0) == 0 {
            return Err(self.perr(self.lexer.coo(), "model generation is not enabled".into()));
        }
        if self.status == SatResult::Sat {
            self.backend.print_model(self.printer.writer())?;
            self.printer.flush()?;
        }
        Ok(())
    }

    fn cmd_get_unsat_assumptions(&mut self) -> Result<()> {
        self.read_rpar(" after 'get-unsat-assumptions'")?;
        if self.status == SatResult::Unsat {
            let failed = self.backend.failed_assumptions();
            let items: Vec<String> = failed
                .iter()
                .map(|&node| {
                    self.backend
                        .symbol_of(node)
                        .unwrap_or_else(|| self.backend.node_smt2(node))
                })
                .collect();
            self.printer.unsat_assumptions(&items)?;
        }
        Ok(())
    }

    fn cmd_declare_fun(&mut self, isconst: bool) -> Result<()> {
        let fun = self.read_symbol(if isconst {
            " after 'declare-const'"
        } else {
            " after 'declare-fun'"
        })?;
        {
            let entry = self.symbols.get(fun);
            if entry.coo.is_set() {
                return Err(self.perr(
                    self.lexer.coo(),
                    format!(
                        "symbol '{}' already defined at line {} column {}",
                        entry.name, entry.coo.line, entry.coo.col
                    ),
                ));
            }
        }
        let fun_coo = self.lexer.coo();
        self.symbols.get_mut(fun).coo = fun_coo;
        let name = self.symbols.name(fun).to_string();

        let mut args: Vec<SortId> = Vec::new();
        if !isconst {
            self.read_lpar(" after function name")?;
            loop {
                let tok = self.read_token()?;
                if tok.tag == Tag::Rpar {
                    break;
                }
                args.push(self.parse_sort(tok, false)?);
            }
        }
        let tok = self.read_token()?;
        let sort = self.parse_sort(tok, true)?;
        if args.is_empty() {
            if self.backend.is_array_sort(sort) {
                let node = self.backend.array_var(sort, &name);
                self.symbols.get_mut(fun).node = Some(node);
                debug!(name = name.as_str(), "declared bit-vector array");
                self.need_arrays = true;
            } else {
                let node = self.backend.var(sort, Some(&name));
                self.symbols.get_mut(fun).node = Some(node);
                debug!(name = name.as_str(), "declared bit-vector");
            }
        } else {
            for &arg_sort in &args {
                if !self.backend.is_bv_sort(arg_sort) {
                    return Err(self.perr(
                        fun_coo,
                        "only bit-vector sorts supported for arity > 0".into(),
                    ));
                }
            }
            if !self.backend.is_bv_sort(sort) {
                return Err(self.perr(
                    fun_coo,
                    "only bit-vector sorts supported as return sort for arity > 0".into(),
                ));
            }
            let fun_sort = self.backend.fun_sort(&args, sort);
            let node = self.backend.uf(fun_sort, &name);
            self.backend.release_sort(fun_sort);
            self.symbols.get_mut(fun).node = Some(node);
            debug!(name = name.as_str(), "declared uninterpreted function");
            self.need_functions = true;
        }
        self.read_rpar(" to close declaration")
    }

    fn cmd_define_fun(&mut self) -> Result<()> {
        let fun = self.read_symbol(" after 'define-fun'")?;
        let in_model = self.commands.model;
        {
            let entry = self.symbols.get(fun);
            if entry.coo.is_set() && !in_model {
                return Err(self.perr(
                    self.lexer.coo(),
                    format!(
                        "symbol '{}' already defined at line {} column {}",
                        entry.name, entry.coo.line, entry.coo.col
                    ),
                ));
            }
            if !entry.coo.is_set() && in_model {
                return Err(
                    self.perr(self.lexer.coo(), format!("symbol '{}' undefined", entry.name))
                );
            }
        }
        let fun_coo = self.lexer.coo();
        self.symbols.get_mut(fun).coo = fun_coo;
        let fun_name = self.symbols.name(fun).to_string();

        self.read_lpar(" after function name")?;
        let mut nargs = 0usize;
        loop {
            let tok = self.read_token()?;
            if tok.tag == Tag::Rpar {
                break;
            }
            if tok.tag != Tag::Lpar {
                return Err(self.perr(tok.coo, "expected '('".into()));
            }
            let arg = self.read_symbol(" after '('")?;
            let arg = self.shadow_if_defined(arg);
            let arg_coo = self.lexer.coo();
            self.symbols.get_mut(arg).coo = arg_coo;
            let arg_name = self.symbols.name(arg).to_string();
            let stok = self.read_token()?;
            let arg_sort = self.parse_sort(stok, false)?;
            nargs += 1;
            let param_name = format!("_{fun_name}_{arg_name}");
            let param = self.backend.param(arg_sort, &param_name);
            self.symbols.get_mut(arg).node = Some(param);
            self.push_work(Work::Sym(arg), arg_coo);
            self.read_rpar(" after argument sort")?;
        }

        let tok = self.read_token()?;
        let sort = self.parse_sort(tok, true)?;
        if self.backend.is_array_sort(sort) {
            if nargs > 0 {
                return Err(
                    self.perr(fun_coo, "sort Array is not supported for arity > 0".into())
                );
            }
            if !in_model {
                debug!(name = fun_name.as_str(), "defined bit-vector array");
                self.need_arrays = true;
            } else {
                let fun_node = self.symbols.get(fun).node.expect("defined symbol");
                if !self.backend.is_array(fun_node) {
                    return Err(self.perr(fun_coo, "sort Array expected".into()));
                }
                if self.backend.sort_of(fun_node) != sort {
                    return Err(self.perr(fun_coo, "array sort mismatch".into()));
                }
            }
        } else if in_model {
            let fun_node = self.symbols.get(fun).node.expect("defined symbol");
            let matches = if self.backend.is_fun(fun_node) {
                self.backend.codomain_sort(fun_node) == sort
            } else {
                self.backend.sort_of(fun_node) == sort
            };
            if !matches {
                return Err(self.perr(fun_coo, "invalid sort, expected".into()));
            }
        }

        let (exp, _) = self.parse_term()?;
        if !in_model && self.backend.sort_of(exp) != sort {
            self.backend.release(exp);
            return Err(self.perr(fun_coo, "invalid term sort".into()));
        }

        if nargs > 0 {
            let base = self.work.len() - nargs;
            let mut params: Vec<NodeId> = Vec::with_capacity(nargs);
            for i in 0..nargs {
                let Work::Sym(arg) = self.work[base + i].work else {
                    unreachable!("parameter items on the work stack");
                };
                let node = self.symbols.get(arg).node.expect("parameter node");
                params.push(self.backend.copy(node));
                self.symbols.remove(arg, &mut *self.backend);
            }
            self.work.truncate(base);
            let tmp = self.backend.fun(&params, exp);
            if in_model {
                let fun_node = self.symbols.get(fun).node.expect("defined symbol");
                if !self.backend.equal_sorts(fun_node, tmp) {
                    self.backend.release(tmp);
                    for param in params {
                        self.backend.release(param);
                    }
                    self.backend.release(exp);
                    return Err(self.perr(fun_coo, "model must have equal sort".into()));
                }
                let eq = self.backend.eq(fun_node, tmp);
                self.backend.assert_formula(eq);
                self.backend.release(eq);
                self.backend.release(tmp);
            } else {
                self.backend.set_symbol(tmp, &fun_name);
                self.symbols.get_mut(fun).node = Some(tmp);
                self.need_functions = true;
            }
            for param in params {
                self.backend.release(param);
            }
            self.backend.release(exp);
        } else if in_model {
            let fun_node = self.symbols.get(fun).node.expect("defined symbol");
            if !self.backend.equal_sorts(fun_node, exp) {
                self.backend.release(exp);
                return Err(self.perr(fun_coo, "model must have equal sort".into()));
            }
            let eq = self.backend.eq(fun_node, exp);
            self.backend.assert_formula(eq);
            self.backend.release(eq);
            self.backend.release(exp);
        } else {
            self.symbols.get_mut(fun).node = Some(exp);
        }
        self.read_rpar(" to close definition")
    }

    fn cmd_define_sort(&mut self) -> Result<()> {
        let alias = self.read_symbol(" after 'define-sort'")?;
        {
            let entry = self.symbols.get(alias);
            if entry.coo.is_set() {
                return Err(self.perr(
                    self.lexer.coo(),
                    format!(
                        "sort '{}' already defined at line {} column {}",
                        entry.name, entry.coo.line, entry.coo.col
                    ),
                ));
            }
        }
        self.symbols.get_mut(alias).coo = self.lexer.coo();
        self.read_lpar(" after sort definition")?;
        // only nullary aliases; parametric definitions are rejected
        self.read_rpar(" parameterized sort definitions not supported yet")?;
        let tok = self.read_token()?;
        let sort = self.parse_sort(tok, true)?;
        let entry = self.symbols.get_mut(alias);
        entry.is_sort = true;
        entry.sort_alias = Some(sort);
        self.read_rpar(" to close sort definition")
    }

    fn cmd_declare_sort(&mut self) -> Result<()> {
        let width = self.backend.get_option("declsort-bv-width").unwrap_or(0);
        if width <= 0 {
            return Err(self.perr(
                self.lexer.coo(),
                "'declare-sort' not supported if it is not interpreted as a bit-vector".into(),
            ));
        }
        let alias = self.read_symbol(" after 'declare-sort'")?;
        {
            let entry = self.symbols.get(alias);
            if entry.coo.is_set() {
                return Err(self.perr(
                    self.lexer.coo(),
                    format!(
                        "sort '{}' already defined at line {} column {}",
                        entry.name, entry.coo.line, entry.coo.col
                    ),
                ));
            }
        }
        self.symbols.get_mut(alias).coo = self.lexer.coo();
        let arity = self.parse_u32(true)?;
        if arity != 0 {
            return Err(self.perr(
                self.lexer.coo(),
                "sort arity other than 0 not supported".into(),
            ));
        }
        let sort = self.backend.bv_sort(width as u32);
        self.sorts.push(sort);
        let entry = self.symbols.get_mut(alias);
        entry.is_sort = true;
        entry.sort_alias = Some(sort);
        self.read_rpar(" to close sort declaration")
    }

    fn cmd_echo(&mut self) -> Result<()> {
        let tok = self.read_token()?;
        match tok.tag {
            Tag::Eof => Err(self.perr(tok.coo, "unexpected end-of-file after 'echo'".into())),
            Tag::Rpar => Err(self.perr(tok.coo, "string after 'echo' missing".into())),
            Tag::Str => {
                let text = self.lexer.text().to_string();
                self.printer.echo(&text)?;
                self.skip_sexprs(1)
            }
            _ => Err(self.perr(tok.coo, "expected string after 'echo'".into())),
        }
    }

    fn cmd_set_info(&mut self) -> Result<()> {
        let tok = self.read_token()?;
        match tok.tag {
            Tag::Eof => {
                return Err(self.perr(tok.coo, "unexpected end-of-file after 'set-info'".into()));
            }
            Tag::Rpar => {
                return Err(self.perr(tok.coo, "keyword after 'set-info' missing".into()));
            }
            Tag::Keyword(Kw::Status) => {
                let tok = self.read_token()?;
                match tok.tag {
                    Tag::Eof => {
                        return Err(
                            self.perr(tok.coo, "unexpected end-of-file after ':status'".into())
                        );
                    }
                    Tag::Rpar => {
                        return Err(self.perr(tok.coo, "value after ':status' missing".into()));
                    }
                    Tag::Symbol => {}
                    _ => {
                        return Err(self.perr(
                            tok.coo,
                            format!("invalid value '{}' after ':status'", self.lexer.text()),
                        ));
                    }
                }
                self.status = match self.lexer.text() {
                    "sat" => SatResult::Sat,
                    "unsat" => SatResult::Unsat,
                    "unknown" => SatResult::Unknown,
                    other => {
                        return Err(
                            self.perr(tok.coo, format!("invalid value '{other}' after ':status'"))
                        );
                    }
                };
                debug!(status = %self.status, "parsed status");
                return self.read_rpar(" after 'set-info'");
            }
            _ => {}
        }
        self.skip_sexprs(1)
    }

    fn read_bool_arg(&mut self) -> Result<bool> {
        let tok = self.read_token()?;
        match tok.tag {
            Tag::Core(crate::token::CoreOp::True) => Ok(true),
            Tag::Core(crate::token::CoreOp::False) => Ok(false),
            _ => Err(self.perr(
                tok.coo,
                format!("expected Boolean argument at '{}'", self.lexer.text()),
            )),
        }
    }

    fn cmd_set_option(&mut self) -> Result<()> {
        let tok = self.read_token()?;
        match tok.tag {
            Tag::Eof => {
                return Err(self.perr(tok.coo, "unexpected end-of-file after 'set-option'".into()));
            }
            Tag::Rpar => {
                return Err(self.perr(tok.coo, "keyword after 'set-option' missing".into()));
            }
            // accepted and always on
            Tag::Keyword(Kw::ProduceUnsatAssumptions) => {}
            Tag::Keyword(Kw::RegularOutputChannel) => {
                let tok = self.read_token()?;
                if tok.tag != Tag::Str {
                    return Err(self.perr(
                        tok.coo,
                        format!("expected string argument at '{}'", self.lexer.text()),
                    ));
                }
                let text = self.lexer.text();
                let path = text[1..text.len() - 1].to_string();
                if self.printer.redirect(&path).is_err() {
                    return Err(self.perr(tok.coo, format!("can not create '{path}'")));
                }
            }
            Tag::Keyword(Kw::PrintSuccess) => {
                let value = self.read_bool_arg()?;
                self.printer.print_success = value;
            }
            Tag::Keyword(Kw::GlobalDeclarations) => {
                let value = self.read_bool_arg()?;
                self.symbols.set_global_declarations(value);
                // the backend mirrors the flag so popped scopes keep their
                // declarations as well
                self.backend.set_option("global-declarations", i64::from(value));
            }
            Tag::Keyword(_) | Tag::Attribute => {
                let name = self.lexer.text().trim_start_matches(':').to_string();
                let tok = self.read_token()?;
                let value: i64 = match tok.tag {
                    Tag::Core(crate::token::CoreOp::True) => 1,
                    Tag::Core(crate::token::CoreOp::False) => 0,
                    Tag::Decimal => self.lexer.text().parse().map_err(|_| {
                        self.perr(
                            tok.coo,
                            format!("invalid 32-bit integer '{}'", self.lexer.text()),
                        )
                    })?,
                    _ => {
                        return Err(self.perr(
                            tok.coo,
                            format!("expected Boolean or numeric argument at '{}'", self.lexer.text()),
                        ));
                    }
                };
                if !self.backend.set_option(&name, value) {
                    return Err(self.perr(tok.coo, format!("unsupported option: '{name}'")));
                }
            }
            _ => {
                return Err(self.perr(
                    tok.coo,
                    format!("expected keyword at '{}'", self.lexer.text()),
                ));
            }
        }
        self.skip_sexprs(1)
    }

    // ---- wrap-up --------------------------------------------------------

    fn finish_warnings(&self) {
        if self.commands.all == 0 {
            warn!(file = self.file.as_str(), "no commands");
            return;
        }
        if self.commands.set_logic == 0 {
            warn!(file = self.file.as_str(), "'set-logic' command missing");
        }
        if self.commands.asserts == 0 {
            warn!(file = self.file.as_str(), "no 'assert' command");
        }
        if self.commands.check_sat == 0 {
            warn!(file = self.file.as_str(), "'check-sat' command missing");
        }
        if self.commands.exits == 0 {
            warn!(file = self.file.as_str(), "no 'exit' command at end");
        }
    }

    /// Tighten or upgrade the logic from observed features; the result only
    /// ever moves along QF_BV < QF_UFBV < QF_AUFBV and BV < ALL.
    fn infer_logic(&mut self) {
        if self.commands.set_logic == 0 && self.need_quantifiers {
            self.logic = Logic::Bv;
        } else if self.need_functions && self.need_arrays && self.logic == Logic::QfBv {
            warn!("found functions thus using 'QF_AUFBV' logic");
            self.logic = Logic::QfAufbv;
        } else if self.need_functions && self.logic == Logic::QfBv {
            warn!("found functions thus using 'QF_UFBV' logic");
            self.logic = Logic::QfUfbv;
        } else if self.logic == Logic::All {
            self.logic = if self.need_quantifiers {
                Logic::Bv
            } else if self.need_functions || self.need_arrays {
                Logic::QfAufbv
            } else {
                Logic::QfBv
            };
        } else if self.commands.set_logic > 0
            && !self.need_functions
            && !self.need_arrays
            && !self.need_quantifiers
            && self.logic == Logic::QfAufbv
        {
            warn!("no functions found thus restricting logic to 'QF_BV'");
            self.logic = Logic::QfBv;
        }
    }
}

impl Drop for Parser<'_> {
    fn drop(&mut self) {
        self.release_work_from(0);
        for node in std::mem::take(&mut self.assumptions) {
            self.backend.release(node);
        }
        self.symbols.release_all(&mut *self.backend);
        for sort in std::mem::take(&mut self.sorts) {
            self.backend.release_sort(sort);
        }
    }
}
