//! The term parser.
//!
//! A single loop reads tokens and maintains an open-paren counter plus a
//! work stack of [`WorkItem`]s. `(` and every legal opening sub-form
//! (`(_ ...`, `(as ...`, binders, annotations) *shift* items; `)` *reduces*:
//! the innermost [`Work::Open`] and everything above it collapse into a
//! single [`Work::Expr`] by the per-operator rule, with arity, argument-kind
//! and sort checks applied before the backend constructor runs. A term is
//! complete when the counter returns to zero.

use crate::backend::NodeId;
use crate::error::{Coo, Result};
use crate::script::Parser;
use crate::symtab::SymbolId;
use crate::token::{ArrayOp, BvOp, CoreOp, FpOp, Kw, Reserved, Tag, TagClass, Token};
use num_bigint::BigUint;
use smallvec::SmallVec;

/// Payload of a work-stack item.
#[derive(Debug, Clone)]
pub(crate) enum Work {
    /// An unreduced `(`.
    Open,
    /// An operator frame awaiting its arguments.
    Op { tag: Tag, sym: SymbolId },
    /// `_` seen, indexed operator not yet read.
    Underscore,
    /// A reduced expression.
    Expr(NodeId),
    /// A symbol item (binder names, `:named` arguments).
    Sym(SymbolId),
    /// A `(sym term)` pair being read inside a `let` binding list.
    VarBinding,
    /// The binding list of a `let`.
    VarBindings,
    /// A `(sym sort)` pair being read inside a quantifier binder.
    SortedVar,
    /// The binder list of a quantifier.
    SortedVars,
    /// `(as const T)`, waiting for the constant-array element.
    AsConst(crate::backend::SortId),
    /// A pre-registered attribute inside an annotation.
    Attr(Kw),
    /// A real literal kept as source text until a `to_fp` context claims it.
    Real(String),
}

/// One element of the work stack.
#[derive(Debug, Clone)]
pub(crate) struct WorkItem {
    pub work: Work,
    pub coo: Coo,
    pub idx0: u32,
    pub idx1: u32,
}

type BinFn = fn(&mut dyn crate::backend::Backend, NodeId, NodeId) -> NodeId;
type UnaryFn = fn(&mut dyn crate::backend::Backend, NodeId) -> NodeId;
type ExtFn = fn(&mut dyn crate::backend::Backend, NodeId, u32) -> NodeId;

impl<'a> Parser<'a> {
    pub(crate) fn push_work(&mut self, work: Work, coo: Coo) -> usize {
        self.work.push(WorkItem {
            work,
            coo,
            idx0: 0,
            idx1: 0,
        });
        self.work.len() - 1
    }

    fn last_open(&self) -> Option<usize> {
        self.work.iter().rposition(|i| matches!(i.work, Work::Open))
    }

    /// Pop everything above `from`, releasing expression payloads.
    pub(crate) fn release_work_from(&mut self, from: usize) {
        while self.work.len() > from {
            let item = self.work.pop().expect("work item");
            if let Work::Expr(node) = item.work {
                self.backend.release(node);
            }
        }
    }

    /// Replace `(Open op a1 .. an)` with a single expression item, releasing
    /// the argument nodes.
    fn reduce_to(&mut self, open_idx: usize, exp: NodeId) {
        self.release_work_from(open_idx + 1);
        self.work[open_idx].work = Work::Expr(exp);
    }

    fn op_display(&self, cur: usize) -> String {
        match &self.work[cur].work {
            Work::Op { sym, .. } => self.symbols.name(*sym).to_string(),
            Work::Sym(sym) => self.symbols.name(*sym).to_string(),
            _ => "<non-printable-item>".to_string(),
        }
    }

    fn arg_exp(&self, cur: usize, i: usize) -> NodeId {
        match self.work[cur + i].work {
            Work::Expr(node) => node,
            _ => unreachable!("argument checked to be an expression"),
        }
    }

    fn arg_coo(&self, cur: usize, i: usize) -> Coo {
        self.work[cur + i].coo
    }

    // ---- checks ---------------------------------------------------------

    fn check_nargs(&self, cur: usize, actual: usize, required: usize) -> Result<()> {
        let diff = actual as i64 - required as i64;
        if diff == 0 {
            return Ok(());
        }
        let op = self.op_display(cur);
        let coo = self.work[cur].coo;
        Err(match diff {
            -1 => self.perr(coo, format!("one argument to '{op}' missing")),
            d if d < 0 => self.perr(coo, format!("{} arguments to '{op}' missing", -d)),
            1 => self.perr(coo, format!("'{op}' has one argument too much")),
            d => self.perr(coo, format!("'{op}' has {d} arguments too much")),
        })
    }

    fn check_boolean_args(&self, cur: usize, nargs: usize) -> Result<()> {
        let op = self.op_display(cur);
        for i in 1..=nargs {
            let node = self.arg_exp(cur, i);
            let coo = self.arg_coo(cur, i);
            if self.backend.is_array(node) {
                return Err(self.perr(coo, format!("argument {i} of '{op}' is an array term")));
            }
            if self.backend.is_fun(node) {
                return Err(self.perr(coo, format!("argument {i} of '{op}' is a function term")));
            }
            if self.backend.is_fp(node) {
                return Err(
                    self.perr(coo, format!("argument {i} of '{op}' is a floating-point term"))
                );
            }
            if self.backend.is_rm(node) {
                return Err(
                    self.perr(coo, format!("argument {i} of '{op}' is a rounding-mode term"))
                );
            }
            let width = self.backend.bv_width(node);
            if width != 1 {
                return Err(self.perr(
                    coo,
                    format!("argument {i} of '{op}' is a bit-vector of width {width}"),
                ));
            }
        }
        Ok(())
    }

    fn check_not_array_or_uf_args(&self, cur: usize, nargs: usize) -> Result<()> {
        let op = self.op_display(cur);
        for i in 1..=nargs {
            let node = self.arg_exp(cur, i);
            let coo = self.arg_coo(cur, i);
            if self.backend.is_array(node) {
                return Err(self.perr(coo, format!("argument {i} of '{op}' is an array")));
            }
            if self.backend.is_fun(node) {
                return Err(self.perr(coo, format!("argument {i} of '{op}' is a function")));
            }
            if self.backend.is_fp(node) {
                return Err(
                    self.perr(coo, format!("argument {i} of '{op}' is a floating-point term"))
                );
            }
            if self.backend.is_rm(node) {
                return Err(
                    self.perr(coo, format!("argument {i} of '{op}' is a rounding-mode term"))
                );
            }
        }
        Ok(())
    }

    fn check_arg_sorts_match(&self, cur: usize, offset: usize, nargs: usize) -> Result<()> {
        debug_assert!(nargs >= 1);
        let op = self.op_display(cur);
        let coo = self.work[cur].coo;
        let j = offset + 1;
        let first = self.arg_exp(cur, j);
        if self.backend.is_array(first) {
            let width = self.backend.bv_width(first);
            let domain = self.backend.index_width(first);
            for i in j + 1..=nargs {
                let node = self.arg_exp(cur, i);
                if !self.backend.is_array(node) {
                    return Err(self.perr(
                        coo,
                        format!("first argument of '{op}' is an array but argument {i} is not"),
                    ));
                }
                let width2 = self.backend.bv_width(node);
                if width2 != width {
                    return Err(self.perr(
                        coo,
                        format!(
                            "first argument of '{op}' is an array of bit-vectors of width \
                             {width} but argument {i} is an array of bit-vectors of width {width2}"
                        ),
                    ));
                }
                let domain2 = self.backend.index_width(node);
                if domain2 != domain {
                    return Err(self.perr(
                        coo,
                        format!(
                            "first argument of '{op}' is an array with index bit-vectors of \
                             width {domain} but argument {i} is an array with index bit-vectors \
                             of width {domain2}"
                        ),
                    ));
                }
            }
        } else if self.backend.is_fun(first) {
            for i in j + 1..=nargs {
                let node = self.arg_exp(cur, i);
                if !self.backend.is_fun(node) {
                    return Err(self.perr(
                        coo,
                        format!("first argument of '{op}' is a function but argument {i} not"),
                    ));
                }
                if !self.backend.equal_sorts(first, node) {
                    return Err(self.perr(
                        coo,
                        format!(
                            "sort of argument {i} does not match with sort of first \
                             argument of '{op}'"
                        ),
                    ));
                }
            }
        } else if self.backend.is_fp(first) || self.backend.is_rm(first) {
            for i in j + 1..=nargs {
                let node = self.arg_exp(cur, i);
                if !self.backend.equal_sorts(first, node) {
                    return Err(self.perr(
                        coo,
                        format!(
                            "sort of argument {i} does not match with sort of first \
                             argument of '{op}'"
                        ),
                    ));
                }
            }
        } else {
            let width = self.backend.bv_width(first);
            for i in j..=nargs {
                let node = self.arg_exp(cur, i);
                if self.backend.is_array(node) {
                    return Err(self.perr(
                        coo,
                        format!("argument {i} of '{op}' is an array but first argument not"),
                    ));
                }
                if self.backend.is_fun(node) {
                    return Err(self.perr(
                        coo,
                        format!("argument {i} of '{op}' is a function but first argument not"),
                    ));
                }
                if self.backend.is_fp(node) || self.backend.is_rm(node) {
                    return Err(self.perr(
                        coo,
                        format!(
                            "sort of argument {i} does not match with sort of first \
                             argument of '{op}'"
                        ),
                    ));
                }
                let width2 = self.backend.bv_width(node);
                if width2 != width {
                    return Err(self.perr(
                        coo,
                        format!(
                            "first argument of '{op}' is bit-vector of width {width} \
                             but argument {i} is a bit-vector of width {width2}"
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_ite_args(&self, cur: usize) -> Result<()> {
        let cond = self.arg_exp(cur, 1);
        if self.backend.is_array(cond) {
            return Err(self.perr(self.arg_coo(cur, 1), "first argument of 'ite' is an array".into()));
        }
        if self.backend.is_fun(cond) {
            return Err(
                self.perr(self.arg_coo(cur, 1), "first argument of 'ite' is a function".into())
            );
        }
        let cond_width = self.backend.bv_width(cond);
        if self.backend.is_fp(cond) || self.backend.is_rm(cond) || cond_width != 1 {
            return Err(self.perr(
                self.arg_coo(cur, 1),
                format!("first argument of 'ite' is bit-vector of bit-width {cond_width}"),
            ));
        }
        let coo = self.work[cur].coo;
        let then_branch = self.arg_exp(cur, 2);
        let else_branch = self.arg_exp(cur, 3);
        if self.backend.is_array(then_branch) {
            if !self.backend.is_array(else_branch) {
                return Err(
                    self.perr(coo, "second argument of 'ite' is an array but third not".into())
                );
            }
            let width = self.backend.bv_width(then_branch);
            let width2 = self.backend.bv_width(else_branch);
            if width != width2 {
                return Err(self.perr(
                    coo,
                    format!(
                        "second argument of 'ite' is array of bit-vectors of width {width} \
                         and third argument is array of bit-vectors of width {width2}"
                    ),
                ));
            }
            let domain = self.backend.index_width(then_branch);
            let domain2 = self.backend.index_width(else_branch);
            if domain != domain2 {
                return Err(self.perr(
                    coo,
                    format!(
                        "second argument of 'ite' is array with index bit-vectors of width \
                         {domain} and third argument is array with index bit-vectors of \
                         width {domain2}"
                    ),
                ));
            }
        } else {
            if self.backend.is_array(else_branch) {
                return Err(
                    self.perr(coo, "third argument of 'ite' is an array but second not".into())
                );
            }
            if !self.backend.equal_sorts(then_branch, else_branch) {
                let width = self.backend.bv_width(then_branch);
                let width2 = self.backend.bv_width(else_branch);
                return Err(self.perr(
                    coo,
                    format!(
                        "second argument of 'ite' is bit-vector of width {width} and \
                         third argument is bit-vector of width {width2}"
                    ),
                ));
            }
        }
        Ok(())
    }

    fn check_rm_first(&self, cur: usize) -> Result<()> {
        let node = self.arg_exp(cur, 1);
        if !self.backend.is_rm(node) {
            let op = self.op_display(cur);
            return Err(self.perr(
                self.arg_coo(cur, 1),
                format!("first argument of '{op}' is not a rounding-mode term"),
            ));
        }
        Ok(())
    }

    fn check_fp_args(&self, cur: usize, from: usize, nargs: usize) -> Result<()> {
        let op = self.op_display(cur);
        for i in from..=nargs {
            let node = self.arg_exp(cur, i);
            if !self.backend.is_fp(node) {
                return Err(self.perr(
                    self.arg_coo(cur, i),
                    format!("argument {i} of '{op}' is not a floating-point term"),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn is_boolean_exp(&self, node: NodeId) -> bool {
        !self.backend.is_array(node)
            && !self.backend.is_fun(node)
            && !self.backend.is_fp(node)
            && !self.backend.is_rm(node)
            && self.backend.bv_width(node) == 1
    }

    // ---- reductions -----------------------------------------------------

    /// `and`/`or`/`xor` (left fold) and `=>` (right fold) over boolean
    /// arguments.
    fn close_bin_bool(
        &mut self,
        open_idx: usize,
        cur: usize,
        nargs: usize,
        f: BinFn,
        right_assoc: bool,
    ) -> Result<()> {
        if nargs < 2 {
            let op = self.op_display(cur);
            return Err(self.perr(self.work[cur].coo, format!("argument to '{op}' missing")));
        }
        self.check_boolean_args(cur, nargs)?;
        let exp = if right_assoc {
            let last = self.arg_exp(cur, nargs);
            let mut exp = self.backend.copy(last);
            for i in (1..nargs).rev() {
                let old = exp;
                let arg = self.arg_exp(cur, i);
                exp = f(self.backend, arg, old);
                self.backend.release(old);
            }
            exp
        } else {
            let first = self.arg_exp(cur, 1);
            let mut exp = self.backend.copy(first);
            for i in 2..=nargs {
                let old = exp;
                let arg = self.arg_exp(cur, i);
                exp = f(self.backend, old, arg);
                self.backend.release(old);
            }
            exp
        };
        self.reduce_to(open_idx, exp);
        Ok(())
    }

    fn close_unary_bv(&mut self, open_idx: usize, cur: usize, nargs: usize, f: UnaryFn) -> Result<()> {
        self.check_nargs(cur, nargs, 1)?;
        self.check_not_array_or_uf_args(cur, nargs)?;
        let arg = self.arg_exp(cur, 1);
        let exp = f(self.backend, arg);
        self.reduce_to(open_idx, exp);
        Ok(())
    }

    /// `concat` and the n-ary left-associative bit-vector operators.
    fn close_left_assoc_bv(
        &mut self,
        open_idx: usize,
        cur: usize,
        nargs: usize,
        f: BinFn,
        is_concat: bool,
        is_xnor: bool,
    ) -> Result<()> {
        if nargs < 2 {
            let op = self.op_display(cur);
            return Err(self.perr(self.work[cur].coo, format!("argument to '{op}' missing")));
        }
        if !is_concat {
            self.check_arg_sorts_match(cur, 0, nargs)?;
        }
        self.check_not_array_or_uf_args(cur, nargs)?;
        let fold: BinFn = if is_xnor { |b, x, y| b.bv_xor(x, y) } else { f };
        let first = self.arg_exp(cur, 1);
        let mut exp = self.backend.copy(first);
        for i in 2..=nargs {
            let old = exp;
            let arg = self.arg_exp(cur, i);
            exp = fold(self.backend, old, arg);
            self.backend.release(old);
        }
        if is_xnor {
            let old = exp;
            exp = self.backend.bv_not(exp);
            self.backend.release(old);
        }
        self.reduce_to(open_idx, exp);
        Ok(())
    }

    fn close_bin_bv(&mut self, open_idx: usize, cur: usize, nargs: usize, f: BinFn) -> Result<()> {
        self.check_nargs(cur, nargs, 2)?;
        self.check_arg_sorts_match(cur, 0, 2)?;
        self.check_not_array_or_uf_args(cur, nargs)?;
        let a = self.arg_exp(cur, 1);
        let b = self.arg_exp(cur, 2);
        let exp = f(self.backend, a, b);
        self.reduce_to(open_idx, exp);
        Ok(())
    }

    fn close_extend_bv(&mut self, open_idx: usize, cur: usize, nargs: usize, f: ExtFn) -> Result<()> {
        self.check_nargs(cur, nargs, 1)?;
        self.check_not_array_or_uf_args(cur, nargs)?;
        let k = self.work[cur].idx0;
        let arg = self.arg_exp(cur, 1);
        let width = self.backend.bv_width(arg);
        if (i32::MAX as u32) - k < width {
            let op = self.op_display(cur);
            return Err(self.perr(
                self.work[cur].coo,
                format!("resulting bit-width of '{op}' too large"),
            ));
        }
        let exp = f(self.backend, arg, k);
        self.reduce_to(open_idx, exp);
        Ok(())
    }

    fn close_rotate_bv(&mut self, open_idx: usize, cur: usize, nargs: usize, f: ExtFn) -> Result<()> {
        self.check_nargs(cur, nargs, 1)?;
        self.check_not_array_or_uf_args(cur, nargs)?;
        let arg = self.arg_exp(cur, 1);
        let width = self.backend.bv_width(arg);
        let k = self.work[cur].idx0 % width.max(1);
        let exp = f(self.backend, arg, k);
        self.reduce_to(open_idx, exp);
        Ok(())
    }

    /// Chainable pairwise reduction to a conjunction (used by `=` and the
    /// floating-point comparisons).
    fn close_chainable(&mut self, open_idx: usize, cur: usize, nargs: usize, f: BinFn) -> Result<()> {
        let a = self.arg_exp(cur, 1);
        let b = self.arg_exp(cur, 2);
        let mut exp = f(self.backend, a, b);
        for i in 3..=nargs {
            let a = self.arg_exp(cur, i - 1);
            let b = self.arg_exp(cur, i);
            let tmp = f(self.backend, a, b);
            let old = exp;
            exp = self.backend.and(old, tmp);
            self.backend.release(old);
            self.backend.release(tmp);
        }
        self.reduce_to(open_idx, exp);
        Ok(())
    }

    fn close_quant(&mut self, open_idx: usize, cur: usize, nargs: usize, forall: bool) -> Result<()> {
        let what = if forall { "forall" } else { "exists" };
        for i in 1..nargs {
            if !matches!(self.work[cur + i].work, Work::Sym(_)) {
                return Err(self.perr(
                    self.arg_coo(cur, i),
                    format!("expected symbol as argument {i} of '{what}'"),
                ));
            }
        }
        let Work::Expr(body) = self.work[cur + nargs].work else {
            return Err(self.perr(
                self.arg_coo(cur, nargs),
                format!("expected expression as argument {nargs} of '{what}'"),
            ));
        };
        if !self.is_boolean_exp(body) {
            return Err(self.perr(
                self.arg_coo(cur, nargs),
                format!("body of '{what}' is not a boolean term"),
            ));
        }
        let mut params: SmallVec<[NodeId; 4]> = SmallVec::new();
        for i in 1..nargs {
            let Work::Sym(sym) = self.work[cur + i].work else {
                unreachable!()
            };
            let node = self.symbols.get(sym).node.expect("sorted var has a parameter");
            params.push(self.backend.copy(node));
            self.symbols.remove(sym, &mut *self.backend);
        }
        let exp = if forall {
            self.backend.forall(&params, body)
        } else {
            self.backend.exists(&params, body)
        };
        for p in params {
            self.backend.release(p);
        }
        self.backend.release(body);
        self.work[open_idx].work = Work::Expr(exp);
        self.work.truncate(cur);
        Ok(())
    }

    fn close_fp_to_fp(&mut self, open_idx: usize, cur: usize, nargs: usize, unsigned: bool) -> Result<()> {
        let eb = self.work[cur].idx0;
        let sb = self.work[cur].idx1;
        if nargs == 1 && !unsigned {
            // ((_ to_fp eb sb) (_ BitVec m)) -- reinterpretation
            let Work::Expr(node) = self.work[cur + 1].work else {
                return Err(self.perr(self.arg_coo(cur, 1), "expected expression".into()));
            };
            let op = self.op_display(cur);
            if self.backend.is_array(node)
                || self.backend.is_fun(node)
                || self.backend.is_fp(node)
                || self.backend.is_rm(node)
            {
                return Err(self.perr(
                    self.arg_coo(cur, 1),
                    format!("invalid argument to '{op}', expected bit-vector term"),
                ));
            }
            let width = self.backend.bv_width(node);
            if width != eb + sb {
                return Err(self.perr(
                    self.arg_coo(cur, 1),
                    format!("invalid argument to '{op}', expected bit-vector of bit-width {}", eb + sb),
                ));
            }
            let exp = self.backend.fp_from_bv(node, eb, sb);
            self.reduce_to(open_idx, exp);
            return Ok(());
        }
        self.check_nargs(cur, nargs, 2)?;
        self.check_rm_first(cur)?;
        let rm = self.arg_exp(cur, 1);
        match self.work[cur + 2].work.clone() {
            Work::Real(repr) => {
                if unsigned {
                    let op = self.op_display(cur);
                    return Err(self.perr(
                        self.work[cur].coo,
                        format!("invalid argument to '{op}', expected bit-vector constant"),
                    ));
                }
                let exp = self.backend.fp_from_real(rm, &repr, eb, sb);
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            Work::Expr(node) => {
                let exp = if self.backend.is_fp(node) {
                    if unsigned {
                        let op = self.op_display(cur);
                        return Err(self.perr(
                            self.arg_coo(cur, 2),
                            format!("invalid argument to '{op}', expected bit-vector term"),
                        ));
                    }
                    self.backend.fp_from_fp(rm, node, eb, sb)
                } else if !self.backend.is_array(node)
                    && !self.backend.is_fun(node)
                    && !self.backend.is_rm(node)
                {
                    if unsigned {
                        self.backend.fp_from_ubv(rm, node, eb, sb)
                    } else {
                        self.backend.fp_from_sbv(rm, node, eb, sb)
                    }
                } else {
                    let op = self.op_display(cur);
                    return Err(self.perr(
                        self.arg_coo(cur, 2),
                        format!(
                            "invalid argument to '{op}', expected bit-vector or \
                             floating-point term"
                        ),
                    ));
                };
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            _ => Err(self.perr(self.arg_coo(cur, 2), "expected expression".into())),
        }
    }

    /// Reduce at `)`.
    pub(crate) fn close_term(&mut self) -> Result<()> {
        if let Some(what) = self.expecting_body.take() {
            let open_idx = self.last_open();
            return Err(match open_idx {
                Some(idx) if idx + 1 < self.work.len() => {
                    let coo = self.work[idx + 1].coo;
                    self.perr(
                        self.lexer.coo(),
                        format!(
                            "body to '{what}' at line {} column {} missing",
                            coo.line, coo.col
                        ),
                    )
                }
                _ => self.perr(self.lexer.coo(), format!("body to '{what}' missing")),
            });
        }
        if self.open == 0 {
            return Err(self.perr(self.lexer.coo(), "expected expression".into()));
        }
        let open_idx = self.last_open().expect("open paren on the work stack");
        let cur = open_idx + 1;
        if cur == self.work.len() {
            return Err(self.perr(self.work[open_idx].coo, "unexpected '()'".into()));
        }
        let nargs = self.work.len() - cur - 1;
        let head = self.work[cur].work.clone();

        // every operand of an operator frame must already be an expression;
        // binder and annotation frames manage their own item kinds, and
        // `to_fp` may consume a pending real literal
        let exempt = matches!(
            head,
            Work::VarBinding
                | Work::VarBindings
                | Work::SortedVar
                | Work::SortedVars
                | Work::Op {
                    tag: Tag::Reserved(Reserved::Let)
                        | Tag::Reserved(Reserved::Forall)
                        | Tag::Reserved(Reserved::Exists)
                        | Tag::Reserved(Reserved::Bang)
                        | Tag::Fp(FpOp::ToFp)
                        | Tag::Fp(FpOp::ToFpUnsigned),
                    ..
                }
        );
        if !exempt {
            for i in 1..=nargs {
                match &self.work[cur + i].work {
                    Work::Expr(_) => {}
                    Work::Real(_) => {
                        return Err(
                            self.perr(self.arg_coo(cur, i), "unexpected real constant".into())
                        );
                    }
                    _ => {
                        return Err(self.perr(self.arg_coo(cur, i), "expected expression".into()));
                    }
                }
            }
        }

        match head {
            // -- expression: application or grouping -------------------------
            Work::Expr(f) => {
                if nargs > 0 && self.backend.is_fun(f) {
                    let args: SmallVec<[NodeId; 4]> =
                        (1..=nargs).map(|i| self.arg_exp(cur, i)).collect();
                    if nargs as u32 != self.backend.fun_arity(f) {
                        return Err(
                            self.perr(self.work[cur].coo, "invalid number of arguments".into())
                        );
                    }
                    if let Some(k) = self.backend.fun_sort_check(&args, f) {
                        return Err(self.perr(
                            self.work[cur].coo,
                            format!("invalid sort for argument {}", k + 1),
                        ));
                    }
                    let exp = self.backend.apply(&args, f);
                    self.reduce_to(open_idx, exp);
                } else if nargs > 0 {
                    return Err(self.perr(
                        self.work[open_idx].coo,
                        format!("list with {} expressions", nargs + 1),
                    ));
                } else {
                    self.work.truncate(cur);
                    self.work[open_idx].work = Work::Expr(f);
                }
            }
            // -- (as const T) ------------------------------------------------
            Work::AsConst(sort) => {
                if nargs != 1 {
                    return Err(self.perr(
                        self.work[cur].coo,
                        format!("expected exactly one argument for ((as ...) but got {nargs}"),
                    ));
                }
                let value = self.arg_exp(cur, 1);
                let exp = self.backend.const_array(sort, value);
                self.reduce_to(open_idx, exp);
            }
            // -- (! e :named n) ----------------------------------------------
            Work::Op {
                tag: Tag::Reserved(Reserved::Bang),
                ..
            } => {
                if nargs != 3 {
                    return Err(self.perr(
                        self.work[cur].coo,
                        format!("invalid annotation syntax, expected 3 arguments got {nargs}"),
                    ));
                }
                let Work::Expr(exp) = self.work[cur + 1].work else {
                    return Err(self.perr(
                        self.arg_coo(cur, 1),
                        "invalid annotation syntax, expected expression as first argument".into(),
                    ));
                };
                if !matches!(self.work[cur + 2].work, Work::Attr(Kw::Named)) {
                    return Err(self.perr(
                        self.arg_coo(cur, 2),
                        "invalid annotation syntax, expected :named attribute as second argument"
                            .into(),
                    ));
                }
                let Work::Sym(sym) = self.work[cur + 3].work else {
                    return Err(self.perr(
                        self.arg_coo(cur, 3),
                        "invalid annotation syntax, expected symbol as third argument".into(),
                    ));
                };
                let name = self.symbols.name(sym).to_string();
                self.backend.set_symbol(exp, &name);
                self.work.truncate(cur);
                self.work[open_idx].work = Work::Expr(exp);
            }
            // -- core --------------------------------------------------------
            Work::Op {
                tag: Tag::Core(op), ..
            } => match op {
                CoreOp::Not => {
                    if nargs != 1 {
                        return Err(self.perr(
                            self.work[cur].coo,
                            format!("'not' with {nargs} arguments but expected exactly one"),
                        ));
                    }
                    let node = self.arg_exp(cur, 1);
                    if self.backend.is_array(node) {
                        return Err(self.perr(
                            self.arg_coo(cur, 1),
                            "unexpected array expression as argument to 'not'".into(),
                        ));
                    }
                    let width = self.backend.bv_width(node);
                    if self.backend.is_fp(node) || self.backend.is_rm(node) || width != 1 {
                        return Err(self.perr(
                            self.arg_coo(cur, 1),
                            format!("unexpected bit-vector of width {width} as argument to 'not'"),
                        ));
                    }
                    let exp = self.backend.not(node);
                    self.reduce_to(open_idx, exp);
                }
                CoreOp::Implies => {
                    self.close_bin_bool(open_idx, cur, nargs, |b, x, y| b.implies(x, y), true)?;
                }
                CoreOp::And => {
                    self.close_bin_bool(open_idx, cur, nargs, |b, x, y| b.and(x, y), false)?;
                }
                CoreOp::Or => {
                    self.close_bin_bool(open_idx, cur, nargs, |b, x, y| b.or(x, y), false)?;
                }
                CoreOp::Xor => {
                    self.close_bin_bool(open_idx, cur, nargs, |b, x, y| b.bv_xor(x, y), false)?;
                }
                CoreOp::Equal => {
                    if nargs == 0 {
                        return Err(self.perr(self.work[cur].coo, "arguments to '=' missing".into()));
                    }
                    if nargs == 1 {
                        return Err(self.perr(self.work[cur].coo, "only one argument to '='".into()));
                    }
                    self.check_arg_sorts_match(cur, 0, nargs)?;
                    self.close_chainable(open_idx, cur, nargs, |b, x, y| b.eq(x, y))?;
                }
                CoreOp::Distinct => {
                    if nargs == 0 {
                        return Err(self.perr(
                            self.work[cur].coo,
                            "arguments to 'distinct' missing".into(),
                        ));
                    }
                    if nargs == 1 {
                        return Err(self.perr(
                            self.work[cur].coo,
                            "only one argument to 'distinct'".into(),
                        ));
                    }
                    self.check_arg_sorts_match(cur, 0, nargs)?;
                    let mut exp: Option<NodeId> = None;
                    for i in 1..nargs {
                        for j in i + 1..=nargs {
                            let a = self.arg_exp(cur, i);
                            let b = self.arg_exp(cur, j);
                            let tmp = self.backend.ne(a, b);
                            exp = match exp {
                                Some(old) => {
                                    let joined = self.backend.and(old, tmp);
                                    self.backend.release(old);
                                    self.backend.release(tmp);
                                    Some(joined)
                                }
                                None => Some(tmp),
                            };
                        }
                    }
                    let exp = exp.expect("at least one pair");
                    self.reduce_to(open_idx, exp);
                }
                CoreOp::Ite => {
                    self.check_nargs(cur, nargs, 3)?;
                    self.check_ite_args(cur)?;
                    let (c, t, e) = (
                        self.arg_exp(cur, 1),
                        self.arg_exp(cur, 2),
                        self.arg_exp(cur, 3),
                    );
                    let exp = self.backend.cond(c, t, e);
                    self.reduce_to(open_idx, exp);
                }
                CoreOp::Bool | CoreOp::True | CoreOp::False => {
                    return Err(self.perr(
                        self.work[cur].coo,
                        format!(
                            "internal parse error: can not close yet unsupported '{}'",
                            self.op_display(cur)
                        ),
                    ));
                }
            },
            // -- arrays ------------------------------------------------------
            Work::Op {
                tag: Tag::Array(ArrayOp::Select),
                ..
            } => {
                self.check_nargs(cur, nargs, 2)?;
                let array = self.arg_exp(cur, 1);
                let index = self.arg_exp(cur, 2);
                if !self.backend.is_array(array) {
                    return Err(self.perr(
                        self.arg_coo(cur, 1),
                        "first argument of 'select' is not an array".into(),
                    ));
                }
                if self.backend.is_array(index) {
                    return Err(self.perr(
                        self.arg_coo(cur, 2),
                        "second argument of 'select' is an array".into(),
                    ));
                }
                let width = self.backend.bv_width(index);
                let domain = self.backend.index_width(array);
                if width != domain {
                    return Err(self.perr(
                        self.work[cur].coo,
                        format!(
                            "first (array) argument of 'select' has index bit-width {domain} \
                             but the second (index) argument has bit-width {width}"
                        ),
                    ));
                }
                let exp = self.backend.read(array, index);
                self.reduce_to(open_idx, exp);
            }
            Work::Op {
                tag: Tag::Array(ArrayOp::Store),
                ..
            } => {
                self.check_nargs(cur, nargs, 3)?;
                let array = self.arg_exp(cur, 1);
                let index = self.arg_exp(cur, 2);
                let value = self.arg_exp(cur, 3);
                if !self.backend.is_array(array) {
                    return Err(self.perr(
                        self.arg_coo(cur, 1),
                        "first argument of 'store' is not an array".into(),
                    ));
                }
                if self.backend.is_array(index) {
                    return Err(self.perr(
                        self.arg_coo(cur, 2),
                        "second argument of 'store' is an array".into(),
                    ));
                }
                if self.backend.is_array(value) {
                    return Err(self.perr(
                        self.arg_coo(cur, 3),
                        "third argument of 'store' is an array".into(),
                    ));
                }
                let width = self.backend.bv_width(index);
                let domain = self.backend.index_width(array);
                if width != domain {
                    return Err(self.perr(
                        self.work[cur].coo,
                        format!(
                            "first (array) argument of 'store' has index bit-width {domain} \
                             but the second (index) argument has bit-width {width}"
                        ),
                    ));
                }
                let elem = self.backend.bv_width(array);
                let width2 = self.backend.bv_width(value);
                if elem != width2 {
                    return Err(self.perr(
                        self.work[cur].coo,
                        format!(
                            "first (array) argument of 'store' has element bit-width {elem} \
                             but the third (stored bit-vector) argument has bit-width {width2}"
                        ),
                    ));
                }
                let exp = self.backend.write(array, index, value);
                self.reduce_to(open_idx, exp);
            }
            // -- bit-vectors -------------------------------------------------
            Work::Op {
                tag: Tag::Bv(op), ..
            } => self.close_bv(open_idx, cur, nargs, op)?,
            // -- floating point ----------------------------------------------
            Work::Op {
                tag: Tag::Fp(op), ..
            } => self.close_fp(open_idx, cur, nargs, op)?,
            // -- binders -----------------------------------------------------
            Work::Op {
                tag: Tag::Reserved(Reserved::Let),
                ..
            } => {
                for i in 1..nargs {
                    if !matches!(self.work[cur + i].work, Work::Sym(_)) {
                        return Err(self.perr(
                            self.arg_coo(cur, i),
                            format!("expected symbol as argument {i} of 'let'"),
                        ));
                    }
                }
                let Work::Expr(body) = self.work[cur + nargs].work else {
                    return Err(self.perr(
                        self.arg_coo(cur, nargs),
                        format!("expected expression as argument {nargs} of 'let'"),
                    ));
                };
                for i in 1..nargs {
                    let Work::Sym(sym) = self.work[cur + i].work else {
                        unreachable!()
                    };
                    self.symbols.remove(sym, &mut *self.backend);
                }
                self.work[open_idx].work = Work::Expr(body);
                self.work.truncate(cur);
            }
            Work::Op {
                tag: Tag::Reserved(Reserved::Forall),
                ..
            } => self.close_quant(open_idx, cur, nargs, true)?,
            Work::Op {
                tag: Tag::Reserved(Reserved::Exists),
                ..
            } => self.close_quant(open_idx, cur, nargs, false)?,
            Work::VarBinding => {
                let Work::Sym(sym) = self.work[cur + 1].work else {
                    return Err(self.perr(
                        self.arg_coo(cur, 1),
                        "expected symbol in 'let' var binding".into(),
                    ));
                };
                if nargs == 1 {
                    return Err(self.perr(
                        self.lexer.coo(),
                        format!("term to be bound to '{}' missing", self.symbols.name(sym)),
                    ));
                }
                if nargs > 2 {
                    return Err(self.perr(
                        self.arg_coo(cur, 3),
                        format!("second term bound to '{}'", self.symbols.name(sym)),
                    ));
                }
                let Work::Expr(exp) = self.work[cur + 2].work else {
                    return Err(self.perr(
                        self.arg_coo(cur, 2),
                        "expected expression in 'let' var binding".into(),
                    ));
                };
                {
                    let entry = self.symbols.get_mut(sym);
                    debug_assert!(entry.node.is_none());
                    entry.node = Some(exp);
                    entry.bound = true;
                }
                let sym_item = self.work[cur + 1].clone();
                self.work[open_idx] = sym_item;
                self.work.truncate(cur);
                debug_assert!(!self.isvarbinding);
                self.isvarbinding = true;
            }
            Work::VarBindings => {
                debug_assert!(self.isvarbinding);
                self.isvarbinding = false;
                // drop the '(' and the binding-list frame, keeping the bound
                // symbols in place for the pending 'let'
                self.work.drain(open_idx..=cur);
                debug_assert!(self.expecting_body.is_none());
                self.expecting_body = Some("let");
            }
            Work::SortedVar => {
                let Work::Sym(sym) = self.work[cur + 1].work else {
                    return Err(self.perr(self.arg_coo(cur, 1), "expected sorted variable".into()));
                };
                if nargs != 1 {
                    return Err(self.perr(
                        self.arg_coo(cur, 1),
                        format!(
                            "expected only one variable at sorted var '{}'",
                            self.symbols.name(sym)
                        ),
                    ));
                }
                let sym_item = self.work[cur + 1].clone();
                self.work[open_idx] = sym_item;
                self.work.truncate(cur);
                debug_assert!(!self.sorted_var);
                self.sorted_var = true;
            }
            Work::SortedVars => {
                debug_assert!(self.sorted_var);
                self.sorted_var = false;
                self.work.drain(open_idx..=cur);
                debug_assert!(self.expecting_body.is_none());
                self.expecting_body = Some("quantifier");
            }
            Work::Real(text) => {
                return Err(self.perr(self.work[cur].coo, format!("unexpected real constant '{text}'")));
            }
            _ => {
                return Err(self.perr(
                    self.work[cur].coo,
                    format!(
                        "internal parse error: can not close yet unsupported '{}'",
                        self.op_display(cur)
                    ),
                ));
            }
        }
        debug_assert!(self.open > 0);
        self.open -= 1;
        Ok(())
    }

    fn close_bv(&mut self, open_idx: usize, cur: usize, nargs: usize, op: BvOp) -> Result<()> {
        match op {
            BvOp::Not => self.close_unary_bv(open_idx, cur, nargs, |b, x| b.bv_not(x)),
            BvOp::Neg => self.close_unary_bv(open_idx, cur, nargs, |b, x| b.bv_neg(x)),
            BvOp::Redor => self.close_unary_bv(open_idx, cur, nargs, |b, x| b.bv_redor(x)),
            BvOp::Redand => self.close_unary_bv(open_idx, cur, nargs, |b, x| b.bv_redand(x)),
            BvOp::Concat => {
                self.close_left_assoc_bv(open_idx, cur, nargs, |b, x, y| b.concat(x, y), true, false)
            }
            BvOp::And => {
                self.close_left_assoc_bv(open_idx, cur, nargs, |b, x, y| b.bv_and(x, y), false, false)
            }
            BvOp::Or => {
                self.close_left_assoc_bv(open_idx, cur, nargs, |b, x, y| b.bv_or(x, y), false, false)
            }
            BvOp::Xor => {
                self.close_left_assoc_bv(open_idx, cur, nargs, |b, x, y| b.bv_xor(x, y), false, false)
            }
            BvOp::Xnor => {
                self.close_left_assoc_bv(open_idx, cur, nargs, |b, x, y| b.bv_xor(x, y), false, true)
            }
            BvOp::Add => {
                self.close_left_assoc_bv(open_idx, cur, nargs, |b, x, y| b.bv_add(x, y), false, false)
            }
            BvOp::Sub => {
                self.close_left_assoc_bv(open_idx, cur, nargs, |b, x, y| b.bv_sub(x, y), false, false)
            }
            BvOp::Mul => {
                self.close_left_assoc_bv(open_idx, cur, nargs, |b, x, y| b.bv_mul(x, y), false, false)
            }
            BvOp::Udiv => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_udiv(x, y)),
            BvOp::Urem => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_urem(x, y)),
            BvOp::Sdiv => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_sdiv(x, y)),
            BvOp::Srem => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_srem(x, y)),
            BvOp::Smod => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_smod(x, y)),
            BvOp::Shl => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_shl(x, y)),
            BvOp::Lshr => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_lshr(x, y)),
            BvOp::Ashr => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_ashr(x, y)),
            BvOp::Nand => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_nand(x, y)),
            BvOp::Nor => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_nor(x, y)),
            BvOp::Comp => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.eq(x, y)),
            BvOp::Ult => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_ult(x, y)),
            BvOp::Ule => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_ulte(x, y)),
            BvOp::Ugt => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_ugt(x, y)),
            BvOp::Uge => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_ugte(x, y)),
            BvOp::Slt => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_slt(x, y)),
            BvOp::Sle => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_slte(x, y)),
            BvOp::Sgt => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_sgt(x, y)),
            BvOp::Sge => self.close_bin_bv(open_idx, cur, nargs, |b, x, y| b.bv_sgte(x, y)),
            BvOp::Extract => {
                self.check_nargs(cur, nargs, 1)?;
                self.check_not_array_or_uf_args(cur, nargs)?;
                let node = self.arg_exp(cur, 1);
                let width = self.backend.bv_width(node);
                let hi = self.work[cur].idx0;
                let lo = self.work[cur].idx1;
                if width <= hi {
                    return Err(self.perr(
                        self.work[cur].coo,
                        format!(
                            "first (high) 'extract' parameter {hi} too large for \
                             bit-vector argument of bit-width {width}"
                        ),
                    ));
                }
                let exp = self.backend.bv_slice(node, hi, lo);
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            BvOp::Repeat => {
                self.check_nargs(cur, nargs, 1)?;
                self.check_not_array_or_uf_args(cur, nargs)?;
                let node = self.arg_exp(cur, 1);
                let width = self.backend.bv_width(node);
                let k = self.work[cur].idx0;
                if k != 0 && (i32::MAX as u32) / k < width {
                    return Err(self.perr(
                        self.work[cur].coo,
                        "resulting bit-width of 'repeat' too large".into(),
                    ));
                }
                let exp = self.backend.bv_repeat(node, k);
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            BvOp::ZeroExtend => self.close_extend_bv(open_idx, cur, nargs, |b, x, k| b.bv_uext(x, k)),
            BvOp::SignExtend => self.close_extend_bv(open_idx, cur, nargs, |b, x, k| b.bv_sext(x, k)),
            BvOp::RotateLeft => self.close_rotate_bv(open_idx, cur, nargs, |b, x, k| b.bv_roli(x, k)),
            BvOp::RotateRight => self.close_rotate_bv(open_idx, cur, nargs, |b, x, k| b.bv_rori(x, k)),
            BvOp::ExtRotateLeft | BvOp::ExtRotateRight => {
                self.check_nargs(cur, nargs, 2)?;
                self.check_not_array_or_uf_args(cur, nargs)?;
                let node = self.arg_exp(cur, 1);
                let shift = self.arg_exp(cur, 2);
                let is_left = op == BvOp::ExtRotateLeft;
                if !self.backend.is_bv_const(shift) {
                    let which = if is_left { "left" } else { "right" };
                    return Err(self.perr(
                        self.arg_coo(cur, 2),
                        format!(
                            "second argument of 'ext_rotate_{which}' is not a bit-vector constant"
                        ),
                    ));
                }
                let bits = self.backend.const_bits(shift).expect("constant has bits");
                let width = self.backend.bv_width(node).max(1);
                let value = BigUint::parse_bytes(bits.as_bytes(), 2).unwrap_or_default();
                let k = (value % width).to_u32_digits().first().copied().unwrap_or(0);
                let exp = if is_left {
                    self.backend.bv_roli(node, k)
                } else {
                    self.backend.bv_rori(node, k)
                };
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            BvOp::BitVec => Err(self.perr(
                self.work[cur].coo,
                "internal parse error: can not close yet unsupported 'BitVec'".into(),
            )),
        }
    }

    fn close_fp(&mut self, open_idx: usize, cur: usize, nargs: usize, op: FpOp) -> Result<()> {
        match op {
            FpOp::Abs | FpOp::Neg => {
                self.check_nargs(cur, nargs, 1)?;
                self.check_fp_args(cur, 1, nargs)?;
                let node = self.arg_exp(cur, 1);
                let exp = if op == FpOp::Abs {
                    self.backend.fp_abs(node)
                } else {
                    self.backend.fp_neg(node)
                };
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            FpOp::Sqrt | FpOp::RoundToIntegral => {
                self.check_nargs(cur, nargs, 2)?;
                self.check_rm_first(cur)?;
                self.check_fp_args(cur, 2, nargs)?;
                let rm = self.arg_exp(cur, 1);
                let node = self.arg_exp(cur, 2);
                let exp = if op == FpOp::Sqrt {
                    self.backend.fp_sqrt(rm, node)
                } else {
                    self.backend.fp_round_to_int(rm, node)
                };
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            FpOp::Add | FpOp::Sub | FpOp::Mul | FpOp::Div => {
                self.check_nargs(cur, nargs, 3)?;
                self.check_rm_first(cur)?;
                self.check_fp_args(cur, 2, nargs)?;
                self.check_arg_sorts_match(cur, 1, nargs)?;
                let rm = self.arg_exp(cur, 1);
                let a = self.arg_exp(cur, 2);
                let b = self.arg_exp(cur, 3);
                let exp = match op {
                    FpOp::Add => self.backend.fp_add(rm, a, b),
                    FpOp::Sub => self.backend.fp_sub(rm, a, b),
                    FpOp::Mul => self.backend.fp_mul(rm, a, b),
                    _ => self.backend.fp_div(rm, a, b),
                };
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            FpOp::Fma => {
                self.check_nargs(cur, nargs, 4)?;
                self.check_rm_first(cur)?;
                self.check_fp_args(cur, 2, nargs)?;
                self.check_arg_sorts_match(cur, 1, nargs)?;
                let (rm, a, b, c) = (
                    self.arg_exp(cur, 1),
                    self.arg_exp(cur, 2),
                    self.arg_exp(cur, 3),
                    self.arg_exp(cur, 4),
                );
                let exp = self.backend.fp_fma(rm, a, b, c);
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            FpOp::Rem | FpOp::Min | FpOp::Max => {
                self.check_nargs(cur, nargs, 2)?;
                self.check_fp_args(cur, 1, nargs)?;
                self.check_arg_sorts_match(cur, 0, 2)?;
                let a = self.arg_exp(cur, 1);
                let b = self.arg_exp(cur, 2);
                let exp = match op {
                    FpOp::Rem => self.backend.fp_rem(a, b),
                    FpOp::Min => self.backend.fp_min(a, b),
                    _ => self.backend.fp_max(a, b),
                };
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            FpOp::Eq | FpOp::Leq | FpOp::Lt | FpOp::Geq | FpOp::Gt => {
                if nargs < 2 {
                    let name = self.op_display(cur);
                    return Err(
                        self.perr(self.work[cur].coo, format!("argument to '{name}' missing"))
                    );
                }
                self.check_fp_args(cur, 1, nargs)?;
                self.check_arg_sorts_match(cur, 0, nargs)?;
                let f: BinFn = match op {
                    FpOp::Eq => |b, x, y| b.fp_eq(x, y),
                    FpOp::Leq => |b, x, y| b.fp_leq(x, y),
                    FpOp::Lt => |b, x, y| b.fp_lt(x, y),
                    FpOp::Geq => |b, x, y| b.fp_geq(x, y),
                    _ => |b, x, y| b.fp_gt(x, y),
                };
                self.close_chainable(open_idx, cur, nargs, f)
            }
            FpOp::IsNormal
            | FpOp::IsSubnormal
            | FpOp::IsZero
            | FpOp::IsInfinite
            | FpOp::IsNaN
            | FpOp::IsNegative
            | FpOp::IsPositive => {
                self.check_nargs(cur, nargs, 1)?;
                self.check_fp_args(cur, 1, nargs)?;
                let node = self.arg_exp(cur, 1);
                let exp = match op {
                    FpOp::IsNormal => self.backend.fp_is_normal(node),
                    FpOp::IsSubnormal => self.backend.fp_is_subnormal(node),
                    FpOp::IsZero => self.backend.fp_is_zero(node),
                    FpOp::IsInfinite => self.backend.fp_is_inf(node),
                    FpOp::IsNaN => self.backend.fp_is_nan(node),
                    FpOp::IsNegative => self.backend.fp_is_neg(node),
                    _ => self.backend.fp_is_pos(node),
                };
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            FpOp::Fp => {
                self.check_nargs(cur, nargs, 3)?;
                for i in 1..=nargs {
                    if !self.backend.is_bv_const(self.arg_exp(cur, i)) {
                        return Err(self.perr(
                            self.arg_coo(cur, i),
                            "invalid argument to 'fp', expected bit-vector constant".into(),
                        ));
                    }
                }
                if self.backend.bv_width(self.arg_exp(cur, 1)) != 1 {
                    return Err(self.perr(
                        self.arg_coo(cur, 1),
                        "first argument to 'fp' invalid, expected bit-vector sort of size 1"
                            .into(),
                    ));
                }
                let (sign, exponent, significand) = (
                    self.arg_exp(cur, 1),
                    self.arg_exp(cur, 2),
                    self.arg_exp(cur, 3),
                );
                let exp = self.backend.fp_value(sign, exponent, significand);
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            FpOp::ToFp => self.close_fp_to_fp(open_idx, cur, nargs, false),
            FpOp::ToFpUnsigned => self.close_fp_to_fp(open_idx, cur, nargs, true),
            FpOp::ToUbv | FpOp::ToSbv => {
                self.check_nargs(cur, nargs, 2)?;
                self.check_rm_first(cur)?;
                self.check_fp_args(cur, 2, nargs)?;
                let rm = self.arg_exp(cur, 1);
                let node = self.arg_exp(cur, 2);
                let width = self.work[cur].idx0;
                let exp = if op == FpOp::ToUbv {
                    self.backend.fp_to_ubv(rm, node, width)
                } else {
                    self.backend.fp_to_sbv(rm, node, width)
                };
                self.reduce_to(open_idx, exp);
                Ok(())
            }
            _ => Err(self.perr(
                self.work[cur].coo,
                format!(
                    "internal parse error: can not close yet unsupported '{}'",
                    self.op_display(cur)
                ),
            )),
        }
    }

    // ---- shifting -------------------------------------------------------

    /// Shift one non-`)` token onto the work stack.
    pub(crate) fn open_term(&mut self, tok: Token) -> Result<()> {
        if self.expecting_body.is_some() {
            self.expecting_body = None;
        }
        match tok.tag {
            Tag::Lpar => {
                self.push_work(Work::Open, tok.coo);
                let lpar_coo = tok.coo;
                if self.isvarbinding {
                    self.push_work(Work::VarBinding, tok.coo);
                    self.isvarbinding = false;
                    let sym_tok = self.read_token()?;
                    if sym_tok.tag == Tag::Eof {
                        return Err(self.perr(
                            sym_tok.coo,
                            format!(
                                "expected symbol to be bound after '(' at line {} column {} \
                                 but reached end-of-file",
                                lpar_coo.line, lpar_coo.col
                            ),
                        ));
                    }
                    if sym_tok.tag != Tag::Symbol {
                        return Err(self.perr(
                            sym_tok.coo,
                            format!(
                                "expected symbol to be bound at '{}' after '(' at line {} \
                                 column {}",
                                self.lexer.text(),
                                lpar_coo.line,
                                lpar_coo.col
                            ),
                        ));
                    }
                    let sym = self.shadow_if_defined(sym_tok.sym.expect("symbol token"));
                    self.symbols.get_mut(sym).coo = sym_tok.coo;
                    self.push_work(Work::Sym(sym), sym_tok.coo);
                } else if self.sorted_var {
                    self.push_work(Work::SortedVar, tok.coo);
                    self.sorted_var = false;
                    let sym = self.read_symbol(" in sorted var after '('")?;
                    let sym = self.shadow_if_defined(sym);
                    let sym_coo = self.lexer.coo();
                    self.symbols.get_mut(sym).coo = sym_coo;
                    let sort_tok = self.read_token()?;
                    let sort = self.parse_sort(sort_tok, false)?;
                    self.push_work(Work::Sym(sym), sym_coo);
                    // internal parameter names are made unique to avoid
                    // collisions between shadowed binders
                    let unique = format!("{}!{}", self.symbols.name(sym), self.bound_vars);
                    self.bound_vars += 1;
                    let param = self.backend.param(sort, &unique);
                    self.symbols.get_mut(sym).node = Some(param);
                }
                self.open += 1;
            }
            _ if self.isvarbinding => {
                return Err(self.perr(
                    tok.coo,
                    format!("expected var binding at '{}'", self.lexer.text()),
                ));
            }
            _ if self.sorted_var => {
                return Err(self.perr(
                    tok.coo,
                    format!("expected sorted variable at '{}'", self.lexer.text()),
                ));
            }
            Tag::Keyword(Kw::Named) => {
                self.push_work(Work::Attr(Kw::Named), tok.coo);
                let sym = self.read_symbol(" after :named attribute")?;
                let entry = self.symbols.get(sym);
                if entry.coo.is_set() {
                    return Err(self.perr(
                        self.lexer.coo(),
                        format!(
                            "symbol '{}' already defined at line {} column {}",
                            entry.name, entry.coo.line, entry.coo.col
                        ),
                    ));
                }
                let sym_coo = self.lexer.coo();
                self.symbols.get_mut(sym).coo = sym_coo;
                self.push_work(Work::Sym(sym), sym_coo);
            }
            tag if tag.has_symbol() => self.open_term_named(tok)?,
            Tag::Binary => {
                let bits = self.lexer.text()[2..].to_string();
                let exp = self.backend.bv_const(&bits);
                self.push_work(Work::Expr(exp), tok.coo);
            }
            Tag::Hexadecimal => {
                let hex = &self.lexer.text()[2..];
                let width = hex.len() * 4;
                let value = BigUint::parse_bytes(hex.as_bytes(), 16).expect("lexed hex digits");
                let bits = format!("{:0>width$}", value.to_str_radix(2));
                let exp = self.backend.bv_const(&bits);
                self.push_work(Work::Expr(exp), tok.coo);
            }
            Tag::Real => {
                let text = self.lexer.text().to_string();
                self.push_work(Work::Real(text), tok.coo);
            }
            _ => {
                return Err(self.perr(
                    tok.coo,
                    format!("unexpected token '{}'", self.lexer.text()),
                ));
            }
        }
        Ok(())
    }

    /// Create a shadowing entry when the symbol is already declared or
    /// bound; otherwise reuse the entry the lexer created.
    pub(crate) fn shadow_if_defined(&mut self, sym: SymbolId) -> SymbolId {
        if self.symbols.get(sym).coo.is_set() {
            let name = self.symbols.get(sym).name.clone();
            self.symbols.insert(Tag::Symbol, &name)
        } else {
            sym
        }
    }

    /// Shift a token that resolved through the symbol table.
    fn open_term_named(&mut self, tok: Token) -> Result<()> {
        let tag = tok.tag;
        match tag.class() {
            TagClass::Command => {
                return Err(self.perr(
                    tok.coo,
                    format!("unexpected command '{}'", self.lexer.text()),
                ));
            }
            TagClass::Keyword => {
                return Err(self.perr(
                    tok.coo,
                    format!("unexpected keyword '{}'", self.lexer.text()),
                ));
            }
            TagClass::Logic => {
                return Err(self.perr(tok.coo, format!("unexpected logic '{}'", self.lexer.text())));
            }
            TagClass::Reserved => return self.open_term_reserved(tok),
            _ => {}
        }
        match tag {
            Tag::Symbol => {
                let sym = tok.sym.expect("symbol token");
                let Some(node) = self.symbols.get(sym).node else {
                    return Err(self.perr(
                        tok.coo,
                        format!("undefined symbol '{}'", self.symbols.name(sym)),
                    ));
                };
                let exp = self.backend.copy(node);
                self.push_work(Work::Expr(exp), tok.coo);
                Ok(())
            }
            Tag::Attribute => Err(self.perr(
                tok.coo,
                format!("unexpected attribute '{}'", self.lexer.text()),
            )),
            Tag::Core(CoreOp::True) => {
                let exp = self.backend.true_node();
                self.push_work(Work::Expr(exp), tok.coo);
                Ok(())
            }
            Tag::Core(CoreOp::False) => {
                let exp = self.backend.false_node();
                self.push_work(Work::Expr(exp), tok.coo);
                Ok(())
            }
            Tag::Core(CoreOp::Bool) => Err(self.perr(tok.coo, "unexpected 'Bool'".into())),
            Tag::Array(ArrayOp::Array) => Err(self.perr(tok.coo, "unexpected 'Array'".into())),
            Tag::Bv(BvOp::BitVec) => Err(self.perr(tok.coo, "unexpected 'BitVec'".into())),
            Tag::Fp(
                FpOp::FloatingPoint
                | FpOp::Float16
                | FpOp::Float32
                | FpOp::Float64
                | FpOp::Float128
                | FpOp::RoundingModeSort,
            ) => Err(self.perr(tok.coo, format!("unexpected '{}'", self.lexer.text()))),
            Tag::Fp(FpOp::Rm(rm)) => {
                let exp = self.backend.rm_const(rm);
                self.push_work(Work::Expr(exp), tok.coo);
                Ok(())
            }
            _ => {
                // an operator frame awaiting its arguments
                self.push_work(
                    Work::Op {
                        tag,
                        sym: tok.sym.expect("operator token"),
                    },
                    tok.coo,
                );
                Ok(())
            }
        }
    }

    fn open_term_reserved(&mut self, tok: Token) -> Result<()> {
        let Tag::Reserved(word) = tok.tag else {
            unreachable!()
        };
        match word {
            Reserved::Let => {
                self.push_work(
                    Work::Op {
                        tag: tok.tag,
                        sym: tok.sym.expect("reserved word token"),
                    },
                    tok.coo,
                );
                self.read_lpar(" after 'let'")?;
                self.push_work(Work::Open, self.lexer.coo());
                self.open += 1;
                self.push_work(Work::VarBindings, self.lexer.coo());
                debug_assert!(!self.isvarbinding);
                self.isvarbinding = true;
                Ok(())
            }
            Reserved::Forall | Reserved::Exists => {
                self.push_work(
                    Work::Op {
                        tag: tok.tag,
                        sym: tok.sym.expect("reserved word token"),
                    },
                    tok.coo,
                );
                let msg = if word == Reserved::Forall {
                    " after 'forall'"
                } else {
                    " after 'exists'"
                };
                self.read_lpar(msg)?;
                self.push_work(Work::Open, self.lexer.coo());
                self.open += 1;
                self.push_work(Work::SortedVars, self.lexer.coo());
                debug_assert!(!self.sorted_var);
                self.sorted_var = true;
                self.need_quantifiers = true;
                Ok(())
            }
            Reserved::Underscore => {
                self.push_work(Work::Underscore, tok.coo);
                self.open_term_indexed()
            }
            Reserved::As => {
                self.push_work(
                    Work::Op {
                        tag: tok.tag,
                        sym: tok.sym.expect("reserved word token"),
                    },
                    tok.coo,
                );
                self.open_term_as()
            }
            Reserved::Bang => {
                self.push_work(
                    Work::Op {
                        tag: tok.tag,
                        sym: tok.sym.expect("reserved word token"),
                    },
                    tok.coo,
                );
                self.expect_prev_lpar()?;
                Ok(())
            }
            Reserved::Par | Reserved::DecimalWord | Reserved::StringWord => Err(self.perr(
                tok.coo,
                format!("unsupported reserved word '{}'", self.lexer.text()),
            )),
        }
    }

    /// The item below the one just pushed must be a `(`.
    fn expect_prev_lpar(&mut self) -> Result<()> {
        let len = self.work.len();
        if len < 2 || !matches!(self.work[len - 2].work, Work::Open) {
            return Err(self.perr(
                self.lexer.coo(),
                format!("expected '(' before '{}'", self.lexer.text()),
            ));
        }
        Ok(())
    }

    /// `(_ ...`: indexed operators, FP special constants and `(_ bvK n)`.
    fn open_term_indexed(&mut self) -> Result<()> {
        self.expect_prev_lpar()?;
        let tok = self.read_token()?;
        if tok.tag == Tag::Eof {
            return Err(self.perr(tok.coo, "unexpected end-of-file after '_'".into()));
        }
        match tok.tag {
            Tag::Bv(BvOp::Repeat) => self.open_indexed_parametric(tok, 1, " to close '(_ repeat'"),
            Tag::Bv(BvOp::ZeroExtend) => {
                self.open_indexed_parametric(tok, 1, " to close '(_ zero_extend'")
            }
            Tag::Bv(BvOp::SignExtend) => {
                self.open_indexed_parametric(tok, 1, " to close '(_ sign_extend'")
            }
            Tag::Bv(BvOp::RotateLeft) => {
                self.open_indexed_parametric(tok, 1, " to close '(_ rotate_left'")
            }
            Tag::Bv(BvOp::RotateRight) => {
                self.open_indexed_parametric(tok, 1, " to close '(_ rotate_right'")
            }
            Tag::Bv(BvOp::Extract) => self.open_indexed_parametric(tok, 2, " to close '(_ extract'"),
            Tag::Fp(FpOp::ToFp) => self.open_indexed_parametric(tok, 2, " to close '(_ to_fp'"),
            Tag::Fp(FpOp::ToFpUnsigned) => {
                self.open_indexed_parametric(tok, 2, " to close '(_ to_fp_unsigned'")
            }
            Tag::Fp(FpOp::ToUbv) => self.open_indexed_parametric(tok, 1, " to close '(_ to_ubv'"),
            Tag::Fp(FpOp::ToSbv) => self.open_indexed_parametric(tok, 1, " to close '(_ to_sbv'"),
            Tag::Fp(FpOp::PosZero) => self.open_indexed_fp_const(tok, " to close '(_ +zero'"),
            Tag::Fp(FpOp::NegZero) => self.open_indexed_fp_const(tok, " to close '(_ -zero'"),
            Tag::Fp(FpOp::PosInf) => self.open_indexed_fp_const(tok, " to close '(_ +oo'"),
            Tag::Fp(FpOp::NegInf) => self.open_indexed_fp_const(tok, " to close '(_ -oo'"),
            Tag::Fp(FpOp::NaN) => self.open_indexed_fp_const(tok, " to close '(_ NaN'"),
            Tag::Symbol if is_bvconst_text(self.lexer.text()) => self.open_indexed_bv_const(),
            _ => Err(self.perr(
                tok.coo,
                format!("invalid parametric term '_ {}'", self.lexer.text()),
            )),
        }
    }

    fn check_open_term_indexed(&self, name: &str) -> Result<()> {
        let len = self.work.len();
        if len < 3 {
            return Err(self.perr(
                self.work[0].coo,
                format!("expected '(' before '(_ {name}'"),
            ));
        }
        if !matches!(self.work[len - 3].work, Work::Open) {
            return Err(self.perr(
                self.work[len - 3].coo,
                format!(
                    "expected '(' at '{}' before '(_ {name}'",
                    self.op_display(len - 3)
                ),
            ));
        }
        Ok(())
    }

    /// `(_ op k)` / `(_ op k l)`: read the indices and turn the inner `(`
    /// into the operator frame.
    fn open_indexed_parametric(&mut self, tok: Token, nindices: u32, msg: &str) -> Result<()> {
        let name = self.lexer.text().to_string();
        self.check_open_term_indexed(&name)?;
        let open_idx = self.work.len() - 2;
        if nindices == 1 {
            let num = self.parse_u32(true)?;
            self.work[open_idx].idx0 = num;
        } else {
            let idx0 = self.parse_u32(true)?;
            let first_coo = self.lexer.coo();
            let idx1 = self.parse_u32(true)?;
            if tok.tag == Tag::Bv(BvOp::Extract) && idx0 < idx1 {
                return Err(self.perr(
                    first_coo,
                    format!(
                        "first parameter '{idx0}' of '(_ extract' smaller than second '{idx1}'"
                    ),
                ));
            }
            self.work[open_idx].idx0 = idx0;
            self.work[open_idx].idx1 = idx1;
        }
        self.work[open_idx].work = Work::Op {
            tag: tok.tag,
            sym: tok.sym.expect("indexed operator token"),
        };
        self.work.truncate(open_idx + 1);
        self.read_rpar(msg)?;
        debug_assert!(self.open > 0);
        self.open -= 1;
        Ok(())
    }

    /// `(_ +zero eb sb)` and friends close eagerly to an expression.
    fn open_indexed_fp_const(&mut self, tok: Token, msg: &str) -> Result<()> {
        let open_idx = self.work.len() - 2;
        let eb = self.parse_bit_width()?;
        let sb = self.parse_bit_width()?;
        let exp = match tok.tag {
            Tag::Fp(FpOp::PosZero) => self.backend.fp_pos_zero(eb, sb),
            Tag::Fp(FpOp::NegZero) => self.backend.fp_neg_zero(eb, sb),
            Tag::Fp(FpOp::PosInf) => self.backend.fp_pos_inf(eb, sb),
            Tag::Fp(FpOp::NegInf) => self.backend.fp_neg_inf(eb, sb),
            _ => self.backend.fp_nan(eb, sb),
        };
        self.work[open_idx].work = Work::Expr(exp);
        self.work.truncate(open_idx + 1);
        self.read_rpar(msg)?;
        debug_assert!(self.open > 0);
        self.open -= 1;
        Ok(())
    }

    /// `(_ bvK n)` closes eagerly to a constant of width `n`.
    fn open_indexed_bv_const(&mut self) -> Result<()> {
        let decstr = self.lexer.text()[2..].to_string();
        let mut dec_coo = self.lexer.coo();
        dec_coo.col += 2;
        let width = self.parse_u32(false)? as usize;
        let value = BigUint::parse_bytes(decstr.as_bytes(), 10).expect("decimal digits");
        let bin = value.to_str_radix(2);
        if bin.len() > width {
            return Err(self.perr(
                dec_coo,
                format!(
                    "decimal constant '{decstr}' needs {} bits which exceeds bit-width '{width}'",
                    bin.len()
                ),
            ));
        }
        let bits = format!("{bin:0>width$}");
        let exp = self.backend.bv_const(&bits);
        // the underscore item and the inner '(' collapse to the constant
        let open_idx = self.work.len() - 2;
        debug_assert!(matches!(self.work[open_idx].work, Work::Open));
        self.work[open_idx].work = Work::Expr(exp);
        self.work.truncate(open_idx + 1);
        debug_assert!(self.open > 0);
        self.open -= 1;
        self.read_rpar(" to close '(_ bv..'")?;
        Ok(())
    }

    /// `(as const T)`.
    fn open_term_as(&mut self) -> Result<()> {
        self.expect_prev_lpar()?;
        let name = "as";
        self.check_open_term_indexed(name)?;
        let tok = self.read_token()?;
        if tok.tag == Tag::Eof {
            return Err(self.perr(tok.coo, "unexpected end-of-file after 'as'".into()));
        }
        if tok.tag != Tag::Symbol {
            return Err(self.perr(tok.coo, "expected identifier".into()));
        }
        let identifier = self.lexer.text().to_string();
        if identifier != "const" {
            return Err(self.perr(tok.coo, format!("invalid identifier '{identifier}'")));
        }
        let sort_tok = self.read_token()?;
        let sort = self.parse_sort(sort_tok, true)?;
        let open_idx = self.work.len() - 2;
        self.work[open_idx].work = Work::AsConst(sort);
        self.work.truncate(open_idx + 1);
        self.read_rpar(" to close (as ")?;
        debug_assert!(self.open > 0);
        self.open -= 1;
        Ok(())
    }

    // ---- driver ---------------------------------------------------------

    /// Parse one term; `lookahead` supplies an already-read first token.
    /// Returns the term node (owned by the caller) and its coordinate.
    pub(crate) fn parse_term_with(&mut self, lookahead: Option<Token>) -> Result<(NodeId, Coo)> {
        let work_base = self.work.len();
        self.open = 0;
        let mut la = lookahead;
        loop {
            let tok = match la.take() {
                Some(tok) => tok,
                None => self.read_token()?,
            };
            match tok.tag {
                Tag::Eof => {
                    let unclosed = self.work[work_base..]
                        .iter()
                        .rev()
                        .find(|item| matches!(item.work, Work::Open));
                    return Err(match unclosed {
                        None => {
                            self.perr(tok.coo, "expected expression but reached end-of-file".into())
                        }
                        Some(item) => self.perr(
                            tok.coo,
                            format!(
                                "unexpected end-of-file, '(' at line {} column {} not closed",
                                item.coo.line, item.coo.col
                            ),
                        ),
                    });
                }
                Tag::Rpar => self.close_term()?,
                _ => self.open_term(tok)?,
            }
            if self.open == 0 {
                break;
            }
        }
        if self.work.len() - work_base != 1 {
            return Err(self.perr(
                self.lexer.coo(),
                format!(
                    "internal parse error: worker stack of size {}",
                    self.work.len()
                ),
            ));
        }
        let item = self.work.pop().expect("one work item");
        match item.work {
            Work::Expr(exp) => Ok((exp, item.coo)),
            _ => Err(self.perr(
                item.coo,
                "internal parse error: failed to translate parsed term".into(),
            )),
        }
    }

    /// Parse one term with no lookahead.
    pub(crate) fn parse_term(&mut self) -> Result<(NodeId, Coo)> {
        self.parse_term_with(None)
    }
}

/// `bv` followed by at least one decimal digit.
fn is_bvconst_text(text: &str) -> bool {
    let rest = match text.strip_prefix("bv") {
        Some(rest) => rest,
        None => return false,
    };
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}
