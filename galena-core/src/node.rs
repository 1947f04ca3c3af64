//! Reference [`Backend`] over a hash-consed node store.
//!
//! `NodeBackend` tracks sorts, widths and reference counts exactly the way
//! the front end expects from a real solver, but it does not decide
//! anything: `check-sat` answers whatever has been queued with
//! [`NodeBackend::queue_result`] and falls back to `unknown`. The CLI runs
//! against it for parse-only use, and the test suite uses it as the type
//! oracle for the parser's checks.

use crate::backend::{Backend, NodeId, RoundingMode, SatResult, SortId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SortKind {
    Bv(u32),
    Fp { eb: u32, sb: u32 },
    Rm,
    Array { index: SortId, element: SortId },
    Fun { domain: Vec<SortId>, codomain: SortId },
}

#[derive(Debug)]
struct SortData {
    kind: SortKind,
    refs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Const(String),
    Var,
    Param,
    ArrayVar,
    Uf,
    Rm(RoundingMode),
    App {
        op: &'static str,
        args: SmallVec<[NodeId; 3]>,
        indices: [u32; 2],
        nidx: u8,
    },
    FpFromReal {
        rm: NodeId,
        repr: String,
    },
    Quant {
        forall: bool,
        params: Vec<NodeId>,
        body: NodeId,
    },
    Fun {
        params: Vec<NodeId>,
        body: NodeId,
    },
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    sort: SortId,
    refs: u32,
    symbol: Option<String>,
}

type AppKey = (&'static str, SmallVec<[NodeId; 3]>, [u32; 2], SortId);

/// Reference backend; see the module docs.
pub struct NodeBackend {
    sorts: Vec<SortData>,
    sort_cons: FxHashMap<SortKind, SortId>,
    nodes: Vec<NodeData>,
    app_cons: FxHashMap<AppKey, NodeId>,
    const_cons: FxHashMap<String, NodeId>,
    rm_cons: FxHashMap<RoundingMode, NodeId>,
    decls: Vec<NodeId>,
    asserts: Vec<NodeId>,
    assumptions: Vec<NodeId>,
    failed: Vec<NodeId>,
    frames: Vec<(usize, usize)>,
    options: FxHashMap<String, i64>,
    queued: VecDeque<SatResult>,
    terminated: bool,
}

impl NodeBackend {
    /// A fresh backend with default options.
    pub fn new() -> Self {
        let mut options = FxHashMap::default();
        for name in [
            "incremental",
            "produce-models",
            "declsort-bv-width",
            "global-declarations",
            "seed",
            "verbosity",
        ] {
            options.insert(name.to_string(), 0);
        }
        NodeBackend {
            sorts: Vec::new(),
            sort_cons: FxHashMap::default(),
            nodes: Vec::new(),
            app_cons: FxHashMap::default(),
            const_cons: FxHashMap::default(),
            rm_cons: FxHashMap::default(),
            decls: Vec::new(),
            asserts: Vec::new(),
            assumptions: Vec::new(),
            failed: Vec::new(),
            frames: Vec::new(),
            options,
            queued: VecDeque::new(),
            terminated: false,
        }
    }

    /// Queue the answer for the next `check-sat`.
    pub fn queue_result(&mut self, result: SatResult) {
        self.queued.push_back(result);
    }

    /// Raise the termination flag polled by the parser between commands.
    pub fn set_terminated(&mut self, on: bool) {
        self.terminated = on;
    }

    /// Number of assertions currently on the assertion stack.
    pub fn num_assertions(&self) -> usize {
        self.asserts.len()
    }

    /// Nodes whose reference count never returned to zero. After the parser
    /// has been dropped this must be zero; anything else is a leaked
    /// reference.
    pub fn leaked(&self) -> usize {
        self.nodes.iter().filter(|n| n.refs > 0).count()
    }

    fn sort(&self, id: SortId) -> &SortData {
        &self.sorts[id.0 as usize]
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    fn mk_sort(&mut self, kind: SortKind) -> SortId {
        if let Some(&id) = self.sort_cons.get(&kind) {
            self.sorts[id.0 as usize].refs += 1;
            return id;
        }
        let id = SortId(self.sorts.len() as u64);
        self.sorts.push(SortData { kind: kind.clone(), refs: 1 });
        self.sort_cons.insert(kind, id);
        id
    }

    fn fresh_node(&mut self, kind: NodeKind, sort: SortId) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(NodeData {
            kind,
            sort,
            refs: 1,
            symbol: None,
        });
        id
    }

    fn mk_app(
        &mut self,
        op: &'static str,
        args: &[NodeId],
        indices: [u32; 2],
        nidx: u8,
        sort: SortId,
    ) -> NodeId {
        let key: AppKey = (op, SmallVec::from_slice(args), indices, sort);
        if let Some(&id) = self.app_cons.get(&key) {
            self.nodes[id.0 as usize].refs += 1;
            return id;
        }
        let id = self.fresh_node(
            NodeKind::App {
                op,
                args: SmallVec::from_slice(args),
                indices,
                nidx,
            },
            sort,
        );
        self.app_cons.insert(key, id);
        id
    }

    fn sort_width(&self, sort: SortId) -> u32 {
        match &self.sort(sort).kind {
            SortKind::Bv(w) => *w,
            SortKind::Array { element, .. } => self.sort_width(*element),
            _ => 0,
        }
    }

    fn bool_sort_id(&mut self) -> SortId {
        self.mk_sort(SortKind::Bv(1))
    }

    fn bin_bv(&mut self, op: &'static str, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app(op, &[a, b], [0; 2], 0, sort)
    }

    fn bin_pred(&mut self, op: &'static str, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.bool_sort_id();
        self.mk_app(op, &[a, b], [0; 2], 0, sort)
    }

    fn unary_fp(&mut self, op: &'static str, a: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app(op, &[a], [0; 2], 0, sort)
    }

    fn fp_pred(&mut self, op: &'static str, args: &[NodeId]) -> NodeId {
        let sort = self.bool_sort_id();
        self.mk_app(op, args, [0; 2], 0, sort)
    }

    fn fp_special(&mut self, op: &'static str, eb: u32, sb: u32) -> NodeId {
        let sort = self.mk_sort(SortKind::Fp { eb, sb });
        self.mk_app(op, &[], [eb, sb], 2, sort)
    }

    fn fp_conversion(&mut self, op: &'static str, args: &[NodeId], eb: u32, sb: u32) -> NodeId {
        let sort = self.mk_sort(SortKind::Fp { eb, sb });
        self.mk_app(op, args, [eb, sb], 2, sort)
    }

    fn sort_smt2(&self, sort: SortId) -> String {
        match &self.sort(sort).kind {
            SortKind::Bv(1) => "Bool".to_string(),
            SortKind::Bv(w) => format!("(_ BitVec {w})"),
            SortKind::Fp { eb, sb } => format!("(_ FloatingPoint {eb} {sb})"),
            SortKind::Rm => "RoundingMode".to_string(),
            SortKind::Array { index, element } => format!(
                "(Array {} {})",
                self.sort_smt2(*index),
                self.sort_smt2(*element)
            ),
            SortKind::Fun { domain, codomain } => {
                let mut s = String::from("(->");
                for d in domain {
                    s.push(' ');
                    s.push_str(&self.sort_smt2(*d));
                }
                s.push(' ');
                s.push_str(&self.sort_smt2(*codomain));
                s.push(')');
                s
            }
        }
    }
}

impl Default for NodeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for NodeBackend {
    fn bool_sort(&mut self) -> SortId {
        self.bool_sort_id()
    }

    fn bv_sort(&mut self, width: u32) -> SortId {
        self.mk_sort(SortKind::Bv(width))
    }

    fn fp_sort(&mut self, eb: u32, sb: u32) -> SortId {
        self.mk_sort(SortKind::Fp { eb, sb })
    }

    fn rm_sort(&mut self) -> SortId {
        self.mk_sort(SortKind::Rm)
    }

    fn array_sort(&mut self, index: SortId, element: SortId) -> SortId {
        self.mk_sort(SortKind::Array { index, element })
    }

    fn fun_sort(&mut self, domain: &[SortId], codomain: SortId) -> SortId {
        self.mk_sort(SortKind::Fun {
            domain: domain.to_vec(),
            codomain,
        })
    }

    fn release_sort(&mut self, sort: SortId) {
        let data = &mut self.sorts[sort.0 as usize];
        data.refs = data.refs.saturating_sub(1);
    }

    fn is_bv_sort(&self, sort: SortId) -> bool {
        matches!(self.sort(sort).kind, SortKind::Bv(_))
    }

    fn is_array_sort(&self, sort: SortId) -> bool {
        matches!(self.sort(sort).kind, SortKind::Array { .. })
    }

    fn is_fun_sort(&self, sort: SortId) -> bool {
        matches!(self.sort(sort).kind, SortKind::Fun { .. })
    }

    fn sort_of(&self, node: NodeId) -> SortId {
        self.node(node).sort
    }

    fn is_array(&self, node: NodeId) -> bool {
        self.is_array_sort(self.node(node).sort)
    }

    fn is_fun(&self, node: NodeId) -> bool {
        self.is_fun_sort(self.node(node).sort)
    }

    fn is_fp(&self, node: NodeId) -> bool {
        matches!(self.sort(self.node(node).sort).kind, SortKind::Fp { .. })
    }

    fn is_rm(&self, node: NodeId) -> bool {
        matches!(self.sort(self.node(node).sort).kind, SortKind::Rm)
    }

    fn is_bv_const(&self, node: NodeId) -> bool {
        matches!(self.node(node).kind, NodeKind::Const(_))
    }

    fn bv_width(&self, node: NodeId) -> u32 {
        self.sort_width(self.node(node).sort)
    }

    fn index_width(&self, node: NodeId) -> u32 {
        match &self.sort(self.node(node).sort).kind {
            SortKind::Array { index, .. } => self.sort_width(*index),
            _ => 0,
        }
    }

    fn fun_arity(&self, node: NodeId) -> u32 {
        match &self.sort(self.node(node).sort).kind {
            SortKind::Fun { domain, .. } => domain.len() as u32,
            _ => 0,
        }
    }

    fn codomain_sort(&self, node: NodeId) -> SortId {
        match &self.sort(self.node(node).sort).kind {
            SortKind::Fun { codomain, .. } => *codomain,
            _ => self.node(node).sort,
        }
    }

    fn equal_sorts(&self, a: NodeId, b: NodeId) -> bool {
        self.node(a).sort == self.node(b).sort
    }

    fn const_bits(&self, node: NodeId) -> Option<String> {
        match &self.node(node).kind {
            NodeKind::Const(bits) => Some(bits.clone()),
            _ => None,
        }
    }

    fn symbol_of(&self, node: NodeId) -> Option<String> {
        self.node(node).symbol.clone()
    }

    fn set_symbol(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0 as usize].symbol = Some(name.to_string());
    }

    fn copy(&mut self, node: NodeId) -> NodeId {
        self.nodes[node.0 as usize].refs += 1;
        node
    }

    fn release(&mut self, node: NodeId) {
        let data = &mut self.nodes[node.0 as usize];
        debug_assert!(data.refs > 0, "released a dead node");
        data.refs = data.refs.saturating_sub(1);
    }

    fn true_node(&mut self) -> NodeId {
        self.bv_const("1")
    }

    fn false_node(&mut self) -> NodeId {
        self.bv_const("0")
    }

    fn bv_const(&mut self, bits: &str) -> NodeId {
        if let Some(&id) = self.const_cons.get(bits) {
            self.nodes[id.0 as usize].refs += 1;
            return id;
        }
        let sort = self.mk_sort(SortKind::Bv(bits.len() as u32));
        let id = self.fresh_node(NodeKind::Const(bits.to_string()), sort);
        self.const_cons.insert(bits.to_string(), id);
        id
    }

    fn zero(&mut self, sort: SortId) -> NodeId {
        let width = self.sort_width(sort) as usize;
        self.bv_const(&"0".repeat(width.max(1)))
    }

    fn var(&mut self, sort: SortId, symbol: Option<&str>) -> NodeId {
        let id = self.fresh_node(NodeKind::Var, sort);
        self.nodes[id.0 as usize].symbol = symbol.map(str::to_string);
        self.decls.push(id);
        id
    }

    fn param(&mut self, sort: SortId, symbol: &str) -> NodeId {
        let id = self.fresh_node(NodeKind::Param, sort);
        self.nodes[id.0 as usize].symbol = Some(symbol.to_string());
        id
    }

    fn array_var(&mut self, sort: SortId, symbol: &str) -> NodeId {
        let id = self.fresh_node(NodeKind::ArrayVar, sort);
        self.nodes[id.0 as usize].symbol = Some(symbol.to_string());
        self.decls.push(id);
        id
    }

    fn uf(&mut self, sort: SortId, symbol: &str) -> NodeId {
        let id = self.fresh_node(NodeKind::Uf, sort);
        self.nodes[id.0 as usize].symbol = Some(symbol.to_string());
        self.decls.push(id);
        id
    }

    fn const_array(&mut self, sort: SortId, value: NodeId) -> NodeId {
        self.mk_app("as-const", &[value], [0; 2], 0, sort)
    }

    fn rm_const(&mut self, rm: RoundingMode) -> NodeId {
        if let Some(&id) = self.rm_cons.get(&rm) {
            self.nodes[id.0 as usize].refs += 1;
            return id;
        }
        let sort = self.mk_sort(SortKind::Rm);
        let id = self.fresh_node(NodeKind::Rm(rm), sort);
        self.rm_cons.insert(rm, id);
        id
    }

    fn not(&mut self, a: NodeId) -> NodeId {
        let sort = self.bool_sort_id();
        self.mk_app("not", &[a], [0; 2], 0, sort)
    }

    fn and(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("and", a, b)
    }

    fn or(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("or", a, b)
    }

    fn implies(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("=>", a, b)
    }

    fn eq(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("=", a, b)
    }

    fn ne(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("distinct", a, b)
    }

    fn cond(&mut self, c: NodeId, t: NodeId, e: NodeId) -> NodeId {
        let sort = self.node(t).sort;
        self.mk_app("ite", &[c, t, e], [0; 2], 0, sort)
    }

    fn bv_not(&mut self, a: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("bvnot", &[a], [0; 2], 0, sort)
    }

    fn bv_neg(&mut self, a: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("bvneg", &[a], [0; 2], 0, sort)
    }

    fn bv_redor(&mut self, a: NodeId) -> NodeId {
        let sort = self.bool_sort_id();
        self.mk_app("bvredor", &[a], [0; 2], 0, sort)
    }

    fn bv_redand(&mut self, a: NodeId) -> NodeId {
        let sort = self.bool_sort_id();
        self.mk_app("bvredand", &[a], [0; 2], 0, sort)
    }

    fn bv_and(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvand", a, b)
    }

    fn bv_or(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvor", a, b)
    }

    fn bv_xor(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvxor", a, b)
    }

    fn bv_nand(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvnand", a, b)
    }

    fn bv_nor(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvnor", a, b)
    }

    fn bv_add(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvadd", a, b)
    }

    fn bv_sub(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvsub", a, b)
    }

    fn bv_mul(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvmul", a, b)
    }

    fn bv_udiv(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvudiv", a, b)
    }

    fn bv_urem(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvurem", a, b)
    }

    fn bv_sdiv(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvsdiv", a, b)
    }

    fn bv_srem(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvsrem", a, b)
    }

    fn bv_smod(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvsmod", a, b)
    }

    fn bv_shl(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvshl", a, b)
    }

    fn bv_lshr(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvlshr", a, b)
    }

    fn bv_ashr(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_bv("bvashr", a, b)
    }

    fn concat(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let width = self.bv_width(a) + self.bv_width(b);
        let sort = self.mk_sort(SortKind::Bv(width));
        self.mk_app("concat", &[a, b], [0; 2], 0, sort)
    }

    fn bv_ult(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("bvult", a, b)
    }

    fn bv_ulte(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("bvule", a, b)
    }

    fn bv_ugt(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("bvugt", a, b)
    }

    fn bv_ugte(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("bvuge", a, b)
    }

    fn bv_slt(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("bvslt", a, b)
    }

    fn bv_slte(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("bvsle", a, b)
    }

    fn bv_sgt(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("bvsgt", a, b)
    }

    fn bv_sgte(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.bin_pred("bvsge", a, b)
    }

    fn bv_slice(&mut self, a: NodeId, hi: u32, lo: u32) -> NodeId {
        let sort = self.mk_sort(SortKind::Bv(hi - lo + 1));
        self.mk_app("extract", &[a], [hi, lo], 2, sort)
    }

    fn bv_uext(&mut self, a: NodeId, k: u32) -> NodeId {
        let sort_width = self.bv_width(a) + k;
        let sort = self.mk_sort(SortKind::Bv(sort_width));
        self.mk_app("zero_extend", &[a], [k, 0], 1, sort)
    }

    fn bv_sext(&mut self, a: NodeId, k: u32) -> NodeId {
        let sort_width = self.bv_width(a) + k;
        let sort = self.mk_sort(SortKind::Bv(sort_width));
        self.mk_app("sign_extend", &[a], [k, 0], 1, sort)
    }

    fn bv_repeat(&mut self, a: NodeId, k: u32) -> NodeId {
        let sort_width = self.bv_width(a) * k;
        let sort = self.mk_sort(SortKind::Bv(sort_width));
        self.mk_app("repeat", &[a], [k, 0], 1, sort)
    }

    fn bv_roli(&mut self, a: NodeId, k: u32) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("rotate_left", &[a], [k, 0], 1, sort)
    }

    fn bv_rori(&mut self, a: NodeId, k: u32) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("rotate_right", &[a], [k, 0], 1, sort)
    }

    fn read(&mut self, array: NodeId, index: NodeId) -> NodeId {
        let element = match &self.sort(self.node(array).sort).kind {
            SortKind::Array { element, .. } => *element,
            _ => self.node(array).sort,
        };
        self.mk_app("select", &[array, index], [0; 2], 0, element)
    }

    fn write(&mut self, array: NodeId, index: NodeId, value: NodeId) -> NodeId {
        let sort = self.node(array).sort;
        self.mk_app("store", &[array, index, value], [0; 2], 0, sort)
    }

    fn fun(&mut self, params: &[NodeId], body: NodeId) -> NodeId {
        let domain: Vec<SortId> = params.iter().map(|&p| self.node(p).sort).collect();
        let codomain = self.node(body).sort;
        let sort = self.mk_sort(SortKind::Fun { domain, codomain });
        self.fresh_node(
            NodeKind::Fun {
                params: params.to_vec(),
                body,
            },
            sort,
        )
    }

    fn apply(&mut self, args: &[NodeId], fun: NodeId) -> NodeId {
        let sort = self.codomain_sort(fun);
        let mut all: SmallVec<[NodeId; 3]> = SmallVec::from_slice(args);
        all.push(fun);
        self.mk_app("apply", &all, [0; 2], 0, sort)
    }

    fn fun_sort_check(&self, args: &[NodeId], fun: NodeId) -> Option<u32> {
        let SortKind::Fun { domain, .. } = &self.sort(self.node(fun).sort).kind else {
            return Some(0);
        };
        for (i, (&arg, &expected)) in args.iter().zip(domain.iter()).enumerate() {
            if self.node(arg).sort != expected {
                return Some(i as u32);
            }
        }
        None
    }

    fn forall(&mut self, params: &[NodeId], body: NodeId) -> NodeId {
        let sort = self.bool_sort_id();
        self.fresh_node(
            NodeKind::Quant {
                forall: true,
                params: params.to_vec(),
                body,
            },
            sort,
        )
    }

    fn exists(&mut self, params: &[NodeId], body: NodeId) -> NodeId {
        let sort = self.bool_sort_id();
        self.fresh_node(
            NodeKind::Quant {
                forall: false,
                params: params.to_vec(),
                body,
            },
            sort,
        )
    }

    fn fp_pos_zero(&mut self, eb: u32, sb: u32) -> NodeId {
        self.fp_special("+zero", eb, sb)
    }

    fn fp_neg_zero(&mut self, eb: u32, sb: u32) -> NodeId {
        self.fp_special("-zero", eb, sb)
    }

    fn fp_pos_inf(&mut self, eb: u32, sb: u32) -> NodeId {
        self.fp_special("+oo", eb, sb)
    }

    fn fp_neg_inf(&mut self, eb: u32, sb: u32) -> NodeId {
        self.fp_special("-oo", eb, sb)
    }

    fn fp_nan(&mut self, eb: u32, sb: u32) -> NodeId {
        self.fp_special("NaN", eb, sb)
    }

    fn fp_value(&mut self, sign: NodeId, exp: NodeId, sig: NodeId) -> NodeId {
        let eb = self.bv_width(exp);
        let sb = self.bv_width(sig) + 1;
        let sort = self.mk_sort(SortKind::Fp { eb, sb });
        self.mk_app("fp", &[sign, exp, sig], [0; 2], 0, sort)
    }

    fn fp_abs(&mut self, a: NodeId) -> NodeId {
        self.unary_fp("fp.abs", a)
    }

    fn fp_neg(&mut self, a: NodeId) -> NodeId {
        self.unary_fp("fp.neg", a)
    }

    fn fp_add(&mut self, rm: NodeId, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.add", &[rm, a, b], [0; 2], 0, sort)
    }

    fn fp_sub(&mut self, rm: NodeId, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.sub", &[rm, a, b], [0; 2], 0, sort)
    }

    fn fp_mul(&mut self, rm: NodeId, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.mul", &[rm, a, b], [0; 2], 0, sort)
    }

    fn fp_div(&mut self, rm: NodeId, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.div", &[rm, a, b], [0; 2], 0, sort)
    }

    fn fp_fma(&mut self, rm: NodeId, a: NodeId, b: NodeId, c: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.fma", &[rm, a, b, c], [0; 2], 0, sort)
    }

    fn fp_sqrt(&mut self, rm: NodeId, a: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.sqrt", &[rm, a], [0; 2], 0, sort)
    }

    fn fp_rem(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.rem", &[a, b], [0; 2], 0, sort)
    }

    fn fp_round_to_int(&mut self, rm: NodeId, a: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.roundToIntegral", &[rm, a], [0; 2], 0, sort)
    }

    fn fp_min(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.min", &[a, b], [0; 2], 0, sort)
    }

    fn fp_max(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let sort = self.node(a).sort;
        self.mk_app("fp.max", &[a, b], [0; 2], 0, sort)
    }

    fn fp_leq(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.fp_pred("fp.leq", &[a, b])
    }

    fn fp_lt(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.fp_pred("fp.lt", &[a, b])
    }

    fn fp_geq(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.fp_pred("fp.geq", &[a, b])
    }

    fn fp_gt(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.fp_pred("fp.gt", &[a, b])
    }

    fn fp_eq(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.fp_pred("fp.eq", &[a, b])
    }

    fn fp_is_normal(&mut self, a: NodeId) -> NodeId {
        self.fp_pred("fp.isNormal", &[a])
    }

    fn fp_is_subnormal(&mut self, a: NodeId) -> NodeId {
        self.fp_pred("fp.isSubnormal", &[a])
    }

    fn fp_is_zero(&mut self, a: NodeId) -> NodeId {
        self.fp_pred("fp.isZero", &[a])
    }

    fn fp_is_inf(&mut self, a: NodeId) -> NodeId {
        self.fp_pred("fp.isInfinite", &[a])
    }

    fn fp_is_nan(&mut self, a: NodeId) -> NodeId {
        self.fp_pred("fp.isNaN", &[a])
    }

    fn fp_is_neg(&mut self, a: NodeId) -> NodeId {
        self.fp_pred("fp.isNegative", &[a])
    }

    fn fp_is_pos(&mut self, a: NodeId) -> NodeId {
        self.fp_pred("fp.isPositive", &[a])
    }

    fn fp_from_bv(&mut self, a: NodeId, eb: u32, sb: u32) -> NodeId {
        self.fp_conversion("to_fp", &[a], eb, sb)
    }

    fn fp_from_fp(&mut self, rm: NodeId, a: NodeId, eb: u32, sb: u32) -> NodeId {
        self.fp_conversion("to_fp", &[rm, a], eb, sb)
    }

    fn fp_from_sbv(&mut self, rm: NodeId, a: NodeId, eb: u32, sb: u32) -> NodeId {
        self.fp_conversion("to_fp", &[rm, a], eb, sb)
    }

    fn fp_from_ubv(&mut self, rm: NodeId, a: NodeId, eb: u32, sb: u32) -> NodeId {
        self.fp_conversion("to_fp_unsigned", &[rm, a], eb, sb)
    }

    fn fp_from_real(&mut self, rm: NodeId, repr: &str, eb: u32, sb: u32) -> NodeId {
        let sort = self.mk_sort(SortKind::Fp { eb, sb });
        self.fresh_node(
            NodeKind::FpFromReal {
                rm,
                repr: repr.to_string(),
            },
            sort,
        )
    }

    fn fp_to_ubv(&mut self, rm: NodeId, a: NodeId, width: u32) -> NodeId {
        let sort = self.mk_sort(SortKind::Bv(width));
        self.mk_app("to_ubv", &[rm, a], [width, 0], 1, sort)
    }

    fn fp_to_sbv(&mut self, rm: NodeId, a: NodeId, width: u32) -> NodeId {
        let sort = self.mk_sort(SortKind::Bv(width));
        self.mk_app("to_sbv", &[rm, a], [width, 0], 1, sort)
    }

    fn assert_formula(&mut self, node: NodeId) {
        self.asserts.push(node);
    }

    fn assume(&mut self, node: NodeId) {
        self.assumptions.push(node);
    }

    fn push(&mut self, n: u32) {
        for _ in 0..n {
            self.frames.push((self.asserts.len(), self.decls.len()));
        }
    }

    fn pop(&mut self, n: u32) {
        // with :global-declarations, popped scopes keep their declarations,
        // matching the front end's symbol-table behavior
        let keep_decls = self.options.get("global-declarations").copied().unwrap_or(0) != 0;
        for _ in 0..n {
            if let Some((asserts, decls)) = self.frames.pop() {
                self.asserts.truncate(asserts);
                if !keep_decls {
                    self.decls.truncate(decls);
                }
            }
        }
    }

    fn check_sat(&mut self) -> SatResult {
        let result = self.queued.pop_front().unwrap_or(SatResult::Unknown);
        self.failed = if result == SatResult::Unsat {
            std::mem::take(&mut self.assumptions)
        } else {
            self.assumptions.clear();
            Vec::new()
        };
        result
    }

    fn failed_assumptions(&self) -> Vec<NodeId> {
        self.failed.clone()
    }

    fn terminate(&self) -> bool {
        self.terminated
    }

    fn set_option(&mut self, name: &str, value: i64) -> bool {
        if self.options.contains_key(name) {
            self.options.insert(name.to_string(), value);
            true
        } else {
            false
        }
    }

    fn get_option(&self, name: &str) -> Option<i64> {
        self.options.get(name).copied()
    }

    fn value_smt2(&self, node: NodeId) -> String {
        match &self.node(node).kind {
            NodeKind::Const(bits) => format!("#b{bits}"),
            NodeKind::Rm(rm) => rm.smt2_name().to_string(),
            _ => {
                let width = self.bv_width(node).max(1) as usize;
                format!("#b{}", "0".repeat(width))
            }
        }
    }

    fn node_smt2(&self, node: NodeId) -> String {
        let data = self.node(node);
        if let Some(symbol) = &data.symbol {
            return symbol.clone();
        }
        match &data.kind {
            NodeKind::Const(bits) => format!("#b{bits}"),
            NodeKind::Rm(rm) => rm.smt2_name().to_string(),
            NodeKind::Var | NodeKind::Param | NodeKind::ArrayVar | NodeKind::Uf => {
                format!("$e{}", node.0)
            }
            NodeKind::App {
                op,
                args,
                indices,
                nidx,
            } => {
                let mut s = String::from("(");
                if *nidx > 0 {
                    s.push_str("(_ ");
                    s.push_str(op);
                    for idx in &indices[..*nidx as usize] {
                        s.push_str(&format!(" {idx}"));
                    }
                    s.push(')');
                } else {
                    s.push_str(op);
                }
                for &arg in args {
                    s.push(' ');
                    s.push_str(&self.node_smt2(arg));
                }
                s.push(')');
                s
            }
            NodeKind::FpFromReal { rm, repr } => {
                let (eb, sb) = match self.sort(data.sort).kind {
                    SortKind::Fp { eb, sb } => (eb, sb),
                    _ => (0, 0),
                };
                format!("((_ to_fp {eb} {sb}) {} {repr})", self.node_smt2(*rm))
            }
            NodeKind::Quant {
                forall,
                params,
                body,
            } => {
                let word = if *forall { "forall" } else { "exists" };
                let mut s = format!("({word} (");
                for (i, &p) in params.iter().enumerate() {
                    if i > 0 {
                        s.push(' ');
                    }
                    s.push('(');
                    s.push_str(&self.node_smt2(p));
                    s.push(' ');
                    s.push_str(&self.sort_smt2(self.node(p).sort));
                    s.push(')');
                }
                s.push_str(") ");
                s.push_str(&self.node_smt2(*body));
                s.push(')');
                s
            }
            NodeKind::Fun { params, body } => {
                let mut s = String::from("(lambda (");
                for (i, &p) in params.iter().enumerate() {
                    if i > 0 {
                        s.push(' ');
                    }
                    s.push_str(&self.node_smt2(p));
                }
                s.push_str(") ");
                s.push_str(&self.node_smt2(*body));
                s.push(')');
                s
            }
        }
    }

    fn print_model(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "(")?;
        for &decl in &self.decls {
            let data = self.node(decl);
            let Some(symbol) = &data.symbol else { continue };
            writeln!(
                out,
                "  (define-fun {symbol} () {} {})",
                self.sort_smt2(data.sort),
                self.value_smt2(decl)
            )?;
        }
        writeln!(out, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        let mut b = NodeBackend::new();
        let c = b.bv_const("10110");
        assert_eq!(b.bv_width(c), 5);
        let s = b.bv_sort(8);
        let v = b.var(s, Some("x"));
        let hi = b.bv_slice(v, 6, 2);
        assert_eq!(b.bv_width(hi), 5);
        let cat = b.concat(c, hi);
        assert_eq!(b.bv_width(cat), 10);
        let e = b.bv_uext(cat, 6);
        assert_eq!(b.bv_width(e), 16);
    }

    #[test]
    fn array_sorts() {
        let mut b = NodeBackend::new();
        let idx = b.bv_sort(8);
        let elem = b.bv_sort(32);
        let asort = b.array_sort(idx, elem);
        let a = b.array_var(asort, "a");
        assert!(b.is_array(a));
        assert_eq!(b.index_width(a), 8);
        assert_eq!(b.bv_width(a), 32);
    }

    #[test]
    fn refcounts_balance() {
        let mut b = NodeBackend::new();
        let s = b.bv_sort(4);
        let v = b.var(s, Some("x"));
        let w = b.copy(v);
        assert_eq!(v, w);
        b.release(v);
        b.release(w);
        assert_eq!(b.leaked(), 0);
    }

    #[test]
    fn consing_shares_nodes() {
        let mut b = NodeBackend::new();
        let x = b.bv_const("01");
        let y = b.bv_const("01");
        assert_eq!(x, y);
        b.release(x);
        b.release(y);
        assert_eq!(b.leaked(), 0);
    }

    #[test]
    fn queued_results_and_failed_assumptions() {
        let mut b = NodeBackend::new();
        assert_eq!(b.check_sat(), SatResult::Unknown);
        b.queue_result(SatResult::Unsat);
        let p = b.bv_const("1");
        b.assume(p);
        assert_eq!(b.check_sat(), SatResult::Unsat);
        assert_eq!(b.failed_assumptions(), vec![p]);
    }

    #[test]
    fn push_pop_restores_assertions() {
        let mut b = NodeBackend::new();
        let t = b.true_node();
        b.assert_formula(t);
        b.push(1);
        let f = b.false_node();
        b.assert_formula(f);
        assert_eq!(b.num_assertions(), 2);
        b.pop(1);
        assert_eq!(b.num_assertions(), 1);
    }

    #[test]
    fn pop_keeps_declarations_with_global_declarations() {
        let mut b = NodeBackend::new();
        assert!(b.set_option("global-declarations", 1));
        b.push(1);
        let sort = b.bv_sort(4);
        b.var(sort, Some("g"));
        b.pop(1);
        let mut out = Vec::new();
        b.print_model(&mut out).unwrap();
        let model = String::from_utf8(out).unwrap();
        assert!(
            model.contains("(define-fun g () (_ BitVec 4) #b0000)"),
            "got: {model}"
        );
    }

    #[test]
    fn node_rendering() {
        let mut b = NodeBackend::new();
        let s = b.bv_sort(1);
        let p = b.var(s, Some("p"));
        let np = b.bv_not(p);
        assert_eq!(b.node_smt2(np), "(bvnot p)");
        let sl = b.bv_slice(p, 0, 0);
        assert_eq!(b.node_smt2(sl), "((_ extract 0 0) p)");
    }
}
