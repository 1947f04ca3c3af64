//! The solver capability consumed by the front end.
//!
//! The parser never looks inside terms or sorts; it drives an opaque
//! [`Backend`] through this trait and only ever holds [`NodeId`] /
//! [`SortId`] handles. Nodes are reference counted by the backend: every
//! constructor and [`Backend::copy`] grant the caller one reference, and the
//! parser pairs each with a [`Backend::release`] when a work-stack item is
//! dropped, a shadowed symbol is removed, a scope closes, or the parser is
//! torn down.

use std::io;

/// Opaque handle to a term node owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Opaque handle to a sort owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortId(pub u64);

/// Result of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SatResult {
    /// The assertions are satisfiable.
    Sat,
    /// The assertions are unsatisfiable.
    Unsat,
    /// The backend could not decide.
    #[default]
    Unknown,
}

impl std::fmt::Display for SatResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SatResult::Sat => "sat",
            SatResult::Unsat => "unsat",
            SatResult::Unknown => "unknown",
        })
    }
}

/// IEEE 754 rounding modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RoundingMode {
    Rne,
    Rna,
    Rtp,
    Rtn,
    Rtz,
}

impl RoundingMode {
    /// The SMT-LIB short name.
    pub fn smt2_name(self) -> &'static str {
        match self {
            RoundingMode::Rne => "RNE",
            RoundingMode::Rna => "RNA",
            RoundingMode::Rtp => "RTP",
            RoundingMode::Rtn => "RTN",
            RoundingMode::Rtz => "RTZ",
        }
    }
}

/// The term/sort construction API of the solver.
///
/// The trait is object safe; the parser holds a `&mut dyn Backend` for the
/// duration of one parse session. All calls are synchronous.
pub trait Backend {
    // ---- sorts ----------------------------------------------------------

    /// The Boolean sort (a 1-bit bit-vector for this solver family).
    fn bool_sort(&mut self) -> SortId;
    /// `(_ BitVec width)`, `width >= 1`.
    fn bv_sort(&mut self, width: u32) -> SortId;
    /// `(_ FloatingPoint eb sb)`.
    fn fp_sort(&mut self, eb: u32, sb: u32) -> SortId;
    /// The `RoundingMode` sort.
    fn rm_sort(&mut self) -> SortId;
    /// `(Array index element)`.
    fn array_sort(&mut self, index: SortId, element: SortId) -> SortId;
    /// An uninterpreted-function sort.
    fn fun_sort(&mut self, domain: &[SortId], codomain: SortId) -> SortId;
    /// Release one reference to a sort handle.
    fn release_sort(&mut self, sort: SortId);
    /// True if `sort` is a bit-vector sort.
    fn is_bv_sort(&self, sort: SortId) -> bool;
    /// True if `sort` is an array sort.
    fn is_array_sort(&self, sort: SortId) -> bool;
    /// True if `sort` is a function sort.
    fn is_fun_sort(&self, sort: SortId) -> bool;

    // ---- node queries ---------------------------------------------------

    /// The sort of a node.
    fn sort_of(&self, node: NodeId) -> SortId;
    /// True if the node is an array term.
    fn is_array(&self, node: NodeId) -> bool;
    /// True if the node is a function term.
    fn is_fun(&self, node: NodeId) -> bool;
    /// True if the node is a floating-point term.
    fn is_fp(&self, node: NodeId) -> bool;
    /// True if the node is a rounding-mode term.
    fn is_rm(&self, node: NodeId) -> bool;
    /// True if the node is a bit-vector constant.
    fn is_bv_const(&self, node: NodeId) -> bool;
    /// Bit-width of a bit-vector node; element width for arrays.
    fn bv_width(&self, node: NodeId) -> u32;
    /// Index bit-width of an array node.
    fn index_width(&self, node: NodeId) -> u32;
    /// Arity of a function node.
    fn fun_arity(&self, node: NodeId) -> u32;
    /// Codomain sort of a function node.
    fn codomain_sort(&self, node: NodeId) -> SortId;
    /// True if two nodes have equal sorts.
    fn equal_sorts(&self, a: NodeId, b: NodeId) -> bool;
    /// The bits of a bit-vector constant, most significant first.
    fn const_bits(&self, node: NodeId) -> Option<String>;
    /// The symbol attached to a node, if any.
    fn symbol_of(&self, node: NodeId) -> Option<String>;
    /// Attach a symbol to a node (used by `:named` annotations).
    fn set_symbol(&mut self, node: NodeId, name: &str);

    // ---- reference counting --------------------------------------------

    /// Take an additional reference to a node.
    fn copy(&mut self, node: NodeId) -> NodeId;
    /// Release one reference to a node.
    fn release(&mut self, node: NodeId);

    // ---- leaf constructors ---------------------------------------------

    /// The constant `true` (1-bit vector `1`).
    fn true_node(&mut self) -> NodeId;
    /// The constant `false` (1-bit vector `0`).
    fn false_node(&mut self) -> NodeId;
    /// A bit-vector constant from its binary digits, most significant first.
    fn bv_const(&mut self, bits: &str) -> NodeId;
    /// The all-zero value of a bit-vector sort.
    fn zero(&mut self, sort: SortId) -> NodeId;
    /// A fresh variable.
    fn var(&mut self, sort: SortId, symbol: Option<&str>) -> NodeId;
    /// A fresh bound parameter (quantifier or function-definition argument).
    fn param(&mut self, sort: SortId, symbol: &str) -> NodeId;
    /// A fresh array variable; `sort` must be an array sort.
    fn array_var(&mut self, sort: SortId, symbol: &str) -> NodeId;
    /// A fresh uninterpreted function; `sort` must be a function sort.
    fn uf(&mut self, sort: SortId, symbol: &str) -> NodeId;
    /// A constant array of the given array sort with element `value`.
    fn const_array(&mut self, sort: SortId, value: NodeId) -> NodeId;
    /// A rounding-mode constant.
    fn rm_const(&mut self, rm: RoundingMode) -> NodeId;

    // ---- core -----------------------------------------------------------

    /// Boolean negation.
    fn not(&mut self, a: NodeId) -> NodeId;
    /// Boolean conjunction.
    fn and(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Boolean disjunction.
    fn or(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Boolean implication.
    fn implies(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Equality (any matching sorts, including arrays and functions).
    fn eq(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Disequality.
    fn ne(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// If-then-else on a 1-bit condition.
    fn cond(&mut self, c: NodeId, t: NodeId, e: NodeId) -> NodeId;

    // ---- bit-vectors ----------------------------------------------------

    /// Bit-wise negation.
    fn bv_not(&mut self, a: NodeId) -> NodeId;
    /// Two's-complement negation.
    fn bv_neg(&mut self, a: NodeId) -> NodeId;
    /// Or-reduction to one bit.
    fn bv_redor(&mut self, a: NodeId) -> NodeId;
    /// And-reduction to one bit.
    fn bv_redand(&mut self, a: NodeId) -> NodeId;
    /// Bit-wise and.
    fn bv_and(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Bit-wise or.
    fn bv_or(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Bit-wise xor.
    fn bv_xor(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Bit-wise nand.
    fn bv_nand(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Bit-wise nor.
    fn bv_nor(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Addition.
    fn bv_add(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Subtraction.
    fn bv_sub(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Multiplication.
    fn bv_mul(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Unsigned division.
    fn bv_udiv(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Unsigned remainder.
    fn bv_urem(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Signed division.
    fn bv_sdiv(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Signed remainder.
    fn bv_srem(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Signed modulo.
    fn bv_smod(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Shift left.
    fn bv_shl(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Logical shift right.
    fn bv_lshr(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Arithmetic shift right.
    fn bv_ashr(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Concatenation.
    fn concat(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Unsigned less-than.
    fn bv_ult(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Unsigned less-or-equal.
    fn bv_ulte(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Unsigned greater-than.
    fn bv_ugt(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Unsigned greater-or-equal.
    fn bv_ugte(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Signed less-than.
    fn bv_slt(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Signed less-or-equal.
    fn bv_slte(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Signed greater-than.
    fn bv_sgt(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Signed greater-or-equal.
    fn bv_sgte(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Bit slice `[hi:lo]`.
    fn bv_slice(&mut self, a: NodeId, hi: u32, lo: u32) -> NodeId;
    /// Zero extension by `k` bits.
    fn bv_uext(&mut self, a: NodeId, k: u32) -> NodeId;
    /// Sign extension by `k` bits.
    fn bv_sext(&mut self, a: NodeId, k: u32) -> NodeId;
    /// Repetition `k` times.
    fn bv_repeat(&mut self, a: NodeId, k: u32) -> NodeId;
    /// Rotate left by a fixed amount.
    fn bv_roli(&mut self, a: NodeId, k: u32) -> NodeId;
    /// Rotate right by a fixed amount.
    fn bv_rori(&mut self, a: NodeId, k: u32) -> NodeId;

    // ---- arrays ---------------------------------------------------------

    /// Array read.
    fn read(&mut self, array: NodeId, index: NodeId) -> NodeId;
    /// Array write.
    fn write(&mut self, array: NodeId, index: NodeId, value: NodeId) -> NodeId;

    // ---- functions ------------------------------------------------------

    /// A function abstraction over `params` with the given body.
    fn fun(&mut self, params: &[NodeId], body: NodeId) -> NodeId;
    /// Function application.
    fn apply(&mut self, args: &[NodeId], fun: NodeId) -> NodeId;
    /// Check argument sorts against a function's domain; returns the index
    /// of the first mismatching argument.
    fn fun_sort_check(&self, args: &[NodeId], fun: NodeId) -> Option<u32>;

    // ---- quantifiers ----------------------------------------------------

    /// Universal quantification.
    fn forall(&mut self, params: &[NodeId], body: NodeId) -> NodeId;
    /// Existential quantification.
    fn exists(&mut self, params: &[NodeId], body: NodeId) -> NodeId;

    // ---- floating point -------------------------------------------------

    /// `(_ +zero eb sb)`.
    fn fp_pos_zero(&mut self, eb: u32, sb: u32) -> NodeId;
    /// `(_ -zero eb sb)`.
    fn fp_neg_zero(&mut self, eb: u32, sb: u32) -> NodeId;
    /// `(_ +oo eb sb)`.
    fn fp_pos_inf(&mut self, eb: u32, sb: u32) -> NodeId;
    /// `(_ -oo eb sb)`.
    fn fp_neg_inf(&mut self, eb: u32, sb: u32) -> NodeId;
    /// `(_ NaN eb sb)`.
    fn fp_nan(&mut self, eb: u32, sb: u32) -> NodeId;
    /// `(fp sign exponent significand)` from three bit-vector constants.
    fn fp_value(&mut self, sign: NodeId, exp: NodeId, sig: NodeId) -> NodeId;
    /// Absolute value.
    fn fp_abs(&mut self, a: NodeId) -> NodeId;
    /// Negation.
    fn fp_neg(&mut self, a: NodeId) -> NodeId;
    /// Addition under a rounding mode.
    fn fp_add(&mut self, rm: NodeId, a: NodeId, b: NodeId) -> NodeId;
    /// Subtraction under a rounding mode.
    fn fp_sub(&mut self, rm: NodeId, a: NodeId, b: NodeId) -> NodeId;
    /// Multiplication under a rounding mode.
    fn fp_mul(&mut self, rm: NodeId, a: NodeId, b: NodeId) -> NodeId;
    /// Division under a rounding mode.
    fn fp_div(&mut self, rm: NodeId, a: NodeId, b: NodeId) -> NodeId;
    /// Fused multiply-add under a rounding mode.
    fn fp_fma(&mut self, rm: NodeId, a: NodeId, b: NodeId, c: NodeId) -> NodeId;
    /// Square root under a rounding mode.
    fn fp_sqrt(&mut self, rm: NodeId, a: NodeId) -> NodeId;
    /// IEEE remainder.
    fn fp_rem(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Round to integral under a rounding mode.
    fn fp_round_to_int(&mut self, rm: NodeId, a: NodeId) -> NodeId;
    /// Minimum.
    fn fp_min(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Maximum.
    fn fp_max(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Less-or-equal predicate.
    fn fp_leq(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Less-than predicate.
    fn fp_lt(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Greater-or-equal predicate.
    fn fp_geq(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// Greater-than predicate.
    fn fp_gt(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// IEEE equality predicate.
    fn fp_eq(&mut self, a: NodeId, b: NodeId) -> NodeId;
    /// `fp.isNormal`.
    fn fp_is_normal(&mut self, a: NodeId) -> NodeId;
    /// `fp.isSubnormal`.
    fn fp_is_subnormal(&mut self, a: NodeId) -> NodeId;
    /// `fp.isZero`.
    fn fp_is_zero(&mut self, a: NodeId) -> NodeId;
    /// `fp.isInfinite`.
    fn fp_is_inf(&mut self, a: NodeId) -> NodeId;
    /// `fp.isNaN`.
    fn fp_is_nan(&mut self, a: NodeId) -> NodeId;
    /// `fp.isNegative`.
    fn fp_is_neg(&mut self, a: NodeId) -> NodeId;
    /// `fp.isPositive`.
    fn fp_is_pos(&mut self, a: NodeId) -> NodeId;
    /// `((_ to_fp eb sb) bv)`: reinterpret a bit-vector of width `eb + sb`.
    fn fp_from_bv(&mut self, a: NodeId, eb: u32, sb: u32) -> NodeId;
    /// `((_ to_fp eb sb) rm fp)`: format conversion.
    fn fp_from_fp(&mut self, rm: NodeId, a: NodeId, eb: u32, sb: u32) -> NodeId;
    /// `((_ to_fp eb sb) rm bv)`: conversion from a signed bit-vector.
    fn fp_from_sbv(&mut self, rm: NodeId, a: NodeId, eb: u32, sb: u32) -> NodeId;
    /// `((_ to_fp_unsigned eb sb) rm bv)`: conversion from an unsigned
    /// bit-vector.
    fn fp_from_ubv(&mut self, rm: NodeId, a: NodeId, eb: u32, sb: u32) -> NodeId;
    /// `((_ to_fp eb sb) rm <real>)`: conversion from a real literal kept
    /// in its source spelling.
    fn fp_from_real(&mut self, rm: NodeId, repr: &str, eb: u32, sb: u32) -> NodeId;
    /// `((_ to_ubv n) rm fp)`.
    fn fp_to_ubv(&mut self, rm: NodeId, a: NodeId, width: u32) -> NodeId;
    /// `((_ to_sbv n) rm fp)`.
    fn fp_to_sbv(&mut self, rm: NodeId, a: NodeId, width: u32) -> NodeId;

    // ---- assertions and solving ----------------------------------------

    /// Add a permanent assertion.
    fn assert_formula(&mut self, node: NodeId);
    /// Add an assumption for the next `check_sat`.
    fn assume(&mut self, node: NodeId);
    /// Push `n` assertion scopes.
    fn push(&mut self, n: u32);
    /// Pop `n` assertion scopes.
    fn pop(&mut self, n: u32);
    /// Run the decision procedure.
    fn check_sat(&mut self) -> SatResult;
    /// Assumptions that were inconsistent in the last `Unsat` answer.
    fn failed_assumptions(&self) -> Vec<NodeId>;
    /// Externally signalled termination; polled between commands.
    fn terminate(&self) -> bool;

    // ---- option registry ------------------------------------------------

    /// Set a backend option by its bare (colon-stripped) name. Returns
    /// `false` for unknown options.
    fn set_option(&mut self, name: &str, value: i64) -> bool;
    /// Read a backend option by its bare name.
    fn get_option(&self, name: &str) -> Option<i64>;

    // ---- printing -------------------------------------------------------

    /// Render the value of a node under the current model as an SMT-LIB
    /// literal.
    fn value_smt2(&self, node: NodeId) -> String;
    /// Render a node in SMT-LIB term syntax (used for unnamed failed
    /// assumptions).
    fn node_smt2(&self, node: NodeId) -> String;
    /// Print the current model in SMT-LIB syntax.
    fn print_model(&self, out: &mut dyn io::Write) -> io::Result<()>;
}
