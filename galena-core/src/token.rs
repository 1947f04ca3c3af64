//! Token and tag model.
//!
//! Every name the lexer can resolve (reserved words, commands, keywords,
//! theory operators, logics) carries a [`Tag`]. User symbols and attributes
//! that are not pre-registered get the generic [`Tag::Symbol`] /
//! [`Tag::Attribute`] tags. A tag knows its [`TagClass`], which drives
//! dispatch in the term parser and the command driver.

use crate::backend::RoundingMode;
use crate::error::Coo;
use crate::symtab::SymbolId;
use std::fmt;

/// Coarse classification of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Punctuation, plain symbols, attributes, internal items.
    Other,
    /// Literal constants (decimal, hex, binary, string, real).
    Constant,
    /// Reserved words (`_`, `!`, `as`, `let`, `forall`, `exists`, ...).
    Reserved,
    /// Command names.
    Command,
    /// Pre-registered `:keyword`s.
    Keyword,
    /// Core theory symbols.
    Core,
    /// Array theory symbols.
    Array,
    /// Bit-vector theory symbols.
    Bv,
    /// Floating-point theory symbols.
    Fp,
    /// Logic names.
    Logic,
}

/// Reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Reserved {
    Bang,
    Underscore,
    As,
    DecimalWord,
    StringWord,
    Par,
    Let,
    Forall,
    Exists,
}

/// Command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Cmd {
    Assert,
    CheckSat,
    CheckSatAssuming,
    DeclareConst,
    DeclareFun,
    DeclareSort,
    DefineFun,
    DefineSort,
    Echo,
    Exit,
    GetAssertions,
    GetAssignment,
    GetInfo,
    GetModel,
    GetOption,
    GetProof,
    GetUnsatAssumptions,
    GetUnsatCore,
    GetValue,
    Model,
    Pop,
    Push,
    SetInfo,
    SetLogic,
    SetOption,
}

/// Pre-registered attribute keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Kw {
    AllStatistics,
    Authors,
    Chainable,
    DiagnosticOutputChannel,
    ErrorBehavior,
    GlobalDeclarations,
    InteractiveMode,
    LeftAssoc,
    Name,
    Named,
    PrintSuccess,
    ProduceAssertions,
    ProduceAssignments,
    ProduceModels,
    ProduceProofs,
    ProduceUnsatAssumptions,
    ProduceUnsatCores,
    RandomSeed,
    ReasonUnknown,
    RegularOutputChannel,
    RightAssoc,
    Status,
    Verbosity,
    Version,
}

/// Core theory symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CoreOp {
    Bool,
    True,
    False,
    Not,
    Implies,
    And,
    Or,
    Xor,
    Equal,
    Distinct,
    Ite,
}

/// Array theory symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ArrayOp {
    Array,
    Select,
    Store,
}

/// Bit-vector theory symbols, including the Z3 extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BvOp {
    BitVec,
    Concat,
    Extract,
    Not,
    Neg,
    And,
    Or,
    Add,
    Mul,
    Udiv,
    Urem,
    Shl,
    Lshr,
    Ult,
    Nand,
    Nor,
    Xor,
    Xnor,
    Comp,
    Sub,
    Sdiv,
    Srem,
    Smod,
    Ashr,
    Repeat,
    ZeroExtend,
    SignExtend,
    RotateLeft,
    RotateRight,
    Ule,
    Ugt,
    Uge,
    Slt,
    Sle,
    Sgt,
    Sge,
    Redor,
    Redand,
    ExtRotateLeft,
    ExtRotateRight,
}

/// Floating-point theory symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FpOp {
    FloatingPoint,
    Float16,
    Float32,
    Float64,
    Float128,
    RoundingModeSort,
    /// A rounding-mode constant (short or long spelling).
    Rm(RoundingMode),
    Fp,
    PosZero,
    NegZero,
    PosInf,
    NegInf,
    NaN,
    Abs,
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Fma,
    Sqrt,
    Rem,
    RoundToIntegral,
    Min,
    Max,
    Leq,
    Lt,
    Geq,
    Gt,
    Eq,
    IsNormal,
    IsSubnormal,
    IsZero,
    IsInfinite,
    IsNaN,
    IsNegative,
    IsPositive,
    ToFp,
    ToFpUnsigned,
    ToUbv,
    ToSbv,
}

/// Logic names accepted after `set-logic`. Only the bit-vector fragment is
/// supported by the solver; the rest are recognized so that the error is
/// "unsupported logic" rather than "undefined symbol".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Logic {
    Abv,
    All,
    Auflia,
    Auflira,
    Aufnira,
    Bv,
    Lra,
    QfAbv,
    QfAufbv,
    QfAuflia,
    QfAx,
    QfBv,
    QfBvfp,
    QfFp,
    QfIdl,
    QfLia,
    QfLra,
    QfNia,
    QfNra,
    QfRdl,
    QfUf,
    QfUfbv,
    QfUfidl,
    QfUflia,
    QfUflra,
    QfUfnra,
    Ufbv,
    Uflra,
    Ufnia,
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Logic::Abv => "ABV",
            Logic::All => "ALL",
            Logic::Auflia => "AUFLIA",
            Logic::Auflira => "AUFLIRA",
            Logic::Aufnira => "AUFNIRA",
            Logic::Bv => "BV",
            Logic::Lra => "LRA",
            Logic::QfAbv => "QF_ABV",
            Logic::QfAufbv => "QF_AUFBV",
            Logic::QfAuflia => "QF_AUFLIA",
            Logic::QfAx => "QF_AX",
            Logic::QfBv => "QF_BV",
            Logic::QfBvfp => "QF_BVFP",
            Logic::QfFp => "QF_FP",
            Logic::QfIdl => "QF_IDL",
            Logic::QfLia => "QF_LIA",
            Logic::QfLra => "QF_LRA",
            Logic::QfNia => "QF_NIA",
            Logic::QfNra => "QF_NRA",
            Logic::QfRdl => "QF_RDL",
            Logic::QfUf => "QF_UF",
            Logic::QfUfbv => "QF_UFBV",
            Logic::QfUfidl => "QF_UFIDL",
            Logic::QfUflia => "QF_UFLIA",
            Logic::QfUflra => "QF_UFLRA",
            Logic::QfUfnra => "QF_UFNRA",
            Logic::Ufbv => "UFBV",
            Logic::Uflra => "UFLRA",
            Logic::Ufnia => "UFNIA",
        };
        f.write_str(name)
    }
}

/// The tag of a token or symbol-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// End of input.
    Eof,
    /// `(`
    Lpar,
    /// `)`
    Rpar,
    /// A user symbol (simple or quoted).
    Symbol,
    /// A `:keyword` without a pre-registered meaning.
    Attribute,
    /// Decimal numeral.
    Decimal,
    /// `#x...` constant.
    Hexadecimal,
    /// `#b...` constant.
    Binary,
    /// `"..."` constant.
    Str,
    /// Real numeral (`1.5`).
    Real,
    /// Reserved word.
    Reserved(Reserved),
    /// Command name.
    Command(Cmd),
    /// Pre-registered keyword.
    Keyword(Kw),
    /// Core theory symbol.
    Core(CoreOp),
    /// Array theory symbol.
    Array(ArrayOp),
    /// Bit-vector theory symbol.
    Bv(BvOp),
    /// Floating-point theory symbol.
    Fp(FpOp),
    /// Logic name.
    Logic(Logic),
}

impl Tag {
    /// The class of this tag.
    pub fn class(self) -> TagClass {
        match self {
            Tag::Decimal | Tag::Hexadecimal | Tag::Binary | Tag::Str | Tag::Real => {
                TagClass::Constant
            }
            Tag::Reserved(_) => TagClass::Reserved,
            Tag::Command(_) => TagClass::Command,
            Tag::Keyword(_) => TagClass::Keyword,
            Tag::Core(_) => TagClass::Core,
            Tag::Array(_) => TagClass::Array,
            Tag::Bv(_) => TagClass::Bv,
            Tag::Fp(_) => TagClass::Fp,
            Tag::Logic(_) => TagClass::Logic,
            _ => TagClass::Other,
        }
    }

    /// True for tags whose token resolved through the symbol table, i.e.
    /// tokens that carry a [`SymbolId`].
    pub fn has_symbol(self) -> bool {
        !matches!(
            self.class(),
            TagClass::Other | TagClass::Constant
        ) || matches!(self, Tag::Symbol | Tag::Attribute)
    }
}

/// A lexed token: its tag, the source coordinate of its first byte and, for
/// named tokens, the symbol-table entry it resolved to. The token text lives
/// in the lexer's token buffer.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    /// Tag of the token.
    pub tag: Tag,
    /// Coordinate of the first byte.
    pub coo: Coo,
    /// Symbol-table entry for named tokens.
    pub sym: Option<SymbolId>,
}

/// The pre-registered name table: reserved words, commands, keywords, theory
/// symbols and logics, in the shape the symbol table is seeded with.
pub const KEYWORD_TABLE: &[(&str, Tag)] = &[
    // reserved words
    ("!", Tag::Reserved(Reserved::Bang)),
    ("_", Tag::Reserved(Reserved::Underscore)),
    ("as", Tag::Reserved(Reserved::As)),
    ("DECIMAL", Tag::Reserved(Reserved::DecimalWord)),
    ("STRING", Tag::Reserved(Reserved::StringWord)),
    ("par", Tag::Reserved(Reserved::Par)),
    ("let", Tag::Reserved(Reserved::Let)),
    ("forall", Tag::Reserved(Reserved::Forall)),
    ("exists", Tag::Reserved(Reserved::Exists)),
    // commands
    ("assert", Tag::Command(Cmd::Assert)),
    ("check-sat", Tag::Command(Cmd::CheckSat)),
    ("check-sat-assuming", Tag::Command(Cmd::CheckSatAssuming)),
    ("declare-const", Tag::Command(Cmd::DeclareConst)),
    ("declare-fun", Tag::Command(Cmd::DeclareFun)),
    ("declare-sort", Tag::Command(Cmd::DeclareSort)),
    ("define-fun", Tag::Command(Cmd::DefineFun)),
    ("define-sort", Tag::Command(Cmd::DefineSort)),
    ("echo", Tag::Command(Cmd::Echo)),
    ("exit", Tag::Command(Cmd::Exit)),
    ("get-assertions", Tag::Command(Cmd::GetAssertions)),
    ("get-assignment", Tag::Command(Cmd::GetAssignment)),
    ("get-info", Tag::Command(Cmd::GetInfo)),
    ("get-model", Tag::Command(Cmd::GetModel)),
    ("get-option", Tag::Command(Cmd::GetOption)),
    ("get-proof", Tag::Command(Cmd::GetProof)),
    ("get-unsat-assumptions", Tag::Command(Cmd::GetUnsatAssumptions)),
    ("get-unsat-core", Tag::Command(Cmd::GetUnsatCore)),
    ("get-value", Tag::Command(Cmd::GetValue)),
    ("model", Tag::Command(Cmd::Model)),
    ("pop", Tag::Command(Cmd::Pop)),
    ("push", Tag::Command(Cmd::Push)),
    ("set-info", Tag::Command(Cmd::SetInfo)),
    ("set-logic", Tag::Command(Cmd::SetLogic)),
    ("set-option", Tag::Command(Cmd::SetOption)),
    // keywords
    (":all-statistics", Tag::Keyword(Kw::AllStatistics)),
    (":authors", Tag::Keyword(Kw::Authors)),
    (":chainable", Tag::Keyword(Kw::Chainable)),
    (":diagnostic-output-channel", Tag::Keyword(Kw::DiagnosticOutputChannel)),
    (":error-behavior", Tag::Keyword(Kw::ErrorBehavior)),
    (":global-declarations", Tag::Keyword(Kw::GlobalDeclarations)),
    (":interactive-mode", Tag::Keyword(Kw::InteractiveMode)),
    (":left-assoc", Tag::Keyword(Kw::LeftAssoc)),
    (":name", Tag::Keyword(Kw::Name)),
    (":named", Tag::Keyword(Kw::Named)),
    (":print-success", Tag::Keyword(Kw::PrintSuccess)),
    (":produce-assertions", Tag::Keyword(Kw::ProduceAssertions)),
    (":produce-assignments", Tag::Keyword(Kw::ProduceAssignments)),
    (":produce-models", Tag::Keyword(Kw::ProduceModels)),
    (":produce-proofs", Tag::Keyword(Kw::ProduceProofs)),
    (":produce-unsat-assumptions", Tag::Keyword(Kw::ProduceUnsatAssumptions)),
    (":produce-unsat-cores", Tag::Keyword(Kw::ProduceUnsatCores)),
    (":random-seed", Tag::Keyword(Kw::RandomSeed)),
    (":reason-unknown", Tag::Keyword(Kw::ReasonUnknown)),
    (":regular-output-channel", Tag::Keyword(Kw::RegularOutputChannel)),
    (":right-assoc", Tag::Keyword(Kw::RightAssoc)),
    (":status", Tag::Keyword(Kw::Status)),
    (":verbosity", Tag::Keyword(Kw::Verbosity)),
    (":version", Tag::Keyword(Kw::Version)),
    // core
    ("Bool", Tag::Core(CoreOp::Bool)),
    ("true", Tag::Core(CoreOp::True)),
    ("false", Tag::Core(CoreOp::False)),
    ("not", Tag::Core(CoreOp::Not)),
    ("=>", Tag::Core(CoreOp::Implies)),
    ("and", Tag::Core(CoreOp::And)),
    ("or", Tag::Core(CoreOp::Or)),
    ("xor", Tag::Core(CoreOp::Xor)),
    ("=", Tag::Core(CoreOp::Equal)),
    ("distinct", Tag::Core(CoreOp::Distinct)),
    ("ite", Tag::Core(CoreOp::Ite)),
    // arrays
    ("Array", Tag::Array(ArrayOp::Array)),
    ("select", Tag::Array(ArrayOp::Select)),
    ("store", Tag::Array(ArrayOp::Store)),
    // bit-vectors
    ("BitVec", Tag::Bv(BvOp::BitVec)),
    ("concat", Tag::Bv(BvOp::Concat)),
    ("extract", Tag::Bv(BvOp::Extract)),
    ("bvnot", Tag::Bv(BvOp::Not)),
    ("bvneg", Tag::Bv(BvOp::Neg)),
    ("bvand", Tag::Bv(BvOp::And)),
    ("bvor", Tag::Bv(BvOp::Or)),
    ("bvadd", Tag::Bv(BvOp::Add)),
    ("bvmul", Tag::Bv(BvOp::Mul)),
    ("bvudiv", Tag::Bv(BvOp::Udiv)),
    ("bvurem", Tag::Bv(BvOp::Urem)),
    ("bvshl", Tag::Bv(BvOp::Shl)),
    ("bvlshr", Tag::Bv(BvOp::Lshr)),
    ("bvult", Tag::Bv(BvOp::Ult)),
    ("bvnand", Tag::Bv(BvOp::Nand)),
    ("bvnor", Tag::Bv(BvOp::Nor)),
    ("bvxor", Tag::Bv(BvOp::Xor)),
    ("bvxnor", Tag::Bv(BvOp::Xnor)),
    ("bvcomp", Tag::Bv(BvOp::Comp)),
    ("bvsub", Tag::Bv(BvOp::Sub)),
    ("bvsdiv", Tag::Bv(BvOp::Sdiv)),
    ("bvsrem", Tag::Bv(BvOp::Srem)),
    ("bvsmod", Tag::Bv(BvOp::Smod)),
    ("bvashr", Tag::Bv(BvOp::Ashr)),
    ("repeat", Tag::Bv(BvOp::Repeat)),
    ("zero_extend", Tag::Bv(BvOp::ZeroExtend)),
    ("sign_extend", Tag::Bv(BvOp::SignExtend)),
    ("rotate_left", Tag::Bv(BvOp::RotateLeft)),
    ("rotate_right", Tag::Bv(BvOp::RotateRight)),
    ("bvule", Tag::Bv(BvOp::Ule)),
    ("bvugt", Tag::Bv(BvOp::Ugt)),
    ("bvuge", Tag::Bv(BvOp::Uge)),
    ("bvslt", Tag::Bv(BvOp::Slt)),
    ("bvsle", Tag::Bv(BvOp::Sle)),
    ("bvsgt", Tag::Bv(BvOp::Sgt)),
    ("bvsge", Tag::Bv(BvOp::Sge)),
    ("bvredor", Tag::Bv(BvOp::Redor)),
    ("bvredand", Tag::Bv(BvOp::Redand)),
    ("ext_rotate_left", Tag::Bv(BvOp::ExtRotateLeft)),
    ("ext_rotate_right", Tag::Bv(BvOp::ExtRotateRight)),
    // floating point
    ("FloatingPoint", Tag::Fp(FpOp::FloatingPoint)),
    ("Float16", Tag::Fp(FpOp::Float16)),
    ("Float32", Tag::Fp(FpOp::Float32)),
    ("Float64", Tag::Fp(FpOp::Float64)),
    ("Float128", Tag::Fp(FpOp::Float128)),
    ("RoundingMode", Tag::Fp(FpOp::RoundingModeSort)),
    ("roundNearestTiesToEven", Tag::Fp(FpOp::Rm(RoundingMode::Rne))),
    ("roundNearestTiesToAway", Tag::Fp(FpOp::Rm(RoundingMode::Rna))),
    ("roundTowardPositive", Tag::Fp(FpOp::Rm(RoundingMode::Rtp))),
    ("roundTowardNegative", Tag::Fp(FpOp::Rm(RoundingMode::Rtn))),
    ("roundTowardZero", Tag::Fp(FpOp::Rm(RoundingMode::Rtz))),
    ("RNE", Tag::Fp(FpOp::Rm(RoundingMode::Rne))),
    ("RNA", Tag::Fp(FpOp::Rm(RoundingMode::Rna))),
    ("RTP", Tag::Fp(FpOp::Rm(RoundingMode::Rtp))),
    ("RTN", Tag::Fp(FpOp::Rm(RoundingMode::Rtn))),
    ("RTZ", Tag::Fp(FpOp::Rm(RoundingMode::Rtz))),
    ("fp", Tag::Fp(FpOp::Fp)),
    ("+zero", Tag::Fp(FpOp::PosZero)),
    ("-zero", Tag::Fp(FpOp::NegZero)),
    ("+oo", Tag::Fp(FpOp::PosInf)),
    ("-oo", Tag::Fp(FpOp::NegInf)),
    ("NaN", Tag::Fp(FpOp::NaN)),
    ("fp.abs", Tag::Fp(FpOp::Abs)),
    ("fp.neg", Tag::Fp(FpOp::Neg)),
    ("fp.add", Tag::Fp(FpOp::Add)),
    ("fp.sub", Tag::Fp(FpOp::Sub)),
    ("fp.mul", Tag::Fp(FpOp::Mul)),
    ("fp.div", Tag::Fp(FpOp::Div)),
    ("fp.fma", Tag::Fp(FpOp::Fma)),
    ("fp.sqrt", Tag::Fp(FpOp::Sqrt)),
    ("fp.rem", Tag::Fp(FpOp::Rem)),
    ("fp.roundToIntegral", Tag::Fp(FpOp::RoundToIntegral)),
    ("fp.min", Tag::Fp(FpOp::Min)),
    ("fp.max", Tag::Fp(FpOp::Max)),
    ("fp.leq", Tag::Fp(FpOp::Leq)),
    ("fp.lt", Tag::Fp(FpOp::Lt)),
    ("fp.geq", Tag::Fp(FpOp::Geq)),
    ("fp.gt", Tag::Fp(FpOp::Gt)),
    ("fp.eq", Tag::Fp(FpOp::Eq)),
    ("fp.isNormal", Tag::Fp(FpOp::IsNormal)),
    ("fp.isSubnormal", Tag::Fp(FpOp::IsSubnormal)),
    ("fp.isZero", Tag::Fp(FpOp::IsZero)),
    ("fp.isInfinite", Tag::Fp(FpOp::IsInfinite)),
    ("fp.isNaN", Tag::Fp(FpOp::IsNaN)),
    ("fp.isNegative", Tag::Fp(FpOp::IsNegative)),
    ("fp.isPositive", Tag::Fp(FpOp::IsPositive)),
    ("to_fp", Tag::Fp(FpOp::ToFp)),
    ("to_fp_unsigned", Tag::Fp(FpOp::ToFpUnsigned)),
    ("to_ubv", Tag::Fp(FpOp::ToUbv)),
    ("to_sbv", Tag::Fp(FpOp::ToSbv)),
    // logics
    ("ABV", Tag::Logic(Logic::Abv)),
    ("ALL", Tag::Logic(Logic::All)),
    ("ALL_SUPPORTED", Tag::Logic(Logic::All)),
    ("AUFLIA", Tag::Logic(Logic::Auflia)),
    ("AUFLIRA", Tag::Logic(Logic::Auflira)),
    ("AUFNIRA", Tag::Logic(Logic::Aufnira)),
    ("BV", Tag::Logic(Logic::Bv)),
    ("LRA", Tag::Logic(Logic::Lra)),
    ("QF_ABV", Tag::Logic(Logic::QfAbv)),
    ("QF_AUFBV", Tag::Logic(Logic::QfAufbv)),
    ("QF_AUFLIA", Tag::Logic(Logic::QfAuflia)),
    ("QF_AX", Tag::Logic(Logic::QfAx)),
    ("QF_BV", Tag::Logic(Logic::QfBv)),
    ("QF_BVFP", Tag::Logic(Logic::QfBvfp)),
    ("QF_FP", Tag::Logic(Logic::QfFp)),
    ("QF_IDL", Tag::Logic(Logic::QfIdl)),
    ("QF_LIA", Tag::Logic(Logic::QfLia)),
    ("QF_LRA", Tag::Logic(Logic::QfLra)),
    ("QF_NIA", Tag::Logic(Logic::QfNia)),
    ("QF_NRA", Tag::Logic(Logic::QfNra)),
    ("QF_RDL", Tag::Logic(Logic::QfRdl)),
    ("QF_UF", Tag::Logic(Logic::QfUf)),
    ("QF_UFBV", Tag::Logic(Logic::QfUfbv)),
    ("QF_UFIDL", Tag::Logic(Logic::QfUfidl)),
    ("QF_UFLIA", Tag::Logic(Logic::QfUflia)),
    ("QF_UFLRA", Tag::Logic(Logic::QfUflra)),
    ("QF_UFNRA", Tag::Logic(Logic::QfUfnra)),
    ("UFBV", Tag::Logic(Logic::Ufbv)),
    ("UFLRA", Tag::Logic(Logic::Uflra)),
    ("UFNIA", Tag::Logic(Logic::Ufnia)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert_eq!(Tag::Lpar.class(), TagClass::Other);
        assert_eq!(Tag::Binary.class(), TagClass::Constant);
        assert_eq!(Tag::Bv(BvOp::Add).class(), TagClass::Bv);
        assert_eq!(Tag::Command(Cmd::Assert).class(), TagClass::Command);
        assert_eq!(Tag::Logic(Logic::QfBv).class(), TagClass::Logic);
    }

    #[test]
    fn has_symbol() {
        assert!(Tag::Symbol.has_symbol());
        assert!(Tag::Attribute.has_symbol());
        assert!(Tag::Core(CoreOp::And).has_symbol());
        assert!(Tag::Reserved(Reserved::Let).has_symbol());
        assert!(!Tag::Lpar.has_symbol());
        assert!(!Tag::Binary.has_symbol());
    }

    #[test]
    fn table_has_no_duplicate_names() {
        let mut names: Vec<&str> = KEYWORD_TABLE.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn logic_names_round_trip() {
        for (name, tag) in KEYWORD_TABLE {
            if let Tag::Logic(l) = tag {
                if *name != "ALL_SUPPORTED" {
                    assert_eq!(&l.to_string(), name);
                }
            }
        }
    }
}
