//! End-to-end script tests: whole SMT-LIB scripts through the parser and
//! the reference backend, checking responses, errors and reference-count
//! hygiene.

use galena_core::{GalenaError, NodeBackend, ParseResult, Parser, ParserOpts, SatResult};

fn run_queued(
    script: &str,
    results: &[SatResult],
) -> (galena_core::Result<ParseResult>, String, NodeBackend) {
    let mut backend = NodeBackend::new();
    for &result in results {
        backend.queue_result(result);
    }
    let mut out = Vec::new();
    let result = Parser::new(&mut backend, script, "test.smt2", &mut out).parse();
    (result, String::from_utf8(out).unwrap(), backend)
}

fn run(script: &str) -> (galena_core::Result<ParseResult>, String, NodeBackend) {
    run_queued(script, &[])
}

fn error_of(result: galena_core::Result<ParseResult>) -> String {
    match result {
        Err(err @ GalenaError::Parse { .. }) => err.to_string(),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

// ---- whole-script scenarios --------------------------------------------

#[test]
fn bit_vector_equality() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 8))
(assert (= x (_ bv5 8)))
(check-sat)
(exit)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    let result = result.unwrap();
    assert_eq!(out, "success\nsuccess\nsuccess\nsat\nsuccess\n");
    assert_eq!(result.logic.to_string(), "QF_BV");
    assert_eq!(result.status, SatResult::Sat);
    assert_eq!(result.nsatcalls, 1);
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn let_with_shadowing() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 4))
(assert (let ((x #b0000)) (= x #b0000)))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
    // the outer x is 4 bits wide and was never constrained; the assertion
    // over the shadowed x type-checked at width 4
    assert_eq!(backend.num_assertions(), 1);
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn check_sat_assuming_and_failed_assumptions() {
    let script = "\
(set-option :incremental true)
(set-logic QF_BV)
(declare-const p (_ BitVec 1))
(assert (= p #b1))
(check-sat-assuming (p))
(check-sat-assuming ((bvnot p)))
(get-unsat-assumptions)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat, SatResult::Unsat]);
    result.unwrap();
    assert_eq!(
        out,
        "success\nsuccess\nsuccess\nsuccess\nsat\nunsat\n((bvnot p))\n"
    );
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn select_index_width_mismatch() {
    let script = "\
(set-logic QF_ABV)
(declare-const a (Array (_ BitVec 8) (_ BitVec 32)))
(assert (= (select a #b0) #x00000000))
";
    let (result, _, backend) = run(script);
    let msg = error_of(result);
    assert!(msg.contains(
        "first (array) argument of 'select' has index bit-width 8 \
         but the second (index) argument has bit-width 1"
    ));
    drop(backend);
}

#[test]
fn push_pop_symmetry() {
    let script = "\
(set-logic QF_BV)
(push 1)
(declare-const y (_ BitVec 1))
(assert (= y #b0))
(pop 1)
(declare-const y (_ BitVec 1))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert_eq!(out, "success\nsuccess\nsuccess\nsuccess\nsuccess\nsuccess\nsat\n");
    // the assertion made inside the pushed scope is gone after the pop
    assert_eq!(backend.num_assertions(), 0);
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn extract_bounds() {
    let good = "\
(set-logic QF_BV)
(declare-const z (_ BitVec 8))
(assert (= ((_ extract 7 0) z) z))
";
    let (result, out, _) = run(good);
    result.unwrap();
    assert_eq!(out, "success\nsuccess\nsuccess\n");

    let bad = "\
(set-logic QF_BV)
(declare-const z (_ BitVec 8))
(assert (= ((_ extract 8 0) z) z))
";
    let (result, _, _) = run(bad);
    let msg = error_of(result);
    assert!(msg.contains(
        "first (high) 'extract' parameter 8 too large for bit-vector argument of bit-width 8"
    ));
}

// ---- get-value source echoing ------------------------------------------

#[test]
fn get_value_echoes_source_text() {
    let script = "\
(set-option :produce-models true)
(set-logic QF_BV)
(declare-const x (_ BitVec 4))
(assert (= x #b0101))
(check-sat)
(get-value (x (bvnot   x)))
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.contains("(\n (x #b0000)\n ((bvnot x) #b0000)\n)\n"), "got: {out}");
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn get_value_of_constants() {
    let script = "\
(set-option :produce-models true)
(set-logic QF_BV)
(check-sat)
(get-value ((_ bv5 8)))
(get-value (#xA))
(get-value (#b1010))
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.contains("(((_ bv5 8) #b00000101))\n"), "got: {out}");
    assert!(out.contains("((#xA #b1010))\n"));
    assert!(out.contains("((#b1010 #b1010))\n"));
}

#[test]
fn get_value_requires_model_generation() {
    let script = "(set-logic QF_BV)\n(check-sat)\n(get-value (#b1))\n";
    let (result, _, _) = run_queued(script, &[SatResult::Sat]);
    assert!(error_of(result).contains("model generation is not enabled"));
}

// ---- compact bit-vector constants --------------------------------------

#[test]
fn bv_constant_width_overflow() {
    let script = "(set-logic QF_BV)\n(assert (= (_ bv256 8) #x00))\n";
    let (result, _, _) = run(script);
    assert!(
        error_of(result)
            .contains("decimal constant '256' needs 9 bits which exceeds bit-width '8'")
    );
}

#[test]
fn bv_constant_is_zero_extended() {
    let script = "\
(set-option :produce-models true)
(check-sat)
(get-value ((_ bv0 4) (_ bv15 4)))
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.contains("((_ bv0 4) #b0000)"), "got: {out}");
    assert!(out.contains("((_ bv15 4) #b1111)"));
}

// ---- operator typing ----------------------------------------------------

#[test]
fn sort_mismatch_in_equality() {
    let script = "\
(set-logic QF_BV)
(declare-const a (_ BitVec 4))
(declare-const b (_ BitVec 8))
(assert (= a b))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains(
        "first argument of '=' is bit-vector of width 4 but argument 2 is a bit-vector of width 8"
    ));
}

#[test]
fn ite_condition_must_be_one_bit() {
    let script = "\
(set-logic QF_BV)
(declare-const a (_ BitVec 4))
(assert (= a (ite a a a)))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("first argument of 'ite' is bit-vector of bit-width 4"));
}

#[test]
fn arity_errors() {
    let (result, _, _) = run("(assert (bvadd #b1))\n");
    assert!(error_of(result).contains("argument to 'bvadd' missing"));

    let (result, _, _) = run("(assert (bvnot #b1 #b1))\n");
    assert!(error_of(result).contains("'bvnot' has one argument too much"));

    let (result, _, _) = run("(assert (ite #b1 #b0))\n");
    assert!(error_of(result).contains("one argument to 'ite' missing"));
}

#[test]
fn undefined_symbol() {
    let (result, _, _) = run("(set-logic QF_BV)\n(assert nosuch)\n");
    assert!(error_of(result).contains("undefined symbol 'nosuch'"));
}

#[test]
fn redeclaration_is_reported_with_position() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 1))
(declare-const x (_ BitVec 1))
";
    let (result, _, _) = run(script);
    let msg = error_of(result);
    assert!(msg.contains("symbol 'x' already defined at line 2 column 16"), "got: {msg}");
}

#[test]
fn assert_argument_must_be_boolean() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 8))
(assert x)
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("assert argument is a bit-vector of length 8"));
}

#[test]
fn chainable_equality_and_distinct() {
    let script = "\
(set-logic QF_BV)
(declare-const a (_ BitVec 4))
(declare-const b (_ BitVec 4))
(declare-const c (_ BitVec 4))
(assert (= a b c))
(assert (distinct a b c))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
    assert_eq!(backend.num_assertions(), 2);
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn left_and_right_associative_folds() {
    let script = "\
(set-logic QF_BV)
(declare-const p (_ BitVec 1))
(declare-const q (_ BitVec 1))
(declare-const r (_ BitVec 1))
(assert (=> p q r))
(assert (and p q r))
(assert (bvadd #b0001 #b0010 #b0100))
";
    // the last assert fails: bvadd yields a 4-bit vector, not a formula
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("assert argument is a bit-vector of length 4"));
}

#[test]
fn xnor_folds_and_negates() {
    let script = "\
(set-logic QF_BV)
(declare-const a (_ BitVec 1))
(assert (bvxnor a a))
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn ext_rotate_needs_constant_shift() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 8))
(assert (= (ext_rotate_left x #b00000010) x))
(assert (= (ext_rotate_left x x) x))
";
    let (result, _, _) = run(script);
    assert!(
        error_of(result)
            .contains("second argument of 'ext_rotate_left' is not a bit-vector constant")
    );
}

#[test]
fn extract_parameter_order() {
    let (result, _, _) = run("(assert ((_ extract 0 7) #b10101010))\n");
    assert!(error_of(result).contains("first parameter '0' of '(_ extract' smaller than second '7'"));
}

#[test]
fn zero_extend_overflow_guard() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 8))
(assert (= ((_ zero_extend 2147483647) x) x))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("resulting bit-width of 'zero_extend' too large"));
}

#[test]
fn repeat_overflow_guard() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 8))
(assert (= ((_ repeat 1073741824) x) x))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("resulting bit-width of 'repeat' too large"));
}

#[test]
fn unexpected_real_constant() {
    let script = "(set-logic QF_BV)\n(assert (= #b1 1.5))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("unexpected real constant"));
}

// ---- binders ------------------------------------------------------------

#[test]
fn quantifier_over_fresh_parameters() {
    let script = "\
(set-logic BV)
(declare-const w (_ BitVec 8))
(assert (forall ((w (_ BitVec 1))) (= w #b1)))
(assert (= w #x00))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    let result = result.unwrap();
    assert!(out.ends_with("sat\n"));
    assert_eq!(result.logic.to_string(), "BV");
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn exists_body_must_be_boolean() {
    let script = "(assert (exists ((x (_ BitVec 4))) x))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("body of 'exists' is not a boolean term"));
}

#[test]
fn quantifier_body_missing() {
    let script = "(assert (forall ((x (_ BitVec 1)))))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("body to 'quantifier'"));
}

#[test]
fn let_body_missing() {
    let script = "(assert (let ((x #b1))))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("body to 'let'"));
}

#[test]
fn let_binding_without_term() {
    let script = "(assert (let ((x)) x))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("term to be bound to 'x' missing"));
}

#[test]
fn nested_let_shadowing_restores_outer_binding() {
    let script = "\
(set-logic QF_BV)
(assert (let ((v #b01)) (let ((v #b1)) (= v (let ((w v)) w)))))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
    assert_eq!(backend.leaked(), 0);
}

// ---- annotations --------------------------------------------------------

#[test]
fn named_annotation() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 1))
(assert (! (= x #b1) :named a1))
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn named_annotation_requires_fresh_symbol() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 1))
(assert (! (= x #b1) :named x))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("symbol 'x' already defined"));
}

// ---- functions and sorts ------------------------------------------------

#[test]
fn define_fun_and_application() {
    let script = "\
(declare-const x (_ BitVec 4))
(define-fun inv ((a (_ BitVec 4))) (_ BitVec 4) (bvnot a))
(assert (= (inv x) x))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    let result = result.unwrap();
    assert!(out.ends_with("sat\n"));
    // functions were used without a set-logic, so the logic is inferred
    assert_eq!(result.logic.to_string(), "QF_UFBV");
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn application_arity_and_sorts() {
    let script = "\
(declare-fun f ((_ BitVec 4)) (_ BitVec 4))
(assert (= (f #b0001 #b0010) #b0000))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("invalid number of arguments"));

    let script = "\
(declare-fun f ((_ BitVec 4)) (_ BitVec 4))
(assert (= (f #b00000001) #b0000))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("invalid sort for argument 1"));
}

#[test]
fn declare_fun_rejects_non_bv_arguments() {
    let script = "(declare-fun f ((Array (_ BitVec 2) (_ BitVec 2))) (_ BitVec 2))\n";
    let (result, _, _) = run(script);
    // argument sorts of uninterpreted functions must be bit-vectors; the
    // array sort is rejected while parsing the argument list
    assert!(error_of(result).contains("expected '_'"));
}

#[test]
fn define_sort_alias() {
    let script = "\
(set-logic QF_BV)
(define-sort Word () (_ BitVec 16))
(declare-const w Word)
(assert (= w #x0000))
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn define_sort_rejects_parameters() {
    let script = "(define-sort Pair (a) (_ BitVec 2))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("parameterized sort definitions not supported yet"));
}

#[test]
fn declare_sort_needs_default_width() {
    let (result, _, _) = run("(declare-sort S 0)\n");
    assert!(error_of(result).contains("'declare-sort' not supported"));

    let script = "\
(set-option :declsort-bv-width 8)
(declare-sort S 0)
(declare-const s S)
(assert (= s #x00))
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn declare_sort_rejects_arity() {
    let script = "(set-option :declsort-bv-width 8)\n(declare-sort S 1)\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("sort arity other than 0 not supported"));
}

// ---- arrays -------------------------------------------------------------

#[test]
fn store_select_round_trip() {
    let script = "\
(set-logic QF_ABV)
(declare-const a (Array (_ BitVec 8) (_ BitVec 32)))
(declare-const i (_ BitVec 8))
(declare-const v (_ BitVec 32))
(assert (= (select (store a i v) i) v))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn store_element_width_mismatch() {
    let script = "\
(set-logic QF_ABV)
(declare-const a (Array (_ BitVec 8) (_ BitVec 32)))
(assert (= a (store a #x00 #b0)))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains(
        "first (array) argument of 'store' has element bit-width 32 but the third \
         (stored bit-vector) argument has bit-width 1"
    ));
}

#[test]
fn constant_array_literal() {
    let script = "\
(set-logic QF_ABV)
(declare-const a (Array (_ BitVec 8) (_ BitVec 32)))
(assert (= a ((as const (Array (_ BitVec 8) (_ BitVec 32))) #x00000000)))
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn array_sort_invalid_for_qf_bv() {
    let script = "(set-logic QF_BV)\n(declare-const a (Array (_ BitVec 2) (_ BitVec 2)))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("'Array' invalid for logic 'QF_BV'"));
}

// ---- floating point -----------------------------------------------------

#[test]
fn fp_operations_type_check() {
    let script = "\
(set-logic QF_FP)
(declare-const f Float32)
(declare-const g Float32)
(assert (fp.eq (fp.add RNE f g) g))
(assert (fp.isNaN (_ NaN 8 24)))
(assert (fp.leq f g g))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    let result = result.unwrap();
    assert!(out.ends_with("sat\n"));
    assert_eq!(result.logic.to_string(), "QF_FP");
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn fp_requires_rounding_mode_first() {
    let script = "\
(set-logic QF_FP)
(declare-const f Float32)
(assert (fp.eq (fp.add f f f) f))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("first argument of 'fp.add' is not a rounding-mode term"));
}

#[test]
fn fp_arguments_must_be_floating_point() {
    let script = "\
(set-logic QF_FP)
(declare-const f Float32)
(assert (fp.eq f RNE))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("argument 2 of 'fp.eq' is not a floating-point term"));
}

#[test]
fn fp_sort_mismatch() {
    let script = "\
(set-logic QF_FP)
(declare-const f Float32)
(declare-const d Float64)
(assert (fp.eq f d))
";
    let (result, _, _) = run(script);
    assert!(error_of(result)
        .contains("sort of argument 2 does not match with sort of first argument of 'fp.eq'"));
}

#[test]
fn to_fp_conversions() {
    let script = "\
(set-logic QF_BVFP)
(declare-const x (_ BitVec 32))
(declare-const f Float32)
(assert (fp.eq ((_ to_fp 8 24) x) f))
(assert (fp.eq ((_ to_fp 8 24) RNE x) f))
(assert (fp.eq ((_ to_fp 8 24) RNE 1.5) f))
(assert (fp.eq ((_ to_fp 8 24) RNE f) f))
(assert (fp.eq ((_ to_fp_unsigned 8 24) RNE x) f))
(assert (= ((_ to_ubv 32) RNE f) x))
(assert (= ((_ to_sbv 32) RNE f) x))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    let result = result.unwrap();
    assert!(out.ends_with("sat\n"));
    assert_eq!(result.logic.to_string(), "QF_FP");
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn to_fp_reinterpret_checks_width() {
    let script = "\
(set-logic QF_BVFP)
(declare-const x (_ BitVec 8))
(declare-const f Float32)
(assert (fp.eq ((_ to_fp 8 24) x) f))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("expected bit-vector of bit-width 32"));
}

#[test]
fn fp_literal_value() {
    let script = "\
(set-logic QF_FP)
(declare-const f Float16)
(assert (fp.eq f (fp #b0 #b01111 #b0000000000)))
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn fp_literal_requires_constants() {
    let script = "\
(set-logic QF_FP)
(declare-const b (_ BitVec 5))
(assert (fp.isZero (fp #b0 b #b0000000000)))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("invalid argument to 'fp', expected bit-vector constant"));
}

// ---- options and driver -------------------------------------------------

#[test]
fn print_success_can_be_disabled() {
    let script = "\
(set-option :print-success false)
(set-logic QF_BV)
(declare-const x (_ BitVec 1))
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Unknown]);
    result.unwrap();
    assert_eq!(out, "unknown\n");
}

#[test]
fn global_declarations_survive_pop() {
    let script = "\
(set-option :global-declarations true)
(set-logic QF_BV)
(push 1)
(declare-const g (_ BitVec 1))
(pop 1)
(assert g)
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn get_model_keeps_global_declarations_after_pop() {
    let script = "\
(set-option :print-success false)
(set-option :produce-models true)
(set-option :global-declarations true)
(set-logic QF_BV)
(push 1)
(declare-const g (_ BitVec 4))
(pop 1)
(assert (= g #b0000))
(check-sat)
(get-model)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    // the declaration survives the pop, so the model still reports it
    assert!(
        out.contains("(define-fun g () (_ BitVec 4) #b0000)"),
        "got: {out}"
    );
}

#[test]
fn pop_beyond_push_depth() {
    let script = "(set-logic QF_BV)\n(push 1)\n(pop 2)\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("popping more scopes (2) than created via push (1)"));
}

#[test]
fn check_sat_assuming_requires_incremental() {
    let script = "(set-logic QF_BV)\n(declare-const p (_ BitVec 1))\n(check-sat-assuming (p))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("incremental solving is not enabled"));
}

#[test]
fn unknown_option_is_rejected() {
    let (result, _, _) = run("(set-option :no-such-option 1)\n");
    assert!(error_of(result).contains("unsupported option: 'no-such-option'"));
}

#[test]
fn echo_prints_the_string() {
    let script = "(set-option :print-success false)\n(echo \"hello world\")\n";
    let (result, out, _) = run(script);
    result.unwrap();
    assert_eq!(out, "\"hello world\"\n");
}

#[test]
fn set_info_status_is_recorded() {
    let script = "(set-option :print-success false)\n(set-info :status unsat)\n";
    let (result, _, _) = run(script);
    assert_eq!(result.unwrap().status, SatResult::Unsat);
}

#[test]
fn get_info_answers_unsupported() {
    let script = "(set-option :print-success false)\n(get-info :version)\n";
    let (result, out, _) = run(script);
    result.unwrap();
    assert_eq!(out, "unsupported\n");
}

#[test]
fn unsupported_commands_error() {
    let (result, _, _) = run("(get-proof)\n");
    assert!(error_of(result).contains("unsupported command 'get-proof'"));
}

#[test]
fn unknown_command_word() {
    let (result, _, _) = run("(frobnicate)\n");
    assert!(error_of(result).contains("expected command at 'frobnicate'"));
}

#[test]
fn unsupported_logic() {
    let (result, _, _) = run("(set-logic QF_LIA)\n");
    assert!(error_of(result).contains("unsupported logic 'QF_LIA'"));
}

#[test]
fn exit_stops_the_parse() {
    let script = "(set-logic QF_BV)\n(exit)\n(this is never read\n";
    let (result, out, _) = run(script);
    result.unwrap();
    assert_eq!(out, "success\nsuccess\n");
}

#[test]
fn terminate_is_polled_between_commands() {
    let mut backend = NodeBackend::new();
    backend.set_terminated(true);
    let mut out = Vec::new();
    let script = "(set-logic QF_BV)\n(declare-const x (_ BitVec 1))\n";
    let result = Parser::new(&mut backend, script, "t.smt2", &mut out)
        .parse()
        .unwrap();
    // the first command runs, then the termination flag stops the loop
    assert_eq!(String::from_utf8(out).unwrap(), "success\n");
    assert_eq!(result.nsatcalls, 0);
    assert_eq!(backend.leaked(), 0);
}

// ---- model parsing mode -------------------------------------------------

#[test]
fn model_block_pins_symbols() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 4))
(model (define-fun x () (_ BitVec 4) #b1010))
(check-sat)
";
    let (result, out, backend) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
    // the model definition became the assertion (= x #b1010)
    assert_eq!(backend.num_assertions(), 1);
    assert_eq!(backend.leaked(), 0);
}

#[test]
fn model_block_rejects_other_commands() {
    let script = "(set-logic QF_BV)\n(model (check-sat))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("expected 'define-fun' after 'model'"));
}

#[test]
fn model_block_rejects_unknown_symbols() {
    let script = "(set-logic QF_BV)\n(model (define-fun y () (_ BitVec 4) #b1010))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("symbol 'y' undefined"));
}

#[test]
fn model_block_checks_sorts() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 4))
(model (define-fun x () (_ BitVec 8) #x00))
";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("invalid sort, expected"));
}

// ---- logic inference ----------------------------------------------------

#[test]
fn logic_inferred_without_set_logic() {
    let (result, _, _) = run("(declare-const x (_ BitVec 4))\n(assert (= x x))\n");
    assert_eq!(result.unwrap().logic.to_string(), "QF_BV");

    let (result, _, _) = run("(declare-fun f ((_ BitVec 4)) (_ BitVec 4))\n");
    assert_eq!(result.unwrap().logic.to_string(), "QF_UFBV");

    let script = "\
(declare-fun f ((_ BitVec 4)) (_ BitVec 4))
(declare-const a (Array (_ BitVec 4) (_ BitVec 4)))
";
    let (result, _, _) = run(script);
    assert_eq!(result.unwrap().logic.to_string(), "QF_AUFBV");

    let (result, _, _) = run("(assert (forall ((x (_ BitVec 1))) x))\n");
    assert_eq!(result.unwrap().logic.to_string(), "BV");
}

#[test]
fn logic_upgraded_when_functions_appear() {
    let script = "\
(set-logic QF_BV)
(declare-fun f ((_ BitVec 4)) (_ BitVec 4))
";
    let (result, _, _) = run(script);
    assert_eq!(result.unwrap().logic.to_string(), "QF_UFBV");
}

#[test]
fn logic_restricted_when_nothing_is_used() {
    let script = "\
(set-logic QF_AUFBV)
(declare-const x (_ BitVec 4))
(assert (= x x))
";
    let (result, _, _) = run(script);
    assert_eq!(result.unwrap().logic.to_string(), "QF_BV");
}

// ---- quote equivalence --------------------------------------------------

#[test]
fn quoted_and_plain_symbols_are_equal_by_default() {
    let script = "\
(set-logic QF_BV)
(declare-const x (_ BitVec 1))
(assert (= |x| x))
(check-sat)
";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn strict_quoting_option() {
    let mut backend = NodeBackend::new();
    let mut out = Vec::new();
    let script = "(set-logic QF_BV)\n(declare-const x (_ BitVec 1))\n(assert |x|)\n";
    let result = Parser::with_options(
        &mut backend,
        None,
        script,
        "t.smt2",
        &mut out,
        ParserOpts { quote_equiv: false },
    )
    .parse();
    assert!(error_of(result).contains("undefined symbol '|x|'"));
}

// ---- syntax corner cases ------------------------------------------------

#[test]
fn unexpected_empty_list() {
    let (result, _, _) = run("(assert ())\n");
    assert!(error_of(result).contains("unexpected '()'"));
}

#[test]
fn grouping_parentheses_collapse() {
    let script = "(set-logic QF_BV)\n(declare-const p (_ BitVec 1))\n(assert (p))\n(check-sat)\n";
    let (result, out, _) = run_queued(script, &[SatResult::Sat]);
    result.unwrap();
    assert!(out.ends_with("sat\n"));
}

#[test]
fn list_of_expressions_is_rejected() {
    let script = "(declare-const p (_ BitVec 1))\n(assert (p p))\n";
    let (result, _, _) = run(script);
    assert!(error_of(result).contains("list with 2 expressions"));
}

#[test]
fn unclosed_parenthesis_at_eof() {
    let (result, _, _) = run("(assert (bvadd #b1 #b1)\n");
    let msg = error_of(result);
    assert!(msg.contains("expected ')'") || msg.contains("not closed"), "got: {msg}");
}

#[test]
fn error_positions_are_one_based() {
    let (result, _, _) = run("(set-logic QF_BV)\n(assert nosuch)\n");
    let msg = error_of(result);
    assert!(msg.starts_with("test.smt2:2:9:"), "got: {msg}");
}
