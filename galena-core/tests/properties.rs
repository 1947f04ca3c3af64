//! Property-based tests for the front end: literal/width round-trips,
//! position tracking and shadow resolution.
//!
//! Run with: cargo test --test properties --features property-tests

#![cfg(feature = "property-tests")]

use galena_core::{NodeBackend, Parser, SatResult};
use proptest::prelude::*;

fn run_sat(script: &str) -> String {
    let mut backend = NodeBackend::new();
    backend.queue_result(SatResult::Sat);
    let mut out = Vec::new();
    Parser::new(&mut backend, script, "prop.smt2", &mut out)
        .parse()
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn run_err(script: &str) -> String {
    let mut backend = NodeBackend::new();
    let mut out = Vec::new();
    Parser::new(&mut backend, script, "prop.smt2", &mut out)
        .parse()
        .unwrap_err()
        .to_string()
}

proptest! {
    /// `(_ bvK n)` is the constant whose binary value is `K`, zero-extended
    /// to width `n`.
    #[test]
    fn bv_constant_round_trip(width in 1u32..=16, raw in 0u64..u64::MAX) {
        let value = raw & ((1u64 << width) - 1);
        let script = format!(
            "(set-option :print-success false)\n\
             (set-option :produce-models true)\n\
             (check-sat)\n\
             (get-value ((_ bv{value} {width})))\n"
        );
        let out = run_sat(&script);
        let bits = format!("{value:0width$b}", width = width as usize);
        prop_assert!(
            out.contains(&format!("(((_ bv{value} {width}) #b{bits}))")),
            "missing round-tripped value in {out}"
        );
    }

    /// `#xH` has width `4 * |H|` and the corresponding binary digits.
    #[test]
    fn hex_literal_width(hex in "[0-9a-fA-F]{1,8}") {
        let script = format!(
            "(set-option :print-success false)\n\
             (set-option :produce-models true)\n\
             (check-sat)\n\
             (get-value (#x{hex}))\n"
        );
        let out = run_sat(&script);
        let value = u64::from_str_radix(&hex, 16).unwrap();
        let bits = format!("{value:0width$b}", width = hex.len() * 4);
        prop_assert!(
            out.contains(&format!("((#x{hex} #b{bits}))")),
            "missing widened hex value in {out}"
        );
    }

    /// Error positions are the 1-based coordinate of the offending token.
    #[test]
    fn error_positions_track_the_source(lines in 0u32..5, indent in 0u32..8) {
        let script = format!(
            "{}{}(assert nosuch)\n",
            "\n".repeat(lines as usize),
            " ".repeat(indent as usize)
        );
        let msg = run_err(&script);
        let expected = format!("prop.smt2:{}:{}:", lines + 1, indent + 9);
        prop_assert!(msg.starts_with(&expected), "got {msg}, expected prefix {expected}");
    }

    /// A chain of shadowing `let`s always resolves to the innermost binding.
    #[test]
    fn let_chain_resolves_innermost(depth in 1usize..6) {
        let mut term = format!("(= x #b{})", "0".repeat(depth));
        for width in (1..=depth).rev() {
            term = format!("(let ((x #b{})) {term})", "0".repeat(width));
        }
        let script =
            format!("(set-option :print-success false)\n(assert {term})\n(check-sat)\n");
        let out = run_sat(&script);
        prop_assert_eq!(out, "sat\n");
    }

    /// Binary literals keep their exact width.
    #[test]
    fn binary_literal_width(bits in "[01]{1,24}") {
        let script = format!(
            "(set-option :print-success false)\n\
             (set-option :produce-models true)\n\
             (check-sat)\n\
             (get-value (#b{bits}))\n"
        );
        let out = run_sat(&script);
        prop_assert!(out.contains(&format!("((#b{bits} #b{bits}))")));
    }
}
