//! Tests for precision rounding, currency rounding and SI formatting

use yeri::numbers::{
    ceil_to_currency, ceil_to_precision, floor_to_precision, from_si, round_to_currency, round_to_precision,
    to_si, Rounding,
};

use crate::common::float_cmp::{assert_approx_eq, DEFAULT_TOLERANCE};

// ============================================
// Precision Tests
// ============================================

#[test]
fn test_ceil_to_precision() {
    assert_eq!(ceil_to_precision(123.0, 1), 200.0);
    assert_eq!(ceil_to_precision(123.0, 2), 130.0);
    assert_eq!(ceil_to_precision(4087123.0, 3), 4090000.0);
    assert_eq!(ceil_to_precision(165.0, 2), 170.0);
}

#[test]
fn test_floor_to_precision() {
    assert_eq!(floor_to_precision(0.00914, 2), 0.0091);
    assert_eq!(floor_to_precision(187.0, 1), 100.0);
    assert_eq!(floor_to_precision(-123.0, 2), -130.0);
}

#[test]
fn test_round_to_precision() {
    assert_eq!(round_to_precision(4087123.0, 2, Rounding::Round), 4100000.0);
    assert_eq!(round_to_precision(0.0, 3, Rounding::Ceil), 0.0);
    assert!(round_to_precision(f64::NAN, 3, Rounding::Floor).is_nan());
}

// ============================================
// Currency Tests
// ============================================

#[test]
fn test_ceil_to_currency() {
    assert_eq!(ceil_to_currency(1.0), 1.0);
    assert_eq!(ceil_to_currency(3.0), 5.0);
    assert_eq!(ceil_to_currency(7.0), 10.0);
    assert_eq!(ceil_to_currency(34.0), 50.0);
    assert_eq!(ceil_to_currency(120.0), 200.0);
    assert_approx_eq(ceil_to_currency(0.03), 0.05, DEFAULT_TOLERANCE);
    assert_eq!(ceil_to_currency(0.0), 0.0);
}

#[test]
fn test_round_to_currency() {
    assert_eq!(round_to_currency(30.0), 20.0);
    assert_eq!(round_to_currency(40.0), 50.0);
    assert_eq!(round_to_currency(80.0), 100.0);
}

// ============================================
// SI Formatting Tests
// ============================================

#[test]
fn test_to_si() {
    assert_eq!(to_si(0.0), "0");
    assert_eq!(to_si(250.0), "250");
    assert_eq!(to_si(1500.0), "1.5k");
    assert_eq!(to_si(1234.0), "1.23k");
    assert_eq!(to_si(12e6), "12M");
    assert_eq!(to_si(0.003), "3m");
    assert_eq!(to_si(-2500.0), "-2.5k");
}

#[test]
fn test_to_si_carries_into_next_prefix() {
    assert_eq!(to_si(999999.0), "1M");
    assert_eq!(to_si(999.9), "1k");
}

#[test]
fn test_from_si_reads_to_si_output() {
    for n in [0.0, 250.0, 1500.0, 12e6] {
        let parsed = from_si(&to_si(n)).expect("parse");
        assert_approx_eq(parsed, n, DEFAULT_TOLERANCE);
    }
    assert_approx_eq(from_si("3m").expect("parse"), 0.003, 1e-12);
}
