use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use super::{INT_INF, INT_NEG_INF, IntervalDomain};

fn d(lo: i64, hi: i64) -> IntervalDomain {
    IntervalDomain::range(lo, hi)
}

fn s(val: i64) -> IntervalDomain {
    IntervalDomain::singleton(val)
}

/// Canonical form: sorted, non-empty, disjoint and non-adjacent components.
fn is_canonical(domain: &IntervalDomain) -> bool {
    let Some(ranges) = domain.ranges() else {
        return true;
    };
    if ranges.iter().any(|iv| iv.is_empty()) {
        return false;
    }
    ranges
        .windows(2)
        .all(|pair| pair[0].upper().saturating_add(1) < pair[1].lower())
}

#[derive(Clone, Debug)]
struct ArbDomain(IntervalDomain);

impl Arbitrary for ArbDomain {
    fn arbitrary(g: &mut Gen) -> Self {
        if u8::arbitrary(g) % 8 == 0 {
            return ArbDomain(IntervalDomain::unknown());
        }
        let mut domain = IntervalDomain::bottom();
        for _ in 0..(usize::arbitrary(g) % 4) {
            let lo = match u8::arbitrary(g) % 10 {
                0 => INT_NEG_INF,
                _ => i64::from(i8::arbitrary(g) % 50),
            };
            let width = i64::from(u8::arbitrary(g) % 20);
            let hi = match u8::arbitrary(g) % 10 {
                0 => INT_INF,
                _ => lo.saturating_add(width),
            };
            domain = domain | IntervalDomain::range(lo, hi);
        }
        ArbDomain(domain)
    }
}

#[quickcheck]
fn join_is_idempotent(a: ArbDomain) -> bool {
    a.0.clone() | a.0.clone() == a.0
}

#[quickcheck]
fn meet_is_idempotent(a: ArbDomain) -> bool {
    a.0.clone() & a.0.clone() == a.0
}

#[quickcheck]
fn join_is_commutative(a: ArbDomain, b: ArbDomain) -> bool {
    a.0.clone() | b.0.clone() == b.0 | a.0
}

#[quickcheck]
fn meet_is_commutative(a: ArbDomain, b: ArbDomain) -> bool {
    a.0.clone() & b.0.clone() == b.0 & a.0
}

#[quickcheck]
fn join_is_associative(a: ArbDomain, b: ArbDomain, c: ArbDomain) -> bool {
    (a.0.clone() | b.0.clone()) | c.0.clone() == a.0 | (b.0 | c.0)
}

#[quickcheck]
fn meet_is_associative(a: ArbDomain, b: ArbDomain, c: ArbDomain) -> bool {
    (a.0.clone() & b.0.clone()) & c.0.clone() == a.0 & (b.0 & c.0)
}

#[quickcheck]
fn join_absorbs_meet(a: ArbDomain, b: ArbDomain) -> bool {
    a.0.clone() | (a.0.clone() & b.0) == a.0
}

#[quickcheck]
fn bottom_is_join_identity(a: ArbDomain) -> bool {
    a.0.clone() | IntervalDomain::bottom() == a.0
}

#[quickcheck]
fn unknown_is_meet_identity(a: ArbDomain) -> bool {
    a.0.clone() & IntervalDomain::unknown() == a.0
}

#[quickcheck]
fn unknown_absorbs_join(a: ArbDomain) -> bool {
    (a.0 | IntervalDomain::unknown()).is_unknown()
}

#[quickcheck]
fn public_ops_stay_canonical(a: ArbDomain, b: ArbDomain) -> bool {
    let (a, b) = (a.0, b.0);
    [
        a.clone() | b.clone(),
        a.clone() & b.clone(),
        a.clone() + b.clone(),
        a.clone() - b.clone(),
        a.clone() * b.clone(),
        a.clone() / b.clone(),
        -a.clone(),
        !a.clone(),
        a.clamp(-10, 10),
    ]
    .iter()
    .all(is_canonical)
}

#[quickcheck]
fn unknown_absorbs_arithmetic(a: ArbDomain) -> bool {
    let u = IntervalDomain::unknown();
    (a.0.clone() + u.clone()).is_unknown()
        && (a.0.clone() - u.clone()).is_unknown()
        && (a.0.clone() * u.clone()).is_unknown()
        && (a.0 / u).is_unknown()
}

#[test]
fn singleton_arithmetic_matches_scalars() {
    for a in -6i64..=6 {
        for b in -6i64..=6 {
            assert_eq!(s(a) + s(b), s(a + b));
            assert_eq!(s(a) - s(b), s(a - b));
            assert_eq!(s(a) * s(b), s(a * b));
            if b != 0 {
                assert_eq!(s(a) / s(b), s(a / b));
            }
            assert_eq!(-s(a), s(-a));
        }
    }
}

#[test]
fn division_by_zero_crossing_divisor() {
    assert_eq!(d(1, 2) / d(-3, 4), IntervalDomain::full());
    assert_eq!(d(1, 2) / d(3, 4), s(0));
    // A union divisor that skips zero stays finite per pair.
    let divisor = s(-2) | s(3);
    assert_eq!(d(10, 10) / divisor, s(-5) | s(3));
}

#[test]
fn join_coalesces_touching_components() {
    let joined = s(0) | s(1) | s(2);
    assert_eq!(joined, d(0, 2));
    let gap = s(0) | s(5);
    assert_eq!(gap.ranges().map(|ranges| ranges.len()), Some(2));
    assert_eq!(gap | d(1, 4), d(0, 5));
}

#[test]
fn meet_drops_nonoverlapping_components() {
    assert_eq!(d(0, 5) & d(3, 9), d(3, 5));
    assert!((d(0, 1) & d(5, 9)).is_bottom());
    assert_eq!((s(0) | s(5)) & d(4, 9), s(5));
}

#[test]
fn complement_of_bounded_domain_roundtrips() {
    let domain = s(1) | d(5, 7);
    let complement = !domain.clone();
    assert_eq!(!complement, domain);
    assert_eq!(!IntervalDomain::bottom(), IntervalDomain::full());
    assert!((!IntervalDomain::full()).is_bottom());
    assert!((!IntervalDomain::unknown()).is_unknown());
}

#[test]
fn complement_produces_gaps_and_tails() {
    let complement = !d(0, 9);
    assert_eq!(complement, d(INT_NEG_INF, -1) | d(10, INT_INF));
}

#[test]
fn clamp_intersects_every_component() {
    let domain = d(-5, -3) | d(2, 8) | d(20, 30);
    assert_eq!(domain.clamp(0, 25), d(2, 8) | d(20, 25));
    assert!(d(5, 9).clamp(20, 30).is_bottom());
    assert!(IntervalDomain::unknown().clamp(0, 1).is_unknown());
}

#[test]
fn bounds_of_special_elements() {
    assert_eq!(IntervalDomain::unknown().lower(), INT_NEG_INF);
    assert_eq!(IntervalDomain::unknown().upper(), INT_INF);
    assert_eq!(IntervalDomain::bottom().lower(), INT_INF);
    assert_eq!(IntervalDomain::bottom().upper(), INT_NEG_INF);
    assert_eq!((s(3) | s(9)).lower(), 3);
    assert_eq!((s(3) | s(9)).upper(), 9);
}

#[test]
fn contains_respects_unknown_and_bottom() {
    assert!(IntervalDomain::unknown().contains(42));
    assert!(!IntervalDomain::bottom().contains(42));
    assert!((s(1) | s(5)).contains(5));
    assert!(!(s(1) | s(5)).contains(3));
}

#[test]
fn display_renders_components() {
    assert_eq!(s(3).to_string(), "{[3, 3]}");
    assert_eq!((s(0) | s(5)).to_string(), "{[0, 0], [5, 5]}");
    assert_eq!(IntervalDomain::unknown().to_string(), "unknown");
    assert_eq!(IntervalDomain::full().to_string(), "{[-inf, +inf]}");
    assert_eq!(IntervalDomain::bottom().to_string(), "{}");
}
