use std::fmt;
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Sub};

use super::interval::{INT_INF, INT_NEG_INF, Interval};

/// Lattice element: either *unknown* (a value the analysis does not track as
/// an integer) or a canonical union of disjoint, non-adjacent intervals.
///
/// `Ranges(vec![])` is bottom (infeasible). *Unknown* absorbs arithmetic and
/// join; bottom is the identity of join. Every public operation returns a
/// canonical value: components sorted by lower bound, non-empty, and
/// separated by at least one missing integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalDomain {
    Unknown,
    Ranges(Vec<Interval>),
}

use IntervalDomain::{Ranges, Unknown};

impl IntervalDomain {
    pub const fn unknown() -> Self {
        Unknown
    }

    pub const fn bottom() -> Self {
        Ranges(Vec::new())
    }

    /// The full line `{[−∞, +∞]}`.
    pub fn full() -> Self {
        Ranges(vec![Interval::full()])
    }

    pub fn singleton(val: i64) -> Self {
        Ranges(vec![Interval::singleton(val)])
    }

    /// `{[lo, hi]}`, or bottom when `lo > hi`.
    pub fn range(lo: i64, hi: i64) -> Self {
        Self::canonical(vec![Interval::new(lo, hi)])
    }

    /// Canonicalize an arbitrary interval collection into a domain.
    fn canonical(intervals: Vec<Interval>) -> Self {
        let mut intervals = intervals;
        maintain(&mut intervals);
        Ranges(intervals)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Unknown)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Ranges(intervals) if intervals.is_empty())
    }

    /// `true` when the domain holds exactly one integer.
    pub fn as_singleton(&self) -> Option<i64> {
        match self {
            Ranges(intervals) if intervals.len() == 1 && intervals[0].lower() == intervals[0].upper() => {
                Some(intervals[0].lower())
            }
            _ => None,
        }
    }

    /// The component intervals, or `None` for unknown.
    pub fn ranges(&self) -> Option<&[Interval]> {
        match self {
            Unknown => None,
            Ranges(intervals) => Some(intervals),
        }
    }

    pub fn contains(&self, val: i64) -> bool {
        match self {
            Unknown => true,
            Ranges(intervals) => intervals.iter().any(|iv| iv.contains(val)),
        }
    }

    pub fn overlaps(&self, other: &IntervalDomain) -> bool {
        match (self, other) {
            (Unknown, _) | (_, Unknown) => true,
            (Ranges(a), Ranges(b)) => a.iter().any(|x| b.iter().any(|y| x.overlaps(*y))),
        }
    }

    /// Smallest value the domain may hold; unknown is unbounded below and
    /// bottom reports `+∞` (nothing below it).
    pub fn lower(&self) -> i64 {
        match self {
            Unknown => INT_NEG_INF,
            Ranges(intervals) => intervals.first().map_or(INT_INF, |iv| iv.lower()),
        }
    }

    pub fn upper(&self) -> i64 {
        match self {
            Unknown => INT_INF,
            Ranges(intervals) => intervals.last().map_or(INT_NEG_INF, |iv| iv.upper()),
        }
    }

    /// Intersect every component with `[lo, hi]`.
    pub fn clamp(&self, lo: i64, hi: i64) -> IntervalDomain {
        match self {
            Unknown => Unknown,
            Ranges(intervals) => {
                let bound = Interval::new(lo, hi);
                Self::canonical(intervals.iter().map(|iv| *iv & bound).collect())
            }
        }
    }

    /// Apply an interval operation to every component pair and canonicalize.
    /// Unknown absorbs.
    fn lift(&self, other: &IntervalDomain, op: impl Fn(Interval, Interval) -> Interval) -> IntervalDomain {
        match (self, other) {
            (Unknown, _) | (_, Unknown) => Unknown,
            (Ranges(a), Ranges(b)) => {
                let mut out = Vec::with_capacity(a.len() * b.len());
                for x in a {
                    for y in b {
                        out.push(op(*x, *y));
                    }
                }
                Self::canonical(out)
            }
        }
    }
}

/// Canonical form: sort by lower bound, drop empties, coalesce components
/// that overlap or touch.
fn maintain(intervals: &mut Vec<Interval>) {
    intervals.retain(|iv| !iv.is_empty());
    intervals.sort_by_key(|iv| iv.lower());
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals.drain(..) {
        match merged.last_mut() {
            Some(last) if last.upper().saturating_add(1) >= iv.lower() => *last = *last | iv,
            _ => merged.push(iv),
        }
    }
    *intervals = merged;
}

impl From<i64> for IntervalDomain {
    fn from(val: i64) -> Self {
        IntervalDomain::singleton(val)
    }
}

impl From<Interval> for IntervalDomain {
    fn from(iv: Interval) -> Self {
        IntervalDomain::canonical(vec![iv])
    }
}

impl Add for IntervalDomain {
    type Output = IntervalDomain;

    fn add(self, rhs: IntervalDomain) -> IntervalDomain {
        self.lift(&rhs, |a, b| a + b)
    }
}

impl Sub for IntervalDomain {
    type Output = IntervalDomain;

    fn sub(self, rhs: IntervalDomain) -> IntervalDomain {
        self.lift(&rhs, |a, b| a - b)
    }
}

impl Mul for IntervalDomain {
    type Output = IntervalDomain;

    fn mul(self, rhs: IntervalDomain) -> IntervalDomain {
        self.lift(&rhs, |a, b| a * b)
    }
}

impl Div for IntervalDomain {
    type Output = IntervalDomain;

    fn div(self, rhs: IntervalDomain) -> IntervalDomain {
        self.lift(&rhs, |a, b| a / b)
    }
}

impl Neg for IntervalDomain {
    type Output = IntervalDomain;

    fn neg(self) -> IntervalDomain {
        match self {
            Unknown => Unknown,
            Ranges(intervals) => IntervalDomain::canonical(intervals.into_iter().map(|iv| -iv).collect()),
        }
    }
}

/// Join: multiset union of the components. Unknown dominates; bottom is the
/// identity.
impl BitOr for IntervalDomain {
    type Output = IntervalDomain;

    fn bitor(self, rhs: IntervalDomain) -> IntervalDomain {
        match (self, rhs) {
            (Unknown, _) | (_, Unknown) => Unknown,
            (Ranges(mut a), Ranges(b)) => {
                a.extend(b);
                IntervalDomain::canonical(a)
            }
        }
    }
}

/// Meet: pairwise intersection of the components. Unknown is the lattice
/// top, so it is the identity here.
impl BitAnd for IntervalDomain {
    type Output = IntervalDomain;

    fn bitand(self, rhs: IntervalDomain) -> IntervalDomain {
        match (self, rhs) {
            (Unknown, other) | (other, Unknown) => other,
            (a @ Ranges(_), b @ Ranges(_)) => a.lift(&b, |x, y| x & y),
        }
    }
}

/// Complement: the gaps between components plus the unbounded tails.
impl Not for IntervalDomain {
    type Output = IntervalDomain;

    fn not(self) -> IntervalDomain {
        let intervals = match &self {
            Unknown => return Unknown,
            Ranges(intervals) if intervals.is_empty() => return IntervalDomain::full(),
            Ranges(intervals) => intervals,
        };
        let mut out = Vec::with_capacity(intervals.len() + 1);
        let first = intervals[0];
        if first.lower() > INT_NEG_INF {
            out.push(Interval::new(INT_NEG_INF, first.lower() - 1));
        }
        for pair in intervals.windows(2) {
            out.push(Interval::new(pair[0].upper() + 1, pair[1].lower() - 1));
        }
        let last = intervals[intervals.len() - 1];
        if last.upper() < INT_INF {
            out.push(Interval::new(last.upper() + 1, INT_INF));
        }
        Ranges(out)
    }
}

impl fmt::Display for IntervalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unknown => write!(f, "unknown"),
            Ranges(intervals) => {
                write!(f, "{{")?;
                for (i, iv) in intervals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{iv}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
