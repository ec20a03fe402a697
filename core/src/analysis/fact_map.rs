use std::fmt;

use crate::domain::IntervalDomain;
use crate::ir::{AllocKind, Function, InstKind, Operand};
use crate::util::FastHashMap;

/// Element count of the allocation each tracked pointer refers to.
pub type AllocSizeTable = FastHashMap<String, i64>;

/// Synthesize a domain for an IR value that has no fact yet.
///
/// Constants are exact; integer-typed arguments, integer allocas, and
/// integer call results could be anything, so they get the full line;
/// everything non-integral is unknown.
pub fn domain_of(func: &Function, operand: &Operand) -> IntervalDomain {
    match operand {
        Operand::Const(val) => IntervalDomain::singleton(*val),
        Operand::Arg(id) if func.param(*id).ty.is_int() => IntervalDomain::full(),
        Operand::Global(id) => match func.global(*id).init {
            Some(val) => IntervalDomain::singleton(val),
            None => IntervalDomain::unknown(),
        },
        Operand::Inst(id) => match &func.inst(*id).kind {
            InstKind::Alloca {
                allocated: AllocKind::Int,
            } => IntervalDomain::full(),
            InstKind::Call { .. } if func.inst(*id).ty.is_int() => IntervalDomain::full(),
            _ => IntervalDomain::unknown(),
        },
        _ => IntervalDomain::unknown(),
    }
}

/// Facts at one program point: value name to domain.
///
/// A missing key means the value holds *unknown*; equality honours that so
/// the fixpoint check does not distinguish an explicit unknown binding from
/// an absent one.
#[derive(Debug, Clone, Default)]
pub struct FactMap {
    data: FastHashMap<String, IntervalDomain>,
}

impl FactMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&IntervalDomain> {
        self.data.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, domain: IntervalDomain) {
        self.data.insert(name.into(), domain);
    }

    pub fn remove(&mut self, name: &str) {
        self.data.remove(name);
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IntervalDomain)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bound domain for an operand, or one synthesized from the IR.
    /// Keeps transfer rules independent of which values have facts yet.
    pub fn get_or_extract(&self, func: &Function, operand: &Operand) -> IntervalDomain {
        match self.data.get(&func.operand_name(operand)) {
            Some(domain) => domain.clone(),
            None => domain_of(func, operand),
        }
    }

    /// Join facts flowing in over a CFG edge. Bindings present on both sides
    /// are domain-joined; a binding missing on one side is copied, the
    /// absent side acting as the join identity.
    pub fn merge(&mut self, other: &FactMap) {
        for (name, domain) in &other.data {
            match self.data.get_mut(name) {
                Some(existing) => *existing = existing.clone() | domain.clone(),
                None => {
                    self.data.insert(name.clone(), domain.clone());
                }
            }
        }
    }
}

fn covered_by(a: &FactMap, b: &FactMap) -> bool {
    a.data.iter().all(|(name, domain)| match b.data.get(name) {
        Some(other) => domain == other,
        None => domain.is_unknown(),
    })
}

impl PartialEq for FactMap {
    fn eq(&self, other: &Self) -> bool {
        covered_by(self, other) && covered_by(other, self)
    }
}

impl Eq for FactMap {}

impl fmt::Display for FactMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.data.iter().collect();
        entries.sort_by_key(|(name, _)| name.as_str());
        for (name, domain) in entries {
            writeln!(f, "{name} |-> {domain}")?;
        }
        Ok(())
    }
}
