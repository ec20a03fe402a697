use crate::alias::MayAlias;
use crate::domain::IntervalDomain;
use crate::ir::{AllocKind, BinOp, Function, InstKind, Instruction, Operand, PhiIncoming, Predicate};
use crate::util::FastHashSet;

use super::fact_map::{AllocSizeTable, FactMap};
use super::solver::PointerSet;

/// Bytes per array element assumed when sizing `malloc` results.
const INT_SIZE_BYTES: i64 = 4;

fn is_input_intrinsic(callee: &str) -> bool {
    matches!(callee, "getchar" | "fgetc")
}

/// Compute the gen and kill sets of one instruction.
///
/// `gen_set` holds new bindings, `kill_set` the names to drop from the
/// incoming facts before the gen bindings are merged in. Allocation sizes
/// are recorded directly in `alloc_size`, which only ever grows.
pub fn transfer(
    func: &Function,
    inst: &Instruction,
    in_facts: &FactMap,
    pointers: &PointerSet,
    alias: &dyn MayAlias,
    alloc_size: &mut AllocSizeTable,
) -> (FactMap, FastHashSet<String>) {
    let mut gen_set = FactMap::new();
    let mut kill_set = FastHashSet::default();
    let result = format!("%{}", inst.name);

    match &inst.kind {
        InstKind::Call { callee, args } => {
            if is_input_intrinsic(callee) {
                gen_set.insert(result, IntervalDomain::full());
            } else if callee == "malloc" {
                if let [Operand::Const(bytes)] = args.as_slice() {
                    alloc_size.insert(result, *bytes / INT_SIZE_BYTES);
                }
            } else if inst.ty.is_int() {
                // No interprocedural propagation: an integer result could be
                // anything.
                gen_set.insert(result, IntervalDomain::full());
            }
        }
        InstKind::Phi { incoming } => {
            gen_set.insert(result, eval_phi(func, in_facts, incoming));
        }
        InstKind::Binary { op, lhs, rhs } => {
            let lhs = in_facts.get_or_extract(func, lhs);
            let rhs = in_facts.get_or_extract(func, rhs);
            gen_set.insert(result, eval_binary(*op, lhs, rhs));
        }
        InstKind::Cast { src } => {
            gen_set.insert(result.clone(), in_facts.get_or_extract(func, src));
            if let Some(size) = alloc_size.get(&func.operand_name(src)).copied() {
                alloc_size.insert(result, size);
            }
        }
        InstKind::Cmp { pred, lhs, rhs } => {
            let lhs = in_facts.get_or_extract(func, lhs);
            let rhs = in_facts.get_or_extract(func, rhs);
            gen_set.insert(result, eval_cmp(*pred, &lhs, &rhs));
        }
        InstKind::Alloca { allocated } => match allocated {
            AllocKind::Array(len) => {
                alloc_size.insert(result, *len);
            }
            AllocKind::Int => {
                gen_set.insert(result, IntervalDomain::full());
            }
            AllocKind::Other => {}
        },
        InstKind::Gep { base, indices } => {
            if let Some(size) = alloc_size.get(&func.operand_name(base)).copied() {
                let remaining = match indices.first() {
                    Some(Operand::Const(offset)) => size - offset,
                    _ => size,
                };
                alloc_size.insert(result, remaining);
            }
        }
        InstKind::Store { value, ptr } => {
            if func.operand_ty(value).is_ptr() {
                // Storing a pointer forwards the allocation it refers to.
                if let Some(size) = alloc_size.get(&func.operand_name(value)).copied() {
                    alloc_size.insert(func.operand_name(ptr), size);
                }
            } else {
                let stored = in_facts.get_or_extract(func, value);
                let ptr_name = func.operand_name(ptr);
                // Weak update: every location that may alias the target keeps
                // its old contents joined with the stored value.
                for (name, operand) in pointers.iter() {
                    if alias.may_alias(&ptr_name, name) {
                        kill_set.insert(name.clone());
                        gen_set.insert(name.clone(), in_facts.get_or_extract(func, operand) | stored.clone());
                    }
                }
                // The target itself definitely holds the stored value.
                kill_set.insert(ptr_name.clone());
                gen_set.insert(ptr_name, stored);
            }
        }
        InstKind::Load { ptr } => {
            if inst.ty.is_int() {
                gen_set.insert(result, in_facts.get_or_extract(func, ptr));
            }
        }
        InstKind::Br { .. } | InstKind::Jump { .. } | InstKind::Ret { .. } => {
            // Flow-insensitive: predicates never strengthen successor facts.
        }
        InstKind::Other { mnemonic, .. } => {
            tracing::debug!(instruction = %func.display_inst(inst.id), %mnemonic, "unhandled instruction");
        }
    }

    (gen_set, kill_set)
}

/// A φ with a single distinct incoming value evaluates to it; otherwise the
/// incoming values are joined.
fn eval_phi(func: &Function, in_facts: &FactMap, incoming: &[PhiIncoming]) -> IntervalDomain {
    let mut distinct: Vec<&Operand> = Vec::new();
    for inc in incoming {
        if !distinct.contains(&&inc.value) {
            distinct.push(&inc.value);
        }
    }
    if let [only] = distinct[..] {
        return in_facts.get_or_extract(func, only);
    }
    let mut joined = IntervalDomain::bottom();
    for value in distinct {
        joined = joined | in_facts.get_or_extract(func, value);
    }
    joined
}

fn eval_binary(op: BinOp, lhs: IntervalDomain, rhs: IntervalDomain) -> IntervalDomain {
    match op {
        BinOp::Add => lhs + rhs,
        BinOp::Sub => lhs - rhs,
        BinOp::Mul => lhs * rhs,
        BinOp::SDiv | BinOp::UDiv => lhs / rhs,
    }
}

/// Comparison results are `{1}` when the relation is certain, `{0}` when it
/// is impossible, and `{0, 1}` otherwise.
fn eval_cmp(pred: Predicate, lhs: &IntervalDomain, rhs: &IntervalDomain) -> IntervalDomain {
    if lhs.is_unknown() && rhs.is_unknown() {
        return IntervalDomain::unknown();
    }
    if lhs.is_bottom() || rhs.is_bottom() {
        return IntervalDomain::bottom();
    }
    match decide_cmp(pred, lhs, rhs) {
        Some(true) => IntervalDomain::singleton(1),
        Some(false) => IntervalDomain::singleton(0),
        None => IntervalDomain::range(0, 1),
    }
}

fn decide_cmp(pred: Predicate, lhs: &IntervalDomain, rhs: &IntervalDomain) -> Option<bool> {
    if lhs.is_unknown() || rhs.is_unknown() {
        return None;
    }
    // Unsigned orderings agree with signed ones only when both ranges are
    // known non-negative.
    if !pred.is_signed() && (lhs.lower() < 0 || rhs.lower() < 0) {
        return None;
    }
    match pred {
        Predicate::Eq => decide_eq(lhs, rhs),
        Predicate::Ne => decide_eq(lhs, rhs).map(|eq| !eq),
        Predicate::Slt | Predicate::Ult => decide_lt(lhs, rhs),
        Predicate::Sgt | Predicate::Ugt => decide_lt(rhs, lhs),
        Predicate::Sle | Predicate::Ule => decide_lt(rhs, lhs).map(|gt| !gt),
        Predicate::Sge | Predicate::Uge => decide_lt(lhs, rhs).map(|lt| !lt),
    }
}

fn decide_eq(lhs: &IntervalDomain, rhs: &IntervalDomain) -> Option<bool> {
    match (lhs.as_singleton(), rhs.as_singleton()) {
        (Some(a), Some(b)) => Some(a == b),
        _ if !lhs.overlaps(rhs) => Some(false),
        _ => None,
    }
}

fn decide_lt(lhs: &IntervalDomain, rhs: &IntervalDomain) -> Option<bool> {
    if lhs.upper() < rhs.lower() {
        Some(true)
    } else if lhs.lower() >= rhs.upper() {
        Some(false)
    } else {
        None
    }
}
