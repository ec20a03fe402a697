use crate::ir::{InstKind, Operand};

use super::solver::AnalysisContext;
use super::{Diagnostic, DiagnosticKind};

/// Flag every indexing instruction whose index interval can escape the
/// known size of the underlying allocation.
///
/// GEPs with two index operands address an array element through its first
/// dimension (`base, 0, i`), so the second index is the interesting one;
/// single-index GEPs are raw pointer offsets.
pub fn check(ctx: &AnalysisContext<'_>) -> Vec<Diagnostic> {
    let func = ctx.func;
    let mut diagnostics = Vec::new();
    for inst in func.insts() {
        let InstKind::Gep { base, indices } = &inst.kind else {
            continue;
        };
        let Some(size) = ctx.alloc_size.get(&func.operand_name(base)).copied() else {
            // Unsized base: nothing to check against.
            continue;
        };
        let index = match indices.len() {
            0 => continue,
            1 => &indices[0],
            _ => &indices[1],
        };
        let flagged = match index {
            Operand::Const(val) => *val < 0 || *val >= size,
            _ => {
                let idx = ctx.in_facts_of(inst.id).get_or_extract(func, index);
                idx.lower() < 0 || idx.upper() >= size
            }
        };
        if flagged {
            diagnostics.push(Diagnostic::new(DiagnosticKind::OutOfBounds, func, inst.id));
        }
    }
    diagnostics
}
