use crate::ir::{BinOp, InstKind};

use super::solver::AnalysisContext;
use super::{Diagnostic, DiagnosticKind};

/// Flag every division whose divisor may be zero at that point. An unknown
/// divisor contains every integer, zero included.
pub fn check(ctx: &AnalysisContext<'_>) -> Vec<Diagnostic> {
    let func = ctx.func;
    let mut diagnostics = Vec::new();
    for inst in func.insts() {
        let InstKind::Binary {
            op: BinOp::SDiv | BinOp::UDiv,
            rhs,
            ..
        } = &inst.kind
        else {
            continue;
        };
        let divisor = ctx.in_facts_of(inst.id).get_or_extract(func, rhs);
        if divisor.contains(0) {
            diagnostics.push(Diagnostic::new(DiagnosticKind::DivideByZero, func, inst.id));
        }
    }
    diagnostics
}
