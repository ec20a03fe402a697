use std::fmt::Write as _;

use super::solver::AnalysisContext;

/// Render the final IN and OUT fact maps of every instruction, in program
/// order with sorted keys, for debugging.
pub fn dump_analysis(ctx: &AnalysisContext<'_>) -> String {
    let func = ctx.func;
    let mut out = String::new();
    let _ = writeln!(out, "Dataflow analysis results for @{}:", func.name);
    for inst in func.insts() {
        let _ = writeln!(out, "{}", func.display_inst(inst.id));
        let _ = writeln!(out, "  IN:");
        for line in ctx.in_facts_of(inst.id).to_string().lines() {
            let _ = writeln!(out, "    {line}");
        }
        let _ = writeln!(out, "  OUT:");
        for line in ctx.out_facts_of(inst.id).to_string().lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}
