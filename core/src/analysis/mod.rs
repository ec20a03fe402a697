//! The abstract interpretation engine: fact maps, the per-instruction
//! transfer function, the chaotic-iteration solver, and the post-fixpoint
//! checks it feeds.

use std::fmt;

use serde::Serialize;

use crate::alias::MayAlias;
use crate::ir::{Function, InstId};

mod bounds;
mod div_zero;
mod dump;
mod fact_map;
mod solver;
mod transfer;


pub use dump::dump_analysis;
pub use fact_map::{AllocSizeTable, FactMap, domain_of};
pub use solver::{AnalysisContext, PointerSet, solve};
pub use transfer::transfer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    OutOfBounds,
    DivideByZero,
}

/// A warning attached to one instruction. Warnings never abort the
/// analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Printable identifier of the flagged instruction.
    pub instruction: String,
    /// The instruction rendered for human consumption.
    pub rendered: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, func: &Function, id: InstId) -> Self {
        Self {
            kind,
            instruction: format!("%{}", func.inst(id).name),
            rendered: func.display_inst(id),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::OutOfBounds => {
                write!(f, "Potential array out of bounds error: {}", self.rendered)
            }
            DiagnosticKind::DivideByZero => {
                write!(f, "Potential divide by zero error: {}", self.rendered)
            }
        }
    }
}

/// Final facts plus the warnings derived from them.
#[derive(Debug)]
pub struct AnalysisResult<'f> {
    pub context: AnalysisContext<'f>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The per-function pass: run the fixpoint, then the bounds and
/// divide-by-zero checks over the final facts.
pub struct OobChecker;

impl OobChecker {
    pub fn run<'f>(func: &'f Function, alias: &dyn MayAlias) -> AnalysisResult<'f> {
        tracing::debug!(function = %func.name, "running interval analysis");
        let context = solve(func, alias);

        let mut diagnostics = bounds::check(&context);
        diagnostics.extend(div_zero::check(&context));
        for diagnostic in &diagnostics {
            tracing::warn!("{diagnostic}");
        }

        AnalysisResult { context, diagnostics }
    }
}
