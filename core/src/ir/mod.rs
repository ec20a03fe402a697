//! The SSA control-flow-graph IR the analysis consumes.
//!
//! The engine does not parse anything; hosts (and tests) assemble functions
//! through [`FunctionBuilder`]. Terminators are ordinary instructions placed
//! last in their block, so a worklist over instructions sees the whole CFG.

use std::fmt;

mod builder;

#[cfg(test)]
mod ir_test;

pub use builder::FunctionBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstId(u32);

impl InstId {
    fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

impl BlockId {
    const ENTRY: BlockId = BlockId(0);

    pub const fn entry() -> Self {
        BlockId::ENTRY
    }

    fn new(raw: u32) -> Self {
        BlockId(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId(pub usize);

/// Result type of a value, as coarse as the analysis needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Int,
    Ptr,
    Other,
}

impl Ty {
    pub fn is_int(self) -> bool {
        matches!(self, Ty::Int)
    }

    pub fn is_ptr(self) -> bool {
        matches!(self, Ty::Ptr)
    }
}

/// What an `alloca` reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocKind {
    Int,
    /// An integer array with the given element count.
    Array(i64),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
}

impl BinOp {
    fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::UDiv => "udiv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl Predicate {
    pub fn is_signed(self) -> bool {
        !matches!(self, Predicate::Ult | Predicate::Ule | Predicate::Ugt | Predicate::Uge)
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Predicate::Eq => "eq",
            Predicate::Ne => "ne",
            Predicate::Slt => "slt",
            Predicate::Sle => "sle",
            Predicate::Sgt => "sgt",
            Predicate::Sge => "sge",
            Predicate::Ult => "ult",
            Predicate::Ule => "ule",
            Predicate::Ugt => "ugt",
            Predicate::Uge => "uge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Const(i64),
    Inst(InstId),
    Arg(ArgId),
    Global(GlobalId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiIncoming {
    pub block: BlockId,
    pub value: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    Binary {
        op: BinOp,
        lhs: Operand,
        rhs: Operand,
    },
    Cmp {
        pred: Predicate,
        lhs: Operand,
        rhs: Operand,
    },
    Cast {
        src: Operand,
    },
    Phi {
        incoming: Vec<PhiIncoming>,
    },
    Alloca {
        allocated: AllocKind,
    },
    Load {
        ptr: Operand,
    },
    Store {
        value: Operand,
        ptr: Operand,
    },
    Gep {
        base: Operand,
        indices: Vec<Operand>,
    },
    Call {
        callee: String,
        args: Vec<Operand>,
    },
    Br {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Jump {
        target: BlockId,
    },
    Ret {
        value: Option<Operand>,
    },
    /// An opcode the analysis does not model. Sound to ignore.
    Other {
        mnemonic: String,
        operands: Vec<Operand>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub id: InstId,
    pub block: BlockId,
    /// Printable unique identifier, without the `%` sigil.
    pub name: String,
    pub ty: Ty,
    pub kind: InstKind,
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, InstKind::Br { .. } | InstKind::Jump { .. } | InstKind::Ret { .. })
    }

    /// Blocks this instruction transfers control to (empty unless it is a
    /// terminator).
    pub fn successor_blocks(&self) -> Vec<BlockId> {
        match &self.kind {
            InstKind::Br {
                then_block, else_block, ..
            } => vec![*then_block, *else_block],
            InstKind::Jump { target } => vec![*target],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    /// Constant integer initializer, when the global has one.
    pub init: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub insts: Vec<InstId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub globals: Vec<Global>,
    pub blocks: Vec<Block>,
    insts: Vec<Instruction>,
}

impl Function {
    pub fn inst(&self, id: InstId) -> &Instruction {
        &self.insts[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// All instructions in program order (block order, then block position).
    pub fn insts(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks
            .iter()
            .flat_map(|block| block.insts.iter().map(|id| &self.insts[id.index()]))
    }

    pub fn first_inst(&self) -> Option<InstId> {
        self.blocks.first().and_then(|block| block.insts.first().copied())
    }

    pub fn param(&self, id: ArgId) -> &Param {
        &self.params[id.0]
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.0]
    }

    /// The printable name of an operand, used as the fact-map key.
    pub fn operand_name(&self, operand: &Operand) -> String {
        match operand {
            Operand::Const(val) => val.to_string(),
            Operand::Inst(id) => format!("%{}", self.inst(*id).name),
            Operand::Arg(id) => format!("%{}", self.param(*id).name),
            Operand::Global(id) => format!("@{}", self.global(*id).name),
        }
    }

    pub fn operand_ty(&self, operand: &Operand) -> Ty {
        match operand {
            Operand::Const(_) => Ty::Int,
            Operand::Inst(id) => self.inst(*id).ty,
            Operand::Arg(id) => self.param(*id).ty,
            Operand::Global(_) => Ty::Ptr,
        }
    }

    /// CFG predecessors of every block, indexed by block.
    pub fn block_predecessors(&self) -> Vec<Vec<BlockId>> {
        let mut preds = vec![Vec::new(); self.blocks.len()];
        for block in &self.blocks {
            if let Some(last) = block.insts.last() {
                for succ in self.inst(*last).successor_blocks() {
                    preds[succ.index()].push(block.id);
                }
            }
        }
        preds
    }

    /// Render one instruction LLVM-ish, e.g. `%2 = add %0, %1`.
    pub fn display_inst(&self, id: InstId) -> String {
        let inst = self.inst(id);
        let name = |op: &Operand| self.operand_name(op);
        match &inst.kind {
            InstKind::Binary { op, lhs, rhs } => {
                format!("%{} = {} {}, {}", inst.name, op.mnemonic(), name(lhs), name(rhs))
            }
            InstKind::Cmp { pred, lhs, rhs } => {
                format!("%{} = icmp {} {}, {}", inst.name, pred.mnemonic(), name(lhs), name(rhs))
            }
            InstKind::Cast { src } => format!("%{} = cast {}", inst.name, name(src)),
            InstKind::Phi { incoming } => {
                let sources: Vec<String> = incoming
                    .iter()
                    .map(|inc| format!("[ {}, bb{} ]", name(&inc.value), inc.block.index()))
                    .collect();
                format!("%{} = phi {}", inst.name, sources.join(", "))
            }
            InstKind::Alloca { allocated } => match allocated {
                AllocKind::Int => format!("%{} = alloca i64", inst.name),
                AllocKind::Array(n) => format!("%{} = alloca [{n} x i64]", inst.name),
                AllocKind::Other => format!("%{} = alloca opaque", inst.name),
            },
            InstKind::Load { ptr } => format!("%{} = load {}", inst.name, name(ptr)),
            InstKind::Store { value, ptr } => format!("store {}, {}", name(value), name(ptr)),
            InstKind::Gep { base, indices } => {
                let mut parts = vec![name(base)];
                parts.extend(indices.iter().map(|idx| name(idx)));
                format!("%{} = getelementptr {}", inst.name, parts.join(", "))
            }
            InstKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|arg| name(arg)).collect();
                format!("%{} = call @{}({})", inst.name, callee, args.join(", "))
            }
            InstKind::Br {
                cond,
                then_block,
                else_block,
            } => format!(
                "br {}, bb{}, bb{}",
                name(cond),
                then_block.index(),
                else_block.index()
            ),
            InstKind::Jump { target } => format!("br bb{}", target.index()),
            InstKind::Ret { value: Some(val) } => format!("ret {}", name(val)),
            InstKind::Ret { value: None } => "ret".to_string(),
            InstKind::Other { mnemonic, operands } => {
                let operands: Vec<String> = operands.iter().map(|op| name(op)).collect();
                format!("%{} = {} {}", inst.name, mnemonic, operands.join(", "))
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| format!("%{}", p.name)).collect();
        writeln!(f, "fn @{}({}):", self.name, params.join(", "))?;
        for block in &self.blocks {
            writeln!(f, "bb{}:", block.id.index())?;
            for id in &block.insts {
                writeln!(f, "  {}", self.display_inst(*id))?;
            }
        }
        Ok(())
    }
}
