use anyhow::{Result, anyhow, ensure};

use crate::util::FastHashSet;

use super::{
    AllocKind, ArgId, BinOp, Block, BlockId, Function, Global, GlobalId, InstId, InstKind, Instruction, Operand, Param,
    PhiIncoming, Predicate, Ty,
};

/// Assembles a [`Function`] block by block.
///
/// Value-producing emitters take the instruction's printable name and return
/// an [`Operand`] handle for later uses; control-flow emitters are named
/// automatically. `finish` validates the CFG shape.
pub struct FunctionBuilder {
    name: String,
    params: Vec<Param>,
    globals: Vec<Global>,
    blocks: Vec<Block>,
    insts: Vec<Instruction>,
    current: BlockId,
    next_auto: u32,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            globals: Vec::new(),
            blocks: vec![Block {
                id: BlockId::entry(),
                insts: Vec::new(),
            }],
            insts: Vec::new(),
            current: BlockId::entry(),
            next_auto: 0,
        }
    }

    pub fn arg(&mut self, name: impl Into<String>, ty: Ty) -> Operand {
        let id = ArgId(self.params.len());
        self.params.push(Param { name: name.into(), ty });
        Operand::Arg(id)
    }

    pub fn global(&mut self, name: impl Into<String>, init: Option<i64>) -> Operand {
        let id = GlobalId(self.globals.len());
        self.globals.push(Global { name: name.into(), init });
        Operand::Global(id)
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(Block { id, insts: Vec::new() });
        id
    }

    pub fn switch_to_block(&mut self, id: BlockId) {
        self.current = id;
    }

    pub fn current_block(&self) -> BlockId {
        self.current
    }

    fn emit(&mut self, name: String, ty: Ty, kind: InstKind) -> InstId {
        let id = InstId::new(self.insts.len() as u32);
        self.insts.push(Instruction {
            id,
            block: self.current,
            name,
            ty,
            kind,
        });
        self.blocks[self.current.index()].insts.push(id);
        id
    }

    fn auto_name(&mut self) -> String {
        let name = format!("t{}", self.next_auto);
        self.next_auto += 1;
        name
    }

    pub fn binary(&mut self, name: impl Into<String>, op: BinOp, lhs: Operand, rhs: Operand) -> Operand {
        Operand::Inst(self.emit(name.into(), Ty::Int, InstKind::Binary { op, lhs, rhs }))
    }

    pub fn cmp(&mut self, name: impl Into<String>, pred: Predicate, lhs: Operand, rhs: Operand) -> Operand {
        Operand::Inst(self.emit(name.into(), Ty::Int, InstKind::Cmp { pred, lhs, rhs }))
    }

    pub fn cast(&mut self, name: impl Into<String>, src: Operand, ty: Ty) -> Operand {
        Operand::Inst(self.emit(name.into(), ty, InstKind::Cast { src }))
    }

    pub fn phi(&mut self, name: impl Into<String>, ty: Ty, incoming: Vec<(BlockId, Operand)>) -> Operand {
        let incoming = incoming
            .into_iter()
            .map(|(block, value)| PhiIncoming { block, value })
            .collect();
        Operand::Inst(self.emit(name.into(), ty, InstKind::Phi { incoming }))
    }

    /// Append an incoming edge to an existing φ. Loop-carried values are
    /// only available after the φ itself has been created.
    pub fn add_phi_incoming(&mut self, phi: &Operand, block: BlockId, value: Operand) {
        let Operand::Inst(id) = phi else {
            return;
        };
        if let Some(Instruction {
            kind: InstKind::Phi { incoming },
            ..
        }) = self.insts.get_mut(id.index())
        {
            incoming.push(PhiIncoming { block, value });
        }
    }

    pub fn alloca_int(&mut self, name: impl Into<String>) -> Operand {
        Operand::Inst(self.emit(name.into(), Ty::Ptr, InstKind::Alloca {
            allocated: AllocKind::Int,
        }))
    }

    pub fn alloca_array(&mut self, name: impl Into<String>, len: i64) -> Operand {
        Operand::Inst(self.emit(name.into(), Ty::Ptr, InstKind::Alloca {
            allocated: AllocKind::Array(len),
        }))
    }

    pub fn alloca_other(&mut self, name: impl Into<String>) -> Operand {
        Operand::Inst(self.emit(name.into(), Ty::Ptr, InstKind::Alloca {
            allocated: AllocKind::Other,
        }))
    }

    pub fn load(&mut self, name: impl Into<String>, ptr: Operand) -> Operand {
        Operand::Inst(self.emit(name.into(), Ty::Int, InstKind::Load { ptr }))
    }

    pub fn store(&mut self, value: Operand, ptr: Operand) {
        let name = self.auto_name();
        self.emit(name, Ty::Other, InstKind::Store { value, ptr });
    }

    pub fn gep(&mut self, name: impl Into<String>, base: Operand, indices: Vec<Operand>) -> Operand {
        Operand::Inst(self.emit(name.into(), Ty::Ptr, InstKind::Gep { base, indices }))
    }

    pub fn call(&mut self, name: impl Into<String>, callee: impl Into<String>, args: Vec<Operand>, ty: Ty) -> Operand {
        Operand::Inst(self.emit(name.into(), ty, InstKind::Call {
            callee: callee.into(),
            args,
        }))
    }

    pub fn other(
        &mut self,
        name: impl Into<String>,
        mnemonic: impl Into<String>,
        operands: Vec<Operand>,
        ty: Ty,
    ) -> Operand {
        Operand::Inst(self.emit(name.into(), ty, InstKind::Other {
            mnemonic: mnemonic.into(),
            operands,
        }))
    }

    pub fn br(&mut self, cond: Operand, then_block: BlockId, else_block: BlockId) {
        let name = self.auto_name();
        self.emit(name, Ty::Other, InstKind::Br {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn jump(&mut self, target: BlockId) {
        let name = self.auto_name();
        self.emit(name, Ty::Other, InstKind::Jump { target });
    }

    pub fn ret(&mut self, value: Option<Operand>) {
        let name = self.auto_name();
        self.emit(name, Ty::Other, InstKind::Ret { value });
    }

    pub fn finish(self) -> Result<Function> {
        let func = Function {
            name: self.name,
            params: self.params,
            globals: self.globals,
            blocks: self.blocks,
            insts: self.insts,
        };
        validate(&func)?;
        Ok(func)
    }
}

fn validate(func: &Function) -> Result<()> {
    let mut names: FastHashSet<&str> = FastHashSet::default();
    for param in &func.params {
        ensure!(
            names.insert(&param.name),
            "duplicate value name %{} in function {}",
            param.name,
            func.name
        );
    }
    for inst in func.insts() {
        ensure!(
            names.insert(&inst.name),
            "duplicate value name %{} in function {}",
            inst.name,
            func.name
        );
    }

    for block in &func.blocks {
        let Some((last, body)) = block.insts.split_last() else {
            return Err(anyhow!("block bb{} in function {} is empty", block.id.index(), func.name));
        };
        ensure!(
            func.inst(*last).is_terminator(),
            "block bb{} in function {} does not end in a terminator",
            block.id.index(),
            func.name
        );
        for id in body {
            ensure!(
                !func.inst(*id).is_terminator(),
                "terminator {} is not last in block bb{}",
                func.display_inst(*id),
                block.id.index()
            );
        }
        for id in &block.insts {
            for succ in func.inst(*id).successor_blocks() {
                ensure!(
                    succ.index() < func.blocks.len(),
                    "branch to undefined block bb{}",
                    succ.index()
                );
            }
        }
    }

    for inst in func.insts() {
        if let InstKind::Phi { incoming } = &inst.kind {
            ensure!(
                !incoming.is_empty(),
                "phi %{} in function {} has no incoming values",
                inst.name,
                func.name
            );
            for inc in incoming {
                ensure!(
                    inc.block.index() < func.blocks.len(),
                    "phi %{} names undefined block bb{}",
                    inst.name,
                    inc.block.index()
                );
            }
        }
    }

    Ok(())
}
