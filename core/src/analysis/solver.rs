use std::collections::VecDeque;

use crate::alias::MayAlias;
use crate::ir::{ArgId, BlockId, Function, InstId, Operand};
use crate::util::{FastHashMap, FastHashSet};

use super::fact_map::{AllocSizeTable, FactMap, domain_of};
use super::transfer::transfer;

/// Values participating in store/load traffic: every argument and every
/// instruction result. Append-only; iteration follows insertion order so a
/// run is deterministic.
#[derive(Debug, Default)]
pub struct PointerSet {
    entries: Vec<(String, Operand)>,
    seen: FastHashSet<String>,
}

impl PointerSet {
    pub fn insert(&mut self, name: String, operand: Operand) {
        if self.seen.insert(name.clone()) {
            self.entries.push((name, operand));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Operand)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the fixpoint produced for one function.
#[derive(Debug)]
pub struct AnalysisContext<'f> {
    pub func: &'f Function,
    pub in_facts: FastHashMap<InstId, FactMap>,
    pub out_facts: FastHashMap<InstId, FactMap>,
    pub pointer_set: PointerSet,
    pub alloc_size: AllocSizeTable,
}

impl<'f> AnalysisContext<'f> {
    fn new(func: &'f Function) -> Self {
        let count = func.insts().count();
        let mut ctx = Self {
            func,
            in_facts: FastHashMap::with_capacity_and_hasher(count, Default::default()),
            out_facts: FastHashMap::with_capacity_and_hasher(count, Default::default()),
            pointer_set: PointerSet::default(),
            alloc_size: AllocSizeTable::default(),
        };
        for inst in func.insts() {
            ctx.in_facts.insert(inst.id, FactMap::new());
            ctx.out_facts.insert(inst.id, FactMap::new());
        }
        ctx
    }

    pub fn in_facts_of(&self, id: InstId) -> &FactMap {
        &self.in_facts[&id]
    }

    pub fn out_facts_of(&self, id: InstId) -> &FactMap {
        &self.out_facts[&id]
    }
}

/// CFG predecessors of an instruction: the previous instruction in its
/// block, or for a block head the last instruction of every predecessor
/// block.
fn predecessors(func: &Function, block_preds: &[Vec<BlockId>], id: InstId) -> Vec<InstId> {
    let inst = func.inst(id);
    let block = func.block(inst.block);
    let pos = block
        .insts
        .iter()
        .position(|&i| i == id)
        .expect("instruction belongs to its parent block");
    if pos > 0 {
        return vec![block.insts[pos - 1]];
    }
    block_preds[inst.block.index()]
        .iter()
        .map(|pred| {
            *func
                .block(*pred)
                .insts
                .last()
                .expect("validated blocks are non-empty")
        })
        .collect()
}

/// CFG successors, symmetric to [`predecessors`].
fn successors(func: &Function, id: InstId) -> Vec<InstId> {
    let inst = func.inst(id);
    let block = func.block(inst.block);
    let pos = block
        .insts
        .iter()
        .position(|&i| i == id)
        .expect("instruction belongs to its parent block");
    if pos + 1 < block.insts.len() {
        return vec![block.insts[pos + 1]];
    }
    inst.successor_blocks()
        .into_iter()
        .map(|succ| {
            *func
                .block(succ)
                .insts
                .first()
                .expect("validated blocks are non-empty")
        })
        .collect()
}

/// Chaotic iteration to a fixpoint over the function's instructions.
///
/// Termination rests on saturating interval arithmetic (chains widen to the
/// ±∞ sentinels) and on the pointer set and size table growing
/// monotonically.
pub fn solve<'f>(func: &'f Function, alias: &dyn MayAlias) -> AnalysisContext<'f> {
    let mut ctx = AnalysisContext::new(func);
    let block_preds = func.block_predecessors();

    if let Some(first) = func.first_inst() {
        let entry_facts = ctx
            .in_facts
            .get_mut(&first)
            .expect("every instruction has an IN entry");
        for idx in 0..func.params.len() {
            let operand = Operand::Arg(ArgId(idx));
            entry_facts.insert(func.operand_name(&operand), domain_of(func, &operand));
            ctx.pointer_set.insert(func.operand_name(&operand), operand);
        }
    }

    let mut worklist: VecDeque<InstId> = VecDeque::new();
    for inst in func.insts() {
        worklist.push_back(inst.id);
        ctx.pointer_set
            .insert(format!("%{}", inst.name), Operand::Inst(inst.id));
    }

    let mut iterations = 0usize;
    while let Some(id) = worklist.pop_front() {
        iterations += 1;

        let mut merged = ctx.in_facts[&id].clone();
        for pred in predecessors(func, &block_preds, id) {
            merged.merge(&ctx.out_facts[&pred]);
        }

        let inst = func.inst(id);
        let (gen_set, kill_set) = transfer(func, inst, &merged, &ctx.pointer_set, alias, &mut ctx.alloc_size);

        let mut new_out = merged.clone();
        for name in &kill_set {
            new_out.remove(name);
        }
        new_out.merge(&gen_set);

        ctx.in_facts.insert(id, merged);
        if new_out != ctx.out_facts[&id] {
            for succ in successors(func, id) {
                worklist.push_back(succ);
            }
            ctx.out_facts.insert(id, new_out);
        }
    }

    tracing::debug!(
        function = %func.name,
        iterations,
        pointers = ctx.pointer_set.len(),
        "dataflow fixpoint reached"
    );
    ctx
}
