use super::*;

fn loop_function() -> Function {
    let mut b = FunctionBuilder::new("count");
    let n = b.arg("n", Ty::Int);
    let header = b.create_block();
    let body = b.create_block();
    let exit = b.create_block();
    b.jump(header);

    b.switch_to_block(header);
    let i = b.phi("i", Ty::Int, vec![(BlockId::entry(), Operand::Const(0))]);
    let cond = b.cmp("cond", Predicate::Slt, i.clone(), n);
    b.br(cond, body, exit);

    b.switch_to_block(body);
    b.binary("next", BinOp::Add, i, Operand::Const(1));
    b.jump(header);

    b.switch_to_block(exit);
    b.ret(None);

    b.finish().expect("function should validate")
}

#[test]
fn builds_blocks_in_creation_order() {
    let func = loop_function();
    assert_eq!(func.blocks.len(), 4);
    assert_eq!(func.first_inst().map(|id| func.inst(id).block), Some(BlockId::entry()));

    let order: Vec<&str> = func.insts().map(|inst| inst.name.as_str()).collect();
    assert_eq!(order, vec!["t0", "i", "cond", "t1", "next", "t2", "t3"]);
}

#[test]
fn terminators_expose_successor_blocks() {
    let func = loop_function();
    let branch = func
        .insts()
        .find(|inst| matches!(inst.kind, InstKind::Br { .. }))
        .expect("expected a conditional branch");
    assert_eq!(branch.successor_blocks().len(), 2);

    let ret = func
        .insts()
        .find(|inst| matches!(inst.kind, InstKind::Ret { .. }))
        .expect("expected a return");
    assert!(ret.successor_blocks().is_empty());
    assert!(ret.is_terminator());
}

#[test]
fn block_predecessors_follow_branches() {
    let func = loop_function();
    let preds = func.block_predecessors();
    // entry has none; the loop header is reached from entry and body.
    assert!(preds[0].is_empty());
    assert_eq!(preds[1], vec![BlockId::entry(), func.blocks[2].id]);
}

#[test]
fn operand_names_carry_sigils() {
    let mut b = FunctionBuilder::new("names");
    let n = b.arg("n", Ty::Int);
    let g = b.global("limit", Some(64));
    let sum = b.binary("sum", BinOp::Add, n.clone(), Operand::Const(2));
    b.ret(Some(sum.clone()));
    let func = b.finish().expect("function should validate");

    assert_eq!(func.operand_name(&n), "%n");
    assert_eq!(func.operand_name(&g), "@limit");
    assert_eq!(func.operand_name(&sum), "%sum");
    assert_eq!(func.operand_name(&Operand::Const(7)), "7");
    assert_eq!(func.operand_ty(&n), Ty::Int);
    assert_eq!(func.operand_ty(&g), Ty::Ptr);
}

#[test]
fn renders_instructions_llvm_ish() {
    let mut b = FunctionBuilder::new("render");
    let a = b.alloca_array("a", 10);
    let idx = b.call("idx", "getchar", vec![], Ty::Int);
    let slot = b.gep("slot", a, vec![Operand::Const(0), idx]);
    b.store(Operand::Const(1), slot.clone());
    b.ret(None);
    let func = b.finish().expect("function should validate");

    let rendered: Vec<String> = func.insts().map(|inst| func.display_inst(inst.id)).collect();
    assert_eq!(rendered[0], "%a = alloca [10 x i64]");
    assert_eq!(rendered[1], "%idx = call @getchar()");
    assert_eq!(rendered[2], "%slot = getelementptr %a, 0, %idx");
    assert_eq!(rendered[3], "store 1, %slot");
    assert_eq!(rendered[4], "ret");
}

#[test]
fn rejects_block_without_terminator() {
    let mut b = FunctionBuilder::new("bad");
    b.binary("x", BinOp::Add, Operand::Const(1), Operand::Const(2));
    let err = b.finish().expect_err("missing terminator should fail validation");
    assert!(err.to_string().contains("does not end in a terminator"), "unexpected error: {err}");
}

#[test]
fn rejects_duplicate_names() {
    let mut b = FunctionBuilder::new("bad");
    b.binary("x", BinOp::Add, Operand::Const(1), Operand::Const(2));
    b.binary("x", BinOp::Add, Operand::Const(3), Operand::Const(4));
    b.ret(None);
    let err = b.finish().expect_err("duplicate names should fail validation");
    assert!(err.to_string().contains("duplicate value name"), "unexpected error: {err}");
}

#[test]
fn rejects_empty_block() {
    let mut b = FunctionBuilder::new("bad");
    b.ret(None);
    b.create_block();
    let err = b.finish().expect_err("empty block should fail validation");
    assert!(err.to_string().contains("is empty"), "unexpected error: {err}");
}
