//! 標準命令セットのハンドラ

use crate::{Computation, Flow, Result, VmError, Word};

fn binary_op(computation: &mut Computation, op: impl Fn(Word, Word) -> Word) -> Result<Flow> {
    let operands = computation.stack.pop_n(2)?;
    computation.stack.push(op(operands[0], operands[1]))?;
    Ok(Flow::Continue)
}

fn to_offset(value: Word) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

pub fn stop(_computation: &mut Computation) -> Result<Flow> {
    Ok(Flow::Halt)
}

pub fn add(computation: &mut Computation) -> Result<Flow> {
    binary_op(computation, Word::wrapping_add)
}

pub fn mul(computation: &mut Computation) -> Result<Flow> {
    binary_op(computation, Word::wrapping_mul)
}

pub fn sub(computation: &mut Computation) -> Result<Flow> {
    binary_op(computation, Word::wrapping_sub)
}

/// 0除算は0を返す
pub fn div(computation: &mut Computation) -> Result<Flow> {
    binary_op(computation, |a, b| a.checked_div(b).unwrap_or(0))
}

pub fn modulo(computation: &mut Computation) -> Result<Flow> {
    binary_op(computation, |a, b| a.checked_rem(b).unwrap_or(0))
}

pub fn lt(computation: &mut Computation) -> Result<Flow> {
    binary_op(computation, |a, b| Word::from(a < b))
}

pub fn gt(computation: &mut Computation) -> Result<Flow> {
    binary_op(computation, |a, b| Word::from(a > b))
}

pub fn eq(computation: &mut Computation) -> Result<Flow> {
    binary_op(computation, |a, b| Word::from(a == b))
}

pub fn iszero(computation: &mut Computation) -> Result<Flow> {
    let value = computation.stack.pop()?;
    computation.stack.push(Word::from(value == 0))?;
    Ok(Flow::Continue)
}

pub fn pop(computation: &mut Computation) -> Result<Flow> {
    computation.stack.pop()?;
    Ok(Flow::Continue)
}

pub fn mload(computation: &mut Computation) -> Result<Flow> {
    let offset = computation.stack.pop()?;
    let value = computation.memory.read_u64(to_offset(offset))?;
    computation.stack.push(value)?;
    Ok(Flow::Continue)
}

pub fn mstore(computation: &mut Computation) -> Result<Flow> {
    let operands = computation.stack.pop_n(2)?;
    computation.memory.write_u64(to_offset(operands[0]), operands[1])?;
    Ok(Flow::Continue)
}

pub fn jump(computation: &mut Computation) -> Result<Flow> {
    let destination = computation.stack.pop()?;
    jump_to(computation, destination)
}

pub fn jumpi(computation: &mut Computation) -> Result<Flow> {
    let operands = computation.stack.pop_n(2)?;
    if operands[1] != 0 {
        jump_to(computation, operands[0])
    } else {
        Ok(Flow::Continue)
    }
}

fn jump_to(computation: &mut Computation, destination: Word) -> Result<Flow> {
    let position = to_offset(destination);
    if !computation.code().is_valid_jump_destination(position) {
        return Err(VmError::InvalidJumpDestination(destination));
    }
    computation.code_mut().seek(position);
    Ok(Flow::Continue)
}

/// この命令自身の位置を積む
pub fn pc(computation: &mut Computation) -> Result<Flow> {
    let position = computation.pc().saturating_sub(1);
    computation.stack.push(position as Word)?;
    Ok(Flow::Continue)
}

pub fn jumpdest(_computation: &mut Computation) -> Result<Flow> {
    Ok(Flow::Continue)
}

/// N バイトの即値を読み取って積む
pub fn push<const N: usize>(computation: &mut Computation) -> Result<Flow> {
    let immediate = computation.code_mut().read(N);
    let value = immediate
        .iter()
        .fold(0 as Word, |acc, byte| (acc << 8) | Word::from(*byte));
    computation.stack.push(value)?;
    Ok(Flow::Continue)
}

pub fn dup<const N: usize>(computation: &mut Computation) -> Result<Flow> {
    computation.stack.dup(N)?;
    Ok(Flow::Continue)
}

pub fn swap<const N: usize>(computation: &mut Computation) -> Result<Flow> {
    computation.stack.swap(N)?;
    Ok(Flow::Continue)
}

pub fn return_(computation: &mut Computation) -> Result<Flow> {
    let operands = computation.stack.pop_n(2)?;
    let data = computation
        .memory
        .read(to_offset(operands[0]), to_offset(operands[1]))?;
    computation.set_return_data(data);
    Ok(Flow::Halt)
}

pub fn revert(computation: &mut Computation) -> Result<Flow> {
    let operands = computation.stack.pop_n(2)?;
    let data = computation
        .memory
        .read(to_offset(operands[0]), to_offset(operands[1]))?;
    computation.set_return_data(data.clone());
    Err(VmError::Revert(data))
}

pub fn invalid(_computation: &mut Computation) -> Result<Flow> {
    Err(VmError::InvalidInstruction(crate::opcode::INVALID))
}
