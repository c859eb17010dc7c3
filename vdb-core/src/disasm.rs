//! 逆アセンブル機能
//!
//! 命令列をオペコード単位に分解し、ブレークポイントを置く位置を確認するために使います。

use crate::source_map::ProgramCounter;
use vdb_vm::opcode::immediate_size;
use vdb_vm::OpcodeTable;

/// 逆アセンブルした1命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub pc: ProgramCounter,
    pub opcode: u8,
    pub mnemonic: &'static str,
    /// PUSH系の即値（終端で切れている場合は短くなる）
    pub immediate: Vec<u8>,
}

/// 命令列を逆アセンブルする
///
/// # Arguments
/// * `code` - 命令列
/// * `opcodes` - ニーモニックの取得に使うディスパッチテーブル
pub fn disassemble(code: &[u8], opcodes: &OpcodeTable) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut pc = 0;

    while pc < code.len() {
        let opcode = code[pc];
        let start = pc + 1;
        let end = (start + immediate_size(opcode)).min(code.len());
        instructions.push(Instruction {
            pc,
            opcode,
            mnemonic: opcodes.mnemonic(opcode),
            immediate: code[start..end].to_vec(),
        });
        pc = start + immediate_size(opcode);
    }

    instructions
}
