//! オペコードとディスパッチテーブル

use crate::{instructions, Computation, Result};

pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const MOD: u8 = 0x06;
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const JUMPDEST: u8 = 0x5b;
pub const PUSH1: u8 = 0x60;
pub const PUSH8: u8 = 0x67;
pub const PUSH32: u8 = 0x7f;
pub const DUP1: u8 = 0x80;
pub const SWAP1: u8 = 0x90;
pub const RETURN: u8 = 0xf3;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;

/// PUSH系なら即値のバイト数を返す
pub fn immediate_size(opcode: u8) -> usize {
    if (PUSH1..=PUSH32).contains(&opcode) {
        (opcode - PUSH1) as usize + 1
    } else {
        0
    }
}

/// ハンドラ実行後の制御
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// 次の命令へ進む
    Continue,
    /// 実行を正常終了する
    Halt,
}

/// オペコードハンドラ
pub type OpcodeFn = fn(&mut Computation) -> Result<Flow>;

/// ディスパッチテーブルの1エントリ
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub value: u8,
    pub mnemonic: &'static str,
    pub handler: OpcodeFn,
}

impl Opcode {
    /// ハンドラを実行する
    pub fn execute(&self, computation: &mut Computation) -> Result<Flow> {
        (self.handler)(computation)
    }
}

/// オペコード値からハンドラへのディスパッチテーブル
#[derive(Clone)]
pub struct OpcodeTable {
    entries: [Option<Opcode>; 256],
}

impl OpcodeTable {
    /// 空のテーブルを作成する
    pub fn new() -> Self {
        Self {
            entries: [None; 256],
        }
    }

    /// 標準の命令セットを登録したテーブルを作成する
    pub fn reference() -> Self {
        const PUSH_MNEMONICS: [&str; 8] = [
            "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8",
        ];
        const DUP_MNEMONICS: [&str; 16] = [
            "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10",
            "DUP11", "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
        ];
        const SWAP_MNEMONICS: [&str; 16] = [
            "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9",
            "SWAP10", "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
        ];

        let mut table = Self::new();
        table.register(STOP, "STOP", instructions::stop);
        table.register(ADD, "ADD", instructions::add);
        table.register(MUL, "MUL", instructions::mul);
        table.register(SUB, "SUB", instructions::sub);
        table.register(DIV, "DIV", instructions::div);
        table.register(MOD, "MOD", instructions::modulo);
        table.register(LT, "LT", instructions::lt);
        table.register(GT, "GT", instructions::gt);
        table.register(EQ, "EQ", instructions::eq);
        table.register(ISZERO, "ISZERO", instructions::iszero);
        table.register(POP, "POP", instructions::pop);
        table.register(MLOAD, "MLOAD", instructions::mload);
        table.register(MSTORE, "MSTORE", instructions::mstore);
        table.register(JUMP, "JUMP", instructions::jump);
        table.register(JUMPI, "JUMPI", instructions::jumpi);
        table.register(PC, "PC", instructions::pc);
        table.register(JUMPDEST, "JUMPDEST", instructions::jumpdest);
        table.register(RETURN, "RETURN", instructions::return_);
        table.register(REVERT, "REVERT", instructions::revert);
        table.register(INVALID, "INVALID", instructions::invalid);

        let push_handlers: [OpcodeFn; 8] = [
            instructions::push::<1>,
            instructions::push::<2>,
            instructions::push::<3>,
            instructions::push::<4>,
            instructions::push::<5>,
            instructions::push::<6>,
            instructions::push::<7>,
            instructions::push::<8>,
        ];
        for (i, handler) in push_handlers.into_iter().enumerate() {
            table.register(PUSH1 + i as u8, PUSH_MNEMONICS[i], handler);
        }

        let dup_handlers: [OpcodeFn; 16] = [
            instructions::dup::<1>,
            instructions::dup::<2>,
            instructions::dup::<3>,
            instructions::dup::<4>,
            instructions::dup::<5>,
            instructions::dup::<6>,
            instructions::dup::<7>,
            instructions::dup::<8>,
            instructions::dup::<9>,
            instructions::dup::<10>,
            instructions::dup::<11>,
            instructions::dup::<12>,
            instructions::dup::<13>,
            instructions::dup::<14>,
            instructions::dup::<15>,
            instructions::dup::<16>,
        ];
        for (i, handler) in dup_handlers.into_iter().enumerate() {
            table.register(DUP1 + i as u8, DUP_MNEMONICS[i], handler);
        }

        let swap_handlers: [OpcodeFn; 16] = [
            instructions::swap::<1>,
            instructions::swap::<2>,
            instructions::swap::<3>,
            instructions::swap::<4>,
            instructions::swap::<5>,
            instructions::swap::<6>,
            instructions::swap::<7>,
            instructions::swap::<8>,
            instructions::swap::<9>,
            instructions::swap::<10>,
            instructions::swap::<11>,
            instructions::swap::<12>,
            instructions::swap::<13>,
            instructions::swap::<14>,
            instructions::swap::<15>,
            instructions::swap::<16>,
        ];
        for (i, handler) in swap_handlers.into_iter().enumerate() {
            table.register(SWAP1 + i as u8, SWAP_MNEMONICS[i], handler);
        }

        table
    }

    /// オペコードを登録する（既存のエントリは上書きされる）
    pub fn register(&mut self, value: u8, mnemonic: &'static str, handler: OpcodeFn) {
        self.entries[value as usize] = Some(Opcode {
            value,
            mnemonic,
            handler,
        });
    }

    /// オペコードを取得する
    pub fn get(&self, value: u8) -> Option<&Opcode> {
        self.entries[value as usize].as_ref()
    }

    /// ニーモニックを取得する（未登録なら "UNKNOWN"）
    pub fn mnemonic(&self, value: u8) -> &'static str {
        self.get(value).map(|op| op.mnemonic).unwrap_or("UNKNOWN")
    }

    /// 登録されているオペコード数
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::reference()
    }
}

impl std::fmt::Debug for OpcodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcodeTable")
            .field("registered", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table() {
        let table = OpcodeTable::reference();
        assert_eq!(table.mnemonic(ADD), "ADD");
        assert_eq!(table.mnemonic(PUSH8), "PUSH8");
        assert_eq!(table.mnemonic(DUP1 + 15), "DUP16");
        assert_eq!(table.mnemonic(SWAP1 + 15), "SWAP16");
        assert_eq!(table.mnemonic(0x0c), "UNKNOWN");
        // PUSH9以上は64ビットワードに収まらないため登録しない
        assert!(table.get(PUSH8 + 1).is_none());
    }

    #[test]
    fn test_register_overrides() {
        fn nop(_: &mut Computation) -> Result<Flow> {
            Ok(Flow::Continue)
        }

        let mut table = OpcodeTable::reference();
        table.register(STOP, "NOP", nop);
        assert_eq!(table.mnemonic(STOP), "NOP");
    }
}
