//! VMエラー

use thiserror::Error;

/// オペコードハンドラやプリコンパイルが返すエラー
///
/// 停止（halt）はエラーではないため、ここには含まれません。
/// 停止は [`crate::Flow::Halt`] で表現します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// スタックの要素数が足りない
    #[error("Stack underflow: needed {needed} items, found {available}")]
    StackUnderflow { needed: usize, available: usize },
    /// スタックの上限を超えた
    #[error("Stack overflow: limit is {limit} items")]
    StackOverflow { limit: usize },
    /// 未定義のオペコード
    #[error("Invalid instruction: 0x{0:02x}")]
    InvalidInstruction(u8),
    /// JUMPDEST以外へのジャンプ
    #[error("Invalid jump destination: {0}")]
    InvalidJumpDestination(u64),
    /// メモリ上限を超えるアクセス
    #[error("Memory access out of range: offset {offset}, size {size}")]
    MemoryLimit { offset: u64, size: u64 },
    /// REVERT命令による実行失敗
    #[error("Execution reverted ({} bytes of revert data)", .0.len())]
    Revert(Vec<u8>),
    /// プリコンパイルの実行失敗
    #[error("Precompile failed: {0}")]
    Precompile(String),
}
