//! 実行コンテキスト（1つのコールフレームの状態）

use crate::{CodeStream, Memory, Precompiles, Stack};
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// 20バイトのアドレス
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// 下位8バイトを指定してアドレスを作成する
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// 実行の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// 未実行
    Idle,
    /// 実行中
    Running,
    /// 正常に停止した
    Halted,
    /// エラーまたは中断で終了した
    Failed,
}

/// 実行コンテキスト
///
/// 命令ストリーム、スタック、メモリ、呼び出しデータ、プリコンパイル表を持ちます。
#[derive(Debug, Clone)]
pub struct Computation {
    code: CodeStream,
    /// オペランドスタック
    pub stack: Stack,
    /// メモリ
    pub memory: Memory,
    call_data: Vec<u8>,
    return_data: Vec<u8>,
    code_address: Address,
    precompiles: Precompiles,
    status: RunStatus,
}

impl Computation {
    /// 命令列から実行コンテキストを作成する
    pub fn new(code: impl Into<Vec<u8>>) -> Self {
        Self {
            code: CodeStream::new(code),
            stack: Stack::new(),
            memory: Memory::new(),
            call_data: Vec::new(),
            return_data: Vec::new(),
            code_address: Address::default(),
            precompiles: Precompiles::standard(),
            status: RunStatus::Idle,
        }
    }

    /// 呼び出しデータを設定する
    pub fn with_call_data(mut self, call_data: impl Into<Vec<u8>>) -> Self {
        self.call_data = call_data.into();
        self
    }

    /// コードアドレスを設定する
    pub fn with_code_address(mut self, address: Address) -> Self {
        self.code_address = address;
        self
    }

    /// プリコンパイル表を差し替える
    pub fn with_precompiles(mut self, precompiles: Precompiles) -> Self {
        self.precompiles = precompiles;
        self
    }

    /// 開始位置を設定する
    pub fn with_pc(mut self, pc: usize) -> Self {
        self.code.seek(pc);
        self
    }

    /// 命令ストリームを取得する
    pub fn code(&self) -> &CodeStream {
        &self.code
    }

    /// 命令ストリームを可変参照で取得する
    pub fn code_mut(&mut self) -> &mut CodeStream {
        &mut self.code
    }

    /// プログラムカウンタを取得する
    pub fn pc(&self) -> usize {
        self.code.pc()
    }

    /// 呼び出しデータを取得する
    pub fn call_data(&self) -> &[u8] {
        &self.call_data
    }

    /// 返却データを取得する
    pub fn return_data(&self) -> &[u8] {
        &self.return_data
    }

    /// 返却データを設定する
    pub fn set_return_data(&mut self, data: Vec<u8>) {
        self.return_data = data;
    }

    /// コードアドレスを取得する
    pub fn code_address(&self) -> Address {
        self.code_address
    }

    /// プリコンパイル表を取得する
    pub fn precompiles(&self) -> &Precompiles {
        &self.precompiles
    }

    /// 実行状態を取得する
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// 正常に停止したかどうか
    pub fn is_halted(&self) -> bool {
        self.status == RunStatus::Halted
    }

    /// 実行スコープに入る
    ///
    /// 返されたスコープが破棄されると、どの経路で抜けても後始末が行われます。
    /// `complete` を呼ばずに破棄された場合は失敗として記録されます。
    pub fn enter(&mut self) -> RunScope<'_> {
        debug!("Computation started at {} (pc: {})", self.code_address, self.pc());
        self.status = RunStatus::Running;
        self.return_data.clear();
        RunScope { computation: self }
    }
}

/// 実行スコープ
///
/// 実行中の [`Computation`] を排他的に借用します。
pub struct RunScope<'a> {
    computation: &'a mut Computation,
}

impl RunScope<'_> {
    /// 正常終了としてスコープを閉じる
    pub fn complete(self) {
        self.computation.status = RunStatus::Halted;
    }
}

impl Deref for RunScope<'_> {
    type Target = Computation;

    fn deref(&self) -> &Computation {
        &*self.computation
    }
}

impl DerefMut for RunScope<'_> {
    fn deref_mut(&mut self) -> &mut Computation {
        &mut *self.computation
    }
}

impl Drop for RunScope<'_> {
    fn drop(&mut self) {
        if self.computation.status == RunStatus::Running {
            self.computation.status = RunStatus::Failed;
        }
        debug!(
            "Computation ended with {:?} (pc: {}, stack depth: {})",
            self.computation.status,
            self.computation.pc(),
            self.computation.stack.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let address = Address::from_low_u64(0x04);
        assert_eq!(
            address.to_string(),
            "0x0000000000000000000000000000000000000004"
        );
    }

    #[test]
    fn test_scope_marks_failed_without_complete() {
        let mut computation = Computation::new(vec![0x00]);
        {
            let _scope = computation.enter();
        }
        assert_eq!(computation.status(), RunStatus::Failed);
    }

    #[test]
    fn test_scope_complete() {
        let mut computation = Computation::new(vec![0x00]);
        computation.enter().complete();
        assert!(computation.is_halted());
    }

    #[test]
    fn test_scope_teardown_on_panic() {
        let mut computation = Computation::new(vec![0x00]);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = computation.enter();
            panic!("handler bug");
        }));
        assert!(result.is_err());
        assert_eq!(computation.status(), RunStatus::Failed);
    }
}
