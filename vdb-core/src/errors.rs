//! デバッガのエラー

use thiserror::Error;
use vdb_vm::VmError;

/// デバッガのエラー
#[derive(Debug, Error)]
pub enum DebugError {
    /// 解放済みのセッションに対する操作
    #[error("Invalid session: execution has already resumed")]
    InvalidSession,
    /// 解釈できないコマンド（セッションは一時停止のまま）
    #[error("Malformed command: {0}")]
    MalformedCommand(String),
    /// ハンドラがセッションを解放せずに戻った
    #[error("Debug session was not released (continue or step required)")]
    SessionNotReleased,
    /// オペコードハンドラまたはプリコンパイルのエラー
    #[error(transparent)]
    Vm(#[from] VmError),
    /// セッションハンドラ自身のエラー（端末I/Oなど）
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl DebugError {
    /// 不正なコマンドエラーを作成する
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCommand(message.into())
    }
}
