//! vdb デバッガのコア機能
//!
//! このクレートは、バイトコードVMの実行ループに接続するブレークポイントデバッガを提供します。
//! pcからソース行への対応、ブレークポイント判定、実行ループ、
//! 一時停止中のセッション制御を統合します。

pub mod breakpoint;
pub mod command;
pub mod debugger;
pub mod disasm;
pub mod errors;
pub mod handler;
pub mod interpreter;
pub mod parse;
pub mod session;
pub mod source;
pub mod source_map;

pub use breakpoint::{BreakpointHit, BreakpointOracle, LineBreakpoints};
pub use command::Command;
pub use debugger::Debugger;
pub use disasm::{disassemble, Instruction};
pub use errors::DebugError;
pub use handler::{CommandScript, ContinueAlways, PauseRecord, ScriptEntry, SessionHandler};
pub use interpreter::Interpreter;
pub use session::{DebugSession, PauseReason, Reply, Resume};
pub use source::SourceText;
pub use source_map::{LineNumber, ProgramCounter, SourceMap};

// 他のクレートから使用するために再エクスポート
pub use vdb_vm::{Address, Computation, Flow, OpcodeTable, VmError, Word};

/// デバッガの結果型
pub type Result<T> = std::result::Result<T, DebugError>;
