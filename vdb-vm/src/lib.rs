//! vdb 実行対象VM
//!
//! このクレートは、デバッグ対象となるスタック型バイトコードVMの状態を提供します。
//! 実行コンテキスト、命令ストリーム、スタック、メモリ、プリコンパイル、
//! オペコードのディスパッチテーブルを含みます。
//! 命令を順に実行するループ自体は vdb-core が持ちます。

pub mod code;
pub mod computation;
pub mod error;
pub mod instructions;
pub mod memory;
pub mod opcode;
pub mod precompile;
pub mod stack;

pub use code::CodeStream;
pub use computation::{Address, Computation, RunScope, RunStatus};
pub use error::VmError;
pub use memory::Memory;
pub use opcode::{Flow, Opcode, OpcodeFn, OpcodeTable};
pub use precompile::{PrecompileFn, Precompiles};
pub use stack::{Stack, Word};

/// VM操作の結果型
pub type Result<T> = std::result::Result<T, VmError>;
