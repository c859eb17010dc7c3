//! デバッグセッション
//!
//! 実行ループが一時停止している間だけ有効な制御オブジェクトです。
//! `continue` または `step` で解放されると、以降の操作はすべて
//! [`DebugError::InvalidSession`] で失敗します。セッションは1回の停止ごとに作り直されます。

use crate::command::Command;
use crate::errors::DebugError;
use crate::source::SourceText;
use crate::source_map::{LineNumber, ProgramCounter, SourceMap};
use tracing::debug;
use vdb_vm::memory::MEMORY_LIMIT;
use vdb_vm::{Computation, Word};

/// 一時停止した理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// ブレークポイント行に到達した
    Breakpoint,
    /// 直前のセッションでstepが指示された
    Step,
}

/// 実行ループへの再開指示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// 次のブレークポイントまで実行する
    Continue,
    /// 次の命令で再び停止する
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Suspended,
    Released(Resume),
}

/// コマンド実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// スタック（底から順）
    Stack(Vec<Word>),
    /// メモリの内容
    Memory { offset: usize, bytes: Vec<u8> },
    /// 停止位置
    Pc(ProgramCounter),
    /// 現在のソース行
    Line {
        line: Option<LineNumber>,
        text: Option<String>,
    },
    /// 現在行の周辺
    Listing {
        current: Option<LineNumber>,
        lines: Vec<(LineNumber, String)>,
    },
    /// ブレークポイントを設定した（`reachable` はその行に対応するpcがあるか）
    BreakpointSet {
        line: LineNumber,
        added: bool,
        reachable: bool,
    },
    /// ブレークポイントを削除した
    BreakpointDeleted { line: LineNumber, existed: bool },
    /// ブレークポイント一覧
    Breakpoints(Vec<LineNumber>),
    /// ヘルプ
    Help,
    /// 実行を再開した
    Resumed(Resume),
}

/// デバッグセッション
pub struct DebugSession<'a> {
    computation: &'a Computation,
    pc: ProgramCounter,
    line: Option<LineNumber>,
    reason: PauseReason,
    source_map: &'a mut SourceMap,
    source: Option<&'a SourceText>,
    state: SessionState,
}

impl<'a> DebugSession<'a> {
    /// 一時停止中のセッションを作成する
    pub fn new(
        computation: &'a Computation,
        pc: ProgramCounter,
        line: Option<LineNumber>,
        reason: PauseReason,
        source_map: &'a mut SourceMap,
        source: Option<&'a SourceText>,
    ) -> Self {
        Self {
            computation,
            pc,
            line,
            reason,
            source_map,
            source,
            state: SessionState::Suspended,
        }
    }

    fn ensure_suspended(&self) -> Result<(), DebugError> {
        match self.state {
            SessionState::Suspended => Ok(()),
            SessionState::Released(_) => Err(DebugError::InvalidSession),
        }
    }

    /// 解放済みかどうか
    pub fn is_released(&self) -> bool {
        matches!(self.state, SessionState::Released(_))
    }

    /// 再開指示を取得する（一時停止中はNone）
    pub fn resumption(&self) -> Option<Resume> {
        match self.state {
            SessionState::Suspended => None,
            SessionState::Released(resume) => Some(resume),
        }
    }

    /// 停止した理由を取得する
    pub fn reason(&self) -> PauseReason {
        self.reason
    }

    /// 停止した命令の位置を取得する
    pub fn pc(&self) -> Result<ProgramCounter, DebugError> {
        self.ensure_suspended()?;
        Ok(self.pc)
    }

    /// 停止した行を取得する
    pub fn line(&self) -> Result<Option<LineNumber>, DebugError> {
        self.ensure_suspended()?;
        Ok(self.line)
    }

    /// スタックを取得する（底から順）
    pub fn stack(&self) -> Result<&'a [Word], DebugError> {
        self.ensure_suspended()?;
        Ok(self.computation.stack.values())
    }

    /// メモリを取得する（メモリは拡張しない）
    ///
    /// 長さは最大メモリサイズまでです。
    pub fn memory(&self, offset: usize, length: usize) -> Result<Vec<u8>, DebugError> {
        self.ensure_suspended()?;
        if length > MEMORY_LIMIT {
            return Err(DebugError::malformed(format!(
                "memory length too large: {} (at most {})",
                length, MEMORY_LIMIT
            )));
        }
        Ok(self.computation.memory.peek(offset, length))
    }

    /// 使用中のメモリサイズを取得する
    pub fn memory_size(&self) -> Result<usize, DebugError> {
        self.ensure_suspended()?;
        Ok(self.computation.memory.len())
    }

    /// 返却データを取得する
    pub fn return_data(&self) -> Result<&'a [u8], DebugError> {
        self.ensure_suspended()?;
        Ok(self.computation.return_data())
    }

    /// 現在行のソーステキストを取得する
    pub fn source_line(&self) -> Result<Option<&'a str>, DebugError> {
        self.ensure_suspended()?;
        Ok(self
            .source
            .zip(self.line)
            .and_then(|(source, line)| source.line(line)))
    }

    /// 現在行の前後を取得する
    pub fn source_context(&self, radius: u32) -> Result<Vec<(LineNumber, &'a str)>, DebugError> {
        self.ensure_suspended()?;
        Ok(self
            .source
            .zip(self.line)
            .map(|(source, line)| source.context(line, radius))
            .unwrap_or_default())
    }

    /// ブレークポイントを追加する（以降のすべての判定に反映される）
    pub fn add_breakpoint(&mut self, line: LineNumber) -> Result<bool, DebugError> {
        self.ensure_suspended()?;
        let added = self.source_map.add_breakpoint(line);
        debug!("Breakpoint added at line {} (new: {})", line, added);
        Ok(added)
    }

    /// ブレークポイントを削除する
    pub fn remove_breakpoint(&mut self, line: LineNumber) -> Result<bool, DebugError> {
        self.ensure_suspended()?;
        let existed = self.source_map.remove_breakpoint(line);
        debug!("Breakpoint removed at line {} (existed: {})", line, existed);
        Ok(existed)
    }

    /// ブレークポイント一覧を取得する
    pub fn breakpoints(&self) -> Result<Vec<LineNumber>, DebugError> {
        self.ensure_suspended()?;
        Ok(self.source_map.breakpoints().collect())
    }

    /// 実行を継続する
    pub fn continue_execution(&mut self) -> Result<(), DebugError> {
        self.release(Resume::Continue)
    }

    /// 次の命令で再び停止するよう指示して実行を再開する
    pub fn step(&mut self) -> Result<(), DebugError> {
        self.release(Resume::Step)
    }

    fn release(&mut self, resume: Resume) -> Result<(), DebugError> {
        self.ensure_suspended()?;
        debug!("Session released with {:?} at pc {}", resume, self.pc);
        self.state = SessionState::Released(resume);
        Ok(())
    }

    /// コマンド文字列を実行する
    ///
    /// 解釈できないコマンドは [`DebugError::MalformedCommand`] を返し、
    /// セッションは一時停止したままになります。
    pub fn execute(&mut self, input: &str) -> Result<Reply, DebugError> {
        self.ensure_suspended()?;
        let command = Command::parse(input)?;
        self.execute_command(command)
    }

    /// パース済みのコマンドを実行する
    pub fn execute_command(&mut self, command: Command) -> Result<Reply, DebugError> {
        let reply = match command {
            Command::Continue => {
                self.continue_execution()?;
                Reply::Resumed(Resume::Continue)
            }
            Command::Step => {
                self.step()?;
                Reply::Resumed(Resume::Step)
            }
            Command::Stack => Reply::Stack(self.stack()?.to_vec()),
            Command::Memory { offset, length } => Reply::Memory {
                offset,
                bytes: self.memory(offset, length)?,
            },
            Command::Pc => Reply::Pc(self.pc()?),
            Command::Line => Reply::Line {
                line: self.line()?,
                text: self.source_line()?.map(str::to_owned),
            },
            Command::List(radius) => Reply::Listing {
                current: self.line()?,
                lines: self
                    .source_context(radius)?
                    .into_iter()
                    .map(|(n, text)| (n, text.to_owned()))
                    .collect(),
            },
            Command::Break(line) => {
                let added = self.add_breakpoint(line)?;
                Reply::BreakpointSet {
                    line,
                    added,
                    reachable: !self.source_map.pcs_for_line(line).is_empty(),
                }
            }
            Command::Delete(line) => Reply::BreakpointDeleted {
                line,
                existed: self.remove_breakpoint(line)?,
            },
            Command::Breakpoints => Reply::Breakpoints(self.breakpoints()?),
            Command::Help => {
                self.ensure_suspended()?;
                Reply::Help
            }
        };
        Ok(reply)
    }
}
