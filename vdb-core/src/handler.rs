//! 一時停止時のセッション操作
//!
//! 実行ループは停止のたびに [`SessionHandler::on_pause`] を呼び、
//! ハンドラがセッションを解放するまで戻りません。端末との対話などは
//! このトレイトの実装側の責務です。

use crate::errors::DebugError;
use crate::session::{DebugSession, PauseReason, Reply};
use crate::source_map::{LineNumber, ProgramCounter};
use std::collections::VecDeque;
use tracing::warn;
use vdb_vm::Word;

/// 一時停止したセッションを操作する
pub trait SessionHandler {
    /// セッションを操作し、continueかstepで解放してから戻る
    fn on_pause(&mut self, session: &mut DebugSession<'_>) -> anyhow::Result<()>;
}

/// 停止するたびにすぐ実行を継続する
#[derive(Debug, Clone, Default)]
pub struct ContinueAlways {
    pauses: usize,
}

impl ContinueAlways {
    pub fn new() -> Self {
        Self::default()
    }

    /// 停止した回数
    pub fn pauses(&self) -> usize {
        self.pauses
    }
}

impl SessionHandler for ContinueAlways {
    fn on_pause(&mut self, session: &mut DebugSession<'_>) -> anyhow::Result<()> {
        self.pauses += 1;
        session.continue_execution()?;
        Ok(())
    }
}

/// 停止時の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseRecord {
    pub pc: ProgramCounter,
    pub line: Option<LineNumber>,
    pub reason: PauseReason,
    pub stack: Vec<Word>,
}

/// スクリプト中の1コマンドの実行記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub pc: ProgramCounter,
    pub command: String,
    /// 成功時は応答、不正なコマンドならそのメッセージ
    pub outcome: Result<Reply, String>,
}

/// あらかじめ与えたコマンド列を順に実行する
///
/// 停止するたびに、セッションが解放されるまでコマンドを消費します。
/// コマンドが尽きたら実行を継続します。不正なコマンドは記録して読み飛ばします。
#[derive(Debug, Clone, Default)]
pub struct CommandScript {
    commands: VecDeque<String>,
    pauses: Vec<PauseRecord>,
    transcript: Vec<ScriptEntry>,
}

impl CommandScript {
    /// コマンド列からスクリプトを作成する
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            pauses: Vec::new(),
            transcript: Vec::new(),
        }
    }

    /// 停止した位置の一覧
    pub fn pauses(&self) -> &[PauseRecord] {
        &self.pauses
    }

    /// コマンドの実行記録
    pub fn transcript(&self) -> &[ScriptEntry] {
        &self.transcript
    }

    /// 未実行のコマンド数
    pub fn remaining(&self) -> usize {
        self.commands.len()
    }
}

impl SessionHandler for CommandScript {
    fn on_pause(&mut self, session: &mut DebugSession<'_>) -> anyhow::Result<()> {
        let pc = session.pc()?;
        self.pauses.push(PauseRecord {
            pc,
            line: session.line()?,
            reason: session.reason(),
            stack: session.stack()?.to_vec(),
        });

        while let Some(command) = self.commands.pop_front() {
            let outcome = match session.execute(&command) {
                Ok(reply) => Ok(reply),
                Err(DebugError::MalformedCommand(message)) => {
                    warn!("Skipping malformed command '{}': {}", command, message);
                    Err(message)
                }
                Err(e) => return Err(e.into()),
            };
            self.transcript.push(ScriptEntry {
                pc,
                command,
                outcome,
            });

            if session.is_released() {
                return Ok(());
            }
        }

        session.continue_execution()?;
        Ok(())
    }
}
