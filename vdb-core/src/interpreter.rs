//! 実行ループ
//!
//! 命令を1つずつフェッチしてディスパッチします。各命令の実行前に
//! ブレークポイントを判定し、停止する場合はセッションが解放されるまで待ちます。

use crate::breakpoint::{BreakpointHit, BreakpointOracle};
use crate::errors::DebugError;
use crate::handler::SessionHandler;
use crate::session::{DebugSession, PauseReason, Resume};
use crate::source::SourceText;
use tracing::{debug, trace};
use vdb_vm::{Computation, Flow, OpcodeTable, VmError};

/// 実行ループ
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    opcodes: OpcodeTable,
    source: Option<SourceText>,
}

impl Interpreter {
    /// ディスパッチテーブルを指定して作成する
    pub fn new(opcodes: OpcodeTable) -> Self {
        Self {
            opcodes,
            source: None,
        }
    }

    /// セッションに渡すソーステキストを設定する
    pub fn with_source(mut self, source: SourceText) -> Self {
        self.source = Some(source);
        self
    }

    /// ディスパッチテーブルを取得する
    pub fn opcodes(&self) -> &OpcodeTable {
        &self.opcodes
    }

    /// ソーステキストを取得する
    pub fn source(&self) -> Option<&SourceText> {
        self.source.as_ref()
    }

    /// 実行コンテキストを完了まで実行する
    ///
    /// ハンドラが停止（halt）を返すと正常終了します。それ以外のエラーは
    /// そのまま返します。どちらの場合も `computation` には最終状態が残ります。
    pub fn run<O, H>(
        &self,
        computation: &mut Computation,
        oracle: &mut O,
        handler: &mut H,
    ) -> Result<(), DebugError>
    where
        O: BreakpointOracle + ?Sized,
        H: SessionHandler + ?Sized,
    {
        let mut scope = computation.enter();

        // プリコンパイルはステップ実行もブレークポイントも対象外
        let precompile = scope.precompiles().get(&scope.code_address());
        if let Some(precompile) = precompile {
            debug!("Running precompile at {}", scope.code_address());
            precompile(&mut scope)?;
            scope.complete();
            return Ok(());
        }

        let mut step_pending = false;

        loop {
            // オペコード自身の位置（フェッチ直後のカーソルの1つ手前）
            let position = scope.pc();
            let opcode = scope.code_mut().next_opcode();
            let entry = self.opcodes.get(opcode);

            trace!(
                "OPCODE: 0x{:02x} ({}) | pc: {}",
                opcode,
                entry.map(|op| op.mnemonic).unwrap_or("UNKNOWN"),
                position
            );

            let hit = oracle.is_breakpoint(position);
            let reason = if step_pending {
                Some(PauseReason::Step)
            } else if hit.is_breakpoint {
                Some(PauseReason::Breakpoint)
            } else {
                None
            };

            if let Some(reason) = reason {
                let resume = self.pause(&scope, hit, reason, oracle, handler)?;
                step_pending = resume == Resume::Step;
            }

            let entry = entry.ok_or(VmError::InvalidInstruction(opcode))?;
            match entry.execute(&mut scope)? {
                Flow::Continue => {}
                Flow::Halt => break,
            }
        }

        scope.complete();
        Ok(())
    }

    /// セッションを作ってハンドラに渡し、再開指示を返す
    fn pause<O, H>(
        &self,
        computation: &Computation,
        hit: BreakpointHit,
        reason: PauseReason,
        oracle: &mut O,
        handler: &mut H,
    ) -> Result<Resume, DebugError>
    where
        O: BreakpointOracle + ?Sized,
        H: SessionHandler + ?Sized,
    {
        if let (true, Some(line)) = (hit.is_breakpoint, hit.line) {
            oracle.record_hit(line);
        }
        debug!(
            "Paused at pc {} (line: {:?}, reason: {:?})",
            hit.pc, hit.line, reason
        );

        let mut session = DebugSession::new(
            computation,
            hit.pc,
            hit.line,
            reason,
            oracle.source_map_mut(),
            self.source.as_ref(),
        );
        handler.on_pause(&mut session)?;
        session.resumption().ok_or(DebugError::SessionNotReleased)
    }
}
