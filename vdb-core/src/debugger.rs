//! デバッガのメインロジック

use crate::breakpoint::{BreakpointOracle, LineBreakpoints};
use crate::errors::DebugError;
use crate::handler::SessionHandler;
use crate::interpreter::Interpreter;
use crate::source::SourceText;
use crate::source_map::{LineNumber, ProgramCounter, SourceMap};
use tracing::debug;
use vdb_vm::{Computation, OpcodeTable};

/// デバッガ
///
/// 実行ループとブレークポイント判定器をまとめて保持します。
/// セッション中に編集したブレークポイントは、同じデバッガでの以降の実行にも引き継がれます。
#[derive(Debug, Clone, Default)]
pub struct Debugger {
    /// 実行ループ
    interpreter: Interpreter,
    /// ブレークポイント判定
    breakpoints: LineBreakpoints,
}

impl Debugger {
    /// ソースマップから新しいデバッガを作成する
    pub fn new(source_map: SourceMap) -> Self {
        Self {
            interpreter: Interpreter::default(),
            breakpoints: LineBreakpoints::new(source_map),
        }
    }

    /// 表示用のソーステキストを設定する
    pub fn with_source(mut self, source: SourceText) -> Self {
        self.interpreter = self.interpreter.with_source(source);
        self
    }

    /// ディスパッチテーブルを差し替える
    pub fn with_opcodes(mut self, opcodes: OpcodeTable) -> Self {
        let source = self.interpreter.source().cloned();
        self.interpreter = Interpreter::new(opcodes);
        if let Some(source) = source {
            self.interpreter = self.interpreter.with_source(source);
        }
        self
    }

    /// ブレークポイントを設定する
    ///
    /// その行に対応するpcが1つもない場合は警告を出しますが、設定は行います。
    pub fn set_breakpoint(&mut self, line: LineNumber) -> bool {
        let source_map = self.breakpoints.source_map_mut();
        if source_map.pcs_for_line(line).is_empty() {
            debug!("Breakpoint at line {} has no instructions and will never trigger", line);
        }
        source_map.add_breakpoint(line)
    }

    /// ブレークポイントを削除する
    pub fn remove_breakpoint(&mut self, line: LineNumber) -> bool {
        self.breakpoints.source_map_mut().remove_breakpoint(line)
    }

    /// すべてのブレークポイントを取得する
    pub fn breakpoints(&self) -> Vec<LineNumber> {
        self.breakpoints.source_map().breakpoints().collect()
    }

    /// 行で一時停止した回数を取得する
    pub fn hits(&self, line: LineNumber) -> usize {
        self.breakpoints.hits(line)
    }

    /// pcに対応するソース行を取得する
    pub fn line_for(&self, pc: ProgramCounter) -> Option<LineNumber> {
        self.breakpoints.source_map().line_for(pc)
    }

    /// ソースマップを取得する
    pub fn source_map(&self) -> &SourceMap {
        self.breakpoints.source_map()
    }

    /// 実行ループを取得する
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// 実行コンテキストを完了まで実行する
    pub fn run<H>(&mut self, computation: &mut Computation, handler: &mut H) -> Result<(), DebugError>
    where
        H: SessionHandler + ?Sized,
    {
        self.interpreter
            .run(computation, &mut self.breakpoints, handler)
    }
}
