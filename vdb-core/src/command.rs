//! デバッガコマンド

use crate::errors::DebugError;
use crate::parse::parse_number;
use crate::source_map::LineNumber;
use vdb_vm::memory::MEMORY_LIMIT;

/// `memory` コマンドの既定の表示長
pub const DEFAULT_MEMORY_LENGTH: usize = 64;

/// `list` コマンドの既定の表示範囲
pub const DEFAULT_LIST_RADIUS: u32 = 3;

/// デバッガコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 実行継続
    Continue,
    /// 次の命令で再度停止
    Step,
    /// スタック表示
    Stack,
    /// メモリ表示
    Memory { offset: usize, length: usize },
    /// プログラムカウンタ表示
    Pc,
    /// 現在のソース行表示
    Line,
    /// 現在行の周辺表示
    List(u32),
    /// ブレークポイントを設定
    Break(LineNumber),
    /// ブレークポイントを削除
    Delete(LineNumber),
    /// ブレークポイント一覧表示
    Breakpoints,
    /// ヘルプ表示
    Help,
}

impl Command {
    /// コマンド文字列をパースする
    pub fn parse(input: &str) -> Result<Self, DebugError> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Err(DebugError::malformed("empty command"));
        };

        let command = match name {
            "continue" | "c" => Command::Continue,
            "step" | "s" | "next" | "n" => Command::Step,
            "stack" | "st" => Command::Stack,
            "memory" | "mem" => {
                let offset = match args.first() {
                    Some(arg) => parse_usize(arg)?,
                    None => 0,
                };
                let length = match args.get(1) {
                    Some(arg) => parse_usize(arg)?,
                    None => DEFAULT_MEMORY_LENGTH,
                };
                if length > MEMORY_LIMIT {
                    return Err(DebugError::malformed(format!(
                        "memory length too large: {} (at most {})",
                        length, MEMORY_LIMIT
                    )));
                }
                Command::Memory { offset, length }
            }
            "pc" => Command::Pc,
            "line" | "l" => Command::Line,
            "list" | "ls" => match args.first() {
                Some(arg) => Command::List(parse_line(arg)?),
                None => Command::List(DEFAULT_LIST_RADIUS),
            },
            "break" | "b" => Command::Break(parse_line(required(name, args)?)?),
            "delete" | "d" => Command::Delete(parse_line(required(name, args)?)?),
            "breakpoints" | "info" | "i" => Command::Breakpoints,
            "help" | "h" | "?" => Command::Help,
            _ => return Err(DebugError::malformed(format!("unknown command '{}'", name))),
        };

        let max_args = match command {
            Command::Memory { .. } => 2,
            Command::List(_) | Command::Break(_) | Command::Delete(_) => 1,
            _ => 0,
        };
        if args.len() > max_args {
            return Err(DebugError::malformed(format!(
                "too many arguments for '{}'",
                name
            )));
        }

        Ok(command)
    }
}

fn required<'a>(name: &str, args: &[&'a str]) -> Result<&'a str, DebugError> {
    args.first()
        .copied()
        .ok_or_else(|| DebugError::malformed(format!("'{}' requires a line number", name)))
}

fn parse_line(arg: &str) -> Result<LineNumber, DebugError> {
    let value = parse_number(arg).map_err(|e| DebugError::malformed(e.to_string()))?;
    LineNumber::try_from(value)
        .map_err(|_| DebugError::malformed(format!("line number out of range: {}", arg)))
}

fn parse_usize(arg: &str) -> Result<usize, DebugError> {
    let value = parse_number(arg).map_err(|e| DebugError::malformed(e.to_string()))?;
    usize::try_from(value)
        .map_err(|_| DebugError::malformed(format!("value out of range: {}", arg)))
}
