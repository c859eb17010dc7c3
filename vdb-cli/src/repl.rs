//! 一時停止中の対話ループ

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::collections::VecDeque;
use tracing::debug;
use vdb_core::{DebugError, DebugSession, PauseReason, Reply, Resume, SessionHandler};

/// コマンドの入力元
enum Input {
    /// 端末（rustyline）
    Editor(DefaultEditor),
    /// `-x` で与えたコマンド列
    Script(VecDeque<String>),
}

/// 停止するたびにコマンドを読み取ってセッションを操作する
pub struct Repl {
    input: Input,
    last_command: Option<String>,
}

impl Repl {
    /// 端末から読み取るREPLを作成する
    pub fn interactive() -> Result<Self> {
        Ok(Self {
            input: Input::Editor(DefaultEditor::new()?),
            last_command: None,
        })
    }

    /// 与えたコマンド列を順に実行するREPLを作成する
    pub fn scripted(commands: Vec<String>) -> Self {
        Self {
            input: Input::Script(commands.into()),
            last_command: None,
        }
    }

    /// 次のコマンドを読み取る（入力終了ならNone）
    fn read_command(&mut self) -> Result<Option<String>> {
        match &mut self.input {
            Input::Editor(editor) => loop {
                match editor.readline("(vdb) ") {
                    Ok(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            // 空行は直前のコマンドを繰り返す
                            match &self.last_command {
                                Some(last) => return Ok(Some(last.clone())),
                                None => continue,
                            }
                        }
                        editor.add_history_entry(line)?;
                        return Ok(Some(line.to_string()));
                    }
                    Err(ReadlineError::Interrupted) => {
                        println!("CTRL-C");
                        return Ok(None);
                    }
                    Err(ReadlineError::Eof) => {
                        println!("CTRL-D");
                        return Ok(None);
                    }
                    Err(err) => return Err(err.into()),
                }
            },
            Input::Script(commands) => {
                let command = commands.pop_front();
                if let Some(command) = &command {
                    println!("(vdb) {}", command);
                }
                Ok(command)
            }
        }
    }
}

impl SessionHandler for Repl {
    fn on_pause(&mut self, session: &mut DebugSession<'_>) -> Result<()> {
        print_pause(session)?;

        loop {
            let Some(command) = self.read_command()? else {
                // 入力が尽きたら実行を継続する
                println!("Continuing execution...");
                session.continue_execution()?;
                return Ok(());
            };

            match session.execute(&command) {
                Ok(reply) => print_reply(&reply),
                Err(DebugError::MalformedCommand(message)) => {
                    debug!(command = %command, "Rejected malformed command");
                    println!("Error: {}", message);
                    println!("Type 'help' for available commands.");
                }
                Err(e) => return Err(e.into()),
            }
            self.last_command = Some(command);

            if session.is_released() {
                return Ok(());
            }
        }
    }
}

/// 停止位置を表示する
fn print_pause(session: &DebugSession<'_>) -> Result<()> {
    let pc = session.pc()?;
    let line = session.line()?;

    println!();
    match (session.reason(), line) {
        (PauseReason::Breakpoint, Some(line)) => {
            println!("Breakpoint hit at line {} (pc: 0x{:x})", line, pc)
        }
        (PauseReason::Breakpoint, None) => println!("Breakpoint hit at pc 0x{:x}", pc),
        (PauseReason::Step, Some(line)) => println!("Stepped to line {} (pc: 0x{:x})", line, pc),
        (PauseReason::Step, None) => println!("Stepped to pc 0x{:x} (no source line)", pc),
    }

    if let (Some(line), Some(text)) = (line, session.source_line()?) {
        println!("{:>5} | {}", line, text);
    }
    Ok(())
}

/// コマンドの結果を表示する
pub fn print_reply(reply: &Reply) {
    match reply {
        Reply::Stack(values) => print_stack(values),
        Reply::Memory { offset, bytes } => print_memory(*offset, bytes),
        Reply::Pc(pc) => println!("pc: 0x{:x} ({})", pc, pc),
        Reply::Line { line, text } => match (line, text) {
            (Some(line), Some(text)) => println!("{:>5} | {}", line, text),
            (Some(line), None) => println!("Line {} (source not loaded)", line),
            (None, _) => println!("No source line for this instruction"),
        },
        Reply::Listing { current, lines } => {
            if lines.is_empty() {
                println!("No source available");
            }
            for (n, text) in lines {
                let marker = if Some(*n) == *current { "->" } else { "  " };
                println!("{} {:>5} | {}", marker, n, text);
            }
        }
        Reply::BreakpointSet {
            line,
            added,
            reachable,
        } => {
            if *added {
                println!("Breakpoint set at line {}", line);
            } else {
                println!("Breakpoint already set at line {}", line);
            }
            if !reachable {
                println!("Warning: no instructions map to line {}", line);
            }
        }
        Reply::BreakpointDeleted { line, existed } => {
            if *existed {
                println!("Breakpoint at line {} deleted", line);
            } else {
                println!("No breakpoint at line {}", line);
            }
        }
        Reply::Breakpoints(lines) => {
            if lines.is_empty() {
                println!("No breakpoints");
            } else {
                println!("Breakpoints ({}):", lines.len());
                for line in lines {
                    println!("  line {}", line);
                }
            }
        }
        Reply::Help => print_help(),
        Reply::Resumed(Resume::Continue) => println!("Continuing execution..."),
        Reply::Resumed(Resume::Step) => {}
    }
}

/// スタックを先頭から表示する
pub fn print_stack(values: &[u64]) {
    if values.is_empty() {
        println!("Stack is empty");
        return;
    }
    println!("Stack ({} items, top first):", values.len());
    for (i, value) in values.iter().rev().enumerate() {
        println!("  {:>4}: 0x{:016x} ({})", i, value, value);
    }
}

/// メモリを16バイト単位で表示する
fn print_memory(offset: usize, bytes: &[u8]) {
    if bytes.is_empty() {
        println!("(0 bytes)");
        return;
    }
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("  0x{:06x}: {}", offset.saturating_add(i * 16), hex.join(" "));
    }
}

fn print_help() {
    println!("Available commands:");
    println!();
    println!("  continue (c)          - Continue until the next breakpoint");
    println!("  step (s, next, n)     - Execute one instruction and pause again");
    println!("  stack (st)            - Show the stack, top first");
    println!("  memory (mem) [off] [len] - Show memory (default: 0 64)");
    println!("  pc                    - Show the program counter");
    println!("  line (l)              - Show the current source line");
    println!("  list (ls) [radius]    - Show source around the current line");
    println!("  break (b) <line>      - Set a breakpoint at a source line");
    println!("  delete (d) <line>     - Delete a breakpoint");
    println!("  breakpoints (info, i) - List breakpoints");
    println!("  help (h, ?)           - Show this help message");
    println!();
    println!("An empty line repeats the last command. CTRL-D continues execution.");
    println!();
    println!("Examples:");
    println!("  break 12");
    println!("  mem 0x40 32");
    println!("  list 5");
}
