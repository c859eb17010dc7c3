//! vdb CLI - コマンドラインインターフェース
//!
//! バイトコードVM向けブレークポイントデバッガ vdb のREPLインターフェース

mod repl;
mod source_map_file;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vdb_core::parse::parse_hex_bytes;
use vdb_core::{
    disassemble, Address, Computation, DebugError, Debugger, LineNumber, OpcodeTable, SourceMap,
    SourceText,
};

use crate::repl::Repl;

/// vdb - Bytecode VM Debugger
#[derive(Parser)]
#[command(name = "vdb")]
#[command(version = "0.1.0")]
#[command(about = "Source-level breakpoint debugger for a stack-based bytecode VM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: DebugCommand,
}

#[derive(Subcommand)]
enum DebugCommand {
    /// Run bytecode under the debugger
    Run {
        #[command(flatten)]
        code: CodeArgs,

        /// Line number map produced by the compiler (JSON)
        #[arg(short = 'm', long)]
        source_map: Option<PathBuf>,

        /// Source file shown at breakpoints
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Pause before instructions on this source line (repeatable)
        #[arg(short, long = "break", value_name = "LINE")]
        breakpoints: Vec<LineNumber>,

        /// Run these debugger commands instead of prompting (repeatable)
        #[arg(short = 'x', long = "exec", value_name = "COMMAND")]
        commands: Vec<String>,

        /// Call data as a hex string
        #[arg(long)]
        calldata: Option<String>,

        /// Address of the executing code (precompiles run natively)
        #[arg(long)]
        code_address: Option<String>,
    },

    /// Disassemble bytecode, annotated with source lines
    Disasm {
        #[command(flatten)]
        code: CodeArgs,

        /// Line number map produced by the compiler (JSON)
        #[arg(short = 'm', long)]
        source_map: Option<PathBuf>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct CodeArgs {
    /// Bytecode as a hex string
    #[arg(long)]
    code: Option<String>,

    /// File containing the bytecode as a hex string
    #[arg(long)]
    code_file: Option<PathBuf>,
}

impl CodeArgs {
    fn load(&self) -> Result<Vec<u8>> {
        match (&self.code, &self.code_file) {
            (Some(code), _) => parse_hex_bytes(code).context("Invalid --code"),
            (None, Some(path)) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                parse_hex_bytes(&text)
                    .with_context(|| format!("Invalid bytecode in {}", path.display()))
            }
            (None, None) => Err(anyhow::anyhow!("Either --code or --code-file is required")),
        }
    }
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        DebugCommand::Run {
            code,
            source_map,
            source,
            breakpoints,
            commands,
            calldata,
            code_address,
        } => {
            let code = code.load()?;
            let mut computation = Computation::new(code).with_call_data(match calldata {
                Some(data) => parse_hex_bytes(&data).context("Invalid --calldata")?,
                None => Vec::new(),
            });
            if let Some(address) = code_address {
                computation = computation.with_code_address(parse_address(&address)?);
            }

            let mut debugger = init_debugger(source_map, source, &breakpoints)?;
            let mut repl = if commands.is_empty() {
                println!("vdb - Bytecode VM Debugger");
                println!("Type 'help' at a breakpoint for available commands.");
                Repl::interactive()?
            } else {
                Repl::scripted(commands)
            };

            run(&mut debugger, &mut computation, &mut repl)
        }
        DebugCommand::Disasm { code, source_map } => {
            let code = code.load()?;
            let source_map = match source_map {
                Some(path) => source_map_file::load(&path)?,
                None => SourceMap::default(),
            };
            print_disassembly(&code, &source_map);
            Ok(())
        }
    }
}

/// RUST_LOG からログ出力を設定する（既定は warn、出力先は標準エラー）
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// ソースマップとソースを読み込んでデバッガを初期化する
fn init_debugger(
    source_map: Option<PathBuf>,
    source: Option<PathBuf>,
    breakpoints: &[LineNumber],
) -> Result<Debugger> {
    let source_map = match source_map {
        Some(path) => {
            let map = source_map_file::load(&path)?;
            println!("Loaded source map from {} ({} mapped pcs)", path.display(), map.len());
            map
        }
        None => SourceMap::default(),
    };

    let mut debugger = Debugger::new(source_map);
    if let Some(path) = source {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let source = SourceText::new(&text);
        println!("Loaded source from {} ({} lines)", path.display(), source.line_count());
        debugger = debugger.with_source(source);
    }

    for line in breakpoints {
        debugger.set_breakpoint(*line);
        if debugger.source_map().pcs_for_line(*line).is_empty() {
            println!("Warning: no instructions map to line {}", line);
        }
    }

    let lines = debugger.breakpoints();
    if !lines.is_empty() {
        let lines: Vec<String> = lines.iter().map(ToString::to_string).collect();
        println!("Breakpoints at lines: {}", lines.join(", "));
    }
    println!();

    Ok(debugger)
}

/// デバッガで実行し、最終状態を表示する
fn run(debugger: &mut Debugger, computation: &mut Computation, repl: &mut Repl) -> Result<()> {
    let result = debugger.run(computation, repl);

    println!();
    match result {
        Ok(()) => println!("Execution halted at pc 0x{:x}", computation.pc()),
        Err(DebugError::Vm(e)) => println!("Execution failed at pc 0x{:x}: {}", computation.pc(), e),
        Err(e) => return Err(e.into()),
    }

    repl::print_stack(computation.stack.values());
    if !computation.return_data().is_empty() {
        let hex: String = computation
            .return_data()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        println!("Return data: 0x{}", hex);
    }
    Ok(())
}

/// 16進文字列からアドレスを作成する（20バイト未満は左を0で埋める）
fn parse_address(s: &str) -> Result<Address> {
    let bytes = parse_hex_bytes(s).context("Invalid --code-address")?;
    if bytes.len() > 20 {
        return Err(anyhow::anyhow!(
            "Address is {} bytes long (at most 20 expected)",
            bytes.len()
        ));
    }
    let mut address = [0u8; 20];
    address[20 - bytes.len()..].copy_from_slice(&bytes);
    Ok(Address(address))
}

fn print_disassembly(code: &[u8], source_map: &SourceMap) {
    let opcodes = OpcodeTable::reference();
    for instruction in disassemble(code, &opcodes) {
        let line = source_map
            .line_for(instruction.pc)
            .map(|line| format!("line {:>4}", line))
            .unwrap_or_default();
        let immediate = if instruction.immediate.is_empty() {
            String::new()
        } else {
            let hex: String = instruction
                .immediate
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect();
            format!("0x{}", hex)
        };
        println!(
            "  0x{:04x}  {:<10} {:<8} {}",
            instruction.pc, line, instruction.mnemonic, immediate
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x04").unwrap(), Address::from_low_u64(4));
        assert!(parse_address(&"00".repeat(21)).is_err());
    }

    #[test]
    fn test_cli_requires_code() {
        assert!(Cli::try_parse_from(["vdb", "run"]).is_err());
        assert!(Cli::try_parse_from(["vdb", "run", "--code", "00", "--code-file", "a.hex"]).is_err());
        assert!(Cli::try_parse_from(["vdb", "run", "--code", "00", "-b", "3", "-b", "4"]).is_ok());
    }
}
