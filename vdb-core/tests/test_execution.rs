//! 実行ループとデバッグセッションの結合テスト

use vdb_core::{
    Address, CommandScript, Computation, ContinueAlways, DebugError, DebugSession, Debugger,
    Flow, OpcodeTable, PauseReason, Reply, Resume, SessionHandler, SourceMap, SourceText,
    VmError,
};
use vdb_vm::precompile::IDENTITY_ADDRESS;

/// PUSH1 1; PUSH1 2; ADD; STOP
const ADD_PROGRAM: [u8; 6] = [0x60, 0x01, 0x60, 0x02, 0x01, 0x00];

fn add_program_map(breakpoints: &[u32]) -> SourceMap {
    SourceMap::new(
        [(0, 10), (2, 10), (4, 11), (5, 12)],
        breakpoints.iter().copied(),
    )
}

/// 3から0までカウントダウンし、メモリに42を書いて8バイト返す
///
/// ```text
/// 1: counter = 3
/// 2: loop:
/// 3:   counter = counter - 1
/// 4:   if counter != 0: goto loop
/// 5: mem[0] = 42
/// 6: return mem[0:8]
/// ```
const COUNTDOWN_PROGRAM: [u8; 21] = [
    0x60, 0x03, // 0: PUSH1 3
    0x5b, // 2: JUMPDEST
    0x60, 0x01, // 3: PUSH1 1
    0x90, // 5: SWAP1
    0x03, // 6: SUB
    0x80, // 7: DUP1
    0x60, 0x02, // 8: PUSH1 2
    0x57, // 10: JUMPI
    0x60, 0x2a, // 11: PUSH1 42
    0x60, 0x00, // 13: PUSH1 0
    0x52, // 15: MSTORE
    0x60, 0x08, // 16: PUSH1 8
    0x60, 0x00, // 18: PUSH1 0
    0xf3, // 20: RETURN
];

const COUNTDOWN_SOURCE: &str = "counter = 3
loop:
  counter = counter - 1
  if counter != 0: goto loop
mem[0] = 42
return mem[0:8]";

fn countdown_map(breakpoints: &[u32]) -> SourceMap {
    SourceMap::new(
        [
            (0, 1),
            (2, 2),
            (3, 3),
            (5, 3),
            (6, 3),
            (7, 4),
            (8, 4),
            (10, 4),
            (11, 5),
            (13, 5),
            (15, 5),
            (16, 6),
            (18, 6),
            (20, 6),
        ],
        breakpoints.iter().copied(),
    )
}

/// デバッガを使わない素の実行ループ
fn run_plain(computation: &mut Computation) -> Result<(), VmError> {
    let table = OpcodeTable::reference();
    loop {
        let opcode = computation.code_mut().next_opcode();
        let entry = table.get(opcode).ok_or(VmError::InvalidInstruction(opcode))?;
        if entry.execute(computation)? == Flow::Halt {
            return Ok(());
        }
    }
}

fn assert_same_state(actual: &Computation, expected: &Computation) {
    assert_eq!(actual.stack, expected.stack);
    assert_eq!(actual.memory, expected.memory);
    assert_eq!(actual.return_data(), expected.return_data());
    assert_eq!(actual.pc(), expected.pc());
}

#[test]
fn test_pause_at_add_then_continue() {
    let mut debugger = Debugger::new(add_program_map(&[11]));
    let mut script = CommandScript::new(["stack", "continue"]);
    let mut computation = Computation::new(ADD_PROGRAM);

    debugger.run(&mut computation, &mut script).unwrap();

    assert_eq!(script.pauses().len(), 1);
    let pause = &script.pauses()[0];
    assert_eq!(pause.pc, 4);
    assert_eq!(pause.line, Some(11));
    assert_eq!(pause.reason, PauseReason::Breakpoint);
    // ADD の実行前に停止している
    assert_eq!(pause.stack, vec![1, 2]);
    assert_eq!(script.transcript()[0].outcome, Ok(Reply::Stack(vec![1, 2])));

    assert!(computation.is_halted());
    assert_eq!(computation.stack.values(), &[3]);
}

#[test]
fn test_no_breakpoints_is_passthrough() {
    let mut expected = Computation::new(COUNTDOWN_PROGRAM);
    run_plain(&mut expected).unwrap();

    let mut debugger = Debugger::new(countdown_map(&[]));
    let mut handler = ContinueAlways::new();
    let mut actual = Computation::new(COUNTDOWN_PROGRAM);
    debugger.run(&mut actual, &mut handler).unwrap();

    assert_eq!(handler.pauses(), 0);
    assert!(actual.is_halted());
    assert_same_state(&actual, &expected);
    assert_eq!(actual.return_data(), &42u64.to_be_bytes());
}

#[test]
fn test_continue_is_transparent() {
    let mut expected = Computation::new(COUNTDOWN_PROGRAM);
    run_plain(&mut expected).unwrap();

    let mut debugger = Debugger::new(countdown_map(&[3]));
    let mut handler = ContinueAlways::new();
    let mut actual = Computation::new(COUNTDOWN_PROGRAM);
    debugger.run(&mut actual, &mut handler).unwrap();

    // 3行目の3命令 × 3周
    assert_eq!(handler.pauses(), 9);
    assert_eq!(debugger.hits(3), 9);
    assert_same_state(&actual, &expected);
}

#[test]
fn test_step_pauses_at_next_instruction() {
    let mut debugger = Debugger::new(countdown_map(&[1]));
    let mut script = CommandScript::new(["step", "s", "c"]);
    let mut computation = Computation::new(COUNTDOWN_PROGRAM);

    debugger.run(&mut computation, &mut script).unwrap();

    let pauses: Vec<_> = script
        .pauses()
        .iter()
        .map(|p| (p.pc, p.line, p.reason))
        .collect();
    assert_eq!(
        pauses,
        vec![
            (0, Some(1), PauseReason::Breakpoint),
            (2, Some(2), PauseReason::Step),
            (3, Some(3), PauseReason::Step),
        ]
    );
    assert!(computation.is_halted());
}

#[test]
fn test_step_onto_unmapped_instruction() {
    let mut debugger = Debugger::new(SourceMap::new([(0, 10)], [10]));
    let mut script = CommandScript::new(["step", "line", "continue"]);
    let mut computation = Computation::new(ADD_PROGRAM);

    debugger.run(&mut computation, &mut script).unwrap();

    assert_eq!(script.pauses().len(), 2);
    assert_eq!(script.pauses()[1].pc, 2);
    assert_eq!(script.pauses()[1].line, None);
    assert_eq!(
        script.transcript()[1].outcome,
        Ok(Reply::Line { line: None, text: None })
    );
    assert_eq!(computation.stack.values(), &[3]);
}

#[test]
fn test_breakpoint_added_while_suspended() {
    let mut debugger = Debugger::new(countdown_map(&[1]));
    let mut script = CommandScript::new(["b 5", "c"]);
    let mut computation = Computation::new(COUNTDOWN_PROGRAM);

    debugger.run(&mut computation, &mut script).unwrap();

    let pcs: Vec<_> = script.pauses().iter().map(|p| p.pc).collect();
    assert_eq!(pcs, vec![0, 11, 13, 15]);
    assert_eq!(debugger.breakpoints(), vec![1, 5]);
}

#[test]
fn test_breakpoint_removed_while_suspended() {
    let mut debugger = Debugger::new(countdown_map(&[3]));
    let mut script = CommandScript::new(["delete 3", "c"]);
    let mut computation = Computation::new(COUNTDOWN_PROGRAM);

    debugger.run(&mut computation, &mut script).unwrap();

    assert_eq!(script.pauses().len(), 1);
    assert!(debugger.breakpoints().is_empty());
}

#[test]
fn test_malformed_command_then_retry() {
    let mut debugger = Debugger::new(add_program_map(&[11]));
    let mut script = CommandScript::new(["jump 3", "pc", "c"]);
    let mut computation = Computation::new(ADD_PROGRAM);

    debugger.run(&mut computation, &mut script).unwrap();

    let transcript = script.transcript();
    assert_eq!(transcript.len(), 3);
    assert!(transcript[0].outcome.is_err());
    assert_eq!(transcript[1].outcome, Ok(Reply::Pc(4)));
    assert_eq!(transcript[2].outcome, Ok(Reply::Resumed(Resume::Continue)));
    assert_eq!(computation.stack.values(), &[3]);
}

#[test]
fn test_source_text_in_session() {
    let mut debugger =
        Debugger::new(countdown_map(&[5])).with_source(SourceText::new(COUNTDOWN_SOURCE));
    let mut script = CommandScript::new(["line", "list 1", "c", "c", "c"]);
    let mut computation = Computation::new(COUNTDOWN_PROGRAM);

    debugger.run(&mut computation, &mut script).unwrap();

    let transcript = script.transcript();
    assert_eq!(
        transcript[0].outcome,
        Ok(Reply::Line {
            line: Some(5),
            text: Some("mem[0] = 42".to_string())
        })
    );
    assert_eq!(
        transcript[1].outcome,
        Ok(Reply::Listing {
            current: Some(5),
            lines: vec![
                (4, "  if counter != 0: goto loop".to_string()),
                (5, "mem[0] = 42".to_string()),
                (6, "return mem[0:8]".to_string()),
            ]
        })
    );
    assert_eq!(script.remaining(), 0);
}

/// 解放後のセッションを使い回そうとするハンドラ
#[derive(Default)]
struct ReuseAfterRelease {
    rejected: usize,
}

impl SessionHandler for ReuseAfterRelease {
    fn on_pause(&mut self, session: &mut DebugSession<'_>) -> anyhow::Result<()> {
        let before = session.stack()?.to_vec();
        session.continue_execution()?;

        for command in ["stack", "b 12", "step", "continue"] {
            match session.execute(command) {
                Err(DebugError::InvalidSession) => self.rejected += 1,
                other => panic!("expected InvalidSession for {:?}, got {:?}", command, other),
            }
        }
        assert!(matches!(session.memory(0, 1), Err(DebugError::InvalidSession)));
        assert_eq!(session.resumption(), Some(Resume::Continue));
        assert_eq!(before, vec![1, 2]);
        Ok(())
    }
}

#[test]
fn test_released_session_is_invalid() {
    let mut debugger = Debugger::new(add_program_map(&[11]));
    let mut handler = ReuseAfterRelease::default();
    let mut computation = Computation::new(ADD_PROGRAM);

    debugger.run(&mut computation, &mut handler).unwrap();

    assert_eq!(handler.rejected, 4);
    // 解放後の "b 12" は反映されない
    assert_eq!(debugger.breakpoints(), vec![11]);
    assert_eq!(computation.stack.values(), &[3]);
}

/// セッションを解放せずに戻るハンドラ
struct Abandon;

impl SessionHandler for Abandon {
    fn on_pause(&mut self, _session: &mut DebugSession<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn test_unreleased_session_fails_the_run() {
    let mut debugger = Debugger::new(add_program_map(&[11]));
    let mut computation = Computation::new(ADD_PROGRAM);

    let result = debugger.run(&mut computation, &mut Abandon);

    assert!(matches!(result, Err(DebugError::SessionNotReleased)));
    assert!(!computation.is_halted());
    // ADD は実行されていない
    assert_eq!(computation.stack.values(), &[1, 2]);
}

/// 端末エラーなどを模したハンドラ
struct Broken;

impl SessionHandler for Broken {
    fn on_pause(&mut self, _session: &mut DebugSession<'_>) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("terminal closed"))
    }
}

#[test]
fn test_handler_error_surfaces() {
    let mut debugger = Debugger::new(add_program_map(&[10]));
    let mut computation = Computation::new(ADD_PROGRAM);

    let result = debugger.run(&mut computation, &mut Broken);

    match result {
        Err(DebugError::Handler(e)) => assert_eq!(e.to_string(), "terminal closed"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_handler_failure_propagates_unchanged() {
    // PUSH1 0; PUSH1 0; REVERT
    let code = vec![0x60, 0x00, 0x60, 0x00, 0xfd];
    let mut plain = Computation::new(code.clone());
    let plain_error = run_plain(&mut plain).unwrap_err();

    for breakpoints in [vec![], vec![2]] {
        let map = SourceMap::new([(0, 1), (2, 1), (4, 2)], breakpoints.iter().copied());
        let mut debugger = Debugger::new(map);
        let mut handler = ContinueAlways::new();
        let mut computation = Computation::new(code.clone());

        match debugger.run(&mut computation, &mut handler) {
            Err(DebugError::Vm(e)) => assert_eq!(e, plain_error),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(handler.pauses(), breakpoints.len());
        assert!(!computation.is_halted());
    }
}

#[test]
fn test_unknown_opcode_is_handler_failure() {
    let mut debugger = Debugger::new(SourceMap::default());
    let mut computation = Computation::new(vec![0x0c]);

    let result = debugger.run(&mut computation, &mut ContinueAlways::new());

    assert!(matches!(
        result,
        Err(DebugError::Vm(VmError::InvalidInstruction(0x0c)))
    ));
}

#[test]
fn test_running_off_the_end_halts() {
    // PUSH1 5（STOPなし）
    let mut debugger = Debugger::new(SourceMap::default());
    let mut computation = Computation::new(vec![0x60, 0x05]);

    debugger
        .run(&mut computation, &mut ContinueAlways::new())
        .unwrap();

    assert!(computation.is_halted());
    assert_eq!(computation.stack.values(), &[5]);
}

#[test]
fn test_precompile_bypasses_breakpoints() {
    let mut debugger = Debugger::new(add_program_map(&[10, 11, 12]));
    let mut handler = ContinueAlways::new();
    let mut computation = Computation::new(ADD_PROGRAM)
        .with_code_address(Address::from_low_u64(IDENTITY_ADDRESS))
        .with_call_data(vec![0xde, 0xad]);

    debugger.run(&mut computation, &mut handler).unwrap();

    assert_eq!(handler.pauses(), 0);
    assert!(computation.is_halted());
    assert_eq!(computation.return_data(), &[0xde, 0xad]);
    // 命令ストリームは実行されない
    assert!(computation.stack.is_empty());
    assert_eq!(computation.pc(), 0);
}

#[test]
fn test_empty_return_at_large_offset_halts() {
    // PUSH1 0; PUSH1 100; RETURN
    let mut debugger = Debugger::new(SourceMap::default());
    let mut computation = Computation::new(vec![0x60, 0x00, 0x60, 0x64, 0xf3]);

    debugger
        .run(&mut computation, &mut ContinueAlways::new())
        .unwrap();

    assert!(computation.is_halted());
    assert!(computation.return_data().is_empty());
    assert!(computation.memory.is_empty());
}

#[test]
fn test_oversized_memory_command_keeps_session_suspended() {
    let mut debugger = Debugger::new(add_program_map(&[11]));
    let mut handler = CommandScript::new(["mem 0 0xffffffffffffffff", "mem 0 4", "c"]);
    let mut computation = Computation::new(ADD_PROGRAM);

    debugger.run(&mut computation, &mut handler).unwrap();

    let transcript = handler.transcript();
    assert_eq!(transcript.len(), 3);
    assert!(transcript[0].outcome.is_err());
    assert_eq!(
        transcript[1].outcome,
        Ok(Reply::Memory { offset: 0, bytes: vec![0; 4] })
    );
    assert_eq!(computation.stack.values(), &[3]);
}
