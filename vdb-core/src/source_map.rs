//! ソースマップ
//!
//! プログラムカウンタからソース行への対応と、有効なブレークポイント行の集合を保持します。

use std::collections::{BTreeMap, BTreeSet};

/// プログラムカウンタ（命令ストリーム内のオフセット）
pub type ProgramCounter = usize;

/// ソース行番号（1始まり）
pub type LineNumber = u32;

/// ソースマップ
///
/// 構築後に変更されるのはブレークポイント行の集合だけです。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    pc_to_line: BTreeMap<ProgramCounter, LineNumber>,
    breakpoint_lines: BTreeSet<LineNumber>,
}

impl SourceMap {
    /// ソースマップを作成する
    ///
    /// どのpcにも対応しないブレークポイント行も受け付けます（発火しないだけ）。
    pub fn new(
        pc_to_line: impl IntoIterator<Item = (ProgramCounter, LineNumber)>,
        breakpoint_lines: impl IntoIterator<Item = LineNumber>,
    ) -> Self {
        Self {
            pc_to_line: pc_to_line.into_iter().collect(),
            breakpoint_lines: breakpoint_lines.into_iter().collect(),
        }
    }

    /// pcに対応するソース行を取得する
    pub fn line_for(&self, pc: ProgramCounter) -> Option<LineNumber> {
        self.pc_to_line.get(&pc).copied()
    }

    /// pcがブレークポイント行に対応するかを判定する
    ///
    /// 対応する行がなければ `(false, None)` を返します。
    pub fn is_breakpoint(&self, pc: ProgramCounter) -> (bool, Option<LineNumber>) {
        match self.line_for(pc) {
            Some(line) => (self.breakpoint_lines.contains(&line), Some(line)),
            None => (false, None),
        }
    }

    /// ブレークポイント行を追加する（新規追加ならtrue）
    pub fn add_breakpoint(&mut self, line: LineNumber) -> bool {
        self.breakpoint_lines.insert(line)
    }

    /// ブレークポイント行を削除する（存在していたらtrue）
    pub fn remove_breakpoint(&mut self, line: LineNumber) -> bool {
        self.breakpoint_lines.remove(&line)
    }

    /// ブレークポイント行を昇順に取得する
    pub fn breakpoints(&self) -> impl Iterator<Item = LineNumber> + '_ {
        self.breakpoint_lines.iter().copied()
    }

    /// 行に対応するpcを昇順に取得する
    pub fn pcs_for_line(&self, line: LineNumber) -> Vec<ProgramCounter> {
        self.pc_to_line
            .iter()
            .filter(|(_, l)| **l == line)
            .map(|(pc, _)| *pc)
            .collect()
    }

    /// 対応付けられたpcの数
    pub fn len(&self) -> usize {
        self.pc_to_line.len()
    }

    /// 対応付けが空かどうか
    pub fn is_empty(&self) -> bool {
        self.pc_to_line.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SourceMap {
        SourceMap::new([(0, 10), (1, 10), (2, 11), (3, 12)], [11])
    }

    #[test]
    fn test_unmapped_pc() {
        let map = sample();
        assert_eq!(map.line_for(99), None);
        assert_eq!(map.is_breakpoint(99), (false, None));
    }

    #[test]
    fn test_mapped_pc() {
        let map = sample();
        assert_eq!(map.is_breakpoint(0), (false, Some(10)));
        assert_eq!(map.is_breakpoint(2), (true, Some(11)));
    }

    #[test]
    fn test_unreachable_breakpoint_is_legal() {
        let mut map = sample();
        assert!(map.add_breakpoint(500));
        assert!(map.pcs_for_line(500).is_empty());
        for pc in 0..4 {
            assert_ne!(map.is_breakpoint(pc), (true, Some(500)));
        }
    }

    #[test]
    fn test_add_remove_breakpoint() {
        let mut map = sample();
        assert!(map.add_breakpoint(10));
        assert!(!map.add_breakpoint(10));
        assert_eq!(map.is_breakpoint(1), (true, Some(10)));
        assert!(map.remove_breakpoint(10));
        assert!(!map.remove_breakpoint(10));
        assert_eq!(map.breakpoints().collect::<Vec<_>>(), vec![11]);
    }

    #[test]
    fn test_pcs_for_line() {
        assert_eq!(sample().pcs_for_line(10), vec![0, 1]);
    }
}
