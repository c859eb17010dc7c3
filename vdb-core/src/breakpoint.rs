//! ブレークポイント判定

use crate::source_map::{LineNumber, ProgramCounter, SourceMap};
use std::collections::HashMap;

/// 1命令ごとに計算されるブレークポイント判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointHit {
    pub pc: ProgramCounter,
    pub line: Option<LineNumber>,
    pub is_breakpoint: bool,
}

/// 実行を一時停止すべきかを判定する
///
/// 判定方針（条件付きブレークポイントなど）を実行ループから切り離すための境界です。
pub trait BreakpointOracle {
    /// pcで一時停止すべきかを判定する
    fn is_breakpoint(&self, pc: ProgramCounter) -> BreakpointHit;

    /// 判定に使うソースマップを取得する
    fn source_map(&self) -> &SourceMap;

    /// ブレークポイント編集用にソースマップを取得する
    fn source_map_mut(&mut self) -> &mut SourceMap;

    /// 実際に一時停止したことを記録する
    fn record_hit(&mut self, _line: LineNumber) {}
}

/// ブレークポイント行の集合に含まれるかで判定する
#[derive(Debug, Clone, Default)]
pub struct LineBreakpoints {
    source_map: SourceMap,
    hits: HashMap<LineNumber, usize>,
}

impl LineBreakpoints {
    /// 判定器を作成する
    pub fn new(source_map: SourceMap) -> Self {
        Self {
            source_map,
            hits: HashMap::new(),
        }
    }

    /// 行で一時停止した回数を取得する
    pub fn hits(&self, line: LineNumber) -> usize {
        self.hits.get(&line).copied().unwrap_or(0)
    }

    /// ソースマップを取り出す
    pub fn into_source_map(self) -> SourceMap {
        self.source_map
    }
}

impl BreakpointOracle for LineBreakpoints {
    fn is_breakpoint(&self, pc: ProgramCounter) -> BreakpointHit {
        let (is_breakpoint, line) = self.source_map.is_breakpoint(pc);
        BreakpointHit {
            pc,
            line,
            is_breakpoint,
        }
    }

    fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    fn source_map_mut(&mut self) -> &mut SourceMap {
        &mut self.source_map
    }

    fn record_hit(&mut self, line: LineNumber) {
        *self.hits.entry(line).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_policy() {
        let oracle = LineBreakpoints::new(SourceMap::new([(4, 11)], [11]));
        assert_eq!(
            oracle.is_breakpoint(4),
            BreakpointHit {
                pc: 4,
                line: Some(11),
                is_breakpoint: true
            }
        );
        assert!(!oracle.is_breakpoint(5).is_breakpoint);
        assert_eq!(oracle.is_breakpoint(5).line, None);
    }

    #[test]
    fn test_hit_counts() {
        let mut oracle = LineBreakpoints::new(SourceMap::default());
        oracle.record_hit(3);
        oracle.record_hit(3);
        assert_eq!(oracle.hits(3), 2);
        assert_eq!(oracle.hits(4), 0);
    }
}
