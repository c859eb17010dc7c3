//! ソーステキスト

use crate::source_map::LineNumber;

/// 表示用のソーステキスト（読み取り専用）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceText {
    lines: Vec<String>,
}

impl SourceText {
    /// ソーステキストを作成する
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_owned).collect(),
        }
    }

    /// 行を取得する（1始まり）
    pub fn line(&self, line: LineNumber) -> Option<&str> {
        let index = (line as usize).checked_sub(1)?;
        self.lines.get(index).map(String::as_str)
    }

    /// 行の前後 `radius` 行を行番号付きで取得する
    pub fn context(&self, line: LineNumber, radius: u32) -> Vec<(LineNumber, &str)> {
        let first = line.saturating_sub(radius).max(1);
        let last = line.saturating_add(radius);
        (first..=last)
            .map_while(|n| self.line(n).map(|text| (n, text)))
            .collect()
    }

    /// 行数を取得する
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lookup() {
        let source = SourceText::new("a = 1\nb = 2\nreturn a + b\n");
        assert_eq!(source.line(1), Some("a = 1"));
        assert_eq!(source.line(3), Some("return a + b"));
        assert_eq!(source.line(0), None);
        assert_eq!(source.line(4), None);
    }

    #[test]
    fn test_context_clamps_to_file() {
        let source = SourceText::new("one\ntwo\nthree");
        assert_eq!(source.context(1, 1), vec![(1, "one"), (2, "two")]);
        assert_eq!(source.context(3, 5), vec![(1, "one"), (2, "two"), (3, "three")]);
        assert!(source.context(10, 1).is_empty());
    }
}
