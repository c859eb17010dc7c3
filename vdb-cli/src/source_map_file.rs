//! コンパイラが出力する行番号マップ（JSON）の読み込み
//!
//! 形式: `{"pc_pos_map": {"<pc>": [line, col, end_line, end_col]}, "breakpoints": [line, ...]}`
//! トップレベルが `{"line_number_map": {...}}` で包まれていてもよい。

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;
use vdb_core::parse::parse_number;
use vdb_core::{LineNumber, ProgramCounter, SourceMap};

/// `pc_pos_map` のキーは10進文字列のpc
#[derive(Debug, Deserialize)]
struct LineNumberMap {
    pc_pos_map: BTreeMap<String, Vec<LineNumber>>,
    #[serde(default)]
    breakpoints: BTreeSet<LineNumber>,
}

/// JSON文字列からソースマップを作成する
pub fn parse(json: &str) -> Result<SourceMap> {
    let mut value: Value = serde_json::from_str(json).context("Failed to parse line number map")?;
    if let Some(inner) = value.get_mut("line_number_map") {
        value = inner.take();
    }
    let map: LineNumberMap =
        serde_json::from_value(value).context("Failed to parse line number map")?;

    let mut pc_to_line = Vec::with_capacity(map.pc_pos_map.len());
    for (key, position) in map.pc_pos_map {
        let pc = parse_number(&key)
            .ok()
            .and_then(|pc| ProgramCounter::try_from(pc).ok())
            .ok_or_else(|| anyhow::anyhow!("Invalid pc '{}' in pc_pos_map", key))?;
        let line = position
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Empty source position for pc {}", pc))?;
        pc_to_line.push((pc, line));
    }

    Ok(SourceMap::new(pc_to_line, map.breakpoints))
}

/// ファイルからソースマップを読み込む
pub fn load(path: &Path) -> Result<SourceMap> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let map = parse(&json).with_context(|| format!("Invalid source map {}", path.display()))?;
    debug!(path = %path.display(), pcs = map.len(), "Loaded line number map");
    Ok(map)
}
