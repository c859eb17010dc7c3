//! パース関連のユーティリティ関数

use anyhow::Result;

/// 数値文字列をu64にパース
///
/// 16進数（0xプレフィックス付き）または10進数をサポート
///
/// # Examples
/// ```
/// use vdb_core::parse::parse_number;
///
/// assert_eq!(parse_number("0x1f").unwrap(), 0x1f);
/// assert_eq!(parse_number("31").unwrap(), 31);
/// ```
pub fn parse_number(s: &str) -> Result<u64> {
    let s = s.trim();

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| anyhow::anyhow!("Invalid hexadecimal number '{}': {}", s, e))
    } else {
        s.parse::<u64>()
            .map_err(|e| anyhow::anyhow!("Invalid number '{}': {}", s, e))
    }
}

/// 16進文字列をバイト列にパース
///
/// 0xプレフィックスと空白は無視します。
///
/// # Examples
/// ```
/// use vdb_core::parse::parse_hex_bytes;
///
/// assert_eq!(parse_hex_bytes("0x6001").unwrap(), vec![0x60, 0x01]);
/// ```
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let digits: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();

    if digits.len() % 2 != 0 {
        return Err(anyhow::anyhow!(
            "Hex string has an odd number of digits ({})",
            digits.len()
        ));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let byte: String = pair.iter().collect();
            u8::from_str_radix(&byte, 16)
                .map_err(|e| anyhow::anyhow!("Invalid hex byte '{}': {}", byte, e))
        })
        .collect()
}
