//! プリコンパイル（アドレスで呼び出されるネイティブ処理）

use crate::{Address, Computation, Result};
use std::collections::HashMap;

/// プリコンパイルの関数
pub type PrecompileFn = fn(&mut Computation) -> Result<()>;

/// アドレスからプリコンパイルへの対応表
#[derive(Clone, Default)]
pub struct Precompiles {
    table: HashMap<Address, PrecompileFn>,
}

impl Precompiles {
    /// 空の対応表を作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// 標準のプリコンパイルを登録した対応表を作成する
    pub fn standard() -> Self {
        let mut precompiles = Self::new();
        precompiles.register(Address::from_low_u64(IDENTITY_ADDRESS), identity);
        precompiles
    }

    /// プリコンパイルを登録する
    pub fn register(&mut self, address: Address, precompile: PrecompileFn) {
        self.table.insert(address, precompile);
    }

    /// アドレスに対応するプリコンパイルを取得する
    pub fn get(&self, address: &Address) -> Option<PrecompileFn> {
        self.table.get(address).copied()
    }

    /// 登録されているアドレスかどうか
    pub fn contains(&self, address: &Address) -> bool {
        self.table.contains_key(address)
    }

    /// 登録数を取得する
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for Precompiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

/// identityプリコンパイルのアドレス
pub const IDENTITY_ADDRESS: u64 = 0x04;

/// 呼び出しデータをそのまま返却データにコピーする
pub fn identity(computation: &mut Computation) -> Result<()> {
    let data = computation.call_data().to_vec();
    computation.set_return_data(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let mut computation = Computation::new(Vec::new()).with_call_data(vec![1, 2, 3]);
        identity(&mut computation).unwrap();
        assert_eq!(computation.return_data(), &[1, 2, 3]);
    }

    #[test]
    fn test_standard_table() {
        let precompiles = Precompiles::standard();
        assert!(precompiles.contains(&Address::from_low_u64(IDENTITY_ADDRESS)));
        assert!(!precompiles.contains(&Address::from_low_u64(0x05)));
    }
}
