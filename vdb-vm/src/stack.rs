//! オペランドスタック

use crate::{Result, VmError};

/// スタックの1要素
pub type Word = u64;

/// スタックの最大要素数
pub const STACK_LIMIT: usize = 1024;

/// オペランドスタック
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    values: Vec<Word>,
}

impl Stack {
    /// 空のスタックを作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を積む
    pub fn push(&mut self, value: Word) -> Result<()> {
        if self.values.len() >= STACK_LIMIT {
            return Err(VmError::StackOverflow { limit: STACK_LIMIT });
        }
        self.values.push(value);
        Ok(())
    }

    /// 値を取り出す
    pub fn pop(&mut self) -> Result<Word> {
        self.values.pop().ok_or(VmError::StackUnderflow {
            needed: 1,
            available: 0,
        })
    }

    /// 複数の値を取り出す（先頭が最初の要素）
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Word>> {
        self.require(n)?;
        let split = self.values.len() - n;
        let mut popped = self.values.split_off(split);
        popped.reverse();
        Ok(popped)
    }

    /// 先頭からdepth番目（1始まり）の値を複製して積む
    pub fn dup(&mut self, depth: usize) -> Result<()> {
        self.require(depth)?;
        let value = self.values[self.values.len() - depth];
        self.push(value)
    }

    /// 先頭とdepth+1番目の値を入れ替える
    pub fn swap(&mut self, depth: usize) -> Result<()> {
        self.require(depth + 1)?;
        let top = self.values.len() - 1;
        self.values.swap(top, top - depth);
        Ok(())
    }

    /// 要素数を取得する
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 底から順に並んだ値を取得する
    pub fn values(&self) -> &[Word] {
        &self.values
    }

    fn require(&self, needed: usize) -> Result<()> {
        if self.values.len() < needed {
            return Err(VmError::StackUnderflow {
                needed,
                available: self.values.len(),
            });
        }
        Ok(())
    }
}
