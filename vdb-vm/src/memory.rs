//! VMメモリ

use crate::{Result, VmError};

/// メモリの最大サイズ（バイト）
pub const MEMORY_LIMIT: usize = 1 << 24;

/// メモリから読み取り可能な型
pub trait MemoryReadable: Sized {
    /// ビッグエンディアンバイト配列から値を構築
    fn from_be_bytes(bytes: &[u8]) -> Self;

    /// ビッグエンディアンバイト配列に変換
    fn to_be_bytes(&self) -> Vec<u8>;

    /// 型のサイズ（バイト数）
    fn size() -> usize;
}

macro_rules! impl_memory_readable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl MemoryReadable for $ty {
                fn from_be_bytes(bytes: &[u8]) -> Self {
                    let mut array = [0u8; std::mem::size_of::<$ty>()];
                    array.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                    <$ty>::from_be_bytes(array)
                }

                fn to_be_bytes(&self) -> Vec<u8> {
                    (*self).to_be_bytes().to_vec()
                }

                fn size() -> usize {
                    std::mem::size_of::<$ty>()
                }
            }
        )+
    };
}

impl_memory_readable!(u64);

/// バイト単位でアドレス指定するメモリ
///
/// アクセスした範囲まで0で自動拡張します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// 空のメモリを作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在のサイズを取得する
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// メモリ全体を取得する
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 指定範囲までメモリを拡張する
    pub fn extend(&mut self, offset: usize, size: usize) -> Result<()> {
        if size == 0 {
            return Ok(());
        }
        let end = offset
            .checked_add(size)
            .filter(|end| *end <= MEMORY_LIMIT)
            .ok_or(VmError::MemoryLimit {
                offset: offset as u64,
                size: size as u64,
            })?;
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }
        Ok(())
    }

    /// メモリからデータを読み取る（必要なら拡張する）
    ///
    /// サイズ0の読み取りはオフセットによらず空を返し、拡張もしません。
    pub fn read(&mut self, offset: usize, size: usize) -> Result<Vec<u8>> {
        if size == 0 {
            return Ok(Vec::new());
        }
        self.extend(offset, size)?;
        Ok(self.bytes[offset..offset + size].to_vec())
    }

    /// メモリを拡張せずに覗き見る
    ///
    /// 未使用領域は0として返します。デバッガからの参照用です。
    pub fn peek(&self, offset: usize, size: usize) -> Vec<u8> {
        (0..size)
            .map(|i| {
                offset
                    .checked_add(i)
                    .and_then(|addr| self.bytes.get(addr))
                    .copied()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// メモリにデータを書き込む
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.extend(offset, data.len())?;
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// 型付き値を読み取る（ジェネリック版）
    pub fn read_typed<T: MemoryReadable>(&mut self, offset: usize) -> Result<T> {
        let bytes = self.read(offset, T::size())?;
        Ok(T::from_be_bytes(&bytes))
    }

    /// 型付き値を書き込む（ジェネリック版）
    pub fn write_typed<T: MemoryReadable>(&mut self, offset: usize, value: &T) -> Result<()> {
        self.write(offset, &value.to_be_bytes())
    }

    /// u64値を読み取る（ビッグエンディアン）
    pub fn read_u64(&mut self, offset: usize) -> Result<u64> {
        self.read_typed(offset)
    }

    /// u64値を書き込む（ビッグエンディアン）
    pub fn write_u64(&mut self, offset: usize, value: u64) -> Result<()> {
        self.write_typed(offset, &value)
    }
}
