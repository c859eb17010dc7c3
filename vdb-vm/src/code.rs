//! 命令ストリーム

use crate::opcode::STOP;

/// 命令ストリームとプログラムカウンタ
///
/// `next_opcode` はオペコード1バイトだけを読み進めます。
/// PUSH系の即値はハンドラが `read` で読み取ります。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeStream {
    bytes: Vec<u8>,
    pc: usize,
}

impl CodeStream {
    /// 命令ストリームを作成する
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            pc: 0,
        }
    }

    /// 現在のプログラムカウンタを取得する
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// プログラムカウンタを設定する
    ///
    /// 範囲外の値も許容します（次のフェッチがSTOPになる）。
    pub fn seek(&mut self, pc: usize) {
        self.pc = pc;
    }

    /// コード長を取得する
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// コードが空かどうか
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// コードのバイト列を取得する
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 次のオペコードを読み取り、カーソルを1つ進める
    ///
    /// 終端を越えた場合はカーソルを動かさずにSTOPを返します。
    pub fn next_opcode(&mut self) -> u8 {
        match self.bytes.get(self.pc) {
            Some(&opcode) => {
                self.pc += 1;
                opcode
            }
            None => STOP,
        }
    }

    /// 即値を読み取る
    ///
    /// 終端を越えた部分は0で埋めます。
    pub fn read(&mut self, size: usize) -> Vec<u8> {
        let start = self.pc.min(self.bytes.len());
        let end = self.pc.saturating_add(size).min(self.bytes.len());
        let mut data = self.bytes[start..end].to_vec();
        data.resize(size, 0);
        self.pc = self.pc.saturating_add(size);
        data
    }

    /// 指定位置がJUMPDESTかどうか
    ///
    /// PUSHの即値の中にある0x5bはJUMPDESTとして扱いません。
    pub fn is_valid_jump_destination(&self, position: usize) -> bool {
        use crate::opcode::{immediate_size, JUMPDEST};

        let mut i = 0;
        while i < self.bytes.len() {
            let opcode = self.bytes[i];
            if i == position {
                return opcode == JUMPDEST;
            }
            i += 1 + immediate_size(opcode);
        }
        false
    }
}
