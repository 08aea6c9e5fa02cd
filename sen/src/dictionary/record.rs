//! ビッグエンディアンのレコード読み書き
//!
//! 辞書ファイルはすべてビッグエンディアンで記録されています。
//! [`RecordReader`]は境界外の読み出しでパニックせず既定値を返し、
//! その事実を[`RecordReader::overrun`]で報告します。辞書の読み込み時に
//! すべてのレコードをこのリーダーで一度検証しておくことで、
//! 以降の参照を失敗しない処理として扱えます。

use std::io::{self, Write};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

/// バイト列を先頭から順に読み出すリーダー
pub(crate) struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
    overrun: bool,
}

impl<'a> RecordReader<'a> {
    #[inline(always)]
    pub const fn new(buf: &'a [u8], pos: usize) -> Self {
        Self {
            buf,
            pos,
            overrun: false,
        }
    }

    /// 現在の読み出し位置を返します。
    #[inline(always)]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// これまでに境界外の読み出しがあったかどうかを返します。
    #[inline(always)]
    pub const fn overrun(&self) -> bool {
        self.overrun
    }

    #[inline(always)]
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let buf = self.buf;
        let end = self.pos.saturating_add(n);
        match buf.get(self.pos..end) {
            Some(bytes) => {
                self.pos = end;
                Some(bytes)
            }
            None => {
                self.overrun = true;
                self.pos = self.buf.len();
                None
            }
        }
    }

    #[inline(always)]
    pub fn u8(&mut self) -> u8 {
        self.take(1).map_or(0, |b| b[0])
    }

    #[inline(always)]
    pub fn u16(&mut self) -> u16 {
        self.take(2).map_or(0, BigEndian::read_u16)
    }

    #[inline(always)]
    pub fn i16(&mut self) -> i16 {
        self.take(2).map_or(0, BigEndian::read_i16)
    }

    #[inline(always)]
    pub fn u32(&mut self) -> u32 {
        self.take(4).map_or(0, BigEndian::read_u32)
    }

    /// 長さ(u16)付きのUTF-8文字列を読み出します。
    ///
    /// 不正なUTF-8は置換文字に変換されます。
    pub fn str(&mut self) -> String {
        let len = usize::from(self.u16());
        self.take(len)
            .map_or_else(String::new, |bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// 長さ(u16)付きのUTF-8文字列を厳密に検証しながら読み飛ばします。
    ///
    /// 文字列が範囲内にあり、かつ正しいUTF-8であれば`true`を返します。
    pub fn skip_str_checked(&mut self) -> bool {
        let len = usize::from(self.u16());
        self.take(len)
            .is_some_and(|bytes| std::str::from_utf8(bytes).is_ok())
    }
}

#[inline(always)]
pub(crate) fn read_u32_at(buf: &[u8], pos: usize) -> Option<u32> {
    buf.get(pos..pos.checked_add(4)?).map(BigEndian::read_u32)
}

#[inline(always)]
pub(crate) fn read_i32_at(buf: &[u8], pos: usize) -> Option<i32> {
    buf.get(pos..pos.checked_add(4)?).map(BigEndian::read_i32)
}

#[inline(always)]
pub(crate) fn read_i16_at(buf: &[u8], pos: usize) -> Option<i16> {
    buf.get(pos..pos.checked_add(2)?).map(BigEndian::read_i16)
}

/// 長さ(u16)付きのUTF-8文字列を書き出します。
///
/// # エラー
///
/// 文字列が65535バイトを超える場合、または書き出しに失敗した場合、
/// [`io::Error`]が返されます。
pub(crate) fn put_str<W: Write>(mut w: W, s: &str) -> io::Result<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
    w.write_u16::<BigEndian>(len)?;
    w.write_all(s.as_bytes())
}
