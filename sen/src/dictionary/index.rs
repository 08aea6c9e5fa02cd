//! 文字列索引表
//!
//! `posIndex.sen`には品詞、活用型、活用形の3つの表が連続して格納されます。
//! 各表は要素数(u16)と、その個数の長さ付きUTF-8文字列からなります。

use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};
use hashbrown::HashMap;

use crate::dictionary::record::{put_str, RecordReader};
use crate::errors::{Result, SenError};

/// 属性IDを文字列に変換する表
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StringTable {
    entries: Vec<String>,
    ids: HashMap<String, u16>,
}

impl StringTable {
    /// 文字列の列から表を作成します。
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for e in entries {
            table.push(e.into());
        }
        table
    }

    fn push(&mut self, s: String) {
        if let Ok(idx) = u16::try_from(self.entries.len()) {
            self.ids.entry(s.clone()).or_insert(idx);
        }
        self.entries.push(s);
    }

    /// 要素数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 表が空かどうかを返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// IDに対応する文字列を返します。
    #[inline(always)]
    pub fn get(&self, idx: u16) -> Option<&str> {
        self.entries.get(usize::from(idx)).map(String::as_str)
    }

    /// 要素のイテレータを返します。
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// 文字列のIDを返します。
    pub(crate) fn position(&self, s: &str) -> Option<u16> {
        self.ids.get(s).copied()
    }

    /// 文字列を追加し、そのIDを返します。既に存在する場合は既存のIDを返します。
    pub(crate) fn intern(&mut self, s: &str) -> Result<u16> {
        if let Some(i) = self.position(s) {
            return Ok(i);
        }
        // 0xFFFF is reserved for "none".
        let idx = u16::try_from(self.entries.len())
            .ok()
            .filter(|&i| i != u16::MAX)
            .ok_or_else(|| SenError::invalid_argument("index", "too many distinct strings."))?;
        self.push(s.to_string());
        Ok(idx)
    }

    fn read(rdr: &mut RecordReader) -> Self {
        let n = rdr.u16();
        let mut table = Self::default();
        table.entries.reserve(usize::from(n));
        for _ in 0..n {
            if rdr.overrun() {
                break;
            }
            table.push(rdr.str());
        }
        table
    }

    fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        let len = u16::try_from(self.entries.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many entries"))?;
        w.write_u16::<BigEndian>(len)?;
        for e in &self.entries {
            put_str(&mut w, e)?;
        }
        Ok(())
    }
}

/// `posIndex.sen`の3つの表
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct IndexTables {
    pub pos: StringTable,
    pub conj_type: StringTable,
    pub conj_form: StringTable,
}

impl IndexTables {
    /// `posIndex.sen`の内容を解析します。
    ///
    /// # エラー
    ///
    /// 表が途中で途切れている場合、[`SenError`]が返されます。
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut rdr = RecordReader::new(data, 0);
        let pos = StringTable::read(&mut rdr);
        let conj_type = StringTable::read(&mut rdr);
        let conj_form = StringTable::read(&mut rdr);
        if rdr.overrun() {
            return Err(SenError::resource(
                "posIndex.sen",
                "the index tables are truncated.",
            ));
        }
        if rdr.position() != data.len() {
            log::warn!(
                "posIndex.sen has {} trailing bytes; ignored",
                data.len() - rdr.position()
            );
        }
        Ok(Self {
            pos,
            conj_type,
            conj_form,
        })
    }

    /// 3つの表を`posIndex.sen`の形式で書き出します。
    pub fn encode<W: Write>(&self, mut w: W) -> io::Result<()> {
        self.pos.write(&mut w)?;
        self.conj_type.write(&mut w)?;
        self.conj_form.write(&mut w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let tables = IndexTables {
            pos: StringTable::new(["名詞", "動詞"]),
            conj_type: StringTable::new(["五段・カ行イ音便"]),
            conj_form: StringTable::default(),
        };
        let mut data = vec![];
        tables.encode(&mut data).unwrap();
        let parsed = IndexTables::parse(&data).unwrap();
        assert_eq!(parsed.pos.get(1), Some("動詞"));
        assert_eq!(parsed.conj_type.get(0), Some("五段・カ行イ音便"));
        assert_eq!(parsed.conj_form.len(), 0);
        assert_eq!(parsed.pos.get(2), None);
    }

    #[test]
    fn test_truncated() {
        let mut data = vec![];
        IndexTables {
            pos: StringTable::new(["名詞"]),
            ..Default::default()
        }
        .encode(&mut data)
        .unwrap();
        data.truncate(data.len() - 3);
        assert!(IndexTables::parse(&data).is_err());
    }

    #[test]
    fn test_intern() {
        let mut table = StringTable::default();
        assert_eq!(table.intern("名詞").unwrap(), 0);
        assert_eq!(table.intern("動詞").unwrap(), 1);
        assert_eq!(table.intern("名詞").unwrap(), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_intern_after_parse() {
        let mut data = vec![];
        IndexTables {
            pos: StringTable::new(["名詞", "動詞", "名詞"]),
            ..Default::default()
        }
        .encode(&mut data)
        .unwrap();
        let mut parsed = IndexTables::parse(&data).unwrap();
        assert_eq!(parsed.pos.intern("動詞").unwrap(), 1);
        assert_eq!(parsed.pos.intern("名詞").unwrap(), 0);
        assert_eq!(parsed.pos.intern("助詞").unwrap(), 3);
    }
}
