//! 形態素の属性とパラメータ
//!
//! `token.sen`は12バイト固定長のレコードの列で、レコード番号が形態素IDです。
//!
//! | オフセット | 型  | 内容                         |
//! |-----------|-----|------------------------------|
//! | 0         | u16 | 左文脈ID                     |
//! | 2         | u16 | 右文脈ID                     |
//! | 4         | u16 | 第2右文脈ID（0は無し）       |
//! | 6         | i16 | 生起コスト                   |
//! | 8         | u32 | `partOfSpeech.sen`内の位置   |
//!
//! `partOfSpeech.sen`の属性レコードは可変長です。

use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::dictionary::index::{IndexTables, StringTable};
use crate::dictionary::record::{put_str, RecordReader};
use crate::errors::{Result, SenError};

/// `token.sen`の1レコードのバイト数
pub(crate) const TOKEN_RECORD_LEN: usize = 12;

/// 活用型・活用形が無いことを表すID
pub(crate) const NONE_IDX: u16 = u16::MAX;

/// 単語のパラメータ（文脈IDとコスト）
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct WordParam {
    pub left_id: u16,
    pub right_id: u16,
    /// 読み制約付きの後続を先読みするための第2右文脈ID。0は無し。
    pub right_id2: u16,
    pub word_cost: i16,
}

impl WordParam {
    /// 新しい単語パラメータを作成します。
    #[inline(always)]
    pub const fn new(left_id: u16, right_id: u16, word_cost: i16) -> Self {
        Self {
            left_id,
            right_id,
            right_id2: 0,
            word_cost,
        }
    }

    /// 第2右文脈IDを設定します。
    #[inline(always)]
    pub const fn with_right_id2(mut self, right_id2: u16) -> Self {
        self.right_id2 = right_id2;
        self
    }
}

/// 形態素の属性
///
/// 辞書から復号された値であり、復号後は変更されません。
/// 未知語や読み制約のために合成される場合もあります。
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Morpheme {
    pos: String,
    conjugational_type: Option<String>,
    conjugational_form: Option<String>,
    base_form: String,
    readings: Vec<String>,
    pronunciations: Vec<String>,
    additional_info: Option<String>,
    left_id: u16,
    right_id: u16,
    cost: i16,
}

impl Morpheme {
    /// 品詞を指定して新しい形態素を作成します。
    ///
    /// 基本形は`*`、読みと発音は空になります。
    pub fn new<S>(pos: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            pos: pos.into(),
            base_form: "*".to_string(),
            ..Default::default()
        }
    }

    /// 活用型と活用形を設定します。
    pub fn with_conjugation<S, T>(mut self, conjugational_type: S, conjugational_form: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        self.conjugational_type = Some(conjugational_type.into());
        self.conjugational_form = Some(conjugational_form.into());
        self
    }

    /// 基本形を設定します。
    pub fn with_base_form<S>(mut self, base_form: S) -> Self
    where
        S: Into<String>,
    {
        self.base_form = base_form.into();
        self
    }

    /// 読みを設定します。
    pub fn with_readings<I, S>(mut self, readings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.readings = readings.into_iter().map(Into::into).collect();
        self
    }

    /// 発音を設定します。
    pub fn with_pronunciations<I, S>(mut self, pronunciations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pronunciations = pronunciations.into_iter().map(Into::into).collect();
        self
    }

    /// 付加情報を設定します。
    pub fn with_additional_info<S>(mut self, additional_info: S) -> Self
    where
        S: Into<String>,
    {
        self.additional_info = Some(additional_info.into());
        self
    }

    /// 品詞
    #[inline(always)]
    pub fn pos(&self) -> &str {
        &self.pos
    }

    /// 活用型
    #[inline(always)]
    pub fn conjugational_type(&self) -> Option<&str> {
        self.conjugational_type.as_deref()
    }

    /// 活用形
    #[inline(always)]
    pub fn conjugational_form(&self) -> Option<&str> {
        self.conjugational_form.as_deref()
    }

    /// 基本形
    #[inline(always)]
    pub fn base_form(&self) -> &str {
        &self.base_form
    }

    /// 読みの列
    #[inline(always)]
    pub fn readings(&self) -> &[String] {
        &self.readings
    }

    /// 発音の列
    #[inline(always)]
    pub fn pronunciations(&self) -> &[String] {
        &self.pronunciations
    }

    /// 付加情報
    #[inline(always)]
    pub fn additional_info(&self) -> Option<&str> {
        self.additional_info.as_deref()
    }

    /// 左文脈ID
    #[inline(always)]
    pub const fn left_id(&self) -> u16 {
        self.left_id
    }

    /// 右文脈ID
    #[inline(always)]
    pub const fn right_id(&self) -> u16 {
        self.right_id
    }

    /// 生起コスト
    #[inline(always)]
    pub const fn cost(&self) -> i16 {
        self.cost
    }

    /// 文脈IDとコストを設定します。
    #[inline(always)]
    pub(crate) fn set_param(&mut self, param: WordParam) {
        self.left_id = param.left_id;
        self.right_id = param.right_id;
        self.cost = param.word_cost;
    }

    /// 素性文字列を返します。
    ///
    /// `品詞,活用型,活用形,基本形,読み,発音`の形式で、
    /// 値が無い項目は`*`になります。
    pub fn feature(&self) -> String {
        let cells = [
            self.pos(),
            self.conjugational_type().unwrap_or("*"),
            self.conjugational_form().unwrap_or("*"),
            self.base_form(),
            self.readings.first().map_or("*", String::as_str),
            self.pronunciations.first().map_or("*", String::as_str),
        ];
        let mut out = Vec::new();
        for (i, cell) in cells.iter().enumerate() {
            if i != 0 {
                out.push(b',');
            }
            crate::utils::quote_csv_cell(&mut out, cell.as_bytes());
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// `token.sen`のレコードを読み出します。
///
/// # 戻り値
///
/// 単語パラメータと属性レコードの位置の組
#[inline(always)]
pub(crate) fn read_token_record(tokens: &[u8], id: u32) -> (WordParam, u32) {
    let mut rdr = RecordReader::new(tokens, id as usize * TOKEN_RECORD_LEN);
    let left_id = rdr.u16();
    let right_id = rdr.u16();
    let right_id2 = rdr.u16();
    let word_cost = rdr.i16();
    let offset = rdr.u32();
    (
        WordParam {
            left_id,
            right_id,
            right_id2,
            word_cost,
        },
        offset,
    )
}

/// `token.sen`のレコードを書き出します。
pub(crate) fn write_token_record<W: Write>(
    mut w: W,
    param: WordParam,
    offset: u32,
) -> io::Result<()> {
    w.write_u16::<BigEndian>(param.left_id)?;
    w.write_u16::<BigEndian>(param.right_id)?;
    w.write_u16::<BigEndian>(param.right_id2)?;
    w.write_i16::<BigEndian>(param.word_cost)?;
    w.write_u32::<BigEndian>(offset)
}

/// 属性レコードの生の内容
struct AttributeRecord {
    pos: u16,
    conj_type: u16,
    conj_form: u16,
    base_form: String,
    readings: Vec<String>,
    pronunciations: Vec<String>,
    additional_info: String,
}

impl AttributeRecord {
    fn read(rdr: &mut RecordReader) -> Self {
        let pos = rdr.u16();
        let conj_type = rdr.u16();
        let conj_form = rdr.u16();
        let base_form = rdr.str();
        let n = rdr.u8();
        let readings = (0..n).map(|_| rdr.str()).collect();
        let n = rdr.u8();
        let pronunciations = (0..n).map(|_| rdr.str()).collect();
        let additional_info = rdr.str();
        Self {
            pos,
            conj_type,
            conj_form,
            base_form,
            readings,
            pronunciations,
            additional_info,
        }
    }
}

/// 属性レコードを復号して形態素を作成します。
///
/// 辞書の読み込み時に検証済みであることを前提とし、失敗しません。
pub(crate) fn decode_morpheme(
    attrs: &[u8],
    offset: u32,
    param: WordParam,
    tables: &IndexTables,
) -> Morpheme {
    let mut rdr = RecordReader::new(attrs, offset as usize);
    let rec = AttributeRecord::read(&mut rdr);
    let lookup = |table: &StringTable, idx: u16| {
        (idx != NONE_IDX)
            .then(|| table.get(idx).map(str::to_string))
            .flatten()
    };
    Morpheme {
        pos: tables.pos.get(rec.pos).unwrap_or_default().to_string(),
        conjugational_type: lookup(&tables.conj_type, rec.conj_type),
        conjugational_form: lookup(&tables.conj_form, rec.conj_form),
        base_form: rec.base_form,
        readings: rec.readings,
        pronunciations: rec.pronunciations,
        additional_info: (!rec.additional_info.is_empty()).then_some(rec.additional_info),
        left_id: param.left_id,
        right_id: param.right_id,
        cost: param.word_cost,
    }
}

/// 属性レコードが範囲内に収まり、索引IDが有効であることを検証します。
pub(crate) fn validate_attribute_record(
    attrs: &[u8],
    offset: u32,
    tables: &IndexTables,
) -> Result<()> {
    let mut rdr = RecordReader::new(attrs, offset as usize);
    let mut valid_utf8 = true;
    let pos = rdr.u16();
    let conj_type = rdr.u16();
    let conj_form = rdr.u16();
    valid_utf8 &= rdr.skip_str_checked();
    for _ in 0..2 {
        let n = rdr.u8();
        for _ in 0..n {
            valid_utf8 &= rdr.skip_str_checked();
        }
    }
    valid_utf8 &= rdr.skip_str_checked();

    if rdr.overrun() {
        return Err(SenError::resource(
            "partOfSpeech.sen",
            format!("the record at {offset} exceeds the buffer."),
        ));
    }
    if !valid_utf8 {
        return Err(SenError::resource(
            "partOfSpeech.sen",
            format!("the record at {offset} contains invalid UTF-8."),
        ));
    }
    if tables.pos.get(pos).is_none() {
        return Err(SenError::resource(
            "partOfSpeech.sen",
            format!("the record at {offset} has an undefined POS id {pos}."),
        ));
    }
    let conj_ok = |table: &StringTable, idx: u16| {
        idx == NONE_IDX || table.get(idx).is_some()
    };
    if !conj_ok(&tables.conj_type, conj_type) || !conj_ok(&tables.conj_form, conj_form) {
        return Err(SenError::resource(
            "partOfSpeech.sen",
            format!("the record at {offset} has an undefined conjugation id."),
        ));
    }
    Ok(())
}

/// 形態素の属性レコードを書き出し、索引表にIDを登録します。
///
/// # エラー
///
/// 文字列が65535バイトを超える場合、読みや発音が255個を超える場合、
/// または索引表が満杯の場合、[`SenError`]が返されます。
pub(crate) fn write_attribute_record<W: Write>(
    mut w: W,
    morpheme: &Morpheme,
    tables: &mut IndexTables,
) -> Result<()> {
    let pos = tables.pos.intern(&morpheme.pos)?;
    let conj_type = match morpheme.conjugational_type() {
        Some(s) => tables.conj_type.intern(s)?,
        None => NONE_IDX,
    };
    let conj_form = match morpheme.conjugational_form() {
        Some(s) => tables.conj_form.intern(s)?,
        None => NONE_IDX,
    };

    let too_long = |s: &String| s.len() > usize::from(u16::MAX);
    if too_long(&morpheme.base_form)
        || morpheme.readings.iter().any(too_long)
        || morpheme.pronunciations.iter().any(too_long)
        || morpheme.additional_info.as_ref().is_some_and(too_long)
    {
        return Err(SenError::invalid_argument(
            "morpheme",
            "a string field exceeds 65535 bytes.",
        ));
    }
    let num_readings = u8::try_from(morpheme.readings.len())?;
    let num_pronunciations = u8::try_from(morpheme.pronunciations.len())?;

    w.write_u16::<BigEndian>(pos)?;
    w.write_u16::<BigEndian>(conj_type)?;
    w.write_u16::<BigEndian>(conj_form)?;
    put_str(&mut w, &morpheme.base_form)?;
    w.write_u8(num_readings)?;
    for r in &morpheme.readings {
        put_str(&mut w, r)?;
    }
    w.write_u8(num_pronunciations)?;
    for p in &morpheme.pronunciations {
        put_str(&mut w, p)?;
    }
    put_str(&mut w, morpheme.additional_info().unwrap_or_default())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_record() {
        let morpheme = Morpheme::new("動詞")
            .with_conjugation("五段・カ行イ音便", "基本形")
            .with_base_form("書く")
            .with_readings(["カク"])
            .with_pronunciations(["カク"])
            .with_additional_info("x");

        let mut tables = IndexTables::default();
        let mut attrs = vec![0xAA];
        write_attribute_record(&mut attrs, &morpheme, &mut tables).unwrap();
        validate_attribute_record(&attrs, 1, &tables).unwrap();

        let param = WordParam::new(3, 4, -100);
        let decoded = decode_morpheme(&attrs, 1, param, &tables);
        assert_eq!(decoded.pos(), "動詞");
        assert_eq!(decoded.conjugational_type(), Some("五段・カ行イ音便"));
        assert_eq!(decoded.conjugational_form(), Some("基本形"));
        assert_eq!(decoded.base_form(), "書く");
        assert_eq!(decoded.readings(), &["カク".to_string()]);
        assert_eq!(decoded.additional_info(), Some("x"));
        assert_eq!(decoded.left_id(), 3);
        assert_eq!(decoded.right_id(), 4);
        assert_eq!(decoded.cost(), -100);
    }

    #[test]
    fn test_missing_optional_fields() {
        let morpheme = Morpheme::new("名詞");
        let mut tables = IndexTables::default();
        let mut attrs = vec![];
        write_attribute_record(&mut attrs, &morpheme, &mut tables).unwrap();

        let decoded = decode_morpheme(&attrs, 0, WordParam::default(), &tables);
        assert_eq!(decoded.conjugational_type(), None);
        assert_eq!(decoded.conjugational_form(), None);
        assert_eq!(decoded.additional_info(), None);
        assert_eq!(decoded.base_form(), "*");
        assert!(decoded.readings().is_empty());
    }

    #[test]
    fn test_validate_out_of_bounds() {
        let morpheme = Morpheme::new("名詞").with_readings(["メイシ"]);
        let mut tables = IndexTables::default();
        let mut attrs = vec![];
        write_attribute_record(&mut attrs, &morpheme, &mut tables).unwrap();
        attrs.pop();
        assert!(validate_attribute_record(&attrs, 0, &tables).is_err());
    }

    #[test]
    fn test_validate_undefined_pos() {
        let mut tables = IndexTables::default();
        let mut attrs = vec![];
        write_attribute_record(&mut attrs, &Morpheme::new("名詞"), &mut tables).unwrap();
        assert!(validate_attribute_record(&attrs, 0, &IndexTables::default()).is_err());
    }

    #[test]
    fn test_token_record() {
        let mut tokens = vec![];
        let param = WordParam::new(1, 2, -3).with_right_id2(4);
        write_token_record(&mut tokens, WordParam::default(), 0).unwrap();
        write_token_record(&mut tokens, param, 77).unwrap();
        assert_eq!(tokens.len(), 2 * TOKEN_RECORD_LEN);
        assert_eq!(&tokens[12..20], &[0, 1, 0, 2, 0, 4, 0xff, 0xfd]);
        assert_eq!(read_token_record(&tokens, 1), (param, 77));
    }

    #[test]
    fn test_feature() {
        let morpheme = Morpheme::new("名詞")
            .with_base_form("1,2-ジクロロエタン")
            .with_readings(["イチニジクロロエタン"]);
        assert_eq!(
            morpheme.feature(),
            "名詞,*,*,\"1,2-ジクロロエタン\",イチニジクロロエタン,*"
        );
    }
}
