//! 形態素解析のための辞書モジュール。
//!
//! 辞書はディレクトリ内の次のファイルからなります。整数はすべてビッグエンディアンです。
//!
//! - `header.sen`: 続く4つのバッファのバイト長(u32×4)
//! - `connectionCost.sen`: 接続コスト行列
//! - `partOfSpeech.sen`: 形態素の属性レコード
//! - `token.sen`: 形態素ごとの文脈IDとコスト
//! - `trie.sen`: 表層形のダブル配列トライ
//! - `posIndex.sen`: 品詞・活用型・活用形の文字列表
//!
//! 4つの主要バッファはメモリマップされ、読み込み時に一度だけ検証されます。
//! 検証を通過した辞書に対する参照操作は失敗しません。
pub mod builder;
pub mod character;
pub mod connector;
pub(crate) mod index;
pub mod morpheme;
pub(crate) mod record;
pub mod trie;

use std::fs::{self, File};
use std::io;
use std::ops::Deref;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use memmap2::Mmap;

use crate::dictionary::connector::{ConnectorCost, ConnectorView, MatrixConnector};
use crate::dictionary::index::IndexTables;
use crate::dictionary::morpheme::{
    decode_morpheme, read_token_record, validate_attribute_record, TOKEN_RECORD_LEN,
};
use crate::dictionary::record::read_u32_at;
use crate::dictionary::trie::DoubleArray;
use crate::errors::{Result, SenError};

pub use crate::dictionary::builder::DictionaryBuilder;
pub use crate::dictionary::character::CharClass;
pub use crate::dictionary::index::StringTable;
pub use crate::dictionary::morpheme::{Morpheme, WordParam};

/// BOSのレコード番号
pub const BOS_ID: u32 = 0;
/// EOSのレコード番号
pub const EOS_ID: u32 = 1;
/// 未知語の雛形のレコード番号
pub const UNKNOWN_ID: u32 = 2;
/// 辞書語の先頭のレコード番号
pub const FIRST_ENTRY_ID: u32 = 3;

pub(crate) const HEADER_FILE: &str = "header.sen";
pub(crate) const CONNECTION_COST_FILE: &str = "connectionCost.sen";
pub(crate) const PART_OF_SPEECH_FILE: &str = "partOfSpeech.sen";
pub(crate) const TOKEN_FILE: &str = "token.sen";
pub(crate) const TRIE_FILE: &str = "trie.sen";
pub(crate) const POS_INDEX_FILE: &str = "posIndex.sen";

const HEADER_LEN: usize = 16;

/// トライの値から(先頭のレコード番号, 個数)を取り出します。
#[inline(always)]
const fn split_trie_value(value: u32) -> (u32, u32) {
    (value >> 8, value & 0xff)
}

/// メモリバッファ(mmapまたはヒープ)
///
/// mmapの場合、ヘッダに記録された長さで切り詰めて参照します。
enum DictBuffer {
    Mmap { map: Mmap, len: usize },
    Owned(Vec<u8>),
}

impl Deref for DictBuffer {
    type Target = [u8];

    #[inline(always)]
    fn deref(&self) -> &[u8] {
        match self {
            Self::Mmap { map, len } => &map[..*len],
            Self::Owned(v) => v,
        }
    }
}

/// 辞書ファイル群のメモリ上の表現
///
/// [`DictionaryBuilder::build`]が生成し、[`Dictionary::from_buffers`]で読み込めます。
/// [`DictionaryBuffers::write`]で辞書ディレクトリに書き出せます。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DictionaryBuffers {
    pub connection_cost: Vec<u8>,
    pub part_of_speech: Vec<u8>,
    pub token: Vec<u8>,
    pub trie: Vec<u8>,
    pub pos_index: Vec<u8>,
}

impl DictionaryBuffers {
    /// `header.sen`の内容を返します。
    ///
    /// # エラー
    ///
    /// いずれかのバッファが4GiB以上の場合、[`SenError`]が返されます。
    pub fn header(&self) -> Result<[u8; HEADER_LEN]> {
        let mut header = [0; HEADER_LEN];
        let sizes = [
            &self.connection_cost,
            &self.part_of_speech,
            &self.token,
            &self.trie,
        ];
        for (chunk, buf) in header.chunks_exact_mut(4).zip(sizes) {
            BigEndian::write_u32(chunk, u32::try_from(buf.len())?);
        }
        Ok(header)
    }

    /// 辞書ディレクトリに書き出します。
    ///
    /// ディレクトリが存在しない場合は作成されます。
    ///
    /// # 引数
    ///
    /// * `dir` - 出力先のディレクトリ
    pub fn write<P>(&self, dir: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        fs::write(dir.join(HEADER_FILE), self.header()?)?;
        fs::write(dir.join(CONNECTION_COST_FILE), &self.connection_cost)?;
        fs::write(dir.join(PART_OF_SPEECH_FILE), &self.part_of_speech)?;
        fs::write(dir.join(TOKEN_FILE), &self.token)?;
        fs::write(dir.join(TRIE_FILE), &self.trie)?;
        fs::write(dir.join(POS_INDEX_FILE), &self.pos_index)?;
        log::debug!("wrote a dictionary to {}", dir.display());
        Ok(())
    }
}

/// 形態素解析のための読み取り専用辞書。
///
/// 構築後は変更されず、`Arc`で包んで任意の数のスレッドから共有できます。
///
/// # 例
///
/// ```no_run
/// use std::sync::Arc;
/// use sen::{Dictionary, Tokenizer};
///
/// let dict = Arc::new(Dictionary::open("path/to/dic")?);
/// let tokenizer = Tokenizer::from_shared_dictionary(dict.clone());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Dictionary {
    connection_cost: DictBuffer,
    part_of_speech: DictBuffer,
    token: DictBuffer,
    trie: DictBuffer,
    tables: IndexTables,
    num_right: usize,
    num_left: usize,
}

impl Dictionary {
    /// 辞書ディレクトリから辞書を読み込みます。
    ///
    /// # 引数
    ///
    /// * `dir` - 辞書ファイル群を含むディレクトリ
    ///
    /// # エラー
    ///
    /// ファイルが存在しない場合、ヘッダに記録された長さより短い場合、
    /// または内容が壊れている場合、[`SenError::Resource`]が返されます。
    pub fn open<P>(dir: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        let header = read_resource(dir, HEADER_FILE)?;
        if header.len() < HEADER_LEN {
            return Err(SenError::resource(
                HEADER_FILE,
                format!("expected {HEADER_LEN} bytes, but got {}.", header.len()),
            ));
        }
        if header.len() > HEADER_LEN {
            log::warn!(
                "{HEADER_FILE} has {} trailing bytes; ignored",
                header.len() - HEADER_LEN
            );
        }
        let size = |i: usize| read_u32_at(&header, i * 4).map_or(0, |x| x as usize);

        let connection_cost = map_resource(dir, CONNECTION_COST_FILE, size(0))?;
        let part_of_speech = map_resource(dir, PART_OF_SPEECH_FILE, size(1))?;
        let token = map_resource(dir, TOKEN_FILE, size(2))?;
        let trie = map_resource(dir, TRIE_FILE, size(3))?;
        let pos_index = read_resource(dir, POS_INDEX_FILE)?;

        log::debug!("opened a dictionary at {}", dir.display());
        Self::from_parts(connection_cost, part_of_speech, token, trie, &pos_index)
    }

    /// メモリ上のバッファから辞書を作成します。
    ///
    /// # エラー
    ///
    /// 内容が壊れている場合、[`SenError::Resource`]が返されます。
    pub fn from_buffers(buffers: DictionaryBuffers) -> Result<Self> {
        let DictionaryBuffers {
            connection_cost,
            part_of_speech,
            token,
            trie,
            pos_index,
        } = buffers;
        Self::from_parts(
            DictBuffer::Owned(connection_cost),
            DictBuffer::Owned(part_of_speech),
            DictBuffer::Owned(token),
            DictBuffer::Owned(trie),
            &pos_index,
        )
    }

    fn from_parts(
        connection_cost: DictBuffer,
        part_of_speech: DictBuffer,
        token: DictBuffer,
        trie: DictBuffer,
        pos_index: &[u8],
    ) -> Result<Self> {
        let tables = IndexTables::parse(pos_index)?;
        let conn = MatrixConnector::new(&connection_cost)?;
        let (num_right, num_left) = (conn.num_right(), conn.num_left());

        let dict = Self {
            connection_cost,
            part_of_speech,
            token,
            trie,
            tables,
            num_right,
            num_left,
        };
        dict.validate()?;

        log::debug!(
            "dictionary: matrix={}x{}, morphemes={}, attributes={}B, trie={}B, pos={}",
            dict.num_right,
            dict.num_left,
            dict.num_morphemes(),
            dict.part_of_speech.len(),
            dict.trie.len(),
            dict.tables.pos.len(),
        );
        Ok(dict)
    }

    /// 以降の参照が失敗しないことを保証するための検証を行います。
    fn validate(&self) -> Result<()> {
        if self.token.len() % TOKEN_RECORD_LEN != 0 {
            return Err(SenError::resource(
                TOKEN_FILE,
                format!(
                    "the length {} is not a multiple of {TOKEN_RECORD_LEN}.",
                    self.token.len()
                ),
            ));
        }
        let num_tokens = self.num_morphemes();
        if num_tokens < FIRST_ENTRY_ID as usize {
            return Err(SenError::resource(
                TOKEN_FILE,
                "the BOS, EOS and unknown records are missing.",
            ));
        }
        let num_tokens_u32 = u32::try_from(num_tokens)?;

        for id in 0..num_tokens_u32 {
            let (param, offset) = read_token_record(&self.token, id);
            if usize::from(param.left_id) >= self.num_left
                || usize::from(param.right_id) >= self.num_right
            {
                return Err(SenError::resource(
                    TOKEN_FILE,
                    format!(
                        "the record {id} has context ids ({}, {}) outside the {}x{} matrix.",
                        param.left_id, param.right_id, self.num_right, self.num_left
                    ),
                ));
            }
            validate_attribute_record(&self.part_of_speech, offset, &self.tables)?;
        }

        let da = DoubleArray::new(&self.trie)?;
        for value in da.values() {
            let (first, count) = split_trie_value(value);
            let in_range = first >= FIRST_ENTRY_ID
                && count != 0
                && first.checked_add(count).is_some_and(|end| end <= num_tokens_u32);
            if !in_range {
                return Err(SenError::resource(
                    TRIE_FILE,
                    format!("a leaf points to records {first}..{first}+{count} out of range."),
                ));
            }
        }
        Ok(())
    }

    /// 接続コスト行列のビューを返します。
    #[inline(always)]
    pub fn connector(&self) -> MatrixConnector<'_> {
        MatrixConnector::from_validated(&self.connection_cost, self.num_right, self.num_left)
    }

    /// 接続コストを返します。
    ///
    /// # 引数
    ///
    /// * `right_id` - 左側ノードの右文脈ID
    /// * `left_id` - 右側ノードの左文脈ID
    #[inline(always)]
    pub fn connection_cost(&self, right_id: u16, left_id: u16) -> i32 {
        self.connector().cost(right_id, left_id)
    }

    /// 形態素の総数（予約レコードを含む）を返します。
    #[inline(always)]
    pub fn num_morphemes(&self) -> usize {
        self.token.len() / TOKEN_RECORD_LEN
    }

    /// 形態素の単語パラメータを返します。
    ///
    /// # パニック
    ///
    /// `id`が範囲外の場合、パニックします。
    #[inline(always)]
    pub fn word_param(&self, id: u32) -> WordParam {
        assert!((id as usize) < self.num_morphemes(), "morpheme id out of range");
        read_token_record(&self.token, id).0
    }

    /// 形態素の属性を復号します。
    ///
    /// # パニック
    ///
    /// `id`が範囲外の場合、パニックします。
    pub fn morpheme(&self, id: u32) -> Morpheme {
        assert!((id as usize) < self.num_morphemes(), "morpheme id out of range");
        let (param, offset) = read_token_record(&self.token, id);
        decode_morpheme(&self.part_of_speech, offset, param, &self.tables)
    }

    /// 接頭辞に一致するすべての辞書語を検索します。
    ///
    /// # 引数
    ///
    /// * `input` - 検索対象のUTF-8バイト列
    ///
    /// # 戻り値
    ///
    /// (一致したバイト長, 形態素ID)のイテレータ。短い一致から順に、
    /// 同じ表層形の中では`token.sen`の順に並びます。
    pub fn lookup<'a>(&'a self, input: &'a [u8]) -> impl Iterator<Item = (usize, u32)> + 'a {
        DoubleArray::from_validated(&self.trie)
            .common_prefix_iterator(input)
            .flat_map(|m| {
                let (first, count) = split_trie_value(m.value);
                (first..first + count).map(move |id| (m.end_byte, id))
            })
    }

    /// 品詞の文字列表
    #[inline(always)]
    pub fn pos_index(&self) -> &StringTable {
        &self.tables.pos
    }

    /// 活用型の文字列表
    #[inline(always)]
    pub fn conj_type_index(&self) -> &StringTable {
        &self.tables.conj_type
    }

    /// 活用形の文字列表
    #[inline(always)]
    pub fn conj_form_index(&self) -> &StringTable {
        &self.tables.conj_form
    }

    /// 辞書の内容をメモリ上のバッファに複製します。
    ///
    /// # エラー
    ///
    /// 索引表の書き出しに失敗した場合、[`SenError`]が返されます。
    pub fn to_buffers(&self) -> Result<DictionaryBuffers> {
        let mut pos_index = vec![];
        self.tables.encode(&mut pos_index)?;
        Ok(DictionaryBuffers {
            connection_cost: self.connection_cost.to_vec(),
            part_of_speech: self.part_of_speech.to_vec(),
            token: self.token.to_vec(),
            trie: self.trie.to_vec(),
            pos_index,
        })
    }
}

fn resource_error(name: &'static str, e: io::Error) -> SenError {
    if e.kind() == io::ErrorKind::NotFound {
        SenError::resource(name, "not found.")
    } else {
        SenError::resource(name, e.to_string())
    }
}

fn read_resource(dir: &Path, name: &'static str) -> Result<Vec<u8>> {
    fs::read(dir.join(name)).map_err(|e| resource_error(name, e))
}

fn map_resource(dir: &Path, name: &'static str, len: usize) -> Result<DictBuffer> {
    let file = File::open(dir.join(name)).map_err(|e| resource_error(name, e))?;
    let actual = usize::try_from(file.metadata()?.len())?;
    if actual < len {
        return Err(SenError::resource(
            name,
            format!("the header records {len} bytes, but the file has only {actual}."),
        ));
    }
    if actual > len {
        log::warn!("{name} has {} bytes beyond the recorded size; ignored", actual - len);
    }
    if len == 0 {
        return Ok(DictBuffer::Owned(vec![]));
    }
    // The dictionary files must not be modified while mapped.
    let map = unsafe { Mmap::map(&file)? };
    Ok(DictBuffer::Mmap { map, len })
}
