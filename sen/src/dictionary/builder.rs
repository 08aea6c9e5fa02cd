//! 辞書ファイル群の構築
//!
//! メモリ上の辞書語から、[`Dictionary::open`](crate::Dictionary::open)が読み込める
//! バイナリ形式の辞書を生成します。ソース辞書（CSVなど）の解析は行いません。

use std::collections::BTreeMap;
use std::path::Path;

use crate::dictionary::connector::encode_matrix;
use crate::dictionary::index::IndexTables;
use crate::dictionary::morpheme::{write_attribute_record, write_token_record, Morpheme, WordParam};
use crate::dictionary::trie::DoubleArrayBuilder;
use crate::dictionary::{Dictionary, DictionaryBuffers, FIRST_ENTRY_ID};
use crate::errors::{Result, SenError};

/// 同じ表層形に登録できる形態素の最大数
const MAX_ENTRIES_PER_SURFACE: usize = 0xff;

/// トライの値に格納できるレコード番号の上限
const MAX_FIRST_TOKEN: u32 = 1 << 23;

/// 未知語の既定の品詞
pub(crate) const DEFAULT_UNKNOWN_POS: &str = "未知語";

/// 辞書ビルダー
///
/// # 例
///
/// ```
/// use sen::{Dictionary, DictionaryBuilder, Morpheme, WordParam};
///
/// let mut builder = DictionaryBuilder::new(2, 2);
/// builder
///     .add_entry("東京", WordParam::new(1, 1, 100), Morpheme::new("名詞").with_readings(["トウキョウ"]))?
///     .add_entry("京都", WordParam::new(1, 1, 100), Morpheme::new("名詞").with_readings(["キョウト"]))?;
/// let dict = Dictionary::from_buffers(builder.build()?)?;
/// assert_eq!(dict.lookup("京都府".as_bytes()).count(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DictionaryBuilder {
    num_right: u16,
    num_left: u16,
    costs: Vec<i16>,
    bos: (WordParam, Morpheme),
    eos: (WordParam, Morpheme),
    unknown: (WordParam, Morpheme),
    entries: Vec<(String, WordParam, Morpheme)>,
}

impl DictionaryBuilder {
    /// 接続コストがすべて0の行列を持つビルダーを作成します。
    ///
    /// # 引数
    ///
    /// * `num_right` - 右文脈IDの数（行列の行数）
    /// * `num_left` - 左文脈IDの数（行列の列数）
    pub fn new(num_right: u16, num_left: u16) -> Self {
        let sentinel = || (WordParam::default(), Morpheme::new("BOS/EOS"));
        Self {
            num_right,
            num_left,
            costs: vec![0; usize::from(num_right) * usize::from(num_left)],
            bos: sentinel(),
            eos: sentinel(),
            unknown: (WordParam::default(), Morpheme::new(DEFAULT_UNKNOWN_POS)),
            entries: vec![],
        }
    }

    fn check_param(&self, param: WordParam) -> Result<()> {
        if param.left_id >= self.num_left {
            return Err(SenError::invalid_argument(
                "left_id",
                format!("{} must be less than {}.", param.left_id, self.num_left),
            ));
        }
        if param.right_id >= self.num_right {
            return Err(SenError::invalid_argument(
                "right_id",
                format!("{} must be less than {}.", param.right_id, self.num_right),
            ));
        }
        Ok(())
    }

    /// 接続コストを設定します。
    ///
    /// # 引数
    ///
    /// * `right_id` - 左側ノードの右文脈ID
    /// * `left_id` - 右側ノードの左文脈ID
    /// * `cost` - 接続コスト
    pub fn connection_cost(&mut self, right_id: u16, left_id: u16, cost: i16) -> Result<&mut Self> {
        self.check_param(WordParam::new(left_id, right_id, 0))?;
        let i = usize::from(right_id) * usize::from(self.num_left) + usize::from(left_id);
        self.costs[i] = cost;
        Ok(self)
    }

    /// BOSの単語パラメータを設定します。
    pub fn bos(&mut self, param: WordParam) -> Result<&mut Self> {
        self.check_param(param)?;
        self.bos.0 = param;
        Ok(self)
    }

    /// EOSの単語パラメータを設定します。
    pub fn eos(&mut self, param: WordParam) -> Result<&mut Self> {
        self.check_param(param)?;
        self.eos.0 = param;
        Ok(self)
    }

    /// 未知語の雛形を設定します。
    ///
    /// 雛形の文脈IDとコストはすべての未知語ノードに使われ、
    /// 付加情報は読み制約のために合成される形態素に引き継がれます。
    pub fn unknown(&mut self, param: WordParam, morpheme: Morpheme) -> Result<&mut Self> {
        self.check_param(param)?;
        self.unknown = (param, morpheme);
        Ok(self)
    }

    /// 辞書語を追加します。
    ///
    /// `morpheme`の文脈IDとコストは`param`の値で置き換えられます。
    ///
    /// # エラー
    ///
    /// 表層形が空の場合、または文脈IDが行列の範囲外の場合、[`SenError`]が返されます。
    pub fn add_entry<S>(&mut self, surface: S, param: WordParam, morpheme: Morpheme) -> Result<&mut Self>
    where
        S: Into<String>,
    {
        let surface = surface.into();
        if surface.is_empty() {
            return Err(SenError::invalid_argument("surface", "must not be empty."));
        }
        self.check_param(param)?;
        self.entries.push((surface, param, morpheme));
        Ok(self)
    }

    /// 辞書ファイル群をメモリ上に構築します。
    ///
    /// 辞書語は表層形のバイト列順に並べられ、同じ表層形の中では追加された順に
    /// 形態素IDが割り当てられます。
    pub fn build(&self) -> Result<DictionaryBuffers> {
        if self.num_right == 0 || self.num_left == 0 {
            return Err(SenError::invalid_argument(
                "matrix",
                "the connection matrix must not be empty.",
            ));
        }

        let mut by_surface: BTreeMap<&[u8], Vec<usize>> = BTreeMap::new();
        for (i, (surface, _, _)) in self.entries.iter().enumerate() {
            by_surface.entry(surface.as_bytes()).or_default().push(i);
        }

        let mut tables = IndexTables::default();
        let mut part_of_speech = vec![];
        let mut token = vec![];
        let mut push = |param: WordParam, morpheme: &Morpheme, token: &mut Vec<u8>| -> Result<()> {
            let offset = u32::try_from(part_of_speech.len())?;
            write_attribute_record(&mut part_of_speech, morpheme, &mut tables)?;
            write_token_record(token, param, offset)?;
            Ok(())
        };

        for (param, morpheme) in [&self.bos, &self.eos, &self.unknown] {
            push(*param, morpheme, &mut token)?;
        }

        let mut records = Vec::with_capacity(by_surface.len());
        let mut next_id = FIRST_ENTRY_ID;
        for (surface, ids) in &by_surface {
            if ids.len() > MAX_ENTRIES_PER_SURFACE {
                return Err(SenError::invalid_argument(
                    "surface",
                    format!(
                        "{} has more than {MAX_ENTRIES_PER_SURFACE} entries.",
                        String::from_utf8_lossy(surface)
                    ),
                ));
            }
            if next_id >= MAX_FIRST_TOKEN {
                return Err(SenError::invalid_argument("entries", "too many entries."));
            }
            records.push((*surface, (next_id << 8) | ids.len() as u32));
            for &i in ids {
                let (_, param, morpheme) = &self.entries[i];
                push(*param, morpheme, &mut token)?;
            }
            next_id += ids.len() as u32;
        }

        let trie = DoubleArrayBuilder::build(&records)?;
        log::debug!(
            "built a dictionary: {} surfaces, {} morphemes, trie={}B",
            records.len(),
            next_id,
            trie.len()
        );

        let mut connection_cost = vec![];
        encode_matrix(self.num_right, self.num_left, &self.costs, &mut connection_cost)?;
        let mut pos_index = vec![];
        tables.encode(&mut pos_index)?;

        Ok(DictionaryBuffers {
            connection_cost,
            part_of_speech,
            token,
            trie,
            pos_index,
        })
    }

    /// 辞書ファイル群を構築し、ディレクトリに書き出します。
    ///
    /// # 引数
    ///
    /// * `dir` - 出力先のディレクトリ
    pub fn write<P>(&self, dir: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        self.build()?.write(dir)
    }

    /// 辞書ファイル群を構築し、そのまま辞書として読み込みます。
    pub fn build_dictionary(&self) -> Result<Dictionary> {
        Dictionary::from_buffers(self.build()?)
    }
}
