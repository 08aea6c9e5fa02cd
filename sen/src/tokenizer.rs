//! 辞書引きと未知語処理を行うトークナイザー。
//!
//! [`Tokenizer`]は、文中の起点（オリジン）から始まる候補ノードの列を辞書から作り、
//! 辞書に一致する語が無い場合は未知語ノードを合成します。
//! 最良経路の探索は[`Viterbi`]が行います。
//!
//! # 例
//!
//! ```no_run
//! use sen::{Dictionary, Sentence, Tokenizer, Viterbi};
//!
//! let dict = Dictionary::open("path/to/dic")?;
//! let tokenizer = Tokenizer::new(dict);
//! let mut viterbi = Viterbi::new(tokenizer);
//!
//! for token in viterbi.best_tokens(&Sentence::new("自然言語処理"))? {
//!     println!("{}\t{}", token.surface(), token.feature());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod lattice;
pub mod viterbi;

use std::sync::Arc;

use crate::dictionary::builder::DEFAULT_UNKNOWN_POS;
use crate::dictionary::{Dictionary, Morpheme, WordParam, BOS_ID, EOS_ID, UNKNOWN_ID};
use crate::sentence::{Origin, Reading, Sentence};
use crate::token::Token;
use crate::tokenizer::lattice::{Node, WordRef};

pub use crate::tokenizer::viterbi::Viterbi;

/// 辞書引きを行うトークナイザー。
///
/// 辞書は`Arc`で共有されるため、複製は安価です。
/// 解析処理そのものは状態を持たず、複数の[`Viterbi`]から同時に使えます。
#[derive(Clone)]
pub struct Tokenizer {
    dict: Arc<Dictionary>,
    ignore_space: bool,
    max_grouping_len: Option<usize>,
    unknown_pos: String,
}

impl Tokenizer {
    /// 新しいトークナイザーを作成します。
    ///
    /// 辞書はトークナイザーに所有権が移動します。複数のトークナイザー間で辞書を共有する
    /// 必要がある場合は、[`Tokenizer::from_shared_dictionary`]を使用してください。
    ///
    /// # 引数
    ///
    /// * `dict` - 形態素解析に使用する辞書
    pub fn new(dict: Dictionary) -> Self {
        Self::from_shared_dictionary(Arc::new(dict))
    }

    /// 共有された辞書から新しいトークナイザーを作成します。
    ///
    /// # 例
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use sen::{Dictionary, Tokenizer};
    ///
    /// let dict = Arc::new(Dictionary::open("path/to/dic")?);
    /// let tokenizer1 = Tokenizer::from_shared_dictionary(dict.clone());
    /// let tokenizer2 = Tokenizer::from_shared_dictionary(dict);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_shared_dictionary(dict: Arc<Dictionary>) -> Self {
        Self {
            dict,
            ignore_space: false,
            max_grouping_len: None,
            unknown_pos: DEFAULT_UNKNOWN_POS.to_string(),
        }
    }

    /// 空白を読み飛ばすかどうかを設定します。
    ///
    /// 有効な場合、空白の連続はトークンにならず、後続のノードの区間に含まれます。
    ///
    /// # 引数
    ///
    /// * `yes` - `true`の場合、空白文字をトークンから除外します
    pub fn ignore_space(mut self, yes: bool) -> Self {
        self.ignore_space = yes;
        self
    }

    /// 未知語の最大グルーピング長を指定します。
    ///
    /// # 引数
    ///
    /// * `max_grouping_len` - 未知語の最大文字数。0は無制限を示します。
    pub const fn max_grouping_len(mut self, max_grouping_len: usize) -> Self {
        if max_grouping_len != 0 {
            self.max_grouping_len = Some(max_grouping_len);
        } else {
            self.max_grouping_len = None;
        }
        self
    }

    /// 未知語に付ける品詞を指定します。既定値は`未知語`です。
    pub fn unknown_pos<S>(mut self, pos: S) -> Self
    where
        S: Into<String>,
    {
        self.unknown_pos = pos.into();
        self
    }

    /// 辞書への参照を返します。
    #[inline(always)]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// 空白を読み飛ばす設定かどうかを返します。
    #[inline(always)]
    pub const fn is_ignore_space(&self) -> bool {
        self.ignore_space
    }

    fn node(&self, origin: Origin, length: usize, word: WordRef, param: WordParam) -> Node {
        Node {
            word,
            start_node: origin.base(),
            start_word: origin.position,
            length,
            left_id: param.left_id,
            right_id: param.right_id,
            right_id2: param.right_id2,
            word_cost: param.word_cost,
            cost: 0,
            prev: None,
            next: None,
        }
    }

    /// オリジンから始まる辞書語のノードを返します。
    ///
    /// `limit`を超えて伸びる候補は除かれます。
    fn dictionary_nodes(&self, sentence: &Sentence, origin: Origin, limit: usize) -> Vec<Node> {
        let start_byte = sentence.byte_position(origin.position);
        let input = &sentence.raw().as_bytes()[start_byte..];
        self.dict
            .lookup(input)
            .filter_map(|(len_byte, id)| {
                // Surfaces are whole UTF-8 strings, so a match ends on a char boundary.
                let end = sentence.char_position(start_byte + len_byte)?;
                (end <= limit).then(|| {
                    let param = self.dict.word_param(id);
                    self.node(origin, end - origin.position, WordRef::Known(id), param)
                })
            })
            .collect()
    }

    /// オリジンから始まる候補ノードを返します。
    ///
    /// 辞書に一致する語ごとに1つのノードを返します。`limit`（次の読み制約の開始位置、
    /// または文末）を超えて伸びる候補は除かれます。候補が残らない場合は、
    /// オリジンの文字と同じ文字種が連続する範囲を覆う未知語ノードを1つ返します。
    ///
    /// # 引数
    ///
    /// * `sentence` - 対象の文
    /// * `origin` - 起点
    /// * `limit` - ノードの終了位置の上限（文字単位）
    pub fn lookup(&self, sentence: &Sentence, origin: Origin, limit: usize) -> Vec<Node> {
        debug_assert!(origin.position < limit && limit <= sentence.len_char());
        let mut nodes = self.dictionary_nodes(sentence, origin, limit);
        if nodes.is_empty() {
            let class = sentence.char_class(origin.position);
            let mut end = origin.position + 1;
            while end < limit && sentence.char_class(end) == class {
                end += 1;
            }
            let mut length = end - origin.position;
            if let Some(max) = self.max_grouping_len {
                length = length.min(max);
            }
            log::trace!(
                "unknown word at {}: {} x {length}",
                origin.position,
                class.name()
            );
            nodes.push(self.unknown_node(sentence, origin, length));
        }
        nodes
    }

    /// 長さを指定して未知語ノードを作成します。
    pub fn unknown_node(&self, sentence: &Sentence, origin: Origin, length: usize) -> Node {
        let class = sentence.char_class(origin.position);
        let param = self.dict.word_param(UNKNOWN_ID);
        self.node(origin, length, WordRef::Unknown(class), param)
    }

    /// 読み制約を満たす候補ノードを返します。
    ///
    /// 辞書語のうち、長さが制約の区間長に等しく、かつ読みに制約の読みを含むものを残します。
    /// 残らない場合は、制約の読みを唯一の読みとして持つノードを合成します。
    pub fn lookup_constrained(
        &self,
        sentence: &Sentence,
        origin: Origin,
        constraint: &Reading,
    ) -> Vec<Node> {
        let mut nodes = self.dictionary_nodes(sentence, origin, sentence.len_char());
        nodes.retain(|node| {
            node.length == constraint.length
                && match node.word {
                    WordRef::Known(id) => self
                        .dict
                        .morpheme(id)
                        .readings()
                        .iter()
                        .any(|r| *r == constraint.text),
                    _ => false,
                }
        });
        if nodes.is_empty() {
            log::trace!("synthesized a node for {constraint}");
            let param = self.dict.word_param(UNKNOWN_ID);
            nodes.push(self.node(origin, constraint.length, WordRef::Constrained, param));
        }
        nodes
    }

    /// BOSノードを返します。
    pub fn bos_node(&self) -> Node {
        let origin = Origin {
            position: 0,
            skipped: 0,
        };
        self.node(origin, 0, WordRef::Bos, self.dict.word_param(BOS_ID))
    }

    /// EOSノードを返します。
    pub fn eos_node(&self, position: usize) -> Node {
        let origin = Origin {
            position,
            skipped: 0,
        };
        self.node(origin, 0, WordRef::Eos, self.dict.word_param(EOS_ID))
    }

    /// ノードの形態素を返します。
    ///
    /// 未知語と合成ノードの形態素は、未知語の雛形の文脈IDとコストを持ち、
    /// 品詞は[`Tokenizer::unknown_pos`]で指定されたものになります。
    pub fn morpheme(&self, sentence: &Sentence, node: &Node) -> Morpheme {
        match node.word {
            WordRef::Known(id) => self.dict.morpheme(id),
            WordRef::Bos => self.dict.morpheme(BOS_ID),
            WordRef::Eos => self.dict.morpheme(EOS_ID),
            WordRef::Unknown(_) => self.unknown_morpheme(None),
            WordRef::Constrained => {
                let text = sentence
                    .reading_constraint(node.start_word)
                    .map(|r| r.text.clone());
                self.unknown_morpheme(Some(text.unwrap_or_default()))
            }
        }
    }

    fn unknown_morpheme(&self, reading: Option<String>) -> Morpheme {
        let template = self.dict.morpheme(UNKNOWN_ID);
        let mut morpheme = Morpheme::new(self.unknown_pos.as_str());
        morpheme.set_param(self.dict.word_param(UNKNOWN_ID));
        if let Some(reading) = reading {
            morpheme = morpheme.with_readings([reading]);
            if let Some(info) = template.additional_info() {
                morpheme = morpheme.with_additional_info(info);
            }
        }
        morpheme
    }

    /// ノードからトークンを作成します。
    pub(crate) fn token(&self, sentence: &Sentence, node: &Node) -> Token {
        Token::new(
            sentence.surface(node.start_word, node.length),
            node.start_word,
            node.length,
            node.cost,
            self.morpheme(sentence, node),
        )
    }
}
