//! 複数の文を含むテキストの解析
//!
//! [`Tagger`]はテキストを文末記号と改行の直後で文に分割し、文ごとに
//! [`Viterbi`]で解析した結果を1つのトークン列にまとめます。

use crate::errors::Result;
use crate::sentence::Sentence;
use crate::token::Token;
use crate::tokenizer::{Tokenizer, Viterbi};

/// 文の区切りとみなす文字
const SENTENCE_TERMINATORS: &[char] = &['。', '．', '！', '？', '!', '?', '\n', '\r'];

/// テキスト全体を解析するタガー
///
/// # 例
///
/// ```
/// use sen::{DictionaryBuilder, Morpheme, Tagger, Tokenizer, WordParam};
///
/// let mut builder = DictionaryBuilder::new(2, 2);
/// builder
///     .add_entry("雨", WordParam::new(1, 1, 10), Morpheme::new("名詞"))?
///     .add_entry("。", WordParam::new(1, 1, 10), Morpheme::new("記号"))?;
/// let mut tagger = Tagger::new(Tokenizer::new(builder.build_dictionary()?));
///
/// let tokens = tagger.analyze("雨。雨。")?;
/// assert_eq!(tokens.len(), 4);
/// assert!(tokens[2].is_sentence_start());
/// assert_eq!(tokens[2].start(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Tagger {
    viterbi: Viterbi,
    sentence: Sentence,
}

impl Tagger {
    /// 新しいタガーを作成します。
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            viterbi: Viterbi::new(tokenizer),
            sentence: Sentence::default(),
        }
    }

    /// テキストを解析し、すべての文のトークンを連結して返します。
    ///
    /// 各トークンの開始位置はテキスト全体での文字位置です。各文の最初のトークンには
    /// 文頭フラグが立ち、[`Token::word_cost_delta`]には同じ文の直前のトークンからの
    /// 累積コストの増分が設定されます。
    ///
    /// # エラー
    ///
    /// 文の解析に失敗した場合、[`SenError`](crate::errors::SenError)が返されます。
    pub fn analyze(&mut self, text: &str) -> Result<Vec<Token>> {
        let mut tokens = vec![];
        let mut offset = 0;
        for piece in text.split_inclusive(SENTENCE_TERMINATORS) {
            self.sentence.set_sentence(piece);
            let mut prev_cost = 0;
            for (i, mut token) in self.viterbi.best_tokens(&self.sentence)?.into_iter().enumerate() {
                token.set_start(token.start() + offset);
                token.set_sentence_start(i == 0);
                token.set_word_cost_delta(token.cost() - prev_cost);
                prev_cost = token.cost();
                tokens.push(token);
            }
            offset += self.sentence.len_char();
        }
        Ok(tokens)
    }
}
