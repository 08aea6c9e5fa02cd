//! ビタビアルゴリズムによる最良経路の探索。
//!
//! [`Viterbi`]はラティスを内部に保持し、文ごとにリセットして再利用することで
//! 不要なメモリ再割り当てを回避します。
use crate::errors::Result;
use crate::sentence::{Origin, Sentence};
use crate::token::Token;
use crate::tokenizer::lattice::{Lattice, Node};
use crate::tokenizer::Tokenizer;

/// 最小コストの分割を求めるデコーダー。
///
/// 1つのインスタンスを複数のスレッドから同時に使うことはできません。
/// スレッドごとに[`Viterbi::new`]でインスタンスを作成してください。
///
/// # 例
///
/// ```
/// use sen::{DictionaryBuilder, Morpheme, Sentence, Tokenizer, Viterbi, WordParam};
///
/// let mut builder = DictionaryBuilder::new(2, 2);
/// for (surface, cost) in [("a", 10), ("ab", 5), ("b", 10)] {
///     builder.add_entry(surface, WordParam::new(1, 1, cost), Morpheme::new("名詞"))?;
/// }
/// let mut viterbi = Viterbi::new(Tokenizer::new(builder.build_dictionary()?));
///
/// let tokens = viterbi.best_tokens(&Sentence::new("ab"))?;
/// assert_eq!(tokens.len(), 1);
/// assert_eq!(tokens[0].surface(), "ab");
/// assert_eq!(viterbi.path_cost(), Some(5));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Viterbi {
    tokenizer: Tokenizer,
    lattice: Lattice,
}

impl Viterbi {
    /// 新しいデコーダーを作成します。
    ///
    /// # 引数
    ///
    /// * `tokenizer` - 候補ノードの生成に使うトークナイザー
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            lattice: Lattice::default(),
        }
    }

    /// トークナイザーへの参照を返します。
    #[inline(always)]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// 直前に探索したラティスへの参照を返します。
    #[inline(always)]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// 文の最小コストの分割を求め、トークン列を返します。
    ///
    /// 読み制約が設定されている場合、制約の区間はちょうど1つのトークンで覆われ、
    /// そのトークンの読みは制約の読みを含みます。
    ///
    /// # 引数
    ///
    /// * `sentence` - 解析対象の文
    ///
    /// # 戻り値
    ///
    /// BOSとEOSを除く最良経路上のトークン。空の文では空のベクタを返します。
    ///
    /// # エラー
    ///
    /// ラティスの不変条件が崩れている場合、[`SenError::InternalLattice`](crate::errors::SenError::InternalLattice)
    /// が返されます。
    pub fn best_tokens(&mut self, sentence: &Sentence) -> Result<Vec<Token>> {
        let Self { tokenizer, lattice } = self;
        let connector = tokenizer.dictionary().connector();
        let len = sentence.len_char();
        let ignore_space = tokenizer.is_ignore_space();

        lattice.reset(len, tokenizer.bos_node());
        for origin in sentence.iter(ignore_space) {
            let base = origin.base();
            if !lattice.has_ends(base) {
                continue;
            }
            for r in Self::candidates(tokenizer, sentence, origin) {
                let (right_id2, end) = (r.right_id2, r.end());
                let r_idx = lattice.insert(base, r, &connector);
                if right_id2 == 0 || end == len {
                    continue;
                }
                if let Some(next) = sentence.origin_at(end, ignore_space) {
                    let next = Origin {
                        position: next.position,
                        skipped: 0,
                    };
                    for c in Self::candidates(tokenizer, sentence, next) {
                        lattice.insert_after(r_idx, c, &connector);
                    }
                }
            }
        }
        lattice.insert_eos(tokenizer.eos_node(len), &connector);
        log::debug!(
            "lattice: {} chars, {} nodes, cost={:?}",
            len,
            lattice.num_nodes(),
            lattice.eos_cost()
        );

        let path = lattice.backtrace()?;
        Ok(path
            .into_iter()
            .map(|idx| tokenizer.token(sentence, lattice.node(idx)))
            .collect())
    }

    /// オリジンに置く候補ノードを返します。
    ///
    /// オリジンで読み制約が始まる場合は制約を満たす候補のみを返し、
    /// それ以外の場合は次の制約の開始位置を超えない候補を返します。
    fn candidates(tokenizer: &Tokenizer, sentence: &Sentence, origin: Origin) -> Vec<Node> {
        match sentence.reading_constraint(origin.position) {
            Some(constraint) => tokenizer.lookup_constrained(sentence, origin, constraint),
            None => {
                let limit = sentence
                    .next_constraint_start(origin.position)
                    .unwrap_or_else(|| sentence.len_char());
                tokenizer.lookup(sentence, origin, limit)
            }
        }
    }

    /// 指定された位置から始まり得るトークンをすべて返します。
    ///
    /// 読み制約は考慮せず、探索も行いません。返されるトークンのコストは0です。
    ///
    /// # 引数
    ///
    /// * `sentence` - 対象の文
    /// * `position` - 開始位置（文字単位）
    pub fn possible_tokens(&self, sentence: &Sentence, position: usize) -> Vec<Token> {
        let len = sentence.len_char();
        if position >= len {
            return vec![];
        }
        let origin = Origin {
            position,
            skipped: 0,
        };
        self.tokenizer
            .lookup(sentence, origin, len)
            .iter()
            .map(|node| self.tokenizer.token(sentence, node))
            .collect()
    }

    /// 直前の[`Viterbi::best_tokens`]で求めた経路のEOSまでの累積コストを返します。
    ///
    /// まだ探索を行っていない場合は`None`を返します。
    #[inline(always)]
    pub fn path_cost(&self) -> Option<i32> {
        self.lattice.eos_cost()
    }
}
