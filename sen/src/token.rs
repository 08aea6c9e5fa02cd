//! トークンの結果コンテナ
//!
//! 形態素解析の結果として得られるトークンを表現する型を提供します。
//! トークンは解析に使った文や辞書から独立した値であり、
//! 呼び出し側が複合語の分割などで置き換え用のトークンを作るために、
//! 一部のフィールドを書き換えることができます。

use std::ops::Range;

use crate::dictionary::Morpheme;

/// 形態素解析の結果トークン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    surface: String,
    start: usize,
    length: usize,
    cost: i32,
    morpheme: Morpheme,
    sentence_start: bool,
    word_cost_delta: i32,
}

impl Token {
    /// 新しいトークンを作成します。
    ///
    /// # 引数
    ///
    /// * `surface` - 表層形
    /// * `start` - 開始位置（文字単位）
    /// * `length` - 長さ（文字単位）
    /// * `cost` - BOSからこのトークンまでの累積コスト
    /// * `morpheme` - 形態素の属性
    pub fn new<S>(surface: S, start: usize, length: usize, cost: i32, morpheme: Morpheme) -> Self
    where
        S: Into<String>,
    {
        Self {
            surface: surface.into(),
            start,
            length,
            cost,
            morpheme,
            sentence_start: false,
            word_cost_delta: 0,
        }
    }

    /// トークンの表層形を取得します。
    #[inline(always)]
    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// トークンの開始位置（文字単位）を取得します。
    #[inline(always)]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// トークンの長さ（文字単位）を取得します。
    #[inline(always)]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// トークンの文字単位の位置範囲を取得します。
    #[inline(always)]
    pub const fn range_char(&self) -> Range<usize> {
        self.start..self.start + self.length
    }

    /// BOSからこのトークンまでの累積コストを取得します。
    #[inline(always)]
    pub const fn cost(&self) -> i32 {
        self.cost
    }

    /// トークンの形態素を取得します。
    #[inline(always)]
    pub fn morpheme(&self) -> &Morpheme {
        &self.morpheme
    }

    /// トークンの素性文字列を取得します。
    ///
    /// [`Morpheme::feature`]を参照してください。
    pub fn feature(&self) -> String {
        self.morpheme.feature()
    }

    /// 文頭のトークンかどうかを取得します。
    #[inline(always)]
    pub const fn is_sentence_start(&self) -> bool {
        self.sentence_start
    }

    /// 同じ文の直前のトークンからの累積コストの増分を取得します。
    ///
    /// [`Tagger`](crate::Tagger)が設定します。文頭のトークンでは累積コストに等しくなります。
    #[inline(always)]
    pub const fn word_cost_delta(&self) -> i32 {
        self.word_cost_delta
    }

    pub fn set_surface<S>(&mut self, surface: S)
    where
        S: Into<String>,
    {
        self.surface = surface.into();
    }

    pub fn set_start(&mut self, start: usize) {
        self.start = start;
    }

    pub fn set_length(&mut self, length: usize) {
        self.length = length;
    }

    pub fn set_cost(&mut self, cost: i32) {
        self.cost = cost;
    }

    pub fn set_morpheme(&mut self, morpheme: Morpheme) {
        self.morpheme = morpheme;
    }

    pub fn set_sentence_start(&mut self, yes: bool) {
        self.sentence_start = yes;
    }

    pub(crate) fn set_word_cost_delta(&mut self, delta: i32) {
        self.word_cost_delta = delta;
    }
}
