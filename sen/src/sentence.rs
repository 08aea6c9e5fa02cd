//! 入力テキストの内部表現を提供するモジュール
//!
//! 入力文字列を文字単位に分割し、文字位置からバイト位置への対応表と、
//! 区間ごとの読み制約を保持します。[`SentenceIterator`]は、
//! ラティスに単語を置く起点となる文字位置（オリジン）を順に返します。

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound::{Excluded, Unbounded};

use crate::dictionary::CharClass;
use crate::errors::{Result, SenError};

/// 区間に課される読みの制約
///
/// `start`から`length`文字の区間が、読みとして`text`を持つ形態素で
/// 覆われることを要求します。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reading {
    /// 区間の開始位置（文字単位）
    pub start: usize,
    /// 区間の長さ（文字単位）
    pub length: usize,
    /// 要求される読み
    pub text: String,
}

impl Reading {
    /// 新しい読み制約を作成します。
    pub fn new<S>(start: usize, length: usize, text: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            start,
            length,
            text: text.into(),
        }
    }

    /// 区間の終了位置（文字単位、排他的）
    ///
    /// 桁あふれする場合は`usize::MAX`に飽和します。
    #[inline(always)]
    pub const fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Reading:{{{}:{}:{}}}", self.start, self.length, self.text)
    }
}

/// 入力テキストの内部表現を保持する構造体
///
/// # 例
///
/// ```
/// use sen::{Reading, Sentence};
///
/// let mut sentence = Sentence::new("今日は");
/// sentence.add_reading(Reading::new(0, 2, "キョウ"))?;
/// assert_eq!(sentence.len_char(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Default, Clone, Debug)]
pub struct Sentence {
    input: String,
    chars: Vec<char>,
    c2b: Vec<usize>,
    readings: BTreeMap<usize, Reading>,
}

impl Sentence {
    /// 入力文字列から新しい文を作成します。
    pub fn new<S>(input: S) -> Self
    where
        S: Into<String>,
    {
        let mut sent = Self::default();
        sent.set_sentence(input);
        sent
    }

    /// 入力文字列を設定します。
    ///
    /// 既存の読み制約はすべて削除されます。
    pub fn set_sentence<S>(&mut self, input: S)
    where
        S: Into<String>,
    {
        self.input = input.into();
        self.chars.clear();
        self.c2b.clear();
        self.readings.clear();
        for (bi, ch) in self.input.char_indices() {
            self.chars.push(ch);
            self.c2b.push(bi);
        }
        self.c2b.push(self.input.len());
    }

    /// 読み制約を追加します。
    ///
    /// # エラー
    ///
    /// 区間が空の場合、文の範囲を超える場合、または既存の制約と重なる場合、
    /// [`SenError`]が返されます。
    pub fn add_reading(&mut self, reading: Reading) -> Result<()> {
        let in_range = reading
            .start
            .checked_add(reading.length)
            .is_some_and(|end| end <= self.len_char());
        if reading.length == 0 || !in_range {
            return Err(SenError::invalid_argument(
                "reading",
                format!("{reading} is outside the sentence of {} chars.", self.len_char()),
            ));
        }
        // Stored readings never overlap, so only the last one starting
        // before the new end can collide.
        if let Some(other) = self
            .readings
            .range(..reading.end())
            .next_back()
            .map(|(_, r)| r)
            .filter(|r| reading.start < r.end())
        {
            return Err(SenError::invalid_argument(
                "reading",
                format!("{reading} overlaps {other}."),
            ));
        }
        self.readings.insert(reading.start, reading);
        Ok(())
    }

    /// 指定された位置から始まる読み制約を返します。
    #[inline(always)]
    pub fn reading_constraint(&self, pos_char: usize) -> Option<&Reading> {
        self.readings.get(&pos_char)
    }

    /// 読み制約の一覧を開始位置の順に返します。
    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.readings.values()
    }

    /// `pos_char`より後ろで最初に始まる読み制約の開始位置を返します。
    pub(crate) fn next_constraint_start(&self, pos_char: usize) -> Option<usize> {
        self.readings
            .range((Excluded(pos_char), Unbounded))
            .next()
            .map(|(&s, _)| s)
    }

    /// 元の入力文字列への参照を返します
    #[inline(always)]
    pub fn raw(&self) -> &str {
        &self.input
    }

    /// 文字配列への参照を返します
    #[inline(always)]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// 文字数を返します
    #[inline(always)]
    pub fn len_char(&self) -> usize {
        self.chars.len()
    }

    /// 空の文かどうかを返します
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// 指定された文字位置に対応するバイト位置を返します
    ///
    /// # 引数
    ///
    /// * `pos_char` - 文字位置（0始まり、文字数以下）
    #[inline(always)]
    pub fn byte_position(&self, pos_char: usize) -> usize {
        self.c2b[pos_char]
    }

    /// バイト位置に対応する文字位置を返します。
    ///
    /// 文字境界でないバイト位置に対しては`None`を返します。
    #[inline(always)]
    pub(crate) fn char_position(&self, pos_byte: usize) -> Option<usize> {
        self.c2b.binary_search(&pos_byte).ok()
    }

    /// 文字単位の区間に対応する部分文字列を返します。
    #[inline(always)]
    pub fn surface(&self, start: usize, length: usize) -> &str {
        &self.input[self.byte_position(start)..self.byte_position(start + length)]
    }

    /// 指定された位置の文字種を返します
    #[inline(always)]
    pub(crate) fn char_class(&self, pos_char: usize) -> CharClass {
        CharClass::of(self.chars[pos_char])
    }

    /// オリジンを順に返すイテレータを作成します。
    ///
    /// # 引数
    ///
    /// * `ignore_space` - `true`の場合、空白の連続を読み飛ばし、
    ///   後続のオリジンの`skipped`に含めます
    pub fn iter(&self, ignore_space: bool) -> SentenceIterator<'_> {
        SentenceIterator {
            sentence: self,
            cursor: 0,
            ignore_space,
        }
    }

    /// 新しいイテレータを`pos_char`まで進め、そこがオリジンであれば返します。
    pub(crate) fn origin_at(&self, pos_char: usize, ignore_space: bool) -> Option<Origin> {
        self.iter(ignore_space)
            .find(|o| o.position >= pos_char)
            .filter(|o| o.position == pos_char)
    }
}

/// 単語を置く起点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    /// 単語の開始位置（文字単位）
    pub position: usize,
    /// 直前に読み飛ばされた空白の文字数
    pub skipped: usize,
}

impl Origin {
    /// 読み飛ばされた文字を含むノードの開始位置
    #[inline(always)]
    pub const fn base(&self) -> usize {
        self.position - self.skipped
    }
}

/// オリジンを順に返すイテレータ
///
/// 読み制約のある区間の内部はオリジンになりません。
pub struct SentenceIterator<'a> {
    sentence: &'a Sentence,
    cursor: usize,
    ignore_space: bool,
}

impl Iterator for SentenceIterator<'_> {
    type Item = Origin;

    fn next(&mut self) -> Option<Origin> {
        let sent = self.sentence;
        let len = sent.len_char();
        let mut position = self.cursor;
        if self.ignore_space {
            while position < len
                && sent.char_class(position) == CharClass::Space
                && sent.reading_constraint(position).is_none()
            {
                position += 1;
            }
        }
        if position >= len {
            self.cursor = len;
            return None;
        }
        let origin = Origin {
            position,
            skipped: position - self.cursor,
        };
        self.cursor = match sent.reading_constraint(position) {
            Some(r) => r.end(),
            None => position + 1,
        };
        Some(origin)
    }
}
