//! ダブル配列トライによる共通接頭辞検索
//!
//! `trie.sen`は(base: i32, check: i32)の組を並べたダブル配列です。
//! 表層形のUTF-8バイト列を辿り、バイト`c`による遷移先は`base + c + 1`、
//! 遷移が有効なのは遷移先の`check`が遷移元の`base`と等しい場合です。
//! 終端はコード0による遷移で表し、終端セルの`base`に`-value - 1`を格納します。

use byteorder::{BigEndian, WriteBytesExt};

use crate::dictionary::record::read_i32_at;
use crate::errors::{Result, SenError};

/// 1ユニットのバイト数
pub(crate) const UNIT_LEN: usize = 8;

/// ダブル配列のバイト列へのビュー
#[derive(Clone, Copy)]
pub struct DoubleArray<'a> {
    units: &'a [u8],
}

/// トライマッチング結果
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct TrieMatch {
    /// 終端に格納された値
    pub value: u32,
    /// 一致した接頭辞のバイト長
    pub end_byte: usize,
}

impl<'a> DoubleArray<'a> {
    /// バッファを検証してビューを作成します。
    ///
    /// # エラー
    ///
    /// バッファ長がユニット長の倍数でない場合、または空の場合、[`SenError`]が返されます。
    pub(crate) fn new(units: &'a [u8]) -> Result<Self> {
        if units.is_empty() || units.len() % UNIT_LEN != 0 {
            return Err(SenError::resource(
                "trie.sen",
                format!(
                    "the length {} is not a positive multiple of {UNIT_LEN}.",
                    units.len()
                ),
            ));
        }
        Ok(Self { units })
    }

    /// 検証済みのバッファからビューを作成します。
    #[inline(always)]
    pub(crate) const fn from_validated(units: &'a [u8]) -> Self {
        Self { units }
    }

    /// ユニット数を返します。
    #[inline(always)]
    pub fn num_units(&self) -> usize {
        self.units.len() / UNIT_LEN
    }

    #[inline(always)]
    fn base(&self, i: usize) -> i32 {
        read_i32_at(self.units, i * UNIT_LEN).unwrap_or(0)
    }

    #[inline(always)]
    fn check(&self, i: usize) -> Option<i32> {
        read_i32_at(self.units, i * UNIT_LEN + 4)
    }

    /// 遷移先のセル番号を返します。
    #[inline(always)]
    fn transit(&self, b: i32, code: usize) -> Option<usize> {
        let p = usize::try_from(b).ok()?.checked_add(code)?;
        (self.check(p)? == b).then_some(p)
    }

    /// 共通接頭辞検索のイテレータを取得します。
    ///
    /// `input`の接頭辞に一致するすべての登録語を、短いものから順に返します。
    ///
    /// # 引数
    ///
    /// * `input` - 検索対象のバイト列
    #[inline(always)]
    pub fn common_prefix_iterator<'k>(&self, input: &'k [u8]) -> CommonPrefixIter<'a, 'k> {
        CommonPrefixIter {
            da: *self,
            input,
            b: Some(self.base(0)),
            depth: 0,
        }
    }

    /// 登録されているすべての値を返します。
    ///
    /// 辞書の読み込み時に、値が指すトークン範囲を検証するために使用されます。
    pub(crate) fn values(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.num_units()).filter_map(move |p| {
            let n = self.base(p);
            let is_terminal = i32::try_from(p).ok()? == self.check(p)? && n < 0;
            is_terminal.then(|| (-(n + 1)) as u32)
        })
    }
}

/// 共通接頭辞検索のイテレータ
pub struct CommonPrefixIter<'a, 'k> {
    da: DoubleArray<'a>,
    input: &'k [u8],
    b: Option<i32>,
    depth: usize,
}

impl Iterator for CommonPrefixIter<'_, '_> {
    type Item = TrieMatch;

    fn next(&mut self) -> Option<TrieMatch> {
        while let Some(b) = self.b {
            let depth = self.depth;
            let terminal = self
                .da
                .transit(b, 0)
                .map(|p| self.da.base(p))
                .filter(|&n| n < 0);

            self.b = self.input.get(depth).and_then(|&c| {
                let p = self.da.transit(b, usize::from(c) + 1)?;
                Some(self.da.base(p))
            });
            self.depth += 1;

            if let Some(n) = terminal {
                return Some(TrieMatch {
                    value: (-(n + 1)) as u32,
                    end_byte: depth,
                });
            }
        }
        None
    }
}

/// ダブル配列の構築器
///
/// キーはバイト列の辞書順でソートされ、重複がない必要があります。
#[derive(Default)]
pub struct DoubleArrayBuilder {
    base: Vec<i32>,
    check: Vec<i32>,
    used_cell: Vec<bool>,
    used_base: Vec<bool>,
    next_free: usize,
}

/// 兄弟ノード（同じ親を持つ遷移の集合）の一要素
struct Sibling {
    code: usize,
    left: usize,
    right: usize,
}

impl DoubleArrayBuilder {
    /// ソート済みのレコードからダブル配列を構築し、`trie.sen`のバイト列を返します。
    ///
    /// # 引数
    ///
    /// * `records` - (キー, 値)の組。キーは空でなく、昇順かつ重複なし
    ///
    /// # エラー
    ///
    /// キーの順序が不正な場合、または値が`i32`に収まらない場合、[`SenError`]が返されます。
    pub fn build<K>(records: &[(K, u32)]) -> Result<Vec<u8>>
    where
        K: AsRef<[u8]>,
    {
        for w in records.windows(2) {
            if w[0].0.as_ref() >= w[1].0.as_ref() {
                return Err(SenError::invalid_argument(
                    "records",
                    "keys must be sorted and unique.",
                ));
            }
        }
        for (k, v) in records {
            if k.as_ref().is_empty() {
                return Err(SenError::invalid_argument("records", "empty key."));
            }
            if i32::try_from(*v).is_err() {
                return Err(SenError::invalid_argument("records", "value is too large."));
            }
        }

        let mut b = Self::default();
        b.reserve(1);
        b.used_cell[0] = true;
        b.next_free = 1;
        if records.is_empty() {
            b.base[0] = 1;
        } else {
            let siblings = Self::fetch(records, 0, 0, records.len());
            let begin = b.insert(records, &siblings, 0)?;
            b.base[0] = begin;
        }

        let mut out = Vec::with_capacity(b.base.len() * UNIT_LEN);
        for (&base, &check) in b.base.iter().zip(&b.check) {
            out.write_i32::<BigEndian>(base)?;
            out.write_i32::<BigEndian>(check)?;
        }
        Ok(out)
    }

    fn reserve(&mut self, len: usize) {
        if self.base.len() < len {
            self.base.resize(len, 0);
            self.check.resize(len, 0);
            self.used_cell.resize(len, false);
            self.used_base.resize(len, false);
        }
    }

    fn fetch<K>(records: &[(K, u32)], depth: usize, left: usize, right: usize) -> Vec<Sibling>
    where
        K: AsRef<[u8]>,
    {
        let mut siblings: Vec<Sibling> = vec![];
        for (i, (key, _)) in records.iter().enumerate().take(right).skip(left) {
            let key = key.as_ref();
            let code = key.get(depth).map_or(0, |&c| usize::from(c) + 1);
            match siblings.last_mut() {
                Some(last) if last.code == code => last.right = i + 1,
                _ => siblings.push(Sibling {
                    code,
                    left: i,
                    right: i + 1,
                }),
            }
        }
        siblings
    }

    fn find_begin(&mut self, siblings: &[Sibling]) -> usize {
        let first = siblings[0].code;
        let mut begin = self.next_free.saturating_sub(first).max(1);
        loop {
            let last = begin + siblings[siblings.len() - 1].code;
            self.reserve(last + 1);
            let fits = !self.used_base[begin]
                && siblings.iter().all(|s| !self.used_cell[begin + s.code]);
            if fits {
                return begin;
            }
            begin += 1;
        }
    }

    fn insert<K>(&mut self, records: &[(K, u32)], siblings: &[Sibling], depth: usize) -> Result<i32>
    where
        K: AsRef<[u8]>,
    {
        let begin = self.find_begin(siblings);
        let begin_i32 = i32::try_from(begin)?;
        self.used_base[begin] = true;
        for s in siblings {
            self.used_cell[begin + s.code] = true;
            self.check[begin + s.code] = begin_i32;
        }
        while self.used_cell.get(self.next_free).copied().unwrap_or(false) {
            self.next_free += 1;
        }

        for s in siblings {
            let p = begin + s.code;
            if s.code == 0 {
                // A terminal sibling always holds exactly one record.
                let value = i32::try_from(records[s.left].1)?;
                self.base[p] = -value - 1;
            } else {
                let children = Self::fetch(records, depth + 1, s.left, s.right);
                self.base[p] = self.insert(records, &children, depth + 1)?;
            }
        }
        Ok(begin_i32)
    }
}
