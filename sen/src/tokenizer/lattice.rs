//! ラティス（格子）構造の実装モジュール。
//!
//! ノードはアリーナ(`Vec<Node>`)に格納され、インデックスで参照されます。
//! `ends[p]`は位置`p`で終わるノードのインデックスを挿入順に保持し、
//! 右側ノードの最小コストの先行ノードを探す際の探索対象になります。
use crate::dictionary::connector::ConnectorCost;
use crate::dictionary::CharClass;
use crate::errors::{Result, SenError};

/// ノードが指す単語
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordRef {
    /// 文頭
    Bos,
    /// 文末
    Eos,
    /// 辞書語（形態素ID）
    Known(u32),
    /// 未知語
    Unknown(CharClass),
    /// 読み制約を満たすために合成された単語
    Constrained,
}

/// ラティス内のノード。
#[derive(Debug, Clone)]
pub struct Node {
    /// 単語
    pub word: WordRef,
    /// ノードの開始位置（読み飛ばした空白を含む、文字単位）
    pub start_node: usize,
    /// 単語の開始位置（文字単位）
    pub start_word: usize,
    /// 単語の長さ（文字単位）
    pub length: usize,
    /// 左文脈ID
    pub left_id: u16,
    /// 右文脈ID
    pub right_id: u16,
    /// 第2右文脈ID。0以外の場合、後続の読み制約を先読みします。
    pub right_id2: u16,
    /// 生起コスト
    pub word_cost: i16,
    /// BOSからこのノードまでの最小コスト
    pub cost: i32,
    /// 最小コストの先行ノード
    pub prev: Option<usize>,
    /// 最良経路上の後続ノード。バックトレースでのみ設定されます。
    pub next: Option<usize>,
}

impl Node {
    /// 単語の終了位置（文字単位、排他的）
    #[inline(always)]
    pub const fn end(&self) -> usize {
        self.start_word + self.length
    }

    /// `left`の直後に置いた場合の累積コストを計算します。
    #[inline(always)]
    fn cost_after<C>(&self, left: &Node, connector: &C) -> i32
    where
        C: ConnectorCost,
    {
        left.cost + connector.cost(left.right_id, self.left_id) + i32::from(self.word_cost)
    }
}

/// ビタビ探索のためのラティス構造体。
#[derive(Default)]
pub struct Lattice {
    nodes: Vec<Node>,
    ends: Vec<Vec<usize>>,
    eos: Option<usize>,
    len_char: usize,
}

impl Lattice {
    /// ラティスをリセットし、BOSノードを挿入します。
    ///
    /// # 引数
    ///
    /// * `len_char` - 新しい文の文字数
    /// * `bos` - BOSノード
    pub fn reset(&mut self, len_char: usize, bos: Node) {
        self.nodes.clear();
        for v in self.ends.iter_mut() {
            v.clear();
        }
        if self.ends.len() <= len_char {
            self.ends.resize_with(len_char + 1, || Vec::with_capacity(16));
        }
        self.len_char = len_char;
        self.eos = None;
        self.nodes.push(bos);
        self.ends[0].push(0);
    }

    /// 設定された文の文字数を返します。
    #[inline(always)]
    pub const fn len_char(&self) -> usize {
        self.len_char
    }

    /// ノード数を返します。
    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// ノードを返します。
    #[inline(always)]
    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// 位置`pos`で終わるノードがあるかどうかを返します。
    #[inline(always)]
    pub fn has_ends(&self, pos: usize) -> bool {
        !self.ends[pos].is_empty()
    }

    /// 位置`pos`で終わるノードの中から、`node`に接続したときに最小コストとなるものを探します。
    ///
    /// 最後に挿入されたノードから順に走査し、同じコストの場合は後に走査したもの
    /// （先に挿入されたもの）を選びます。
    fn search_min_node<C>(&self, pos: usize, node: &Node, connector: &C) -> (Option<usize>, i32)
    where
        C: ConnectorCost,
    {
        let mut min_idx = None;
        let mut min_cost = i32::MAX;
        for &idx in self.ends[pos].iter().rev() {
            let cost = node.cost_after(&self.nodes[idx], connector);
            if cost <= min_cost {
                min_idx = Some(idx);
                min_cost = cost;
            }
        }
        (min_idx, min_cost)
    }

    fn push(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        self.ends[node.end()].push(idx);
        self.nodes.push(node);
        idx
    }

    /// 位置`pos`で終わるノードのうち最小コストのものを先行ノードとして、ノードを挿入します。
    ///
    /// # 戻り値
    ///
    /// 挿入されたノードのインデックス
    pub fn insert<C>(&mut self, pos: usize, mut node: Node, connector: &C) -> usize
    where
        C: ConnectorCost,
    {
        debug_assert!(node.end() <= self.len_char);
        let (min_idx, min_cost) = self.search_min_node(pos, &node, connector);
        node.prev = min_idx;
        node.cost = min_cost;
        self.push(node)
    }

    /// 先行ノードを`prev`に固定してノードを挿入します。
    ///
    /// # 戻り値
    ///
    /// 挿入されたノードのインデックス
    pub fn insert_after<C>(&mut self, prev: usize, mut node: Node, connector: &C) -> usize
    where
        C: ConnectorCost,
    {
        debug_assert!(node.end() <= self.len_char);
        node.cost = node.cost_after(&self.nodes[prev], connector);
        node.prev = Some(prev);
        self.push(node)
    }

    /// EOSノードを、ノードが終わる最も後ろの位置に接続します。
    ///
    /// # 引数
    ///
    /// * `eos` - EOSノードの雛形。開始位置はこの関数で設定されます。
    pub fn insert_eos<C>(&mut self, mut eos: Node, connector: &C)
    where
        C: ConnectorCost,
    {
        // ends[0] always holds BOS.
        let pos = (0..=self.len_char)
            .rev()
            .find(|&p| self.has_ends(p))
            .unwrap_or(0);
        let (min_idx, min_cost) = self.search_min_node(pos, &eos, connector);
        eos.start_node = pos;
        eos.start_word = pos;
        eos.length = 0;
        eos.prev = min_idx;
        eos.cost = min_cost;
        self.eos = Some(self.nodes.len());
        self.nodes.push(eos);
    }

    /// EOSまでの最小コストを返します。
    #[inline(always)]
    pub fn eos_cost(&self) -> Option<i32> {
        self.eos.map(|idx| self.nodes[idx].cost)
    }

    /// EOSから先行ノードを辿って後続リンクを設定し、BOSとEOSを除く最良経路を返します。
    ///
    /// # エラー
    ///
    /// EOSが挿入されていない場合、またはBOS以外のノードが先行ノードを持たない場合、
    /// [`SenError::InternalLattice`]が返されます。
    pub fn backtrace(&mut self) -> Result<Vec<usize>> {
        let mut idx = self
            .eos
            .ok_or_else(|| SenError::internal_lattice("EOS is not connected."))?;
        while idx != 0 {
            let prev = self.nodes[idx].prev.ok_or_else(|| {
                SenError::internal_lattice(format!(
                    "the node at {}..{} has no predecessor.",
                    self.nodes[idx].start_word,
                    self.nodes[idx].end()
                ))
            })?;
            self.nodes[prev].next = Some(idx);
            // Predecessors are always inserted before their successors.
            debug_assert!(prev < idx);
            idx = prev;
        }

        let mut path = vec![];
        let mut node = self.nodes[0].next;
        while let Some(idx) = node {
            let next = self.nodes[idx].next;
            if next.is_none() {
                break;
            }
            path.push(idx);
            node = next;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::connector::ConnectorView;

    struct ZeroConnector;

    impl ConnectorView for ZeroConnector {
        fn num_left(&self) -> usize {
            1
        }
        fn num_right(&self) -> usize {
            1
        }
    }

    impl ConnectorCost for ZeroConnector {
        fn cost(&self, _right_id: u16, _left_id: u16) -> i32 {
            0
        }
    }

    fn node(start: usize, length: usize, word_cost: i16) -> Node {
        Node {
            word: WordRef::Bos,
            start_node: start,
            start_word: start,
            length,
            left_id: 0,
            right_id: 0,
            right_id2: 0,
            word_cost,
            cost: 0,
            prev: None,
            next: None,
        }
    }

    #[test]
    fn test_best_path() {
        let mut lattice = Lattice::default();
        lattice.reset(2, node(0, 0, 0));
        let a = lattice.insert(0, node(0, 1, 10), &ZeroConnector);
        let ab = lattice.insert(0, node(0, 2, 5), &ZeroConnector);
        let b = lattice.insert(1, node(1, 1, 10), &ZeroConnector);
        lattice.insert_eos(node(0, 0, 0), &ZeroConnector);

        assert_eq!(lattice.node(b).cost, 20);
        assert_eq!(lattice.node(b).prev, Some(a));
        assert_eq!(lattice.eos_cost(), Some(5));
        assert_eq!(lattice.backtrace().unwrap(), vec![ab]);
    }

    #[test]
    fn test_tie_prefers_earlier_insertion() {
        let mut lattice = Lattice::default();
        lattice.reset(2, node(0, 0, 0));
        let first = lattice.insert(0, node(0, 2, 5), &ZeroConnector);
        let _second = lattice.insert(0, node(0, 2, 5), &ZeroConnector);
        lattice.insert_eos(node(0, 0, 0), &ZeroConnector);
        assert_eq!(lattice.backtrace().unwrap(), vec![first]);
    }

    #[test]
    fn test_eos_attaches_to_last_nonempty_slot() {
        let mut lattice = Lattice::default();
        lattice.reset(3, node(0, 0, 0));
        let a = lattice.insert(0, node(0, 1, 1), &ZeroConnector);
        lattice.insert_eos(node(0, 0, 0), &ZeroConnector);
        assert_eq!(lattice.backtrace().unwrap(), vec![a]);
    }

    #[test]
    fn test_empty() {
        let mut lattice = Lattice::default();
        lattice.reset(0, node(0, 0, 0));
        lattice.insert_eos(node(0, 0, 0), &ZeroConnector);
        assert_eq!(lattice.eos_cost(), Some(0));
        assert!(lattice.backtrace().unwrap().is_empty());
    }

    #[test]
    fn test_missing_predecessor() {
        let mut lattice = Lattice::default();
        lattice.reset(1, node(0, 0, 0));
        lattice.insert_eos(node(0, 0, 0), &ZeroConnector);
        let eos = lattice.eos.unwrap();
        lattice.nodes[eos].prev = None;
        assert!(matches!(
            lattice.backtrace(),
            Err(SenError::InternalLattice(_))
        ));
    }

    #[test]
    fn test_reuse() {
        let mut lattice = Lattice::default();
        lattice.reset(4, node(0, 0, 0));
        lattice.insert(0, node(0, 4, 1), &ZeroConnector);
        lattice.reset(1, node(0, 0, 0));
        assert_eq!(lattice.num_nodes(), 1);
        assert!(!lattice.has_ends(1));
    }
}
