//! 解析結果の性質に関するテスト
//!
//! 小さな辞書に対する全探索との比較、区間の被覆、読み制約、同点時の選択などを検証します。

use crate::dictionary::{Dictionary, DictionaryBuilder, Morpheme, WordParam};
use crate::sentence::{Reading, Sentence};
use crate::token::Token;
use crate::tokenizer::{Tokenizer, Viterbi};

/// (表層形, 左文脈ID, 右文脈ID, 生起コスト)
const ENTRIES: &[(&str, u16, u16, i16)] = &[
    ("a", 1, 1, 30),
    ("a", 2, 2, 40),
    ("b", 1, 2, 35),
    ("ab", 2, 1, 50),
    ("ba", 1, 1, 45),
];

/// 3x3の接続コスト行列（行: 左側の右文脈ID、列: 右側の左文脈ID）
const MATRIX: [[i16; 3]; 3] = [[0, 10, -5], [7, -20, 15], [3, 12, -8]];

fn matrix_dictionary() -> Dictionary {
    let mut builder = DictionaryBuilder::new(3, 3);
    for (right_id, row) in MATRIX.iter().enumerate() {
        for (left_id, &cost) in row.iter().enumerate() {
            builder
                .connection_cost(right_id as u16, left_id as u16, cost)
                .unwrap();
        }
    }
    for &(surface, left_id, right_id, cost) in ENTRIES {
        builder
            .add_entry(
                surface,
                WordParam::new(left_id, right_id, cost),
                Morpheme::new("名詞").with_readings([surface.to_uppercase()]),
            )
            .unwrap();
    }
    builder.build_dictionary().unwrap()
}

fn toy_viterbi(entries: &[(&str, i16)]) -> Viterbi {
    let mut builder = DictionaryBuilder::new(2, 2);
    builder
        .unknown(WordParam::new(1, 1, 1000), Morpheme::new("未知語"))
        .unwrap();
    for &(surface, cost) in entries {
        builder
            .add_entry(
                surface,
                WordParam::new(1, 1, cost),
                Morpheme::new("名詞").with_readings([surface.to_uppercase()]),
            )
            .unwrap();
    }
    Viterbi::new(Tokenizer::new(builder.build_dictionary().unwrap()))
}

/// すべての分割を列挙して最小コストを求めます。BOSとEOSの文脈IDは0です。
fn brute_force_min(input: &str, prev_right: u16) -> Option<i32> {
    if input.is_empty() {
        return Some(i32::from(MATRIX[usize::from(prev_right)][0]));
    }
    ENTRIES
        .iter()
        .filter(|(surface, ..)| input.starts_with(surface))
        .filter_map(|&(surface, left_id, right_id, cost)| {
            let rest = brute_force_min(&input[surface.len()..], right_id)?;
            let conn = MATRIX[usize::from(prev_right)][usize::from(left_id)];
            Some(i32::from(conn) + i32::from(cost) + rest)
        })
        .min()
}

fn path_sum(tokens: &[Token]) -> i32 {
    let mut prev_right = 0;
    let mut sum = 0;
    for t in tokens {
        let m = t.morpheme();
        sum += i32::from(MATRIX[usize::from(prev_right)][usize::from(m.left_id())]);
        sum += i32::from(m.cost());
        prev_right = m.right_id();
    }
    sum + i32::from(MATRIX[usize::from(prev_right)][0])
}

fn all_strings(max_len: usize) -> Vec<String> {
    let mut out = vec![];
    let mut layer = vec![String::new()];
    for _ in 0..max_len {
        layer = layer
            .iter()
            .flat_map(|s| [format!("{s}a"), format!("{s}b")])
            .collect();
        out.extend(layer.iter().cloned());
    }
    out
}

fn assert_covers(tokens: &[Token], len: usize) {
    let mut pos = 0;
    for t in tokens {
        assert_eq!(t.start(), pos, "gap or overlap before {:?}", t.surface());
        assert!(t.length() > 0);
        pos = t.range_char().end;
    }
    assert_eq!(pos, len);
}

#[test]
fn test_optimal_against_brute_force() {
    let mut viterbi = Viterbi::new(Tokenizer::new(matrix_dictionary()));
    for input in all_strings(6) {
        let tokens = viterbi.best_tokens(&Sentence::new(input.as_str())).unwrap();
        let expected = brute_force_min(&input, 0).unwrap();
        assert_eq!(viterbi.path_cost(), Some(expected), "input: {input}");
        assert_eq!(path_sum(&tokens), expected, "input: {input}");
        let concat: String = tokens.iter().map(|t| t.surface()).collect();
        assert_eq!(concat, input);
    }
}

#[test]
fn test_cumulative_costs() {
    let mut viterbi = Viterbi::new(Tokenizer::new(matrix_dictionary()));
    let tokens = viterbi.best_tokens(&Sentence::new("abba")).unwrap();
    let eos = viterbi.path_cost().unwrap();
    let last = tokens.last().unwrap();
    let to_eos = i32::from(MATRIX[usize::from(last.morpheme().right_id())][0]);
    assert_eq!(last.cost() + to_eos, eos);
    let first = &tokens[0];
    let from_bos = i32::from(MATRIX[0][usize::from(first.morpheme().left_id())]);
    assert_eq!(first.cost(), from_bos + i32::from(first.morpheme().cost()));
}

#[test]
fn test_coverage_with_unknown_words() {
    let mut viterbi = toy_viterbi(&[("東京", 100), ("に", 50), ("行く", 120)]);
    for input in ["東京に行く", "東京にABCで行く", "123東京 に", "、、。", "ｶﾀｶﾅ"] {
        let sentence = Sentence::new(input);
        let tokens = viterbi.best_tokens(&sentence).unwrap();
        assert_covers(&tokens, sentence.len_char());
    }
}

#[test]
fn test_deterministic() {
    let dict = std::sync::Arc::new(matrix_dictionary());
    let mut v1 = Viterbi::new(Tokenizer::from_shared_dictionary(dict.clone()));
    let mut v2 = Viterbi::new(Tokenizer::from_shared_dictionary(dict));
    for input in all_strings(4) {
        let sentence = Sentence::new(input.as_str());
        assert_eq!(
            v1.best_tokens(&sentence).unwrap(),
            v2.best_tokens(&sentence).unwrap()
        );
    }
}

#[test]
fn test_unknown_word_run() {
    let mut viterbi = toy_viterbi(&[("は", 10)]);
    let tokens = viterbi.best_tokens(&Sentence::new("テスト")).unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].surface(), "テスト");
    assert_eq!(tokens[0].morpheme().pos(), "未知語");
    assert_eq!(tokens[0].cost(), 1000);

    let tokens = viterbi.best_tokens(&Sentence::new("テストは漢字")).unwrap();
    let surfaces: Vec<_> = tokens.iter().map(|t| t.surface()).collect();
    assert_eq!(surfaces, vec!["テスト", "は", "漢字"]);
}

#[test]
fn test_max_grouping_len() {
    let builder = DictionaryBuilder::new(1, 1);
    let tokenizer = Tokenizer::new(builder.build_dictionary().unwrap()).max_grouping_len(2);
    let mut viterbi = Viterbi::new(tokenizer);
    let tokens = viterbi.best_tokens(&Sentence::new("abcde")).unwrap();
    let surfaces: Vec<_> = tokens.iter().map(|t| t.surface()).collect();
    assert_eq!(surfaces, vec!["ab", "cd", "e"]);
}

#[test]
fn test_unknown_pos_override() {
    let builder = DictionaryBuilder::new(1, 1);
    let tokenizer = Tokenizer::new(builder.build_dictionary().unwrap()).unknown_pos("名詞");
    let mut viterbi = Viterbi::new(tokenizer);
    let tokens = viterbi.best_tokens(&Sentence::new("xyz")).unwrap();
    assert_eq!(tokens[0].morpheme().pos(), "名詞");
    assert_eq!(tokens[0].feature(), "名詞,*,*,*,*,*");
}

#[test]
fn test_tie_prefers_earlier_predecessor() {
    let mut viterbi = toy_viterbi(&[("a", 5), ("b", 5), ("ab", 10)]);
    let tokens = viterbi.best_tokens(&Sentence::new("ab")).unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].surface(), "ab");
    assert_eq!(viterbi.path_cost(), Some(10));
}

#[test]
fn test_constraints_are_satisfied() {
    let mut viterbi = Viterbi::new(Tokenizer::new(matrix_dictionary()));
    let cases: &[(&str, &[(usize, usize, &str)])] = &[
        ("abab", &[(0, 1, "A")]),
        ("abab", &[(1, 2, "BA")]),
        ("abab", &[(0, 2, "AB"), (2, 2, "AB")]),
        ("abab", &[(1, 1, "ビー")]),
        ("abba", &[(3, 1, "A"), (1, 2, "任意")]),
    ];
    for &(input, readings) in cases {
        let mut sentence = Sentence::new(input);
        for &(start, length, text) in readings {
            sentence.add_reading(Reading::new(start, length, text)).unwrap();
        }
        let tokens = viterbi.best_tokens(&sentence).unwrap();
        assert_covers(&tokens, sentence.len_char());
        for r in sentence.readings() {
            let covering: Vec<_> = tokens
                .iter()
                .filter(|t| t.start() == r.start && t.length() == r.length)
                .collect();
            assert_eq!(covering.len(), 1, "{r} in {input}");
            assert!(covering[0].morpheme().readings().contains(&r.text), "{r} in {input}");
        }
    }
}

#[test]
fn test_synthesized_node_carries_template_info() {
    let mut builder = DictionaryBuilder::new(2, 2);
    builder
        .unknown(
            WordParam::new(1, 1, 700),
            Morpheme::new("未知語").with_additional_info("synthetic"),
        )
        .unwrap()
        .add_entry("日本", WordParam::new(1, 1, 10), Morpheme::new("名詞").with_readings(["ニホン"]))
        .unwrap();
    let mut viterbi = Viterbi::new(Tokenizer::new(builder.build_dictionary().unwrap()));

    let mut sentence = Sentence::new("日本");
    sentence.add_reading(Reading::new(0, 2, "ニッポン")).unwrap();
    let tokens = viterbi.best_tokens(&sentence).unwrap();
    assert_eq!(tokens.len(), 1);
    let m = tokens[0].morpheme();
    assert_eq!(m.pos(), "未知語");
    assert_eq!(m.base_form(), "*");
    assert_eq!(m.readings(), &["ニッポン".to_string()]);
    assert!(m.pronunciations().is_empty());
    assert_eq!(m.additional_info(), Some("synthetic"));
    assert_eq!(tokens[0].cost(), 700);

    // Plain unknown words do not carry the template's info.
    let tokens = viterbi.best_tokens(&Sentence::new("米国")).unwrap();
    assert_eq!(tokens[0].morpheme().additional_info(), None);
}

#[test]
fn test_possible_tokens_are_superset() {
    let mut viterbi = Viterbi::new(Tokenizer::new(matrix_dictionary()));
    for input in all_strings(5) {
        let sentence = Sentence::new(input.as_str());
        for t in viterbi.best_tokens(&sentence).unwrap() {
            let alternatives = viterbi.possible_tokens(&sentence, t.start());
            assert!(
                alternatives
                    .iter()
                    .any(|a| a.surface() == t.surface() && a.morpheme() == t.morpheme()),
                "{} at {} in {input}",
                t.surface(),
                t.start()
            );
        }
    }
}

#[test]
fn test_ignore_space() {
    let viterbi = toy_viterbi(&[("a", 10), ("b", 10)]);
    let tokenizer = viterbi.tokenizer().clone().ignore_space(true);
    let mut viterbi = Viterbi::new(tokenizer);

    let sentence = Sentence::new("a  b");
    let tokens = viterbi.best_tokens(&sentence).unwrap();
    let got: Vec<_> = tokens.iter().map(|t| (t.surface(), t.start())).collect();
    assert_eq!(got, vec![("a", 0), ("b", 3)]);

    // The skipped spaces belong to the span of the following node.
    let lattice = viterbi.lattice();
    let b = (0..lattice.num_nodes())
        .map(|i| lattice.node(i))
        .find(|n| n.start_word == 3 && n.length == 1)
        .unwrap();
    assert_eq!(b.start_node, 1);

    let mut plain = toy_viterbi(&[("a", 10), ("b", 10)]);
    let tokens = plain.best_tokens(&sentence).unwrap();
    let surfaces: Vec<_> = tokens.iter().map(|t| t.surface()).collect();
    assert_eq!(surfaces, vec!["a", "  ", "b"]);
}

#[test]
fn test_empty_sentence() {
    let mut viterbi = Viterbi::new(Tokenizer::new(matrix_dictionary()));
    assert!(viterbi.best_tokens(&Sentence::new("")).unwrap().is_empty());
    assert!(viterbi.possible_tokens(&Sentence::new(""), 0).is_empty());
}
