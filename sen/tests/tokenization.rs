//! 公開APIを通した形態素解析のテスト
//!
//! ディスクに書き出した辞書を読み込み、解析結果とスレッド間での辞書の共有を検証します。

use std::path::Path;
use std::sync::Arc;
use std::thread;

use tempfile::tempdir;

use sen::{Dictionary, DictionaryBuilder, Morpheme, Reading, Sentence, Tagger, Tokenizer, Viterbi, WordParam};

fn write_ab_dictionary(dir: &Path) {
    let mut builder = DictionaryBuilder::new(2, 2);
    builder
        .bos(WordParam::new(1, 1, 0))
        .unwrap()
        .eos(WordParam::new(1, 1, 0))
        .unwrap();
    for (surface, cost) in [("a", 10), ("ab", 5), ("b", 10)] {
        builder
            .add_entry(
                surface,
                WordParam::new(1, 1, cost),
                Morpheme::new("名詞").with_readings([surface.to_uppercase()]),
            )
            .unwrap();
    }
    builder.write(dir).unwrap();
}

fn write_japanese_dictionary(dir: &Path) {
    let mut builder = DictionaryBuilder::new(3, 3);
    builder
        .connection_cost(1, 2, -50)
        .unwrap()
        .connection_cost(2, 1, -30)
        .unwrap()
        .unknown(WordParam::new(1, 1, 2000), Morpheme::new("未知語"))
        .unwrap();
    let entries = [
        ("すもも", 1, 1, 300, "名詞", "スモモ"),
        ("も", 2, 2, 120, "助詞", "モ"),
        ("もも", 1, 1, 280, "名詞", "モモ"),
        ("の", 2, 2, 90, "助詞", "ノ"),
        ("うち", 1, 1, 350, "名詞", "ウチ"),
        ("うち", 1, 1, 500, "名詞", "ウチ"),
        ("。", 2, 2, 10, "記号", "。"),
    ];
    for (surface, left_id, right_id, cost, pos, reading) in entries {
        builder
            .add_entry(
                surface,
                WordParam::new(left_id, right_id, cost),
                Morpheme::new(pos).with_base_form(surface).with_readings([reading]),
            )
            .unwrap();
    }
    builder.write(dir).unwrap();
}

#[test]
fn test_ab_from_disk() {
    let dir = tempdir().unwrap();
    write_ab_dictionary(dir.path());
    let dict = Dictionary::open(dir.path()).unwrap();
    let mut viterbi = Viterbi::new(Tokenizer::new(dict));

    let tokens = viterbi.best_tokens(&Sentence::new("ab")).unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].surface(), "ab");
    assert_eq!(tokens[0].range_char(), 0..2);
    assert_eq!(tokens[0].cost(), 5);
    assert_eq!(tokens[0].morpheme().readings(), &["AB".to_string()]);

    let bos = viterbi.tokenizer().bos_node();
    assert_eq!((bos.left_id, bos.right_id), (1, 1));
    let eos = viterbi.tokenizer().eos_node(2);
    assert_eq!((eos.left_id, eos.right_id, eos.word_cost), (1, 1, 0));
}

#[test]
fn test_japanese_sentence() {
    let dir = tempdir().unwrap();
    write_japanese_dictionary(dir.path());
    let mut viterbi = Viterbi::new(Tokenizer::new(Dictionary::open(dir.path()).unwrap()));

    let tokens = viterbi.best_tokens(&Sentence::new("すもももももももものうち")).unwrap();
    let surfaces: Vec<_> = tokens.iter().map(|t| t.surface()).collect();
    assert_eq!(
        surfaces,
        vec!["すもも", "も", "もも", "も", "もも", "の", "うち"]
    );
    assert_eq!(tokens[1].feature(), "助詞,*,*,も,モ,*");
    assert_eq!(tokens[6].morpheme().cost(), 350);
}

#[test]
fn test_reading_constraint_from_disk() {
    let dir = tempdir().unwrap();
    write_japanese_dictionary(dir.path());
    let mut viterbi = Viterbi::new(Tokenizer::new(Dictionary::open(dir.path()).unwrap()));

    let mut sentence = Sentence::new("すもものうち");
    sentence.add_reading(Reading::new(4, 2, "ナカ")).unwrap();
    let tokens = viterbi.best_tokens(&sentence).unwrap();
    let last = tokens.last().unwrap();
    assert_eq!(last.surface(), "うち");
    assert_eq!(last.morpheme().pos(), "未知語");
    assert_eq!(last.morpheme().readings(), &["ナカ".to_string()]);
}

#[test]
fn test_shared_dictionary_across_threads() {
    let dir = tempdir().unwrap();
    write_japanese_dictionary(dir.path());
    let dict = Arc::new(Dictionary::open(dir.path()).unwrap());
    let inputs = ["すもももももももものうち", "もものうち。", "すももXYZもも", ""];

    let mut viterbi = Viterbi::new(Tokenizer::from_shared_dictionary(dict.clone()));
    let expected: Vec<_> = inputs
        .iter()
        .map(|s| viterbi.best_tokens(&Sentence::new(*s)).unwrap())
        .collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dict = dict.clone();
            thread::spawn(move || {
                let mut viterbi = Viterbi::new(Tokenizer::from_shared_dictionary(dict));
                inputs
                    .iter()
                    .map(|s| viterbi.best_tokens(&Sentence::new(*s)).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_tagger_multiple_sentences() {
    let dir = tempdir().unwrap();
    write_japanese_dictionary(dir.path());
    let mut tagger = Tagger::new(Tokenizer::new(Dictionary::open(dir.path()).unwrap()));

    let tokens = tagger.analyze("もものうち。すもものうち").unwrap();
    let starts: Vec<_> = tokens
        .iter()
        .filter(|t| t.is_sentence_start())
        .map(|t| (t.surface(), t.start()))
        .collect();
    assert_eq!(starts, vec![("もも", 0), ("すもも", 6)]);

    let text: Vec<char> = "もものうち。すもものうち".chars().collect();
    for t in &tokens {
        let surface: String = text[t.range_char()].iter().collect();
        assert_eq!(surface, t.surface());
    }
}
