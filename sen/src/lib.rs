//! # Sen
//!
//! Senは、ビタビアルゴリズムに基づく日本語の形態素解析器です。
//!
//! ## 概要
//!
//! 辞書はバイナリ形式のファイル群としてディレクトリに格納され、メモリマップで読み込まれます。
//! 読み込み時に一度だけ内容を検証するため、その後の辞書引きと解析は失敗しません。
//!
//! ## 主な機能
//!
//! - **最小コスト分割**: 生起コストと接続コストの和を最小にする分割をビタビアルゴリズムで求めます
//! - **未知語処理**: 辞書に無い文字列は同じ文字種の連続としてまとめます
//! - **読み制約**: 文の区間に読みを指定し、その区間を1つのトークンで覆わせます
//! - **辞書の構築**: メモリ上の辞書語からバイナリ形式の辞書を生成します
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use sen::{DictionaryBuilder, Morpheme, Reading, Sentence, Tokenizer, Viterbi, WordParam};
//!
//! let mut builder = DictionaryBuilder::new(2, 2);
//! builder
//!     .unknown(WordParam::new(1, 1, 1000), Morpheme::new("未知語"))?
//!     .add_entry(
//!         "京都",
//!         WordParam::new(1, 1, 5),
//!         Morpheme::new("名詞").with_readings(["キョウト"]),
//!     )?
//!     .add_entry(
//!         "東京都",
//!         WordParam::new(1, 1, 9),
//!         Morpheme::new("名詞").with_readings(["トウキョウト"]),
//!     )?
//!     .add_entry(
//!         "東京",
//!         WordParam::new(1, 1, 9),
//!         Morpheme::new("名詞").with_readings(["トウキョウ"]),
//!     )?;
//! let dict = builder.build_dictionary()?;
//!
//! let mut viterbi = Viterbi::new(Tokenizer::new(dict));
//!
//! let tokens = viterbi.best_tokens(&Sentence::new("京都東京都"))?;
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[0].surface(), "京都");
//! assert_eq!(tokens[0].range_char(), 0..2);
//! assert_eq!(tokens[1].surface(), "東京都");
//! assert_eq!(tokens[1].feature(), "名詞,*,*,*,トウキョウト,*");
//!
//! let mut sentence = Sentence::new("東京都");
//! sentence.add_reading(Reading::new(0, 2, "トウキョウ"))?;
//! let tokens = viterbi.best_tokens(&sentence)?;
//! assert_eq!(tokens[0].surface(), "東京");
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 辞書データ構造とビルダー
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 文の内部表現
pub mod sentence;

/// 複数の文を含むテキストの解析
pub mod tagger;

/// トークン型の定義
pub mod token;

/// トークナイザーの実装
pub mod tokenizer;

/// 内部ユーティリティ関数
pub mod utils;


// Re-exports
pub use dictionary::{Dictionary, DictionaryBuffers, DictionaryBuilder, Morpheme, WordParam};
pub use sentence::{Reading, Sentence};
pub use tagger::Tagger;
pub use token::Token;
pub use tokenizer::{Tokenizer, Viterbi};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
