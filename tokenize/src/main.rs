//! 形態素解析を実行するコマンド
//!
//! 標準入力から1行ずつ読み込んだテキストを形態素解析し、
//! 指定された出力形式（mecab、wakati、detail）で結果を出力します。

use std::error::Error;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use sen::{Dictionary, Tagger, Token, Tokenizer};

use clap::{Parser, ValueEnum};

/// 出力モード
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    /// 表層形と素性をタブ区切りで出力し、文末にEOSを出力します。
    Mecab,
    /// 表層形を空白区切りで出力します。
    Wakati,
    /// 位置、文脈ID、コストを含むすべての情報を出力します。
    Detail,
}

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "tokenize", about = "Splits Japanese text into morphemes")]
struct Args {
    /// Directory containing the compiled dictionary files.
    #[arg(short = 'i', long, env = "SEN_DICDIR")]
    dicdir: PathBuf,

    /// Output mode.
    #[arg(short = 'O', long, value_enum, default_value_t = OutputMode::Mecab)]
    output_mode: OutputMode,

    /// Ignores white spaces in input strings.
    #[arg(short = 'S', long)]
    ignore_space: bool,

    /// Maximum length of unknown words. 0 means unlimited.
    #[arg(short = 'M', long, default_value_t = 0)]
    max_grouping_len: usize,
}

/// 1行分の解析結果を指定された形式で書き出します。
fn write_tokens<W: Write>(out: &mut W, mode: OutputMode, tokens: &[Token]) -> io::Result<()> {
    match mode {
        OutputMode::Mecab => {
            for t in tokens {
                writeln!(out, "{}\t{}", t.surface(), t.feature())?;
            }
            out.write_all(b"EOS\n")
        }
        OutputMode::Wakati => {
            let surfaces: Vec<_> = tokens.iter().map(Token::surface).collect();
            writeln!(out, "{}", surfaces.join(" "))
        }
        OutputMode::Detail => {
            for t in tokens {
                let m = t.morpheme();
                writeln!(
                    out,
                    "{}\t{}\tstart={}\tleft_id={}\tright_id={}\tword_cost={}\ttotal_cost={}\tdelta={}\tsentence_start={}",
                    t.surface(),
                    t.feature(),
                    t.start(),
                    m.left_id(),
                    m.right_id(),
                    m.cost(),
                    t.cost(),
                    t.word_cost_delta(),
                    t.is_sentence_start(),
                )?;
            }
            out.write_all(b"EOS\n")
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the dictionary from {}...", args.dicdir.display());
    let dict = Dictionary::open(&args.dicdir)?;

    let tokenizer = Tokenizer::new(dict)
        .ignore_space(args.ignore_space)
        .max_grouping_len(args.max_grouping_len);
    let mut tagger = Tagger::new(tokenizer);

    eprintln!("Ready to tokenize");

    let flush_each_line = atty::is(atty::Stream::Stdout);
    let mut out = BufWriter::new(io::stdout().lock());
    for line in io::stdin().lock().lines() {
        let tokens = tagger.analyze(&line?)?;
        write_tokens(&mut out, args.output_mode, &tokens)?;
        if flush_each_line {
            out.flush()?;
        }
    }
    out.flush()?;

    Ok(())
}
