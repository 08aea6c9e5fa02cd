//! 未知語処理のための文字種判定
//!
//! 辞書に見つからない文字列は、同じ文字種が連続する範囲をひとまとまりの
//! 未知語として扱います。

/// 文字種
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// 空白（半角・全角スペース、タブ、改行）
    Space,
    /// ひらがな
    Hiragana,
    /// カタカナ（長音記号を含む）
    Katakana,
    /// 漢字（々〆〇を含む）
    Kanji,
    /// ラテン文字（全角を含む）
    Alphabet,
    /// 数字（全角を含む）
    Digit,
    /// 記号・句読点
    Symbol,
    /// その他
    Other,
}

impl CharClass {
    /// 文字の文字種を判定します。
    ///
    /// # 引数
    ///
    /// * `c` - 判定する文字
    ///
    /// # 戻り値
    ///
    /// 文字種
    pub fn of(c: char) -> Self {
        match c {
            ' ' | '\t' | '\n' | '\r' | '\u{3000}' => Self::Space,
            '\u{3041}'..='\u{309f}' => Self::Hiragana,
            '\u{30a0}'..='\u{30ff}' | '\u{31f0}'..='\u{31ff}' | '\u{ff66}'..='\u{ff9f}' => {
                Self::Katakana
            }
            '\u{4e00}'..='\u{9fff}'
            | '\u{3400}'..='\u{4dbf}'
            | '\u{f900}'..='\u{faff}'
            | '\u{20000}'..='\u{2ffff}'
            | '々'
            | '〆'
            | '〇' => Self::Kanji,
            'a'..='z' | 'A'..='Z' | '\u{ff21}'..='\u{ff3a}' | '\u{ff41}'..='\u{ff5a}' => {
                Self::Alphabet
            }
            '0'..='9' | '\u{ff10}'..='\u{ff19}' => Self::Digit,
            _ if c.is_whitespace() => Self::Space,
            _ if c.is_ascii_punctuation() => Self::Symbol,
            '\u{3000}'..='\u{303f}' | '\u{ff01}'..='\u{ff0f}' | '\u{ff1a}'..='\u{ff20}' => {
                Self::Symbol
            }
            '\u{ff3b}'..='\u{ff40}' | '\u{ff5b}'..='\u{ff65}' | '\u{2000}'..='\u{2bff}' => {
                Self::Symbol
            }
            _ => Self::Other,
        }
    }

    /// 文字種の名前を返します。
    pub const fn name(self) -> &'static str {
        match self {
            Self::Space => "SPACE",
            Self::Hiragana => "HIRAGANA",
            Self::Katakana => "KATAKANA",
            Self::Kanji => "KANJI",
            Self::Alphabet => "ALPHA",
            Self::Digit => "NUMERIC",
            Self::Symbol => "SYMBOL",
            Self::Other => "DEFAULT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_class() {
        assert_eq!(CharClass::of('あ'), CharClass::Hiragana);
        assert_eq!(CharClass::of('ア'), CharClass::Katakana);
        assert_eq!(CharClass::of('ー'), CharClass::Katakana);
        assert_eq!(CharClass::of('ｱ'), CharClass::Katakana);
        assert_eq!(CharClass::of('語'), CharClass::Kanji);
        assert_eq!(CharClass::of('々'), CharClass::Kanji);
        assert_eq!(CharClass::of('x'), CharClass::Alphabet);
        assert_eq!(CharClass::of('Ｘ'), CharClass::Alphabet);
        assert_eq!(CharClass::of('7'), CharClass::Digit);
        assert_eq!(CharClass::of('７'), CharClass::Digit);
        assert_eq!(CharClass::of(' '), CharClass::Space);
        assert_eq!(CharClass::of('\u{3000}'), CharClass::Space);
        assert_eq!(CharClass::of('。'), CharClass::Symbol);
        assert_eq!(CharClass::of('!'), CharClass::Symbol);
        assert_eq!(CharClass::of('！'), CharClass::Symbol);
        assert_eq!(CharClass::of('😀'), CharClass::Other);
    }
}
