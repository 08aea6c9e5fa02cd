//! エラー型の定義
//!
//! このモジュールは、Senライブラリで使用されるすべてのエラー型を定義します。
//!
//! 辞書の読み込み以外の処理（辞書引き、ラティス構築、ビタビ探索）は、
//! 読み込み時の検証を通過した辞書に対しては失敗しません。読み制約を満たす
//! 候補が辞書に無い場合も未知語ノードが合成されるため、制約が満たせないことを
//! 表すエラーは存在しません。

use std::error::Error;
use std::fmt;

/// Sen専用のResult型
///
/// エラー型としてデフォルトで[`SenError`]を使用します。
pub type Result<T, E = SenError> = std::result::Result<T, E>;

/// Senのエラー型
#[derive(Debug, thiserror::Error)]
pub enum SenError {
    /// 辞書リソースのエラー
    ///
    /// 辞書ファイルが存在しない、ヘッダに記録された長さより短い、
    /// または内容が壊れている場合に発生します。辞書の構築時にのみ返され、
    /// 再試行は行われません。
    #[error(transparent)]
    Resource(ResourceError),

    /// 無効な引数エラー
    ///
    /// [`InvalidArgumentError`]のエラーバリアント。
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// ラティスの不変条件違反
    ///
    /// 先行ノードを持たないノードがEOSに到達した場合など、プログラムの誤りを示します。
    #[error("InternalLatticeError: {0}")]
    InternalLattice(String),

    /// 整数変換エラー
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// 標準I/Oエラー
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl SenError {
    /// 辞書リソースのエラーを生成します
    ///
    /// # 引数
    ///
    /// * `resource` - リソース（ファイル）の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn resource<S>(resource: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Resource(ResourceError {
            resource,
            msg: msg.into(),
        })
    }

    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// ラティスの不変条件違反エラーを生成します
    pub(crate) fn internal_lattice<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InternalLattice(msg.into())
    }
}

/// 辞書リソースが欠けている、または壊れている場合に使用されるエラー
#[derive(Debug)]
pub struct ResourceError {
    /// リソースの名前
    pub(crate) resource: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl ResourceError {
    /// 問題のあったリソースの名前を返します。
    pub fn resource(&self) -> &str {
        self.resource
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ResourceError: {}: {}", self.resource, self.msg)
    }
}

impl Error for ResourceError {}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}
