//! 接続コスト計算のためのコネクター
//!
//! `connectionCost.sen`は、行数(u16)と列数(u16)に続いて、
//! `行数 * 列数`個のi16コストを行優先で並べたバッファです。
//! 行は左側ノードの右文脈ID、列は右側ノードの左文脈IDに対応します。

use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::dictionary::record::{read_i16_at, RecordReader};
use crate::errors::{Result, SenError};

pub(crate) const MATRIX_HEADER_LEN: usize = 4;

/// コネクターのビュー機能を提供するトレイト
pub trait ConnectorView {
    /// 左文脈IDの数（行列の列数）を返します。
    fn num_left(&self) -> usize;

    /// 右文脈IDの数（行列の行数）を返します。
    fn num_right(&self) -> usize;
}

/// 接続コスト計算機能を提供するトレイト
pub trait ConnectorCost: ConnectorView {
    /// 接続行列の値を取得します。
    ///
    /// # 引数
    ///
    /// * `right_id` - 左側ノードの右文脈ID
    /// * `left_id` - 右側ノードの左文脈ID
    ///
    /// # 戻り値
    ///
    /// 接続コスト
    fn cost(&self, right_id: u16, left_id: u16) -> i32;
}

/// 接続コスト行列のバイト列へのビュー
#[derive(Clone, Copy)]
pub struct MatrixConnector<'a> {
    data: &'a [u8],
    num_right: usize,
    num_left: usize,
}

impl<'a> MatrixConnector<'a> {
    /// バッファを検証してビューを作成します。
    ///
    /// # 引数
    ///
    /// * `data` - `connectionCost.sen`の内容
    ///
    /// # エラー
    ///
    /// ヘッダが欠けている場合、または行列の大きさがバッファ長と一致しない場合、
    /// [`SenError`]が返されます。
    pub(crate) fn new(data: &'a [u8]) -> Result<Self> {
        let mut rdr = RecordReader::new(data, 0);
        let num_right = usize::from(rdr.u16());
        let num_left = usize::from(rdr.u16());
        if rdr.overrun() {
            return Err(SenError::resource(
                "connectionCost.sen",
                "the matrix header is missing.",
            ));
        }
        let expected = MATRIX_HEADER_LEN + num_right * num_left * 2;
        if data.len() != expected {
            return Err(SenError::resource(
                "connectionCost.sen",
                format!(
                    "a {num_right}x{num_left} matrix needs {expected} bytes, but the buffer has {}.",
                    data.len()
                ),
            ));
        }
        Ok(Self {
            data,
            num_right,
            num_left,
        })
    }

    /// 検証済みのバッファからビューを作成します。
    #[inline(always)]
    pub(crate) const fn from_validated(data: &'a [u8], num_right: usize, num_left: usize) -> Self {
        Self {
            data,
            num_right,
            num_left,
        }
    }

    #[inline(always)]
    const fn index(&self, right_id: u16, left_id: u16) -> usize {
        MATRIX_HEADER_LEN + (right_id as usize * self.num_left + left_id as usize) * 2
    }
}

impl ConnectorView for MatrixConnector<'_> {
    #[inline(always)]
    fn num_left(&self) -> usize {
        self.num_left
    }

    #[inline(always)]
    fn num_right(&self) -> usize {
        self.num_right
    }
}

impl ConnectorCost for MatrixConnector<'_> {
    #[inline(always)]
    fn cost(&self, right_id: u16, left_id: u16) -> i32 {
        debug_assert!(usize::from(right_id) < self.num_right);
        debug_assert!(usize::from(left_id) < self.num_left);
        // Ids are checked against the matrix on load.
        read_i16_at(self.data, self.index(right_id, left_id)).map_or(0, i32::from)
    }
}

/// 接続コスト行列を書き出します。
///
/// # 引数
///
/// * `num_right` - 行数
/// * `num_left` - 列数
/// * `costs` - 行優先のコスト。長さは`num_right * num_left`
/// * `w` - 書き出し先
pub(crate) fn encode_matrix<W: Write>(
    num_right: u16,
    num_left: u16,
    costs: &[i16],
    mut w: W,
) -> io::Result<()> {
    debug_assert_eq!(costs.len(), usize::from(num_right) * usize::from(num_left));
    w.write_u16::<BigEndian>(num_right)?;
    w.write_u16::<BigEndian>(num_left)?;
    for &c in costs {
        w.write_i16::<BigEndian>(c)?;
    }
    Ok(())
}
