//! ユーティリティ関数を提供するモジュール

/// CSVセルのデータを必要に応じて引用符で囲み、`out`に追記します。
///
/// カンマやダブルクォートを含むデータはダブルクォートで囲まれ、
/// 内部のダブルクォートは二重化されます。
///
/// # 引数
///
/// * `out` - 書き込み先のバッファ
/// * `data` - CSVセルとして書き込むバイト列
///
/// # 例
///
/// ```
/// # use sen::utils::quote_csv_cell;
/// let mut out = vec![];
/// quote_csv_cell(&mut out, "1,2-ジクロロエタン".as_bytes());
/// assert_eq!(out, "\"1,2-ジクロロエタン\"".as_bytes());
/// ```
pub fn quote_csv_cell(out: &mut Vec<u8>, mut data: &[u8]) {
    let mut buf = [0; 4096];
    let mut writer = csv_core::Writer::new();
    loop {
        let (result, nin, nout) = writer.field(data, &mut buf);
        out.extend_from_slice(&buf[..nout]);
        if result == csv_core::WriteResult::InputEmpty {
            break;
        }
        data = &data[nin..];
    }
    // The quoting state needs at most two bytes to finish.
    let (_, nout) = writer.finish(&mut buf);
    out.extend_from_slice(&buf[..nout]);
}
