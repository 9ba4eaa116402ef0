/// 在庫操作のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// 貸出可能な在庫がない
    NoCopiesAvailable,
    /// 既に全冊が揃っている（返却で総数を超えてしまう）
    FullyStocked,
}

/// 貸出の組み立てエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    /// 返却期限が日時の表現範囲を超える貸出日数
    DurationOutOfRange(i64),
}
