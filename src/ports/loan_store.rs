use crate::domain::{BookId, Loan, LoanId, NewLoan, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出ストアポート
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// 貸出を登録し、採番済みの貸出を返す
    ///
    /// 登録直後の状態は`borrowed`、返却日は未設定。
    async fn create(&self, loan: NewLoan) -> Result<Loan>;

    /// IDで貸出を取得する（存在しなければ`None`）
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 条件付きで返却済みにする
    ///
    /// `id`と`user_id`が一致し、かつ書き込み時点で`borrowed`の行だけを
    /// `returned`に遷移させ`return_date`を設定する。
    /// 行が一致しなかった場合は`false`（重複配送との競合）。
    async fn mark_returned(
        &self,
        loan_id: LoanId,
        user_id: UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// 利用者がこの書籍を貸出中（`borrowed`）か確認する
    async fn has_active_loan(&self, user_id: UserId, book_id: BookId) -> Result<bool>;
}
