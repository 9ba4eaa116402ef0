use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, Loan, LoanId, UserId};

/// イベント種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanEventType {
    /// 貸出が成立した
    LoanRequested,
    /// 貸出が承認された（現在は発行しない）
    LoanApproved,
    /// 貸出が却下された（現在は発行しない）
    LoanRejected,
    /// 書籍が返却された
    LoanReturned,
    /// 他のプロデューサーが発行した未知の種別
    #[serde(other)]
    Unknown,
}

/// イベント：貸出状態の変化の通知
///
/// 追記専用。リスナーは重複・欠落を許容しなければならない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanEvent {
    pub event_type: LoanEventType,
    pub loan_id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    #[serde(rename = "time")]
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_copies: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl LoanEvent {
    /// 貸出成立イベント（残り冊数と返却期限を含む）
    pub fn requested(loan: &Loan, remaining_copies: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_type: LoanEventType::LoanRequested,
            loan_id: loan.id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            occurred_at,
            remaining_copies: Some(remaining_copies),
            due_date: Some(loan.due_date),
        }
    }

    /// 返却イベント（書籍が見つからない場合は残り冊数なし）
    pub fn returned(
        loan: &Loan,
        remaining_copies: Option<i64>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: LoanEventType::LoanReturned,
            loan_id: loan.id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            occurred_at,
            remaining_copies,
            due_date: None,
        }
    }
}
