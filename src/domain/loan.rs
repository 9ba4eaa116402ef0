use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanError, LoanId, UserId};

/// 既定の貸出期間（日数）
pub const DEFAULT_LOAN_DAYS: i64 = 7;

/// 貸出ステータス
///
/// loansテーブルのENUM（borrowed, returned, late）と一致させる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// 貸出中
    Borrowed,
    /// 返却済み
    Returned,
    /// 延滞中
    Late,
}

impl LoanStatus {
    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Returned => "returned",
            LoanStatus::Late => "late",
        }
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(LoanStatus::Borrowed),
            "returned" => Ok(LoanStatus::Returned),
            "late" => Ok(LoanStatus::Late),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// 貸出 - 1冊の書籍の1回の貸出
///
/// 貸出処理で作成され、返却処理で`status`と`return_date`が一度だけ更新される。
/// このサブシステムが削除することはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl Loan {
    pub fn is_borrowed(&self) -> bool {
        self.status == LoanStatus::Borrowed
    }
}

/// 採番前の貸出（ストアが`id`を割り当てる）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub user_id: UserId,
    pub book_id: BookId,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl NewLoan {
    /// 採番済みIDで貸出エンティティにする
    pub fn into_loan(self, id: LoanId) -> Loan {
        Loan {
            id,
            user_id: self.user_id,
            book_id: self.book_id,
            loan_date: self.loan_date,
            due_date: self.due_date,
            return_date: None,
            status: LoanStatus::Borrowed,
        }
    }
}

/// 貸出日数を決定する
///
/// 正の値が指定されていればそれを使い、それ以外は既定の7日。
pub fn resolve_loan_days(days: Option<i64>) -> i64 {
    match days {
        Some(d) if d > 0 => d,
        _ => DEFAULT_LOAN_DAYS,
    }
}

/// 純粋関数：新しい貸出を組み立てる
///
/// 返却期限 = 貸出日時 + 貸出日数
///
/// 返却期限が表現できない日数は`LoanError::DurationOutOfRange`。
pub fn open_loan(
    user_id: UserId,
    book_id: BookId,
    days: Option<i64>,
    now: DateTime<Utc>,
) -> Result<NewLoan, LoanError> {
    let days = resolve_loan_days(days);
    let due_date = Duration::try_days(days)
        .and_then(|period| now.checked_add_signed(period))
        .ok_or(LoanError::DurationOutOfRange(days))?;

    Ok(NewLoan {
        user_id,
        book_id,
        loan_date: now,
        due_date,
    })
}
