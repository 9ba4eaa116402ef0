use crate::domain::{BookId, LoanId, UserId};
use thiserror::Error;

/// エラーの分類
///
/// コンシューマーはこの分類と再試行ポリシーからAck/Nackを決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 再配送しても結果が変わらない（未存在・所有者不一致・在庫切れなど）
    Permanent,
    /// 再配送で回復しうる（ストアI/O・競合）
    Transient,
}

/// 貸出処理（アプリケーション層）のエラー
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// 貸出コマンドに利用者IDがない
    #[error("Borrow requires user_id in payload")]
    MissingUserId,

    /// 貸出コマンドに書籍IDがない
    #[error("Borrow requires book_id in payload")]
    MissingBookId,

    /// 返却コマンドに貸出IDがない
    #[error("Return requires loan_id in payload")]
    MissingLoanId,

    /// 書籍が存在しない
    #[error("Book {0} not found")]
    BookNotFound(BookId),

    /// 在庫切れ
    #[error("No copies available for book {0}")]
    NoCopiesAvailable(BookId),

    /// 同じ書籍を既に貸出中
    #[error("User {user_id} already borrowed book {book_id}")]
    AlreadyBorrowed { user_id: UserId, book_id: BookId },

    /// 返却期限を計算できない貸出日数
    #[error("Loan duration of {0} days is out of range")]
    InvalidLoanDuration(i64),

    /// 貸出が存在しない
    #[error("Loan {0} not found")]
    LoanNotFound(LoanId),

    /// 貸出の所有者が一致しない
    #[error("Loan {loan_id} belongs to user {owner} not {requested_by}")]
    OwnershipMismatch {
        loan_id: LoanId,
        owner: UserId,
        requested_by: UserId,
    },

    /// 条件付き更新で行が一致しなかった（重複配送との競合）
    #[error("No rows updated for loan {0}")]
    ReturnRace(LoanId),

    /// 書籍の更新で行が一致しなかった
    #[error("Inventory update for book {0} matched no rows")]
    InventoryUpdateRejected(BookId),

    /// BookStoreのエラー
    #[error("Book store error")]
    BookStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LoanStoreのエラー
    #[error("Loan store error")]
    LoanStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FulfillmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FulfillmentError::MissingUserId
            | FulfillmentError::MissingBookId
            | FulfillmentError::MissingLoanId
            | FulfillmentError::BookNotFound(_)
            | FulfillmentError::NoCopiesAvailable(_)
            | FulfillmentError::AlreadyBorrowed { .. }
            | FulfillmentError::InvalidLoanDuration(_)
            | FulfillmentError::LoanNotFound(_)
            | FulfillmentError::OwnershipMismatch { .. } => ErrorKind::Permanent,
            FulfillmentError::ReturnRace(_)
            | FulfillmentError::InventoryUpdateRejected(_)
            | FulfillmentError::BookStoreError(_)
            | FulfillmentError::LoanStoreError(_) => ErrorKind::Transient,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.kind() == ErrorKind::Permanent
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, FulfillmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_permanent() {
        assert!(FulfillmentError::BookNotFound(BookId::new(1)).is_permanent());
        assert!(FulfillmentError::NoCopiesAvailable(BookId::new(1)).is_permanent());
        assert!(FulfillmentError::LoanNotFound(LoanId::new(1)).is_permanent());
        assert!(FulfillmentError::InvalidLoanDuration(100_000_000).is_permanent());
        assert!(
            FulfillmentError::OwnershipMismatch {
                loan_id: LoanId::new(1),
                owner: UserId::new(1),
                requested_by: UserId::new(2),
            }
            .is_permanent()
        );
    }

    #[test]
    fn test_io_errors_and_races_are_transient() {
        let io: Box<dyn std::error::Error + Send + Sync> = "connection reset".into();
        assert_eq!(
            FulfillmentError::LoanStoreError(io).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            FulfillmentError::ReturnRace(LoanId::new(1)).kind(),
            ErrorKind::Transient
        );
    }

    #[test]
    fn test_error_messages() {
        let err = FulfillmentError::AlreadyBorrowed {
            user_id: UserId::new(7),
            book_id: BookId::new(1),
        };
        assert_eq!(err.to_string(), "User 7 already borrowed book 1");
    }
}
