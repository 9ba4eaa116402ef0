use crate::domain::{BookId, Loan, LoanId, LoanStatus, NewLoan, UserId};
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

/// PostgreSQLの行データをLoanに変換する
///
/// statusの文字列からの変換でエラーハンドリングを行う。
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.try_get("status")?;
    let status = LoanStatus::from_str(status_str).map_err(|e| {
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Loan {
        id: LoanId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        book_id: BookId::new(row.try_get("book_id")?),
        loan_date: row.try_get("loan_date")?,
        due_date: row.try_get("due_date")?,
        return_date: row.try_get("return_date")?,
        status,
    })
}

/// LoanStoreのPostgreSQL実装
pub struct LoanStore {
    pool: PgPool,
}

impl LoanStore {
    /// PostgreSQLコネクションプールから新しいLoanStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn create(&self, loan: NewLoan) -> Result<Loan> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO loans (user_id, book_id, loan_date, due_date, return_date, status)
            VALUES ($1, $2, $3, $4, NULL, $5)
            RETURNING id
            "#,
        )
        .bind(loan.user_id.value())
        .bind(loan.book_id.value())
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .bind(LoanStatus::Borrowed.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(loan.into_loan(LoanId::new(id)))
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, loan_date, due_date, return_date, status
            FROM loans
            WHERE id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// 条件付き更新（compare-and-set）
    ///
    /// WHERE句で`status = 'borrowed'`を条件にし、同時に届いた重複コマンドの
    /// 二重遷移を防ぐ。
    async fn mark_returned(
        &self,
        loan_id: LoanId,
        user_id: UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = $1, return_date = $2
            WHERE id = $3 AND user_id = $4 AND status = $5
            "#,
        )
        .bind(LoanStatus::Returned.as_str())
        .bind(returned_at)
        .bind(loan_id.value())
        .bind(user_id.value())
        .bind(LoanStatus::Borrowed.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn has_active_loan(&self, user_id: UserId, book_id: BookId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM loans
                WHERE user_id = $1
                  AND book_id = $2
                  AND status = $3
                  AND return_date IS NULL
            )
            "#,
        )
        .bind(user_id.value())
        .bind(book_id.value())
        .bind(LoanStatus::Borrowed.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
