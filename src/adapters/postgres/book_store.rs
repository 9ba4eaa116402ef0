use crate::domain::{Book, BookId};
use crate::ports::book_store::{BookStore as BookStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをBookに変換する
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    Ok(Book {
        id: BookId::new(row.try_get("id")?),
        title: row.try_get("title")?,
        total_copies: row.try_get("total_copies")?,
        available_copies: row.try_get("available_copies")?,
    })
}

/// BookStoreのPostgreSQL実装
///
/// 貸出パイプラインが触るのは在庫数の列だけ。
pub struct BookStore {
    pool: PgPool,
}

impl BookStore {
    /// PostgreSQLコネクションプールから新しいBookStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStoreTrait for BookStore {
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, total_copies, available_copies
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 書籍を更新する
    ///
    /// `available_copies`の範囲はテーブルのCHECK制約でも守られる。
    async fn update(&self, book: &Book) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $1,
                total_copies = $2,
                available_copies = $3
            WHERE id = $4
            "#,
        )
        .bind(&book.title)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.id.value())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
