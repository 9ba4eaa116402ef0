use crate::domain::{Book, BookId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍ストアポート
///
/// 貸出パイプラインが必要とするのは在庫数の読み書きだけ。
/// カタログのCRUDは外部の責務。
#[async_trait]
pub trait BookStore: Send + Sync {
    /// IDで書籍を取得する（存在しなければ`None`）
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 書籍を保存する
    ///
    /// 更新された行があれば`true`を返す。
    async fn update(&self, book: &Book) -> Result<bool>;
}
