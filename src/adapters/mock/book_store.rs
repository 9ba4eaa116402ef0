use crate::domain::{Book, BookId};
use crate::ports::book_store::{BookStore as BookStoreTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// BookStoreのインメモリ実装
///
/// 書籍を登録して状態を持ったテストをサポートする。
/// 各操作の前にタスクを譲るので、排他がなければ read-modify-write が交錯する。
pub struct BookStore {
    books: Mutex<HashMap<BookId, Book>>,
    fail_reads: AtomicBool,
    fail_updates: AtomicBool,
}

impl BookStore {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    /// テスト用に書籍を登録
    pub fn add_book(&self, book: Book) {
        self.lock().insert(book.id, book);
    }

    /// 現在の書籍を取得（検証用）
    pub fn book(&self, book_id: BookId) -> Option<Book> {
        self.lock().get(&book_id).cloned()
    }

    /// 読み込みをI/Oエラーにする
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// 更新をI/Oエラーにする
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BookId, Book>> {
        self.books.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStoreTrait for BookStore {
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        tokio::task::yield_now().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err("book store unavailable".into());
        }
        Ok(self.lock().get(&book_id).cloned())
    }

    async fn update(&self, book: &Book) -> Result<bool> {
        tokio::task::yield_now().await;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err("book store unavailable".into());
        }
        let mut books = self.lock();
        match books.get_mut(&book.id) {
            Some(stored) => {
                *stored = book.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
