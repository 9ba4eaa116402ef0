//! PostgreSQLアダプターの統合テスト
//!
//! DATABASE_URLのデータベースが必要なため`#[ignore]`にしている。
//! 実行: `cargo test --test postgres_store_test -- --ignored`

use chrono::{Duration, Utc};
use rusty_library_loans::adapters::postgres::{PostgresBookStore, PostgresLoanStore};
use rusty_library_loans::domain::*;
use rusty_library_loans::ports::{BookStore, LoanStore};
use serial_test::serial;

mod common;

fn new_loan(user: i64, book: i64) -> NewLoan {
    let now = Utc::now();
    NewLoan {
        user_id: UserId::new(user),
        book_id: BookId::new(book),
        loan_date: now,
        due_date: now + Duration::days(5),
    }
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_book_store_get_and_update() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let book_id = common::insert_book(&pool, "Dune", 3, 2).await;
    let store = PostgresBookStore::new(pool.clone());

    let book = store.get_by_id(BookId::new(book_id)).await.unwrap().unwrap();
    assert_eq!(book.title, "Dune");
    assert_eq!(book.available_copies, 2);

    let taken = book.take_copy().unwrap();
    assert!(store.update(&taken).await.unwrap());

    let reloaded = store.get_by_id(BookId::new(book_id)).await.unwrap().unwrap();
    assert_eq!(reloaded.available_copies, 1);

    assert!(store.get_by_id(BookId::new(book_id + 1000)).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_book_store_update_of_missing_book_reports_false() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let store = PostgresBookStore::new(pool.clone());

    let ghost = Book {
        id: BookId::new(999),
        title: "Ghost".to_string(),
        total_copies: 1,
        available_copies: 1,
    };

    assert!(!store.update(&ghost).await.unwrap());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_loan_store_lifecycle() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let book_id = common::insert_book(&pool, "Dune", 3, 3).await;
    let store = PostgresLoanStore::new(pool.clone());

    let loan = store.create(new_loan(7, book_id)).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Borrowed);
    assert!(store.has_active_loan(UserId::new(7), BookId::new(book_id)).await.unwrap());
    assert!(!store.has_active_loan(UserId::new(8), BookId::new(book_id)).await.unwrap());

    let fetched = store.get_by_id(loan.id).await.unwrap().unwrap();
    assert_eq!(fetched.user_id, UserId::new(7));
    assert_eq!(fetched.return_date, None);

    // 所有者が違えば更新されない
    assert!(!store.mark_returned(loan.id, UserId::new(8), Utc::now()).await.unwrap());

    assert!(store.mark_returned(loan.id, UserId::new(7), Utc::now()).await.unwrap());
    // 2回目は条件に一致しない
    assert!(!store.mark_returned(loan.id, UserId::new(7), Utc::now()).await.unwrap());

    let returned = store.get_by_id(loan.id).await.unwrap().unwrap();
    assert_eq!(returned.status, LoanStatus::Returned);
    assert!(returned.return_date.is_some());
    assert!(!store.has_active_loan(UserId::new(7), BookId::new(book_id)).await.unwrap());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_available_copies_cannot_go_negative() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let book_id = common::insert_book(&pool, "Dune", 1, 0).await;
    let store = PostgresBookStore::new(pool.clone());

    let invalid = Book {
        id: BookId::new(book_id),
        title: "Dune".to_string(),
        total_copies: 1,
        available_copies: -1,
    };

    assert!(store.update(&invalid).await.is_err());
}
