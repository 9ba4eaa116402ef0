use crate::domain::{
    self, Book, BookId, InventoryError, Loan, LoanCommand, LoanError, LoanEvent, LoanStatus,
};
use crate::ports::*;
use chrono::Utc;
use std::sync::Arc;

use super::concurrency_guard::ConcurrencyGuard;
use super::errors::{FulfillmentError, Result};

/// 貸出処理の依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義する。
/// 振る舞いは下の純粋な関数側に置き、依存はすべて引数で渡す。
///
/// `guard`はプロセス内で共有する1つのインスタンスを渡すこと。
/// 両トランスポートのコンシューマーが同じゲートを使うことで排他が成立する。
#[derive(Clone)]
pub struct FulfillmentDependencies {
    pub book_store: Arc<dyn BookStore>,
    pub loan_store: Arc<dyn LoanStore>,
    pub event_sink: Arc<dyn EventSink>,
    pub guard: Arc<ConcurrencyGuard>,
}

/// 返却処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// 今回の処理で返却済みになった
    Returned(Loan),
    /// 既に返却済み（再配送による冪等な no-op）
    AlreadySettled(Loan),
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 在庫が1冊以上あること（在庫を負にしない）
/// - 利用者が同じ書籍を貸出中でないこと
/// - 貸出日数は指定値（正の場合）または7日
///
/// 処理順序：書籍取得 → 在庫確認 → 重複確認 → 貸出登録 → 在庫減算 → イベント発行
///
/// # 一貫性
///
/// 貸出登録に失敗した場合は在庫を変更しない。
/// 貸出登録後に在庫更新が失敗すると、貸出だけが残る不整合が生じる。
/// この場合の再配送は重複確認で恒久エラーになる。
///
/// # 戻り値
/// 作成された貸出
pub async fn process_borrow(deps: &FulfillmentDependencies, cmd: &LoanCommand) -> Result<Loan> {
    let user_id = cmd.payload.user_id.ok_or(FulfillmentError::MissingUserId)?;
    let book_id = cmd.payload.book_id.ok_or(FulfillmentError::MissingBookId)?;

    let (loan, book) = {
        let _permit = deps.guard.acquire().await;

        // 1. 書籍の取得
        let book = load_book(deps, book_id)
            .await?
            .ok_or(FulfillmentError::BookNotFound(book_id))?;

        // 2. 在庫確認
        let book = book.take_copy().map_err(|e| match e {
            InventoryError::NoCopiesAvailable | InventoryError::FullyStocked => {
                FulfillmentError::NoCopiesAvailable(book_id)
            }
        })?;

        // 3. 同じ書籍の貸出中チェック
        let has_active = deps
            .loan_store
            .has_active_loan(user_id, book_id)
            .await
            .map_err(FulfillmentError::LoanStoreError)?;

        if has_active {
            return Err(FulfillmentError::AlreadyBorrowed { user_id, book_id });
        }

        // 4-5. 貸出を組み立てて登録
        let new_loan = domain::loan::open_loan(user_id, book_id, cmd.payload.days, Utc::now())
            .map_err(|e| match e {
                LoanError::DurationOutOfRange(days) => FulfillmentError::InvalidLoanDuration(days),
            })?;
        let loan = deps
            .loan_store
            .create(new_loan)
            .await
            .map_err(FulfillmentError::LoanStoreError)?;

        // 6. 在庫を1冊減らす
        persist_book(deps, &book).await.inspect_err(|e| {
            tracing::error!(
                loan_id = %loan.id,
                book_id = %book_id,
                error = %e,
                "Loan created but inventory was not decremented"
            );
        })?;

        (loan, book)
    };

    // 7. イベント発行
    deps.event_sink
        .emit(LoanEvent::requested(&loan, book.available_copies, Utc::now()))
        .await;

    tracing::info!(
        loan_id = %loan.id,
        user_id = %loan.user_id,
        book_id = %loan.book_id,
        remaining_copies = book.available_copies,
        due_date = %loan.due_date,
        "Loan created"
    );

    Ok(loan)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出IDが指定されていること
/// - 貸出が存在すること
/// - 利用者IDが指定されていれば貸出の所有者と一致すること
/// - 貸出中でなければ何もせず成功（再配送に対して冪等）
///
/// 返却済みへの遷移は「書き込み時点でborrowed」を条件とする条件付き更新で行う。
/// 一致する行がなければ重複配送との競合として一時エラーを返す。
/// 再配送時には冪等な no-op の経路に入る。
pub async fn process_return(
    deps: &FulfillmentDependencies,
    cmd: &LoanCommand,
) -> Result<ReturnOutcome> {
    let loan_id = cmd.payload.loan_id.ok_or(FulfillmentError::MissingLoanId)?;

    let (loan, remaining_copies) = {
        let _permit = deps.guard.acquire().await;

        // 1. 貸出の取得
        let loan = deps
            .loan_store
            .get_by_id(loan_id)
            .await
            .map_err(FulfillmentError::LoanStoreError)?
            .ok_or(FulfillmentError::LoanNotFound(loan_id))?;

        // 2. 所有者の確認
        if let Some(requested_by) = cmd.payload.user_id {
            if requested_by != loan.user_id {
                return Err(FulfillmentError::OwnershipMismatch {
                    loan_id,
                    owner: loan.user_id,
                    requested_by,
                });
            }
        }

        // 3. 既に精算済みなら no-op
        if !loan.is_borrowed() {
            tracing::debug!(
                loan_id = %loan_id,
                status = loan.status.as_str(),
                "Loan already settled, nothing to do"
            );
            return Ok(ReturnOutcome::AlreadySettled(loan));
        }

        // 4. 条件付きで返却済みにする
        let returned_at = Utc::now();
        let updated = deps
            .loan_store
            .mark_returned(loan.id, loan.user_id, returned_at)
            .await
            .map_err(FulfillmentError::LoanStoreError)?;

        if !updated {
            return Err(FulfillmentError::ReturnRace(loan_id));
        }

        // 5. 在庫を1冊戻す
        let remaining_copies = restock_book(deps, loan.book_id).await?;

        let loan = Loan {
            status: LoanStatus::Returned,
            return_date: Some(returned_at),
            ..loan
        };
        (loan, remaining_copies)
    };

    // 6. イベント発行
    deps.event_sink
        .emit(LoanEvent::returned(&loan, remaining_copies, Utc::now()))
        .await;

    tracing::info!(
        loan_id = %loan.id,
        user_id = %loan.user_id,
        book_id = %loan.book_id,
        remaining_copies = ?remaining_copies,
        "Loan returned"
    );

    Ok(ReturnOutcome::Returned(loan))
}

async fn load_book(deps: &FulfillmentDependencies, book_id: BookId) -> Result<Option<Book>> {
    deps.book_store
        .get_by_id(book_id)
        .await
        .map_err(FulfillmentError::BookStoreError)
}

async fn persist_book(deps: &FulfillmentDependencies, book: &Book) -> Result<()> {
    let updated = deps
        .book_store
        .update(book)
        .await
        .map_err(FulfillmentError::BookStoreError)?;

    if !updated {
        return Err(FulfillmentError::InventoryUpdateRejected(book.id));
    }
    Ok(())
}

/// 返却された書籍の在庫を戻し、戻した後の在庫数を返す
///
/// 書籍が既に存在しない場合は在庫を戻さず`None`。
/// 総数に達している場合は加算せず現在値を返す。
async fn restock_book(deps: &FulfillmentDependencies, book_id: BookId) -> Result<Option<i64>> {
    let Some(book) = load_book(deps, book_id).await? else {
        tracing::warn!(book_id = %book_id, "Returned book no longer exists, inventory not restored");
        return Ok(None);
    };

    match book.restock_copy() {
        Ok(restocked) => {
            persist_book(deps, &restocked).await?;
            Ok(Some(restocked.available_copies))
        }
        Err(_) => {
            tracing::warn!(
                book_id = %book_id,
                total_copies = book.total_copies,
                "Book already fully stocked, skipping increment"
            );
            Ok(Some(book.available_copies))
        }
    }
}
