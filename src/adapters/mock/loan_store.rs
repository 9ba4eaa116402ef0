use crate::domain::{BookId, Loan, LoanId, LoanStatus, NewLoan, UserId};
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mock implementation of LoanStore
///
/// IDs are assigned sequentially starting at 1, like a BIGSERIAL column.
pub struct LoanStore {
    state: Mutex<State>,
    fail_creates: AtomicBool,
    lose_next_return: AtomicBool,
}

struct State {
    loans: BTreeMap<LoanId, Loan>,
    next_id: i64,
}

impl LoanStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                loans: BTreeMap::new(),
                next_id: 1,
            }),
            fail_creates: AtomicBool::new(false),
            lose_next_return: AtomicBool::new(false),
        }
    }

    /// Seed an existing loan for testing purposes
    pub fn insert(&self, loan: Loan) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(loan.id.value() + 1);
        state.loans.insert(loan.id, loan);
    }

    /// Snapshot of every stored loan, ordered by id
    pub fn loans(&self) -> Vec<Loan> {
        self.lock().loans.values().cloned().collect()
    }

    /// Make `create` fail with an I/O error
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// 次の`mark_returned`を別の書き込みに先を越された状態にする
    ///
    /// 貸出は返却済みになるが、呼び出し側には一致する行なし（`false`）を返す。
    pub fn lose_next_return(&self) {
        self.lose_next_return.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LoanStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn create(&self, loan: NewLoan) -> Result<Loan> {
        tokio::task::yield_now().await;
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err("loan store unavailable".into());
        }
        let mut state = self.lock();
        let id = LoanId::new(state.next_id);
        state.next_id += 1;
        let loan = loan.into_loan(id);
        state.loans.insert(id, loan.clone());
        Ok(loan)
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        tokio::task::yield_now().await;
        Ok(self.lock().loans.get(&loan_id).cloned())
    }

    async fn mark_returned(
        &self,
        loan_id: LoanId,
        user_id: UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<bool> {
        tokio::task::yield_now().await;
        let lost = self.lose_next_return.swap(false, Ordering::SeqCst);
        let mut state = self.lock();
        match state.loans.get_mut(&loan_id) {
            Some(loan) if loan.user_id == user_id && loan.status == LoanStatus::Borrowed => {
                loan.status = LoanStatus::Returned;
                loan.return_date = Some(returned_at);
                Ok(!lost)
            }
            _ => Ok(false),
        }
    }

    async fn has_active_loan(&self, user_id: UserId, book_id: BookId) -> Result<bool> {
        tokio::task::yield_now().await;
        Ok(self.lock().loans.values().any(|loan| {
            loan.user_id == user_id && loan.book_id == book_id && loan.is_borrowed()
        }))
    }
}
