use tokio::sync::{Mutex, MutexGuard};

/// プロセス全体で1つだけの排他ゲート
///
/// 貸出・返却の read-modify-write（在庫数の減算・加算）を直列化する。
/// 在庫の増減はストアの単一アトミック操作ではないため、
/// `0 <= available_copies <= total_copies` はこの排他に依存する。
///
/// 待機はブロッキング（スピンしない）でタイムアウトはない。
/// 解放は`GuardPermit`のDropで行われるので、エラーやpanicによる
/// 巻き戻しでも必ず解放される。
///
/// 複数プロセス間の排他は対象外。
#[derive(Debug, Default)]
pub struct ConcurrencyGuard {
    gate: Mutex<()>,
}

/// 取得済みの排他権（Dropで解放）
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct GuardPermit<'a> {
    _permit: MutexGuard<'a, ()>,
}

impl ConcurrencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 排他権を取得する（先行する処理が終わるまで待つ）
    pub async fn acquire(&self) -> GuardPermit<'_> {
        GuardPermit {
            _permit: self.gate.lock().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_only_one_holder_at_a_time() {
        let guard = Arc::new(ConcurrencyGuard::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let guard = guard.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = guard.acquire().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    async fn fail_while_holding(guard: &ConcurrencyGuard) -> Result<(), &'static str> {
        let _permit = guard.acquire().await;
        Err::<(), _>("boom")?;
        Ok(())
    }

    #[tokio::test]
    async fn test_released_after_error() {
        let guard = ConcurrencyGuard::new();

        assert!(fail_while_holding(&guard).await.is_err());

        let _permit = tokio::time::timeout(Duration::from_secs(1), guard.acquire())
            .await
            .expect("gate should be free after an error");
    }

    #[tokio::test]
    async fn test_released_after_panic() {
        let guard = Arc::new(ConcurrencyGuard::new());

        let holder = guard.clone();
        let handle: tokio::task::JoinHandle<()> = tokio::spawn(async move {
            let _permit = holder.acquire().await;
            panic!("mutation failed midway");
        });
        assert!(handle.await.unwrap_err().is_panic());

        let _permit = tokio::time::timeout(Duration::from_secs(1), guard.acquire())
            .await
            .expect("gate should be free after a panic");
    }
}
