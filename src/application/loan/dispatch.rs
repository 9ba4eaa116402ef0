use crate::domain::{CommandType, LoanCommand};
use std::str::FromStr;
use tracing::Instrument;

use super::errors::{ErrorKind, FulfillmentError};
use super::fulfillment::{FulfillmentDependencies, process_borrow, process_return};

/// 処理失敗時の再配送ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// すべての処理エラーを再配送する（恒久エラーもオペレーターが介入するまで再試行）
    #[default]
    RedeliverAll,
    /// 恒久エラーは再配送せずデッドレターへ送り、一時エラーだけ再配送する
    DeadLetterPermanent,
}

impl RetryPolicy {
    /// 処理エラーに対するメッセージの扱いを決める
    pub fn disposition_for(&self, err: &FulfillmentError) -> Disposition {
        match (self, err.kind()) {
            (RetryPolicy::RedeliverAll, _) => Disposition::Requeue,
            (RetryPolicy::DeadLetterPermanent, ErrorKind::Transient) => Disposition::Requeue,
            (RetryPolicy::DeadLetterPermanent, ErrorKind::Permanent) => Disposition::DeadLetter,
        }
    }
}

impl FromStr for RetryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redeliver_all" => Ok(RetryPolicy::RedeliverAll),
            "dead_letter_permanent" => Ok(RetryPolicy::DeadLetterPermanent),
            _ => Err(format!("Invalid retry policy: {}", s)),
        }
    }
}

/// 1メッセージの処理結果としてのブローカーへの応答
///
/// Pub/Subのフォールバック経路には応答の概念がないため、結果はログにのみ使われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 確認応答（成功・不正ペイロード・未知の種別）
    Ack,
    /// 否定応答・再配送あり
    Requeue,
    /// 否定応答・再配送なし（デッドレターへ）
    DeadLetter,
}

/// コマンドディスパッチャー
///
/// ペイロードをデコードし、種別に応じて貸出エンジンへ振り分ける。
/// Ack/Nackを決めるのはここだけで、エンジンはトランスポートの状態に触れない。
#[derive(Clone)]
pub struct CommandDispatcher {
    deps: FulfillmentDependencies,
    policy: RetryPolicy,
}

impl CommandDispatcher {
    pub fn new(deps: FulfillmentDependencies, policy: RetryPolicy) -> Self {
        Self { deps, policy }
    }

    /// 受信したペイロードを処理する
    ///
    /// 不正なペイロードは無限に再配送されないよう、即座にAckして破棄する。
    pub async fn dispatch(&self, payload: &[u8]) -> Disposition {
        let cmd: LoanCommand = match serde_json::from_slice(payload) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::warn!(error = %e, "Bad loan command payload, dropping");
                return Disposition::Ack;
            }
        };

        let span = tracing::info_span!(
            "loan_command",
            correlation_id = %cmd.correlation_id,
            command_type = cmd.command_type.as_str()
        );
        self.handle(cmd).instrument(span).await
    }

    /// デコード済みのコマンドを処理する
    pub async fn handle(&self, cmd: LoanCommand) -> Disposition {
        let result = match cmd.command_type {
            CommandType::Borrow => process_borrow(&self.deps, &cmd).await.map(|_| ()),
            CommandType::Return => process_return(&self.deps, &cmd).await.map(|_| ()),
            CommandType::Unknown => {
                tracing::warn!("Unknown loan command type, dropping");
                return Disposition::Ack;
            }
        };

        match result {
            Ok(()) => Disposition::Ack,
            Err(e) => {
                let disposition = self.policy.disposition_for(&e);
                tracing::warn!(
                    error = %e,
                    kind = ?e.kind(),
                    disposition = ?disposition,
                    "Loan command failed"
                );
                disposition
            }
        }
    }
}
