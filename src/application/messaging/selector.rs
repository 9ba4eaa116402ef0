use crate::ports::MessageTransport;
use crate::ports::transport;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// トランスポートの選択結果（プロセスの生存期間中は変わらない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// 永続ブローカーが有効
    PrimaryActive,
    /// フォールバックのPub/Subのみ
    FallbackOnly,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::PrimaryActive => "primary_active",
            TransportMode::FallbackOnly => "fallback_only",
        }
    }
}

/// トランスポートセレクター
///
/// 起動時に一度だけ永続ブローカーへの接続を試み、成功すればそれを主経路にする。
/// 失敗・未設定ならフォールバックのみで動作する。
/// 自動で主経路に戻ることはない（発行ごとのソフトなフォールバックは`LoanPublisher`側）。
pub struct TransportSelector {
    primary: Option<Arc<dyn MessageTransport>>,
    fallback: Option<Arc<dyn MessageTransport>>,
}

impl TransportSelector {
    /// 永続ブローカーを主経路とするセレクター
    pub fn with_primary(
        primary: Arc<dyn MessageTransport>,
        fallback: Option<Arc<dyn MessageTransport>>,
    ) -> Self {
        Self {
            primary: Some(primary),
            fallback,
        }
    }

    /// フォールバックのみのセレクター（`fallback`が`None`なら発行は no-op）
    pub fn fallback_only(fallback: Option<Arc<dyn MessageTransport>>) -> Self {
        Self {
            primary: None,
            fallback,
        }
    }

    /// 永続ブローカーへの接続を試みてトランスポートを決定する
    ///
    /// `connect`はブローカーへの接続とトピック宣言を行う。
    /// 成功した場合は具象型のハンドルも返す（コマンドコンシューマーが使う）。
    ///
    /// # 引数
    /// * `endpoint` - ブローカーのURL（未設定・空なら接続しない）
    /// * `connect` - 非同期の接続関数
    /// * `fallback` - フォールバックのトランスポート
    pub async fn establish<T, F, Fut>(
        endpoint: Option<&str>,
        connect: F,
        fallback: Option<Arc<dyn MessageTransport>>,
    ) -> (Self, Option<Arc<T>>)
    where
        T: MessageTransport + 'static,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = transport::Result<T>>,
    {
        let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) else {
            tracing::info!("No broker endpoint configured, using fallback transport only");
            return (Self::fallback_only(fallback), None);
        };

        match connect(endpoint.to_string()).await {
            Ok(primary) => {
                let primary = Arc::new(primary);
                tracing::info!(transport = primary.name(), "Durable broker initialised");
                (Self::with_primary(primary.clone(), fallback), Some(primary))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to initialise durable broker, using fallback transport only"
                );
                (Self::fallback_only(fallback), None)
            }
        }
    }

    pub fn mode(&self) -> TransportMode {
        if self.primary.is_some() {
            TransportMode::PrimaryActive
        } else {
            TransportMode::FallbackOnly
        }
    }

    pub fn primary(&self) -> Option<&Arc<dyn MessageTransport>> {
        self.primary.as_ref()
    }

    pub fn fallback(&self) -> Option<&Arc<dyn MessageTransport>> {
        self.fallback.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::RecordingTransport;
    use crate::ports::TransportError;

    #[tokio::test]
    async fn test_no_endpoint_means_fallback_only() {
        let (selector, primary) = TransportSelector::establish(
            None,
            |_url| async { Ok(RecordingTransport::new("amqp")) },
            None,
        )
        .await;

        assert_eq!(selector.mode(), TransportMode::FallbackOnly);
        assert!(primary.is_none());
    }

    #[tokio::test]
    async fn test_blank_endpoint_means_fallback_only() {
        let (selector, primary) = TransportSelector::establish(
            Some("  "),
            |_url| async { Ok(RecordingTransport::new("amqp")) },
            None,
        )
        .await;

        assert_eq!(selector.mode(), TransportMode::FallbackOnly);
        assert!(primary.is_none());
    }

    #[tokio::test]
    async fn test_successful_connect_activates_primary() {
        let fallback: Arc<dyn MessageTransport> = Arc::new(RecordingTransport::new("redis"));
        let (selector, primary) = TransportSelector::establish(
            Some("amqp://localhost:5672"),
            |url| async move {
                assert_eq!(url, "amqp://localhost:5672");
                Ok(RecordingTransport::new("amqp"))
            },
            Some(fallback),
        )
        .await;

        assert_eq!(selector.mode(), TransportMode::PrimaryActive);
        assert!(primary.is_some());
        assert!(selector.fallback().is_some());
    }

    #[tokio::test]
    async fn test_failed_connect_falls_back() {
        let (selector, primary) = TransportSelector::establish(
            Some("amqp://unreachable:5672"),
            |_url| async {
                Err::<RecordingTransport, _>(TransportError::Connection("refused".into()))
            },
            None,
        )
        .await;

        assert_eq!(selector.mode(), TransportMode::FallbackOnly);
        assert!(primary.is_none());
    }
}
