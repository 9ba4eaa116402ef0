use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::deserialize_optional_id;
use super::{BookId, LoanId, UserId};

/// コマンド種別
///
/// 未知の種別文字列は`Unknown`として読み込まれる。
/// 不正なペイロードとは区別して、コンシューマー側でAck・破棄する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Borrow,
    Return,
    #[serde(other)]
    Unknown,
}

impl CommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Borrow => "borrow",
            CommandType::Return => "return",
            CommandType::Unknown => "unknown",
        }
    }
}

/// コマンドのペイロード
///
/// IDが`0`のフィールドは未指定として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<UserId>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub book_id: Option<BookId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub loan_id: Option<LoanId>,
}

/// コマンド：貸出・返却の意図
///
/// 発行後は不変。状態ではなく意図のみを表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCommand {
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    pub payload: CommandPayload,
}

impl LoanCommand {
    /// 貸出コマンドを作成する（相関IDと要求時刻を付与）
    pub fn borrow(user_id: UserId, book_id: BookId, days: Option<i64>) -> Self {
        Self {
            command_type: CommandType::Borrow,
            correlation_id: Uuid::new_v4().to_string(),
            requested_at: Some(Utc::now()),
            payload: CommandPayload {
                user_id: Some(user_id),
                book_id: Some(book_id),
                days,
                loan_id: None,
            },
        }
    }

    /// 返却コマンドを作成する（相関IDと要求時刻を付与）
    pub fn return_loan(user_id: UserId, loan_id: LoanId) -> Self {
        Self {
            command_type: CommandType::Return,
            correlation_id: Uuid::new_v4().to_string(),
            requested_at: Some(Utc::now()),
            payload: CommandPayload {
                user_id: Some(user_id),
                book_id: None,
                days: None,
                loan_id: Some(loan_id),
            },
        }
    }
}
