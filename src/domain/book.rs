use serde::{Deserialize, Serialize};

use super::{BookId, InventoryError};

/// 書籍（カタログ側のエンティティ）
///
/// 不変条件：`0 <= available_copies <= total_copies`
/// 貸出・返却処理だけが`available_copies`を書き換える。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub total_copies: i64,
    pub available_copies: i64,
}

impl Book {
    /// 1冊貸し出した後の書籍を返す
    ///
    /// 在庫が1冊未満なら負にせず`NoCopiesAvailable`を返す。
    pub fn take_copy(&self) -> Result<Book, InventoryError> {
        if self.available_copies < 1 {
            return Err(InventoryError::NoCopiesAvailable);
        }
        Ok(Book {
            available_copies: self.available_copies - 1,
            ..self.clone()
        })
    }

    /// 1冊返却された後の書籍を返す
    pub fn restock_copy(&self) -> Result<Book, InventoryError> {
        if self.available_copies >= self.total_copies {
            return Err(InventoryError::FullyStocked);
        }
        Ok(Book {
            available_copies: self.available_copies + 1,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(total: i64, available: i64) -> Book {
        Book {
            id: BookId::new(1),
            title: "The Rust Programming Language".to_string(),
            total_copies: total,
            available_copies: available,
        }
    }

    #[test]
    fn test_take_copy_decrements() {
        let taken = book(3, 1).take_copy().unwrap();
        assert_eq!(taken.available_copies, 0);
        assert_eq!(taken.total_copies, 3);
    }

    #[test]
    fn test_take_copy_never_goes_negative() {
        assert_eq!(
            book(3, 0).take_copy().unwrap_err(),
            InventoryError::NoCopiesAvailable
        );
    }

    #[test]
    fn test_restock_copy_increments() {
        assert_eq!(book(3, 0).restock_copy().unwrap().available_copies, 1);
    }

    #[test]
    fn test_restock_copy_never_exceeds_total() {
        assert_eq!(
            book(3, 3).restock_copy().unwrap_err(),
            InventoryError::FullyStocked
        );
    }
}
