mod concurrency_guard;
mod dispatch;
mod errors;
mod fulfillment;

pub use concurrency_guard::{ConcurrencyGuard, GuardPermit};
pub use dispatch::{CommandDispatcher, Disposition, RetryPolicy};
pub use errors::{ErrorKind, FulfillmentError, Result};
pub use fulfillment::{FulfillmentDependencies, ReturnOutcome, process_borrow, process_return};
