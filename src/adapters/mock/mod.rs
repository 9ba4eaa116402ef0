pub mod book_store;
pub mod event_sink;
pub mod loan_store;
pub mod transport;

pub use book_store::BookStore;
pub use event_sink::EventSink;
pub use loan_store::LoanStore;
pub use transport::{PublishedMessage, RecordingTransport};
