pub mod loan;
pub mod messaging;
