//! Domain types: validated symbols and quotes.

pub mod quote;
pub mod symbol;

pub use quote::{round2, DataSource, Quote};
pub use symbol::{Symbol, SymbolError, MAX_SYMBOL_LEN};
