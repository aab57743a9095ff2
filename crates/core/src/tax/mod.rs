//! Sales tax rates, tax computation, and filings.

pub mod error;
pub mod filing;
pub mod rate;

pub use error::TaxError;
pub use filing::{TaxFiling, TaxFilingStatus, TaxSummary};
pub use rate::{TaxRate, compute_tax, default_rates, rate_from_thousandths, rate_to_thousandths};
