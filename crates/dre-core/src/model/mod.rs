//! Data model
//!
//! Invoices, disputes and resolutions, with the camelCase wire shape the
//! seed snapshots are written in.

mod dispute;
mod invoice;
mod money;

pub use dispute::{Dispute, DisputeId, DisputeStatus, DisputeType, Resolution};
pub use invoice::{Invoice, InvoiceId, InvoiceStatus, LineItem, TotalsCheck};
pub use money::Money;
