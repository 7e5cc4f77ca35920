//! DRE Core - invoices, disputes, and the data they live in
//!
//! Provides:
//! - The invoice/dispute data model with its lifecycle rules
//! - The read-only resolution catalog playback draws from
//! - A caller-owned dispute store built from an injected snapshot
//!
//! # Example
//!
//! ```rust,ignore
//! use dre_core::{DisputeStore, Snapshot};
//!
//! let snapshot = Snapshot::from_json(&std::fs::read_to_string("seed.json")?)?;
//! let (mut store, catalog) = DisputeStore::from_snapshot(snapshot)?;
//!
//! let dispute = store.begin_resolution(&"DISP-001".into())?;
//! let entry = catalog.lookup(&dispute.id)?;
//! println!("{}", entry.action);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod store;

pub use catalog::{ResolutionCatalog, ResolutionEntry};
pub use error::{CatalogError, StoreError};
pub use model::{
    Dispute, DisputeId, DisputeStatus, DisputeType, Invoice, InvoiceId, InvoiceStatus, LineItem,
    Money, Resolution, TotalsCheck,
};
pub use store::{DisputeStats, DisputeStore, DisputeView, InvoiceComparison, Snapshot};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with DRE Core
    pub use crate::{
        Dispute, DisputeId, DisputeStatus, DisputeStore, Invoice, InvoiceId, ResolutionCatalog,
        ResolutionEntry, Snapshot,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
