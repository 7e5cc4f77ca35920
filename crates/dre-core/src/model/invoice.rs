//! Invoices and line items

use super::Money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Invoice identifier (e.g. `INV-001`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    /// Create from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvoiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Issued, awaiting payment
    Pending,
    /// Under customer dispute
    Disputed,
    /// Dispute resolved, corrected invoice issued
    Resolved,
    /// Settled
    Paid,
}

impl InvoiceStatus {
    /// Lower-case name as shown in listings
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Disputed => "disputed",
            InvoiceStatus::Resolved => "resolved",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single billed line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    /// Stated line total, as printed on the invoice
    pub total: Money,
}

impl LineItem {
    /// Create a line item whose stated total is quantity × unit price
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            total: unit_price * quantity,
        }
    }

    /// Quantity × unit price
    #[inline]
    #[must_use]
    pub fn computed_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Whether the stated total matches quantity × unit price
    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total == self.computed_total()
    }
}

/// Outcome of comparing an invoice's stated amount with its line items
///
/// Reported only. Nothing in the engine rewrites an amount to make it agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsCheck {
    /// Stated amount equals the sum of line totals
    Consistent,
    /// Stated amount and line totals disagree
    Mismatch {
        /// `Invoice::amount`
        stated: Money,
        /// Sum of `LineItem::total`
        computed: Money,
    },
}

impl TotalsCheck {
    /// Whether the check found no discrepancy
    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        matches!(self, TotalsCheck::Consistent)
    }
}

/// A billable document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub customer_name: String,
    pub amount: Money,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,
    pub line_items: Vec<LineItem>,
    pub status: InvoiceStatus,
}

impl Invoice {
    /// Sum of the stated line totals
    #[must_use]
    pub fn line_item_total(&self) -> Money {
        self.line_items.iter().map(|item| item.total).sum()
    }

    /// Compare the stated amount with the line items
    #[must_use]
    pub fn totals_consistency(&self) -> TotalsCheck {
        let computed = self.line_item_total();
        if computed == self.amount {
            TotalsCheck::Consistent
        } else {
            TotalsCheck::Mismatch {
                stated: self.amount,
                computed,
            }
        }
    }
}
