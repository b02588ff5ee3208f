//! Quote arithmetic
//!
//! Quotes are assembled client-side and rendered elsewhere; this module
//! only owns the totals.

use serde::{Deserialize, Serialize};

/// Value-added tax rate applied to the subtotal
pub const IVA_RATE: f64 = 0.08;

/// Income-tax withholding rate subtracted from the total
pub const ISR_RETENTION_RATE: f64 = 0.0125;

/// One quoted line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl QuoteItem {
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// A complete quote with computed totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub folio: u32,
    pub date: String,
    pub company: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub items: Vec<QuoteItem>,
    pub subtotal: f64,
    pub iva: f64,
    pub isr_retention: f64,
    pub total: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub agent: String,
}

/// Header fields of a quote
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteHeader {
    pub folio: u32,
    pub date: String,
    pub company: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub notes: String,
    pub agent: String,
}

impl Quote {
    /// Compute totals for `items`
    pub fn from_items(header: QuoteHeader, items: Vec<QuoteItem>) -> Self {
        let subtotal: f64 = items.iter().map(QuoteItem::amount).sum();
        let iva = subtotal * IVA_RATE;
        let isr_retention = subtotal * ISR_RETENTION_RATE;

        Self {
            folio: header.folio,
            date: header.date,
            company: header.company,
            contact: header.contact,
            phone: header.phone,
            email: header.email,
            items,
            subtotal,
            iva,
            isr_retention,
            total: subtotal + iva - isr_retention,
            notes: header.notes,
            agent: header.agent,
        }
    }
}
