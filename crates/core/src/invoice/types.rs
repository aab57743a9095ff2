//! Invoice domain types.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, InvoiceId};

use super::error::InvoiceError;

/// Invoice status.
///
/// Allowed transitions:
/// - Draft → Sent, Voided
/// - Sent → Viewed, Partial, Paid, Deposited, Overdue, Voided
/// - Viewed → Partial, Paid, Deposited, Overdue, Voided
/// - Overdue → Partial, Paid, Deposited, Voided
/// - Partial → Partial, Paid, Deposited, Overdue, Voided
/// - Paid → Deposited, Voided
/// - Deposited → Voided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Not yet issued; nothing posted.
    Draft,
    /// Issued to the customer.
    Sent,
    /// Opened by the customer.
    Viewed,
    /// Partly paid.
    Partial,
    /// Fully paid, funds undeposited.
    Paid,
    /// Past due and unpaid.
    Overdue,
    /// Paid and deposited to the bank.
    Deposited,
    /// Cancelled; all postings reversed.
    Voided,
}

impl InvoiceStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Viewed => "viewed",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Deposited => "deposited",
            Self::Voided => "voided",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "viewed" => Some(Self::Viewed),
            "partial" => Some(Self::Partial),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            "deposited" => Some(Self::Deposited),
            "voided" | "void" => Some(Self::Voided),
            _ => None,
        }
    }

    /// Statuses reachable from this one.
    #[must_use]
    pub const fn allowed_targets(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Sent, Self::Voided],
            Self::Sent => &[
                Self::Viewed,
                Self::Partial,
                Self::Paid,
                Self::Deposited,
                Self::Overdue,
                Self::Voided,
            ],
            Self::Viewed => &[
                Self::Partial,
                Self::Paid,
                Self::Deposited,
                Self::Overdue,
                Self::Voided,
            ],
            Self::Overdue => &[Self::Partial, Self::Paid, Self::Deposited, Self::Voided],
            Self::Partial => &[
                Self::Partial,
                Self::Paid,
                Self::Deposited,
                Self::Overdue,
                Self::Voided,
            ],
            Self::Paid => &[Self::Deposited, Self::Voided],
            Self::Deposited => &[Self::Voided],
            Self::Voided => &[],
        }
    }

    /// Returns true if the transition is in the table.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.allowed_targets().contains(&to)
    }

    /// Open invoices can still receive a payment.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Sent | Self::Viewed | Self::Partial | Self::Overdue)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvoiceError::UnknownStatus(s.to_string()))
    }
}

/// Monetary state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceAmounts {
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Sales tax.
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
    /// Payments received so far.
    pub amount_paid: Decimal,
    /// Part of `amount_paid` already deposited to a bank.
    pub amount_deposited: Decimal,
    /// `total - amount_paid`.
    pub amount_due: Decimal,
}

impl InvoiceAmounts {
    /// Amounts of a freshly issued, unpaid invoice.
    #[must_use]
    pub fn issue(subtotal: Decimal, tax: Decimal) -> Self {
        let total = subtotal + tax;
        Self {
            subtotal,
            tax,
            total,
            amount_paid: Decimal::ZERO,
            amount_deposited: Decimal::ZERO,
            amount_due: total,
        }
    }

    /// Payments received but not yet deposited.
    #[must_use]
    pub fn undeposited(&self) -> Decimal {
        self.amount_paid - self.amount_deposited
    }

    /// Applies a payment.
    ///
    /// # Errors
    ///
    /// Returns `Overpayment` if the payment exceeds the amount due.
    pub fn apply_payment(&mut self, amount: Decimal) -> Result<(), InvoiceError> {
        if amount > self.amount_due {
            return Err(InvoiceError::Overpayment {
                amount,
                due: self.amount_due,
            });
        }
        self.amount_paid += amount;
        self.amount_due -= amount;
        Ok(())
    }

    /// Checks the amount invariants for a status.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentAmounts` naming the violated rule.
    pub fn check_consistent(&self, status: InvoiceStatus) -> Result<(), InvoiceError> {
        let fail = |rule: &str| Err(InvoiceError::InconsistentAmounts(rule.to_string()));

        if self.subtotal + self.tax != self.total {
            return fail("total must equal subtotal plus tax");
        }
        if self.amount_paid + self.amount_due != self.total {
            return fail("amount paid plus amount due must equal total");
        }
        if self.amount_paid < Decimal::ZERO || self.amount_due < Decimal::ZERO {
            return fail("amounts cannot be negative");
        }
        if self.amount_deposited < Decimal::ZERO || self.amount_deposited > self.amount_paid {
            return fail("deposited amount must be between zero and amount paid");
        }
        match status {
            InvoiceStatus::Paid | InvoiceStatus::Deposited if !self.amount_due.is_zero() => {
                fail("paid invoices must have nothing due")
            }
            InvoiceStatus::Partial
                if self.amount_paid <= Decimal::ZERO || self.amount_paid >= self.total =>
            {
                fail("partial invoices must be partly paid")
            }
            InvoiceStatus::Draft | InvoiceStatus::Sent | InvoiceStatus::Viewed
                if !self.amount_paid.is_zero() =>
            {
                fail("unpaid invoices cannot carry payments")
            }
            _ => Ok(()),
        }
    }
}

/// Current state of a stored invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSnapshot {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Invoice number.
    pub invoice_number: String,
    /// Customer name.
    pub customer: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Current status.
    pub status: InvoiceStatus,
    /// Current amounts.
    pub amounts: InvoiceAmounts,
    /// Income account; `Sales` when absent.
    pub income_account: Option<AccountId>,
}

/// New subtotal and tax for a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountEdit {
    /// New subtotal.
    pub subtotal: Decimal,
    /// New tax, already computed from the rate.
    pub tax: Decimal,
}

/// Requested change to an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    /// New status.
    pub status: Option<InvoiceStatus>,
    /// Payment amount for Partial or Paid; Paid defaults to the amount due.
    pub payment_amount: Option<Decimal>,
    /// Bank account for Deposited.
    pub deposit_account: Option<AccountId>,
    /// New amounts (drafts only).
    pub amounts: Option<AmountEdit>,
    /// Date the change takes effect; postings are dated on it.
    pub effective_date: Option<NaiveDate>,
}
