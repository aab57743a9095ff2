//! Invoice transition planning.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;
use tally_shared::types::money::check_range;

use crate::audit::types::AuditAction;
use crate::ledger::error::LedgerError;
use crate::posting::event::PostingEvent;

use super::error::InvoiceError;
use super::types::{InvoiceAmounts, InvoiceSnapshot, InvoiceStatus, InvoiceUpdate};

/// Outcome of a planned invoice update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceUpdatePlan {
    /// Status after the update.
    pub status: InvoiceStatus,
    /// Amounts after the update.
    pub amounts: InvoiceAmounts,
    /// Events to post, in order.
    pub postings: Vec<PostingEvent>,
    /// Reverse every unreversed entry of the invoice before posting.
    pub reverse_postings: bool,
    /// Audit action to record.
    pub action: AuditAction,
}

/// Stateless service for invoice lifecycle decisions.
pub struct InvoiceService;

impl InvoiceService {
    /// Status of a new invoice; Draft unless Sent is requested.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInitialStatus` for any other status.
    pub fn initial_status(requested: Option<InvoiceStatus>) -> Result<InvoiceStatus, InvoiceError> {
        match requested.unwrap_or(InvoiceStatus::Draft) {
            status @ (InvoiceStatus::Draft | InvoiceStatus::Sent) => Ok(status),
            other => Err(InvoiceError::InvalidInitialStatus(other)),
        }
    }

    /// Events to post when an invoice is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the amounts are inconsistent or the status is not
    /// a valid initial status.
    pub fn plan_create(snapshot: &InvoiceSnapshot) -> Result<Vec<PostingEvent>, InvoiceError> {
        let status = Self::initial_status(Some(snapshot.status))?;
        check_edit(snapshot.amounts.subtotal, snapshot.amounts.tax)?;
        snapshot.amounts.check_consistent(status)?;
        Ok(match status {
            InvoiceStatus::Sent => vec![Self::issue_event(snapshot, &snapshot.amounts)],
            _ => Vec::new(),
        })
    }

    /// Plans an update: new status and amounts plus the postings required.
    ///
    /// Postings are dated on `update.effective_date`, or `today` when absent;
    /// the issuing entry is dated on the invoice's issue date.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed, a required payment
    /// detail is missing, or the resulting amounts are inconsistent.
    pub fn plan_update(
        snapshot: &InvoiceSnapshot,
        update: &InvoiceUpdate,
        today: NaiveDate,
    ) -> Result<InvoiceUpdatePlan, InvoiceError> {
        let current = snapshot.status;
        let date = update.effective_date.unwrap_or(today);
        if let Some(amount) = update.payment_amount {
            check_range(amount).map_err(LedgerError::from)?;
        }

        if current == InvoiceStatus::Voided {
            return Err(match update.status {
                Some(to) if update.amounts.is_none() => {
                    InvoiceError::InvalidTransition { from: current, to }
                }
                _ => InvoiceError::VoidedImmutable,
            });
        }

        let mut amounts = snapshot.amounts;
        if let Some(edit) = update.amounts {
            if current != InvoiceStatus::Draft {
                return Err(InvoiceError::AmountsLocked(current));
            }
            check_edit(edit.subtotal, edit.tax)?;
            amounts = InvoiceAmounts::issue(edit.subtotal, edit.tax);
        }

        let target = match update.status {
            Some(to) if to != current || to == InvoiceStatus::Partial => to,
            _ => {
                amounts.check_consistent(current)?;
                return Ok(InvoiceUpdatePlan {
                    status: current,
                    amounts,
                    postings: Vec::new(),
                    reverse_postings: false,
                    action: AuditAction::Update,
                });
            }
        };

        if !current.can_transition_to(target) {
            return Err(InvoiceError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        let mut postings = Vec::new();
        let mut reverse_postings = false;

        match target {
            InvoiceStatus::Sent => postings.push(Self::issue_event(snapshot, &amounts)),
            InvoiceStatus::Partial => {
                let amount = update
                    .payment_amount
                    .ok_or(InvoiceError::MissingPaymentAmount)?;
                if amount <= Decimal::ZERO || amount == amounts.amount_due {
                    return Err(InvoiceError::InvalidPaymentAmount {
                        amount,
                        status: target,
                    });
                }
                amounts.apply_payment(amount)?;
                postings.push(payment_event(snapshot, date, amount, None));
            }
            InvoiceStatus::Paid => {
                let amount = update.payment_amount.unwrap_or(amounts.amount_due);
                if amount <= Decimal::ZERO || amount < amounts.amount_due {
                    return Err(InvoiceError::InvalidPaymentAmount {
                        amount,
                        status: target,
                    });
                }
                amounts.apply_payment(amount)?;
                postings.push(payment_event(snapshot, date, amount, None));
            }
            InvoiceStatus::Deposited => {
                let bank = update
                    .deposit_account
                    .ok_or(InvoiceError::MissingDepositAccount)?;
                let undeposited = amounts.undeposited();
                if undeposited > Decimal::ZERO {
                    postings.push(PostingEvent::FundsDeposited {
                        invoice_id: snapshot.id,
                        invoice_number: snapshot.invoice_number.clone(),
                        date,
                        amount: undeposited,
                        bank_account: bank,
                    });
                }
                let due = amounts.amount_due;
                if due > Decimal::ZERO {
                    amounts.apply_payment(due)?;
                    postings.push(payment_event(snapshot, date, due, Some(bank)));
                }
                amounts.amount_deposited = amounts.amount_paid;
            }
            InvoiceStatus::Voided => reverse_postings = true,
            InvoiceStatus::Draft | InvoiceStatus::Viewed | InvoiceStatus::Overdue => {}
        }

        amounts.check_consistent(target)?;

        Ok(InvoiceUpdatePlan {
            status: target,
            amounts,
            postings,
            reverse_postings,
            action: AuditAction::status_change(target.as_str()),
        })
    }

    /// The issuing event for an invoice with the given amounts.
    #[must_use]
    pub fn issue_event(snapshot: &InvoiceSnapshot, amounts: &InvoiceAmounts) -> PostingEvent {
        PostingEvent::InvoiceIssued {
            invoice_id: snapshot.id,
            invoice_number: snapshot.invoice_number.clone(),
            customer: snapshot.customer.clone(),
            date: snapshot.issue_date,
            income_account: snapshot.income_account,
            subtotal: amounts.subtotal,
            tax: amounts.tax,
            total: amounts.total,
        }
    }
}

fn payment_event(
    snapshot: &InvoiceSnapshot,
    date: NaiveDate,
    amount: Decimal,
    deposit_account: Option<AccountId>,
) -> PostingEvent {
    PostingEvent::PaymentReceived {
        invoice_id: snapshot.id,
        invoice_number: snapshot.invoice_number.clone(),
        date,
        amount,
        deposit_account,
    }
}

fn check_edit(subtotal: Decimal, tax: Decimal) -> Result<(), InvoiceError> {
    check_range(subtotal).map_err(LedgerError::from)?;
    check_range(tax).map_err(LedgerError::from)?;
    if subtotal < Decimal::ZERO || tax < Decimal::ZERO {
        return Err(LedgerError::InconsistentTotals {
            subtotal,
            tax,
            total: subtotal + tax,
        }
        .into());
    }
    Ok(())
}
