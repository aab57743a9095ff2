//! Event to journal entry planning.

use rust_decimal::Decimal;
use tally_shared::types::AccountId;
use uuid::Uuid;

use crate::ledger::error::LedgerError;
use crate::ledger::validation::validate_lines;

use super::event::PostingEvent;
use super::types::{AccountRef, PlannedLine, PostingPlan, SystemAccount};

/// Stateless service that turns events into balanced posting plans.
pub struct PostingService;

impl PostingService {
    /// Plans the journal entry for an event.
    ///
    /// The returned plan has passed line validation: at least two lines,
    /// non-negative cent amounts, one side per line, debits equal credits.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAmount` for non-positive event amounts,
    /// `InconsistentTotals` when total != subtotal + tax,
    /// `SameAccountTransfer` when both sides name one account, or any line
    /// validation error.
    pub fn plan(event: &PostingEvent) -> Result<PostingPlan, LedgerError> {
        let (memo, source_id, lines) = match event {
            PostingEvent::InvoiceIssued {
                invoice_id,
                invoice_number,
                customer,
                income_account,
                subtotal,
                tax,
                total,
                ..
            } => {
                check_totals(*subtotal, *tax, *total)?;
                let income: AccountRef =
                    income_account.map_or(SystemAccount::Sales.into(), AccountRef::Account);
                let mut lines = vec![
                    PlannedLine::debit(SystemAccount::AccountsReceivable, *total),
                    PlannedLine::credit(income, *subtotal),
                ];
                if !tax.is_zero() {
                    lines.push(PlannedLine::credit(SystemAccount::SalesTaxPayable, *tax));
                }
                (
                    format!("Invoice {invoice_number} for {customer}"),
                    Some(invoice_id.into_inner()),
                    lines,
                )
            }
            PostingEvent::PaymentReceived {
                invoice_id,
                invoice_number,
                amount,
                deposit_account,
                ..
            } => {
                check_positive(*amount)?;
                let target: AccountRef = deposit_account
                    .map_or(SystemAccount::UndepositedFunds.into(), AccountRef::Account);
                (
                    format!("Payment for {invoice_number}"),
                    Some(invoice_id.into_inner()),
                    vec![
                        PlannedLine::debit(target, *amount),
                        PlannedLine::credit(SystemAccount::AccountsReceivable, *amount),
                    ],
                )
            }
            PostingEvent::FundsDeposited {
                invoice_id,
                invoice_number,
                amount,
                bank_account,
                ..
            } => {
                check_positive(*amount)?;
                (
                    format!("Deposit for {invoice_number}"),
                    Some(invoice_id.into_inner()),
                    vec![
                        PlannedLine::debit(*bank_account, *amount),
                        PlannedLine::credit(SystemAccount::UndepositedFunds, *amount),
                    ],
                )
            }
            PostingEvent::ExpenseRecorded {
                expense_id,
                payee,
                expense_account,
                payment_account,
                subtotal,
                tax,
                total,
                ..
            } => {
                check_totals(*subtotal, *tax, *total)?;
                if expense_account == payment_account {
                    return Err(LedgerError::SameAccountTransfer);
                }
                let mut lines = purchase_lines(*expense_account, *subtotal, *tax);
                lines.push(PlannedLine::credit(*payment_account, *total));
                (
                    format!("Expense: {payee}"),
                    Some(expense_id.into_inner()),
                    lines,
                )
            }
            PostingEvent::BillRecorded {
                expense_id,
                payee,
                expense_account,
                subtotal,
                tax,
                total,
                ..
            } => {
                check_totals(*subtotal, *tax, *total)?;
                let mut lines = purchase_lines(*expense_account, *subtotal, *tax);
                lines.push(PlannedLine::credit(SystemAccount::AccountsPayable, *total));
                (
                    format!("Bill from {payee}"),
                    Some(expense_id.into_inner()),
                    lines,
                )
            }
            PostingEvent::BillPaid {
                expense_id,
                payee,
                payment_account,
                amount,
                ..
            } => {
                check_positive(*amount)?;
                (
                    format!("Bill payment to {payee}"),
                    Some(expense_id.into_inner()),
                    vec![
                        PlannedLine::debit(SystemAccount::AccountsPayable, *amount),
                        PlannedLine::credit(*payment_account, *amount),
                    ],
                )
            }
            PostingEvent::Transfer {
                from_account,
                to_account,
                amount,
                memo,
                ..
            } => {
                check_positive(*amount)?;
                if from_account == to_account {
                    return Err(LedgerError::SameAccountTransfer);
                }
                (
                    memo.clone().unwrap_or_else(|| "Transfer".to_string()),
                    None,
                    vec![
                        PlannedLine::debit(*to_account, *amount),
                        PlannedLine::credit(*from_account, *amount),
                    ],
                )
            }
            PostingEvent::BankTransactionCategorized {
                transaction_id,
                description,
                bank_account,
                category_account,
                amount,
                ..
            } => {
                if amount.is_zero() {
                    return Err(LedgerError::ZeroAmount);
                }
                if bank_account == category_account {
                    return Err(LedgerError::SameAccountTransfer);
                }
                let magnitude = amount.abs();
                let lines = if amount.is_sign_positive() {
                    vec![
                        PlannedLine::debit(*bank_account, magnitude),
                        PlannedLine::credit(*category_account, magnitude),
                    ]
                } else {
                    vec![
                        PlannedLine::debit(*category_account, magnitude),
                        PlannedLine::credit(*bank_account, magnitude),
                    ]
                };
                (description.clone(), Some(transaction_id.into_inner()), lines)
            }
            PostingEvent::ManualAdjustment { memo, lines, .. } => (
                memo.clone(),
                None::<Uuid>,
                lines
                    .iter()
                    .map(|line| PlannedLine {
                        account: AccountRef::Account(line.account_id),
                        debit: line.debit,
                        credit: line.credit,
                        memo: line.memo.clone(),
                    })
                    .collect(),
            ),
        };

        validate_lines(&lines)?;

        Ok(PostingPlan {
            date: event.date(),
            memo,
            source: event.source(),
            source_id,
            lines,
        })
    }
}

fn check_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::ZeroAmount);
    }
    Ok(())
}

fn check_totals(subtotal: Decimal, tax: Decimal, total: Decimal) -> Result<(), LedgerError> {
    check_positive(total)?;
    if subtotal < Decimal::ZERO || tax < Decimal::ZERO || subtotal + tax != total {
        return Err(LedgerError::InconsistentTotals {
            subtotal,
            tax,
            total,
        });
    }
    Ok(())
}

fn purchase_lines(
    expense_account: AccountId,
    subtotal: Decimal,
    tax: Decimal,
) -> Vec<PlannedLine> {
    let mut lines = Vec::with_capacity(3);
    if !subtotal.is_zero() {
        lines.push(PlannedLine::debit(expense_account, subtotal));
    }
    if !tax.is_zero() {
        lines.push(PlannedLine::debit(SystemAccount::SalesTaxReceivable, tax));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{EntrySource, JournalLineInput};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_shared::types::{BankTransactionId, ExpenseId, InvoiceId};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn issued(subtotal: Decimal, tax: Decimal, total: Decimal) -> PostingEvent {
        PostingEvent::InvoiceIssued {
            invoice_id: InvoiceId::new(),
            invoice_number: "INV-0001".into(),
            customer: "Acme".into(),
            date: date(),
            income_account: None,
            subtotal,
            tax,
            total,
        }
    }

    #[test]
    fn test_invoice_issued_with_tax() {
        let plan = PostingService::plan(&issued(dec!(400.00), dec!(52.00), dec!(452.00))).unwrap();

        assert_eq!(plan.source, EntrySource::Invoice);
        assert_eq!(plan.memo, "Invoice INV-0001 for Acme");
        assert_eq!(plan.lines.len(), 3);
        assert_eq!(
            plan.lines[0],
            PlannedLine::debit(SystemAccount::AccountsReceivable, dec!(452.00))
        );
        assert_eq!(plan.lines[1], PlannedLine::credit(SystemAccount::Sales, dec!(400.00)));
        assert_eq!(
            plan.lines[2],
            PlannedLine::credit(SystemAccount::SalesTaxPayable, dec!(52.00))
        );
        assert_eq!(plan.total(), dec!(452.00));
        assert_eq!(
            plan.system_accounts(),
            vec![
                SystemAccount::AccountsReceivable,
                SystemAccount::Sales,
                SystemAccount::SalesTaxPayable
            ]
        );
    }

    #[test]
    fn test_invoice_without_tax_has_two_lines() {
        let plan = PostingService::plan(&issued(dec!(100.00), dec!(0), dec!(100.00))).unwrap();
        assert_eq!(plan.lines.len(), 2);
    }

    #[test]
    fn test_invoice_inconsistent_totals_rejected() {
        assert!(matches!(
            PostingService::plan(&issued(dec!(400.00), dec!(52.00), dec!(450.00))),
            Err(LedgerError::InconsistentTotals { .. })
        ));
        assert!(matches!(
            PostingService::plan(&issued(dec!(0), dec!(0), dec!(0))),
            Err(LedgerError::ZeroAmount)
        ));
    }

    #[test]
    fn test_payment_defaults_to_undeposited_funds() {
        let plan = PostingService::plan(&PostingEvent::PaymentReceived {
            invoice_id: InvoiceId::new(),
            invoice_number: "INV-0001".into(),
            date: date(),
            amount: dec!(452.00),
            deposit_account: None,
        })
        .unwrap();
        assert_eq!(
            plan.lines[0].account,
            AccountRef::System(SystemAccount::UndepositedFunds)
        );
        assert_eq!(
            plan.lines[1].account,
            AccountRef::System(SystemAccount::AccountsReceivable)
        );
    }

    #[test]
    fn test_payment_straight_to_bank() {
        let bank = AccountId::new();
        let plan = PostingService::plan(&PostingEvent::PaymentReceived {
            invoice_id: InvoiceId::new(),
            invoice_number: "INV-0001".into(),
            date: date(),
            amount: dec!(452.00),
            deposit_account: Some(bank),
        })
        .unwrap();
        assert_eq!(plan.lines[0], PlannedLine::debit(bank, dec!(452.00)));
    }

    #[test]
    fn test_expense_with_tax() {
        let expense_account = AccountId::new();
        let bank = AccountId::new();
        let plan = PostingService::plan(&PostingEvent::ExpenseRecorded {
            expense_id: ExpenseId::new(),
            payee: "Staples".into(),
            date: date(),
            expense_account,
            payment_account: bank,
            subtotal: dec!(100.00),
            tax: dec!(13.00),
            total: dec!(113.00),
        })
        .unwrap();

        assert_eq!(plan.lines[0], PlannedLine::debit(expense_account, dec!(100.00)));
        assert_eq!(
            plan.lines[1],
            PlannedLine::debit(SystemAccount::SalesTaxReceivable, dec!(13.00))
        );
        assert_eq!(plan.lines[2], PlannedLine::credit(bank, dec!(113.00)));
    }

    #[test]
    fn test_bill_credits_payable() {
        let plan = PostingService::plan(&PostingEvent::BillRecorded {
            expense_id: ExpenseId::new(),
            payee: "Hydro".into(),
            date: date(),
            expense_account: AccountId::new(),
            subtotal: dec!(80.00),
            tax: dec!(0),
            total: dec!(80.00),
        })
        .unwrap();
        assert_eq!(plan.source, EntrySource::Bill);
        assert_eq!(
            plan.lines[1],
            PlannedLine::credit(SystemAccount::AccountsPayable, dec!(80.00))
        );
    }

    #[test]
    fn test_categorized_withdrawal_debits_category() {
        let bank = AccountId::new();
        let category = AccountId::new();
        let plan = PostingService::plan(&PostingEvent::BankTransactionCategorized {
            transaction_id: BankTransactionId::new(),
            date: date(),
            description: "COFFEE SHOP".into(),
            bank_account: bank,
            category_account: category,
            amount: dec!(-4.50),
        })
        .unwrap();
        assert_eq!(plan.lines[0], PlannedLine::debit(category, dec!(4.50)));
        assert_eq!(plan.lines[1], PlannedLine::credit(bank, dec!(4.50)));
    }

    #[test]
    fn test_categorized_deposit_debits_bank() {
        let bank = AccountId::new();
        let category = AccountId::new();
        let plan = PostingService::plan(&PostingEvent::BankTransactionCategorized {
            transaction_id: BankTransactionId::new(),
            date: date(),
            description: "E-TRANSFER".into(),
            bank_account: bank,
            category_account: category,
            amount: dec!(250.00),
        })
        .unwrap();
        assert_eq!(plan.lines[0], PlannedLine::debit(bank, dec!(250.00)));
    }

    #[test]
    fn test_zero_bank_line_rejected() {
        let result = PostingService::plan(&PostingEvent::BankTransactionCategorized {
            transaction_id: BankTransactionId::new(),
            date: date(),
            description: "FEE REVERSAL".into(),
            bank_account: AccountId::new(),
            category_account: AccountId::new(),
            amount: dec!(0),
        });
        assert!(matches!(result, Err(LedgerError::ZeroAmount)));
    }

    #[test]
    fn test_transfer_to_same_account_rejected() {
        let account = AccountId::new();
        let result = PostingService::plan(&PostingEvent::Transfer {
            date: date(),
            from_account: account,
            to_account: account,
            amount: dec!(10),
            memo: None,
        });
        assert!(matches!(result, Err(LedgerError::SameAccountTransfer)));
    }

    #[test]
    fn test_manual_adjustment_must_balance() {
        let result = PostingService::plan(&PostingEvent::ManualAdjustment {
            date: date(),
            memo: "Year end".into(),
            lines: vec![
                JournalLineInput::debit(AccountId::new(), dec!(100), None),
                JournalLineInput::credit(AccountId::new(), dec!(90), None),
            ],
        });
        assert!(matches!(result, Err(LedgerError::UnbalancedEntry { .. })));
    }
}
