//! Expense posting decisions.

use chrono::NaiveDate;
use tally_shared::types::AccountId;

use crate::posting::event::PostingEvent;

use super::error::ExpenseError;
use super::types::{ExpenseDraft, ExpenseType};

/// Stateless service for expense and bill postings.
pub struct ExpenseService;

impl ExpenseService {
    /// The event recorded when the expense is created.
    ///
    /// # Errors
    ///
    /// Returns `MissingPaymentAccount` for an expense or cheque without a
    /// payment account.
    pub fn posting_event(draft: &ExpenseDraft) -> Result<PostingEvent, ExpenseError> {
        match draft.expense_type {
            ExpenseType::Expense | ExpenseType::Cheque => {
                let payment_account = draft
                    .payment_account
                    .ok_or(ExpenseError::MissingPaymentAccount)?;
                Ok(PostingEvent::ExpenseRecorded {
                    expense_id: draft.id,
                    payee: draft.payee.clone(),
                    date: draft.date,
                    expense_account: draft.expense_account,
                    payment_account,
                    subtotal: draft.subtotal,
                    tax: draft.tax,
                    total: draft.total(),
                })
            }
            ExpenseType::Bill => Ok(PostingEvent::BillRecorded {
                expense_id: draft.id,
                payee: draft.payee.clone(),
                date: draft.date,
                expense_account: draft.expense_account,
                subtotal: draft.subtotal,
                tax: draft.tax,
                total: draft.total(),
            }),
        }
    }

    /// The event recorded when a bill is paid.
    ///
    /// # Errors
    ///
    /// Returns `NotABill` for expenses and cheques and `BillAlreadyPaid` if
    /// the bill is paid.
    pub fn payment_event(
        draft: &ExpenseDraft,
        is_paid: bool,
        payment_account: AccountId,
        date: NaiveDate,
    ) -> Result<PostingEvent, ExpenseError> {
        if draft.expense_type != ExpenseType::Bill {
            return Err(ExpenseError::NotABill);
        }
        if is_paid {
            return Err(ExpenseError::BillAlreadyPaid);
        }
        Ok(PostingEvent::BillPaid {
            expense_id: draft.id,
            payee: draft.payee.clone(),
            date,
            payment_account,
            amount: draft.total(),
        })
    }

    /// Checks that the expense's amounts or accounts may still change.
    ///
    /// # Errors
    ///
    /// Returns `BillAlreadyPaid` for paid bills, whose payment entry would
    /// no longer match the payable.
    pub fn ensure_editable(draft: &ExpenseDraft, is_paid: bool) -> Result<(), ExpenseError> {
        if draft.expense_type == ExpenseType::Bill && is_paid {
            return Err(ExpenseError::BillAlreadyPaid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posting::service::PostingService;
    use crate::posting::types::{AccountRef, SystemAccount};
    use rust_decimal_macros::dec;
    use tally_shared::types::ExpenseId;

    fn draft(expense_type: ExpenseType, payment_account: Option<AccountId>) -> ExpenseDraft {
        ExpenseDraft {
            id: ExpenseId::new(),
            expense_type,
            payee: "Staples".into(),
            date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            expense_account: AccountId::new(),
            payment_account,
            subtotal: dec!(100.00),
            tax: dec!(13.00),
        }
    }

    #[test]
    fn test_cheque_posts_expense() {
        let bank = AccountId::new();
        let event = ExpenseService::posting_event(&draft(ExpenseType::Cheque, Some(bank))).unwrap();
        let plan = PostingService::plan(&event).unwrap();
        assert_eq!(plan.lines.last().unwrap().account, AccountRef::Account(bank));
        assert_eq!(plan.total(), dec!(113.00));
    }

    #[test]
    fn test_expense_requires_payment_account() {
        assert!(matches!(
            ExpenseService::posting_event(&draft(ExpenseType::Expense, None)),
            Err(ExpenseError::MissingPaymentAccount)
        ));
    }

    #[test]
    fn test_bill_then_payment() {
        let bill = draft(ExpenseType::Bill, None);
        let recorded =
            PostingService::plan(&ExpenseService::posting_event(&bill).unwrap()).unwrap();
        assert_eq!(
            recorded.lines.last().unwrap().account,
            AccountRef::System(SystemAccount::AccountsPayable)
        );

        let bank = AccountId::new();
        let event = ExpenseService::payment_event(&bill, false, bank, bill.date).unwrap();
        let paid = PostingService::plan(&event).unwrap();
        assert_eq!(paid.lines[0].debit, dec!(113.00));
        assert_eq!(paid.lines[1].account, AccountRef::Account(bank));
    }

    #[test]
    fn test_payment_rules() {
        let bill = draft(ExpenseType::Bill, None);
        assert!(matches!(
            ExpenseService::payment_event(&bill, true, AccountId::new(), bill.date),
            Err(ExpenseError::BillAlreadyPaid)
        ));
        let expense = draft(ExpenseType::Expense, Some(AccountId::new()));
        assert!(matches!(
            ExpenseService::payment_event(&expense, false, AccountId::new(), expense.date),
            Err(ExpenseError::NotABill)
        ));
        assert!(ExpenseService::ensure_editable(&bill, true).is_err());
        assert!(ExpenseService::ensure_editable(&expense, true).is_ok());
    }

    #[test]
    fn test_type_parse() {
        assert_eq!("Cheque Expense".parse::<ExpenseType>().unwrap(), ExpenseType::Cheque);
        assert_eq!("BILL".parse::<ExpenseType>().unwrap(), ExpenseType::Bill);
        assert!("invoice".parse::<ExpenseType>().is_err());
    }
}
