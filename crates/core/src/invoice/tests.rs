//! Tests for invoice transitions and amounts.

use chrono::NaiveDate;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, InvoiceId, MoneyError};

use super::error::InvoiceError;
use super::service::InvoiceService;
use super::types::{AmountEdit, InvoiceAmounts, InvoiceSnapshot, InvoiceStatus, InvoiceUpdate};
use crate::audit::types::AuditAction;
use crate::ledger::error::LedgerError;
use crate::posting::event::PostingEvent;
use crate::posting::service::PostingService;
use crate::posting::types::{AccountRef, SystemAccount};

use InvoiceStatus::{Deposited, Draft, Overdue, Paid, Partial, Sent, Viewed, Voided};

const ALL: [InvoiceStatus; 8] = [Draft, Sent, Viewed, Partial, Paid, Overdue, Deposited, Voided];

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 10).unwrap()
}

fn snapshot(status: InvoiceStatus, amounts: InvoiceAmounts) -> InvoiceSnapshot {
    InvoiceSnapshot {
        id: InvoiceId::new(),
        invoice_number: "INV-0001".into(),
        customer: "Maple Design".into(),
        issue_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
        status,
        amounts,
        income_account: None,
    }
}

fn sent_452() -> InvoiceSnapshot {
    snapshot(Sent, InvoiceAmounts::issue(dec!(400.00), dec!(52.00)))
}

fn to(status: InvoiceStatus) -> InvoiceUpdate {
    InvoiceUpdate {
        status: Some(status),
        ..InvoiceUpdate::default()
    }
}

// =========================================================================
// Transition table
// =========================================================================

#[rstest]
#[case(Draft, &[Sent, Voided])]
#[case(Sent, &[Viewed, Partial, Paid, Deposited, Overdue, Voided])]
#[case(Viewed, &[Partial, Paid, Deposited, Overdue, Voided])]
#[case(Overdue, &[Partial, Paid, Deposited, Voided])]
#[case(Partial, &[Partial, Paid, Deposited, Overdue, Voided])]
#[case(Paid, &[Deposited, Voided])]
#[case(Deposited, &[Voided])]
#[case(Voided, &[])]
fn test_transition_table(#[case] from: InvoiceStatus, #[case] allowed: &[InvoiceStatus]) {
    for target in ALL {
        assert_eq!(
            from.can_transition_to(target),
            allowed.contains(&target),
            "{from} -> {target}"
        );
    }
}

#[test]
fn test_status_parse() {
    assert_eq!(InvoiceStatus::parse("Deposited"), Some(Deposited));
    assert_eq!(InvoiceStatus::parse("void"), Some(Voided));
    assert!("archived".parse::<InvoiceStatus>().is_err());
}

#[test]
fn test_initial_status() {
    assert_eq!(InvoiceService::initial_status(None).unwrap(), Draft);
    assert_eq!(InvoiceService::initial_status(Some(Sent)).unwrap(), Sent);
    assert!(matches!(
        InvoiceService::initial_status(Some(Paid)),
        Err(InvoiceError::InvalidInitialStatus(Paid))
    ));
}

// =========================================================================
// Amount invariants
// =========================================================================

#[test]
fn test_amount_consistency_rules() {
    let issued = InvoiceAmounts::issue(dec!(100.00), dec!(5.00));
    assert!(issued.check_consistent(Sent).is_ok());
    assert!(issued.check_consistent(Paid).is_err());
    assert!(issued.check_consistent(Partial).is_err());

    let mut partly = issued;
    partly.apply_payment(dec!(5.00)).unwrap();
    assert!(partly.check_consistent(Partial).is_ok());
    assert!(partly.check_consistent(Viewed).is_err());
    assert!(partly.check_consistent(Overdue).is_ok());

    assert!(matches!(
        partly.apply_payment(dec!(200.00)),
        Err(InvoiceError::Overpayment { .. })
    ));
}

// =========================================================================
// Planning
// =========================================================================

#[test]
fn test_create_sent_posts_invoice() {
    let invoice = sent_452();
    let postings = InvoiceService::plan_create(&invoice).unwrap();
    assert_eq!(postings.len(), 1);
    assert!(matches!(
        postings[0],
        PostingEvent::InvoiceIssued { total, .. } if total == dec!(452.00)
    ));

    let draft = snapshot(Draft, invoice.amounts);
    assert!(InvoiceService::plan_create(&draft).unwrap().is_empty());
}

#[test]
fn test_draft_to_sent_issues_with_edited_amounts() {
    let draft = snapshot(Draft, InvoiceAmounts::issue(dec!(100.00), dec!(0)));
    let update = InvoiceUpdate {
        status: Some(Sent),
        amounts: Some(AmountEdit {
            subtotal: dec!(400.00),
            tax: dec!(52.00),
        }),
        ..InvoiceUpdate::default()
    };

    let plan = InvoiceService::plan_update(&draft, &update, today()).unwrap();

    assert_eq!(plan.status, Sent);
    assert_eq!(plan.amounts.amount_due, dec!(452.00));
    assert_eq!(plan.action, AuditAction::status_change("sent"));
    assert!(matches!(
        &plan.postings[..],
        [PostingEvent::InvoiceIssued { subtotal, tax, .. }]
            if *subtotal == dec!(400.00) && *tax == dec!(52.00)
    ));
}

#[test]
fn test_sent_to_deposited_posts_bank_against_receivable() {
    let bank = AccountId::new();
    let update = InvoiceUpdate {
        deposit_account: Some(bank),
        ..to(Deposited)
    };

    let plan = InvoiceService::plan_update(&sent_452(), &update, today()).unwrap();

    assert_eq!(plan.status, Deposited);
    assert_eq!(plan.amounts.amount_paid, dec!(452.00));
    assert_eq!(plan.amounts.amount_due, Decimal::ZERO);
    assert_eq!(plan.amounts.amount_deposited, dec!(452.00));
    assert_eq!(plan.postings.len(), 1);

    let entry = PostingService::plan(&plan.postings[0]).unwrap();
    assert_eq!(entry.date, today());
    assert_eq!(entry.lines[0].account, AccountRef::Account(bank));
    assert_eq!(entry.lines[0].debit, dec!(452.00));
    assert_eq!(
        entry.lines[1].account,
        AccountRef::System(SystemAccount::AccountsReceivable)
    );
    assert_eq!(entry.lines[1].credit, dec!(452.00));
}

#[test]
fn test_paid_then_deposited_moves_undeposited_funds() {
    let paid = InvoiceService::plan_update(&sent_452(), &to(Paid), today()).unwrap();
    assert_eq!(paid.amounts.undeposited(), dec!(452.00));
    assert!(matches!(
        &paid.postings[..],
        [PostingEvent::PaymentReceived { deposit_account: None, amount, .. }]
            if *amount == dec!(452.00)
    ));

    let snapshot = snapshot(Paid, paid.amounts);
    let update = InvoiceUpdate {
        deposit_account: Some(AccountId::new()),
        ..to(Deposited)
    };
    let deposited = InvoiceService::plan_update(&snapshot, &update, today()).unwrap();

    assert!(matches!(
        &deposited.postings[..],
        [PostingEvent::FundsDeposited { amount, .. }] if *amount == dec!(452.00)
    ));
    assert_eq!(deposited.amounts.amount_deposited, dec!(452.00));
}

#[test]
fn test_partial_then_deposited_posts_both() {
    let update = InvoiceUpdate {
        payment_amount: Some(dec!(100.00)),
        ..to(Partial)
    };
    let partial = InvoiceService::plan_update(&sent_452(), &update, today()).unwrap();
    assert_eq!(partial.amounts.amount_due, dec!(352.00));

    let snapshot = snapshot(Partial, partial.amounts);
    let update = InvoiceUpdate {
        deposit_account: Some(AccountId::new()),
        ..to(Deposited)
    };
    let deposited = InvoiceService::plan_update(&snapshot, &update, today()).unwrap();

    assert_eq!(deposited.postings.len(), 2);
    assert!(matches!(
        deposited.postings[0],
        PostingEvent::FundsDeposited { amount, .. } if amount == dec!(100.00)
    ));
    assert!(matches!(
        deposited.postings[1],
        PostingEvent::PaymentReceived { amount, deposit_account: Some(_), .. }
            if amount == dec!(352.00)
    ));
    assert!(deposited.amounts.check_consistent(Deposited).is_ok());
}

#[rstest]
#[case(None, "missing")]
#[case(Some(dec!(0)), "zero")]
#[case(Some(dec!(452.00)), "full amount")]
#[case(Some(dec!(500.00)), "overpayment")]
fn test_partial_payment_rejected(#[case] amount: Option<Decimal>, #[case] _why: &str) {
    let update = InvoiceUpdate {
        payment_amount: amount,
        ..to(Partial)
    };
    assert!(InvoiceService::plan_update(&sent_452(), &update, today()).is_err());
}

#[test]
fn test_oversized_payment_is_out_of_range() {
    let update = InvoiceUpdate {
        payment_amount: Some(Decimal::MAX),
        ..to(Paid)
    };
    assert!(matches!(
        InvoiceService::plan_update(&sent_452(), &update, today()),
        Err(InvoiceError::Ledger(LedgerError::Money(MoneyError::OutOfRange(_))))
    ));
}

#[test]
fn test_deposit_requires_account() {
    assert!(matches!(
        InvoiceService::plan_update(&sent_452(), &to(Deposited), today()),
        Err(InvoiceError::MissingDepositAccount)
    ));
}

#[test]
fn test_void_reverses_and_freezes_amounts() {
    let invoice = sent_452();
    let plan = InvoiceService::plan_update(&invoice, &to(Voided), today()).unwrap();
    assert!(plan.reverse_postings);
    assert!(plan.postings.is_empty());
    assert_eq!(plan.amounts, invoice.amounts);
    assert_eq!(plan.action, AuditAction::status_change("voided"));
}

#[test]
fn test_voided_invoice_is_immutable() {
    let voided = snapshot(Voided, InvoiceAmounts::issue(dec!(10), dec!(0)));
    let edit = InvoiceUpdate {
        amounts: Some(AmountEdit {
            subtotal: dec!(20),
            tax: dec!(0),
        }),
        ..InvoiceUpdate::default()
    };
    let err = InvoiceService::plan_update(&voided, &edit, today()).unwrap_err();
    assert!(matches!(err, InvoiceError::VoidedImmutable));
    assert!(err.is_integrity());

    assert!(matches!(
        InvoiceService::plan_update(&voided, &to(Sent), today()),
        Err(InvoiceError::InvalidTransition { from: Voided, to: Sent })
    ));
}

#[test]
fn test_amounts_locked_after_issue() {
    let edit = InvoiceUpdate {
        amounts: Some(AmountEdit {
            subtotal: dec!(1),
            tax: dec!(0),
        }),
        ..InvoiceUpdate::default()
    };
    assert!(matches!(
        InvoiceService::plan_update(&sent_452(), &edit, today()),
        Err(InvoiceError::AmountsLocked(Sent))
    ));
}

#[test]
fn test_invalid_transition_rejected() {
    let paid = snapshot(Paid, {
        let mut a = InvoiceAmounts::issue(dec!(10), dec!(0));
        a.apply_payment(dec!(10)).unwrap();
        a
    });
    assert!(matches!(
        InvoiceService::plan_update(&paid, &to(Sent), today()),
        Err(InvoiceError::InvalidTransition { from: Paid, to: Sent })
    ));
}

#[test]
fn test_no_status_change_is_plain_update() {
    let plan = InvoiceService::plan_update(&sent_452(), &to(Sent), today()).unwrap();
    assert_eq!(plan.action, AuditAction::Update);
    assert!(plan.postings.is_empty());
}
