//! Integration tests for journal entries, running balances and postings.
//!
//! Requires a running `PostgreSQL` database; run with
//! `cargo test -p scholaris-db -- --ignored`.

mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{TestSchool, connect, create_school, date};
use scholaris_core::fiscal::FiscalRuleError;
use scholaris_core::ledger::{JournalLine, JournalSource, LedgerError, NewJournalEntry};
use scholaris_core::posting::{FeeItem, FeeKind, PaymentMethod, PostingEvent, SystemAccount};
use scholaris_db::entities::journal_entries;
use scholaris_db::repositories::{
    CreateClassInput, CreateStudentInput, JournalError, LedgerSettings, UpdateDraftInput,
};
use scholaris_db::{
    AccountRepository, ClassRepository, JournalRepository, PostingRepository, StudentRepository,
};
use scholaris_shared::types::{AccountId, Amount, SchoolId, StudentId};

fn cash_receipt(school: &TestSchool, on: chrono::NaiveDate, amount: i64, post: bool) -> NewJournalEntry {
    let amount = Amount::new(amount);
    NewJournalEntry {
        school_id: SchoolId::from_uuid(school.id),
        entry_date: on,
        description: "Sundry receipt".to_string(),
        reference: None,
        source: JournalSource::Manual,
        lines: vec![
            JournalLine::debit(AccountId::from_uuid(school.account(SystemAccount::Cash)), amount, None),
            JournalLine::credit(
                AccountId::from_uuid(school.account(SystemAccount::OtherFeeRevenue)),
                amount,
                None,
            ),
        ],
        post,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_posted_entry_moves_balances_and_trial_balance_balances() {
    let db = connect().await;
    let school = create_school(&db, "Ledger Academy").await;
    let journal = JournalRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());

    let entry = journal
        .create_entry(cash_receipt(&school, date(2024, 10, 1), 12_500, true))
        .await
        .unwrap();
    assert!(entry.entry.is_posted);
    assert_eq!(entry.entry.sequence, 1);
    assert_eq!(entry.entry.entry_number, "JE-2024-000001");
    assert_eq!(entry.lines.len(), 2);

    let cash = accounts
        .balance_as_of(school.id, school.account(SystemAccount::Cash), date(2024, 10, 1))
        .await
        .unwrap();
    assert_eq!(cash.balance, Amount::new(12_500));

    let trial = accounts.trial_balance(school.id, date(2025, 8, 31)).await.unwrap();
    assert_eq!(trial.total_debit, trial.total_credit);
    assert_eq!(trial.total_debit, Amount::new(12_500));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_back_dated_entry_shifts_later_balances() {
    let db = connect().await;
    let school = create_school(&db, "Backdate College").await;
    let journal = JournalRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());
    let cash = school.account(SystemAccount::Cash);

    journal
        .create_entry(cash_receipt(&school, date(2024, 10, 10), 5_000, true))
        .await
        .unwrap();
    journal
        .create_entry(cash_receipt(&school, date(2024, 10, 1), 2_000, true))
        .await
        .unwrap();

    let early = accounts.balance_as_of(school.id, cash, date(2024, 10, 5)).await.unwrap();
    let late = accounts.balance_as_of(school.id, cash, date(2024, 10, 10)).await.unwrap();
    assert_eq!(early.balance, Amount::new(2_000));
    assert_eq!(late.balance, Amount::new(7_000));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_reversal_restores_balances_once() {
    let db = connect().await;
    let school = create_school(&db, "Reversal High").await;
    let journal = JournalRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());

    let original = journal
        .create_entry(cash_receipt(&school, date(2024, 11, 3), 9_900, true))
        .await
        .unwrap();
    let reversal = journal
        .reverse_entry(school.id, original.entry.id, "Duplicate receipt", None)
        .await
        .unwrap();

    assert_eq!(reversal.entry.reversal_of_id, Some(original.entry.id));
    assert_eq!(reversal.entry.entry_date, original.entry.entry_date);
    assert!(reversal.entry.is_posted);

    let reloaded = journal.get_entry(school.id, original.entry.id).await.unwrap();
    assert!(reloaded.entry.is_reversed);
    assert_eq!(reloaded.entry.reversed_by_id, Some(reversal.entry.id));

    let cash = accounts
        .balance_as_of(school.id, school.account(SystemAccount::Cash), date(2024, 11, 30))
        .await
        .unwrap();
    assert!(cash.balance.is_zero());

    let again = journal
        .reverse_entry(school.id, original.entry.id, "Again", None)
        .await
        .unwrap_err();
    assert!(matches!(again, JournalError::Ledger(LedgerError::AlreadyReversed)));

    let of_reversal = journal
        .reverse_entry(school.id, reversal.entry.id, "Undo", None)
        .await
        .unwrap_err();
    assert!(matches!(
        of_reversal,
        JournalError::Ledger(LedgerError::CannotReverseReversal)
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_invalid_entries_write_nothing() {
    let db = connect().await;
    let school = create_school(&db, "Rejects Academy").await;
    let journal = JournalRepository::new(db.clone());

    let mut unbalanced = cash_receipt(&school, date(2024, 12, 1), 1_000, true);
    unbalanced.lines[1] = JournalLine::credit(
        AccountId::from_uuid(school.account(SystemAccount::OtherFeeRevenue)),
        Amount::new(900),
        None,
    );
    let err = journal.create_entry(unbalanced).await.unwrap_err();
    assert!(matches!(err, JournalError::Ledger(LedgerError::Unbalanced { .. })));

    let outside = cash_receipt(&school, date(2026, 1, 15), 1_000, true);
    let err = journal.create_entry(outside).await.unwrap_err();
    assert!(matches!(err, JournalError::Fiscal(FiscalRuleError::NoFiscalYear(_))));

    let count = journal_entries::Entity::find()
        .filter(journal_entries::Column::SchoolId.eq(school.id))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_draft_lifecycle() {
    let db = connect().await;
    let school = create_school(&db, "Draft Grammar").await;
    let journal = JournalRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());
    let cash = school.account(SystemAccount::Cash);

    let draft = journal
        .create_entry(cash_receipt(&school, date(2025, 1, 20), 3_000, false))
        .await
        .unwrap();
    assert!(!draft.entry.is_posted);
    let before = accounts.balance_as_of(school.id, cash, date(2025, 1, 31)).await.unwrap();
    assert!(before.balance.is_zero());

    let edited = journal
        .update_draft(
            school.id,
            draft.entry.id,
            UpdateDraftInput {
                description: Some("Canteen takings".to_string()),
                reference: Some(Some("RCPT-0042".to_string())),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.description, "Canteen takings");

    let posted = journal.post_entry(school.id, draft.entry.id).await.unwrap();
    assert!(posted.entry.is_posted);
    let after = accounts.balance_as_of(school.id, cash, date(2025, 1, 31)).await.unwrap();
    assert_eq!(after.balance, Amount::new(3_000));

    let err = journal.delete_entry(school.id, draft.entry.id).await.unwrap_err();
    assert!(matches!(err, JournalError::Ledger(LedgerError::CanOnlyDeleteDraft)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_other_school_cannot_edit_post_or_delete_a_draft() {
    let db = connect().await;
    let owner = create_school(&db, "Draft Owner College").await;
    let intruder = create_school(&db, "Draft Intruder College").await;
    let journal = JournalRepository::new(db.clone());

    let draft = journal
        .create_entry(cash_receipt(&owner, date(2025, 2, 3), 7_500, false))
        .await
        .unwrap();
    let entry_id = draft.entry.id;

    let err = journal
        .update_draft(
            intruder.id,
            entry_id,
            UpdateDraftInput {
                description: Some("Rewritten".to_string()),
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::NotFound(id) if id == entry_id));

    let err = journal.post_entry(intruder.id, entry_id).await.unwrap_err();
    assert!(matches!(err, JournalError::NotFound(_)));

    let err = journal.delete_entry(intruder.id, entry_id).await.unwrap_err();
    assert!(matches!(err, JournalError::NotFound(_)));

    let kept = journal.get_entry(owner.id, entry_id).await.unwrap();
    assert_eq!(kept.entry.description, "Sundry receipt");
    assert!(!kept.entry.is_posted);
    assert_eq!(kept.lines.len(), 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_fee_invoice_and_payment_clear_receivable() {
    let db = connect().await;
    let school = create_school(&db, "Posting Primary").await;
    let class = ClassRepository::new(db.clone())
        .create(
            school.id,
            CreateClassInput {
                name: "Primary 4".to_string(),
                level: "P4".to_string(),
                class_teacher_id: None,
                capacity: None,
            },
        )
        .await
        .unwrap();
    let student = StudentRepository::new(db.clone())
        .create(
            school.id,
            CreateStudentInput {
                class_id: Some(class.id),
                admission_number: "PP/001".to_string(),
                first_name: "Kemi".to_string(),
                last_name: "Adeyemi".to_string(),
                gender: scholaris_core::teachers::Gender::Female,
                date_of_birth: None,
            },
        )
        .await
        .unwrap();
    let student_id = StudentId::from_uuid(student.id);

    let postings = PostingRepository::new(db.clone(), LedgerSettings::default());
    let invoice = postings
        .post_event(
            school.id,
            PostingEvent::FeeInvoiced {
                student_id,
                date: date(2024, 9, 9),
                items: vec![
                    FeeItem {
                        kind: FeeKind::Tuition,
                        description: "First term tuition".to_string(),
                        amount: Amount::new(150_000),
                    },
                    FeeItem {
                        kind: FeeKind::Other,
                        description: "Sports levy".to_string(),
                        amount: Amount::new(10_000),
                    },
                ],
                reference: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(invoice.entry.total_debit, 160_000);
    assert!(invoice.entry.is_posted);

    postings
        .post_event(
            school.id,
            PostingEvent::FeePaymentReceived {
                student_id,
                date: date(2024, 9, 20),
                amount: Amount::new(160_000),
                method: PaymentMethod::Bank,
                reference: Some("TRF-8812".to_string()),
            },
        )
        .await
        .unwrap();

    let accounts = AccountRepository::new(db.clone());
    let receivable = accounts
        .balance_as_of(school.id, school.account(SystemAccount::FeesReceivable), date(2024, 9, 30))
        .await
        .unwrap();
    assert!(receivable.balance.is_zero());
    let bank = accounts
        .balance_as_of(school.id, school.account(SystemAccount::Bank), date(2024, 9, 30))
        .await
        .unwrap();
    assert_eq!(bank.balance, Amount::new(160_000));
}
