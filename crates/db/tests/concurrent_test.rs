//! Concurrent posting against the same accounts.
//!
//! Entries are created in parallel and must end with unique sequence
//! numbers and running balances equal to the sum of what was posted.
//! Racing posts or reversals of one entry must take effect exactly once.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tokio::sync::Barrier;

use common::{TestSchool, connect, create_school, date};
use scholaris_core::ledger::{JournalLine, JournalSource, LedgerError, NewJournalEntry};
use scholaris_core::posting::SystemAccount;
use scholaris_db::entities::journal_entries;
use scholaris_db::repositories::JournalError;
use scholaris_db::{AccountRepository, JournalRepository};
use scholaris_shared::types::{AccountId, Amount, SchoolId};

const WRITERS: usize = 20;

fn expense_entry(school: &TestSchool, day: u32, amount: i64) -> NewJournalEntry {
    let amount = Amount::new(amount);
    NewJournalEntry {
        school_id: SchoolId::from_uuid(school.id),
        entry_date: date(2024, 10, day),
        description: format!("Utilities {day}"),
        reference: None,
        source: JournalSource::Manual,
        lines: vec![
            JournalLine::debit(
                AccountId::from_uuid(school.account(SystemAccount::GeneralExpense)),
                amount,
                None,
            ),
            JournalLine::credit(AccountId::from_uuid(school.account(SystemAccount::Cash)), amount, None),
        ],
        post: true,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_entries_keep_balances_consistent() {
    let db = connect().await;
    let school = Arc::new(create_school(&db, "Concurrent College").await);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let tasks = (0..WRITERS).map(|n| {
        let journal = JournalRepository::new(db.clone());
        let school = Arc::clone(&school);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            // Spread over a few days so later balance rows get shifted.
            let day = u32::try_from(n % 5).unwrap() + 1;
            journal.create_entry(expense_entry(&school, day, 1_000)).await
        })
    });

    let results = join_all(tasks).await;
    for result in &results {
        assert!(result.as_ref().unwrap().is_ok(), "entry failed: {result:?}");
    }

    let entries = journal_entries::Entity::find()
        .filter(journal_entries::Column::SchoolId.eq(school.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(entries.len(), WRITERS);
    let sequences: HashSet<i64> = entries.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences.len(), WRITERS);

    let accounts = AccountRepository::new(db.clone());
    let expense = accounts
        .balance_as_of(school.id, school.account(SystemAccount::GeneralExpense), date(2024, 10, 31))
        .await
        .unwrap();
    assert_eq!(expense.balance, Amount::new(1_000 * i64::try_from(WRITERS).unwrap()));

    let day_one = accounts
        .balance_as_of(school.id, school.account(SystemAccount::GeneralExpense), date(2024, 10, 1))
        .await
        .unwrap();
    assert_eq!(day_one.balance, Amount::new(4_000));

    let trial = accounts.trial_balance(school.id, date(2024, 10, 31)).await.unwrap();
    assert_eq!(trial.total_debit, trial.total_credit);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_racing_posts_apply_a_draft_once() {
    let db = connect().await;
    let school = create_school(&db, "Racing Posts Academy").await;
    let journal = JournalRepository::new(db.clone());

    journal.create_entry(expense_entry(&school, 1, 500)).await.unwrap();
    let mut draft = expense_entry(&school, 1, 1_000);
    draft.post = false;
    let draft = journal.create_entry(draft).await.unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let tasks = (0..2).map(|_| {
        let journal = journal.clone();
        let barrier = Arc::clone(&barrier);
        let (school_id, entry_id) = (school.id, draft.entry.id);
        tokio::spawn(async move {
            barrier.wait().await;
            journal.post_entry(school_id, entry_id).await
        })
    });
    let results: Vec<_> = join_all(tasks).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
    assert!(results.iter().any(|r| matches!(
        r,
        Err(JournalError::Ledger(LedgerError::AlreadyPosted))
    )));

    let expense = AccountRepository::new(db.clone())
        .balance_as_of(school.id, school.account(SystemAccount::GeneralExpense), date(2024, 10, 1))
        .await
        .unwrap();
    assert_eq!(expense.balance, Amount::new(1_500));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_racing_reversals_produce_one_reversal() {
    let db = connect().await;
    let school = create_school(&db, "Racing Reversals College").await;
    let journal = JournalRepository::new(db.clone());
    let original = journal.create_entry(expense_entry(&school, 2, 800)).await.unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let tasks = (0..2).map(|_| {
        let journal = journal.clone();
        let barrier = Arc::clone(&barrier);
        let (school_id, entry_id) = (school.id, original.entry.id);
        tokio::spawn(async move {
            barrier.wait().await;
            journal.reverse_entry(school_id, entry_id, "Duplicate bill", None).await
        })
    });
    let results: Vec<_> = join_all(tasks).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
    assert!(results.iter().any(|r| matches!(
        r,
        Err(JournalError::Ledger(LedgerError::AlreadyReversed))
    )));

    let reversals = journal_entries::Entity::find()
        .filter(journal_entries::Column::ReversalOfId.eq(original.entry.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(reversals.len(), 1);

    let expense = AccountRepository::new(db.clone())
        .balance_as_of(school.id, school.account(SystemAccount::GeneralExpense), date(2024, 10, 2))
        .await
        .unwrap();
    assert_eq!(expense.balance, Amount::ZERO);
}
