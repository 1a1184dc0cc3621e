//! Demo data for local development.
//!
//! Creates one school with its standard chart of accounts, a current fiscal
//! year, staff, classes, students, a small question bank and a few ledger
//! postings. Running it again leaves an existing demo school untouched.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tracing::info;
use uuid::Uuid;

use scholaris_core::academics::{AcademicSession, Term};
use scholaris_core::exams::{Difficulty, QuestionKind};
use scholaris_core::posting::{ExpensePayment, FeeItem, FeeKind, PaymentMethod, PostingEvent};
use scholaris_core::teachers::{
    ContactDetails, EmploymentDetails, EmploymentType, Gender, PersonalDetails, Qualifications,
    TeacherProfile,
};
use scholaris_db::repositories::{
    CreateClassInput, CreateFiscalYearInput, CreateSchoolInput, CreateStudentInput,
    LedgerSettings, QuestionInput, UpsertResultInput,
};
use scholaris_db::{
    AccountRepository, ClassRepository, FiscalRepository, PostingRepository, QuestionRepository,
    ResultRepository, SchoolRepository, StudentRepository, TeacherRepository,
};
use scholaris_shared::types::{Amount, StudentId};

const DEMO_SLUG: &str = "greenfield-academy";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seeder=info,scholaris=info".into()),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = Arc::new(
        scholaris_db::connect(&database_url)
            .await
            .context("Failed to connect to database")?,
    );

    let schools = SchoolRepository::new(Arc::clone(&db));
    if let Some(existing) = schools.find_by_slug(DEMO_SLUG).await? {
        info!(school_id = %existing.id, "Demo school already seeded, skipping");
        return Ok(());
    }

    let school = schools
        .create(CreateSchoolInput {
            name: "Greenfield Academy".to_string(),
            slug: DEMO_SLUG.to_string(),
            currency: Some("NGN".to_string()),
            address: Some("14 Allen Avenue, Ikeja, Lagos".to_string()),
        })
        .await?;
    let school_id = school.id;
    info!(%school_id, "Seeded school");

    let accounts = AccountRepository::new(Arc::clone(&db))
        .seed_system_accounts(school_id)
        .await?;
    info!(count = accounts.len(), "Seeded chart of accounts");

    FiscalRepository::new(Arc::clone(&db))
        .create_fiscal_year(CreateFiscalYearInput {
            school_id,
            name: "2024/2025".to_string(),
            start_date: date(2024, 9, 1)?,
            end_date: date(2025, 8, 31)?,
            is_current: true,
        })
        .await?;
    info!("Seeded fiscal year 2024/2025");

    let class_teacher = seed_teacher(&db, school_id).await?;
    let (class_id, students) = seed_class(&db, school_id, class_teacher).await?;
    seed_results(&db, school_id, &students).await?;
    seed_questions(&db, school_id).await?;
    seed_postings(&db, school_id, &students).await?;

    info!(%school_id, %class_id, "Seeding complete");
    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("invalid date {year}-{month}-{day}"))
}

async fn seed_teacher(db: &Arc<DatabaseConnection>, school_id: Uuid) -> anyhow::Result<Uuid> {
    let teacher = TeacherRepository::new(Arc::clone(db))
        .create(
            school_id,
            TeacherProfile {
                personal: PersonalDetails {
                    first_name: "Ngozi".to_string(),
                    last_name: "Adeyemi".to_string(),
                    gender: Gender::Female,
                    date_of_birth: date(1986, 4, 12)?,
                },
                contact: ContactDetails {
                    email: "ngozi.adeyemi@greenfield.example".to_string(),
                    phone: "+2348031234567".to_string(),
                    address: None,
                },
                qualifications: Qualifications {
                    highest_qualification: "B.Sc (Ed) Mathematics".to_string(),
                    specialization: Some("Mathematics".to_string()),
                    subjects: vec!["Mathematics".to_string(), "Basic Science".to_string()],
                },
                employment: EmploymentDetails {
                    staff_number: "GFA-001".to_string(),
                    employment_date: date(2016, 9, 5)?,
                    employment_type: EmploymentType::FullTime,
                    salary: Amount::new(18_000_000),
                },
            },
        )
        .await?;
    info!(teacher_id = %teacher.id, "Seeded teacher");
    Ok(teacher.id)
}

async fn seed_class(
    db: &Arc<DatabaseConnection>,
    school_id: Uuid,
    class_teacher: Uuid,
) -> anyhow::Result<(Uuid, Vec<Uuid>)> {
    let class = ClassRepository::new(Arc::clone(db))
        .create(
            school_id,
            CreateClassInput {
                name: "JSS 1A".to_string(),
                level: "JSS1".to_string(),
                class_teacher_id: Some(class_teacher),
                capacity: Some(35),
            },
        )
        .await?;

    let repo = StudentRepository::new(Arc::clone(db));
    let mut students = Vec::new();
    for (n, (first, last, gender)) in [
        ("Chinedu", "Okoro", Gender::Male),
        ("Aisha", "Bello", Gender::Female),
        ("Tunde", "Bakare", Gender::Male),
        ("Zainab", "Musa", Gender::Female),
    ]
    .into_iter()
    .enumerate()
    {
        let student = repo
            .create(
                school_id,
                CreateStudentInput {
                    class_id: Some(class.id),
                    admission_number: format!("GFA/2024/{:03}", n + 1),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    gender,
                    date_of_birth: None,
                },
            )
            .await?;
        students.push(student.id);
    }
    info!(class_id = %class.id, students = students.len(), "Seeded class");
    Ok((class.id, students))
}

async fn seed_results(
    db: &Arc<DatabaseConnection>,
    school_id: Uuid,
    students: &[Uuid],
) -> anyhow::Result<()> {
    let repo = ResultRepository::new(Arc::clone(db));
    let session = AcademicSession::starting(2024);
    let scores = [(32, 51), (28, 44), (35, 57), (19, 30)];
    for (student_id, (ca, exam)) in students.iter().zip(scores) {
        for subject in ["Mathematics", "English Language"] {
            repo.upsert(
                school_id,
                UpsertResultInput {
                    student_id: *student_id,
                    subject: subject.to_string(),
                    term: Term::First,
                    session: session.clone(),
                    ca_score: Decimal::from(ca),
                    exam_score: Decimal::from(exam),
                },
            )
            .await?;
        }
    }
    info!("Seeded first term results");
    Ok(())
}

async fn seed_questions(db: &Arc<DatabaseConnection>, school_id: Uuid) -> anyhow::Result<()> {
    let bank = QuestionRepository::new(Arc::clone(db));
    let questions = [
        ("What is 7 x 8?", ["54", "56", "58", "64"], "56", Difficulty::Easy),
        ("What is 15% of 200?", ["15", "20", "30", "45"], "30", Difficulty::Easy),
        ("Simplify 3/4 + 1/8.", ["7/8", "4/12", "1", "5/8"], "7/8", Difficulty::Medium),
        ("Solve 2x + 5 = 17.", ["5", "6", "7", "11"], "6", Difficulty::Medium),
        ("What is the LCM of 12 and 18?", ["6", "24", "36", "72"], "36", Difficulty::Hard),
    ];
    for (body, options, answer, difficulty) in questions {
        bank.create(
            school_id,
            QuestionInput {
                subject: "Mathematics".to_string(),
                class_level: "JSS1".to_string(),
                topic: None,
                kind: QuestionKind::MultipleChoice,
                difficulty,
                body: body.to_string(),
                options: options.iter().map(ToString::to_string).collect(),
                answer: Some(answer.to_string()),
                marks: 2,
            },
        )
        .await?;
    }
    info!(count = questions.len(), "Seeded question bank");
    Ok(())
}

async fn seed_postings(
    db: &Arc<DatabaseConnection>,
    school_id: Uuid,
    students: &[Uuid],
) -> anyhow::Result<()> {
    let Some(first) = students.first().copied() else {
        bail!("no students to bill");
    };
    let postings = PostingRepository::new(Arc::clone(db), LedgerSettings::default());
    let student_id = StudentId::from_uuid(first);

    let events = [
        PostingEvent::FeeInvoiced {
            student_id,
            date: date(2024, 9, 9)?,
            items: vec![
                FeeItem {
                    kind: FeeKind::Tuition,
                    description: "First term tuition".to_string(),
                    amount: Amount::new(15_000_000),
                },
                FeeItem {
                    kind: FeeKind::Other,
                    description: "Textbooks".to_string(),
                    amount: Amount::new(2_500_000),
                },
            ],
            reference: Some("INV-0001".to_string()),
        },
        PostingEvent::FeePaymentReceived {
            student_id,
            date: date(2024, 9, 16)?,
            amount: Amount::new(10_000_000),
            method: PaymentMethod::Bank,
            reference: Some("RCP-0001".to_string()),
        },
        PostingEvent::WalletTopUp {
            student_id,
            date: date(2024, 9, 16)?,
            amount: Amount::new(500_000),
            method: PaymentMethod::Cash,
        },
        PostingEvent::ExpenseRecorded {
            date: date(2024, 9, 20)?,
            description: "Chalk and markers".to_string(),
            amount: Amount::new(350_000),
            expense_account: None,
            payment: ExpensePayment::Cash,
            reference: None,
        },
    ];
    for event in events {
        let entry = postings.post_event(school_id, event).await?;
        info!(entry_number = %entry.entry.entry_number, "Seeded posting");
    }
    Ok(())
}
