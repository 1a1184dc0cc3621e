//! Integration tests for teachers, classes, results and exams.
//!
//! Requires a running `PostgreSQL` database; run with
//! `cargo test -p scholaris-db -- --ignored`.

mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{connect, create_school, date};
use scholaris_core::academics::{AcademicSession, Term};
use scholaris_core::exams::{Difficulty, QuestionKind};
use scholaris_core::teachers::{
    ContactDetails, EmploymentDetails, EmploymentType, Gender, PersonalDetails, ProfileError,
    ProfileStep, Qualifications, TeacherStatus, WizardStep,
};
use scholaris_db::entities::sea_orm_active_enums;
use scholaris_db::repositories::{
    ClassError, CreateClassInput, CreateStudentInput, GenerateExamInput, QuestionError,
    QuestionInput, ResultError, TeacherError, TeacherFilter, UpdateClassInput, UpdateTeacherInput,
    UpsertResultInput,
};
use scholaris_db::{
    ClassRepository, ExamRepository, QuestionRepository, ResultRepository, StudentRepository,
    TeacherRepository,
};
use scholaris_shared::types::{Amount, PageRequest};

fn personal(first_name: &str) -> PersonalDetails {
    PersonalDetails {
        first_name: first_name.to_string(),
        last_name: "Olawale".to_string(),
        gender: Gender::Male,
        date_of_birth: date(1985, 6, 14),
    }
}

fn contact(email: &str) -> ProfileStep {
    ProfileStep::Contact(ContactDetails {
        email: email.to_string(),
        phone: "+2348012345678".to_string(),
        address: None,
    })
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_teacher_wizard_end_to_end() {
    let db = connect().await;
    let school = create_school(&db, "Wizard College").await;
    let teachers = TeacherRepository::new(db.clone());

    let started = teachers.start_wizard(school.id, personal("Segun")).await.unwrap();
    let teacher_id = started.teacher.id;
    assert_eq!(started.next_step, Some(WizardStep::Contact));
    assert_eq!(started.teacher.status, sea_orm_active_enums::TeacherStatus::Draft);

    let early = teachers.finish_wizard(school.id, teacher_id).await.unwrap_err();
    assert!(matches!(
        early,
        TeacherError::Profile(ProfileError::IncompleteStep(WizardStep::Contact))
    ));

    teachers
        .save_step(school.id, teacher_id, contact("Segun.Olawale@Example.com"))
        .await
        .unwrap();
    teachers
        .save_step(
            school.id,
            teacher_id,
            ProfileStep::Qualifications(Qualifications {
                highest_qualification: "M.Sc Physics".to_string(),
                specialization: Some("Physics".to_string()),
                subjects: vec!["Physics".to_string(), "Mathematics".to_string()],
            }),
        )
        .await
        .unwrap();
    let last = teachers
        .save_step(
            school.id,
            teacher_id,
            ProfileStep::Employment(EmploymentDetails {
                staff_number: "WC-0007".to_string(),
                employment_date: date(2015, 1, 5),
                employment_type: EmploymentType::FullTime,
                salary: Amount::new(25_000_000),
            }),
        )
        .await
        .unwrap();
    assert_eq!(last.next_step, None);
    assert_eq!(last.completed_steps, 4);
    assert_eq!(last.teacher.email.as_deref(), Some("segun.olawale@example.com"));

    let active = teachers.finish_wizard(school.id, teacher_id).await.unwrap();
    assert_eq!(active.status, sea_orm_active_enums::TeacherStatus::Active);

    // A second draft may not reuse the email.
    let other = teachers.start_wizard(school.id, personal("Tayo")).await.unwrap();
    let err = teachers
        .save_step(school.id, other.teacher.id, contact("segun.olawale@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, TeacherError::DuplicateEmail(_)));

    let found = teachers
        .list(
            school.id,
            TeacherFilter {
                search: Some("SEGUN".to_string()),
                status: Some(TeacherStatus::Active),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(found.data.len(), 1);

    let on_leave = teachers
        .update(
            school.id,
            teacher_id,
            UpdateTeacherInput {
                profile: None,
                status: Some(TeacherStatus::OnLeave),
            },
        )
        .await
        .unwrap();
    assert_eq!(on_leave.status, sea_orm_active_enums::TeacherStatus::OnLeave);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_results_and_class_report() {
    let db = connect().await;
    let school = create_school(&db, "Results Academy").await;
    let classes = ClassRepository::new(db.clone());
    let students = StudentRepository::new(db.clone());
    let results = ResultRepository::new(db.clone());

    let class = classes
        .create(
            school.id,
            CreateClassInput {
                name: "SS 2B".to_string(),
                level: "SS2".to_string(),
                class_teacher_id: None,
                capacity: Some(40),
            },
        )
        .await
        .unwrap();

    let mut ids = Vec::new();
    for (n, name) in ["Ada", "Bola", "Chidi"].iter().enumerate() {
        let student = students
            .create(
                school.id,
                CreateStudentInput {
                    class_id: Some(class.id),
                    admission_number: format!("RA/{n:03}"),
                    first_name: (*name).to_string(),
                    last_name: "Test".to_string(),
                    gender: Gender::Female,
                    date_of_birth: None,
                },
            )
            .await
            .unwrap();
        ids.push(student.id);
    }

    let session = AcademicSession::starting(2024);
    // Ada 85, Bola and Chidi tie on 60.
    for (student_id, ca, exam) in [
        (ids[0], dec!(35), dec!(50)),
        (ids[1], dec!(20), dec!(40)),
        (ids[2], dec!(25), dec!(35)),
    ] {
        results
            .upsert(
                school.id,
                UpsertResultInput {
                    student_id,
                    subject: "Chemistry".to_string(),
                    term: Term::First,
                    session: session.clone(),
                    ca_score: ca,
                    exam_score: exam,
                },
            )
            .await
            .unwrap();
    }

    // Upserting again replaces rather than duplicates.
    let replaced = results
        .upsert(
            school.id,
            UpsertResultInput {
                student_id: ids[0],
                subject: "Chemistry".to_string(),
                term: Term::First,
                session: session.clone(),
                ca_score: dec!(38),
                exam_score: dec!(52),
            },
        )
        .await
        .unwrap();
    assert_eq!(replaced.total, dec!(90));
    assert_eq!(replaced.grade, "A");

    let report = results
        .class_report(school.id, class.id, Term::First, session)
        .await
        .unwrap();
    assert_eq!(report.report.subjects.len(), 1);
    assert_eq!(report.report.subjects[0].count, 3);
    let positions: Vec<u32> = report.report.students.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![1, 2, 2]);

    let err = classes.delete(school.id, class.id).await.unwrap_err();
    assert!(matches!(err, ClassError::HasStudents(3)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_exam_generation_is_reproducible() {
    let db = connect().await;
    let school = create_school(&db, "Exam Grammar").await;
    let bank = QuestionRepository::new(db.clone());
    let exams = ExamRepository::new(db.clone());

    for n in 0..6 {
        bank.create(
            school.id,
            QuestionInput {
                subject: "Geography".to_string(),
                class_level: "JSS3".to_string(),
                topic: None,
                kind: QuestionKind::MultipleChoice,
                difficulty: if n < 4 { Difficulty::Easy } else { Difficulty::Hard },
                body: format!("Question {n}"),
                options: vec!["North".into(), "South".into(), "East".into(), "West".into()],
                answer: Some("North".into()),
                marks: 2,
            },
        )
        .await
        .unwrap();
    }

    let request = GenerateExamInput {
        title: "Mid-term Geography".to_string(),
        subject: "geography".to_string(),
        class_level: "JSS3".to_string(),
        term: Some(Term::Second),
        session: Some(AcademicSession::starting(2024)),
        duration_minutes: Some(45),
        easy: 3,
        medium: 0,
        hard: 1,
        kinds: Vec::new(),
        shuffle_options: true,
        seed: Some(2024),
    };
    let first = exams.generate(school.id, request.clone()).await.unwrap();
    let second = exams.generate(school.id, request).await.unwrap();

    assert_eq!(first.exam.total_marks, 8);
    assert_eq!(first.questions.len(), 4);
    let picks = |e: &scholaris_db::repositories::ExamWithQuestions| {
        e.questions
            .iter()
            .map(|q| (q.question_id, q.options.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(picks(&first), picks(&second));

    let stored = exams.get(school.id, first.exam.id).await.unwrap();
    assert_eq!(picks(&stored), picks(&first));

    let used = first.questions[0].question_id;
    let err = bank.delete(school.id, used).await.unwrap_err();
    assert!(matches!(err, QuestionError::InUse(id) if id == used));

    // Another school sees nothing.
    let stranger = create_school(&db, "Stranger School").await;
    assert!(exams.get(stranger.id, first.exam.id).await.is_err());
    assert!(bank.get(stranger.id, Uuid::now_v7()).await.is_err());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_other_school_cannot_change_or_remove_records() {
    let db = connect().await;
    let owner = create_school(&db, "Owner Academy").await;
    let intruder = create_school(&db, "Intruder Academy").await;
    let teachers = TeacherRepository::new(db.clone());
    let classes = ClassRepository::new(db.clone());
    let students = StudentRepository::new(db.clone());
    let results = ResultRepository::new(db.clone());

    let teacher = teachers.start_wizard(owner.id, personal("Kunle")).await.unwrap().teacher;
    let class = classes
        .create(
            owner.id,
            CreateClassInput {
                name: "JSS 3C".to_string(),
                level: "JSS3".to_string(),
                class_teacher_id: None,
                capacity: None,
            },
        )
        .await
        .unwrap();
    let student = students
        .create(
            owner.id,
            CreateStudentInput {
                class_id: Some(class.id),
                admission_number: "OA/001".to_string(),
                first_name: "Ifeoma".to_string(),
                last_name: "Nwosu".to_string(),
                gender: Gender::Female,
                date_of_birth: None,
            },
        )
        .await
        .unwrap();
    let result = results
        .upsert(
            owner.id,
            UpsertResultInput {
                student_id: student.id,
                subject: "English".to_string(),
                term: Term::Second,
                session: AcademicSession::starting(2024),
                ca_score: dec!(30),
                exam_score: dec!(45),
            },
        )
        .await
        .unwrap();

    let err = teachers
        .update(
            intruder.id,
            teacher.id,
            UpdateTeacherInput {
                profile: None,
                status: Some(TeacherStatus::Inactive),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TeacherError::NotFound(id) if id == teacher.id));
    let err = teachers.delete(intruder.id, teacher.id).await.unwrap_err();
    assert!(matches!(err, TeacherError::NotFound(_)));

    let err = classes
        .update(
            intruder.id,
            class.id,
            UpdateClassInput {
                name: Some("Taken Over".to_string()),
                ..UpdateClassInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClassError::NotFound(id) if id == class.id));
    let err = classes.delete(intruder.id, class.id).await.unwrap_err();
    assert!(matches!(err, ClassError::NotFound(_)));

    let err = results
        .update_scores(intruder.id, result.id, dec!(0), dec!(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ResultError::NotFound(id) if id == result.id));
    let err = results.delete(intruder.id, result.id).await.unwrap_err();
    assert!(matches!(err, ResultError::NotFound(_)));

    // The owner's rows are untouched.
    let kept = teachers.get(owner.id, teacher.id).await.unwrap();
    assert_eq!(kept.status, sea_orm_active_enums::TeacherStatus::Draft);

    let kept = classes.get(owner.id, class.id).await.unwrap();
    assert_eq!(kept.name, "JSS 3C");

    let kept = results.get(owner.id, result.id).await.unwrap();
    assert_eq!(kept.total, dec!(75));
    assert_eq!(kept.grade, result.grade);
}
