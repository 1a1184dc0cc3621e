//! Teacher repository, including the persisted profile wizard.
//!
//! A wizard run starts with the personal step, which creates a `draft`
//! teacher. Later steps fill in the nullable profile columns, and finishing
//! turns the draft `active` once every step is present.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_core::teachers::{
    ContactDetails, EmploymentDetails, PersonalDetails, ProfileError, ProfileStep,
    Qualifications, TeacherProfile, TeacherProfileDraft, TeacherStatus, WizardStep,
};
use scholaris_shared::AppError;
use scholaris_shared::types::{Amount, PageRequest, PageResponse};

use super::{database_error, domain_error};
use crate::entities::{sea_orm_active_enums, teachers};

/// Error types for teacher operations.
#[derive(Debug, thiserror::Error)]
pub enum TeacherError {
    /// Teacher not found in this school.
    #[error("Teacher not found: {0}")]
    NotFound(Uuid),

    /// Profile data or wizard order rejected.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Profile edits on a teacher whose form is unfinished.
    #[error("Teacher {0} is still a draft; finish the profile form first")]
    StillDraft(Uuid),

    /// Another teacher of the school uses this email.
    #[error("A teacher with email '{0}' already exists")]
    DuplicateEmail(String),

    /// Another teacher of the school uses this staff number.
    #[error("A teacher with staff number '{0}' already exists")]
    DuplicateStaffNumber(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TeacherError> for AppError {
    fn from(err: TeacherError) -> Self {
        match err {
            TeacherError::NotFound(_) => Self::NotFound(err.to_string()),
            TeacherError::Profile(e) => domain_error(e.http_status_code(), e.to_string()),
            TeacherError::StillDraft(_) => Self::BusinessRule(err.to_string()),
            TeacherError::DuplicateEmail(_) | TeacherError::DuplicateStaffNumber(_) => {
                Self::Conflict(err.to_string())
            }
            TeacherError::Database(e) => database_error(&e),
        }
    }
}

/// Filter for listing teachers.
#[derive(Debug, Clone, Default)]
pub struct TeacherFilter {
    /// Case-insensitive match on first name, last name or email.
    pub search: Option<String>,
    /// Only teachers with this status.
    pub status: Option<TeacherStatus>,
}

/// Changes to an existing teacher.
#[derive(Debug, Clone, Default)]
pub struct UpdateTeacherInput {
    /// Replacement profile.
    pub profile: Option<TeacherProfile>,
    /// New status.
    pub status: Option<TeacherStatus>,
}

/// Where a wizard run stands after a step was saved.
#[derive(Debug, Clone, Serialize)]
pub struct WizardProgress {
    /// The teacher as stored.
    pub teacher: teachers::Model,
    /// Step to show next, `None` when the form can be finished.
    pub next_step: Option<WizardStep>,
    /// Number of steps filled in.
    pub completed_steps: usize,
}

/// Teacher repository.
#[derive(Debug, Clone)]
pub struct TeacherRepository {
    db: Arc<DatabaseConnection>,
}

impl TeacherRepository {
    /// Creates a new teacher repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Starts a wizard run with the personal step, creating a draft teacher.
    ///
    /// # Errors
    ///
    /// Returns `Profile` if the personal details are invalid.
    pub async fn start_wizard(
        &self,
        school_id: Uuid,
        personal: PersonalDetails,
    ) -> Result<WizardProgress, TeacherError> {
        let mut draft = TeacherProfileDraft::default();
        let step = ProfileStep::Personal(personal);
        let next_step = draft.apply_step(step.clone())?;

        let now = Utc::now().into();
        let mut model = empty_teacher(school_id, now);
        write_step(&mut model, &step);
        let teacher = model.insert(self.db.as_ref()).await?;

        info!(%school_id, teacher_id = %teacher.id, "Teacher draft started");
        Ok(WizardProgress {
            teacher,
            next_step,
            completed_steps: draft.completed_steps(),
        })
    }

    /// Saves one wizard step on a draft teacher.
    ///
    /// Earlier steps may be resubmitted; a step ahead of the first missing
    /// one is rejected without writing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Profile` for invalid data, wizard order or a
    /// non-draft teacher, and `DuplicateEmail`/`DuplicateStaffNumber`.
    pub async fn save_step(
        &self,
        school_id: Uuid,
        teacher_id: Uuid,
        step: ProfileStep,
    ) -> Result<WizardProgress, TeacherError> {
        let teacher = self.find(school_id, teacher_id).await?;
        ensure_draft(&teacher, TeacherStatus::Draft)?;

        let mut draft = draft_from_model(&teacher);
        let next_step = draft.apply_step(step.clone()).inspect_err(|e| {
            warn!(%school_id, %teacher_id, error = %e, "Wizard step rejected");
        })?;
        self.ensure_unique(school_id, Some(teacher_id), &step).await?;

        let mut model = teacher.into_active_model();
        write_step(&mut model, &step);
        model.updated_at = Set(Utc::now().into());
        let teacher = model.update(self.db.as_ref()).await?;

        info!(%school_id, %teacher_id, step = %step.step(), "Wizard step saved");
        Ok(WizardProgress {
            teacher,
            next_step,
            completed_steps: draft.completed_steps(),
        })
    }

    /// Finishes the wizard: checks every step is present and activates the
    /// teacher.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Profile(IncompleteStep)` or
    /// `Profile(InvalidStatusChange)` when the teacher is no longer a draft.
    pub async fn finish_wizard(
        &self,
        school_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<teachers::Model, TeacherError> {
        let teacher = self.find(school_id, teacher_id).await?;
        ensure_draft(&teacher, TeacherStatus::Active)?;
        draft_from_model(&teacher).finish()?;

        let mut model = teacher.into_active_model();
        model.status = Set(sea_orm_active_enums::TeacherStatus::Active);
        model.updated_at = Set(Utc::now().into());
        let teacher = model.update(self.db.as_ref()).await?;

        info!(%school_id, %teacher_id, "Teacher profile completed");
        Ok(teacher)
    }

    /// Creates an active teacher from a complete profile in one call.
    ///
    /// # Errors
    ///
    /// Returns `Profile` for invalid data and `DuplicateEmail` or
    /// `DuplicateStaffNumber`.
    pub async fn create(
        &self,
        school_id: Uuid,
        profile: TeacherProfile,
    ) -> Result<teachers::Model, TeacherError> {
        let steps = checked_steps(profile)?;
        for step in &steps {
            self.ensure_unique(school_id, None, step).await?;
        }

        let now = Utc::now().into();
        let mut model = empty_teacher(school_id, now);
        for step in &steps {
            write_step(&mut model, step);
        }
        model.status = Set(sea_orm_active_enums::TeacherStatus::Active);
        let teacher = model.insert(self.db.as_ref()).await?;

        info!(%school_id, teacher_id = %teacher.id, "Teacher created");
        Ok(teacher)
    }

    /// Gets a teacher by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the teacher does not belong to the school.
    pub async fn get(&self, school_id: Uuid, teacher_id: Uuid) -> Result<teachers::Model, TeacherError> {
        self.find(school_id, teacher_id).await
    }

    /// Lists teachers by last name, then first name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: TeacherFilter,
        page: PageRequest,
    ) -> Result<PageResponse<teachers::Model>, TeacherError> {
        let mut query = teachers::Entity::find().filter(teachers::Column::SchoolId.eq(school_id));

        if let Some(status) = filter.status {
            query = query.filter(
                teachers::Column::Status.eq(sea_orm_active_enums::TeacherStatus::from(status)),
            );
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = LikeExpr::new(contains_pattern(&search.to_lowercase())).escape('\\');
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(teachers::Column::FirstName))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(teachers::Column::LastName))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(teachers::Column::Email))).like(pattern)),
            );
        }

        let total = query.clone().count(self.db.as_ref()).await?;
        let teachers = query
            .order_by_asc(teachers::Column::LastName)
            .order_by_asc(teachers::Column::FirstName)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await?;

        Ok(PageResponse::new(teachers, page.page, page.per_page, total))
    }

    /// Replaces the profile and/or changes the status of a finished teacher.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `StillDraft` for a profile edit on a draft,
    /// `Profile` for invalid data or status changes, and the duplicate errors.
    pub async fn update(
        &self,
        school_id: Uuid,
        teacher_id: Uuid,
        input: UpdateTeacherInput,
    ) -> Result<teachers::Model, TeacherError> {
        let teacher = self.find(school_id, teacher_id).await?;
        let current = TeacherStatus::from(teacher.status);

        let steps = match input.profile {
            Some(_) if current == TeacherStatus::Draft => {
                return Err(TeacherError::StillDraft(teacher_id));
            }
            Some(profile) => checked_steps(profile)?,
            None => Vec::new(),
        };
        if let Some(status) = input.status
            && status != current
        {
            current.check_transition(status)?;
        }
        for step in &steps {
            self.ensure_unique(school_id, Some(teacher_id), step).await?;
        }

        let mut model = teacher.into_active_model();
        for step in &steps {
            write_step(&mut model, step);
        }
        if let Some(status) = input.status {
            model.status = Set(status.into());
        }
        model.updated_at = Set(Utc::now().into());
        let teacher = model.update(self.db.as_ref()).await?;

        info!(%school_id, %teacher_id, status = %TeacherStatus::from(teacher.status), "Teacher updated");
        Ok(teacher)
    }

    /// Deletes a teacher. Classes they led keep running without one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the teacher does not belong to the school.
    pub async fn delete(&self, school_id: Uuid, teacher_id: Uuid) -> Result<(), TeacherError> {
        let result = teachers::Entity::delete_many()
            .filter(teachers::Column::SchoolId.eq(school_id))
            .filter(teachers::Column::Id.eq(teacher_id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(TeacherError::NotFound(teacher_id));
        }
        info!(%school_id, %teacher_id, "Teacher deleted");
        Ok(())
    }

    async fn find(&self, school_id: Uuid, teacher_id: Uuid) -> Result<teachers::Model, TeacherError> {
        teachers::Entity::find_by_id(teacher_id)
            .filter(teachers::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(TeacherError::NotFound(teacher_id))
    }

    async fn ensure_unique(
        &self,
        school_id: Uuid,
        exclude: Option<Uuid>,
        step: &ProfileStep,
    ) -> Result<(), TeacherError> {
        let (column, value, err): (teachers::Column, String, fn(String) -> TeacherError) = match step {
            ProfileStep::Contact(contact) => (
                teachers::Column::Email,
                contact.normalized_email(),
                TeacherError::DuplicateEmail,
            ),
            ProfileStep::Employment(employment) => (
                teachers::Column::StaffNumber,
                employment.staff_number.trim().to_string(),
                TeacherError::DuplicateStaffNumber,
            ),
            ProfileStep::Personal(_) | ProfileStep::Qualifications(_) => return Ok(()),
        };

        let mut query = teachers::Entity::find()
            .filter(teachers::Column::SchoolId.eq(school_id))
            .filter(column.eq(value.clone()));
        if let Some(id) = exclude {
            query = query.filter(teachers::Column::Id.ne(id));
        }
        if query.count(self.db.as_ref()).await? > 0 {
            warn!(%school_id, "Duplicate teacher identity rejected");
            return Err(err(value));
        }
        Ok(())
    }
}

/// Rejects wizard writes on teachers that already left the draft state.
fn ensure_draft(teacher: &teachers::Model, requested: TeacherStatus) -> Result<(), TeacherError> {
    let current = TeacherStatus::from(teacher.status);
    if current == TeacherStatus::Draft {
        return Ok(());
    }
    Err(ProfileError::InvalidStatusChange {
        from: current.as_str().to_string(),
        to: requested.as_str().to_string(),
    }
    .into())
}

/// Runs a complete profile through the wizard so every step and the
/// cross-step rules are checked, then returns the steps in form order.
fn checked_steps(profile: TeacherProfile) -> Result<Vec<ProfileStep>, ProfileError> {
    let steps = vec![
        ProfileStep::Personal(profile.personal),
        ProfileStep::Contact(profile.contact),
        ProfileStep::Qualifications(profile.qualifications),
        ProfileStep::Employment(profile.employment),
    ];
    let mut draft = TeacherProfileDraft::default();
    for step in &steps {
        draft.apply_step(step.clone())?;
    }
    draft.finish()?;
    Ok(steps)
}

fn empty_teacher(school_id: Uuid, now: sea_orm::prelude::DateTimeWithTimeZone) -> teachers::ActiveModel {
    teachers::ActiveModel {
        id: Set(Uuid::now_v7()),
        school_id: Set(school_id),
        status: Set(sea_orm_active_enums::TeacherStatus::Draft),
        first_name: Set(None),
        last_name: Set(None),
        gender: Set(None),
        date_of_birth: Set(None),
        email: Set(None),
        phone: Set(None),
        address: Set(None),
        highest_qualification: Set(None),
        specialization: Set(None),
        subjects: Set(serde_json::json!([])),
        staff_number: Set(None),
        employment_date: Set(None),
        employment_type: Set(None),
        salary: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn write_step(model: &mut teachers::ActiveModel, step: &ProfileStep) {
    match step {
        ProfileStep::Personal(d) => {
            model.first_name = Set(Some(d.first_name.trim().to_string()));
            model.last_name = Set(Some(d.last_name.trim().to_string()));
            model.gender = Set(Some(d.gender.into()));
            model.date_of_birth = Set(Some(d.date_of_birth));
        }
        ProfileStep::Contact(d) => {
            model.email = Set(Some(d.normalized_email()));
            model.phone = Set(Some(d.phone.trim().to_string()));
            model.address = Set(d.address.clone());
        }
        ProfileStep::Qualifications(d) => {
            model.highest_qualification = Set(Some(d.highest_qualification.trim().to_string()));
            model.specialization = Set(d.specialization.clone());
            model.subjects = Set(serde_json::json!(d.subjects));
        }
        ProfileStep::Employment(d) => {
            model.staff_number = Set(Some(d.staff_number.trim().to_string()));
            model.employment_date = Set(Some(d.employment_date));
            model.employment_type = Set(Some(d.employment_type.into()));
            model.salary = Set(Some(d.salary.minor()));
        }
    }
}

/// Rebuilds the wizard draft from the stored columns. A step counts as
/// present only when all of its required columns are set.
fn draft_from_model(teacher: &teachers::Model) -> TeacherProfileDraft {
    let personal = match (
        &teacher.first_name,
        &teacher.last_name,
        teacher.gender,
        teacher.date_of_birth,
    ) {
        (Some(first_name), Some(last_name), Some(gender), Some(date_of_birth)) => {
            Some(PersonalDetails {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                gender: gender.into(),
                date_of_birth,
            })
        }
        _ => None,
    };

    let contact = match (&teacher.email, &teacher.phone) {
        (Some(email), Some(phone)) => Some(ContactDetails {
            email: email.clone(),
            phone: phone.clone(),
            address: teacher.address.clone(),
        }),
        _ => None,
    };

    let qualifications = teacher
        .highest_qualification
        .as_ref()
        .map(|highest| Qualifications {
            highest_qualification: highest.clone(),
            specialization: teacher.specialization.clone(),
            subjects: serde_json::from_value(teacher.subjects.clone()).unwrap_or_default(),
        });

    let employment = match (
        &teacher.staff_number,
        teacher.employment_date,
        teacher.employment_type,
        teacher.salary,
    ) {
        (Some(staff_number), Some(employment_date), Some(employment_type), Some(salary)) => {
            Some(EmploymentDetails {
                staff_number: staff_number.clone(),
                employment_date,
                employment_type: employment_type.into(),
                salary: Amount::new(salary),
            })
        }
        _ => None,
    };

    TeacherProfileDraft {
        personal,
        contact,
        qualifications,
        employment,
    }
}

/// `%text%` with `\`, `%` and `_` escaped, so search text matches literally.
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::repositories::transaction_log;
    use scholaris_core::teachers::Gender;

    fn personal() -> PersonalDetails {
        PersonalDetails {
            first_name: "Ngozi".into(),
            last_name: "Okafor".into(),
            gender: Gender::Female,
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 12).unwrap(),
        }
    }

    fn stored_draft(school_id: Uuid) -> teachers::Model {
        let now = Utc::now().into();
        teachers::Model {
            id: Uuid::now_v7(),
            school_id,
            status: sea_orm_active_enums::TeacherStatus::Draft,
            first_name: Some("Ngozi".into()),
            last_name: Some("Okafor".into()),
            gender: Some(sea_orm_active_enums::Gender::Female),
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 12),
            email: None,
            phone: None,
            address: None,
            highest_qualification: None,
            specialization: None,
            subjects: serde_json::json!([]),
            staff_number: None,
            employment_date: None,
            employment_type: None,
            salary: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_draft_from_model_only_counts_complete_steps() {
        let mut model = stored_draft(Uuid::now_v7());
        model.email = Some("ngozi@example.com".into());

        let draft = draft_from_model(&model);
        assert!(draft.personal.is_some());
        // Phone is still missing.
        assert!(draft.contact.is_none());
        assert_eq!(draft.next_step(), Some(WizardStep::Contact));
    }

    #[test]
    fn test_ensure_draft_rejects_active_teacher() {
        let mut model = stored_draft(Uuid::now_v7());
        model.status = sea_orm_active_enums::TeacherStatus::Active;
        let err = ensure_draft(&model, TeacherStatus::Active).unwrap_err();
        assert!(matches!(
            err,
            TeacherError::Profile(ProfileError::InvalidStatusChange { .. })
        ));
    }

    #[tokio::test]
    async fn test_step_ahead_of_form_is_not_written() {
        let school_id = Uuid::now_v7();
        let model = stored_draft(school_id);
        let teacher_id = model.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model]])
            .into_connection();
        let db = Arc::new(db);
        let repo = TeacherRepository::new(Arc::clone(&db));

        let err = repo
            .save_step(
                school_id,
                teacher_id,
                ProfileStep::Qualifications(Qualifications {
                    highest_qualification: "B.Ed".into(),
                    specialization: None,
                    subjects: vec!["Mathematics".into()],
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TeacherError::Profile(ProfileError::StepOutOfOrder {
                expected: WizardStep::Contact,
                got: WizardStep::Qualifications,
            })
        ));

        drop(repo);
        let log = transaction_log(db);
        assert_eq!(log.len(), 1, "only the lookup should run");
    }

    #[tokio::test]
    async fn test_teacher_of_other_school_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<teachers::Model>::new()])
            .into_connection();
        let repo = TeacherRepository::new(Arc::new(db));
        let id = Uuid::now_v7();

        let err = repo.get(Uuid::now_v7(), id).await.unwrap_err();
        assert!(matches!(err, TeacherError::NotFound(found) if found == id));
    }

    #[tokio::test]
    async fn test_invalid_first_step_creates_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = TeacherRepository::new(Arc::new(db));
        let mut details = personal();
        details.first_name = "  ".into();

        let err = repo.start_wizard(Uuid::now_v7(), details).await.unwrap_err();
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 400);
    }

    #[test]
    fn test_search_text_matches_literally() {
        assert_eq!(contains_pattern("ngozi"), "%ngozi%");
        assert_eq!(contains_pattern("100%"), r"%100\%%");
        assert_eq!(contains_pattern("a_b"), r"%a\_b%");
        assert_eq!(contains_pattern(r"c:\x"), r"%c:\\x%");
    }
}
