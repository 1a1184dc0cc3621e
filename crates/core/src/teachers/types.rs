//! Teacher profile step types and their validation.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use scholaris_shared::types::Amount;
use validator::ValidateEmail;

use super::error::ProfileError;

const MAX_NAME_LEN: usize = 100;
const MAX_STAFF_NUMBER_LEN: usize = 32;
const EARLIEST_YEAR: i32 = 1900;

/// Steps of the teacher profile form, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Names, gender, date of birth.
    Personal,
    /// Email, phone, address.
    Contact,
    /// Education and subjects taught.
    Qualifications,
    /// Staff number, start date, contract, salary.
    Employment,
}

impl WizardStep {
    /// Steps in form order.
    pub const ALL: [Self; 4] = [
        Self::Personal,
        Self::Contact,
        Self::Qualifications,
        Self::Employment,
    ];

    /// 1-based position in the form.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Personal => 1,
            Self::Contact => 2,
            Self::Qualifications => 3,
            Self::Employment => 4,
        }
    }

    /// Step for a 1-based position.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Personal),
            2 => Some(Self::Contact),
            3 => Some(Self::Qualifications),
            4 => Some(Self::Employment),
            _ => None,
        }
    }

    /// Name used in URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Contact => "contact",
            Self::Qualifications => "qualifications",
            Self::Employment => "employment",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = s.parse::<u8>() {
            return Self::from_number(number).ok_or_else(|| ProfileError::UnknownStep(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| ProfileError::UnknownStep(s.to_string()))
    }
}

/// Gender as recorded on staff files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

/// Contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// Permanent full-time staff.
    FullTime,
    /// Part-time staff.
    PartTime,
    /// Fixed-term contract.
    Contract,
}

/// Teacher lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherStatus {
    /// Profile form in progress.
    Draft,
    /// Teaching.
    Active,
    /// Temporarily away.
    OnLeave,
    /// No longer teaching.
    Inactive,
}

impl TeacherStatus {
    /// Lowercase name used in storage and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::OnLeave => "on_leave",
            Self::Inactive => "inactive",
        }
    }

    /// Checks a manual status change.
    ///
    /// Drafts only become active by finishing the form, and nothing returns
    /// to draft.
    pub fn check_transition(self, to: Self) -> Result<(), ProfileError> {
        if !matches!((self, to), (Self::Draft, _) | (_, Self::Draft)) {
            Ok(())
        } else {
            Err(ProfileError::InvalidStatusChange {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for TeacherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Gender.
    pub gender: Gender,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
}

impl PersonalDetails {
    /// Validates the step.
    pub fn validate(&self) -> Result<(), ProfileError> {
        require_name("first_name", &self.first_name)?;
        require_name("last_name", &self.last_name)?;
        if self.date_of_birth.year() < EARLIEST_YEAR {
            return Err(ProfileError::invalid("date_of_birth", "is not a plausible date"));
        }
        Ok(())
    }

    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Step 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    /// Work email, unique within the school.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Home address.
    pub address: Option<String>,
}

impl ContactDetails {
    /// Validates the step.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.email.trim().validate_email() {
            return Err(ProfileError::invalid("email", "is not a valid email address"));
        }
        let digits = self.phone.chars().filter(char::is_ascii_digit).count();
        let allowed = self
            .phone
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || (i == 0 && c == '+'));
        if !allowed || !(7..=15).contains(&digits) {
            return Err(ProfileError::invalid("phone", "must contain 7 to 15 digits"));
        }
        Ok(())
    }

    /// Email in the form used for uniqueness checks.
    #[must_use]
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Step 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifications {
    /// e.g. "B.Ed".
    pub highest_qualification: String,
    /// e.g. "Mathematics Education".
    pub specialization: Option<String>,
    /// Subjects the teacher can take.
    pub subjects: Vec<String>,
}

impl Qualifications {
    /// Validates the step.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.highest_qualification.trim().is_empty() {
            return Err(ProfileError::invalid("highest_qualification", "is required"));
        }
        if self.subjects.is_empty() {
            return Err(ProfileError::invalid("subjects", "at least one subject is required"));
        }
        if self.subjects.iter().any(|s| s.trim().is_empty()) {
            return Err(ProfileError::invalid("subjects", "subject names cannot be blank"));
        }
        Ok(())
    }
}

/// Step 4.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentDetails {
    /// Staff number, unique within the school.
    pub staff_number: String,
    /// First working day.
    pub employment_date: NaiveDate,
    /// Contract type.
    pub employment_type: EmploymentType,
    /// Monthly gross salary in minor units.
    pub salary: Amount,
}

impl EmploymentDetails {
    /// Validates the step.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let staff_number = self.staff_number.trim();
        if staff_number.is_empty() || staff_number.len() > MAX_STAFF_NUMBER_LEN {
            return Err(ProfileError::invalid(
                "staff_number",
                format!("must be 1 to {MAX_STAFF_NUMBER_LEN} characters"),
            ));
        }
        if !staff_number
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
        {
            return Err(ProfileError::invalid(
                "staff_number",
                "may only contain letters, digits, '-' and '/'",
            ));
        }
        if self.employment_date.year() < EARLIEST_YEAR {
            return Err(ProfileError::invalid("employment_date", "is not a plausible date"));
        }
        if !self.salary.is_positive() {
            return Err(ProfileError::invalid("salary", "must be positive"));
        }
        Ok(())
    }
}

/// A submitted step with its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProfileStep {
    /// Step 1.
    Personal(PersonalDetails),
    /// Step 2.
    Contact(ContactDetails),
    /// Step 3.
    Qualifications(Qualifications),
    /// Step 4.
    Employment(EmploymentDetails),
}

impl ProfileStep {
    /// Which step this is.
    #[must_use]
    pub const fn step(&self) -> WizardStep {
        match self {
            Self::Personal(_) => WizardStep::Personal,
            Self::Contact(_) => WizardStep::Contact,
            Self::Qualifications(_) => WizardStep::Qualifications,
            Self::Employment(_) => WizardStep::Employment,
        }
    }

    /// Validates the step data.
    pub fn validate(&self) -> Result<(), ProfileError> {
        match self {
            Self::Personal(d) => d.validate(),
            Self::Contact(d) => d.validate(),
            Self::Qualifications(d) => d.validate(),
            Self::Employment(d) => d.validate(),
        }
    }
}

fn require_name(field: &'static str, value: &str) -> Result<(), ProfileError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::invalid(field, "is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ProfileError::invalid(
            field,
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}
