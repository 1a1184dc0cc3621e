//! The teacher profile draft the wizard fills in step by step.

use serde::{Deserialize, Serialize};

use super::error::ProfileError;
use super::types::{
    ContactDetails, EmploymentDetails, PersonalDetails, ProfileStep, Qualifications, WizardStep,
};

const MIN_AGE_AT_EMPLOYMENT: i32 = 18;

/// Steps filled in so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherProfileDraft {
    /// Step 1.
    pub personal: Option<PersonalDetails>,
    /// Step 2.
    pub contact: Option<ContactDetails>,
    /// Step 3.
    pub qualifications: Option<Qualifications>,
    /// Step 4.
    pub employment: Option<EmploymentDetails>,
}

/// A complete teacher profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherProfile {
    /// Step 1.
    pub personal: PersonalDetails,
    /// Step 2.
    pub contact: ContactDetails,
    /// Step 3.
    pub qualifications: Qualifications,
    /// Step 4.
    pub employment: EmploymentDetails,
}

impl TeacherProfileDraft {
    /// Validates and stores a step, returning the step to show next.
    ///
    /// Earlier steps may be resubmitted; later steps may not be submitted
    /// before the steps ahead of them.
    pub fn apply_step(&mut self, step: ProfileStep) -> Result<Option<WizardStep>, ProfileError> {
        if let Some(expected) = self.next_step()
            && step.step() > expected
        {
            return Err(ProfileError::StepOutOfOrder {
                expected,
                got: step.step(),
            });
        }
        step.validate()?;

        match step {
            ProfileStep::Personal(d) => self.personal = Some(d),
            ProfileStep::Contact(d) => self.contact = Some(d),
            ProfileStep::Qualifications(d) => self.qualifications = Some(d),
            ProfileStep::Employment(d) => self.employment = Some(d),
        }
        Ok(self.next_step())
    }

    /// First step still missing, `None` once all are filled.
    #[must_use]
    pub fn next_step(&self) -> Option<WizardStep> {
        WizardStep::ALL
            .into_iter()
            .find(|step| !self.has_step(*step))
    }

    /// Whether a step has been filled in.
    #[must_use]
    pub fn has_step(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::Personal => self.personal.is_some(),
            WizardStep::Contact => self.contact.is_some(),
            WizardStep::Qualifications => self.qualifications.is_some(),
            WizardStep::Employment => self.employment.is_some(),
        }
    }

    /// Number of steps filled in.
    #[must_use]
    pub fn completed_steps(&self) -> usize {
        WizardStep::ALL.into_iter().filter(|s| self.has_step(*s)).count()
    }

    /// True when every step is filled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.next_step().is_none()
    }

    /// Turns the draft into a complete profile.
    ///
    /// Cross-step rule: the teacher must be at least 18 on the employment date.
    pub fn finish(self) -> Result<TeacherProfile, ProfileError> {
        let Some(personal) = self.personal else {
            return Err(ProfileError::IncompleteStep(WizardStep::Personal));
        };
        let Some(contact) = self.contact else {
            return Err(ProfileError::IncompleteStep(WizardStep::Contact));
        };
        let Some(qualifications) = self.qualifications else {
            return Err(ProfileError::IncompleteStep(WizardStep::Qualifications));
        };
        let Some(employment) = self.employment else {
            return Err(ProfileError::IncompleteStep(WizardStep::Employment));
        };

        let age = employment
            .employment_date
            .years_since(personal.date_of_birth)
            .and_then(|years| i32::try_from(years).ok())
            .unwrap_or(0);
        if age < MIN_AGE_AT_EMPLOYMENT {
            return Err(ProfileError::invalid(
                "date_of_birth",
                format!("teacher must be at least {MIN_AGE_AT_EMPLOYMENT} on the employment date"),
            ));
        }

        Ok(TeacherProfile {
            personal,
            contact,
            qualifications,
            employment,
        })
    }
}

impl From<TeacherProfile> for TeacherProfileDraft {
    fn from(profile: TeacherProfile) -> Self {
        Self {
            personal: Some(profile.personal),
            contact: Some(profile.contact),
            qualifications: Some(profile.qualifications),
            employment: Some(profile.employment),
        }
    }
}
