//! Teacher management: the multi-step profile form and teacher status.
//!
//! A teacher is created in four steps (personal, contact, qualifications,
//! employment). Each step validates on its own; the profile is only usable
//! once every step has been filled in.

pub mod error;
pub mod profile;
pub mod types;

pub use error::ProfileError;
pub use profile::{TeacherProfile, TeacherProfileDraft};
pub use types::{
    ContactDetails, EmploymentDetails, EmploymentType, Gender, PersonalDetails, ProfileStep,
    Qualifications, TeacherStatus, WizardStep,
};
