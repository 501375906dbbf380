//! Household application intake and review.
//!
//! Applicants submit a district and optional coordinates. Reviewers approve or reject
//! each pending application exactly once; approval admits the applicant as a catalog
//! household bound to the nearest in-district station within the requested radius.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSubmission, CoordinateSource,
};
pub use repository::{ApplicationRepository, InMemoryApplicationRepository, RepositoryError};
pub use router::application_router;
pub use service::{ApplicationServiceError, HouseholdApplicationService};
