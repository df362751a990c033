//! Single-flight submission of a form to the backend

use crate::api::{ApiError, FieldErrors};
use crate::state::{EntityId, WizardController, WizardForm};

/// What came back from a create call, as the form sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Success(EntityId),
    ValidationFailure(FieldErrors),
    Rejected(String),
    NetworkFailure(String),
    SessionExpired,
}

impl From<Result<EntityId, ApiError>> for SubmissionResult {
    fn from(result: Result<EntityId, ApiError>) -> Self {
        match result {
            Ok(id) => Self::Success(id),
            Err(ApiError::Fields(fields)) => Self::ValidationFailure(fields),
            Err(ApiError::SessionExpired) => Self::SessionExpired,
            Err(ApiError::Network(message)) => Self::NetworkFailure(message),
            Err(ApiError::Rejected { message, .. }) => Self::Rejected(message),
            Err(other) => Self::Rejected(other.to_string()),
        }
    }
}

/// Proof that a submission was started; required to finish it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTicket(u64);

/// What the screen should do once a submission settles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(EntityId),
    /// Errors were written into the wizard
    FieldErrors,
    /// Show a global notification; the form stays as it is
    Notify(String),
    Reauthenticate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmissionController {
    in_flight: Option<SubmitTicket>,
    issued: u64,
}

impl FormSubmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a submission; `None` while another one is still running
    pub fn begin(&mut self) -> Option<SubmitTicket> {
        if self.in_flight.is_some() {
            tracing::debug!("submission already in flight, ignoring");
            return None;
        }
        self.issued += 1;
        let ticket = SubmitTicket(self.issued);
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Release the in-flight slot; false if `ticket` is not the current one
    pub fn complete(&mut self, ticket: SubmitTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Settle a submission, writing field errors into `wizard`
    pub fn finish(
        &mut self,
        ticket: SubmitTicket,
        result: SubmissionResult,
        wizard: &mut WizardController,
        form: &impl WizardForm,
    ) -> Option<SubmitOutcome> {
        if !self.complete(ticket) {
            return None;
        }
        let outcome = match result {
            SubmissionResult::Success(id) => SubmitOutcome::Created(id),
            SubmissionResult::ValidationFailure(errors) => {
                let (placed, unplaced): (FieldErrors, FieldErrors) =
                    errors.into_iter().partition(|(field, _)| {
                        (1..=form.step_count()).any(|step| form.step_fields(step).contains(field))
                    });
                wizard.apply_server_errors(form, placed);
                if unplaced.is_empty() {
                    SubmitOutcome::FieldErrors
                } else {
                    // no row can show these
                    let lines: Vec<String> = unplaced
                        .iter()
                        .map(|(field, message)| format!("{field}: {message}"))
                        .collect();
                    SubmitOutcome::Notify(lines.join("\n"))
                }
            }
            SubmissionResult::Rejected(message) => SubmitOutcome::Notify(message),
            SubmissionResult::NetworkFailure(message) => SubmitOutcome::Notify(format!(
                "Could not reach the server ({message}). Please try again."
            )),
            SubmissionResult::SessionExpired => SubmitOutcome::Reauthenticate,
        };
        Some(outcome)
    }
}
