//! Multi-step form progression

use crate::api::FieldErrors;

/// A form that can be split into validated steps
pub trait WizardForm {
    fn step_count(&self) -> usize;

    /// Names of the fields shown on `step` (1-based)
    fn step_fields(&self, step: usize) -> Vec<String>;

    /// Check the fields on `step`, returning one message per bad field
    fn validate_step(&self, step: usize) -> FieldErrors;
}

/// Current step and error messages for a form being filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardController {
    current: usize,
    steps: usize,
    errors: FieldErrors,
}

impl WizardController {
    pub fn new(steps: usize) -> Self {
        Self {
            current: 1,
            steps: steps.max(1),
            errors: FieldErrors::new(),
        }
    }

    pub fn for_form(form: &impl WizardForm) -> Self {
        Self::new(form.step_count())
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_last_step(&self) -> bool {
        self.current == self.steps
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Validate the current step and advance when it passes
    pub fn next(&mut self, form: &impl WizardForm) -> bool {
        if self.is_last_step() {
            return false;
        }
        if !self.check(form, self.current) {
            return false;
        }
        self.current += 1;
        true
    }

    /// Step back without validating
    pub fn back(&mut self, form: &impl WizardForm) -> bool {
        if self.current == 1 {
            return false;
        }
        self.current -= 1;
        for step in self.current + 1..=self.steps {
            for field in form.step_fields(step) {
                self.errors.remove(&field);
            }
        }
        true
    }

    /// Validate the last step; true means the form may be sent
    pub fn submit(&mut self, form: &impl WizardForm) -> bool {
        self.is_last_step() && self.check(form, self.current)
    }

    fn check(&mut self, form: &impl WizardForm, step: usize) -> bool {
        for field in form.step_fields(step) {
            self.errors.remove(&field);
        }
        let problems = form.validate_step(step);
        let ok = problems.is_empty();
        self.errors.extend(problems);
        ok
    }

    /// Show errors reported by the backend, moving to the first step that
    /// holds one of the rejected fields
    pub fn apply_server_errors(&mut self, form: &impl WizardForm, errors: FieldErrors) {
        let first_step = (1..=self.steps).find(|step| {
            form.step_fields(*step)
                .iter()
                .any(|field| errors.contains_key(field))
        });
        if let Some(step) = first_step {
            self.current = step;
        }
        self.errors.extend(errors);
    }

    /// Drop the message for a field the user just edited
    pub fn clear_error(&mut self, field: &str) {
        self.errors.remove(field);
    }
}
