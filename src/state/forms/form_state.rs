//! Form state management and form structs

use super::field::FormField;
use super::validation::{date_range_problem, is_valid_email, password_problem};
use super::FormRecord;
use crate::api::{ApiError, FieldErrors};
use crate::state::{
    CascadeKind, EntityKind, FormSubmissionController, GroupFlow, LoadedOptions, OptionItem,
    OptionRequest, SelectionCascade, SessionUser, SubmissionResult, SubmitOutcome, SubmitTicket,
    WizardController, WizardForm,
};
use serde_json::Value;

/// Trait for common form operations
pub trait Form {
    fn field_count(&self) -> usize;
    fn active_field(&self) -> usize;
    fn set_active_field(&mut self, index: usize);
    fn next_field(&mut self) {
        let count = self.field_count();
        if count == 0 {
            return;
        }
        let current = self.active_field();
        self.set_active_field((current + 1) % count);
    }
    fn prev_field(&mut self) {
        let count = self.field_count();
        if count == 0 {
            return;
        }
        let current = self.active_field();
        if current == 0 {
            self.set_active_field(count - 1);
        } else {
            self.set_active_field(current - 1);
        }
    }
    fn get_active_field_mut(&mut self) -> Option<&mut FormField>;
}

/// Enum representing all possible form states
#[derive(Debug, Clone, Default)]
pub enum FormState {
    #[default]
    None,
    Login(LoginForm),
    Entity(Box<EntityForm>),
}

impl FormState {
    pub fn next_field(&mut self) {
        match self {
            FormState::None => {}
            FormState::Login(f) => f.next_field(),
            FormState::Entity(f) => f.next_field(),
        }
    }

    pub fn prev_field(&mut self) {
        match self {
            FormState::None => {}
            FormState::Login(f) => f.prev_field(),
            FormState::Entity(f) => f.prev_field(),
        }
    }

    pub fn entity(&self) -> Option<&EntityForm> {
        match self {
            FormState::Entity(f) => Some(f),
            _ => None,
        }
    }

    pub fn entity_mut(&mut self) -> Option<&mut EntityForm> {
        match self {
            FormState::Entity(f) => Some(f),
            _ => None,
        }
    }

    pub fn login_mut(&mut self) -> Option<&mut LoginForm> {
        match self {
            FormState::Login(f) => Some(f),
            _ => None,
        }
    }
}

// Login Form
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub username: FormField,
    pub password: FormField,
    pub active_field_index: usize,
    pub submitting: bool,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            username: FormField::text("username", "Username").required(),
            password: FormField::secret("password", "Password").required(),
            active_field_index: 0,
            submitting: false,
            error: None,
        }
    }

    /// Credentials when both are filled in
    pub fn credentials(&self) -> Option<(String, String)> {
        if self.username.is_blank() || self.password.as_text().is_empty() {
            return None;
        }
        Some((
            self.username.as_text().trim().to_string(),
            self.password.as_text().to_string(),
        ))
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Form for LoginForm {
    fn field_count(&self) -> usize {
        2
    }
    fn active_field(&self) -> usize {
        self.active_field_index
    }
    fn set_active_field(&mut self, index: usize) {
        self.active_field_index = index.min(1);
    }
    fn get_active_field_mut(&mut self) -> Option<&mut FormField> {
        match self.active_field_index {
            0 => Some(&mut self.username),
            _ => Some(&mut self.password),
        }
    }
}

/// One focusable line of an entity form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRow {
    Field(usize),
    Select { cascade: CascadeKind, level: usize },
}

/// Fields and selections of an entity form, without any progress state
#[derive(Debug, Clone)]
pub struct FormBody {
    pub kind: EntityKind,
    pub fields: Vec<FormField>,
    pub organization: Option<SelectionCascade>,
    pub location: Option<SelectionCascade>,
    pub steps: Vec<Vec<FormRow>>,
}

impl FormBody {
    fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Client => Self::client(),
            EntityKind::Admin => Self::admin(),
            EntityKind::Teacher => Self::teacher(),
            EntityKind::Student => Self::student(),
        }
    }

    fn client() -> Self {
        let fields = vec![
            FormField::text("name", "Client Name").required(),
            FormField::text("email", "Email").required(),
            FormField::text("phone_number", "Phone Number"),
            FormField::text("subscription_start_date", "Subscription Start")
                .with_placeholder("YYYY-MM-DD"),
            FormField::text("subscription_end_date", "Subscription End")
                .with_placeholder("YYYY-MM-DD"),
            FormField::toggle("is_user_course", "User Course"),
            FormField::toggle("is_course_program_flow", "Program Flow"),
            FormField::toggle("is_course_batch_flow", "Batch Flow"),
            FormField::toggle("is_s3_enabled", "S3 Storage"),
            FormField::text("s3_bucket_link", "S3 Bucket Link"),
            FormField::text("s3_bucket_name", "S3 Bucket Name"),
            FormField::toggle("is_subscription_base_client", "Subscription Based"),
        ];
        Self {
            kind: EntityKind::Client,
            fields,
            organization: None,
            location: None,
            steps: vec![
                (0..5).map(FormRow::Field).collect(),
                (5..12).map(FormRow::Field).collect(),
            ],
        }
    }

    fn user_fields() -> Vec<FormField> {
        vec![
            FormField::text("first_name", "First Name").required(),
            FormField::text("last_name", "Last Name").required(),
            FormField::text("email", "Email").required(),
            FormField::text("phone_number", "Phone Number"),
            FormField::secret("password", "Password").required(),
            FormField::secret("password_confirm", "Confirm Password").required(),
        ]
    }

    fn selects(cascade: &SelectionCascade) -> impl Iterator<Item = FormRow> + '_ {
        (0..cascade.len()).map(move |level| FormRow::Select {
            cascade: cascade.kind(),
            level,
        })
    }

    fn admin() -> Self {
        let organization = SelectionCascade::client_only();
        let fields = Self::user_fields();
        let step: Vec<FormRow> = Self::selects(&organization)
            .chain((0..fields.len()).map(FormRow::Field))
            .collect();
        Self {
            kind: EntityKind::Admin,
            fields,
            organization: Some(organization),
            location: None,
            steps: vec![step],
        }
    }

    fn teacher() -> Self {
        let mut fields = Self::user_fields();
        fields.push(FormField::text("course", "Course"));
        Self {
            kind: EntityKind::Teacher,
            steps: vec![(0..fields.len()).map(FormRow::Field).collect()],
            fields,
            organization: None,
            location: None,
        }
    }

    fn student() -> Self {
        let organization = SelectionCascade::organization();
        let location = SelectionCascade::location();
        let mut fields = Self::user_fields();
        fields.push(FormField::text("address", "Address"));
        let step: Vec<FormRow> = Self::selects(&organization)
            .chain((0..fields.len()).map(FormRow::Field))
            .chain(Self::selects(&location))
            .collect();
        Self {
            kind: EntityKind::Student,
            fields,
            organization: Some(organization),
            location: Some(location),
            steps: vec![step],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn text(&self, name: &str) -> &str {
        self.field(name).map(FormField::as_text).unwrap_or_default()
    }

    pub fn cascade(&self, kind: CascadeKind) -> Option<&SelectionCascade> {
        match kind {
            CascadeKind::Organization => self.organization.as_ref(),
            CascadeKind::Location => self.location.as_ref(),
        }
    }

    pub fn cascade_mut(&mut self, kind: CascadeKind) -> Option<&mut SelectionCascade> {
        match kind {
            CascadeKind::Organization => self.organization.as_mut(),
            CascadeKind::Location => self.location.as_mut(),
        }
    }

    /// Name a row is validated and reported under
    pub fn row_name(&self, row: FormRow) -> Option<String> {
        match row {
            FormRow::Field(i) => self.fields.get(i).map(|f| f.name.clone()),
            FormRow::Select { cascade, level } => self
                .cascade(cascade)
                .and_then(|c| c.link(level))
                .map(|l| l.field.clone()),
        }
    }

    /// Form data as sent to the backend
    pub fn to_record(&self) -> FormRecord {
        let mut record: FormRecord = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json()))
            .collect();
        for cascade in [&self.organization, &self.location].into_iter().flatten() {
            cascade.record_into(&mut record);
        }
        // the backend stores blank bucket details, not null, when S3 is off
        if self.kind == EntityKind::Client && !self.field("is_s3_enabled").is_some_and(FormField::is_on) {
            record.insert("s3_bucket_link".into(), Value::from(""));
            record.insert("s3_bucket_name".into(), Value::from(""));
        }
        record
    }

    fn require(&self, errors: &mut FieldErrors, name: &str, message: &str) {
        if self.field(name).is_some_and(FormField::is_blank) {
            errors.insert(name.to_string(), message.to_string());
        }
    }

    fn check_email(&self, errors: &mut FieldErrors) {
        let email = self.text("email");
        if email.trim().is_empty() {
            errors.insert("email".into(), "Email is required".into());
        } else if !is_valid_email(email) {
            errors.insert("email".into(), "Enter a valid email address".into());
        }
    }

    fn validate_client(&self, step: usize, errors: &mut FieldErrors) {
        match step {
            1 => {
                self.require(errors, "name", "Client name is required");
                self.check_email(errors);
                if let Some((field, message)) = date_range_problem(
                    self.text("subscription_start_date"),
                    self.text("subscription_end_date"),
                ) {
                    errors.insert(field.to_string(), message.to_string());
                }
            }
            2 => {
                if self.field("is_s3_enabled").is_some_and(FormField::is_on) {
                    self.require(errors, "s3_bucket_link", "S3 bucket link is required");
                    self.require(errors, "s3_bucket_name", "S3 bucket name is required");
                }
            }
            _ => {}
        }
    }

    fn validate_user(&self, errors: &mut FieldErrors) {
        self.require(errors, "first_name", "First name is required");
        self.require(errors, "last_name", "Last name is required");
        self.check_email(errors);

        let password = self.text("password");
        if let Some(problem) = password_problem(password) {
            errors.insert("password".into(), problem.to_string());
        }
        if password != self.text("password_confirm") {
            errors.insert("password_confirm".into(), "Passwords do not match".into());
        }

        if let Some(organization) = &self.organization {
            if organization.selected(0).is_none() {
                errors.insert("client_id".into(), "Please select a client".into());
            }
            match organization.flow() {
                Some(GroupFlow::Program) if organization.selected(1).is_none() => {
                    errors.insert("program".into(), "Please select a program".into());
                }
                Some(GroupFlow::Batch) if organization.selected(1).is_none() => {
                    errors.insert("batch".into(), "Please select a batch".into());
                }
                _ => {}
            }
        }
    }
}

impl WizardForm for FormBody {
    fn step_count(&self) -> usize {
        self.steps.len()
    }

    fn step_fields(&self, step: usize) -> Vec<String> {
        let Some(rows) = step.checked_sub(1).and_then(|i| self.steps.get(i)) else {
            return Vec::new();
        };
        rows.iter().filter_map(|row| self.row_name(*row)).collect()
    }

    fn validate_step(&self, step: usize) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match self.kind {
            EntityKind::Client => self.validate_client(step, &mut errors),
            _ => self.validate_user(&mut errors),
        }
        errors
    }
}

/// A creation form for any entity kind
#[derive(Debug, Clone)]
pub struct EntityForm {
    pub body: FormBody,
    pub wizard: WizardController,
    pub submission: FormSubmissionController,
    pub active_field_index: usize,
}

impl EntityForm {
    /// Build the form for `kind` and the option fetches it needs on open.
    ///
    /// Users who are not superadmins are pinned to their own client.
    pub fn new(kind: EntityKind, session: Option<&SessionUser>) -> (Self, Vec<OptionRequest>) {
        let body = FormBody::for_kind(kind);
        let wizard = WizardController::for_form(&body);
        let mut form = Self {
            body,
            wizard,
            submission: FormSubmissionController::new(),
            active_field_index: 0,
        };

        let own_client = session
            .filter(|user| !user.is_superadmin())
            .and_then(|user| user.client_id);

        let mut requests = Vec::new();
        if let Some(organization) = form.body.organization.as_mut() {
            let request = match own_client {
                Some(id) => organization.lock_root(OptionItem::new(id, "Your organization")),
                None => organization.root_request(),
            };
            requests.extend(request);
            if organization.is_locked() {
                // pinned client row is skipped
                form.active_field_index = 1;
            }
        }
        if let Some(location) = form.body.location.as_mut() {
            requests.extend(location.root_request());
        }
        (form, requests)
    }

    pub fn kind(&self) -> EntityKind {
        self.body.kind
    }

    /// Rows of the current step
    pub fn rows(&self) -> &[FormRow] {
        self.body
            .steps
            .get(self.wizard.current() - 1)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn active_row(&self) -> Option<FormRow> {
        self.rows().get(self.active_field_index).copied()
    }

    fn active_select(&self) -> Option<(CascadeKind, usize)> {
        match self.active_row()? {
            FormRow::Select { cascade, level } => Some((cascade, level)),
            FormRow::Field(_) => None,
        }
    }

    fn active_name(&self) -> Option<String> {
        self.active_row().and_then(|row| self.body.row_name(row))
    }

    fn is_row_locked(&self, row: FormRow) -> bool {
        match row {
            FormRow::Select { cascade, level: 0 } => self
                .body
                .cascade(cascade)
                .is_some_and(SelectionCascade::is_locked),
            _ => false,
        }
    }

    /// Type into the active row
    pub fn input_char(&mut self, c: char) {
        if let Some(name) = self.active_name() {
            self.wizard.clear_error(&name);
        }
        if let Some(field) = self.get_active_field_mut() {
            field.push_char(c);
        }
    }

    /// Backspace: delete a character, or clear a selection
    pub fn backspace(&mut self) -> Option<OptionRequest> {
        if let Some(name) = self.active_name() {
            self.wizard.clear_error(&name);
        }
        if let Some((cascade, level)) = self.active_select() {
            return self
                .body
                .cascade_mut(cascade)
                .and_then(|c| c.on_upstream_change(level, None));
        }
        if let Some(field) = self.get_active_field_mut() {
            field.pop_char();
        }
        None
    }

    /// Move the active selection by `step` options
    pub fn cycle_option(&mut self, step: isize) -> Option<OptionRequest> {
        let (kind, level) = self.active_select()?;
        let cascade = self.body.cascade_mut(kind)?;
        let value = cascade.link(level)?.cycle(step)?;
        if cascade.selected(level) == Some(value) {
            return None;
        }
        let request = cascade.on_upstream_change(level, Some(value));
        if let Some(name) = self.active_name() {
            self.wizard.clear_error(&name);
        }
        request
    }

    pub fn apply_options(
        &mut self,
        request: &OptionRequest,
        result: Result<LoadedOptions, ApiError>,
    ) -> bool {
        match self.body.cascade_mut(request.cascade) {
            Some(cascade) => cascade.apply(request, result),
            None => false,
        }
    }

    pub fn next_step(&mut self) -> bool {
        let moved = self.wizard.next(&self.body);
        if moved {
            self.active_field_index = 0;
        }
        moved
    }

    pub fn back_step(&mut self) -> bool {
        let moved = self.wizard.back(&self.body);
        if moved {
            self.active_field_index = 0;
        }
        moved
    }

    /// Validate and claim the submission slot, returning the record to send
    pub fn begin_submit(&mut self) -> Option<(SubmitTicket, FormRecord)> {
        if self.submission.is_submitting() {
            return None;
        }
        if !self.wizard.submit(&self.body) {
            self.focus_first_error();
            return None;
        }
        let ticket = self.submission.begin()?;
        Some((ticket, self.body.to_record()))
    }

    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: SubmissionResult,
    ) -> Option<SubmitOutcome> {
        let outcome = self
            .submission
            .finish(ticket, result, &mut self.wizard, &self.body);
        if outcome == Some(SubmitOutcome::FieldErrors) {
            self.focus_first_error();
        }
        outcome
    }

    fn focus_first_error(&mut self) {
        let position = self.rows().iter().position(|row| {
            self.body
                .row_name(*row)
                .is_some_and(|name| self.wizard.error(&name).is_some())
        });
        if let Some(position) = position {
            self.active_field_index = position;
        }
    }

    /// Error message to show beside a row
    pub fn row_error(&self, row: FormRow) -> Option<&str> {
        let name = self.body.row_name(row)?;
        self.wizard.error(&name)
    }
}

impl Form for EntityForm {
    fn field_count(&self) -> usize {
        self.rows().len()
    }
    fn active_field(&self) -> usize {
        self.active_field_index
    }
    fn set_active_field(&mut self, index: usize) {
        let last = self.field_count().saturating_sub(1);
        self.active_field_index = index.min(last);
        // skip a pinned client row
        if let Some(row) = self.active_row() {
            if self.is_row_locked(row) && self.field_count() > 1 {
                self.active_field_index = (self.active_field_index + 1) % self.field_count();
            }
        }
    }
    fn prev_field(&mut self) {
        let count = self.field_count();
        if count == 0 {
            return;
        }
        let step_back = |i: usize| if i == 0 { count - 1 } else { i - 1 };
        let mut target = step_back(self.active_field_index);
        if self.rows().get(target).is_some_and(|row| self.is_row_locked(*row)) {
            target = step_back(target);
        }
        self.active_field_index = target;
    }
    fn get_active_field_mut(&mut self) -> Option<&mut FormField> {
        match self.active_row()? {
            FormRow::Field(i) => self.body.fields.get_mut(i),
            FormRow::Select { .. } => None,
        }
    }
}
