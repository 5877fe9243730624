use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use super::digest::{DigestDraft, DigestId, DigestRecord, DigestUpdate};
use super::phone::PhoneMask;
use super::schedule;
use crate::error::{FormError, MutationError, ValidationError};
use crate::sync::gateway::MutationGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    FullName,
    Phone,
    Timezone,
    NotifyOn,
    Enabled,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::FullName,
        Field::Phone,
        Field::Timezone,
        Field::NotifyOn,
        Field::Enabled,
    ];

    fn rule(self) -> Rule {
        match self {
            Field::FullName => Rule::NonEmpty,
            Field::Phone => Rule::MaskedPhone,
            Field::Timezone => Rule::KnownTimezone,
            Field::NotifyOn => Rule::TimeOfDay,
            Field::Enabled => Rule::Flag,
        }
    }
}

/// Named validation rules, one per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    NonEmpty,
    MaskedPhone,
    KnownTimezone,
    TimeOfDay,
    Flag,
}

impl Rule {
    fn check(self, value: &FieldValue, mask: &PhoneMask) -> Result<(), ValidationError> {
        let text = match value {
            FieldValue::Text(s) => s.as_str(),
            FieldValue::Flag(_) => return Ok(()),
        };
        match self {
            Rule::NonEmpty if text.trim().is_empty() => Err(ValidationError::EmptyName),
            Rule::MaskedPhone if !mask.is_complete(text) => Err(ValidationError::InvalidPhone {
                mask: mask.mask().to_string(),
            }),
            Rule::KnownTimezone if schedule::parse_timezone(text).is_none() => {
                Err(ValidationError::UnknownTimezone(text.to_string()))
            }
            Rule::TimeOfDay if schedule::parse_time_of_day(text).is_none() => {
                Err(ValidationError::InvalidTime)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub value: FieldValue,
    pub error: Option<ValidationError>,
}

impl FieldState {
    fn text(value: impl Into<String>) -> Self {
        Self {
            value: FieldValue::Text(value.into()),
            error: None,
        }
    }

    fn flag(value: bool) -> Self {
        Self {
            value: FieldValue::Flag(value),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Editing,
    Submitting,
    Success,
    Error(MutationError),
}

/// What the form asks the gateway to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(DigestDraft),
    Update(DigestUpdate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Saved(SaveKind, DigestRecord),
    Failed(MutationError),
    /// A result arrived while the form was not submitting.
    Ignored,
}

impl FormOutcome {
    /// Outcome of a save whose form is no longer around to record it.
    pub fn settled(kind: SaveKind, result: Result<DigestRecord, MutationError>) -> Self {
        match result {
            Ok(record) => FormOutcome::Saved(kind, record),
            Err(e) => {
                log::warn!("Saving contact failed after its form closed: {}", e);
                FormOutcome::Failed(e)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactForm {
    editing: Option<DigestId>,
    fields: BTreeMap<Field, FieldState>,
    phase: FormPhase,
    mask: PhoneMask,
    timezone_seeded: bool,
}

impl ContactForm {
    /// Empty form for a new contact.
    pub fn create(mask: PhoneMask) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(Field::FullName, FieldState::text(""));
        fields.insert(Field::Phone, FieldState::text(""));
        fields.insert(Field::Timezone, FieldState::text(""));
        fields.insert(Field::NotifyOn, FieldState::text(""));
        fields.insert(Field::Enabled, FieldState::flag(true));
        Self {
            editing: None,
            fields,
            phase: FormPhase::Idle,
            mask,
            timezone_seeded: false,
        }
    }

    /// Form seeded from an existing contact, with the stored UTC time shown
    /// in the contact's own timezone as of `today`.
    pub fn edit(record: &DigestRecord, mask: PhoneMask, today: NaiveDate) -> Self {
        let local = match schedule::parse_timezone(&record.timezone) {
            Some(tz) => schedule::convert_to_local(record.notify_on, tz, today).time,
            None => {
                log::warn!(
                    "Contact {} has unknown timezone {:?}, showing UTC time",
                    record.id,
                    record.timezone
                );
                record.notify_on
            }
        };

        let mut form = Self::create(mask);
        form.editing = Some(record.id);
        form.timezone_seeded = true;
        form.put(Field::FullName, FieldState::text(record.full_name.clone()));
        form.put(Field::Phone, FieldState::text(record.phone.clone()));
        form.put(Field::Timezone, FieldState::text(record.timezone.clone()));
        form.put(Field::NotifyOn, FieldState::text(format_input_time(local)));
        form.put(Field::Enabled, FieldState::flag(record.enabled));
        form
    }

    fn put(&mut self, field: Field, state: FieldState) {
        self.fields.insert(field, state);
    }

    /// The hosting surface became visible.
    pub fn open(&mut self) {
        if matches!(self.phase, FormPhase::Idle | FormPhase::Success) {
            self.phase = FormPhase::Editing;
        }
    }

    /// Fill the timezone from `guess` the first time this is called, and
    /// only if the field is still empty. Returns whether the guess was used.
    pub fn seed_timezone(&mut self, guess: impl FnOnce() -> Tz) -> bool {
        if self.timezone_seeded {
            return false;
        }
        self.timezone_seeded = true;
        if !self.text(Field::Timezone).is_empty() {
            return false;
        }
        let tz = guess();
        log::debug!("Seeding contact form timezone with {}", tz.name());
        if let Some(state) = self.fields.get_mut(&Field::Timezone) {
            state.value = FieldValue::Text(tz.name().to_string());
        }
        true
    }

    pub fn set_text(&mut self, field: Field, value: String) {
        let value = if field == Field::Phone {
            self.mask.apply(&value)
        } else {
            value
        };
        self.touch(field, FieldValue::Text(value));
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.touch(Field::Enabled, FieldValue::Flag(enabled));
    }

    fn touch(&mut self, field: Field, value: FieldValue) {
        if let Some(state) = self.fields.get_mut(&field) {
            state.value = value;
            state.error = None;
        }
        if matches!(self.phase, FormPhase::Idle | FormPhase::Error(_)) {
            self.phase = FormPhase::Editing;
        }
    }

    pub fn field(&self, field: Field) -> Option<&FieldState> {
        self.fields.get(&field)
    }

    pub fn text(&self, field: Field) -> &str {
        match self.fields.get(&field).map(|s| &s.value) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(
            self.fields.get(&Field::Enabled).map(|s| &s.value),
            Some(FieldValue::Flag(true))
        )
    }

    pub fn error(&self, field: Field) -> Option<&ValidationError> {
        self.fields.get(&field).and_then(|s| s.error.as_ref())
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn editing_id(&self) -> Option<DigestId> {
        self.editing
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// Whether the save affordance is enabled.
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, FormPhase::Editing | FormPhase::Error(_))
    }

    /// Current offset of the selected timezone, for display next to the picker.
    pub fn offset_hint(&self) -> Option<String> {
        let tz = schedule::parse_timezone(self.text(Field::Timezone))?;
        Some(schedule::format_offset(schedule::utc_offset(tz, Utc::now())))
    }

    /// Run every field rule, recording errors in the field map.
    pub fn validate(&mut self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        for field in Field::ALL {
            if let Some(state) = self.fields.get_mut(&field) {
                state.error = field.rule().check(&state.value, &self.mask).err();
                if let Some(e) = &state.error {
                    errors.push(e.clone());
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, convert the local time to UTC and move to `Submitting`.
    ///
    /// `reference` is the local date the time is projected on; `None` means
    /// today in the chosen timezone.
    pub fn begin_submit(&mut self, reference: Option<NaiveDate>) -> Result<Submission, FormError> {
        match self.phase {
            FormPhase::Submitting => return Err(FormError::InFlight),
            FormPhase::Idle | FormPhase::Success => return Err(FormError::NotEditing),
            FormPhase::Editing | FormPhase::Error(_) => {}
        }

        self.validate().map_err(FormError::Invalid)?;

        let (tz, local) = match (
            schedule::parse_timezone(self.text(Field::Timezone)),
            schedule::parse_time_of_day(self.text(Field::NotifyOn)),
        ) {
            (Some(tz), Some(local)) => (tz, local),
            _ => return Err(FormError::Invalid(vec![ValidationError::InvalidTime])),
        };
        let date = reference.unwrap_or_else(|| schedule::today_in(tz));
        let notify_on = schedule::convert_to_utc(local, tz, date);

        let draft = DigestDraft {
            full_name: self.text(Field::FullName).trim().to_string(),
            phone: self.text(Field::Phone).to_string(),
            timezone: tz.name().to_string(),
            notify_on,
            enabled: self.enabled(),
        };

        self.phase = FormPhase::Submitting;
        Ok(match self.editing {
            Some(id) => Submission::Update(DigestUpdate { id, draft }),
            None => Submission::Create(draft),
        })
    }

    /// Record the result of the request started by [`Self::begin_submit`].
    pub fn finish(&mut self, result: Result<DigestRecord, MutationError>) -> FormOutcome {
        if self.phase != FormPhase::Submitting {
            return FormOutcome::Ignored;
        }
        match result {
            Ok(record) => {
                self.phase = FormPhase::Success;
                let kind = if self.editing.is_some() {
                    SaveKind::Updated
                } else {
                    SaveKind::Created
                };
                FormOutcome::Saved(kind, record)
            }
            Err(e) => {
                log::warn!("Saving contact failed: {}", e);
                self.phase = FormPhase::Error(e.clone());
                FormOutcome::Failed(e)
            }
        }
    }

    /// Submit through `gateway` and wait for the result.
    pub async fn submit(&mut self, gateway: &MutationGateway) -> Result<FormOutcome, FormError> {
        let submission = self.begin_submit(None)?;
        let result = gateway.submit(submission).await;
        Ok(self.finish(result))
    }
}

fn format_input_time(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}
