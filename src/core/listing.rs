use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::confirm::{ConfirmGate, DeleteLabel, GateAction};
use super::digest::{DigestId, DigestRecord};
use super::form::{ContactForm, FormPhase};
use super::phone::PhoneMask;
use super::schedule;
use crate::error::MutationError;

/// How much of each row to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Every column.
    Full,
    /// Narrow windows: name, phone and enabled badge only.
    Compact,
}

#[derive(Debug, Clone)]
pub struct ContactRow {
    pub record: DigestRecord,
    pub gate: ConfirmGate,
    pub menu_open: bool,
    pub editor: Option<ContactForm>,
}

impl ContactRow {
    fn new(record: DigestRecord) -> Self {
        Self {
            record,
            gate: ConfirmGate::default(),
            menu_open: false,
            editor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: DigestId,
    pub full_name: String,
    pub phone: String,
    pub timezone: Option<String>,
    /// `notify_on` projected into the contact's own timezone.
    pub local_time: Option<NaiveTime>,
    pub opt_in: Option<bool>,
    pub enabled: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub menu_open: bool,
    pub delete_label: DeleteLabel,
    pub delete_enabled: bool,
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    /// Nothing stored yet; show the call to action instead of rows.
    Empty,
    Rows { layout: Layout, rows: Vec<RowView> },
}

#[derive(Debug, Clone, Default)]
pub struct ContactList {
    rows: Vec<ContactRow>,
}

impl ContactList {
    /// Replace the records, keeping menu, gate and editor state of rows
    /// whose id survives.
    pub fn sync(&mut self, records: Vec<DigestRecord>) {
        let mut previous = std::mem::take(&mut self.rows);
        self.rows = records
            .into_iter()
            .map(|record| match previous.iter().position(|r| r.record.id == record.id) {
                Some(idx) => {
                    let mut row = previous.swap_remove(idx);
                    row.record = record;
                    row
                }
                None => ContactRow::new(record),
            })
            .collect();
    }

    pub fn rows(&self) -> &[ContactRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: DigestId) -> Option<&ContactRow> {
        self.rows.iter().find(|r| r.record.id == id)
    }

    fn row_mut(&mut self, id: DigestId) -> Option<&mut ContactRow> {
        self.rows.iter_mut().find(|r| r.record.id == id)
    }

    /// Open or close a row's action menu. Either way an armed delete is
    /// disarmed.
    pub fn toggle_menu(&mut self, id: DigestId) {
        if let Some(row) = self.row_mut(id) {
            row.menu_open = !row.menu_open;
            row.gate.reset();
        }
    }

    /// Feed the row's delete gate. Returns the id to remove once confirmed.
    pub fn trigger_delete(&mut self, id: DigestId) -> Option<DigestId> {
        let row = self.row_mut(id)?;
        match row.gate.trigger() {
            GateAction::Remove => {
                log::debug!("Delete of contact {} confirmed", id);
                Some(id)
            }
            GateAction::None => None,
        }
    }

    /// The remove call for `id` finished. A successful remove closes the
    /// menu; the row itself disappears on the next [`Self::sync`].
    pub fn delete_settled(&mut self, id: DigestId, result: &Result<(), MutationError>) {
        if let Some(row) = self.row_mut(id) {
            row.gate.settle();
            if result.is_ok() {
                row.menu_open = false;
            }
        }
    }

    /// Open the edit form for a row. Returns false if the row is unknown or
    /// already has one open.
    pub fn open_editor(&mut self, id: DigestId, mask: PhoneMask, today: NaiveDate) -> bool {
        let Some(row) = self.row_mut(id) else {
            return false;
        };
        if row.editor.is_some() {
            return false;
        }
        let mut form = ContactForm::edit(&row.record, mask, today);
        form.open();
        row.editor = Some(form);
        row.menu_open = false;
        row.gate.reset();
        true
    }

    pub fn editor(&self, id: DigestId) -> Option<&ContactForm> {
        self.get(id)?.editor.as_ref()
    }

    pub fn editor_mut(&mut self, id: DigestId) -> Option<&mut ContactForm> {
        self.row_mut(id)?.editor.as_mut()
    }

    /// User-initiated close. An editor with a save in flight stays open so
    /// its result lands on it; returns whether the editor was closed.
    pub fn cancel_editor(&mut self, id: DigestId) -> bool {
        let Some(row) = self.row_mut(id) else {
            return false;
        };
        let closable = row
            .editor
            .as_ref()
            .is_some_and(|form| *form.phase() != FormPhase::Submitting);
        if closable {
            row.editor = None;
        }
        closable
    }

    pub fn close_editor(&mut self, id: DigestId) {
        if let Some(row) = self.row_mut(id) {
            row.editor = None;
        }
    }

    pub fn render(&self, layout: Layout, today: NaiveDate) -> ListView {
        if self.rows.is_empty() {
            return ListView::Empty;
        }
        let full = layout == Layout::Full;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let record = &row.record;
                let local_time = match schedule::parse_timezone(&record.timezone) {
                    Some(tz) => schedule::convert_to_local(record.notify_on, tz, today).time,
                    None => record.notify_on,
                };
                RowView {
                    id: record.id,
                    full_name: record.full_name.clone(),
                    phone: record.phone.clone(),
                    timezone: full.then(|| record.timezone.clone()),
                    local_time: full.then_some(local_time),
                    opt_in: full.then_some(record.opt_in),
                    enabled: record.enabled,
                    updated_at: full.then_some(record.updated_at),
                    menu_open: row.menu_open,
                    delete_label: row.gate.label(),
                    delete_enabled: !row.gate.is_inert(),
                    editing: row.editor.is_some(),
                }
            })
            .collect();
        ListView::Rows { layout, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::fixtures::record;
    use crate::core::form::{Field, FormOutcome, SaveKind};

    fn jan15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn list_of(names: &[&str]) -> ContactList {
        let mut list = ContactList::default();
        list.sync(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| record(n, i as u32))
                .collect(),
        );
        list
    }

    #[test]
    fn empty_collection_renders_call_to_action() {
        let list = ContactList::default();
        assert_eq!(list.render(Layout::Full, jan15()), ListView::Empty);
    }

    #[test]
    fn delete_needs_two_triggers() {
        let mut list = list_of(&["Jane"]);
        let id = list.rows()[0].record.id;
        list.toggle_menu(id);
        assert_eq!(list.trigger_delete(id), None);
        assert_eq!(list.trigger_delete(id), Some(id));
        assert_eq!(list.get(id).unwrap().gate, ConfirmGate::Pending);
    }

    #[test]
    fn closing_the_menu_disarms() {
        let mut list = list_of(&["Jane"]);
        let id = list.rows()[0].record.id;
        list.toggle_menu(id);
        assert_eq!(list.trigger_delete(id), None);
        list.toggle_menu(id);
        list.toggle_menu(id);
        assert_eq!(list.trigger_delete(id), None);

        let ListView::Rows { rows, .. } = list.render(Layout::Full, jan15()) else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].delete_label, DeleteLabel::Confirm);
    }

    #[test]
    fn rows_are_independent() {
        let mut list = list_of(&["Jane", "John"]);
        let jane = list.rows()[0].record.id;
        let john = list.rows()[1].record.id;
        list.trigger_delete(jane);
        assert_eq!(list.trigger_delete(john), None);
        assert_eq!(list.trigger_delete(jane), Some(jane));
    }

    #[test]
    fn failed_delete_returns_to_disarmed() {
        let mut list = list_of(&["Jane"]);
        let id = list.rows()[0].record.id;
        list.toggle_menu(id);
        list.trigger_delete(id);
        list.trigger_delete(id);
        list.delete_settled(id, &Err(MutationError::Transport("offline".into())));
        let row = list.get(id).unwrap();
        assert_eq!(row.gate, ConfirmGate::Disarmed);
        assert!(row.menu_open);
    }

    #[test]
    fn pending_delete_disables_action() {
        let mut list = list_of(&["Jane"]);
        let id = list.rows()[0].record.id;
        list.trigger_delete(id);
        list.trigger_delete(id);
        let ListView::Rows { rows, .. } = list.render(Layout::Compact, jan15()) else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].delete_label, DeleteLabel::Deleting);
        assert!(!rows[0].delete_enabled);
    }

    #[test]
    fn sync_keeps_state_of_surviving_rows() {
        let mut list = list_of(&["Jane", "John"]);
        let jane = list.rows()[0].clone().record;
        let john_id = list.rows()[1].record.id;
        list.toggle_menu(jane.id);
        list.trigger_delete(jane.id);

        let mut renamed = jane.clone();
        renamed.full_name = "Janet".into();
        list.sync(vec![renamed]);

        assert!(list.get(john_id).is_none());
        let row = list.get(jane.id).unwrap();
        assert_eq!(row.record.full_name, "Janet");
        assert!(row.menu_open);
        assert_eq!(row.gate, ConfirmGate::Armed);
    }

    #[test]
    fn at_most_one_editor_per_row() {
        let mut list = list_of(&["Jane"]);
        let id = list.rows()[0].record.id;
        assert!(list.open_editor(id, PhoneMask::default(), jan15()));
        assert!(!list.open_editor(id, PhoneMask::default(), jan15()));
        list.close_editor(id);
        assert!(list.editor(id).is_none());
        assert!(list.open_editor(id, PhoneMask::default(), jan15()));
    }

    #[test]
    fn editor_with_save_in_flight_cannot_be_cancelled() {
        let mut list = list_of(&["Jane"]);
        let id = list.rows()[0].record.id;
        list.open_editor(id, PhoneMask::default(), jan15());
        list.editor_mut(id).unwrap().begin_submit(Some(jan15())).unwrap();

        assert!(!list.cancel_editor(id));
        let saved = list.editor_mut(id).unwrap().finish(Ok(record("Jane", 0)));
        assert!(matches!(saved, FormOutcome::Saved(SaveKind::Updated, _)));

        list.editor_mut(id).unwrap().set_text(Field::FullName, "Janet".into());
        assert!(list.cancel_editor(id));
        assert!(list.editor(id).is_none());
    }

    #[test]
    fn time_is_shown_in_contact_timezone() {
        // 13:00 UTC is 08:00 in New York in January.
        let list = list_of(&["Jane"]);
        let ListView::Rows { rows, .. } = list.render(Layout::Full, jan15()) else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].local_time, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(rows[0].timezone.as_deref(), Some("America/New_York"));
    }

    #[test]
    fn compact_layout_hides_secondary_columns() {
        let list = list_of(&["Jane"]);
        let ListView::Rows { rows, layout } = list.render(Layout::Compact, jan15()) else {
            panic!("expected rows");
        };
        assert_eq!(layout, Layout::Compact);
        assert_eq!(rows[0].phone, "+1 555.010.0000");
        assert!(rows[0].local_time.is_none());
        assert!(rows[0].opt_in.is_none());
        assert!(rows[0].updated_at.is_none());
        assert!(rows[0].enabled);
    }
}
