use chrono::{DateTime, Utc};
use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, container, dropdown, icon, row, scrollable, text, text_input};
use cosmic::{Element, theme};

use crate::fl;
use crate::message::{FormTarget, Message};
use digests::core::confirm::DeleteLabel;
use digests::core::form::{ContactForm, Field, FormPhase};
use digests::core::listing::{ContactList, Layout, ListView, RowView};
use digests::core::schedule::{self, Age};

fn field_error<'a>(form: &ContactForm, field: Field) -> Option<Element<'a, Message>> {
    form.error(field).map(|e| text::caption(e.to_string()).into())
}

/// The create/edit form. Used by the drawer and by row editors.
pub fn form_view<'a>(
    form: &'a ContactForm,
    target: FormTarget,
    timezones: &'a [&'static str],
) -> Element<'a, Message> {
    let mut content = column().spacing(8);

    content = content.push(text::title4(fl!("form-full-name")));
    content = content.push(
        text_input::text_input(fl!("form-full-name-placeholder"), form.text(Field::FullName))
            .on_input(move |v| Message::FormText(target, Field::FullName, v))
            .on_submit(move |_| Message::FormSubmit(target))
            .width(Length::Fill),
    );
    if let Some(e) = field_error(form, Field::FullName) {
        content = content.push(e);
    }

    content = content.push(text::title4(fl!("form-phone")));
    content = content.push(
        text_input::text_input(fl!("form-phone-placeholder"), form.text(Field::Phone))
            .on_input(move |v| Message::FormText(target, Field::Phone, v))
            .width(Length::Fill),
    );
    if let Some(e) = field_error(form, Field::Phone) {
        content = content.push(e);
    }

    content = content.push(text::title4(fl!("form-timezone")));
    let selected = timezones
        .iter()
        .position(|tz| *tz == form.text(Field::Timezone));
    let mut tz_row = row()
        .spacing(8)
        .align_y(Alignment::Center)
        .push(
            dropdown(timezones, selected, move |idx| Message::FormTimezone(target, idx))
                .width(Length::Fill),
        );
    if let Some(hint) = form.offset_hint() {
        tz_row = tz_row.push(text::caption(hint));
    }
    content = content.push(tz_row);
    if let Some(e) = field_error(form, Field::Timezone) {
        content = content.push(e);
    }

    content = content.push(text::title4(fl!("form-notify-on")));
    content = content.push(
        text_input::text_input("08:00", form.text(Field::NotifyOn))
            .on_input(move |v| Message::FormText(target, Field::NotifyOn, v))
            .on_submit(move |_| Message::FormSubmit(target))
            .width(Length::Fill),
    );
    if let Some(e) = field_error(form, Field::NotifyOn) {
        content = content.push(e);
    }

    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::body(fl!("form-enabled")).width(Length::Fill))
            .push(
                cosmic::widget::toggler(form.enabled())
                    .on_toggle(move |on| Message::FormEnabled(target, on)),
            ),
    );

    content = content.push(text::caption(fl!("form-opt-in-terms")).size(11.0));

    if let FormPhase::Error(e) = form.phase() {
        content = content.push(text::caption(fl!("form-failed", reason = e.to_string())));
    }

    let label = match form.phase() {
        FormPhase::Submitting => fl!("form-saving"),
        _ if form.is_edit() => fl!("form-update"),
        _ => fl!("form-create"),
    };
    let mut actions = row().spacing(8).push(
        button::suggested(label)
            .on_press_maybe(form.can_submit().then_some(Message::FormSubmit(target))),
    );
    if let FormTarget::Edit(id) = target {
        let idle = *form.phase() != FormPhase::Submitting;
        actions = actions.push(
            button::standard(fl!("form-cancel"))
                .on_press_maybe(idle.then_some(Message::CancelEdit(id))),
        );
    }
    content = content.push(actions);

    content.into()
}

fn delete_button<'a>(row: &RowView) -> Element<'a, Message> {
    let id = row.id;
    let btn = match row.delete_label {
        DeleteLabel::Delete => button::standard(fl!("row-delete")),
        DeleteLabel::Confirm => button::destructive(fl!("row-delete-confirm")),
        DeleteLabel::Deleting => button::destructive(fl!("row-deleting")),
    };
    btn.on_press_maybe(row.delete_enabled.then_some(Message::DeleteContact(id)))
        .into()
}

fn updated_text(updated: DateTime<Utc>) -> String {
    match schedule::age_since(updated, Utc::now()) {
        Age::JustNow => fl!("row-updated-now"),
        Age::Minutes(n) => fl!("row-updated-minutes", count = n),
        Age::Hours(n) => fl!("row-updated-hours", count = n),
        Age::Days(n) => fl!("row-updated-days", count = n),
    }
}

fn contact_row<'a>(
    row_view: RowView,
    layout: Layout,
    editor: Option<&'a ContactForm>,
    timezones: &'a [&'static str],
) -> Element<'a, Message> {
    let id = row_view.id;
    let mut line = row()
        .spacing(12)
        .align_y(Alignment::Center)
        .push(text::body(row_view.full_name.clone()).width(Length::FillPortion(3)));

    line = line.push(text::caption(row_view.phone.clone()).width(Length::FillPortion(2)));
    if let Some(ref tz) = row_view.timezone {
        line = line.push(text::caption(tz.clone()).width(Length::FillPortion(2)));
    }
    if let Some(local_time) = row_view.local_time {
        line = line.push(text::body(schedule::format_clock(local_time)));
    }
    if let Some(opt_in) = row_view.opt_in {
        let label = if opt_in {
            fl!("row-opted-in")
        } else {
            fl!("row-awaiting-opt-in")
        };
        line = line.push(text::caption(label));
    }

    let enabled = if row_view.enabled {
        fl!("row-enabled")
    } else {
        fl!("row-paused")
    };
    line = line.push(text::caption(enabled));

    if let Some(updated) = row_view.updated_at {
        line = line.push(text::caption(updated_text(updated)).size(11.0));
    }

    line = line.push(
        button::icon(icon::from_name("view-more-symbolic")).on_press(Message::ToggleMenu(id)),
    );

    let mut col = column().spacing(8).push(line);

    if row_view.menu_open {
        col = col.push(
            row()
                .spacing(8)
                .push(button::standard(fl!("row-edit")).on_press(Message::EditContact(id)))
                .push(delete_button(&row_view)),
        );
    }

    if let Some(form) = editor {
        col = col.push(form_view(form, FormTarget::Edit(id), timezones));
    }

    let padding = match layout {
        Layout::Full => 12,
        Layout::Compact => 8,
    };
    container(col)
        .padding(padding)
        .width(Length::Fill)
        .class(theme::Container::Card)
        .into()
}

fn empty_state<'a>() -> Element<'a, Message> {
    container(
        column()
            .spacing(12)
            .align_x(Alignment::Center)
            .push(text::title4(fl!("empty-title")))
            .push(text::body(fl!("empty-body")))
            .push(button::suggested(fl!("empty-get-started")).on_press(Message::OpenCreateForm)),
    )
    .padding(32)
    .center_x(Length::Fill)
    .width(Length::Fill)
    .into()
}

pub fn contacts_view<'a>(
    list: &'a ContactList,
    view: ListView,
    timezones: &'a [&'static str],
) -> Element<'a, Message> {
    let mut content = column().spacing(12);

    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::title4(fl!("page-contacts")).width(Length::Fill))
            .push(button::icon(icon::from_name("view-refresh-symbolic")).on_press(Message::Refresh)),
    );

    match view {
        ListView::Empty => {
            content = content.push(empty_state());
        }
        ListView::Rows { layout, rows } => {
            for row_view in rows {
                let editor = list.editor(row_view.id);
                content = content.push(contact_row(row_view, layout, editor, timezones));
            }
        }
    }

    container(scrollable(content.padding(16).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
