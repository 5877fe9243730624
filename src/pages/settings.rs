use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, container, row, scrollable, text, text_input};
use cosmic::Element;

use crate::message::Message;
use digests::config::DigestsConfig;

/// Connection state shown under the API settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    Local,
    Connecting,
    Connected,
    Failed(String),
}

pub fn settings_view<'a>(
    config: &'a DigestsConfig,
    token_input: &'a str,
    status: &ApiStatus,
    timezone_choices: &'a [&'static str],
) -> Element<'a, Message> {
    let mut content = column().spacing(12);

    // --- API ---
    content = content.push(text::title4(crate::fl!("settings-api")));
    content = content.push(
        text_input::text_input(crate::fl!("settings-api-url"), &config.api_url)
            .on_input(Message::SetApiUrl)
            .width(Length::Fill),
    );
    content = content.push(
        text_input::secure_input(
            crate::fl!("settings-api-token"),
            token_input,
            None::<Message>,
            true,
        )
        .on_input(Message::ApiTokenInput)
        .on_submit(|_| Message::SaveApiToken)
        .width(Length::Fill),
    );
    {
        let mut status_row = row().spacing(8).align_y(Alignment::Center);
        status_row = status_row
            .push(button::standard(crate::fl!("settings-save-token")).on_press(Message::SaveApiToken))
            .push(button::standard(crate::fl!("settings-connect")).on_press(Message::Connect));
        let status_text = match status {
            ApiStatus::Local => crate::fl!("settings-status-local"),
            ApiStatus::Connecting => crate::fl!("settings-status-connecting"),
            ApiStatus::Connected => format!("✓ {}", crate::fl!("settings-status-connected")),
            ApiStatus::Failed(e) => format!("✗ {}", e),
        };
        status_row = status_row.push(text::body(status_text));
        content = content.push(status_row);
    }

    // --- New contacts ---
    content = content.push(text::title4(crate::fl!("settings-new-contacts")));

    // Index 0 is "use the system timezone".
    let selected = if config.default_timezone.is_empty() {
        Some(0)
    } else {
        timezone_choices
            .iter()
            .position(|tz| *tz == config.default_timezone)
    };
    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::body(crate::fl!("settings-default-timezone")).width(Length::Fill))
            .push(
                cosmic::widget::dropdown(timezone_choices, selected, Message::SetDefaultTimezone)
                    .width(Length::Fixed(240.0)),
            ),
    );
    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::body(crate::fl!("settings-phone-mask")).width(Length::Fill))
            .push(
                text_input::text_input(digests::core::phone::DEFAULT_MASK, &config.phone_mask)
                    .on_input(Message::SetPhoneMask)
                    .width(Length::Fixed(240.0)),
            ),
    );

    // --- Debug logging ---
    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::body(crate::fl!("settings-debug-logging")).width(Length::Fill))
            .push(
                cosmic::widget::toggler(config.debug_logging)
                    .on_toggle(|_| Message::ToggleDebugLogging),
            ),
    );

    container(scrollable(content.padding(16).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
