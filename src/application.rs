use std::sync::Arc;

use cosmic::app::{Core, Task as CosmicTask, context_drawer};
use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, container, icon, nav_bar, row, scrollable, text};
use cosmic::{Application, Element, executor, theme};
use uuid::Uuid;

use crate::config::{APP_ID, DigestsConfig};
use crate::core::digest::OwnerId;
use crate::core::form::{ContactForm, Field, FormOutcome, SaveKind};
use crate::core::listing::{ContactList, Layout};
use crate::core::schedule;
use crate::message::{FormTarget, Message, Page};
use crate::pages;
use crate::pages::settings::ApiStatus;
use crate::sync::cache::CacheKey;
use crate::sync::gateway::{CollectionCache, MutationGateway};
use crate::sync::http::HttpDigestApi;
use crate::sync::memory::InMemoryDigestApi;
use crate::sync::{keyring, snapshot};

/// Transient banner above the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

pub struct Digests {
    core: Core,
    nav_model: nav_bar::Model,
    config: DigestsConfig,
    cosmic_config: cosmic::cosmic_config::Config,
    page: Page,

    // Data
    cache: Arc<CollectionCache>,
    gateway: Option<MutationGateway>,
    list: ContactList,

    // Drawer
    create_form: Option<ContactForm>,

    // UI state
    notice: Option<Notice>,
    api_status: ApiStatus,
    token_input: String,
    timezones: Vec<&'static str>,
    /// `timezones` with a leading "system default" entry.
    default_timezone_choices: Vec<&'static str>,
}

pub struct Flags {
    pub config: DigestsConfig,
    pub cosmic_config: cosmic::cosmic_config::Config,
}

impl Application for Digests {
    type Executor = executor::Default;
    type Flags = Flags;
    type Message = Message;

    const APP_ID: &'static str = APP_ID;

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn init(core: Core, flags: Self::Flags) -> (Self, CosmicTask<Self::Message>) {
        let config = flags.config;
        let cosmic_config = flags.cosmic_config;

        let mut nav_model = nav_bar::Model::default();
        for page in Page::ALL {
            nav_model
                .insert()
                .text(page.title())
                .icon(icon::from_name(page.icon_name()).icon())
                .data(*page);
        }
        nav_model.activate_position(0);

        // Last known contacts are shown until the first fetch completes.
        let seeded = snapshot::load_snapshot(&config.snapshot_path());
        let cache = Arc::new(CollectionCache::new());
        let mut list = ContactList::default();
        list.sync(seeded.clone());

        let timezones = schedule::supported_timezones();
        let mut default_timezone_choices = vec!["—"];
        default_timezone_choices.extend(timezones.iter().copied());

        let mut app = Self {
            core,
            nav_model,
            config,
            cosmic_config,
            page: Page::Contacts,
            cache,
            gateway: None,
            list,
            create_form: None,
            notice: None,
            api_status: ApiStatus::Local,
            token_input: String::new(),
            timezones,
            default_timezone_choices,
        };

        let cache = app.cache.clone();
        let seed = CosmicTask::perform(
            async move {
                cache.seed(CacheKey::Digests, seeded).await;
            },
            |_| cosmic::Action::App(Message::Connect),
        );

        app.set_header_title(crate::fl!("app-title"));
        (app, seed)
    }

    fn nav_model(&self) -> Option<&nav_bar::Model> {
        Some(&self.nav_model)
    }

    fn on_nav_select(&mut self, id: nav_bar::Id) -> CosmicTask<Message> {
        if let Some(page) = self.nav_model.data::<Page>(id).copied() {
            self.page = page;
            self.nav_model.activate(id);
        }
        CosmicTask::none()
    }

    fn update(&mut self, message: Message) -> CosmicTask<Message> {
        match message {
            Message::OpenSettings => {
                self.page = Page::Settings;
                let target = self
                    .nav_model
                    .iter()
                    .find(|&id| self.nav_model.data::<Page>(id) == Some(&Page::Settings));
                if let Some(id) = target {
                    self.nav_model.activate(id);
                }
            }

            Message::Refresh => return self.reload(),

            Message::CollectionLoaded(result) => match result {
                Ok(records) => {
                    if let Err(e) = snapshot::save_snapshot(&self.config.snapshot_path(), &records) {
                        log::error!("Failed to save snapshot: {}", e);
                    }
                    self.list.sync(records);
                }
                Err(e) => {
                    log::warn!("Loading contacts failed: {}", e);
                    self.notice = Some(Notice::Error(e.to_string()));
                }
            },

            Message::OpenCreateForm => {
                let form = self
                    .create_form
                    .get_or_insert_with(|| ContactForm::create(self.config.phone_mask()));
                form.open();
                form.seed_timezone(|| self.config.timezone_guess());
                self.core.window.show_context = true;
            }

            Message::CloseCreateForm => {
                self.core.window.show_context = false;
            }

            Message::FormText(target, field, value) => {
                if let Some(form) = self.form_mut(target) {
                    form.set_text(field, value);
                }
            }

            Message::FormTimezone(target, idx) => {
                if let Some(name) = self.timezones.get(idx).copied() {
                    if let Some(form) = self.form_mut(target) {
                        form.set_text(Field::Timezone, name.to_string());
                    }
                }
            }

            Message::FormEnabled(target, enabled) => {
                if let Some(form) = self.form_mut(target) {
                    form.set_enabled(enabled);
                }
            }

            Message::FormSubmit(target) => {
                let Some(gateway) = self.gateway.clone() else {
                    log::warn!("Submit ignored, no contacts API yet");
                    return CosmicTask::none();
                };
                let Some(form) = self.form_mut(target) else {
                    return CosmicTask::none();
                };
                match form.begin_submit(None) {
                    Ok(submission) => {
                        return CosmicTask::perform(
                            async move { gateway.submit(submission).await },
                            move |result| cosmic::Action::App(Message::FormSaved(target, result)),
                        );
                    }
                    Err(e) => log::debug!("Submit blocked: {}", e),
                }
            }

            Message::FormSaved(target, result) => {
                let outcome = match self.form_mut(target) {
                    Some(form) => form.finish(result),
                    // The form was dropped while saving; still report the result.
                    None => FormOutcome::settled(target.save_kind(), result),
                };
                match outcome {
                    FormOutcome::Saved(kind, record) => {
                        let text = match kind {
                            SaveKind::Created => crate::fl!("notice-added"),
                            SaveKind::Updated => crate::fl!("notice-updated"),
                        };
                        log::info!("Saved contact {}", record.id);
                        self.notice = Some(Notice::Success(text));
                        match target {
                            FormTarget::Create => {
                                self.create_form = None;
                                self.core.window.show_context = false;
                            }
                            FormTarget::Edit(id) => self.list.close_editor(id),
                        }
                        return self.refresh();
                    }
                    FormOutcome::Failed(e) => {
                        self.notice = Some(Notice::Error(e.to_string()));
                    }
                    FormOutcome::Ignored => {}
                }
            }

            Message::CancelEdit(id) => {
                if !self.list.cancel_editor(id) {
                    log::debug!("Editor for contact {} kept open, save in flight", id);
                }
            }

            Message::ToggleMenu(id) => {
                self.list.toggle_menu(id);
            }

            Message::EditContact(id) => {
                let today = schedule::today_utc();
                if !self.list.open_editor(id, self.config.phone_mask(), today) {
                    log::debug!("Editor for contact {} already open", id);
                }
            }

            Message::DeleteContact(id) => {
                let Some(gateway) = self.gateway.clone() else {
                    return CosmicTask::none();
                };
                if let Some(id) = self.list.trigger_delete(id) {
                    return CosmicTask::perform(
                        async move { gateway.remove(id).await },
                        move |result| cosmic::Action::App(Message::ContactRemoved(id, result)),
                    );
                }
            }

            Message::ContactRemoved(id, result) => {
                self.list.delete_settled(id, &result);
                match result {
                    Ok(()) => return self.refresh(),
                    Err(e) => self.notice = Some(Notice::Error(e.to_string())),
                }
            }

            Message::DismissNotice => {
                self.notice = None;
            }

            Message::SetApiUrl(value) => {
                self.config.api_url = value;
                self.save_config();
            }

            Message::ApiTokenInput(value) => {
                self.token_input = value;
            }

            Message::SaveApiToken => {
                let url = self.config.api_url.trim().to_string();
                let token = self.token_input.trim().to_string();
                if url.is_empty() {
                    return CosmicTask::none();
                }
                self.token_input.clear();
                // Saving an empty token forgets the stored one.
                return CosmicTask::perform(
                    async move {
                        let result = if token.is_empty() {
                            keyring::delete_token(&url).await
                        } else {
                            keyring::store_token(&url, &token).await
                        };
                        result.map_err(|e| e.to_string())
                    },
                    |result| cosmic::Action::App(Message::ApiTokenSaved(result)),
                );
            }

            Message::ApiTokenSaved(result) => match result {
                Ok(()) => return self.update(Message::Connect),
                Err(e) => {
                    log::error!("{}", e);
                    self.api_status = ApiStatus::Failed(e);
                }
            },

            Message::Connect => {
                if !self.config.api_configured() {
                    log::warn!("No API URL configured, keeping contacts locally");
                    let owner = self
                        .list
                        .rows()
                        .first()
                        .map(|r| r.record.owner_id)
                        .unwrap_or_else(|| OwnerId(Uuid::new_v4()));
                    let records = self.list.rows().iter().map(|r| r.record.clone()).collect();
                    let api = Arc::new(InMemoryDigestApi::with_records(owner, records));
                    self.gateway = Some(MutationGateway::with_cache(api, self.cache.clone()));
                    self.api_status = ApiStatus::Local;
                    return self.reload();
                }
                self.api_status = ApiStatus::Connecting;
                let url = self.config.api_url.trim().to_string();
                return CosmicTask::perform(
                    async move { keyring::load_token(&url).await.map_err(|e| e.to_string()) },
                    |result| cosmic::Action::App(Message::TokenLoaded(result)),
                );
            }

            Message::TokenLoaded(result) => {
                let token = match result {
                    Ok(token) => token,
                    Err(e) => {
                        log::warn!("Continuing without API token: {}", e);
                        None
                    }
                };
                match HttpDigestApi::new(&self.config.api_url, token) {
                    Ok(api) => {
                        log::info!("Using contacts API at {}", api.base_url());
                        self.gateway =
                            Some(MutationGateway::with_cache(Arc::new(api), self.cache.clone()));
                        self.api_status = ApiStatus::Connected;
                        return self.reload();
                    }
                    Err(e) => {
                        log::error!("Failed to create API client: {}", e);
                        self.api_status = ApiStatus::Failed(e.to_string());
                    }
                }
            }

            Message::SetDefaultTimezone(idx) => {
                self.config.default_timezone = match idx {
                    0 => String::new(),
                    _ => self
                        .default_timezone_choices
                        .get(idx)
                        .map(|tz| tz.to_string())
                        .unwrap_or_default(),
                };
                self.save_config();
            }

            Message::SetPhoneMask(value) => {
                self.config.phone_mask = value;
                self.save_config();
            }

            Message::ToggleDebugLogging => {
                self.config.debug_logging = !self.config.debug_logging;
                digests::set_debug_logging(self.config.debug_logging);
                self.save_config();
            }
        }

        CosmicTask::none()
    }

    fn header_end(&self) -> Vec<Element<'_, Message>> {
        vec![
            row()
                .spacing(4)
                .push(
                    button::icon(icon::from_name("list-add-symbolic"))
                        .on_press(Message::OpenCreateForm),
                )
                .push(
                    button::icon(icon::from_name("emblem-system-symbolic"))
                        .on_press(Message::OpenSettings),
                )
                .into(),
        ]
    }

    fn context_drawer(&self) -> Option<context_drawer::ContextDrawer<'_, Message>> {
        if !self.core.window.show_context {
            return None;
        }
        let form = self.create_form.as_ref()?;
        Some(
            context_drawer::context_drawer(
                container(scrollable(
                    container(pages::contacts::form_view(form, FormTarget::Create, &self.timezones))
                        .padding(16),
                ))
                .width(Length::Fill),
                Message::CloseCreateForm,
            )
            .title(crate::fl!("form-new-title")),
        )
    }

    fn on_escape(&mut self) -> CosmicTask<Message> {
        if self.core.window.show_context {
            self.core.window.show_context = false;
        } else if self.notice.is_some() {
            self.notice = None;
        }
        CosmicTask::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let page: Element<'_, Message> = match self.page {
            Page::Contacts => {
                let layout = if self.core.is_condensed() {
                    Layout::Compact
                } else {
                    Layout::Full
                };
                let view = self.list.render(layout, schedule::today_utc());
                pages::contacts::contacts_view(&self.list, view, &self.timezones)
            }
            Page::Settings => pages::settings::settings_view(
                &self.config,
                &self.token_input,
                &self.api_status,
                &self.default_timezone_choices,
            ),
        };

        let Some(notice) = &self.notice else {
            return page;
        };
        let label = match notice {
            Notice::Success(msg) => msg.clone(),
            Notice::Error(msg) => crate::fl!("notice-failed", reason = msg.clone()),
        };
        let banner = container(
            row()
                .spacing(8)
                .align_y(Alignment::Center)
                .push(text::body(label).width(Length::Fill))
                .push(
                    button::icon(icon::from_name("window-close-symbolic"))
                        .on_press(Message::DismissNotice),
                ),
        )
        .padding(8)
        .width(Length::Fill)
        .class(theme::Container::Card);

        column().spacing(8).push(banner).push(page).into()
    }
}

impl Digests {
    fn form_mut(&mut self, target: FormTarget) -> Option<&mut ContactForm> {
        match target {
            FormTarget::Create => self.create_form.as_mut(),
            FormTarget::Edit(id) => self.list.editor_mut(id),
        }
    }

    fn refresh(&self) -> CosmicTask<Message> {
        let Some(gateway) = self.gateway.clone() else {
            return CosmicTask::none();
        };
        CosmicTask::perform(
            async move { gateway.collection().await },
            |result| cosmic::Action::App(Message::CollectionLoaded(result)),
        )
    }

    /// Like [`Self::refresh`], but refetches even when the cache is fresh.
    fn reload(&self) -> CosmicTask<Message> {
        let Some(gateway) = self.gateway.clone() else {
            return CosmicTask::none();
        };
        CosmicTask::perform(
            async move { gateway.reload().await },
            |result| cosmic::Action::App(Message::CollectionLoaded(result)),
        )
    }

    fn save_config(&self) {
        use cosmic::cosmic_config::CosmicConfigEntry;
        if let Err(e) = self.config.write_entry(&self.cosmic_config) {
            log::error!("Failed to save config: {:?}", e);
        }
    }
}
