use cosmic::app::Settings;
use cosmic::cosmic_config::CosmicConfigEntry;
use cosmic::iced::Limits;

mod application;
mod localize;
mod message;
mod pages;

use digests::config;
use digests::core;
use digests::sync;

use application::{Digests, Flags};
use config::{APP_ID, CONFIG_VERSION, DigestsConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cosmic_cfg = cosmic::cosmic_config::Config::new(APP_ID, CONFIG_VERSION)?;
    let config = DigestsConfig::get_entry(&cosmic_cfg).unwrap_or_else(|(errors, cfg)| {
        for e in errors {
            eprintln!("digests: config: {}", e);
        }
        cfg
    });

    // Set up logging to the systemd user journal (`journalctl --user -t digests -f`).
    // Wrapper filters: this crate at info/debug (per config), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                if metadata.target().starts_with("digests") {
                    let max = if digests::debug_logging() {
                        log::LevelFilter::Debug
                    } else {
                        log::LevelFilter::Info
                    };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        digests::set_debug_logging(config.debug_logging);

        match systemd_journal_logger::JournalLog::new() {
            Ok(journal) => {
                let journal = journal.with_syslog_identifier("digests".to_string());
                log::set_boxed_logger(Box::new(FilteredJournal { inner: journal }))?;
                // Global max must be Debug so debug logs can pass through when toggled
                log::set_max_level(log::LevelFilter::Debug);
            }
            Err(e) => eprintln!("digests: journal logging unavailable: {}", e),
        }
    }

    localize::localize();

    let mut settings = Settings::default();
    settings = settings.size_limits(Limits::NONE.min_width(360.0).min_height(300.0));

    let flags = Flags {
        config,
        cosmic_config: cosmic_cfg,
    };
    cosmic::app::run::<Digests>(settings, flags)?;

    Ok(())
}
