pub mod contacts;
pub mod settings;
