pub mod confirm;
pub mod digest;
pub mod form;
pub mod listing;
pub mod phone;
pub mod schedule;
