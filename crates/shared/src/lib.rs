pub mod catalog;
pub mod domain;
pub mod error;
pub mod locale;
pub mod order;
pub mod protocol;
