//! Built-in validators

pub mod custom;
pub mod date;
pub mod email;
pub mod fields;
pub mod length;
pub mod numeric;
pub mod required;
pub mod url;
