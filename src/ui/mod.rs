//! Terminal consumers of pipeline events

pub mod bar;
pub mod json;
pub mod reporter;
