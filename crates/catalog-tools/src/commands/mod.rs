pub mod compare;
pub mod html_export;
pub mod info;
pub mod query;
