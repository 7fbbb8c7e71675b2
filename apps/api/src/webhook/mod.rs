pub mod handlers;
pub mod name_extract;
pub mod reconciler;
