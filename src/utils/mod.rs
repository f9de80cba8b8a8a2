pub mod constants;
mod text;
mod wait_for_element;

pub use text::{flatten_line, truncate_chars};
pub use wait_for_element::{poll_with_backoff, wait_for_element};
