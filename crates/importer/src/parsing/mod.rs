pub mod date;
pub mod time;

pub use date::{parse_date, parse_link_title_date, resolve_date};
pub use time::{parse_distance, parse_time};
