pub mod duration;
pub mod page;

pub use duration::{format_time_ago, time_ago};
pub use page::{extract_target_id, is_attack_page, TargetId};
