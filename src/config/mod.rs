mod parser;
mod view;

pub use parser::{load_settings, load_string_map, to_string_map};
pub use view::{ConfigurationView, Setting, MEMBER_SETTINGS, PATH_DELIMITER};
