//! Local key-value persistence split across logical submodules.

mod connection;
mod kv;
mod saved;
mod settings;

pub use connection::{ensure_schema, open_in_memory};
pub use kv::{get_item, remove_item, set_item};
pub use saved::{clear_saved, is_saved, load_saved_ids, remove_saved, toggle_saved};
pub use settings::{load_settings, store_setting, Setting, Settings};
