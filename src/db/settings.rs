//! User preferences stored as `"1"` / `"0"` strings.

use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;

use super::kv::{get_item, set_item};

/// Toggleable preferences shown on the settings tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Notifications,
    PriceAlerts,
}

impl Setting {
    fn key(self) -> &'static str {
        match self {
            Setting::Notifications => "settings_notifications",
            Setting::PriceAlerts => "settings_price_alerts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Setting::Notifications => "Notifications",
            Setting::PriceAlerts => "Price Alerts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub notifications: bool,
    pub price_alerts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            price_alerts: true,
        }
    }
}

impl Settings {
    pub fn get(&self, setting: Setting) -> bool {
        match setting {
            Setting::Notifications => self.notifications,
            Setting::PriceAlerts => self.price_alerts,
        }
    }

    pub fn set(&mut self, setting: Setting, value: bool) {
        match setting {
            Setting::Notifications => self.notifications = value,
            Setting::PriceAlerts => self.price_alerts = value,
        }
    }
}

/// Read stored preferences. Values that cannot be read keep their default.
pub fn load_settings(conn: &Connection) -> Settings {
    let mut settings = Settings::default();
    for setting in [Setting::Notifications, Setting::PriceAlerts] {
        match get_item(conn, setting.key()) {
            Ok(Some(raw)) => settings.set(setting, raw == "1"),
            Ok(None) => {}
            Err(err) => warn!(key = setting.key(), error = %err, "keeping default setting"),
        }
    }
    settings
}

pub fn store_setting(conn: &Connection, setting: Setting, value: bool) -> Result<()> {
    set_item(conn, setting.key(), if value { "1" } else { "0" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_item, open_in_memory};

    #[test]
    fn defaults_are_on() {
        let conn = open_in_memory().unwrap();
        assert_eq!(load_settings(&conn), Settings::default());
        assert!(load_settings(&conn).notifications);
    }

    #[test]
    fn stored_values_round_through_flags() {
        let conn = open_in_memory().unwrap();
        store_setting(&conn, Setting::PriceAlerts, false).unwrap();
        assert_eq!(
            get_item(&conn, "settings_price_alerts").unwrap().as_deref(),
            Some("0")
        );

        let settings = load_settings(&conn);
        assert!(settings.notifications);
        assert!(!settings.price_alerts);
    }

    #[test]
    fn unexpected_value_reads_as_off() {
        let conn = open_in_memory().unwrap();
        set_item(&conn, "settings_notifications", "yes").unwrap();
        assert!(!load_settings(&conn).notifications);
    }

    #[test]
    fn unreadable_store_keeps_defaults() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(load_settings(&conn), Settings::default());
    }
}
