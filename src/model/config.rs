use serde::{Deserialize, Serialize};

/// Editor configuration (read from `config.toml`).
///
/// Every field is optional in the file; missing ones take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// strftime format for the "insert time" shortcut
    pub time_format: String,
    /// strftime format for the "insert date" shortcut
    pub date_format: String,
    /// Tag suggested for new items in the tag list
    pub default_tag: String,
    /// Held-key auto-repeat: delay before the first repeat
    pub key_repeat_delay_ms: u64,
    /// Held-key auto-repeat: interval between repeats
    pub key_repeat_interval_ms: u64,
    /// Idle time after which a typing burst becomes its own undo step
    pub text_input_fix_interval_ms: u64,
    /// Maximum number of undo steps kept per document
    pub undo_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            time_format: default_time_format(),
            date_format: default_date_format(),
            default_tag: "todo".to_string(),
            key_repeat_delay_ms: 300,
            key_repeat_interval_ms: 30,
            text_input_fix_interval_ms: 1000,
            undo_limit: 500,
        }
    }
}

fn default_time_format() -> String {
    "%H:%M".to_string()
}

fn default_date_format() -> String {
    "%Y/%-m/%-d (%a)".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EditorConfig = toml::from_str("time_format = \"%H:%M:%S\"\n").unwrap();
        assert_eq!(config.time_format, "%H:%M:%S");
        assert_eq!(config.date_format, default_date_format());
        assert_eq!(config.undo_limit, 500);
    }

    #[test]
    fn empty_toml_is_default() {
        let config: EditorConfig = toml::from_str("").unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
