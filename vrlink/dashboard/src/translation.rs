use serde_json as json;
use std::{collections::HashMap, fs, path::Path as FsPath};
use vrlink_common::{anyhow::Result, debug, Context};
use vrlink_session::{Path, PathSegment};

const FALLBACK_LOCALE: &str = "en";
const SETTINGS_FNAME: &str = "settings.json";
const NOTIFICATIONS_FNAME: &str = "notifications.json";

pub struct NotificationText<'a> {
    pub title: &'a str,
    pub message: &'a str,
}

/// Localized strings. Setting keys are addresses followed by `.name` or `.description`,
/// notification keys are event ids followed by `.title` or `.msg`.
#[derive(Default, Clone, Debug)]
pub struct Translations {
    settings: HashMap<String, String>,
    notifications: HashMap<String, String>,
}

fn load_table(path: &FsPath) -> Result<HashMap<String, String>> {
    let text = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;

    Ok(json::from_str(&text)?)
}

impl Translations {
    pub fn new(settings: HashMap<String, String>, notifications: HashMap<String, String>) -> Self {
        Self {
            settings,
            notifications,
        }
    }

    // Missing files are not an error, labels fall back to the raw address tokens
    pub fn load(dir: &FsPath, locale: &str) -> Self {
        let load = |fname: &str| {
            [locale, FALLBACK_LOCALE]
                .into_iter()
                .find_map(|locale| match load_table(&dir.join(locale).join(fname)) {
                    Ok(table) => Some(table),
                    Err(e) => {
                        debug!("{e:#}");
                        None
                    }
                })
                .unwrap_or_default()
        };

        Self {
            settings: load(SETTINGS_FNAME),
            notifications: load(NOTIFICATIONS_FNAME),
        }
    }

    pub fn setting_name(&self, path: &Path) -> String {
        if let Some(name) = self.settings.get(&format!("{path}.name")) {
            return name.clone();
        }

        let name = path.last_name().unwrap_or_default();
        match path.last() {
            // Array elements are told apart by their position
            Some(PathSegment::Index(index)) => format!("{name}[{index}]"),
            _ => name.to_owned(),
        }
    }

    pub fn setting_help(&self, path: &Path) -> Option<&str> {
        self.settings
            .get(&format!("{path}.description"))
            .map(String::as_str)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn notification(&self, id: &str) -> Option<NotificationText<'_>> {
        let title = self.notifications.get(&format!("{id}.title"))?;
        let message = self
            .notifications
            .get(&format!("{id}.msg"))
            .map(String::as_str)
            .unwrap_or_default();

        Some(NotificationText { title, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrlink_session::parse_path;

    fn translations() -> Translations {
        Translations::new(
            [
                ("video.bitrate.name".into(), "Bitrate".into()),
                ("video.bitrate.description".into(), "Video bitrate".into()),
            ]
            .into_iter()
            .collect(),
            [
                ("ClientFoundInvalid.title".into(), "Invalid client".into()),
                ("ClientFoundInvalid.msg".into(), "Update the client".into()),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn setting_labels() {
        let translations = translations();

        assert_eq!(translations.setting_name(&parse_path("video.bitrate")), "Bitrate");
        assert_eq!(
            translations.setting_help(&parse_path("video.bitrate")),
            Some("Video bitrate")
        );
        assert_eq!(
            translations.setting_name(&parse_path("video.codec.variant")),
            "variant"
        );
        assert_eq!(translations.setting_help(&parse_path("video.codec")), None);
    }

    #[test]
    fn array_element_labels() {
        let mut translations = translations();
        translations
            .settings
            .insert("head.position[1].description".into(), "Height".into());

        assert_eq!(
            translations.setting_name(&parse_path("head.position[0]")),
            "position[0]"
        );
        assert_eq!(
            translations.setting_name(&parse_path("head.position[1]")),
            "position[1]"
        );
        assert_eq!(
            translations.setting_help(&parse_path("head.position[1]")),
            Some("Height")
        );
        assert_eq!(translations.setting_name(&parse_path("head.codec.A")), "A");
    }

    #[test]
    fn notification_texts() {
        let translations = translations();

        let text = translations.notification("ClientFoundInvalid").unwrap();
        assert_eq!(text.title, "Invalid client");
        assert_eq!(text.message, "Update the client");
        assert!(translations.notification("Unknown").is_none());
    }

    #[test]
    fn missing_directory_falls_back() {
        let translations = Translations::load(FsPath::new("/nonexistent"), "it");

        assert_eq!(translations.setting_name(&parse_path("audio.volume")), "volume");
    }
}
