use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

use crate::utils::storage::{SecureStore, StorageError, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Persisted light/dark preference.
pub struct ThemeStore {
    theme: watch::Sender<Theme>,
    storage: Arc<dyn SecureStore>,
}

impl ThemeStore {
    pub fn new(storage: Arc<dyn SecureStore>) -> Self {
        let (theme, _) = watch::channel(Theme::default());
        Self { theme, storage }
    }

    pub fn current(&self) -> Theme {
        *self.theme.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.theme.subscribe()
    }

    /// Reads the stored preference. Missing or unreadable values fall back to
    /// light.
    pub async fn load(&self) -> Theme {
        let theme = match self.storage.get(THEME_KEY).await {
            Ok(Some(raw)) => raw.parse::<Theme>().unwrap_or_else(|err: String| {
                tracing::warn!(error = %err, "ignoring stored theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read theme preference");
                Theme::default()
            }
        };
        self.theme.send_replace(theme);
        theme
    }

    pub async fn set(&self, theme: Theme) -> Result<(), StorageError> {
        self.theme.send_replace(theme);
        self.storage.set(THEME_KEY, theme.as_str()).await
    }

    pub async fn toggle(&self) -> Result<Theme, StorageError> {
        let next = self.current().toggled();
        self.set(next).await?;
        Ok(next)
    }
}
