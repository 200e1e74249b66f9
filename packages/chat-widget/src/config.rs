//! Widget configuration and default merging.
//!
//! Hosts supply a [`ChatWidgetConfig`] where everything except `api_url` is
//! optional. [`ChatWidgetConfig::resolve`] fills every gap with the documented
//! defaults, section by section and field by field. No validation happens
//! here: odd values such as negative offsets pass through unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::AuthConfig;
use crate::events::{NoopEvents, WidgetEvents};

/// Which screen corner the widget docks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    #[default]
    Right,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    /// Follow the system colour scheme.
    Auto,
}

// Each section is declared once: the partial (host-facing) struct, the
// resolved struct, its defaults and the field-by-field merge.
macro_rules! config_section {
    (
        $(#[$partial_meta:meta])*
        $partial:ident => $(#[$resolved_meta:meta])* $resolved:ident {
            $($field:ident: $ty:ty = $default:expr,)*
        }
    ) => {
        $(#[$partial_meta])*
        #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        pub struct $partial {
            $(pub $field: Option<$ty>,)*
        }

        $(#[$resolved_meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $resolved {
            $(pub $field: $ty,)*
        }

        impl Default for $resolved {
            fn default() -> Self {
                Self {
                    $($field: $default,)*
                }
            }
        }

        impl $partial {
            /// Fill every unset field from the defaults.
            pub fn resolve(self) -> $resolved {
                let defaults = $resolved::default();
                $resolved {
                    $($field: self.$field.unwrap_or(defaults.$field),)*
                }
            }
        }
    };
}

config_section! {
    /// Host overrides for colours and typography.
    ThemeConfig => Theme {
        mode: ThemeMode = ThemeMode::Light,
        primary: String = "#6366f1".to_string(),
        primary_hover: String = "#4f46e5".to_string(),
        background: String = "#ffffff".to_string(),
        background_secondary: String = "#f8fafc".to_string(),
        text: String = "#1e293b".to_string(),
        text_secondary: String = "#64748b".to_string(),
        border: String = "#e2e8f0".to_string(),
        font_family: String =
            "'DM Sans', -apple-system, BlinkMacSystemFont, sans-serif".to_string(),
        font_family_mono: String = "'JetBrains Mono', monospace".to_string(),
        font_size: u32 = 14,
        border_radius: u32 = 16,
        css_variables: BTreeMap<String, String> = BTreeMap::new(),
    }
}

config_section! {
    /// Host toggles for optional widget behaviour.
    FeaturesConfig => Features {
        markdown: bool = true,
        code_highlight: bool = true,
        image_gallery: bool = true,
        file_upload: bool = true,
        link_previews: bool = true,
        typing_indicator: bool = true,
        sound_notifications: bool = false,
    }
}

config_section! {
    /// Host overrides for user-visible text.
    LabelsConfig => Labels {
        title: String = "Chat".to_string(),
        subtitle: String = "Online".to_string(),
        placeholder: String = "Type a message...".to_string(),
        send_button: String = "Send".to_string(),
        upload_button: String = "Attach file".to_string(),
        close_button: String = "Close".to_string(),
        typing_text: String = "typing...".to_string(),
        error_text: String = "Something went wrong".to_string(),
        retry_text: String = "Retry".to_string(),
        empty_state_title: String = "No messages yet".to_string(),
        empty_state_text: String = "Start a conversation!".to_string(),
        load_more: String = "Load older messages".to_string(),
        loading_text: String = "Loading...".to_string(),
    }
}

config_section! {
    /// Host overrides for upload restrictions.
    UploadConfig => UploadLimits {
        max_file_size: u64 = 10 * 1024 * 1024,
        max_files: usize = 5,
        allowed_types: Vec<String> = vec![
            "image/*".to_string(),
            "application/pdf".to_string(),
            ".doc".to_string(),
            ".docx".to_string(),
            ".txt".to_string(),
        ],
        endpoint: String = "/upload".to_string(),
    }
}

/// Host-supplied configuration. Only `api_url` is required.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatWidgetConfig {
    pub api_url: String,
    pub position: Option<Position>,
    pub offset_x: Option<i32>,
    pub offset_y: Option<i32>,
    pub theme: Option<ThemeConfig>,
    pub features: Option<FeaturesConfig>,
    pub labels: Option<LabelsConfig>,
    pub upload: Option<UploadConfig>,
    pub auth: Option<AuthConfig>,
    pub start_open: Option<bool>,
    #[serde(skip)]
    pub events: Option<Arc<dyn WidgetEvents>>,
}

impl ChatWidgetConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn with_events(mut self, events: Arc<dyn WidgetEvents>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Merge with defaults into a fully-populated configuration.
    pub fn resolve(self) -> ResolvedConfig {
        ResolvedConfig {
            api_url: self.api_url,
            position: self.position.unwrap_or_default(),
            offset_x: self.offset_x.unwrap_or(DEFAULT_OFFSET),
            offset_y: self.offset_y.unwrap_or(DEFAULT_OFFSET),
            theme: self.theme.unwrap_or_default().resolve(),
            features: self.features.unwrap_or_default().resolve(),
            labels: self.labels.unwrap_or_default().resolve(),
            upload: self.upload.unwrap_or_default().resolve(),
            auth: self.auth.unwrap_or_default(),
            start_open: self.start_open.unwrap_or(false),
            events: self.events.unwrap_or_else(|| Arc::new(NoopEvents)),
        }
    }
}

const DEFAULT_OFFSET: i32 = 24;

/// Configuration with every field populated.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub position: Position,
    pub offset_x: i32,
    pub offset_y: i32,
    pub theme: Theme,
    pub features: Features,
    pub labels: Labels,
    pub upload: UploadLimits,
    pub auth: AuthConfig,
    pub start_open: bool,
    pub events: Arc<dyn WidgetEvents>,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("api_url", &self.api_url)
            .field("position", &self.position)
            .field("offset_x", &self.offset_x)
            .field("offset_y", &self.offset_y)
            .field("theme", &self.theme)
            .field("features", &self.features)
            .field("labels", &self.labels)
            .field("upload", &self.upload)
            .field("auth", &self.auth)
            .field("start_open", &self.start_open)
            .finish_non_exhaustive()
    }
}
