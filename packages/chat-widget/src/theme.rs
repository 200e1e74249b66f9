//! Theme configuration to style attributes.
//!
//! The widget never mutates the DOM to apply a theme. [`ThemeStyle::resolve`]
//! computes the `data-theme` value and the CSS custom properties, and the root
//! component renders them.

use indexmap::IndexMap;

use crate::config::{Theme, ThemeMode};

const DEFAULT_PRIMARY: &str = "#6366f1";
const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Attributes for the widget's root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeStyle {
    /// `light` or `dark`.
    pub data_theme: &'static str,
    /// CSS custom properties in declaration order.
    pub variables: Vec<(String, String)>,
}

impl ThemeStyle {
    /// Resolve a theme. `system_prefers_dark` only matters in `auto` mode.
    ///
    /// Typography variables are always set. Colour variables are set only for a
    /// customised theme (primary or background changed, or any custom
    /// variables), leaving stock colours to the stylesheet's `data-theme` rules.
    pub fn resolve(theme: &Theme, system_prefers_dark: bool) -> Self {
        let data_theme = match theme.mode {
            ThemeMode::Dark => "dark",
            ThemeMode::Auto if system_prefers_dark => "dark",
            ThemeMode::Light | ThemeMode::Auto => "light",
        };

        let mut vars: IndexMap<String, String> = IndexMap::new();
        vars.insert("--chat-font-family".into(), theme.font_family.clone());
        vars.insert("--chat-font-mono".into(), theme.font_family_mono.clone());
        vars.insert("--chat-font-size".into(), format!("{}px", theme.font_size));
        vars.insert("--chat-border-radius".into(), format!("{}px", theme.border_radius));
        for (name, value) in &theme.css_variables {
            vars.insert(name.clone(), value.clone());
        }

        if uses_custom_colors(theme) {
            for (name, value) in [
                ("--chat-primary", &theme.primary),
                ("--chat-primary-hover", &theme.primary_hover),
                ("--chat-bg", &theme.background),
                ("--chat-bg-secondary", &theme.background_secondary),
                ("--chat-text", &theme.text),
                ("--chat-text-secondary", &theme.text_secondary),
                ("--chat-border", &theme.border),
            ] {
                vars.insert(name.to_string(), value.clone());
            }
        }

        Self {
            data_theme,
            variables: vars.into_iter().collect(),
        }
    }

    /// The variables as an inline `style` attribute value.
    pub fn to_inline_style(&self) -> String {
        self.variables
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn uses_custom_colors(theme: &Theme) -> bool {
    !theme.primary.eq_ignore_ascii_case(DEFAULT_PRIMARY)
        || !theme.background.eq_ignore_ascii_case(DEFAULT_BACKGROUND)
        || !theme.css_variables.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_sets_only_typography() {
        let style = ThemeStyle::resolve(&Theme::default(), true);
        assert_eq!(style.data_theme, "light");
        let names: Vec<_> = style.variables.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            [
                "--chat-font-family",
                "--chat-font-mono",
                "--chat-font-size",
                "--chat-border-radius"
            ]
        );
        assert_eq!(style.get("--chat-font-size"), Some("14px"));
        assert_eq!(style.get("--chat-primary"), None);
    }

    #[test]
    fn custom_primary_emits_colour_variables() {
        let theme = Theme {
            primary: "#ff0000".into(),
            ..Theme::default()
        };
        let style = ThemeStyle::resolve(&theme, false);
        assert_eq!(style.get("--chat-primary"), Some("#ff0000"));
        assert_eq!(style.get("--chat-bg"), Some("#ffffff"));
        assert_eq!(style.variables.len(), 11);
    }

    #[test]
    fn custom_variables_are_kept_and_enable_colours() {
        let mut theme = Theme::default();
        theme
            .css_variables
            .insert("--chat-shadow".into(), "none".into());
        let style = ThemeStyle::resolve(&theme, false);
        assert_eq!(style.get("--chat-shadow"), Some("none"));
        assert!(style.get("--chat-text").is_some());
    }

    #[test]
    fn auto_mode_follows_the_system() {
        let theme = Theme {
            mode: ThemeMode::Auto,
            ..Theme::default()
        };
        assert_eq!(ThemeStyle::resolve(&theme, true).data_theme, "dark");
        assert_eq!(ThemeStyle::resolve(&theme, false).data_theme, "light");

        let dark = Theme {
            mode: ThemeMode::Dark,
            ..Theme::default()
        };
        assert_eq!(ThemeStyle::resolve(&dark, false).data_theme, "dark");
    }

    #[test]
    fn inline_style_joins_declarations() {
        let theme = Theme {
            font_family: "serif".into(),
            font_family_mono: "mono".into(),
            ..Theme::default()
        };
        assert_eq!(
            ThemeStyle::resolve(&theme, false).to_inline_style(),
            "--chat-font-family: serif; --chat-font-mono: mono; --chat-font-size: 14px; --chat-border-radius: 16px;"
        );
    }
}
