//! ライト/ダークのCSS変数

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

const LIGHT: [(&str, &str); 14] = [
    ("--primary", "#ff8000"),
    ("--accent-yellow", "#FFB84C"),
    ("--accent-blue", "#82C9FF"),
    ("--white", "#fff"),
    ("--text-dark", "#222"),
    ("--card-dark", "#F5F5F5"),
    ("--card-light", "#e9e9e9"),
    ("--bg-light", "rgba(255, 255, 255, 0.92)"),
    ("--shadow-light", "rgba(0,0,0,0.1)"),
    ("--border-color", "rgba(0, 0, 0, 0.15)"),
    ("--bg-surface", "rgba(255, 255, 255, 0.15)"),
    ("--c-back", "#fafcfdff"),
    ("--b-back", "#faedbdff"),
    ("--shadow-dark", "rgba(0,0,0,0.2)"),
];

const DARK: [(&str, &str); 14] = [
    ("--primary", "#ff9a3c"),
    ("--accent-yellow", "#ffcf6c"),
    ("--accent-blue", "#5e748c"),
    ("--white", "#2a2f3a"),
    ("--text-dark", "#f5eeeeff"),
    ("--card-dark", "#4d525f"),
    ("--card-light", "#777b85"),
    ("--bg-light", "#4d525f"),
    ("--shadow-light", "rgba(255,255,255,0.06)"),
    ("--border-color", "#777b85"),
    ("--bg-surface", "transparent"),
    ("--c-back", "#353b47"),
    ("--b-back", "#353b47"),
    ("--shadow-dark", "rgba(255,255,255,0.1)"),
];

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// ドキュメントルートに設定する変数
    pub fn vars(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
        }
    }

    pub fn body_background(&self) -> &'static str {
        match self {
            Theme::Light => "#fff",
            Theme::Dark => "#2e3443ff",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_variables_in_both_themes() {
        let light: Vec<&str> = Theme::Light.vars().iter().map(|(k, _)| *k).collect();
        let dark: Vec<&str> = Theme::Dark.vars().iter().map(|(k, _)| *k).collect();
        assert_eq!(light, dark);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Theme::default().toggle(), Theme::Dark);
        assert!(Theme::Dark.is_dark());
        assert_eq!(Theme::Dark.body_background(), "#2e3443ff");
    }
}
