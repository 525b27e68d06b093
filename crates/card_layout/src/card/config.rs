use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::layout::geometry::{
    LayoutConfig, LayoutLimits, DEFAULT_BASE_SHORT_SIDE, DEFAULT_CONTAINER_HEIGHT,
};
use crate::layout::ratio::{AspectRatio, Orientation};
use crate::CardError;

pub const DEFAULT_BLESSING_TEXT: &str = "岁岁常欢愉，\n年年皆胜意";
pub const DEFAULT_ORGANIZATION_NAME: &str = "XX 学校/机构";
pub const DEFAULT_QR_URL: &str = "https://card.example.com";

/// Layout and decoration toggles chosen in the editor.
///
/// Serialized with camelCase keys to match stored history records; the settings
/// file may also spell them in snake_case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardConfig {
    pub orientation: Orientation,
    #[serde(alias = "aspect_ratio")]
    pub aspect_ratio: AspectRatio,
    #[serde(alias = "show_border")]
    pub show_border: bool,
    #[serde(alias = "show_logo")]
    pub show_logo: bool,
    #[serde(alias = "show_qr_code")]
    pub show_qr_code: bool,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            aspect_ratio: AspectRatio::Classic,
            show_border: true,
            show_logo: true,
            show_qr_code: true,
        }
    }
}

impl CardConfig {
    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            orientation: self.orientation,
            aspect_ratio: self.aspect_ratio,
            show_border: self.show_border,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    pub blessing_text: String,
    pub organization_name: String,
    pub qr_url: String,
    /// TrueType/OpenType font for card text; the bundled face when unset.
    pub font: Option<PathBuf>,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            blessing_text: DEFAULT_BLESSING_TEXT.into(),
            organization_name: DEFAULT_ORGANIZATION_NAME.into(),
            qr_url: DEFAULT_QR_URL.into(),
            font: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub base_short_side: u32,
    pub container_height: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            base_short_side: DEFAULT_BASE_SHORT_SIDE,
            container_height: DEFAULT_CONTAINER_HEIGHT,
        }
    }
}

impl LayoutSettings {
    pub fn limits(&self) -> LayoutLimits {
        LayoutLimits::from_container(self.base_short_side, self.container_height)
    }
}

/// Settings file contents. Every section and field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub card: CardConfig,
    pub content: ContentSettings,
    pub layout: LayoutSettings,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, CardError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CardError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let settings = Self::from_toml(&text)?;
        debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn limits(&self) -> LayoutLimits {
        self.layout.limits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.card, CardConfig::default());
        assert_eq!(settings.content.font, None);
        assert_eq!(settings.limits(), LayoutLimits { base_short_side: 320, max_frame_height: 680 });
        assert_eq!(settings.content.blessing_text, DEFAULT_BLESSING_TEXT);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let settings = Settings::from_toml(
            r#"
            [card]
            orientation = "horizontal"
            aspect_ratio = "16:9"
            show_qr_code = false

            [content]
            font = "fonts/NotoSansSC.otf"

            [layout]
            container_height = 500
            "#,
        )
        .unwrap();

        let config = settings.card;
        assert_eq!(config.orientation, Orientation::Horizontal);
        assert_eq!(config.aspect_ratio, AspectRatio::Wide);
        assert!(config.show_border);
        assert!(!config.show_qr_code);
        assert_eq!(settings.limits().max_frame_height, 460);
        assert_eq!(settings.limits().base_short_side, 320);
        assert_eq!(settings.content.organization_name, DEFAULT_ORGANIZATION_NAME);
        assert_eq!(settings.content.font, Some(PathBuf::from("fonts/NotoSansSC.otf")));
    }

    #[test]
    fn unknown_ratio_is_a_config_error() {
        let err = Settings::from_toml("[card]\naspect_ratio = \"3:2\"").unwrap_err();
        assert!(matches!(err, CardError::Config(_)));
    }

    #[test]
    fn card_config_json_uses_camel_case() {
        let json = serde_json::to_value(CardConfig::default()).unwrap();
        assert_eq!(json["aspectRatio"], "4:3");
        assert_eq!(json["orientation"], "vertical");
        assert_eq!(json["showQrCode"], true);
    }

    #[test]
    fn layout_follows_card_toggles() {
        let config = CardConfig { show_border: false, ..CardConfig::default() };
        let layout = config.layout();
        assert!(!layout.show_border);
        assert_eq!(layout.aspect_ratio, AspectRatio::Classic);
    }
}
