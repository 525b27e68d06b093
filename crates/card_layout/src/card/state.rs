use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use super::config::{CardConfig, ContentSettings};
use crate::layout::geometry::{Geometry, LayoutLimits};
use crate::layout::ratio::{AspectRatio, Orientation};

/// A saved card as returned by the history endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: u64,
    pub image_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub config: Option<CardConfig>,
    #[serde(default)]
    pub blessing_text: Option<String>,
    pub created_at: String,
}

/// In-flight operations the editor shows spinners for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub generating_text: bool,
    pub generating_image: bool,
    pub saving: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SetOrientation(Orientation),
    SetAspectRatio(AspectRatio),
    SetShowBorder(bool),
    SetShowLogo(bool),
    SetShowQrCode(bool),
    SetBlessingText(String),
    SetImage(Option<PathBuf>),
    SetOrganizationName(String),
    SetHistory(Vec<HistoryItem>),
    AddHistoryItem(HistoryItem),
    RemoveHistoryItem(u64),
    SetGeneratingText(bool),
    SetGeneratingImage(bool),
    SetSaving(bool),
}

/// Editor state. All changes go through [`CardState::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardState {
    pub config: CardConfig,
    pub blessing_text: String,
    pub image: Option<PathBuf>,
    pub organization_name: String,
    /// Newest first.
    pub history: Vec<HistoryItem>,
    pub busy: BusyFlags,
    defaults: ContentSettings,
}

impl CardState {
    pub fn new(config: CardConfig, defaults: ContentSettings) -> Self {
        Self {
            config,
            blessing_text: defaults.blessing_text.clone(),
            image: None,
            organization_name: defaults.organization_name.clone(),
            history: Vec::new(),
            busy: BusyFlags::default(),
            defaults,
        }
    }

    pub fn apply(&mut self, action: Action) {
        debug!("card state action: {action:?}");

        match action {
            Action::SetOrientation(orientation) => self.config.orientation = orientation,
            Action::SetAspectRatio(ratio) => self.config.aspect_ratio = ratio,
            Action::SetShowBorder(show) => self.config.show_border = show,
            Action::SetShowLogo(show) => self.config.show_logo = show,
            Action::SetShowQrCode(show) => self.config.show_qr_code = show,
            Action::SetBlessingText(text) => self.blessing_text = text,
            Action::SetImage(image) => self.image = image,
            Action::SetOrganizationName(name) => self.organization_name = name,
            Action::SetHistory(items) => self.history = items,
            Action::AddHistoryItem(item) => self.history.insert(0, item),
            Action::RemoveHistoryItem(id) => self.history.retain(|item| item.id != id),
            Action::SetGeneratingText(busy) => self.busy.generating_text = busy,
            Action::SetGeneratingImage(busy) => self.busy.generating_image = busy,
            Action::SetSaving(busy) => self.busy.saving = busy,
        }
    }

    pub fn geometry(&self, limits: LayoutLimits) -> Geometry {
        self.config.layout().geometry(limits)
    }

    pub fn blessing_or_default(&self) -> &str {
        if self.blessing_text.is_empty() {
            &self.defaults.blessing_text
        } else {
            &self.blessing_text
        }
    }

    pub fn organization_or_default(&self) -> &str {
        if self.organization_name.is_empty() {
            &self.defaults.organization_name
        } else {
            &self.organization_name
        }
    }

    /// The image box invites generation only when it is empty and idle.
    pub fn can_request_image(&self) -> bool {
        self.image.is_none() && !self.busy.generating_image
    }

    pub fn qr_url(&self) -> &str {
        &self.defaults.qr_url
    }
}

impl Default for CardState {
    fn default() -> Self {
        Self::new(CardConfig::default(), ContentSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::config::DEFAULT_BLESSING_TEXT;

    fn item(id: u64) -> HistoryItem {
        HistoryItem {
            id,
            image_url: format!("https://cdn.example.com/{id}.png"),
            thumbnail_url: None,
            config: None,
            blessing_text: None,
            created_at: "2026-01-28T10:00:00Z".into(),
        }
    }

    #[test]
    fn config_actions_change_geometry() {
        let mut state = CardState::default();
        let limits = LayoutLimits::default();
        let before = state.geometry(limits);

        state.apply(Action::SetOrientation(Orientation::Horizontal));
        let after = state.geometry(limits);

        assert_eq!(before.image.width, after.image.height);
        assert_eq!(before.image.height, after.image.width);

        state.apply(Action::SetShowBorder(false));
        let borderless = state.geometry(limits);
        assert_eq!(borderless.frame, borderless.image);
    }

    #[test]
    fn history_is_newest_first() {
        let mut state = CardState::default();
        state.apply(Action::SetHistory(vec![item(2), item(1)]));
        state.apply(Action::AddHistoryItem(item(3)));

        let ids: Vec<u64> = state.history.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        state.apply(Action::RemoveHistoryItem(2));
        state.apply(Action::RemoveHistoryItem(42));
        let ids: Vec<u64> = state.history.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn empty_text_falls_back_to_defaults() {
        let mut state = CardState::default();
        state.apply(Action::SetBlessingText(String::new()));
        state.apply(Action::SetOrganizationName(String::new()));
        assert_eq!(state.blessing_or_default(), DEFAULT_BLESSING_TEXT);
        assert!(!state.organization_or_default().is_empty());

        state.apply(Action::SetBlessingText("新年快乐".into()));
        assert_eq!(state.blessing_or_default(), "新年快乐");
    }

    #[test]
    fn image_request_gated_by_image_and_busy_flag() {
        let mut state = CardState::default();
        assert!(state.can_request_image());

        state.apply(Action::SetGeneratingImage(true));
        assert!(!state.can_request_image());

        state.apply(Action::SetGeneratingImage(false));
        state.apply(Action::SetImage(Some(PathBuf::from("card.png"))));
        assert!(!state.can_request_image());

        state.apply(Action::SetImage(None));
        assert!(state.can_request_image());
    }

    #[test]
    fn history_item_parses_backend_json() {
        let json = r#"{
            "id": 7,
            "image_url": "https://cdn.example.com/7.png",
            "thumbnail_url": null,
            "config": {"orientation": "horizontal", "aspectRatio": "16:9",
                       "showBorder": true, "showLogo": false, "showQrCode": true},
            "blessing_text": "万事如意",
            "created_at": "2026-01-28T10:00:00Z"
        }"#;

        let item: HistoryItem = serde_json::from_str(json).unwrap();
        let config = item.config.unwrap();
        assert_eq!(config.aspect_ratio, AspectRatio::Wide);
        assert!(!config.show_logo);
        assert_eq!(item.blessing_text.as_deref(), Some("万事如意"));
    }
}
