//! The player's numeric and inventory status.

use serde::{Deserialize, Serialize};

/// Player status record: hit points, whereabouts and carried items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub hp: i32,
    pub max_hp: i32,
    pub location: String,
    pub inventory: Vec<String>,
}

impl GameState {
    pub fn new(hp: i32, max_hp: i32, location: impl Into<String>) -> Self {
        Self {
            hp,
            max_hp,
            location: location.into(),
            inventory: Vec::new(),
        }
    }

    pub fn with_inventory<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inventory = items.into_iter().map(Into::into).collect();
        self
    }

    /// Merge a partial update. Fields absent from `update` keep their value.
    pub fn apply(&mut self, update: &StateUpdate) {
        if let Some(hp) = update.hp {
            self.hp = hp;
        }
        if let Some(max_hp) = update.max_hp {
            self.max_hp = max_hp;
        }
        if let Some(ref location) = update.location {
            self.location = location.clone();
        }
        if let Some(ref inventory) = update.inventory {
            self.inventory = inventory.clone();
        }
    }
}

/// A partial [`GameState`]: only the fields that changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<String>>,
}

impl StateUpdate {
    pub fn is_empty(&self) -> bool {
        self.hp.is_none()
            && self.max_hp.is_none()
            && self.location.is_none()
            && self.inventory.is_none()
    }

    pub fn hp(hp: i32) -> Self {
        Self {
            hp: Some(hp),
            ..Self::default()
        }
    }

    pub fn location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest_state() -> GameState {
        GameState::new(20, 20, "X").with_inventory(["Rations", "Map"])
    }

    #[test]
    fn test_partial_merge_keeps_untouched_fields() {
        let mut state = forest_state();
        state.apply(&StateUpdate::hp(5));

        assert_eq!(state.hp, 5);
        assert_eq!(state.max_hp, 20);
        assert_eq!(state.location, "X");
        assert_eq!(state.inventory, vec!["Rations", "Map"]);
    }

    #[test]
    fn test_empty_update_is_identity() {
        let mut state = forest_state();
        assert!(StateUpdate::default().is_empty());
        state.apply(&StateUpdate::default());
        assert_eq!(state, forest_state());
    }

    #[test]
    fn test_inventory_replaced_wholesale() {
        let update = StateUpdate {
            inventory: Some(vec!["Torch".to_string()]),
            ..StateUpdate::default()
        };
        let mut state = forest_state();
        state.apply(&update);
        assert_eq!(state.inventory, vec!["Torch"]);
        assert_eq!(state.hp, 20);
    }

    #[test]
    fn test_update_deserializes_camel_case() {
        let update: StateUpdate =
            serde_json::from_str(r#"{"hp": 18, "maxHp": 22}"#).unwrap();
        assert_eq!(update.hp, Some(18));
        assert_eq!(update.max_hp, Some(22));
        assert!(update.location.is_none());
    }
}
