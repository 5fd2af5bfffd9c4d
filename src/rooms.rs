// Floor Plan Rooms - Which appliance categories each room screen offers

use crate::catalog::ApplianceCategory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Room {
    Kitchen,
    LivingRoom,
    WashingRoom,
    Bedroom,
}

impl Room {
    pub fn name(&self) -> &'static str {
        match self {
            Room::Kitchen => "Kitchen",
            Room::LivingRoom => "Living Room",
            Room::WashingRoom => "Washing Room",
            Room::Bedroom => "Bedroom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        Room::all()
            .iter()
            .find(|r| r.name().to_lowercase().replace(' ', "") == normalized)
            .copied()
    }

    pub fn all() -> &'static [Room] {
        &[Room::Kitchen, Room::LivingRoom, Room::WashingRoom, Room::Bedroom]
    }

    /// Tappable appliances on this room's floor plan, in screen order
    pub fn appliances(&self) -> &'static [ApplianceCategory] {
        match self {
            Room::Kitchen => &[
                ApplianceCategory::Fridge,
                ApplianceCategory::Oven,
                ApplianceCategory::Blender,
                ApplianceCategory::Toaster,
            ],
            Room::LivingRoom => &[
                ApplianceCategory::Lamp,
                ApplianceCategory::Tv,
                ApplianceCategory::AirConditioner,
            ],
            Room::WashingRoom => &[
                ApplianceCategory::Washer,
                ApplianceCategory::Dryer,
                ApplianceCategory::CeilingLamp,
            ],
            Room::Bedroom => &[
                ApplianceCategory::AirConditioner,
                ApplianceCategory::Tv,
                ApplianceCategory::Lamp,
            ],
        }
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_appliances() {
        assert_eq!(
            Room::Kitchen.appliances(),
            &[
                ApplianceCategory::Fridge,
                ApplianceCategory::Oven,
                ApplianceCategory::Blender,
                ApplianceCategory::Toaster,
            ]
        );
        assert!(Room::Bedroom.appliances().contains(&ApplianceCategory::Tv));
    }

    #[test]
    fn test_room_from_name() {
        assert_eq!(Room::from_name("Living Room"), Some(Room::LivingRoom));
        assert_eq!(Room::from_name("living-room"), Some(Room::LivingRoom));
        assert_eq!(Room::from_name("kitchen"), Some(Room::Kitchen));
        assert_eq!(Room::from_name("Garage"), None);
    }
}
