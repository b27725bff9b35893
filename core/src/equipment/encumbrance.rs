//! 負重

use super::{inventory::Inventory, EquipmentCatalog, EquipmentEntry};
use crate::character::Size;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// 力量 1 到 29 的負重上限（輕、中、重）
const CARRY_CAPACITY: [(u32, u32, u32); 30] = [
    (0, 0, 0),
    (3, 6, 10),
    (6, 13, 20),
    (10, 20, 30),
    (13, 26, 40),
    (16, 33, 50),
    (20, 40, 60),
    (23, 46, 70),
    (26, 53, 80),
    (30, 60, 90),
    (33, 66, 100),
    (38, 76, 115),
    (43, 86, 130),
    (50, 100, 150),
    (58, 116, 175),
    (66, 133, 200),
    (76, 153, 230),
    (86, 173, 260),
    (100, 200, 300),
    (116, 233, 350),
    (133, 266, 400),
    (153, 306, 460),
    (173, 346, 520),
    (200, 400, 600),
    (233, 466, 700),
    (266, 533, 800),
    (306, 613, 920),
    (346, 693, 1040),
    (400, 800, 1200),
    (466, 933, 1400),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryingCapacity {
    pub light: u32,
    pub medium: u32,
    pub heavy: u32,
}

/// 負重等級
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum LoadLevel {
    Light,
    Medium,
    Heavy,
    Overloaded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encumbrance {
    pub total_weight: f64,
    pub capacity: CarryingCapacity,
    pub level: LoadLevel,
}

/// 依力量計算負重上限；29 以上每 10 點乘以 4
pub fn carrying_capacity(strength: i32) -> CarryingCapacity {
    let (light, medium, heavy) = if strength <= 0 {
        (0, 0, 0)
    } else if (strength as usize) < CARRY_CAPACITY.len() {
        CARRY_CAPACITY[strength as usize]
    } else {
        let base = (strength % 10 + 10) as usize;
        let multiplier = 4u32.pow((strength / 10 - 1) as u32);
        let (l, m, h) = CARRY_CAPACITY[base];
        (l * multiplier, m * multiplier, h * multiplier)
    };
    CarryingCapacity {
        light,
        medium,
        heavy,
    }
}

/// 套用體型倍率（無條件捨去）
pub fn scaled_capacity(strength: i32, size: Size) -> CarryingCapacity {
    let base = carrying_capacity(strength);
    let scale = |value: u32| (value as f64 * size.carrying_multiplier()).floor() as u32;
    CarryingCapacity {
        light: scale(base.light),
        medium: scale(base.medium),
        heavy: scale(base.heavy),
    }
}

/// 單件物品重量；秘銀護甲與武器材質的重量倍率已套用
pub fn unit_weight(entry: &EquipmentEntry, catalog: &EquipmentCatalog) -> f64 {
    match entry {
        EquipmentEntry::Weapon(weapon) => {
            let multiplier = catalog
                .weapon_material(&weapon.material)
                .map(|m| m.weight_multiplier)
                .unwrap_or(1.0);
            weapon.item.weight * multiplier
        }
        EquipmentEntry::Armor(armor) => armor.stats().weight,
        EquipmentEntry::Gear(gear) => gear.item.weight,
        EquipmentEntry::Wondrous(item) => item.item.weight,
        EquipmentEntry::Magic(item) => item.item.weight,
    }
}

pub fn total_weight(inventory: &Inventory, catalog: &EquipmentCatalog) -> f64 {
    inventory
        .items
        .iter()
        .map(|e| unit_weight(e, catalog) * e.quantity() as f64)
        .sum()
}

pub fn encumbrance(
    strength: i32,
    size: Size,
    inventory: &Inventory,
    catalog: &EquipmentCatalog,
) -> Encumbrance {
    let capacity = scaled_capacity(strength, size);
    let total_weight = total_weight(inventory, catalog);
    let level = if total_weight <= capacity.light as f64 {
        LoadLevel::Light
    } else if total_weight <= capacity.medium as f64 {
        LoadLevel::Medium
    } else if total_weight <= capacity.heavy as f64 {
        LoadLevel::Heavy
    } else {
        LoadLevel::Overloaded
    };
    Encumbrance {
        total_weight,
        capacity,
        level,
    }
}
