//! 背包
//!
//! 所有轉換都回傳新的背包；裝備切換會在同一次轉換中卸下衝突的物品，
//! 所以不會出現兩件護甲同時裝備的狀態。

use super::{ArmorCategory, ArmorEntry, EquipmentEntry, ItemSlot, ModifierTarget};
use crate::{
    bonus::BonusEntry,
    error::{EquipmentError, Result},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub items: Vec<EquipmentEntry>,
    /// 金幣
    #[serde(default)]
    pub gold: f64,
}

impl Inventory {
    pub fn new(items: Vec<EquipmentEntry>) -> Self {
        Self { items, gold: 0.0 }
    }

    pub fn equipped(&self) -> impl Iterator<Item = &EquipmentEntry> {
        self.items.iter().filter(|e| e.is_equipped())
    }

    /// 已裝備的護甲與盾牌
    pub fn equipped_armor(&self) -> impl Iterator<Item = &ArmorEntry> {
        self.equipped().filter_map(|e| match e {
            EquipmentEntry::Armor(armor) => Some(armor),
            _ => None,
        })
    }

    /// 加入物品：同名的普通物品疊加數量
    ///
    /// 已裝備的物品不疊加，並卸下與它衝突的裝備。
    pub fn add(&self, entry: EquipmentEntry) -> Self {
        let mut items = self.items.clone();
        if entry.is_equipped() {
            unequip_conflicts(&mut items, ConflictKind::of(&entry), None);
            debug!(item = entry.name(), "加入已裝備物品");
            items.push(entry);
            return Self {
                items,
                gold: self.gold,
            };
        }

        let key = stack_view(&entry);
        let existing = if entry.is_mundane() {
            items
                .iter_mut()
                .find(|e| e.is_mundane() && !e.is_equipped() && stack_view(e) == key)
        } else {
            None
        };
        match existing {
            Some(stack) => {
                let added = entry.quantity();
                *stack.quantity_mut() += added;
            }
            None => items.push(entry),
        }
        Self {
            items,
            gold: self.gold,
        }
    }

    /// 移除一件：數量大於 1 時只減一
    pub fn remove_one(&self, index: usize) -> Result<Self> {
        let mut items = self.items.clone();
        let len = items.len();
        let entry = items.get_mut(index).ok_or_else(|| {
            warn!(index, len, "移除物品索引超出範圍");
            EquipmentError::IndexOutOfRange { index, len }
        })?;
        if entry.quantity() > 1 {
            *entry.quantity_mut() -= 1;
        } else {
            items.remove(index);
        }
        Ok(Self {
            items,
            gold: self.gold,
        })
    }

    /// 切換裝備狀態
    ///
    /// 裝備護甲時卸下其他護甲，盾牌亦同；奇物與魔法物品每個欄位只能有一件，
    /// `ItemSlot::None` 不受限制。
    pub fn toggle_equipped(&self, index: usize) -> Result<Self> {
        let len = self.items.len();
        let target = self.items.get(index).ok_or_else(|| {
            warn!(index, len, "裝備索引超出範圍");
            EquipmentError::IndexOutOfRange { index, len }
        })?;
        let equipping = !target.is_equipped();
        let kind = ConflictKind::of(target);

        let mut items = self.items.clone();
        if equipping {
            unequip_conflicts(&mut items, kind, Some(index));
        }
        if let Some(entry) = items.get_mut(index) {
            entry.set_equipped(equipping);
            debug!(item = entry.name(), equipped = equipping, "切換裝備");
        }
        Ok(Self {
            items,
            gold: self.gold,
        })
    }
}

/// 已裝備防具與奇物的彙整
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefenceSummary {
    pub armor_bonus: i32,
    pub shield_bonus: i32,
    /// 最嚴格的敏捷上限
    pub max_dex: Option<i32>,
    /// 所有已裝備護甲與盾牌的檢定減值總和
    pub armor_check_penalty: i32,
    pub arcane_spell_failure: i32,
    /// 身上護甲的有效類別（秘銀降級後）
    pub armor_category: Option<ArmorCategory>,
    /// 未套用秘銀前的護甲速度值
    pub armor_speeds: Option<(i32, i32)>,
    pub ac_bonuses: Vec<BonusEntry>,
    pub save_bonuses: Vec<BonusEntry>,
}

impl DefenceSummary {
    /// 穿著中甲或重甲時以護甲速度取代種族速度
    pub fn speed(&self, base_speed: i32) -> i32 {
        match (self.armor_category, self.armor_speeds) {
            (Some(ArmorCategory::Medium | ArmorCategory::Heavy), Some((speed30, speed20))) => {
                if base_speed <= 20 {
                    speed20
                } else {
                    speed30
                }
            }
            _ => base_speed,
        }
    }
}

impl Inventory {
    /// 由已裝備物品彙整防禦數值
    pub fn defence_summary(&self) -> DefenceSummary {
        let mut summary = DefenceSummary::default();
        for armor in self.equipped_armor() {
            let stats = armor.stats();
            summary.armor_check_penalty += stats.armor_check_penalty;
            summary.arcane_spell_failure += stats.arcane_spell_failure;
            if let Some(cap) = stats.max_dex {
                summary.max_dex = Some(summary.max_dex.map_or(cap, |current| current.min(cap)));
            }
            if armor.item.is_shield() {
                summary.shield_bonus = summary.shield_bonus.max(stats.ac_bonus);
                continue;
            }
            summary.armor_bonus = summary.armor_bonus.max(stats.ac_bonus);
            summary.armor_category = Some(stats.category);
            summary.armor_speeds = Some((armor.item.speed30, armor.item.speed20));
        }

        for entry in self.equipped() {
            if let EquipmentEntry::Wondrous(item) = entry {
                for modifier in &item.item.modifiers {
                    let bonus = BonusEntry::new(
                        item.item.name.clone(),
                        modifier.value,
                        modifier.bonus_type,
                    );
                    match modifier.target {
                        ModifierTarget::Ac => summary.ac_bonuses.push(bonus),
                        ModifierTarget::Save => summary.save_bonuses.push(bonus),
                    }
                }
            }
        }
        summary
    }
}

/// 卸下與 `kind` 互斥的已裝備物品，`keep` 指定的索引除外
fn unequip_conflicts(items: &mut [EquipmentEntry], kind: ConflictKind, keep: Option<usize>) {
    for (i, other) in items.iter_mut().enumerate() {
        if Some(i) != keep && other.is_equipped() && kind.conflicts_with(other) {
            debug!(item = other.name(), "卸下衝突裝備");
            other.set_equipped(false);
        }
    }
}

/// 比較疊加用：忽略數量與裝備狀態
fn stack_view(entry: &EquipmentEntry) -> EquipmentEntry {
    let mut view = entry.clone();
    view.set_equipped(false);
    *view.quantity_mut() = 1;
    view
}

/// 互斥的裝備種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConflictKind {
    BodyArmor,
    Shield,
    Slot(ItemSlot),
    Unconstrained,
}

impl ConflictKind {
    fn of(entry: &EquipmentEntry) -> Self {
        match entry {
            EquipmentEntry::Armor(armor) if armor.item.is_shield() => Self::Shield,
            EquipmentEntry::Armor(_) => Self::BodyArmor,
            EquipmentEntry::Wondrous(_) | EquipmentEntry::Magic(_) => match entry.body_slot() {
                Some(ItemSlot::None) | None => Self::Unconstrained,
                Some(slot) => Self::Slot(slot),
            },
            _ => Self::Unconstrained,
        }
    }

    fn conflicts_with(&self, other: &EquipmentEntry) -> bool {
        *self != Self::Unconstrained && *self == Self::of(other)
    }
}
