//! 角色系統
//!
//! 種族、職業的靜態記錄，以及持久化的角色記錄。
//! 角色記錄只透過回傳新值的轉換方法改變，不會原地修改。

use crate::{
    abilities::{Ability, AbilityModifier, AbilityScores},
    combat::{BabProgression, SaveFlags},
    equipment::{inventory::Inventory, EquipmentEntry},
    error::Result,
    progression::LevelUpRecord,
    skills::CharacterSkill,
    spells::SpellProgression,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;

/// 體型類別
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum Size {
    Fine,
    Diminutive,
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl Size {
    /// AC 與攻擊的體型調整值（小型為正，大型為負）
    pub fn modifier(&self) -> i32 {
        match self {
            Self::Fine => 8,
            Self::Diminutive => 4,
            Self::Tiny => 2,
            Self::Small => 1,
            Self::Medium => 0,
            Self::Large => -1,
            Self::Huge => -2,
            Self::Gargantuan => -4,
            Self::Colossal => -8,
        }
    }

    /// 負重上限倍率（雙足生物）
    pub fn carrying_multiplier(&self) -> f64 {
        match self {
            Self::Fine => 0.125,
            Self::Diminutive => 0.25,
            Self::Tiny => 0.5,
            Self::Small => 0.75,
            Self::Medium => 1.0,
            Self::Large => 2.0,
            Self::Huge => 4.0,
            Self::Gargantuan => 8.0,
            Self::Colossal => 16.0,
        }
    }
}

/// 種族
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub name: String,
    #[serde(default)]
    pub size: Size,
    pub speed: i32,
    #[serde(default)]
    pub ability_modifiers: Vec<AbilityModifier>,
    /// 玩家可自選一項屬性 +2（人類、半精靈、半獸人）
    #[serde(default)]
    pub flexible_bonus: bool,
    /// 每級額外一個技能點
    #[serde(default)]
    pub bonus_skill_rank: bool,
    /// 種族技能加值，技能名稱 → 加值
    #[serde(default)]
    pub skill_bonuses: BTreeMap<String, i32>,
}

/// 職業特性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFeature {
    pub name: String,
    pub level: u32,
}

/// 職業額外專長等級
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusFeatLevel {
    pub level: u32,
    #[serde(default)]
    pub note: String,
}

/// 每日使用次數公式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsesFormula {
    /// 固定次數
    Fixed { uses: i32 },
    /// base + (等級 - 1) × per_level
    Linear { base: i32, per_level: i32 },
    /// 從 start_level 起 base 次，之後每 every 級 +1；未達起始等級為 0
    Stepped { base: i32, start_level: u32, every: u32 },
}

impl UsesFormula {
    fn base_uses(&self, level: u32) -> i32 {
        match *self {
            Self::Fixed { uses } => uses,
            Self::Linear { base, per_level } => base + (level as i32 - 1).max(0) * per_level,
            Self::Stepped {
                base,
                start_level,
                every,
            } => {
                if level < start_level {
                    0
                } else {
                    base + ((level - start_level) / every.max(1)) as i32
                }
            }
        }
    }
}

/// 資源何時恢復
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetsOn {
    #[default]
    Rest,
    Never,
}

/// 職業資源（狂暴回合、引導能量 ...）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassResource {
    pub name: String,
    pub formula: UsesFormula,
    /// 若設定，每日次數再加上此屬性調整值
    #[serde(default)]
    pub ability: Option<Ability>,
    #[serde(default)]
    pub resets_on: ResetsOn,
}

impl ClassResource {
    /// 每日可用次數，不會低於 0
    pub fn uses_per_day(&self, level: u32, ability_modifier: i32) -> i32 {
        let base = self.formula.base_uses(level);
        if base <= 0 {
            return 0;
        }
        let bonus = if self.ability.is_some() {
            ability_modifier
        } else {
            0
        };
        (base + bonus).max(0)
    }
}

/// 偷襲骰數成長
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SneakAttackProgression {
    /// ceil(等級 / 2)
    HalfLevelRoundedUp,
    /// 從 start 級起 1 顆，之後每 every 級 +1
    Stepped { start: u32, every: u32 },
}

impl SneakAttackProgression {
    /// 指定等級的 d6 數量
    pub fn dice_at(&self, level: u32) -> u32 {
        match *self {
            Self::HalfLevelRoundedUp => level.div_ceil(2),
            Self::Stepped { start, every } => {
                if level < start {
                    0
                } else {
                    (level - start) / every.max(1) + 1
                }
            }
        }
    }
}

/// 職業
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterClass {
    pub name: String,
    pub hit_die: u32,
    pub bab: BabProgression,
    pub saves: SaveFlags,
    pub skill_ranks_per_level: u32,
    #[serde(default)]
    pub class_skills: Vec<String>,
    #[serde(default)]
    pub features: Vec<ClassFeature>,
    #[serde(default)]
    pub spells: SpellProgression,
    #[serde(default)]
    pub resources: Vec<ClassResource>,
    #[serde(default)]
    pub bonus_feats: Vec<BonusFeatLevel>,
    #[serde(default)]
    pub sneak_attack: Option<SneakAttackProgression>,
    /// 武器與護甲熟練（供先決條件判斷）
    #[serde(default)]
    pub proficiencies: Vec<String>,
}

impl CharacterClass {
    pub fn is_class_skill(&self, skill: &str) -> bool {
        self.class_skills.iter().any(|s| s == skill)
    }

    /// 該等級是否為額外專長等級
    pub fn bonus_feat_at(&self, level: u32) -> Option<&BonusFeatLevel> {
        self.bonus_feats.iter().find(|b| b.level == level)
    }

    /// 某等級獲得的職業特性
    pub fn features_at(&self, level: u32) -> impl Iterator<Item = &ClassFeature> {
        self.features.iter().filter(move |f| f.level == level)
    }

    /// 到某等級為止已獲得的職業特性名稱（小寫）
    pub fn feature_names_through(&self, level: u32) -> Vec<String> {
        self.features
            .iter()
            .filter(|f| f.level <= level)
            .map(|f| f.name.to_lowercase())
            .collect()
    }
}

/// 手動輸入的 AC 調整
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcModifiers {
    pub natural_armor: i32,
    pub deflection: i32,
    pub dodge: i32,
    pub insight: i32,
    pub misc: i32,
}

/// 角色記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub race: String,
    /// 彈性 +2 的屬性選擇
    #[serde(default)]
    pub racial_ability_choice: Option<Ability>,
    pub class_name: String,
    pub level: u32,
    /// 基礎屬性（不含種族調整）
    pub base_ability_scores: AbilityScores,
    #[serde(default)]
    pub skills: Vec<CharacterSkill>,
    #[serde(default)]
    pub feats: Vec<String>,
    /// 專長參數，例如 "Weapon Focus" → "Longsword"
    #[serde(default)]
    pub feat_params: BTreeMap<String, String>,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub ac_modifiers: AcModifiers,
    #[serde(default)]
    pub max_hp_override: Option<i32>,
    /// 法術環級 → 已使用次數
    #[serde(default)]
    pub spell_slots_used: BTreeMap<u8, u32>,
    /// 資源名稱 → 已使用次數
    #[serde(default)]
    pub class_resources_used: BTreeMap<String, u32>,
    /// 目前開啟的戰鬥切換（專長、偷襲、武器特殊能力）
    #[serde(default)]
    pub combat_toggles: BTreeSet<String>,
    #[serde(default)]
    pub level_history: Vec<LevelUpRecord>,
}

impl Character {
    pub fn new(
        name: impl Into<String>,
        race: impl Into<String>,
        class_name: impl Into<String>,
        base_ability_scores: AbilityScores,
    ) -> Self {
        Self {
            name: name.into(),
            race: race.into(),
            racial_ability_choice: None,
            class_name: class_name.into(),
            level: 1,
            base_ability_scores,
            skills: Vec::new(),
            feats: Vec::new(),
            feat_params: BTreeMap::new(),
            inventory: Inventory::default(),
            ac_modifiers: AcModifiers::default(),
            max_hp_override: None,
            spell_slots_used: BTreeMap::new(),
            class_resources_used: BTreeMap::new(),
            combat_toggles: BTreeSet::new(),
            level_history: Vec::new(),
        }
    }

    pub fn has_feat(&self, feat: &str) -> bool {
        self.feats.iter().any(|f| f == feat)
    }

    pub fn skill(&self, name: &str) -> Option<&CharacterSkill> {
        self.skills.iter().find(|s| s.name == name)
    }

    /// 加入物品
    pub fn add_item(&self, entry: EquipmentEntry) -> Self {
        debug!(character = %self.name, item = entry.name(), "加入物品");
        Self {
            inventory: self.inventory.add(entry),
            ..self.clone()
        }
    }

    /// 移除一件物品（數量大於 1 時只減一）
    pub fn remove_item(&self, index: usize) -> Result<Self> {
        let inventory = self.inventory.remove_one(index)?;
        debug!(character = %self.name, index, "移除物品");
        Ok(Self {
            inventory,
            ..self.clone()
        })
    }

    /// 切換裝備狀態，同時卸下衝突的裝備
    pub fn toggle_equipped(&self, index: usize) -> Result<Self> {
        let inventory = self.inventory.toggle_equipped(index)?;
        Ok(Self {
            inventory,
            ..self.clone()
        })
    }

    /// 使用一個法術位
    pub fn use_spell_slot(&self, spell_level: u8) -> Self {
        let mut used = self.spell_slots_used.clone();
        *used.entry(spell_level).or_insert(0) += 1;
        debug!(character = %self.name, spell_level, used = used[&spell_level], "使用法術位");
        Self {
            spell_slots_used: used,
            ..self.clone()
        }
    }

    /// 恢復一個法術位，不低於 0
    pub fn restore_spell_slot(&self, spell_level: u8) -> Self {
        let mut used = self.spell_slots_used.clone();
        let entry = used.entry(spell_level).or_insert(0);
        *entry = entry.saturating_sub(1);
        debug!(character = %self.name, spell_level, "恢復法術位");
        Self {
            spell_slots_used: used,
            ..self.clone()
        }
    }

    /// 使用一次職業資源
    pub fn use_class_resource(&self, resource: &str) -> Self {
        let mut used = self.class_resources_used.clone();
        *used.entry(resource.to_string()).or_insert(0) += 1;
        debug!(character = %self.name, resource, "使用職業資源");
        Self {
            class_resources_used: used,
            ..self.clone()
        }
    }

    pub fn restore_class_resource(&self, resource: &str) -> Self {
        let mut used = self.class_resources_used.clone();
        if let Some(count) = used.get_mut(resource) {
            *count = count.saturating_sub(1);
        }
        debug!(character = %self.name, resource, "恢復職業資源");
        Self {
            class_resources_used: used,
            ..self.clone()
        }
    }

    /// 休息：清空法術位與可恢復資源的使用紀錄
    pub fn rest(&self, class: &CharacterClass) -> Self {
        let class_resources_used = self
            .class_resources_used
            .iter()
            .filter(|(name, _)| {
                class
                    .resources
                    .iter()
                    .any(|r| &r.name == *name && r.resets_on == ResetsOn::Never)
            })
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        debug!(character = %self.name, "休息");
        Self {
            spell_slots_used: BTreeMap::new(),
            class_resources_used,
            ..self.clone()
        }
    }

    /// 開關戰鬥切換
    pub fn set_toggle(&self, id: &str, active: bool) -> Self {
        let mut toggles = self.combat_toggles.clone();
        if active {
            toggles.insert(id.to_string());
        } else {
            toggles.remove(id);
        }
        debug!(character = %self.name, toggle = id, active, "戰鬥切換");
        Self {
            combat_toggles: toggles,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn barbarian_rage() -> ClassResource {
        ClassResource {
            name: "Rage".to_string(),
            formula: UsesFormula::Linear {
                base: 4,
                per_level: 2,
            },
            ability: Some(Ability::Constitution),
            resets_on: ResetsOn::Rest,
        }
    }

    #[test]
    fn test_size_modifiers() {
        assert_eq!(Size::Fine.modifier(), 8);
        assert_eq!(Size::Small.modifier(), 1);
        assert_eq!(Size::Medium.modifier(), 0);
        assert_eq!(Size::Large.modifier(), -1);
        assert_eq!(Size::Colossal.modifier(), -8);
    }

    #[test]
    fn test_resource_uses() {
        let rage = barbarian_rage();
        // 4 + 體質 + (等級 - 1) × 2
        assert_eq!(rage.uses_per_day(1, 2), 6);
        assert_eq!(rage.uses_per_day(5, 3), 15);

        let channel = ClassResource {
            name: "Channel Energy".to_string(),
            formula: UsesFormula::Fixed { uses: 3 },
            ability: Some(Ability::Charisma),
            resets_on: ResetsOn::Rest,
        };
        assert_eq!(channel.uses_per_day(1, -4), 0);

        let smite = ClassResource {
            name: "Smite Evil".to_string(),
            formula: UsesFormula::Stepped {
                base: 1,
                start_level: 1,
                every: 3,
            },
            ability: None,
            resets_on: ResetsOn::Rest,
        };
        assert_eq!(smite.uses_per_day(1, 5), 1);
        assert_eq!(smite.uses_per_day(4, 5), 2);
        assert_eq!(smite.uses_per_day(10, 5), 4);
    }

    #[test]
    fn test_sneak_attack_progression() {
        let rogue = SneakAttackProgression::HalfLevelRoundedUp;
        assert_eq!(rogue.dice_at(1), 1);
        assert_eq!(rogue.dice_at(4), 2);
        assert_eq!(rogue.dice_at(5), 3);

        let slayer = SneakAttackProgression::Stepped { start: 3, every: 3 };
        assert_eq!(slayer.dice_at(2), 0);
        assert_eq!(slayer.dice_at(3), 1);
        assert_eq!(slayer.dice_at(9), 3);

        let investigator = SneakAttackProgression::Stepped { start: 4, every: 2 };
        assert_eq!(investigator.dice_at(4), 1);
        assert_eq!(investigator.dice_at(8), 3);
    }

    #[test]
    fn test_spell_slot_transitions() {
        let character = Character::new("Ezren", "Human", "Wizard", AbilityScores::default());
        let used = character.use_spell_slot(1).use_spell_slot(1);
        assert_eq!(used.spell_slots_used.get(&1), Some(&2));
        // 原值不變
        assert!(character.spell_slots_used.is_empty());

        let restored = used.restore_spell_slot(1).restore_spell_slot(1).restore_spell_slot(1);
        assert_eq!(restored.spell_slots_used.get(&1), Some(&0));
    }

    #[test]
    fn test_rest_keeps_non_resetting_resources() {
        let mut class = CharacterClass {
            name: "Barbarian".to_string(),
            hit_die: 12,
            bab: BabProgression::Full,
            saves: SaveFlags::default(),
            skill_ranks_per_level: 4,
            class_skills: vec![],
            features: vec![],
            spells: SpellProgression::default(),
            resources: vec![barbarian_rage()],
            bonus_feats: vec![],
            sneak_attack: None,
            proficiencies: vec![],
        };
        class.resources.push(ClassResource {
            name: "Wish".to_string(),
            formula: UsesFormula::Fixed { uses: 1 },
            ability: None,
            resets_on: ResetsOn::Never,
        });

        let character = Character::new("Amiri", "Human", "Barbarian", AbilityScores::default())
            .use_class_resource("Rage")
            .use_class_resource("Wish")
            .use_spell_slot(0);
        let rested = character.rest(&class);
        assert!(rested.spell_slots_used.is_empty());
        assert_eq!(rested.class_resources_used.get("Rage"), None);
        assert_eq!(rested.class_resources_used.get("Wish"), Some(&1));
    }

    #[test]
    fn test_toggles() {
        let character = Character::new("Valeros", "Human", "Fighter", AbilityScores::default());
        let on = character.set_toggle("powerAttack", true);
        assert!(on.combat_toggles.contains("powerAttack"));
        let off = on.set_toggle("powerAttack", false);
        assert!(off.combat_toggles.is_empty());
    }
}
