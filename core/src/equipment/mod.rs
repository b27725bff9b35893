//! 裝備與物品系統
//!
//! 裝備以單一 sum type 表示，每種物品一個變體：武器、護甲（含盾牌）、
//! 一般物品、奇物與其他魔法物品。武器與護甲可帶品質、材質、
//! 強化加值與特殊能力，由 [`armor`] 與 [`weapon`] 解析成實際數值。

pub mod armor;
pub mod encumbrance;
pub mod inventory;
pub mod weapon;

use crate::{
    bonus::BonusType,
    dice::DiceRoll,
    error::{EquipmentError, Result},
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub use armor::{ArmorAbilityTarget, ArmorMaterial, ArmorSpecialAbility, ArmorStats};
pub use weapon::{WeaponAbilityTarget, WeaponMaterialDef, WeaponModifiers, WeaponSpecialAbility};

/// 強化加值上限
pub const MAX_ENHANCEMENT: i32 = 5;
/// 有效加值（強化 + 特殊能力）上限
pub const MAX_EFFECTIVE_BONUS: i32 = 10;

/// 製作品質
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    Masterwork,
}

/// 武器熟練類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum WeaponCategory {
    Simple,
    Martial,
    Exotic,
}

/// 武器握持方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    Unarmed,
    LightMelee,
    OneHandedMelee,
    TwoHandedMelee,
    Ranged,
    Ammunition,
}

/// 重擊範圍與倍率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critical {
    /// 重擊範圍下限，20 表示只有 20
    pub range: u32,
    pub multiplier: u32,
}

impl Default for Critical {
    fn default() -> Self {
        Self {
            range: 20,
            multiplier: 2,
        }
    }
}

/// 武器（規則表記錄）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub category: WeaponCategory,
    pub weapon_type: WeaponType,
    /// 金幣
    pub cost: f64,
    pub damage: DiceRoll,
    #[serde(default)]
    pub critical: Critical,
    #[serde(default)]
    pub weight: f64,
    /// 雖非輕型武器，仍可使用武器靈巧（細劍、鞭 ...）
    #[serde(default)]
    pub finesse: bool,
    /// 複合弓，可設定力量等級
    #[serde(default)]
    pub composite: bool,
}

impl Weapon {
    pub fn is_ranged(&self) -> bool {
        matches!(self.weapon_type, WeaponType::Ranged)
    }

    pub fn is_two_handed(&self) -> bool {
        matches!(self.weapon_type, WeaponType::TwoHandedMelee)
    }

    pub fn is_light(&self) -> bool {
        matches!(self.weapon_type, WeaponType::LightMelee | WeaponType::Unarmed)
    }

    /// 可使用武器靈巧
    pub fn is_finessable(&self) -> bool {
        !self.is_ranged() && (self.is_light() || self.finesse)
    }
}

/// 護甲類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum ArmorCategory {
    Light,
    Medium,
    Heavy,
    Shield,
}

impl ArmorCategory {
    /// 秘銀讓類別降一級，輕甲與盾牌不變
    pub fn lighter(&self) -> Self {
        match self {
            Self::Heavy => Self::Medium,
            Self::Medium => Self::Light,
            other => *other,
        }
    }
}

/// 護甲或盾牌（規則表記錄）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub name: String,
    pub category: ArmorCategory,
    pub cost: f64,
    pub ac_bonus: i32,
    /// `None` 表示沒有敏捷上限
    #[serde(default)]
    pub max_dex: Option<i32>,
    /// 防具檢定減值（<= 0）
    #[serde(default)]
    pub armor_check_penalty: i32,
    /// 秘法失敗率（百分比）
    #[serde(default)]
    pub arcane_spell_failure: i32,
    /// 基礎速度 30 呎時穿著後的速度
    #[serde(default = "default_speed30")]
    pub speed30: i32,
    /// 基礎速度 20 呎時穿著後的速度
    #[serde(default = "default_speed20")]
    pub speed20: i32,
    #[serde(default)]
    pub weight: f64,
}

fn default_speed30() -> i32 {
    30
}

fn default_speed20() -> i32 {
    20
}

impl Armor {
    pub fn is_shield(&self) -> bool {
        self.category == ArmorCategory::Shield
    }
}

/// 特殊能力的選擇（能力 id 與可選目標，例如克星的生物類型）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialAbilityEntry {
    pub id: String,
    #[serde(default)]
    pub target: Option<String>,
}

impl SpecialAbilityEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: None,
        }
    }

    pub fn with_target(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: Some(target.into()),
        }
    }
}

/// 身體欄位
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ItemSlot {
    Ring,
    Neck,
    Wrists,
    Shoulders,
    Body,
    Head,
    Headband,
    Eyes,
    Hands,
    Feet,
    Belt,
    Chest,
    /// 不占欄位，不受唯一限制
    #[default]
    None,
}

/// 奇物調整的對象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierTarget {
    Ac,
    Save,
}

/// 奇物提供的具型別加值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WondrousModifier {
    pub target: ModifierTarget,
    pub bonus_type: BonusType,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    pub name: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WondrousItem {
    pub name: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub slot: ItemSlot,
    #[serde(default)]
    pub modifiers: Vec<WondrousModifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicItem {
    pub name: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub slot: ItemSlot,
}

/// 背包中的武器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponEntry {
    pub item: Weapon,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub equipped: bool,
    #[serde(default)]
    pub quality: Quality,
    /// 材質 id，對應武器材質表
    #[serde(default = "standard_material")]
    pub material: String,
    #[serde(default)]
    pub enhancement_bonus: i32,
    #[serde(default)]
    pub special_abilities: Vec<SpecialAbilityEntry>,
    /// 複合弓的力量等級
    #[serde(default)]
    pub strength_rating: Option<i32>,
}

/// 背包中的護甲或盾牌
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorEntry {
    pub item: Armor,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub equipped: bool,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub material: ArmorMaterial,
    #[serde(default)]
    pub enhancement_bonus: i32,
    #[serde(default)]
    pub special_abilities: Vec<SpecialAbilityEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry<T> {
    pub item: T,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub equipped: bool,
}

fn one() -> u32 {
    1
}

fn standard_material() -> String {
    weapon::STANDARD_MATERIAL.to_string()
}

/// 背包項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EquipmentEntry {
    Weapon(WeaponEntry),
    Armor(ArmorEntry),
    Gear(ItemEntry<Gear>),
    Wondrous(ItemEntry<WondrousItem>),
    Magic(ItemEntry<MagicItem>),
}

impl EquipmentEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Weapon(e) => &e.item.name,
            Self::Armor(e) => &e.item.name,
            Self::Gear(e) => &e.item.name,
            Self::Wondrous(e) => &e.item.name,
            Self::Magic(e) => &e.item.name,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            Self::Weapon(e) => e.quantity,
            Self::Armor(e) => e.quantity,
            Self::Gear(e) => e.quantity,
            Self::Wondrous(e) => e.quantity,
            Self::Magic(e) => e.quantity,
        }
    }

    pub(crate) fn quantity_mut(&mut self) -> &mut u32 {
        match self {
            Self::Weapon(e) => &mut e.quantity,
            Self::Armor(e) => &mut e.quantity,
            Self::Gear(e) => &mut e.quantity,
            Self::Wondrous(e) => &mut e.quantity,
            Self::Magic(e) => &mut e.quantity,
        }
    }

    pub fn is_equipped(&self) -> bool {
        match self {
            Self::Weapon(e) => e.equipped,
            Self::Armor(e) => e.equipped,
            Self::Gear(e) => e.equipped,
            Self::Wondrous(e) => e.equipped,
            Self::Magic(e) => e.equipped,
        }
    }

    pub(crate) fn set_equipped(&mut self, equipped: bool) {
        match self {
            Self::Weapon(e) => e.equipped = equipped,
            Self::Armor(e) => e.equipped = equipped,
            Self::Gear(e) => e.equipped = equipped,
            Self::Wondrous(e) => e.equipped = equipped,
            Self::Magic(e) => e.equipped = equipped,
        }
    }

    /// 奇物或魔法物品占用的身體欄位
    pub fn body_slot(&self) -> Option<ItemSlot> {
        match self {
            Self::Wondrous(e) => Some(e.item.slot),
            Self::Magic(e) => Some(e.item.slot),
            _ => None,
        }
    }

    /// 沒有任何強化、材質或品質的普通物品
    pub fn is_mundane(&self) -> bool {
        match self {
            Self::Weapon(e) => {
                e.quality == Quality::Standard
                    && e.material == weapon::STANDARD_MATERIAL
                    && e.enhancement_bonus == 0
                    && e.special_abilities.is_empty()
                    && e.strength_rating.is_none()
            }
            Self::Armor(e) => {
                e.quality == Quality::Standard
                    && e.material == ArmorMaterial::Standard
                    && e.enhancement_bonus == 0
                    && e.special_abilities.is_empty()
            }
            Self::Gear(_) => true,
            Self::Wondrous(_) | Self::Magic(_) => false,
        }
    }
}

/// 裝備相關的規則表：特殊能力與武器材質
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentCatalog {
    pub weapon_abilities: Vec<WeaponSpecialAbility>,
    pub armor_abilities: Vec<ArmorSpecialAbility>,
    pub weapon_materials: Vec<WeaponMaterialDef>,
}

impl EquipmentCatalog {
    pub fn weapon_ability(&self, id: &str) -> Option<&WeaponSpecialAbility> {
        self.weapon_abilities.iter().find(|a| a.id == id)
    }

    pub fn armor_ability(&self, id: &str) -> Option<&ArmorSpecialAbility> {
        self.armor_abilities.iter().find(|a| a.id == id)
    }

    /// 查找材質；"standard" 不在表中時視為無調整的普通材質
    pub fn weapon_material(&self, id: &str) -> Option<WeaponMaterialDef> {
        self.weapon_materials
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .or_else(|| (id == weapon::STANDARD_MATERIAL).then(WeaponMaterialDef::standard))
    }
}

/// 強化加值與有效加值的共同驗證
pub(crate) fn validate_enhancement(
    enhancement_bonus: i32,
    ability_ids: &[SpecialAbilityEntry],
    ability_equivalent: i32,
) -> Result<()> {
    if enhancement_bonus == 0 {
        if let Some(first) = ability_ids.first() {
            return Err(EquipmentError::AbilityRequiresEnhancement {
                ability: first.id.clone(),
            }
            .into());
        }
        return Ok(());
    }
    if !(1..=MAX_ENHANCEMENT).contains(&enhancement_bonus) {
        return Err(EquipmentError::EnhancementOutOfRange {
            bonus: enhancement_bonus,
            max: MAX_ENHANCEMENT,
        }
        .into());
    }
    let effective = enhancement_bonus + ability_equivalent;
    if effective > MAX_EFFECTIVE_BONUS {
        return Err(EquipmentError::EffectiveBonusTooHigh {
            effective,
            max: MAX_EFFECTIVE_BONUS,
        }
        .into());
    }
    Ok(())
}

/// 價格明細的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub label: String,
    pub value: f64,
}

/// 價格與其明細
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub total: f64,
    pub entries: Vec<CostEntry>,
}

impl CostBreakdown {
    pub(crate) fn push(&mut self, label: impl Into<String>, value: f64) {
        if value == 0.0 {
            return;
        }
        self.total += value;
        self.entries.push(CostEntry {
            label: label.into(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_drop() {
        assert_eq!(ArmorCategory::Heavy.lighter(), ArmorCategory::Medium);
        assert_eq!(ArmorCategory::Medium.lighter(), ArmorCategory::Light);
        assert_eq!(ArmorCategory::Light.lighter(), ArmorCategory::Light);
        assert_eq!(ArmorCategory::Shield.lighter(), ArmorCategory::Shield);
    }

    #[test]
    fn test_validate_enhancement() {
        let flaming = vec![SpecialAbilityEntry::new("flaming")];
        assert!(validate_enhancement(0, &[], 0).is_ok());
        assert!(validate_enhancement(5, &flaming, 5).is_ok());

        let cases = vec![
            ("強化 +6", 6, vec![], 0),
            ("強化 -1", -1, vec![], 0),
            ("有效加值 +11", 5, flaming.clone(), 6),
            ("沒有強化卻有特殊能力", 0, flaming.clone(), 1),
        ];
        for (desc, enhancement, abilities, equivalent) in cases {
            let result = validate_enhancement(enhancement, &abilities, equivalent);
            assert!(result.is_err(), "{}應失敗", desc);
        }
    }

    #[test]
    fn test_entry_serde_tag() {
        let json = r#"{"type":"gear","item":{"name":"Rope","cost":1.0,"weight":10.0}}"#;
        let entry: EquipmentEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.name(), "Rope");
        assert_eq!(entry.quantity(), 1);
        assert!(!entry.is_equipped());
        assert!(entry.is_mundane());
    }
}
