//! 武器解析
//!
//! 武器的材質、精製與強化都以資料表描述；這裡把它們解析成攻擊、
//! 傷害的靜態調整值以及價格明細。特殊能力的戰鬥效果由 `attack` 模組處理。

use super::{
    validate_enhancement, CostBreakdown, EquipmentCatalog, Quality, SpecialAbilityEntry, Weapon,
    WeaponEntry,
};
use crate::{
    dice::DiceRoll,
    error::{EquipmentError, Result},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const STANDARD_MATERIAL: &str = "standard";

/// 材質價格的計算方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialCost {
    #[default]
    None,
    /// 再加一次基礎價格（寒鐵）
    BaseCost,
    /// 固定附加價格
    Flat { amount: f64 },
    /// 每磅重量的附加價格（秘銀）
    PerPound { amount: f64 },
}

impl MaterialCost {
    pub fn surcharge(&self, base_cost: f64, weight: f64) -> f64 {
        match *self {
            Self::None => 0.0,
            Self::BaseCost => base_cost,
            Self::Flat { amount } => amount,
            Self::PerPound { amount } => weight * amount,
        }
    }
}

/// 武器材質（規則表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponMaterialDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cost: MaterialCost,
    /// 附魔時的額外價格
    #[serde(default)]
    pub enchantment_cost_extra: f64,
    #[serde(default = "unit_multiplier")]
    pub weight_multiplier: f64,
    /// 傷害骰調整（鍊金銀 -1）
    #[serde(default)]
    pub damage_modifier: i32,
    #[serde(default)]
    pub counts_as_masterwork: bool,
}

fn unit_multiplier() -> f64 {
    1.0
}

impl WeaponMaterialDef {
    pub fn standard() -> Self {
        Self {
            id: STANDARD_MATERIAL.to_string(),
            name: "Standard".to_string(),
            cost: MaterialCost::None,
            enchantment_cost_extra: 0.0,
            weight_multiplier: 1.0,
            damage_modifier: 0,
            counts_as_masterwork: false,
        }
    }
}

/// 武器特殊能力可套用的對象
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponAbilityTarget {
    Melee,
    Ranged,
    #[default]
    All,
}

/// 武器特殊能力（規則表）
///
/// 能力效果完全由欄位描述，攻擊解析不依賴特定 id。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponSpecialAbility {
    pub id: String,
    pub name: String,
    pub equivalent_bonus: i32,
    #[serde(default)]
    pub applies_to: WeaponAbilityTarget,
    #[serde(default)]
    pub extra_damage_dice: Option<DiceRoll>,
    #[serde(default)]
    pub extra_damage_type: Option<String>,
    /// 重擊威脅數加倍
    #[serde(default)]
    pub double_crit_range: bool,
    /// 需要指定目標類型（克星）
    #[serde(default)]
    pub requires_target: bool,
    /// 全攻擊時多一次最高加值的攻擊
    #[serde(default)]
    pub grants_extra_attack: bool,
    /// 只有在呼叫端開啟時才生效
    #[serde(default)]
    pub is_toggle: bool,
    /// 開啟時把強化加值從攻擊/傷害轉到 AC（防禦）
    #[serde(default)]
    pub transfers_enhancement_to_ac: bool,
    /// 生效時額外的攻擊與傷害加值（克星 +2）
    #[serde(default)]
    pub conditional_enhancement: i32,
}

impl WeaponSpecialAbility {
    pub fn applies_to(&self, weapon: &Weapon) -> bool {
        match self.applies_to {
            WeaponAbilityTarget::All => true,
            WeaponAbilityTarget::Melee => !weapon.is_ranged(),
            WeaponAbilityTarget::Ranged => weapon.is_ranged(),
        }
    }
}

/// 材質與強化解析出的靜態調整值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponModifiers {
    /// 精製 +1，只在沒有強化加值時生效
    pub masterwork_attack: i32,
    pub enhancement: i32,
    pub material_name: String,
    pub material_damage: i32,
    pub strength_rating: Option<i32>,
    pub effective_bonus: i32,
    pub weight: f64,
}

/// 計算武器價格明細
pub fn cost(
    weapon: &Weapon,
    quality: Quality,
    material: &WeaponMaterialDef,
    enhancement_bonus: i32,
    ability_equivalent: i32,
    strength_rating: Option<i32>,
) -> CostBreakdown {
    let mut breakdown = CostBreakdown::default();
    breakdown.push("Base weapon", weapon.cost);
    breakdown.push(
        format!("{} material", material.name),
        material.cost.surcharge(weapon.cost, weapon.weight),
    );

    if enhancement_bonus > 0 {
        let effective = enhancement_bonus + ability_equivalent;
        breakdown.push("Masterwork", 300.0);
        breakdown.push(
            format!("+{} effective enchantment", effective),
            (effective * effective) as f64 * 2000.0,
        );
        breakdown.push(
            format!("{} enchantment surcharge", material.name),
            material.enchantment_cost_extra,
        );
    } else if quality == Quality::Masterwork {
        breakdown.push("Masterwork", 300.0);
    }

    if let Some(rating) = strength_rating {
        breakdown.push(format!("Strength rating +{}", rating), 75.0 * rating as f64);
    }
    breakdown
}

impl WeaponEntry {
    /// 未強化的普通武器
    pub fn new(item: Weapon) -> Self {
        Self {
            item,
            quantity: 1,
            equipped: false,
            quality: Quality::Standard,
            material: STANDARD_MATERIAL.to_string(),
            enhancement_bonus: 0,
            special_abilities: Vec::new(),
            strength_rating: None,
        }
    }

    /// 建立設定過的武器，不合法的組合會被拒絕
    pub fn configure(
        item: Weapon,
        quality: Quality,
        material: impl Into<String>,
        enhancement_bonus: i32,
        special_abilities: Vec<SpecialAbilityEntry>,
        strength_rating: Option<i32>,
        catalog: &EquipmentCatalog,
    ) -> Result<Self> {
        let entry = Self {
            item,
            quantity: 1,
            equipped: false,
            quality,
            material: material.into(),
            enhancement_bonus,
            special_abilities,
            strength_rating,
        };
        entry.validate(catalog)?;
        Ok(entry)
    }

    pub fn material_def(&self, catalog: &EquipmentCatalog) -> Result<WeaponMaterialDef> {
        catalog.weapon_material(&self.material).ok_or_else(|| {
            EquipmentError::UnknownMaterial {
                material: self.material.clone(),
            }
            .into()
        })
    }

    /// 已選特殊能力的規則表記錄與其目標
    pub fn abilities<'a>(
        &'a self,
        catalog: &'a EquipmentCatalog,
    ) -> Result<Vec<(&'a WeaponSpecialAbility, Option<&'a str>)>> {
        self.special_abilities
            .iter()
            .map(|selected| -> Result<(&'a WeaponSpecialAbility, Option<&'a str>)> {
                let ability = catalog.weapon_ability(&selected.id).ok_or_else(|| {
                    EquipmentError::UnknownAbility {
                        ability: selected.id.clone(),
                    }
                })?;
                if !ability.applies_to(&self.item) {
                    return Err(EquipmentError::AbilityNotApplicable {
                        ability: ability.name.clone(),
                        item: self.item.name.clone(),
                    }
                    .into());
                }
                Ok((ability, selected.target.as_deref()))
            })
            .collect()
    }

    pub fn ability_equivalent(&self, catalog: &EquipmentCatalog) -> Result<i32> {
        Ok(self
            .abilities(catalog)?
            .iter()
            .map(|(ability, _)| ability.equivalent_bonus)
            .sum())
    }

    pub fn validate(&self, catalog: &EquipmentCatalog) -> Result<()> {
        let result = self.check(catalog);
        if let Err(e) = &result {
            warn!(item = %self.item.name, error = %e, "拒絕武器設定");
        }
        result
    }

    fn check(&self, catalog: &EquipmentCatalog) -> Result<()> {
        if self.strength_rating.is_some() && !self.item.composite {
            return Err(EquipmentError::StrengthRatingOnNonComposite {
                item: self.item.name.clone(),
            }
            .into());
        }
        self.material_def(catalog)?;
        let equivalent = self.ability_equivalent(catalog)?;
        validate_enhancement(self.enhancement_bonus, &self.special_abilities, equivalent)
    }

    /// 解析靜態調整值
    pub fn modifiers(&self, catalog: &EquipmentCatalog) -> Result<WeaponModifiers> {
        let material = self.material_def(catalog)?;
        let equivalent = self.ability_equivalent(catalog)?;
        let masterwork = self.quality == Quality::Masterwork || material.counts_as_masterwork;
        let masterwork_attack = if masterwork && self.enhancement_bonus == 0 {
            1
        } else {
            0
        };
        Ok(WeaponModifiers {
            masterwork_attack,
            enhancement: self.enhancement_bonus,
            material_name: material.name.clone(),
            material_damage: material.damage_modifier,
            strength_rating: self.strength_rating,
            effective_bonus: self.enhancement_bonus + equivalent,
            weight: self.item.weight * material.weight_multiplier,
        })
    }

    pub fn cost(&self, catalog: &EquipmentCatalog) -> Result<CostBreakdown> {
        let material = self.material_def(catalog)?;
        let equivalent = self.ability_equivalent(catalog)?;
        Ok(cost(
            &self.item,
            self.quality,
            &material,
            self.enhancement_bonus,
            equivalent,
            self.strength_rating,
        ))
    }
}
