//! 護甲解析
//!
//! 由品質、材質與強化加值計算護甲的實際數值與價格。

use super::{
    validate_enhancement, Armor, ArmorCategory, ArmorEntry, CostBreakdown, EquipmentCatalog,
    Quality, SpecialAbilityEntry,
};
use crate::error::{EquipmentError, Result};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::warn;

/// 護甲材質
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ArmorMaterial {
    #[default]
    Standard,
    Mithral,
    Adamantine,
}

impl ArmorMaterial {
    /// 秘銀與精金護甲自動視為精製
    pub fn counts_as_masterwork(&self) -> bool {
        matches!(self, Self::Mithral | Self::Adamantine)
    }

    /// 材質附加價格（依原始護甲類別）
    pub fn surcharge(&self, category: ArmorCategory) -> f64 {
        match (self, category) {
            (Self::Mithral, ArmorCategory::Light) => 1000.0,
            (Self::Mithral, ArmorCategory::Medium) => 4000.0,
            (Self::Mithral, ArmorCategory::Heavy) => 9000.0,
            (Self::Mithral, ArmorCategory::Shield) => 1000.0,
            (Self::Adamantine, ArmorCategory::Light) => 5000.0,
            (Self::Adamantine, ArmorCategory::Medium) => 10000.0,
            (Self::Adamantine, ArmorCategory::Heavy) => 15000.0,
            _ => 0.0,
        }
    }
}

/// 護甲特殊能力可套用的對象
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmorAbilityTarget {
    Armor,
    Shield,
    #[default]
    All,
}

/// 護甲特殊能力（規則表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorSpecialAbility {
    pub id: String,
    pub name: String,
    pub equivalent_bonus: i32,
    #[serde(default)]
    pub applies_to: ArmorAbilityTarget,
}

impl ArmorSpecialAbility {
    pub fn applies_to(&self, armor: &Armor) -> bool {
        match self.applies_to {
            ArmorAbilityTarget::All => true,
            ArmorAbilityTarget::Armor => !armor.is_shield(),
            ArmorAbilityTarget::Shield => armor.is_shield(),
        }
    }
}

/// 解析後的護甲數值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorStats {
    pub ac_bonus: i32,
    pub max_dex: Option<i32>,
    pub armor_check_penalty: i32,
    pub arcane_spell_failure: i32,
    pub weight: f64,
    /// 秘銀降級後的有效類別
    pub category: ArmorCategory,
}

/// 解析護甲數值
///
/// 強化加值只影響 AC，不改變敏捷上限、檢定減值或秘法失敗率。
pub fn resolve(
    armor: &Armor,
    quality: Quality,
    material: ArmorMaterial,
    enhancement_bonus: i32,
) -> ArmorStats {
    let acp_reduction = if material == ArmorMaterial::Mithral {
        3
    } else if quality == Quality::Masterwork
        || material.counts_as_masterwork()
        || enhancement_bonus >= 1
    {
        1
    } else {
        0
    };

    let mut stats = ArmorStats {
        ac_bonus: armor.ac_bonus + enhancement_bonus.max(0),
        max_dex: armor.max_dex,
        armor_check_penalty: (armor.armor_check_penalty + acp_reduction).min(0),
        arcane_spell_failure: armor.arcane_spell_failure,
        weight: armor.weight,
        category: armor.category,
    };

    if material == ArmorMaterial::Mithral {
        stats.max_dex = stats.max_dex.map(|d| d + 2);
        stats.weight = (armor.weight / 2.0).floor();
        stats.arcane_spell_failure = (armor.arcane_spell_failure - 10).max(0);
        stats.category = armor.category.lighter();
    }

    stats
}

/// 計算護甲價格明細
pub fn cost(
    armor: &Armor,
    quality: Quality,
    material: ArmorMaterial,
    enhancement_bonus: i32,
    ability_equivalent: i32,
) -> CostBreakdown {
    let mut breakdown = CostBreakdown::default();
    breakdown.push(format!("Base {}", armor.name), armor.cost);

    let enhanced = enhancement_bonus >= 1;
    if quality == Quality::Masterwork || material.counts_as_masterwork() || enhanced {
        breakdown.push("Masterwork", 150.0);
    }
    breakdown.push(format!("{} material", material), material.surcharge(armor.category));

    if enhanced {
        let effective = enhancement_bonus + ability_equivalent;
        breakdown.push(
            format!("+{} effective enhancement", effective),
            (effective * effective) as f64 * 1000.0,
        );
    }
    breakdown
}

impl ArmorEntry {
    /// 未強化的普通護甲
    pub fn new(item: Armor) -> Self {
        Self {
            item,
            quantity: 1,
            equipped: false,
            quality: Quality::Standard,
            material: ArmorMaterial::Standard,
            enhancement_bonus: 0,
            special_abilities: Vec::new(),
        }
    }

    /// 建立設定過的護甲，不合法的組合會被拒絕
    pub fn configure(
        item: Armor,
        quality: Quality,
        material: ArmorMaterial,
        enhancement_bonus: i32,
        special_abilities: Vec<SpecialAbilityEntry>,
        catalog: &EquipmentCatalog,
    ) -> Result<Self> {
        let entry = Self {
            item,
            quantity: 1,
            equipped: false,
            quality,
            material,
            enhancement_bonus,
            special_abilities,
        };
        entry.validate(catalog)?;
        Ok(entry)
    }

    /// 特殊能力的等效加值總和
    pub fn ability_equivalent(&self, catalog: &EquipmentCatalog) -> Result<i32> {
        let mut total = 0;
        for selected in &self.special_abilities {
            let ability = catalog.armor_ability(&selected.id).ok_or_else(|| {
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
            total += ability.equivalent_bonus;
        }
        Ok(total)
    }

    pub fn validate(&self, catalog: &EquipmentCatalog) -> Result<()> {
        let result = self.ability_equivalent(catalog).and_then(|equivalent| {
            validate_enhancement(self.enhancement_bonus, &self.special_abilities, equivalent)
        });
        if let Err(e) = &result {
            warn!(item = %self.item.name, error = %e, "拒絕護甲設定");
        }
        result
    }

    pub fn stats(&self) -> ArmorStats {
        resolve(&self.item, self.quality, self.material, self.enhancement_bonus)
    }

    pub fn cost(&self, catalog: &EquipmentCatalog) -> Result<CostBreakdown> {
        let equivalent = self.ability_equivalent(catalog)?;
        Ok(cost(
            &self.item,
            self.quality,
            self.material,
            self.enhancement_bonus,
            equivalent,
        ))
    }
}
