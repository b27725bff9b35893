//! 戰鬥數值
//!
//! 由屬性調整值、職業成長與已解析的裝備加值，計算 AC 三種變體、
//! 豁免、BAB、CMB 與 CMD。每個數值都附帶 [`StatBreakdown`] 明細。

use crate::{
    abilities::{Ability, AbilityScores},
    bonus::{aggregate, BonusEntry, BonusType, StatBreakdown},
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// 基本攻擊加值成長
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BabProgression {
    Full,
    ThreeQuarter,
    Half,
}

impl BabProgression {
    pub fn bab_at(&self, level: u32) -> i32 {
        let level = level as i32;
        match self {
            Self::Full => level,
            Self::ThreeQuarter => level * 3 / 4,
            Self::Half => level / 2,
        }
    }
}

/// 豁免成長
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveProgression {
    Good,
    #[default]
    Poor,
}

impl SaveProgression {
    pub fn base_at(&self, level: u32) -> i32 {
        let level = level as i32;
        match self {
            Self::Good => 2 + level / 2,
            Self::Poor => level / 3,
        }
    }
}

/// 三種豁免
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum Save {
    Fortitude,
    Reflex,
    Will,
}

impl Save {
    /// 豁免使用的屬性
    pub fn ability(&self) -> Ability {
        match self {
            Self::Fortitude => Ability::Constitution,
            Self::Reflex => Ability::Dexterity,
            Self::Will => Ability::Wisdom,
        }
    }
}

/// 各豁免的成長旗標
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveFlags {
    pub fortitude: SaveProgression,
    pub reflex: SaveProgression,
    pub will: SaveProgression,
}

impl SaveFlags {
    pub fn get(&self, save: Save) -> SaveProgression {
        match save {
            Save::Fortitude => self.fortitude,
            Save::Reflex => self.reflex,
            Save::Will => self.will,
        }
    }
}

/// 戰鬥數值計算的全部輸入
///
/// 每個跨元件的數值都是明確參數（例如防具的敏捷上限）。
#[derive(Debug, Clone, Default)]
pub struct CombatInputs {
    pub ability_scores: AbilityScores,
    pub level: u32,
    pub bab_progression: Option<BabProgression>,
    pub save_flags: SaveFlags,
    pub armor_bonus: i32,
    pub shield_bonus: i32,
    pub natural_armor: i32,
    pub deflection: i32,
    /// AC 的體型調整（小型 +1、大型 -1）
    pub size_modifier: i32,
    /// `None` 表示沒有敏捷上限
    pub max_dex_cap: Option<i32>,
    pub dodge: i32,
    pub misc: i32,
    pub insight: i32,
    pub resistance: i32,
    /// 額外的具型別 AC 加值（奇物），與上面的數值一起堆疊
    pub extra_ac: Vec<BonusEntry>,
    /// 額外的具型別豁免加值
    pub extra_saves: Vec<BonusEntry>,
}

/// 戰鬥數值結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub ac: StatBreakdown,
    pub touch_ac: StatBreakdown,
    pub flat_footed_ac: StatBreakdown,
    pub bab: i32,
    pub cmb: StatBreakdown,
    pub cmd: StatBreakdown,
    pub fortitude: StatBreakdown,
    pub reflex: StatBreakdown,
    pub will: StatBreakdown,
    pub initiative: StatBreakdown,
}

impl CombatStats {
    pub fn save(&self, save: Save) -> &StatBreakdown {
        match save {
            Save::Fortitude => &self.fortitude,
            Save::Reflex => &self.reflex,
            Save::Will => &self.will,
        }
    }
}

const DEX_LABEL: &str = "DEX";

/// 計算全部戰鬥數值
pub fn compute(inputs: &CombatInputs) -> CombatStats {
    let scores = &inputs.ability_scores;
    let str_mod = scores.modifier(Ability::Strength);
    let dex_mod = scores.modifier(Ability::Dexterity);
    let effective_dex = match inputs.max_dex_cap {
        Some(cap) => dex_mod.min(cap),
        None => dex_mod,
    };

    let bab = inputs
        .bab_progression
        .map(|p| p.bab_at(inputs.level))
        .unwrap_or(0);

    let mut ac_entries = vec![
        BonusEntry::untyped("Base", 10),
        BonusEntry::new("Armor", inputs.armor_bonus, BonusType::Armor),
        BonusEntry::new("Shield", inputs.shield_bonus, BonusType::Shield),
        BonusEntry::untyped(DEX_LABEL, effective_dex),
        BonusEntry::new("Size", inputs.size_modifier, BonusType::Size),
        BonusEntry::new("Natural Armor", inputs.natural_armor, BonusType::NaturalArmor),
        BonusEntry::new("Deflection", inputs.deflection, BonusType::Deflection),
        BonusEntry::new("Dodge", inputs.dodge, BonusType::Dodge),
        BonusEntry::untyped("Misc", inputs.misc),
        BonusEntry::new("Insight", inputs.insight, BonusType::Insight),
    ];
    ac_entries.extend(inputs.extra_ac.iter().cloned());

    let touch_entries: Vec<BonusEntry> = ac_entries
        .iter()
        .filter(|e| {
            !matches!(
                e.bonus_type,
                BonusType::Armor | BonusType::Shield | BonusType::NaturalArmor
            )
        })
        .cloned()
        .collect();
    let flat_footed_entries: Vec<BonusEntry> = ac_entries
        .iter()
        .filter(|e| e.label != DEX_LABEL && e.bonus_type != BonusType::Dodge)
        .cloned()
        .collect();

    let save_breakdown = |save: Save| {
        let ability = save.ability();
        let mut entries = vec![
            BonusEntry::untyped("Base", inputs.save_flags.get(save).base_at(inputs.level)),
            BonusEntry::untyped(ability.abbreviation(), scores.modifier(ability)),
            BonusEntry::new("Resistance", inputs.resistance, BonusType::Resistance),
        ];
        entries.extend(inputs.extra_saves.iter().cloned());
        aggregate(&entries)
    };

    CombatStats {
        ac: aggregate(&ac_entries),
        touch_ac: aggregate(&touch_entries),
        flat_footed_ac: aggregate(&flat_footed_entries),
        bab,
        // CMB/CMD 的體型符號與 AC 相反
        cmb: StatBreakdown::from_labeled([
            ("BAB", bab),
            ("STR", str_mod),
            ("Size", -inputs.size_modifier),
        ]),
        cmd: StatBreakdown::from_labeled([
            ("Base", 10),
            ("BAB", bab),
            ("STR", str_mod),
            ("DEX", dex_mod),
            ("Size", -inputs.size_modifier),
        ]),
        fortitude: save_breakdown(Save::Fortitude),
        reflex: save_breakdown(Save::Reflex),
        will: save_breakdown(Save::Will),
        initiative: initiative(scores, 0),
    }
}

/// 先攻：敏捷調整 + 其他
pub fn initiative(scores: &AbilityScores, misc: i32) -> StatBreakdown {
    StatBreakdown::from_labeled([
        ("DEX", scores.modifier(Ability::Dexterity)),
        ("Misc", misc),
    ])
}

/// 以 BAB 產生多重攻擊序列：每次 -5，直到低於 +1
pub fn iterative_attacks(bab: i32) -> Vec<i32> {
    let mut attacks = vec![bab];
    let mut current = bab - 5;
    while current >= 1 {
        attacks.push(current);
        current -= 5;
    }
    attacks
}

/// 顯示用格式，例如 "+11/+6/+1"
pub fn format_attacks(bonuses: &[i32]) -> String {
    bonuses
        .iter()
        .map(|b| format!("{:+}", b))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bab_progression() {
        assert_eq!(BabProgression::Full.bab_at(7), 7);
        assert_eq!(BabProgression::ThreeQuarter.bab_at(7), 5);
        assert_eq!(BabProgression::Half.bab_at(7), 3);
        assert_eq!(BabProgression::ThreeQuarter.bab_at(1), 0);
    }

    #[test]
    fn test_save_progression() {
        assert_eq!(SaveProgression::Good.base_at(1), 2);
        assert_eq!(SaveProgression::Good.base_at(4), 4);
        assert_eq!(SaveProgression::Poor.base_at(1), 0);
        assert_eq!(SaveProgression::Poor.base_at(6), 2);
    }

    #[test]
    fn test_ac_variants() {
        let inputs = CombatInputs {
            ability_scores: AbilityScores::new(10, 16, 10, 10, 10, 10),
            level: 1,
            bab_progression: Some(BabProgression::Full),
            armor_bonus: 4,
            shield_bonus: 1,
            natural_armor: 2,
            deflection: 1,
            dodge: 1,
            max_dex_cap: Some(2),
            ..Default::default()
        };
        let stats = compute(&inputs);
        // 10 + 4 + 1 + 2(上限) + 2 + 1 + 1
        assert_eq!(stats.ac.total, 21);
        // 10 + 2 + 1 + 1
        assert_eq!(stats.touch_ac.total, 14);
        // 10 + 4 + 1 + 2 + 1
        assert_eq!(stats.flat_footed_ac.total, 18);
    }

    #[test]
    fn test_deflection_sources_do_not_stack() {
        let inputs = CombatInputs {
            deflection: 1,
            extra_ac: vec![BonusEntry::new("Ring of Protection +2", 2, BonusType::Deflection)],
            ..Default::default()
        };
        let stats = compute(&inputs);
        assert_eq!(stats.ac.total, 12);
        assert_eq!(stats.touch_ac.total, 12);
    }

    #[test]
    fn test_cmb_cmd_invert_size() {
        let inputs = CombatInputs {
            ability_scores: AbilityScores::new(16, 12, 10, 10, 10, 10),
            level: 4,
            bab_progression: Some(BabProgression::Full),
            size_modifier: 1, // 小型
            ..Default::default()
        };
        let stats = compute(&inputs);
        assert_eq!(stats.bab, 4);
        assert_eq!(stats.cmb.total, 4 + 3 - 1);
        assert_eq!(stats.cmd.total, 10 + 4 + 3 + 1 - 1);
        assert_eq!(stats.ac.total, 10 + 1 + 1);
    }

    #[test]
    fn test_saves() {
        let inputs = CombatInputs {
            ability_scores: AbilityScores::new(10, 14, 12, 10, 8, 10),
            level: 5,
            save_flags: SaveFlags {
                fortitude: SaveProgression::Good,
                reflex: SaveProgression::Poor,
                will: SaveProgression::Poor,
            },
            resistance: 1,
            ..Default::default()
        };
        let stats = compute(&inputs);
        assert_eq!(stats.fortitude.total, 4 + 1 + 1);
        assert_eq!(stats.reflex.total, 1 + 2 + 1);
        assert_eq!(stats.will.total, 1 - 1 + 1);
        assert_eq!(stats.will.value_of("WIS"), Some(-1));
    }

    #[test]
    fn test_iterative_attacks() {
        let cases = vec![
            ("BAB +11", 11, vec![11, 6, 1]),
            ("BAB +4", 4, vec![4]),
            ("BAB +6", 6, vec![6, 1]),
            ("BAB +20", 20, vec![20, 15, 10, 5]),
            ("BAB +0", 0, vec![0]),
        ];
        for (desc, bab, expected) in cases {
            assert_eq!(iterative_attacks(bab), expected, "{}", desc);
        }
        assert_eq!(format_attacks(&[11, 6, 1]), "+11/+6/+1");
    }
}
