//! 技能系統
//!
//! 技能總值 = 等級(ranks) + 屬性調整 + 本職技能加值 + 種族 + 其他 + 防具檢定減值

use crate::{
    abilities::{Ability, AbilityScores},
    bonus::StatBreakdown,
};
use serde::{Deserialize, Serialize};

/// 技能定義（規則表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub name: String,
    pub ability: Ability,
    /// 0 等級時不可使用
    #[serde(default)]
    pub trained_only: bool,
    /// 受防具檢定減值影響
    #[serde(default)]
    pub armor_check_penalty: bool,
}

/// 角色的技能投資
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSkill {
    pub name: String,
    pub ranks: u32,
    #[serde(default)]
    pub is_class_skill: bool,
    #[serde(default)]
    pub misc_modifier: i32,
}

impl CharacterSkill {
    pub fn new(name: impl Into<String>, ranks: u32, is_class_skill: bool) -> Self {
        Self {
            name: name.into(),
            ranks,
            is_class_skill,
            misc_modifier: 0,
        }
    }
}

/// 技能總值的外部輸入
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillContext {
    /// 本職技能加值，通常為 3
    pub class_skill_bonus: i32,
    pub racial_bonus: i32,
    /// 防具檢定減值（<= 0）
    pub armor_check_penalty: i32,
}

/// 計算技能總值明細
///
/// 需受訓技能在 0 等級時回傳 `None`。
pub fn skill_total(
    skill: &CharacterSkill,
    definition: &SkillDefinition,
    scores: &AbilityScores,
    context: SkillContext,
) -> Option<StatBreakdown> {
    if definition.trained_only && skill.ranks == 0 {
        return None;
    }

    let class_bonus = if skill.is_class_skill && skill.ranks > 0 {
        context.class_skill_bonus
    } else {
        0
    };
    let acp = if definition.armor_check_penalty {
        context.armor_check_penalty
    } else {
        0
    };

    Some(StatBreakdown::from_labeled([
        ("Ranks", skill.ranks as i32),
        (definition.ability.abbreviation(), scores.modifier(definition.ability)),
        ("Class Skill", class_bonus),
        ("Racial", context.racial_bonus),
        ("Misc", skill.misc_modifier),
        ("Armor Penalty", acp),
    ]))
}

/// 每級技能點數：max(最低值, 職業點數 + 智力調整 + 種族額外點數)
pub fn ranks_per_level(
    class_ranks: u32,
    int_modifier: i32,
    bonus_rank: bool,
    minimum: u32,
) -> u32 {
    let ranks = class_ranks as i32 + int_modifier + i32::from(bonus_rank);
    ranks.max(minimum as i32) as u32
}

/// 已分配的技能點總數
pub fn ranks_spent(skills: &[CharacterSkill]) -> u32 {
    skills.iter().map(|s| s.ranks).sum()
}
