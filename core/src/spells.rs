//! 法術系統
//!
//! 依職業的每日法術表與施法屬性計算可用與已用的法術位，
//! 包含高屬性帶來的額外法術位。缺少表列時視為該等級無法施法，不回傳錯誤。

use crate::abilities::{modifier_for, Ability, AbilityScores};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;

/// 法術環級（0 = 戲法）
pub type SpellLevel = u8;

/// 最高法術環級
pub const MAX_SPELL_LEVEL: SpellLevel = 9;

/// 施法類型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum CasterKind {
    Prepared,
    Spontaneous,
    #[default]
    None,
}

/// 每日法術表的一列（職業等級 → 各環基本法術位）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellsPerDayRow {
    pub level: u32,
    /// `slots[i]` 為第 `first_spell_level + i` 環的基本法術位
    #[serde(default)]
    pub first_spell_level: SpellLevel,
    pub slots: Vec<u32>,
}

impl SpellsPerDayRow {
    pub fn iter(&self) -> impl Iterator<Item = (SpellLevel, u32)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, &base)| (self.first_spell_level + i as SpellLevel, base))
            .filter(|(spell_level, _)| *spell_level <= MAX_SPELL_LEVEL)
    }

    pub fn highest_spell_level(&self) -> Option<SpellLevel> {
        self.iter().map(|(spell_level, _)| spell_level).max()
    }
}

/// 職業的施法進程
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellProgression {
    #[serde(default)]
    pub kind: CasterKind,
    #[serde(default)]
    pub casting_ability: Option<Ability>,
    #[serde(default)]
    pub spells_per_day: Vec<SpellsPerDayRow>,
}

impl SpellProgression {
    pub fn row(&self, level: u32) -> Option<&SpellsPerDayRow> {
        self.spells_per_day.iter().find(|row| row.level == level)
    }

    /// 此等級是否能施法
    pub fn can_cast_at(&self, level: u32) -> bool {
        self.casting_ability.is_some() && self.row(level).is_some()
    }

    /// 施法者等級；不能施法時為 0
    pub fn caster_level(&self, level: u32) -> u32 {
        if self.can_cast_at(level) {
            level
        } else {
            0
        }
    }

    /// 從 `level` 升到 `level + 1` 時是否解鎖新的法術環級
    pub fn unlocks_spell_level(&self, level: u32) -> bool {
        let Some(next) = self.row(level + 1).and_then(|r| r.highest_spell_level()) else {
            return false;
        };
        match self.row(level).and_then(|r| r.highest_spell_level()) {
            Some(previous) => next > previous,
            None => true,
        }
    }
}

/// 單一環級的法術位
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub base: u32,
    pub bonus: u32,
    pub total: u32,
    pub used: u32,
}

impl SlotInfo {
    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.used)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellState {
    pub can_cast: bool,
    pub kind: CasterKind,
    pub casting_ability: Option<Ability>,
    pub caster_level: u32,
    pub slots: BTreeMap<SpellLevel, SlotInfo>,
}

impl SpellState {
    /// 僅供顯示的額外法術位
    pub fn bonus_slots(&self) -> BTreeMap<SpellLevel, u32> {
        self.slots
            .iter()
            .map(|(&spell_level, info)| (spell_level, info.bonus))
            .collect()
    }

    pub fn highest_spell_level(&self) -> Option<SpellLevel> {
        self.slots.keys().copied().max()
    }
}

/// 高屬性的額外法術位；戲法沒有額外法術位
pub fn bonus_slots(casting_score: i32, spell_level: SpellLevel) -> u32 {
    if spell_level == 0 {
        return 0;
    }
    let modifier = modifier_for(casting_score);
    let spell_level = i32::from(spell_level);
    if modifier < spell_level {
        return 0;
    }
    ((modifier - spell_level) / 4 + 1) as u32
}

/// 施放某環法術所需的最低施法屬性
pub fn minimum_casting_score(spell_level: SpellLevel) -> i32 {
    10 + i32::from(spell_level)
}

/// 屬性值允許施放的最高環級
pub fn highest_castable_level(casting_score: i32) -> Option<SpellLevel> {
    (0..=MAX_SPELL_LEVEL)
        .rev()
        .find(|&spell_level| casting_score >= minimum_casting_score(spell_level))
}

/// 計算法術狀態
pub fn compute(
    progression: &SpellProgression,
    level: u32,
    scores: &AbilityScores,
    slots_used: &BTreeMap<SpellLevel, u32>,
) -> SpellState {
    let (Some(ability), Some(row)) = (progression.casting_ability, progression.row(level)) else {
        return SpellState {
            kind: progression.kind,
            ..Default::default()
        };
    };

    let casting_score = scores.get(ability);
    let slots = row
        .iter()
        .map(|(spell_level, base)| {
            let bonus = bonus_slots(casting_score, spell_level);
            let info = SlotInfo {
                base,
                bonus,
                total: base + bonus,
                used: slots_used.get(&spell_level).copied().unwrap_or(0),
            };
            (spell_level, info)
        })
        .collect();

    SpellState {
        can_cast: true,
        kind: progression.kind,
        casting_ability: Some(ability),
        caster_level: level,
        slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wizard() -> SpellProgression {
        SpellProgression {
            kind: CasterKind::Prepared,
            casting_ability: Some(Ability::Intelligence),
            spells_per_day: vec![
                SpellsPerDayRow {
                    level: 1,
                    first_spell_level: 0,
                    slots: vec![3, 1],
                },
                SpellsPerDayRow {
                    level: 2,
                    first_spell_level: 0,
                    slots: vec![4, 2],
                },
                SpellsPerDayRow {
                    level: 3,
                    first_spell_level: 0,
                    slots: vec![4, 2, 1],
                },
            ],
        }
    }

    #[test]
    fn test_bonus_slots() {
        let cases = vec![
            ("戲法沒有額外法術位", 30, 0, 0),
            ("屬性 18 一環", 18, 1, 1),
            ("屬性 18 四環", 18, 4, 1),
            ("屬性 18 五環", 18, 5, 0),
            ("屬性 20 四環", 20, 4, 1),
            ("屬性 20 一環", 20, 1, 2),
            ("屬性 10 一環", 10, 1, 0),
            ("屬性 26 一環", 26, 1, 2),
            ("屬性 28 一環", 28, 1, 3),
        ];
        for (desc, score, spell_level, expected) in cases {
            assert_eq!(bonus_slots(score, spell_level), expected, "{}", desc);
        }
    }

    #[test]
    fn test_compute_slots() {
        let scores = AbilityScores::default().with_adjustment(Ability::Intelligence, 8);
        let used = BTreeMap::from([(1, 1)]);
        let state = compute(&wizard(), 1, &scores, &used);
        assert!(state.can_cast);
        assert_eq!(state.caster_level, 1);
        assert_eq!(
            state.slots[&0],
            SlotInfo {
                base: 3,
                bonus: 0,
                total: 3,
                used: 0
            }
        );
        assert_eq!(state.slots[&1].total, 2);
        assert_eq!(state.slots[&1].remaining(), 1);
        assert_eq!(state.bonus_slots()[&1], 1);
    }

    #[test]
    fn test_missing_row_cannot_cast() {
        let scores = AbilityScores::default();
        let state = compute(&wizard(), 7, &scores, &BTreeMap::new());
        assert!(!state.can_cast);
        assert!(state.slots.is_empty());

        let state = compute(&SpellProgression::default(), 1, &scores, &BTreeMap::new());
        assert!(!state.can_cast);
        assert_eq!(state.kind, CasterKind::None);
    }

    #[test]
    fn test_first_spell_level_offset() {
        let paladin = SpellProgression {
            kind: CasterKind::Prepared,
            casting_ability: Some(Ability::Charisma),
            spells_per_day: vec![SpellsPerDayRow {
                level: 4,
                first_spell_level: 1,
                slots: vec![0],
            }],
        };
        let scores = AbilityScores::default().with_adjustment(Ability::Charisma, 4);
        let state = compute(&paladin, 4, &scores, &BTreeMap::new());
        assert!(!state.slots.contains_key(&0));
        assert_eq!(state.slots[&1].base, 0);
        assert_eq!(state.slots[&1].total, 1);
    }

    #[test]
    fn test_casting_helpers() {
        assert_eq!(minimum_casting_score(3), 13);
        assert_eq!(highest_castable_level(13), Some(3));
        assert_eq!(highest_castable_level(25), Some(9));
        assert_eq!(highest_castable_level(9), None);
    }

    #[test]
    fn test_unlocks_spell_level() {
        let wizard = wizard();
        assert!(!wizard.unlocks_spell_level(1));
        assert!(wizard.unlocks_spell_level(2));
        assert!(!wizard.unlocks_spell_level(3));
        assert!(wizard.unlocks_spell_level(0));
    }
}
