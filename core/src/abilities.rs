//! 屬性值系統
//!
//! 實作 PF1e 的六項屬性值(力量、敏捷、體質、智力、睿智、魅力)，
//! 以及種族調整值的合併。

use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

/// 六項屬性
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
)]
pub enum Ability {
    /// 力量 - 影響近戰攻擊、傷害和負重能力
    #[serde(rename = "str", alias = "strength")]
    #[strum(serialize = "str", serialize = "strength")]
    Strength,
    /// 敏捷 - 影響 AC、反射豁免和遠程攻擊
    #[serde(rename = "dex", alias = "dexterity")]
    #[strum(serialize = "dex", serialize = "dexterity")]
    Dexterity,
    /// 體質 - 影響 HP 和強韌豁免
    #[serde(rename = "con", alias = "constitution")]
    #[strum(serialize = "con", serialize = "constitution")]
    Constitution,
    /// 智力 - 影響技能點數
    #[serde(rename = "int", alias = "intelligence")]
    #[strum(serialize = "int", serialize = "intelligence")]
    Intelligence,
    /// 睿智 - 影響意志豁免
    #[serde(rename = "wis", alias = "wisdom")]
    #[strum(serialize = "wis", serialize = "wisdom")]
    Wisdom,
    #[serde(rename = "cha", alias = "charisma")]
    #[strum(serialize = "cha", serialize = "charisma")]
    Charisma,
}

impl Ability {
    /// 明細標籤使用的縮寫（STR、DEX ...）
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Dexterity => "DEX",
            Self::Constitution => "CON",
            Self::Intelligence => "INT",
            Self::Wisdom => "WIS",
            Self::Charisma => "CHA",
        }
    }

    /// 獲取所有屬性
    pub fn all() -> [Ability; 6] {
        [
            Self::Strength,
            Self::Dexterity,
            Self::Constitution,
            Self::Intelligence,
            Self::Wisdom,
            Self::Charisma,
        ]
    }
}

/// 由屬性分數計算調整值
///
/// 調整值 = floor((分數 - 10) / 2)，負數向下取整（7 → -2）。
pub fn modifier_for(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// 角色的屬性值
///
/// 不限制範圍：種族減值可以讓分數低於 1。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::uniform(10)
    }
}

impl AbilityScores {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn uniform(score: i32) -> Self {
        Self::new(score, score, score, score, score, score)
    }

    /// 獲取特定屬性值
    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    /// 設定特定屬性值
    pub fn set(&mut self, ability: Ability, value: i32) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    /// 回傳調整過單一屬性的新值
    pub fn with_adjustment(mut self, ability: Ability, delta: i32) -> Self {
        self.set(ability, self.get(ability) + delta);
        self
    }

    /// 計算屬性調整值
    pub fn modifier(&self, ability: Ability) -> i32 {
        modifier_for(self.get(ability))
    }
}

/// 種族屬性調整
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityModifier {
    pub ability: Ability,
    pub value: i32,
}

/// 將基礎屬性與種族調整合併為最終屬性
///
/// 同一屬性的多筆調整全部相加。若種族提供彈性 +2 且玩家已選擇，
/// 只加一次。
pub fn resolve(
    base: &AbilityScores,
    racial_modifiers: &[AbilityModifier],
    flexible_choice: Option<Ability>,
) -> AbilityScores {
    let mut scores = racial_modifiers
        .iter()
        .fold(*base, |scores, m| scores.with_adjustment(m.ability, m.value));
    if let Some(ability) = flexible_choice {
        scores = scores.with_adjustment(ability, 2);
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier() {
        let scores = AbilityScores::default();
        assert_eq!(scores.modifier(Ability::Strength), 0);

        let scores = AbilityScores::new(18, 14, 11, 10, 8, 7);
        assert_eq!(scores.modifier(Ability::Strength), 4);
        assert_eq!(scores.modifier(Ability::Dexterity), 2);
        assert_eq!(scores.modifier(Ability::Constitution), 0);
        assert_eq!(scores.modifier(Ability::Intelligence), 0);
        assert_eq!(scores.modifier(Ability::Wisdom), -1);
        assert_eq!(scores.modifier(Ability::Charisma), -2); // 向下取整，不是 -1
    }

    #[test]
    fn test_modifier_floor_over_full_range() {
        for score in 1..=30 {
            let expected = ((score - 10) as f64 / 2.0).floor() as i32;
            assert_eq!(modifier_for(score), expected, "分數 {}", score);
        }
        assert_eq!(modifier_for(1), -5);
        assert_eq!(modifier_for(30), 10);
    }

    #[test]
    fn test_resolve_sums_racial_modifiers() {
        let base = AbilityScores::new(10, 14, 12, 10, 10, 10);
        let racial = vec![
            AbilityModifier { ability: Ability::Dexterity, value: 2 },
            AbilityModifier { ability: Ability::Intelligence, value: 2 },
            AbilityModifier { ability: Ability::Constitution, value: -2 },
        ];
        let result = resolve(&base, &racial, None);
        assert_eq!(result.dexterity, 16);
        assert_eq!(result.intelligence, 12);
        assert_eq!(result.constitution, 10);
        assert_eq!(result.strength, 10);
    }

    #[test]
    fn test_resolve_flexible_bonus_applied_once() {
        let base = AbilityScores::default();
        let result = resolve(&base, &[], Some(Ability::Strength));
        assert_eq!(result.strength, 12);
        assert_eq!(result.dexterity, 10);
    }

    #[test]
    fn test_resolve_allows_scores_below_one() {
        let base = AbilityScores::new(2, 10, 10, 10, 10, 10);
        let racial = vec![AbilityModifier { ability: Ability::Strength, value: -4 }];
        let result = resolve(&base, &racial, None);
        assert_eq!(result.strength, -2);
        assert_eq!(result.modifier(Ability::Strength), -6);
    }

    #[test]
    fn test_ability_parses_abbreviation() {
        assert_eq!("str".parse::<Ability>(), Ok(Ability::Strength));
        assert_eq!("wisdom".parse::<Ability>(), Ok(Ability::Wisdom));
        let parsed: Ability = serde_json::from_str("\"dex\"").unwrap();
        assert_eq!(parsed, Ability::Dexterity);
    }
}
