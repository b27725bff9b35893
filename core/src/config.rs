//! 規則集設定
//!
//! 與職業無關的進程常數，可從 TOML 載入。

use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};

/// 一般專長的取得時機
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatSchedule {
    /// 1、3、5、7…
    #[default]
    OddLevels,
    /// 1、3、6、9…
    EveryThirdLevel,
}

impl FeatSchedule {
    pub fn grants_feat_at(&self, level: u32) -> bool {
        match self {
            Self::OddLevels => level % 2 == 1,
            Self::EveryThirdLevel => level == 1 || level % 3 == 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesetConfig {
    pub feat_schedule: FeatSchedule,
    /// 每幾級提升一次屬性
    pub ability_increase_interval: u32,
    /// 本職技能有等級時的加值
    pub class_skill_bonus: i32,
    /// 每級最少技能點
    pub min_skill_ranks: u32,
}

impl Default for RulesetConfig {
    fn default() -> Self {
        Self {
            feat_schedule: FeatSchedule::OddLevels,
            ability_increase_interval: 4,
            class_skill_bonus: 3,
            min_skill_ranks: 1,
        }
    }
}

impl RulesetConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(
            toml::from_str(content).map_err(|e| LoadError::DeserializeError {
                format: "ruleset.toml".to_string(),
                reason: e.to_string(),
            })?,
        )
    }

    pub fn grants_ability_increase_at(&self, level: u32) -> bool {
        self.ability_increase_interval > 0 && level % self.ability_increase_interval == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_feat_schedule() {
        let odd: Vec<u32> = (1..=9)
            .filter(|&l| FeatSchedule::OddLevels.grants_feat_at(l))
            .collect();
        assert_eq!(odd, vec![1, 3, 5, 7, 9]);
        let third: Vec<u32> = (1..=9)
            .filter(|&l| FeatSchedule::EveryThirdLevel.grants_feat_at(l))
            .collect();
        assert_eq!(third, vec![1, 3, 6, 9]);
    }

    #[test]
    fn test_from_toml() {
        let config = RulesetConfig::from_toml(
            r#"
feat_schedule = "every_third_level"
class_skill_bonus = 2
"#,
        )
        .unwrap();
        assert_eq!(config.feat_schedule, FeatSchedule::EveryThirdLevel);
        assert_eq!(config.class_skill_bonus, 2);
        assert_eq!(config.ability_increase_interval, 4);

        let config = RulesetConfig::from_toml("").unwrap();
        assert_eq!(config, RulesetConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let result = RulesetConfig::from_toml("feat_schedule = \"sometimes\"");
        assert!(result.is_err(), "未知的專長時程應失敗");
        let err = result.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Load(_)));
    }

    #[test]
    fn test_ability_increase() {
        let config = RulesetConfig::default();
        assert!(config.grants_ability_increase_at(4));
        assert!(config.grants_ability_increase_at(8));
        assert!(!config.grants_ability_increase_at(6));
    }
}
