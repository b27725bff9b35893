//! 專長先決條件
//!
//! 每一項先決條件獨立對照角色快照評估；全部成立才可選取專長。
//! 評估不修改任何狀態，可以對尚未選取的專長預先檢查。

use crate::abilities::{Ability, AbilityScores};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 單一先決條件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Prerequisite {
    Ability { ability: Ability, minimum: i32 },
    Bab { minimum: i32 },
    Feat { name: String },
    Skill { name: String, ranks: u32 },
    ClassFeature { name: String },
    CasterLevel { minimum: u32 },
    Class {
        name: String,
        #[serde(default)]
        level: Option<u32>,
    },
    Proficiency { name: String },
    Level { minimum: u32 },
    SpellLevel { minimum: u8 },
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ability { ability, minimum } => {
                write!(f, "{} {}", ability.abbreviation(), minimum)
            }
            Self::Bab { minimum } => write!(f, "BAB +{}", minimum),
            Self::Feat { name } => write!(f, "{}", name),
            Self::Skill { name, ranks } => write!(f, "{} {} ranks", name, ranks),
            Self::ClassFeature { name } => write!(f, "{}", name),
            Self::CasterLevel { minimum } => write!(f, "Caster level {}", minimum),
            Self::Class { name, level: None } => write!(f, "{}", name),
            Self::Class {
                name,
                level: Some(level),
            } => write!(f, "{} level {}", name, level),
            Self::Proficiency { name } => write!(f, "Proficiency with {}", name),
            Self::Level { minimum } => write!(f, "Character level {}", minimum),
            Self::SpellLevel { minimum } => {
                write!(f, "Ability to cast {}-level spells", minimum)
            }
        }
    }
}

/// 專長定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feat {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 例如 "combat"
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

/// 評估用的角色快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrerequisiteContext {
    pub ability_scores: AbilityScores,
    pub level: u32,
    pub bab: i32,
    pub class_name: String,
    pub feats: Vec<String>,
    pub skills: BTreeMap<String, u32>,
    /// 小寫的職業能力名稱
    pub class_features: Vec<String>,
    pub caster_level: u32,
    pub proficiencies: Vec<String>,
    pub max_spell_level: Option<u8>,
}

impl PrerequisiteContext {
    /// 假設已選取某專長的快照
    pub fn with_feat(&self, feat: impl Into<String>) -> Self {
        let mut feats = self.feats.clone();
        feats.push(feat.into());
        Self {
            feats,
            ..self.clone()
        }
    }

    fn has_feat(&self, name: &str) -> bool {
        self.feats.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    fn has_proficiency(&self, name: &str) -> bool {
        self.proficiencies
            .iter()
            .any(|p| p.eq_ignore_ascii_case(name))
    }
}

impl Prerequisite {
    pub fn is_met(&self, ctx: &PrerequisiteContext) -> bool {
        match self {
            Self::Ability { ability, minimum } => ctx.ability_scores.get(*ability) >= *minimum,
            Self::Bab { minimum } => ctx.bab >= *minimum,
            Self::Feat { name } => ctx.has_feat(name),
            Self::Skill { name, ranks } => ctx.skills.get(name).copied().unwrap_or(0) >= *ranks,
            Self::ClassFeature { name } => {
                let name = name.to_lowercase();
                ctx.class_features.iter().any(|f| *f == name)
            }
            Self::CasterLevel { minimum } => ctx.caster_level >= *minimum,
            Self::Class { name, level } => {
                ctx.class_name.eq_ignore_ascii_case(name)
                    && level.map_or(true, |level| ctx.level >= level)
            }
            Self::Proficiency { name } => ctx.has_proficiency(name),
            Self::Level { minimum } => ctx.level >= *minimum,
            Self::SpellLevel { minimum } => ctx.max_spell_level.is_some_and(|l| l >= *minimum),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteResult {
    pub met: bool,
    pub unmet: Vec<String>,
}

/// 檢查專長的所有先決條件
pub fn check(feat: &Feat, ctx: &PrerequisiteContext) -> PrerequisiteResult {
    let unmet: Vec<String> = feat
        .prerequisites
        .iter()
        .filter(|p| !p.is_met(ctx))
        .map(ToString::to_string)
        .collect();
    PrerequisiteResult {
        met: unmet.is_empty(),
        unmet,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatAvailability {
    pub feat: String,
    pub result: PrerequisiteResult,
}

/// 尚未選取的專長及其先決條件結果
pub fn available_feats(feats: &[Feat], ctx: &PrerequisiteContext) -> Vec<FeatAvailability> {
    feats
        .iter()
        .filter(|feat| !ctx.has_feat(&feat.name))
        .map(|feat| FeatAvailability {
            feat: feat.name.clone(),
            result: check(feat, ctx),
        })
        .collect()
}
