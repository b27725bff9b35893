//! 規則表載入
//!
//! 從 TOML 或 JSON 反序列化職業、種族、技能、專長與裝備表。
//! 載入後的表格唯讀，引擎不會修改。

use crate::{
    character::{CharacterClass, Race},
    equipment::{Armor, EquipmentCatalog, Weapon},
    error::{Context, LoadError, LookupError, Result},
    prerequisites::Feat,
    skills::SkillDefinition,
};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// 規則表的檔案格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TableFormat {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

/// 所有靜態規則表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesTables {
    pub classes: Vec<CharacterClass>,
    pub races: Vec<Race>,
    pub skills: Vec<SkillDefinition>,
    pub feats: Vec<Feat>,
    pub weapons: Vec<Weapon>,
    pub armor: Vec<Armor>,
    pub equipment: EquipmentCatalog,
}

impl RulesTables {
    pub fn class(&self, name: &str) -> Result<&CharacterClass> {
        self.classes
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                LookupError::UnknownClass {
                    name: name.to_string(),
                }
                .into()
            })
    }

    pub fn race(&self, name: &str) -> Result<&Race> {
        self.races.iter().find(|r| r.name == name).ok_or_else(|| {
            LookupError::UnknownRace {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn skill(&self, name: &str) -> Result<&SkillDefinition> {
        self.skills.iter().find(|s| s.name == name).ok_or_else(|| {
            LookupError::UnknownSkill {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn feat(&self, name: &str) -> Option<&Feat> {
        self.feats.iter().find(|f| f.name == name)
    }

    pub fn weapon(&self, name: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.name == name)
    }

    pub fn armor(&self, name: &str) -> Option<&Armor> {
        self.armor.iter().find(|a| a.name == name)
    }
}

/// 反序列化規則表
pub fn parse_rules_tables(content: &str, format: TableFormat) -> Result<RulesTables> {
    let parsed: std::result::Result<RulesTables, String> = match format {
        TableFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        TableFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    };
    let tables = parsed
        .map_err(|reason| LoadError::DeserializeError {
            format: format.to_string(),
            reason,
        })
        .map_err(crate::error::Error::from)
        .context("載入規則表")?;
    Ok(tables)
}

/// 分別載入各表格的 TOML 字串後合併
pub fn parse_toml_tables(sources: &[(&str, &str)]) -> Result<RulesTables> {
    let mut merged = RulesTables::default();
    for (name, content) in sources {
        let tables: RulesTables = toml::from_str(content)
            .map_err(|e| LoadError::DeserializeError {
                format: name.to_string(),
                reason: e.to_string(),
            })
            .map_err(crate::error::Error::from)
            .context(format!("載入 {}", name))?;
        merged.classes.extend(tables.classes);
        merged.races.extend(tables.races);
        merged.skills.extend(tables.skills);
        merged.feats.extend(tables.feats);
        merged.weapons.extend(tables.weapons);
        merged.armor.extend(tables.armor);
        merged
            .equipment
            .weapon_abilities
            .extend(tables.equipment.weapon_abilities);
        merged
            .equipment
            .armor_abilities
            .extend(tables.equipment.armor_abilities);
        merged
            .equipment
            .weapon_materials
            .extend(tables.equipment.weapon_materials);
    }
    Ok(merged)
}

/// 序列化為 JSON（匯出用）
pub fn to_json(tables: &RulesTables) -> Result<String> {
    Ok(
        serde_json::to_string_pretty(tables).map_err(|e| LoadError::SerializeError {
            format: TableFormat::Json.to_string(),
            reason: e.to_string(),
        })?,
    )
}
