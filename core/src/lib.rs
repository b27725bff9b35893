//! Pathfinder 1e 規則推導核心函式庫
//!
//! 從角色記錄與靜態規則表推導所有衍生數值，包括：
//! - 加值堆疊與屬性解析
//! - 裝備（材質、精製、強化、特殊能力）解析與價格
//! - 戰鬥數值、武器攻擊與多重攻擊
//! - 法術位、專長先決條件
//! - 升級流程
//!
//! 所有計算都是純函數；改變角色的操作一律回傳新的角色值。

pub mod abilities;
pub mod attack;
pub mod bonus;
pub mod character;
pub mod combat;
pub mod config;
pub mod derived;
pub mod dice;
pub mod equipment;
pub mod error;
pub mod loader;
pub mod prerequisites;
pub mod progression;
pub mod skills;
pub mod spells;

// 重新導出常用類型
pub use abilities::{Ability, AbilityScores};
pub use bonus::{BonusEntry, BonusType, StatBreakdown};
pub use character::{Character, CharacterClass, Race, Size};
pub use combat::{CombatInputs, CombatStats};
pub use config::RulesetConfig;
pub use derived::DerivedStats;
pub use dice::DiceRoll;
pub use equipment::{EquipmentCatalog, EquipmentEntry};
pub use error::{Error, ErrorKind, Result};
pub use loader::{parse_rules_tables, RulesTables, TableFormat};
pub use progression::{LevelUpRecord, LevelUpStep, LevelUpWizard};
