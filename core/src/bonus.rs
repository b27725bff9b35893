//! 加值堆疊系統
//!
//! 所有推導數值（AC、豁免、技能、攻擊）共用同一套具型別加值規則：
//! - 同型別的正加值只取最大者
//! - 閃避（dodge）與無型別（untyped）加值全部累加
//! - 負值（減值）不論型別一律累加

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumIter, EnumString};

/// 加值型別
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
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BonusType {
    Armor,
    Shield,
    NaturalArmor,
    Deflection,
    Dodge,
    Size,
    Enhancement,
    Morale,
    Competence,
    Insight,
    Resistance,
    Circumstance,
    Racial,
    Untyped,
}

impl BonusType {
    /// 此型別的多個來源是否彼此累加
    pub fn stacks(&self) -> bool {
        matches!(self, Self::Dodge | Self::Untyped)
    }
}

/// 單一加值來源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusEntry {
    pub label: String,
    pub value: i32,
    pub bonus_type: BonusType,
}

impl BonusEntry {
    pub fn new(label: impl Into<String>, value: i32, bonus_type: BonusType) -> Self {
        Self {
            label: label.into(),
            value,
            bonus_type,
        }
    }

    pub fn untyped(label: impl Into<String>, value: i32) -> Self {
        Self::new(label, value, BonusType::Untyped)
    }
}

/// 明細中的一列（實際計入總和的來源）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub label: String,
    pub value: i32,
    /// 標籤式加值（例如武器攻擊）沒有型別
    pub bonus_type: Option<BonusType>,
}

/// 推導數值與其明細
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBreakdown {
    pub total: i32,
    pub entries: Vec<BreakdownEntry>,
}

impl StatBreakdown {
    /// 由標籤式加值建立明細：零值略過，其餘直接加總
    pub fn from_labeled<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        let entries: Vec<BreakdownEntry> = entries
            .into_iter()
            .filter(|(_, value)| *value != 0)
            .map(|(label, value)| BreakdownEntry {
                label: label.into(),
                value,
                bonus_type: None,
            })
            .collect();
        let total = entries.iter().map(|e| e.value).sum();
        Self { total, entries }
    }

    /// 加入零值稽核列，總和不變
    pub fn push_audit(&mut self, label: impl Into<String>) {
        self.entries.push(BreakdownEntry {
            label: label.into(),
            value: 0,
            bonus_type: None,
        });
    }

    /// 取得指定標籤的值
    pub fn value_of(&self, label: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.value)
    }
}

/// 依堆疊規則加總加值
///
/// 同型別同值時保留先出現者（僅影響顯示，不影響總和）。
pub fn aggregate(entries: &[BonusEntry]) -> StatBreakdown {
    // 每個不可堆疊型別：目前最大值與其索引
    let mut best: HashMap<BonusType, (usize, i32)> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.value <= 0 || entry.bonus_type.stacks() {
            continue;
        }
        match best.get(&entry.bonus_type) {
            Some(&(_, value)) if value >= entry.value => {}
            _ => {
                best.insert(entry.bonus_type, (index, entry.value));
            }
        }
    }

    let retained: Vec<BreakdownEntry> = entries
        .iter()
        .enumerate()
        .filter(|(index, entry)| {
            if entry.value == 0 {
                false
            } else if entry.value < 0 || entry.bonus_type.stacks() {
                true
            } else {
                best.get(&entry.bonus_type)
                    .is_some_and(|&(best_index, _)| best_index == *index)
            }
        })
        .map(|(_, entry)| BreakdownEntry {
            label: entry.label.clone(),
            value: entry.value,
            bonus_type: Some(entry.bonus_type),
        })
        .collect();

    let total = retained.iter().map(|e| e.value).sum();
    StatBreakdown {
        total,
        entries: retained,
    }
}

/// 只取總和
pub fn total(entries: &[BonusEntry]) -> i32 {
    aggregate(entries).total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_type_takes_highest() {
        let entries = vec![
            BonusEntry::new("Ring of Protection +1", 1, BonusType::Deflection),
            BonusEntry::new("Ring of Protection +2", 2, BonusType::Deflection),
        ];
        let result = aggregate(&entries);
        assert_eq!(result.total, 2);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].label, "Ring of Protection +2");
    }

    #[test]
    fn test_dodge_and_untyped_stack() {
        let entries = vec![
            BonusEntry::new("Dodge", 1, BonusType::Dodge),
            BonusEntry::new("Haste", 1, BonusType::Dodge),
            BonusEntry::untyped("Misc", 2),
            BonusEntry::untyped("Misc", 2),
        ];
        assert_eq!(total(&entries), 6);
    }

    #[test]
    fn test_penalties_always_stack() {
        let entries = vec![
            BonusEntry::new("Shaken", -2, BonusType::Morale),
            BonusEntry::new("Heroism", 2, BonusType::Morale),
            BonusEntry::new("Sickened", -2, BonusType::Morale),
        ];
        // +2 與兩個 -2 全部計入
        assert_eq!(total(&entries), -2);
    }

    #[test]
    fn test_order_independent_total() {
        let a = BonusEntry::new("A", 3, BonusType::Enhancement);
        let b = BonusEntry::new("B", 5, BonusType::Enhancement);
        let c = BonusEntry::new("C", -1, BonusType::Enhancement);
        let forward = aggregate(&[a.clone(), b.clone(), c.clone()]);
        let reverse = aggregate(&[c, b, a]);
        assert_eq!(forward.total, reverse.total);

        let mut forward_labels: Vec<_> = forward.entries.iter().map(|e| e.label.clone()).collect();
        let mut reverse_labels: Vec<_> = reverse.entries.iter().map(|e| e.label.clone()).collect();
        forward_labels.sort();
        reverse_labels.sort();
        assert_eq!(forward_labels, reverse_labels);
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let entries = vec![
            BonusEntry::new("First", 2, BonusType::Insight),
            BonusEntry::new("Second", 2, BonusType::Insight),
        ];
        let result = aggregate(&entries);
        assert_eq!(result.total, 2);
        assert_eq!(result.entries[0].label, "First");
    }

    #[test]
    fn test_empty_and_zero() {
        assert_eq!(aggregate(&[]).total, 0);
        let result = aggregate(&[BonusEntry::untyped("Nothing", 0)]);
        assert_eq!(result.total, 0);
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_labeled_breakdown_with_audit() {
        let mut breakdown = StatBreakdown::from_labeled([("BAB", 6), ("STR", 0), ("Size", 1)]);
        breakdown.push_audit("Enhancement (Defending)");
        assert_eq!(breakdown.total, 7);
        assert_eq!(breakdown.entries.len(), 3);
        assert_eq!(breakdown.value_of("Enhancement (Defending)"), Some(0));
    }
}
