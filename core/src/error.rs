//! 錯誤處理系統
//!
//! 推導計算本身是全函數，不會失敗；只有裝備設定、表格載入、
//! 名稱查找與升級流程會回傳錯誤。

use crate::abilities::Ability;
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 頂層錯誤，包含原始錯誤和 context 鏈
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    contexts: Vec<String>,
}

/// 錯誤種類
#[derive(Debug, ThisError)]
pub enum ErrorKind {
    #[error(transparent)]
    Equipment(#[from] EquipmentError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    LevelUp(#[from] LevelUpError),
}

/// 裝備設定錯誤（在建立裝備項目時拒絕，不會自動夾住數值）
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum EquipmentError {
    #[error("強化加值超出範圍: +{bonus}（允許 +1 到 +{max}）")]
    EnhancementOutOfRange { bonus: i32, max: i32 },
    #[error("有效加值 +{effective} 超過上限 +{max}")]
    EffectiveBonusTooHigh { effective: i32, max: i32 },
    #[error("特殊能力 {ability} 需要至少 +1 強化加值")]
    AbilityRequiresEnhancement { ability: String },
    #[error("未知的特殊能力: {ability}")]
    UnknownAbility { ability: String },
    #[error("未知的武器材質: {material}")]
    UnknownMaterial { material: String },
    #[error("特殊能力 {ability} 無法套用在 {item}")]
    AbilityNotApplicable { ability: String, item: String },
    #[error("{item} 不是複合弓，無法設定力量等級")]
    StrengthRatingOnNonComposite { item: String },
    #[error("裝備索引超出範圍: {index}（共 {len} 件）")]
    IndexOutOfRange { index: usize, len: usize },
}

/// 表格載入錯誤
#[derive(Debug, ThisError)]
pub enum LoadError {
    #[error("{format} 反序列化失敗: {reason}")]
    DeserializeError { format: String, reason: String },
    #[error("{format} 序列化失敗: {reason}")]
    SerializeError { format: String, reason: String },
}

/// 規則表查找錯誤
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum LookupError {
    #[error("種族未找到: {name}")]
    UnknownRace { name: String },
    #[error("職業未找到: {name}")]
    UnknownClass { name: String },
    #[error("技能未找到: {name}")]
    UnknownSkill { name: String },
}

/// 升級流程錯誤
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum LevelUpError {
    #[error("尚未記錄生命骰結果")]
    HpNotRecorded,
    #[error("尚未選擇要提升的屬性")]
    AbilityNotChosen,
    #[error("尚未選擇專長")]
    FeatNotChosen,
    #[error("尚未選擇額外專長")]
    BonusFeatNotChosen,
    #[error("技能點分配超出上限: 已分配 {allocated}，可用 {available}")]
    SkillRanksOverBudget { allocated: u32, available: u32 },
    #[error("只能在總結步驟確認升級")]
    NotAtSummary,
    #[error("此等級不提供屬性提升，不能選擇 {ability:?}")]
    AbilityIncreaseNotAllowed { ability: Ability },
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// 添加錯誤上下文，自動記錄呼叫位置
    #[track_caller]
    pub fn context<C: Into<String>>(mut self, context: C) -> Self {
        let loc = std::panic::Location::caller();
        let msg = format!("{} [{}:{}]", context.into(), loc.file(), loc.line());
        self.contexts.push(msg);
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        for ctx in &self.contexts {
            write!(f, "\n  {}", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl<E: Into<ErrorKind>> From<E> for Error {
    fn from(error: E) -> Self {
        Self {
            kind: error.into(),
            contexts: Vec::new(),
        }
    }
}

/// Result 擴展 trait，用於添加錯誤上下文
pub trait Context<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    #[track_caller]
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(e) => Err(e.context(context)),
        }
    }
}
