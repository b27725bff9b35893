//! 升級流程
//!
//! 升級精靈依固定順序走過各步驟：
//! `overview → hp → [ability] → [feat] → [bonusFeat] → skills → summary`，
//! 方括號中的步驟只在該等級符合條件時出現。確認後產生 [`LevelUpRecord`]，
//! 再由 [`apply_level_up`] 套用到角色，回傳新的角色值。

use crate::{
    abilities::{self, Ability},
    bonus::StatBreakdown,
    character::{Character, CharacterClass, ClassFeature, Race},
    config::RulesetConfig,
    dice::average_hp_gain,
    error::{LevelUpError, Result},
    skills::{ranks_per_level, CharacterSkill},
};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{debug, warn};

/// 單一技能的點數分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillAllocation {
    pub skill: String,
    pub ranks: u32,
}

/// 一次升級的紀錄，保存在角色的升級歷史中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpRecord {
    pub level_number: u32,
    pub hp_rolled: u32,
    #[serde(default)]
    pub skill_ranks_allocated: Vec<SkillAllocation>,
    #[serde(default)]
    pub feat_chosen: Option<String>,
    #[serde(default)]
    pub bonus_feat_chosen: Option<String>,
    #[serde(default)]
    pub ability_score_increase: Option<Ability>,
    #[serde(default)]
    pub timestamp: String,
}

/// 升到下一級時需要做的選擇
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpRequirements {
    pub new_level: u32,
    pub hit_die: u32,
    pub skill_ranks_available: u32,
    pub needs_feat: bool,
    pub needs_bonus_feat: bool,
    pub bonus_feat_note: Option<String>,
    pub needs_ability_increase: bool,
    pub new_class_features: Vec<ClassFeature>,
    pub gains_new_spell_level: bool,
}

/// 計算角色升到下一級的需求
pub fn requirements(
    character: &Character,
    class: &CharacterClass,
    race: &Race,
    config: &RulesetConfig,
) -> LevelUpRequirements {
    let new_level = character.level + 1;
    let scores = abilities::resolve(
        &character.base_ability_scores,
        &race.ability_modifiers,
        character.racial_ability_choice,
    );
    let bonus_feat = class.bonus_feat_at(new_level);

    LevelUpRequirements {
        new_level,
        hit_die: class.hit_die,
        skill_ranks_available: ranks_per_level(
            class.skill_ranks_per_level,
            scores.modifier(Ability::Intelligence),
            race.bonus_skill_rank,
            config.min_skill_ranks,
        ),
        needs_feat: config.feat_schedule.grants_feat_at(new_level),
        needs_bonus_feat: bonus_feat.is_some(),
        bonus_feat_note: bonus_feat
            .map(|b| b.note.clone())
            .filter(|note| !note.is_empty()),
        needs_ability_increase: config.grants_ability_increase_at(new_level),
        new_class_features: class.features_at(new_level).cloned().collect(),
        gains_new_spell_level: class.spells.unlocks_spell_level(character.level),
    }
}

/// 升級精靈的步驟
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum LevelUpStep {
    Overview,
    Hp,
    Ability,
    Feat,
    BonusFeat,
    Skills,
    Summary,
}

/// 依需求決定步驟順序
pub fn steps_for(requirements: &LevelUpRequirements) -> Vec<LevelUpStep> {
    let mut steps = vec![LevelUpStep::Overview, LevelUpStep::Hp];
    if requirements.needs_ability_increase {
        steps.push(LevelUpStep::Ability);
    }
    if requirements.needs_feat {
        steps.push(LevelUpStep::Feat);
    }
    if requirements.needs_bonus_feat {
        steps.push(LevelUpStep::BonusFeat);
    }
    steps.push(LevelUpStep::Skills);
    steps.push(LevelUpStep::Summary);
    steps
}

/// 精靈中已輸入的資料；往回走不會清除
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpDraft {
    pub hp_rolled: Option<u32>,
    pub ability: Option<Ability>,
    pub feat: Option<String>,
    pub bonus_feat: Option<String>,
    pub skill_ranks: Vec<SkillAllocation>,
}

impl LevelUpDraft {
    pub fn ranks_allocated(&self) -> u32 {
        self.skill_ranks.iter().map(|a| a.ranks).sum()
    }
}

/// 升級精靈狀態機
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpWizard {
    requirements: LevelUpRequirements,
    steps: Vec<LevelUpStep>,
    current: usize,
    draft: LevelUpDraft,
}

impl LevelUpWizard {
    pub fn new(requirements: LevelUpRequirements) -> Self {
        let steps = steps_for(&requirements);
        Self {
            requirements,
            steps,
            current: 0,
            draft: LevelUpDraft::default(),
        }
    }

    pub fn requirements(&self) -> &LevelUpRequirements {
        &self.requirements
    }

    pub fn steps(&self) -> &[LevelUpStep] {
        &self.steps
    }

    pub fn current_step(&self) -> LevelUpStep {
        self.steps[self.current]
    }

    pub fn draft(&self) -> &LevelUpDraft {
        &self.draft
    }

    fn has_step(&self, step: LevelUpStep) -> bool {
        self.steps.contains(&step)
    }

    /// 前進一步；生命骰尚未記錄時無法離開 hp 步驟
    pub fn next(&mut self) -> Result<LevelUpStep> {
        if self.current_step() == LevelUpStep::Hp && self.draft.hp_rolled.is_none() {
            warn!(level = self.requirements.new_level, "生命骰尚未記錄，無法前進");
            return Err(LevelUpError::HpNotRecorded.into());
        }
        if self.current + 1 < self.steps.len() {
            self.current += 1;
        }
        debug!(step = %self.current_step(), "升級步驟");
        Ok(self.current_step())
    }

    /// 後退一步，保留已輸入的資料
    pub fn back(&mut self) -> LevelUpStep {
        self.current = self.current.saturating_sub(1);
        self.current_step()
    }

    /// 記錄擲出的生命骰；0 視為尚未記錄
    pub fn record_hp_roll(&mut self, roll: u32) {
        self.draft.hp_rolled = (roll > 0).then_some(roll);
    }

    /// 採用平均值 ceil(骰面 / 2) + 1
    pub fn accept_average(&mut self) -> u32 {
        let average = average_hp_gain(self.requirements.hit_die).max(1) as u32;
        self.draft.hp_rolled = Some(average);
        average
    }

    pub fn choose_ability(&mut self, ability: Ability) -> Result<()> {
        if !self.has_step(LevelUpStep::Ability) {
            warn!(level = self.requirements.new_level, ?ability, "此等級沒有屬性提升");
            return Err(LevelUpError::AbilityIncreaseNotAllowed { ability }.into());
        }
        self.draft.ability = Some(ability);
        Ok(())
    }

    pub fn choose_feat(&mut self, feat: impl Into<String>) {
        self.draft.feat = Some(feat.into());
    }

    pub fn choose_bonus_feat(&mut self, feat: impl Into<String>) {
        self.draft.bonus_feat = Some(feat.into());
    }

    /// 設定某技能本級分配的點數；超出可用點數時拒絕並保留原分配
    pub fn allocate_ranks(&mut self, skill: impl Into<String>, ranks: u32) -> Result<()> {
        let skill = skill.into();
        let mut allocations: Vec<SkillAllocation> = self
            .draft
            .skill_ranks
            .iter()
            .filter(|a| a.skill != skill)
            .cloned()
            .collect();
        if ranks > 0 {
            allocations.push(SkillAllocation { skill, ranks });
        }

        let allocated: u32 = allocations.iter().map(|a| a.ranks).sum();
        let available = self.requirements.skill_ranks_available;
        if allocated > available {
            warn!(allocated, available, "技能點分配超出上限");
            return Err(LevelUpError::SkillRanksOverBudget {
                allocated,
                available,
            }
            .into());
        }
        self.draft.skill_ranks = allocations;
        Ok(())
    }

    /// 在總結步驟確認，產生升級紀錄
    pub fn confirm(&self, timestamp: impl Into<String>) -> Result<LevelUpRecord> {
        if self.current_step() != LevelUpStep::Summary {
            return Err(LevelUpError::NotAtSummary.into());
        }
        let hp_rolled = self.draft.hp_rolled.ok_or(LevelUpError::HpNotRecorded)?;
        if self.has_step(LevelUpStep::Ability) && self.draft.ability.is_none() {
            return Err(LevelUpError::AbilityNotChosen.into());
        }
        if self.has_step(LevelUpStep::Feat) && self.draft.feat.is_none() {
            return Err(LevelUpError::FeatNotChosen.into());
        }
        if self.has_step(LevelUpStep::BonusFeat) && self.draft.bonus_feat.is_none() {
            return Err(LevelUpError::BonusFeatNotChosen.into());
        }

        let record = LevelUpRecord {
            level_number: self.requirements.new_level,
            hp_rolled,
            skill_ranks_allocated: self.draft.skill_ranks.clone(),
            feat_chosen: self.draft.feat.clone().filter(|_| self.has_step(LevelUpStep::Feat)),
            bonus_feat_chosen: self
                .draft
                .bonus_feat
                .clone()
                .filter(|_| self.has_step(LevelUpStep::BonusFeat)),
            ability_score_increase: self.draft.ability,
            timestamp: timestamp.into(),
        };
        debug!(level = record.level_number, hp = record.hp_rolled, "確認升級");
        Ok(record)
    }
}

/// 將升級紀錄套用到角色，回傳新的角色值
pub fn apply_level_up(character: &Character, record: &LevelUpRecord) -> Character {
    let mut updated = character.clone();
    updated.level = record.level_number;

    if let Some(ability) = record.ability_score_increase {
        updated.base_ability_scores = updated.base_ability_scores.with_adjustment(ability, 1);
    }

    for allocation in &record.skill_ranks_allocated {
        match updated
            .skills
            .iter_mut()
            .find(|s| s.name == allocation.skill)
        {
            Some(skill) => skill.ranks += allocation.ranks,
            None => updated.skills.push(CharacterSkill::new(
                allocation.skill.clone(),
                allocation.ranks,
                false,
            )),
        }
    }

    updated.feats.extend(record.feat_chosen.iter().cloned());
    updated.feats.extend(record.bonus_feat_chosen.iter().cloned());
    updated.level_history.push(record.clone());

    debug!(
        character = %updated.name,
        level = updated.level,
        ability = ?record.ability_score_increase,
        "套用升級"
    );
    updated
}

/// 最大生命值明細
///
/// 1 級取生命骰最大值，之後每級取升級紀錄的擲骰結果（沒有紀錄則用平均值），
/// 每級加體質調整。堅韌加 max(3, 等級)。總值至少 1；手動覆寫優先。
pub fn max_hp(
    hit_die: u32,
    con_modifier: i32,
    level: u32,
    history: &[LevelUpRecord],
    has_toughness: bool,
    override_hp: Option<i32>,
) -> StatBreakdown {
    if let Some(hp) = override_hp {
        return StatBreakdown::from_labeled([("Override", hp)]);
    }

    let level = level.max(1);
    let later_levels: i32 = (2..=level)
        .map(|lvl| {
            history
                .iter()
                .find(|r| r.level_number == lvl)
                .map(|r| r.hp_rolled as i32)
                .unwrap_or_else(|| average_hp_gain(hit_die))
        })
        .sum();
    let toughness = if has_toughness {
        (level as i32).max(3)
    } else {
        0
    };

    let mut entries = vec![
        ("Hit Die (level 1)".to_string(), hit_die as i32),
        ("Hit Dice (later levels)".to_string(), later_levels),
        ("CON".to_string(), con_modifier * level as i32),
        ("Toughness".to_string(), toughness),
    ];
    let subtotal: i32 = entries.iter().map(|(_, value)| value).sum();
    if subtotal < 1 {
        entries.push(("Minimum".to_string(), 1 - subtotal));
    }
    StatBreakdown::from_labeled(entries)
}
