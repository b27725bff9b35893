//! 衍生數值
//!
//! 顯示層唯一需要呼叫的入口：把角色記錄與規則表串過各個解析器，
//! 一次產生所有衍生數值與明細。

use crate::{
    abilities::{self, Ability, AbilityScores},
    attack::{self, AttackContext, CombatToggle, WeaponAttack},
    bonus::StatBreakdown,
    character::Character,
    combat::{self, CombatInputs, CombatStats},
    config::RulesetConfig,
    equipment::{
        encumbrance::{self, Encumbrance},
        EquipmentEntry, WeaponEntry,
    },
    error::{Context, Result},
    loader::RulesTables,
    prerequisites::{self, FeatAvailability, PrerequisiteContext},
    progression,
    skills::{self, CharacterSkill, SkillContext},
    spells::{self, SpellState},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 職業資源的每日狀態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub name: String,
    pub per_day: i32,
    pub used: u32,
    pub remaining: i32,
}

/// 單一技能的總值；需受訓且無等級時為 `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTotal {
    pub name: String,
    pub is_class_skill: bool,
    pub total: Option<StatBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub ability_scores: AbilityScores,
    pub ability_modifiers: BTreeMap<Ability, i32>,
    pub max_hp: StatBreakdown,
    pub combat: CombatStats,
    pub armor_check_penalty: i32,
    pub arcane_spell_failure: i32,
    pub speed: i32,
    pub encumbrance: Encumbrance,
    pub spells: SpellState,
    pub class_resources: Vec<ResourceState>,
    pub skills: Vec<SkillTotal>,
    pub skill_ranks_per_level: u32,
    pub skill_ranks_spent: u32,
    pub attacks: Vec<WeaponAttack>,
    pub toggles: Vec<CombatToggle>,
}

fn equipped_weapons(character: &Character) -> impl Iterator<Item = &WeaponEntry> {
    character.inventory.equipped().filter_map(|entry| match entry {
        EquipmentEntry::Weapon(weapon) => Some(weapon),
        _ => None,
    })
}

impl DerivedStats {
    pub fn compute(
        character: &Character,
        tables: &RulesTables,
        config: &RulesetConfig,
    ) -> Result<Self> {
        let race = tables.race(&character.race).context("計算衍生數值")?;
        let class = tables.class(&character.class_name).context("計算衍生數值")?;
        for skill in &character.skills {
            tables.skill(&skill.name).context("計算衍生數值")?;
        }

        let scores = abilities::resolve(
            &character.base_ability_scores,
            &race.ability_modifiers,
            character.racial_ability_choice,
        );
        let ability_modifiers = Ability::all()
            .into_iter()
            .map(|ability| (ability, scores.modifier(ability)))
            .collect();
        let level = character.level;

        let max_hp = progression::max_hp(
            class.hit_die,
            scores.modifier(Ability::Constitution),
            level,
            &character.level_history,
            character.has_feat("Toughness"),
            character.max_hp_override,
        );

        let defence = character.inventory.defence_summary();
        let ac = character.ac_modifiers;
        let combat = combat::compute(&CombatInputs {
            ability_scores: scores,
            level,
            bab_progression: Some(class.bab),
            save_flags: class.saves,
            armor_bonus: defence.armor_bonus,
            shield_bonus: defence.shield_bonus,
            natural_armor: ac.natural_armor,
            deflection: ac.deflection,
            size_modifier: race.size.modifier(),
            max_dex_cap: defence.max_dex,
            dodge: ac.dodge,
            misc: ac.misc,
            insight: ac.insight,
            resistance: 0,
            extra_ac: defence.ac_bonuses.clone(),
            extra_saves: defence.save_bonuses.clone(),
        });

        let skill_context = |name: &str| SkillContext {
            class_skill_bonus: config.class_skill_bonus,
            racial_bonus: race.skill_bonuses.get(name).copied().unwrap_or(0),
            armor_check_penalty: defence.armor_check_penalty,
        };
        let skills = tables
            .skills
            .iter()
            .map(|definition| {
                let is_class_skill = class.is_class_skill(&definition.name);
                let mut skill = character
                    .skill(&definition.name)
                    .cloned()
                    .unwrap_or_else(|| CharacterSkill::new(definition.name.clone(), 0, false));
                skill.is_class_skill |= is_class_skill;
                SkillTotal {
                    name: definition.name.clone(),
                    is_class_skill: skill.is_class_skill,
                    total: skills::skill_total(
                        &skill,
                        definition,
                        &scores,
                        skill_context(&definition.name),
                    ),
                }
            })
            .collect();

        let spells = spells::compute(
            &class.spells,
            level,
            &scores,
            &character.spell_slots_used,
        );

        let class_resources = class
            .resources
            .iter()
            .map(|resource| {
                let modifier = resource.ability.map_or(0, |a| scores.modifier(a));
                let per_day = resource.uses_per_day(level, modifier);
                let used = character
                    .class_resources_used
                    .get(&resource.name)
                    .copied()
                    .unwrap_or(0);
                ResourceState {
                    name: resource.name.clone(),
                    per_day,
                    used,
                    remaining: (per_day - used as i32).max(0),
                }
            })
            .collect();

        let attack_context = AttackContext {
            bab: combat.bab,
            str_mod: scores.modifier(Ability::Strength),
            dex_mod: scores.modifier(Ability::Dexterity),
            size_modifier: race.size.modifier(),
            level,
            feats: &character.feats,
            feat_params: &character.feat_params,
            sneak_attack: class.sneak_attack,
            active_toggles: &character.combat_toggles,
        };
        let attacks = attack::resolve_equipped(
            equipped_weapons(character),
            &tables.equipment,
            &attack_context,
        )
        .context("解析武器攻擊")?;
        let toggles = attack::available_toggles(
            &character.feats,
            class.sneak_attack,
            level,
            equipped_weapons(character),
            &tables.equipment,
            &character.combat_toggles,
        );

        Ok(Self {
            ability_scores: scores,
            ability_modifiers,
            max_hp,
            armor_check_penalty: defence.armor_check_penalty,
            arcane_spell_failure: defence.arcane_spell_failure,
            speed: defence.speed(race.speed),
            encumbrance: encumbrance::encumbrance(
                scores.strength,
                race.size,
                &character.inventory,
                &tables.equipment,
            ),
            spells,
            class_resources,
            skills,
            skill_ranks_per_level: skills::ranks_per_level(
                class.skill_ranks_per_level,
                scores.modifier(Ability::Intelligence),
                race.bonus_skill_rank,
                config.min_skill_ranks,
            ),
            skill_ranks_spent: skills::ranks_spent(&character.skills),
            combat,
            attacks,
            toggles,
        })
    }
}

/// 角色目前的先決條件快照
pub fn prerequisite_context(
    character: &Character,
    tables: &RulesTables,
) -> Result<PrerequisiteContext> {
    let race = tables.race(&character.race)?;
    let class = tables.class(&character.class_name)?;
    let scores = abilities::resolve(
        &character.base_ability_scores,
        &race.ability_modifiers,
        character.racial_ability_choice,
    );
    let spell_state = spells::compute(
        &class.spells,
        character.level,
        &scores,
        &character.spell_slots_used,
    );

    Ok(PrerequisiteContext {
        ability_scores: scores,
        level: character.level,
        bab: class.bab.bab_at(character.level),
        class_name: class.name.clone(),
        feats: character.feats.clone(),
        skills: character
            .skills
            .iter()
            .map(|s| (s.name.clone(), s.ranks))
            .collect(),
        class_features: class.feature_names_through(character.level),
        caster_level: class.spells.caster_level(character.level),
        proficiencies: class.proficiencies.clone(),
        max_spell_level: spell_state.highest_spell_level(),
    })
}

/// 角色可選的專長；`pending` 為同一流程中已選但尚未確認的專長
pub fn feat_availability(
    character: &Character,
    tables: &RulesTables,
    pending: &[String],
) -> Result<Vec<FeatAvailability>> {
    let context = pending
        .iter()
        .fold(prerequisite_context(character, tables)?, |ctx, feat| {
            ctx.with_feat(feat.clone())
        });
    Ok(prerequisites::available_feats(&tables.feats, &context))
}
