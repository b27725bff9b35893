//! 武器攻擊解析
//!
//! 對每把已裝備的武器，分別計算攻擊與傷害明細、額外傷害骰，
//! 以及多重攻擊序列。武器的加值以標籤列出，不走具型別的堆疊規則。

use crate::{
    bonus::StatBreakdown,
    character::SneakAttackProgression,
    combat::iterative_attacks,
    dice::DiceRoll,
    equipment::{EquipmentCatalog, WeaponEntry, WeaponSpecialAbility},
    error::Result,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// 專長或職業提供的戰鬥切換
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum FeatToggle {
    PowerAttack,
    DeadlyAim,
    CombatExpertise,
    PointBlankShot,
    SneakAttack,
}

impl FeatToggle {
    pub fn id(&self) -> &'static str {
        match self {
            Self::PowerAttack => "powerAttack",
            Self::DeadlyAim => "deadlyAim",
            Self::CombatExpertise => "combatExpertise",
            Self::PointBlankShot => "pointBlankShot",
            Self::SneakAttack => "sneakAttack",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PowerAttack => "Power Attack",
            Self::DeadlyAim => "Deadly Aim",
            Self::CombatExpertise => "Combat Expertise",
            Self::PointBlankShot => "Point-Blank Shot",
            Self::SneakAttack => "Sneak Attack",
        }
    }

    pub fn scope(&self) -> ToggleScope {
        match self {
            Self::PowerAttack | Self::CombatExpertise => ToggleScope::Melee,
            Self::DeadlyAim | Self::PointBlankShot => ToggleScope::Ranged,
            Self::SneakAttack => ToggleScope::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleScope {
    Melee,
    Ranged,
    All,
}

/// 可顯示給使用者的切換
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatToggle {
    pub id: String,
    pub name: String,
    pub applies_to: ToggleScope,
    pub is_active: bool,
}

/// 額外傷害骰，與數值傷害分開列出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraDamage {
    pub source: String,
    pub dice: DiceRoll,
    #[serde(default)]
    pub damage_type: Option<String>,
}

/// 攻擊解析需要的角色狀態
#[derive(Debug, Clone, Copy)]
pub struct AttackContext<'a> {
    pub bab: i32,
    pub str_mod: i32,
    pub dex_mod: i32,
    /// AC 的體型調整（小型 +1）
    pub size_modifier: i32,
    pub level: u32,
    pub feats: &'a [String],
    pub feat_params: &'a BTreeMap<String, String>,
    pub sneak_attack: Option<SneakAttackProgression>,
    pub active_toggles: &'a BTreeSet<String>,
}

impl AttackContext<'_> {
    fn has_feat(&self, feat: &str) -> bool {
        self.feats.iter().any(|f| f == feat)
    }

    fn is_on(&self, toggle: FeatToggle) -> bool {
        self.active_toggles.contains(toggle.id())
    }

    fn feat_target(&self, feat: &str) -> Option<&str> {
        self.feat_params.get(feat).map(String::as_str)
    }

    fn sneak_attack_dice(&self) -> u32 {
        self.sneak_attack.map_or(0, |p| p.dice_at(self.level))
    }
}

/// 單把武器的攻擊結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponAttack {
    pub weapon: String,
    pub attack: StatBreakdown,
    pub damage: StatBreakdown,
    pub damage_dice: DiceRoll,
    pub critical_range: u32,
    pub critical_multiplier: u32,
    pub extra_damage: Vec<ExtraDamage>,
    /// 全攻擊的每次攻擊加值
    pub iterative_attacks: Vec<i32>,
    /// 防禦能力開啟時可轉到 AC 的強化加值，不在這裡計入 AC
    pub defending_ac_bonus: i32,
}

/// 強攻／精準射擊的攻擊減值：1 + floor(BAB / 4)
pub fn power_attack_penalty(bab: i32) -> i32 {
    1 + bab.div_euclid(4)
}

/// 強攻／精準射擊的傷害加值（雙手武器前）
pub fn power_attack_damage(bab: i32) -> i32 {
    2 * power_attack_penalty(bab)
}

/// 擴大重擊範圍：威脅數加倍
pub fn keen_range(range: u32) -> u32 {
    let threats = 21u32.saturating_sub(range);
    21u32.saturating_sub(threats * 2).max(1)
}

/// 目前生效的特殊能力
fn active_abilities<'a>(
    entry: &'a WeaponEntry,
    catalog: &'a EquipmentCatalog,
    toggles: &BTreeSet<String>,
) -> Result<Vec<(&'a WeaponSpecialAbility, Option<&'a str>)>> {
    Ok(entry
        .abilities(catalog)?
        .into_iter()
        .filter(|(ability, target)| {
            let toggled = !ability.is_toggle || toggles.contains(&ability.id);
            let targeted = !ability.requires_target || target.is_some();
            toggled && targeted
        })
        .collect())
}

/// 解析一把武器的攻擊與傷害
pub fn resolve(
    entry: &WeaponEntry,
    catalog: &EquipmentCatalog,
    ctx: &AttackContext<'_>,
) -> Result<WeaponAttack> {
    let weapon = &entry.item;
    let modifiers = entry.modifiers(catalog)?;
    let abilities = active_abilities(entry, catalog, ctx.active_toggles)?;

    let ranged = weapon.is_ranged();
    let two_handed = weapon.is_two_handed();
    let finesse = !ranged && ctx.has_feat("Weapon Finesse") && weapon.is_finessable();

    let mut attack: Vec<(String, i32)> = vec![("BAB".to_string(), ctx.bab)];
    let mut damage: Vec<(String, i32)> = Vec::new();

    if ranged {
        attack.push(("DEX".to_string(), ctx.dex_mod));
    } else if finesse {
        attack.push(("DEX (Finesse)".to_string(), ctx.dex_mod));
    } else {
        attack.push(("STR".to_string(), ctx.str_mod));
    }
    attack.push(("Size".to_string(), ctx.size_modifier));

    // 武器靈巧不影響傷害
    if ranged {
        if let Some(rating) = modifiers.strength_rating {
            damage.push(("STR (Composite)".to_string(), ctx.str_mod.min(rating)));
        }
    } else if two_handed {
        damage.push(("STR (1.5x)".to_string(), (ctx.str_mod * 3).div_euclid(2)));
    } else {
        damage.push(("STR".to_string(), ctx.str_mod));
    }

    attack.push(("Masterwork".to_string(), modifiers.masterwork_attack));

    let defending = abilities
        .iter()
        .any(|(ability, _)| ability.transfers_enhancement_to_ac);
    let defending_ac_bonus = if defending { modifiers.enhancement } else { 0 };
    if !defending {
        attack.push(("Enhancement".to_string(), modifiers.enhancement));
        damage.push(("Enhancement".to_string(), modifiers.enhancement));
    }
    damage.push((modifiers.material_name.clone(), modifiers.material_damage));

    let focus = ctx.feat_target("Weapon Focus");
    let greater_focus = ctx.feat_target("Greater Weapon Focus").or(focus);
    let specialization = ctx.feat_target("Weapon Specialization").or(focus);
    let greater_specialization = ctx
        .feat_target("Greater Weapon Specialization")
        .or(specialization);
    let targets_weapon = |feat: &str, target: Option<&str>| {
        ctx.has_feat(feat) && target == Some(weapon.name.as_str())
    };
    if targets_weapon("Weapon Focus", focus) {
        attack.push(("Weapon Focus".to_string(), 1));
    }
    if targets_weapon("Greater Weapon Focus", greater_focus) {
        attack.push(("Greater Weapon Focus".to_string(), 1));
    }
    if targets_weapon("Weapon Specialization", specialization) {
        damage.push(("Weapon Specialization".to_string(), 2));
    }
    if targets_weapon("Greater Weapon Specialization", greater_specialization) {
        damage.push(("Greater Weapon Specialization".to_string(), 2));
    }

    let mut extra_damage = Vec::new();
    let mut critical_range = weapon.critical.range;
    let mut extra_attack = false;
    for (ability, target) in &abilities {
        let source = match target {
            Some(target) => format!("{} ({})", ability.name, target),
            None => ability.name.clone(),
        };
        if ability.conditional_enhancement != 0 {
            attack.push((source.clone(), ability.conditional_enhancement));
            damage.push((source.clone(), ability.conditional_enhancement));
        }
        if let Some(dice) = ability.extra_damage_dice {
            extra_damage.push(ExtraDamage {
                source: source.clone(),
                dice,
                damage_type: ability.extra_damage_type.clone(),
            });
        }
        if ability.double_crit_range {
            critical_range = keen_range(critical_range);
        }
        extra_attack |= ability.grants_extra_attack;
    }

    if ctx.is_on(FeatToggle::PowerAttack) && !ranged {
        let bonus = power_attack_damage(ctx.bab);
        let bonus = if two_handed {
            (bonus * 3).div_euclid(2)
        } else {
            bonus
        };
        attack.push(("Power Attack".to_string(), -power_attack_penalty(ctx.bab)));
        damage.push(("Power Attack".to_string(), bonus));
    }
    if ctx.is_on(FeatToggle::DeadlyAim) && ranged {
        attack.push(("Deadly Aim".to_string(), -power_attack_penalty(ctx.bab)));
        damage.push(("Deadly Aim".to_string(), power_attack_damage(ctx.bab)));
    }
    if ctx.is_on(FeatToggle::CombatExpertise) && !ranged {
        attack.push(("Combat Expertise".to_string(), -power_attack_penalty(ctx.bab)));
    }
    if ctx.is_on(FeatToggle::PointBlankShot) && ranged {
        attack.push(("Point-Blank Shot".to_string(), 1));
        damage.push(("Point-Blank Shot".to_string(), 1));
    }
    if ctx.is_on(FeatToggle::SneakAttack) {
        let dice = ctx.sneak_attack_dice();
        if dice > 0 {
            extra_damage.push(ExtraDamage {
                source: FeatToggle::SneakAttack.name().to_string(),
                dice: DiceRoll::new(dice, 6, 0),
                damage_type: None,
            });
        }
    }

    let mut attack = StatBreakdown::from_labeled(attack);
    if defending {
        attack.push_audit("Enhancement (Defending)");
    }
    let damage = StatBreakdown::from_labeled(damage);

    let non_bab = attack.total - ctx.bab;
    let mut sequence: Vec<i32> = iterative_attacks(ctx.bab)
        .into_iter()
        .map(|bonus| bonus + non_bab)
        .collect();
    if extra_attack {
        sequence.insert(0, sequence[0]);
    }

    Ok(WeaponAttack {
        weapon: weapon.name.clone(),
        attack,
        damage,
        damage_dice: weapon.damage,
        critical_range,
        critical_multiplier: weapon.critical.multiplier,
        extra_damage,
        iterative_attacks: sequence,
        defending_ac_bonus,
    })
}

/// 解析所有已裝備的武器
pub fn resolve_equipped<'a, I>(
    weapons: I,
    catalog: &EquipmentCatalog,
    ctx: &AttackContext<'_>,
) -> Result<Vec<WeaponAttack>>
where
    I: IntoIterator<Item = &'a WeaponEntry>,
{
    weapons
        .into_iter()
        .filter(|w| w.equipped)
        .map(|w| resolve(w, catalog, ctx))
        .collect()
}

/// 角色可用的戰鬥切換：專長、偷襲，以及已裝備武器上的可切換特殊能力
pub fn available_toggles<'a, I>(
    feats: &[String],
    sneak_attack: Option<SneakAttackProgression>,
    level: u32,
    equipped_weapons: I,
    catalog: &EquipmentCatalog,
    active: &BTreeSet<String>,
) -> Vec<CombatToggle>
where
    I: IntoIterator<Item = &'a WeaponEntry>,
{
    let mut toggles: Vec<CombatToggle> = FeatToggle::iter()
        .filter(|toggle| match toggle {
            FeatToggle::SneakAttack => sneak_attack.is_some_and(|p| p.dice_at(level) > 0),
            other => feats.iter().any(|f| f == other.name()),
        })
        .map(|toggle| CombatToggle {
            id: toggle.id().to_string(),
            name: toggle.name().to_string(),
            applies_to: toggle.scope(),
            is_active: active.contains(toggle.id()),
        })
        .collect();

    for weapon in equipped_weapons {
        for selected in &weapon.special_abilities {
            let Some(ability) = catalog.weapon_ability(&selected.id) else {
                continue;
            };
            if !ability.is_toggle || toggles.iter().any(|t| t.id == ability.id) {
                continue;
            }
            toggles.push(CombatToggle {
                id: ability.id.clone(),
                name: ability.name.clone(),
                applies_to: ToggleScope::All,
                is_active: active.contains(&ability.id),
            });
        }
    }
    toggles
}
