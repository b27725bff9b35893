#![allow(dead_code)]

use pf1e_core::{
    equipment::{EquipmentEntry, Quality, SpecialAbilityEntry, WeaponEntry},
    loader::{parse_rules_tables, RulesTables, TableFormat},
};

pub const CLASS_FIGHTER: &str = "Fighter";
pub const CLASS_WIZARD: &str = "Wizard";
pub const CLASS_ROGUE: &str = "Rogue";
pub const RACE_HUMAN: &str = "Human";
pub const RACE_HALFLING: &str = "Halfling";

/// 最小規則表：三個職業、兩個種族、幾個技能與專長，以及裝備表
pub const RULES_TOML: &str = r#"
[[classes]]
name = "Fighter"
hit_die = 10
bab = "full"
skill_ranks_per_level = 2
class_skills = ["Climb", "Swim"]
proficiencies = ["Simple Weapons", "Martial Weapons", "Heavy Armor", "Shields"]
features = [{ name = "Bravery", level = 2 }, { name = "Armor Training", level = 3 }]
bonus_feats = [
    { level = 1, note = "Combat feat" },
    { level = 2, note = "Combat feat" },
    { level = 4, note = "Combat feat" },
]

[classes.saves]
fortitude = "good"

[[classes]]
name = "Wizard"
hit_die = 6
bab = "half"
skill_ranks_per_level = 2
class_skills = ["Knowledge (Arcana)"]
features = [{ name = "Arcane Bond", level = 1 }]

[classes.saves]
will = "good"

[classes.spells]
kind = "prepared"
casting_ability = "int"
spells_per_day = [
    { level = 1, slots = [3, 1] },
    { level = 2, slots = [4, 2] },
    { level = 3, slots = [4, 2, 1] },
    { level = 4, slots = [4, 3, 2] },
]

[[classes.resources]]
name = "Hand of the Apprentice"
ability = "int"
formula = { kind = "fixed", uses = 3 }

[[classes]]
name = "Rogue"
hit_die = 8
bab = "threeQuarter"
skill_ranks_per_level = 8
class_skills = ["Acrobatics", "Climb", "Stealth", "Swim"]
features = [{ name = "Sneak Attack", level = 1 }, { name = "Evasion", level = 2 }]
sneak_attack = { kind = "half_level_rounded_up" }

[classes.saves]
reflex = "good"

[[races]]
name = "Human"
speed = 30
flexible_bonus = true
bonus_skill_rank = true

[[races]]
name = "Halfling"
size = "Small"
speed = 20
ability_modifiers = [
    { ability = "dex", value = 2 },
    { ability = "cha", value = 2 },
    { ability = "str", value = -2 },
]
skill_bonuses = { Climb = 2 }

[[skills]]
name = "Acrobatics"
ability = "dex"
armor_check_penalty = true

[[skills]]
name = "Climb"
ability = "str"
armor_check_penalty = true

[[skills]]
name = "Knowledge (Arcana)"
ability = "int"
trained_only = true

[[skills]]
name = "Stealth"
ability = "dex"
armor_check_penalty = true

[[skills]]
name = "Swim"
ability = "str"
armor_check_penalty = true

[[feats]]
name = "Power Attack"
tags = ["combat"]
prerequisites = [
    { type = "ability", ability = "str", minimum = 13 },
    { type = "bab", minimum = 1 },
]

[[feats]]
name = "Cleave"
tags = ["combat"]
prerequisites = [{ type = "feat", name = "Power Attack" }]

[[feats]]
name = "Weapon Focus"
tags = ["combat"]
prerequisites = [
    { type = "proficiency", name = "Martial Weapons" },
    { type = "bab", minimum = 1 },
]

[[feats]]
name = "Weapon Specialization"
tags = ["combat"]
prerequisites = [
    { type = "feat", name = "Weapon Focus" },
    { type = "class", name = "Fighter", level = 4 },
]

[[feats]]
name = "Toughness"

[[feats]]
name = "Scribe Scroll"
prerequisites = [{ type = "casterLevel", minimum = 1 }]

[[feats]]
name = "Combat Casting"
prerequisites = [{ type = "spellLevel", minimum = 1 }]

[[feats]]
name = "Bleeding Attack"
prerequisites = [{ type = "classFeature", name = "Sneak Attack" }]

[[weapons]]
name = "Longsword"
category = "Martial"
weapon_type = "one_handed_melee"
cost = 15.0
damage = { count = 1, sides = 8 }
critical = { range = 19, multiplier = 2 }
weight = 4.0

[[weapons]]
name = "Greatsword"
category = "Martial"
weapon_type = "two_handed_melee"
cost = 50.0
damage = { count = 2, sides = 6 }
critical = { range = 19, multiplier = 2 }
weight = 8.0

[[weapons]]
name = "Rapier"
category = "Martial"
weapon_type = "one_handed_melee"
cost = 20.0
damage = { count = 1, sides = 6 }
critical = { range = 18, multiplier = 2 }
weight = 2.0
finesse = true

[[weapons]]
name = "Composite Longbow"
category = "Martial"
weapon_type = "ranged"
cost = 100.0
damage = { count = 1, sides = 8 }
critical = { range = 20, multiplier = 3 }
weight = 3.0
composite = true

[[armor]]
name = "Studded Leather"
category = "Light"
cost = 25.0
ac_bonus = 3
max_dex = 5
armor_check_penalty = -1
arcane_spell_failure = 15
weight = 20.0

[[armor]]
name = "Full Plate"
category = "Heavy"
cost = 1500.0
ac_bonus = 9
max_dex = 1
armor_check_penalty = -6
arcane_spell_failure = 35
speed30 = 20
speed20 = 15
weight = 50.0

[[armor]]
name = "Heavy Steel Shield"
category = "Shield"
cost = 20.0
ac_bonus = 2
armor_check_penalty = -2
arcane_spell_failure = 15
weight = 15.0

[[equipment.weapon_abilities]]
id = "flaming"
name = "Flaming"
equivalent_bonus = 1
extra_damage_dice = { count = 1, sides = 6 }
extra_damage_type = "fire"

[[equipment.weapon_abilities]]
id = "keen"
name = "Keen"
equivalent_bonus = 1
applies_to = "melee"
double_crit_range = true
is_toggle = true

[[equipment.weapon_abilities]]
id = "bane"
name = "Bane"
equivalent_bonus = 1
extra_damage_dice = { count = 2, sides = 6 }
requires_target = true
is_toggle = true
conditional_enhancement = 2

[[equipment.weapon_abilities]]
id = "speed"
name = "Speed"
equivalent_bonus = 3
grants_extra_attack = true
is_toggle = true

[[equipment.weapon_abilities]]
id = "defending"
name = "Defending"
equivalent_bonus = 1
applies_to = "melee"
is_toggle = true
transfers_enhancement_to_ac = true

[[equipment.weapon_abilities]]
id = "vorpal"
name = "Vorpal"
equivalent_bonus = 5
applies_to = "melee"

[[equipment.armor_abilities]]
id = "fortification_light"
name = "Light Fortification"
equivalent_bonus = 1

[[equipment.armor_abilities]]
id = "bashing"
name = "Bashing"
equivalent_bonus = 1
applies_to = "shield"

[[equipment.weapon_materials]]
id = "cold_iron"
name = "Cold Iron"
cost = { kind = "base_cost" }
enchantment_cost_extra = 2000.0

[[equipment.weapon_materials]]
id = "alchemical_silver"
name = "Alchemical Silver"
cost = { kind = "flat", amount = 90.0 }
damage_modifier = -1

[[equipment.weapon_materials]]
id = "adamantine"
name = "Adamantine"
cost = { kind = "flat", amount = 3000.0 }
counts_as_masterwork = true

[[equipment.weapon_materials]]
id = "darkwood"
name = "Darkwood"
cost = { kind = "per_pound", amount = 10.0 }
weight_multiplier = 0.5
counts_as_masterwork = true
"#;

pub fn rules() -> RulesTables {
    parse_rules_tables(RULES_TOML, TableFormat::Toml).expect("規則表應可載入")
}

/// 從規則表取出武器並包成背包項目
pub fn weapon_entry(tables: &RulesTables, name: &str) -> WeaponEntry {
    let weapon = tables.weapon(name).expect("武器應存在").clone();
    WeaponEntry::new(weapon)
}

/// 設定過的武器項目
pub fn magic_weapon(
    tables: &RulesTables,
    name: &str,
    enhancement: i32,
    abilities: &[&str],
) -> EquipmentEntry {
    let weapon = tables.weapon(name).expect("武器應存在").clone();
    let entry = WeaponEntry::configure(
        weapon,
        Quality::Masterwork,
        "standard",
        enhancement,
        abilities.iter().map(|id| SpecialAbilityEntry::new(*id)).collect(),
        None,
        &tables.equipment,
    )
    .expect("武器設定應合法");
    EquipmentEntry::Weapon(entry)
}
