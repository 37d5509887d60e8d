//! Prose name + category → catalog key resolution.
//!
//! The default rule: strip parenthetical disambiguators and trailing id-like
//! tokens, title-case the remaining words, concatenate, and prefix by
//! category. A small table of historical exceptions (names whose save-game
//! ids predate their current display names) overrides the generic rule.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());
static ID_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[a-z0-9_.-]+:[a-z0-9_./-]+\s*$").unwrap());

/// (display name, category) → catalog key. Keys here bypass the default
/// rule entirely.
static EXCEPTIONS: Lazy<HashMap<(&'static str, &'static str), &'static str>> = Lazy::new(|| {
    HashMap::from([
        (("Mooshroom", "entity"), "Entity_MushroomCow"),
        (("Snow Golem", "entity"), "Entity_SnowMan"),
        (("Wither", "entity"), "Entity_WitherBoss"),
        (("Jack o'Lantern", "block"), "Block_LitPumpkin"),
        (("Monster Spawner", "block"), "Block_MobSpawner"),
    ])
});

/// Resolve a display name (and optional category) to its catalog key.
pub fn catalog_key(name: &str, category: Option<&str>) -> String {
    let category = category.map(str::trim).map(str::to_ascii_lowercase);
    let cat = category.as_deref().unwrap_or("other");

    let cleaned = PARENTHETICAL.replace_all(name.trim(), "");
    let cleaned = ID_SUFFIX.replace(&cleaned, "");
    let cleaned = cleaned.trim();

    if let Some(key) = EXCEPTIONS.get(&(cleaned, cat)) {
        return (*key).to_string();
    }

    let concatenated: String = cleaned
        .split([' ', '_', '-'])
        .filter(|w| !w.is_empty())
        .map(title_case_word)
        .collect();

    match cat {
        "entity" => format!("Entity_{concatenated}"),
        "block" => format!("Block_{concatenated}"),
        "component" => format!("Component_{concatenated}"),
        "item" => format!("Item_{concatenated}"),
        // everything else is flat
        _ => concatenated,
    }
}

fn title_case_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut chars = word.chars().filter(|c| c.is_alphanumeric());
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.extend(chars);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_stack_resolves_via_the_default_rule() {
        assert_eq!(catalog_key("Item Stack", Some("item")), "Item_ItemStack");
    }

    #[test]
    fn category_prefixes() {
        assert_eq!(catalog_key("Chest", Some("block")), "Block_Chest");
        assert_eq!(catalog_key("Armor Stand", Some("entity")), "Entity_ArmorStand");
        assert_eq!(catalog_key("Attribute Modifiers", Some("component")), "Component_AttributeModifiers");
        assert_eq!(catalog_key("Raid", None), "Raid");
        assert_eq!(catalog_key("Raid", Some("other")), "Raid");
    }

    #[test]
    fn parentheticals_and_id_suffixes_are_stripped() {
        assert_eq!(catalog_key("Boat (entity)", Some("entity")), "Entity_Boat");
        assert_eq!(catalog_key("Chest minecraft:chest", Some("block")), "Block_Chest");
    }

    #[test]
    fn historical_exceptions_override_the_rule() {
        assert_eq!(catalog_key("Mooshroom", Some("entity")), "Entity_MushroomCow");
        assert_eq!(catalog_key("Snow Golem", Some("entity")), "Entity_SnowMan");
        // same name without the category uses the default rule
        assert_eq!(catalog_key("Snow Golem", None), "SnowGolem");
    }

    #[test]
    fn punctuation_inside_words_is_dropped() {
        assert_eq!(catalog_key("Jack o'Lantern", Some("item")), "Item_JackOLantern");
    }
}
