// Built-in labels for delve containers that no rule file covers.

use lazy_static::lazy_static;
use regex::Regex;

use super::model::Annotation;
use crate::core::model::Rgba;

/// Containers beyond this range only show when they hold currency.
const FAR_DISTANCE: f32 = 100.0;

const CURRENCY: Rgba = Rgba::rgb(255, 0, 255);
const FLARES: Rgba = Rgba::rgb(0, 200, 255);
const EXPLOSIVES: Rgba = Rgba::rgb(255, 50, 50);

const LOW_VALUE: &[&str] = &["Generic", "Vein", "Flare", "Dynamite", "Armour", "Weapon"];

lazy_static! {
    // lowerUpper -> "lower Upper"
    static ref LOWER_UPPER: Regex = Regex::new(r"(\p{Ll})(\p{Lu})").expect("Invalid camel case regex");
    // XYz -> "X Yz", _Yz -> "_ Yz"
    static ref WORD_START: Regex = Regex::new(r"(\S)(\p{Lu}\p{Ll})").expect("Invalid word start regex");
}

/// Split a CamelCase identifier into words.
pub fn split_camel_case(name: &str) -> String {
    let spaced = LOWER_UPPER.replace_all(name, "$1 $2");
    WORD_START.replace_all(&spaced, "$1 $2").into_owned()
}

/// Human readable container name from its metadata path.
pub fn delve_chest_name(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    split_camel_case(file_name)
        .replace("Delve Chest ", "")
        .replace("Delve Azurite ", "Azurite ")
        .replace("Delve Mining Supplies ", "")
        .replace('_', "")
}

/// Label a delve container, or `None` if it is not worth showing.
pub fn classify_delve_chest(path: &str, distance: f32) -> Option<Annotation> {
    if !path.contains("Delve") {
        return None;
    }

    let name = delve_chest_name(path);
    if name.ends_with(" Encounter") || name.ends_with(" No Drops") {
        return None;
    }

    let low_value = LOW_VALUE.iter().any(|tag| name.contains(tag));
    let currency_cache = !name.contains("Path ") && name.contains("Currency");
    if distance > FAR_DISTANCE && low_value && !currency_cache {
        return None;
    }

    let mut color = Rgba::WHITE;
    if name.contains("Currency") || name.contains("Fossil") {
        color = CURRENCY;
    }
    if name.contains("Flares") {
        color = FLARES;
    }
    if name.contains("Dynamite") || name.contains("Explosives") {
        color = EXPLOSIVES;
    }

    Some(Annotation {
        text: name,
        color,
        sound: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_camel_case() {
        assert_eq!(split_camel_case("DelveChestCurrencyHighValue"), "Delve Chest Currency High Value");
        assert_eq!(split_camel_case("DelveChestPathXMLCache"), "Delve Chest Path XML Cache");
        assert_eq!(split_camel_case("Delve_Fossil"), "Delve_ Fossil");
    }

    #[test]
    fn test_chest_name_strips_prefixes() {
        assert_eq!(
            delve_chest_name("Metadata/Chests/DelveChests/DelveChestCurrencyHighValue"),
            "Currency High Value"
        );
        assert_eq!(
            delve_chest_name("Metadata/Chests/DelveChests/DelveAzuriteVeinLarge"),
            "Azurite Vein Large"
        );
        assert_eq!(
            delve_chest_name("Metadata/Chests/DelveChests/DelveMiningSuppliesFlares"),
            "Flares"
        );
    }

    #[test]
    fn test_non_delve_paths_are_ignored() {
        assert!(classify_delve_chest("Metadata/Chests/StrongBoxes/Arcanist", 10.0).is_none());
    }

    #[test]
    fn test_encounter_and_empty_chests_are_ignored() {
        assert!(classify_delve_chest("Metadata/Chests/DelveChests/DelveChestGenericEncounter", 10.0).is_none());
        assert!(classify_delve_chest("Metadata/Chests/DelveChests/DelveChestArmourNoDrops", 10.0).is_none());
    }

    #[test]
    fn test_accent_colors() {
        let fossil = classify_delve_chest("Metadata/Chests/DelveChests/DelveChestFossil", 10.0).unwrap();
        assert_eq!(fossil.color, CURRENCY);

        let flares = classify_delve_chest("Metadata/Chests/DelveChests/DelveMiningSuppliesFlares", 10.0).unwrap();
        assert_eq!(flares.color, FLARES);

        let boom = classify_delve_chest("Metadata/Chests/DelveChests/DelveMiningSuppliesDynamite", 10.0).unwrap();
        assert_eq!(boom.color, EXPLOSIVES);

        let armour = classify_delve_chest("Metadata/Chests/DelveChests/DelveChestArmourLarge", 10.0).unwrap();
        assert_eq!(armour.color, Rgba::WHITE);
    }

    #[test]
    fn test_far_low_value_chests_are_hidden() {
        let path = "Metadata/Chests/DelveChests/DelveChestArmourLarge";
        assert!(classify_delve_chest(path, 99.0).is_some());
        assert!(classify_delve_chest(path, 150.0).is_none());

        // Currency survives range, unless it sits on a side path.
        assert!(classify_delve_chest("Metadata/Chests/DelveChests/DelveChestGenericCurrency", 150.0).is_some());
        assert!(classify_delve_chest("Metadata/Chests/DelveChests/DelveChestPathGenericCurrency", 150.0).is_none());

        // Non low-value containers always show.
        assert!(classify_delve_chest("Metadata/Chests/DelveChests/DelveChestFossil", 500.0).is_some());
    }
}
