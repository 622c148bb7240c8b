//! Built-in catalog used on first start and whenever a catalog document is
//! missing or unreadable.

use super::{
    ArmorDefinition, ArmorSlot, AttachmentDefinition, RarityTier, SkinDefinition,
    WeaponDefinition, DEFAULT_SKIN_ID,
};

fn skin(id: &str, name: &str, cost: u64, rarity: RarityTier, tag: &str) -> SkinDefinition {
    SkinDefinition {
        id: id.to_string(),
        display_name: name.to_string(),
        cost,
        rarity,
        tag: tag.to_string(),
        image_url: String::new(),
    }
}

fn weapon(
    id: &str,
    name: &str,
    key: &str,
    cost: u64,
    rarity: RarityTier,
    extra_skins: Vec<SkinDefinition>,
) -> WeaponDefinition {
    let mut skins = vec![skin(DEFAULT_SKIN_ID, "Default", 0, RarityTier::Common, "")];
    skins.extend(extra_skins);
    WeaponDefinition {
        id: id.to_string(),
        display_name: name.to_string(),
        external_item_key: key.to_string(),
        base_cost: cost,
        rarity,
        default_skin_id: DEFAULT_SKIN_ID.to_string(),
        skins,
        image_url: String::new(),
    }
}

pub fn weapons() -> Vec<WeaponDefinition> {
    use RarityTier::*;
    vec![
        weapon(
            "ak47",
            "AK-47",
            "rifle.ak",
            500,
            Epic,
            vec![
                skin("3602286295", "Tempered AK47", 600, Epic, "HOT"),
                skin("3102802323", "Glory AK47", 800, Legendary, "NEW"),
                skin("2854463727", "Alien Red", 400, Rare, ""),
            ],
        ),
        weapon(
            "lr300",
            "LR-300",
            "rifle.lr300",
            500,
            Epic,
            vec![skin("2561668054", "Gold LR300", 800, Legendary, "POPULAR")],
        ),
        weapon(
            "m249",
            "M249",
            "lmg.m249",
            600,
            Legendary,
            vec![skin("2854146553", "Chrome M249", 600, Epic, "")],
        ),
        weapon(
            "mp5",
            "MP5A4",
            "smg.mp5",
            400,
            Rare,
            vec![skin("2561668055", "Tactical MP5", 400, Rare, "")],
        ),
        weapon(
            "thompson",
            "Thompson",
            "smg.thompson",
            400,
            Rare,
            vec![skin("2561668056", "Dragon Thompson", 600, Epic, "NEW")],
        ),
        weapon(
            "python",
            "Python Revolver",
            "pistol.python",
            300,
            Common,
            vec![skin("2561668057", "Black Python", 400, Rare, "")],
        ),
        weapon("bolt", "Bolt Action Rifle", "rifle.bolt", 550, Epic, vec![]),
        weapon("sarpistol", "Semi-Automatic Pistol", "pistol.semiauto", 250, Common, vec![]),
        weapon("custom", "Custom SMG", "smg.2", 350, Rare, vec![]),
        weapon("m39", "M39 Rifle", "rifle.m39", 450, Rare, vec![]),
    ]
}

pub fn armor() -> Vec<ArmorDefinition> {
    use ArmorSlot::*;
    use RarityTier::*;
    let piece = |id: &str, name: &str, slot, cost, rarity| ArmorDefinition {
        id: id.to_string(),
        display_name: name.to_string(),
        slot,
        cost,
        rarity,
        tag: String::new(),
        image_url: String::new(),
    };
    vec![
        piece("metal.facemask", "Metal Facemask", Head, 300, Common),
        piece("coffeecan.helmet", "Coffee Can Helmet", Head, 250, Common),
        piece("metal.plate.torso", "Metal Chest Plate", Chest, 400, Rare),
        piece("roadsign.jacket", "Road Sign Jacket", Chest, 300, Common),
        piece("heavy.plate.pants", "Heavy Plate Pants", Legs, 400, Rare),
        piece("roadsign.kilt", "Road Sign Kilt", Legs, 300, Common),
        piece("tactical.gloves", "Tactical Gloves", Hands, 200, Common),
        piece("shoes.boots", "Heavy Plate Boots", Feet, 250, Common),
    ]
}

pub fn attachments() -> Vec<AttachmentDefinition> {
    [
        ("silencer", "Silencer", "barrel"),
        ("extended_mag", "Extended Magazine", "magazine"),
        ("reflex", "Reflex Sight", "optic"),
    ]
    .into_iter()
    .map(|(id, name, slot)| AttachmentDefinition {
        id: id.to_string(),
        display_name: name.to_string(),
        slot: slot.to_string(),
    })
    .collect()
}
