//! Seed catalog loaded into an empty store.

use chrono::{DateTime, Utc};

use binder_core::{CardCondition, CategoryId, Money, ProductId};

use crate::models::{Category, Product};

/// Default browsing categories.
#[must_use]
pub fn categories() -> Vec<Category> {
    [
        ("singles", "Singles", "Individual cards graded by condition"),
        ("holo-rares", "Holo Rares", "Holographic and foil rares"),
        ("sealed", "Sealed Product", "Booster packs, boxes and decks"),
        ("supplies", "Supplies", "Sleeves, binders and deck boxes"),
    ]
    .into_iter()
    .map(|(id, name, description)| Category {
        id: CategoryId::new(id),
        name: name.to_owned(),
        description: description.to_owned(),
    })
    .collect()
}

struct SeedProduct {
    id: &'static str,
    sku: &'static str,
    title: &'static str,
    category: &'static str,
    rarity: &'static str,
    condition: CardCondition,
    cents: i64,
    stock: u32,
    description: &'static str,
    tags: &'static [&'static str],
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        id: "ember-drake-001",
        sku: "EMB-001-NM",
        title: "Ember Drake",
        category: "holo-rares",
        rarity: "Holo Rare",
        condition: CardCondition::NearMint,
        cents: 12_999,
        stock: 2,
        description: "First edition holo with a centered print.",
        tags: &["holo", "fire", "first-edition"],
    },
    SeedProduct {
        id: "tidecaller-014",
        sku: "TDC-014-LP",
        title: "Tidecaller Adept",
        category: "singles",
        rarity: "Rare",
        condition: CardCondition::LightlyPlayed,
        cents: 1_850,
        stock: 4,
        description: "Light edge wear, clean surface.",
        tags: &["water", "rare"],
    },
    SeedProduct {
        id: "thornback-033",
        sku: "THB-033-NM",
        title: "Thornback Sentinel",
        category: "singles",
        rarity: "Uncommon",
        condition: CardCondition::NearMint,
        cents: 349,
        stock: 12,
        description: "Staple defensive uncommon.",
        tags: &["grass", "uncommon"],
    },
    SeedProduct {
        id: "voltling-058",
        sku: "VLT-058-MP",
        title: "Voltling",
        category: "singles",
        rarity: "Common",
        condition: CardCondition::ModeratelyPlayed,
        cents: 99,
        stock: 30,
        description: "Played copy, great for decks.",
        tags: &["lightning", "common"],
    },
    SeedProduct {
        id: "shadow-regent-007",
        sku: "SHR-007-HP",
        title: "Shadow Regent",
        category: "holo-rares",
        rarity: "Secret Rare",
        condition: CardCondition::HeavilyPlayed,
        cents: 4_500,
        stock: 1,
        description: "Heavy creasing on the back, front holo intact.",
        tags: &["holo", "dark", "secret-rare"],
    },
    SeedProduct {
        id: "booster-pack-origins",
        sku: "BST-ORIGINS",
        title: "Origins Booster Pack",
        category: "sealed",
        rarity: "Sealed",
        condition: CardCondition::NearMint,
        cents: 499,
        stock: 48,
        description: "Ten cards per pack, one guaranteed rare.",
        tags: &["sealed", "booster"],
    },
    SeedProduct {
        id: "booster-box-origins",
        sku: "BOX-ORIGINS",
        title: "Origins Booster Box",
        category: "sealed",
        rarity: "Sealed",
        condition: CardCondition::NearMint,
        cents: 14_400,
        stock: 3,
        description: "Thirty-six factory-sealed packs.",
        tags: &["sealed", "box"],
    },
    SeedProduct {
        id: "binder-9-pocket",
        sku: "SUP-BINDER-9",
        title: "9-Pocket Collector Binder",
        category: "supplies",
        rarity: "Supply",
        condition: CardCondition::NearMint,
        cents: 2_499,
        stock: 15,
        description: "Side-loading pages, holds 360 cards.",
        tags: &["binder", "storage"],
    },
];

/// The seed catalog, timestamped `now`.
#[must_use]
pub fn products(now: DateTime<Utc>) -> Vec<Product> {
    SEED_PRODUCTS
        .iter()
        .map(|seed| Product {
            id: ProductId::new(seed.id),
            sku: seed.sku.to_owned(),
            title: seed.title.to_owned(),
            category_id: CategoryId::new(seed.category),
            rarity: seed.rarity.to_owned(),
            condition: seed.condition,
            images: vec![format!("/images/cards/{}.webp", seed.id)],
            price: Money::from_cents(seed.cents),
            stock: seed.stock,
            description: seed.description.to_owned(),
            tags: seed.tags.iter().map(|t| (*t).to_owned()).collect(),
            created_at: now,
            updated_at: now,
        })
        .collect()
}
