//! Sample recipes used to seed demo instances and as a test fixture.
//!
//! Records are ordered newest first: record `i` was created `i` hours before
//! `base_time`, and ids are fixed so listings are fully reproducible.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::id::{RecipeId, UserId};
use crate::recipe::{Ingredient, Recipe, RecipeContent, Visibility};

struct Seed {
    owner: usize,
    title: &'static str,
    notes: &'static str,
    tags: &'static [&'static str],
    public: bool,
    vegetarian: bool,
    link: Option<&'static str>,
}

const SEEDS: &[Seed] = &[
    Seed { owner: 0, title: "Weeknight Tomato Soup", notes: "Blend until smooth.", tags: &["soup", "quick", "winter"], public: true, vegetarian: true, link: None },
    Seed { owner: 1, title: "Beef Stew", notes: "Slow cooker friendly.", tags: &["stew", "winter"], public: true, vegetarian: false, link: None },
    Seed { owner: 0, title: "Grandma's Apple Pie", notes: "Use tart apples.", tags: &["dessert", "baking"], public: false, vegetarian: true, link: None },
    Seed { owner: 1, title: "Shoyu Ramen", notes: "", tags: &["soup", "noodles"], public: true, vegetarian: false, link: Some("https://example.com/ramen") },
    Seed { owner: 0, title: "Overnight Oats", notes: "No cooking needed.", tags: &["breakfast", "quick"], public: true, vegetarian: true, link: None },
    Seed { owner: 1, title: "Secret BBQ Rub", notes: "Do not share.", tags: &["bbq"], public: false, vegetarian: false, link: None },
    Seed { owner: 0, title: "Shakshuka", notes: "Eggs poached in tomato sauce.", tags: &["breakfast", "eggs"], public: true, vegetarian: true, link: Some("https://example.com/shakshuka") },
    Seed { owner: 1, title: "Lentil Soup", notes: "Hearty and quick.", tags: &["soup", "quick"], public: true, vegetarian: true, link: None },
    Seed { owner: 0, title: "Chicken Curry", notes: "Weeknight staple.", tags: &["curry", "winter"], public: false, vegetarian: false, link: Some("https://example.com/curry") },
    Seed { owner: 1, title: "Sourdough Loaf", notes: "Long ferment.", tags: &["baking", "bread"], public: true, vegetarian: true, link: None },
];

/// Returns the ten sample recipes, alternating between the two owners.
#[must_use]
pub fn sample_recipes(owner_a: &UserId, owner_b: &UserId, base_time: DateTime<Utc>) -> Vec<Recipe> {
    SEEDS
        .iter()
        .zip(0_u32..)
        .map(|(seed, i)| {
            let created_at = base_time - Duration::hours(i64::from(i));
            let content = match seed.link {
                Some(url) => RecipeContent::Link { url: url.to_owned() },
                None => RecipeContent::Homemade {
                    ingredients: vec![
                        Ingredient { name: "salt".to_owned(), quantity: Some("1 pinch".to_owned()) },
                        Ingredient { name: "water".to_owned(), quantity: None },
                    ],
                    instructions: vec![format!("Make the {}.", seed.title.to_lowercase())],
                    servings: Some(4),
                    prep_minutes: Some(30),
                },
            };
            Recipe {
                id: RecipeId(Uuid::from_u128(0x5eed_0000 + u128::from(i))),
                owner: if seed.owner == 0 { owner_a.clone() } else { owner_b.clone() },
                title: seed.title.to_owned(),
                notes: seed.notes.to_owned(),
                tags: seed.tags.iter().map(|t| (*t).to_owned()).collect(),
                visibility: if seed.public { Visibility::Public } else { Visibility::Private },
                vegetarian: seed.vegetarian,
                content,
                image: None,
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}
