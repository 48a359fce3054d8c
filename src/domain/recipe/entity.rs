use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::category::Category;
use crate::domain::content::{ContentEntity, ContentKind, Mode};
use crate::domain::item::{Item, ITEM_REFERENCE_FIELDS};
use crate::identity::{FieldEntry, FieldValue, Identifiable};

/// Category fields a recipe pulls into its identity.
const CATEGORY_REFERENCE_FIELDS: &[&str] = &["type", "name"];

/// A crafting recipe.
///
/// Ingredients and products are ordered; their positions are part of the
/// recipe's identity and are persisted as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Content-derived identifier
    pub id: Uuid,

    pub name: String,

    pub mode: Mode,

    /// Crafting time in seconds
    pub crafting_time: f64,

    pub category: Option<Category>,

    pub ingredients: Vec<RecipeIngredient>,

    pub products: Vec<RecipeProduct>,

    /// Free text, not part of the identity
    pub description: String,
}

/// One ingredient of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub item: Item,
    pub amount: f64,
}

/// One product of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeProduct {
    pub item: Item,
    pub amount_min: f64,
    pub amount_max: f64,
    pub probability: f64,
}

impl Recipe {
    /// Create a new recipe without ingredients or products.
    /// Call `identified()` once the recipe is fully built.
    pub fn new(name: impl Into<String>, mode: Mode, crafting_time: f64) -> Self {
        Self {
            id: Uuid::nil(),
            name: name.into(),
            mode,
            crafting_time,
            category: None,
            ingredients: Vec::new(),
            products: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_ingredient(mut self, item: Item, amount: f64) -> Self {
        self.ingredients.push(RecipeIngredient { item, amount });
        self
    }

    pub fn with_product(mut self, item: Item, amount: f64) -> Self {
        self.products.push(RecipeProduct::fixed(item, amount));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Every item the recipe references, ingredients first.
    pub fn referenced_items(&self) -> impl Iterator<Item = &Item> {
        self.ingredients
            .iter()
            .map(|i| &i.item)
            .chain(self.products.iter().map(|p| &p.item))
    }
}

impl RecipeProduct {
    /// A product with a fixed amount and full probability.
    pub fn fixed(item: Item, amount: f64) -> Self {
        Self {
            item,
            amount_min: amount,
            amount_max: amount,
            probability: 1.0,
        }
    }
}

impl Identifiable for Recipe {
    fn fields(&self) -> Vec<FieldEntry<'_>> {
        vec![
            FieldEntry::marked("name", (&self.name).into()),
            FieldEntry::marked("mode", self.mode.as_str().into()),
            FieldEntry::marked("craftingTime", FieldValue::fixed(self.crafting_time)),
            FieldEntry::restricted(
                "category",
                FieldValue::optional_nested(self.category.as_ref()),
                CATEGORY_REFERENCE_FIELDS,
            ),
            FieldEntry::marked("ingredients", FieldValue::sequence(&self.ingredients)),
            FieldEntry::marked("products", FieldValue::sequence(&self.products)),
            FieldEntry::unmarked("description", (&self.description).into()),
        ]
    }
}

impl Identifiable for RecipeIngredient {
    fn fields(&self) -> Vec<FieldEntry<'_>> {
        vec![
            FieldEntry::restricted("item", FieldValue::nested(&self.item), ITEM_REFERENCE_FIELDS),
            FieldEntry::marked("amount", FieldValue::fixed(self.amount)),
        ]
    }
}

impl Identifiable for RecipeProduct {
    fn fields(&self) -> Vec<FieldEntry<'_>> {
        vec![
            FieldEntry::restricted("item", FieldValue::nested(&self.item), ITEM_REFERENCE_FIELDS),
            FieldEntry::marked("amountMin", FieldValue::fixed(self.amount_min)),
            FieldEntry::marked("amountMax", FieldValue::fixed(self.amount_max)),
            FieldEntry::marked("probability", FieldValue::fixed(self.probability)),
        ]
    }
}

impl ContentEntity for Recipe {
    const KIND: ContentKind = ContentKind::Recipe;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}
