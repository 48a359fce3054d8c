use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::content::{ContentEntity, ContentKind, Mode};
use crate::domain::item::{Item, ITEM_REFERENCE_FIELDS};
use crate::identity::{FieldEntry, FieldValue, Identifiable};

/// A researchable technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    /// Content-derived identifier
    pub id: Uuid,

    pub name: String,

    pub mode: Mode,

    /// Number of research units
    pub count: i64,

    /// Formula for infinite technologies, replaces `count` when set
    pub count_formula: Option<String>,

    /// Seconds per research unit
    pub time: f64,

    pub level: u32,

    pub max_level: u32,

    /// Science packs consumed per unit, in declaration order
    pub ingredients: Vec<TechnologyIngredient>,

    /// Free text, not part of the identity
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyIngredient {
    pub item: Item,
    pub amount: f64,
}

impl Technology {
    pub fn new(name: impl Into<String>, mode: Mode, count: i64, time: f64) -> Self {
        Self {
            id: Uuid::nil(),
            name: name.into(),
            mode,
            count,
            count_formula: None,
            time,
            level: 1,
            max_level: 1,
            ingredients: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_count_formula(mut self, formula: impl Into<String>) -> Self {
        self.count_formula = Some(formula.into());
        self
    }

    pub fn with_levels(mut self, level: u32, max_level: u32) -> Self {
        self.level = level;
        self.max_level = max_level;
        self
    }

    pub fn with_ingredient(mut self, item: Item, amount: f64) -> Self {
        self.ingredients.push(TechnologyIngredient { item, amount });
        self
    }
}

impl Identifiable for Technology {
    fn fields(&self) -> Vec<FieldEntry<'_>> {
        vec![
            FieldEntry::marked("name", (&self.name).into()),
            FieldEntry::marked("mode", self.mode.as_str().into()),
            FieldEntry::marked("count", self.count.into()),
            FieldEntry::marked(
                "countFormula",
                FieldValue::optional_text(self.count_formula.as_deref()),
            ),
            FieldEntry::marked("time", FieldValue::fixed(self.time)),
            FieldEntry::marked("level", self.level.into()),
            FieldEntry::marked("maxLevel", self.max_level.into()),
            FieldEntry::marked("ingredients", FieldValue::sequence(&self.ingredients)),
            FieldEntry::unmarked("description", (&self.description).into()),
        ]
    }
}

impl Identifiable for TechnologyIngredient {
    fn fields(&self) -> Vec<FieldEntry<'_>> {
        vec![
            FieldEntry::restricted("item", FieldValue::nested(&self.item), ITEM_REFERENCE_FIELDS),
            FieldEntry::marked("amount", FieldValue::fixed(self.amount)),
        ]
    }
}

impl ContentEntity for Technology {
    const KIND: ContentKind = ContentKind::Technology;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}
