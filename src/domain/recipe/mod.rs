pub mod entity;
pub mod invariants;

pub use entity::{Recipe, RecipeIngredient, RecipeProduct};
pub use invariants::validate_recipe;
