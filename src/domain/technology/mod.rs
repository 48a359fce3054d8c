pub mod entity;
pub mod invariants;

pub use entity::{Technology, TechnologyIngredient};
pub use invariants::validate_technology;
