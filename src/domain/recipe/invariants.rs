use super::entity::Recipe;
use crate::domain::{DomainError, DomainResult};

/// Validates all Recipe invariants
pub fn validate_recipe(recipe: &Recipe) -> DomainResult<()> {
    if recipe.name.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Recipe name cannot be empty".to_string(),
        ));
    }
    validate_quantity("crafting time", recipe.crafting_time)?;

    for ingredient in &recipe.ingredients {
        validate_quantity("ingredient amount", ingredient.amount)?;
    }

    for product in &recipe.products {
        validate_quantity("product amount", product.amount_min)?;
        validate_quantity("product amount", product.amount_max)?;
        if product.amount_min > product.amount_max {
            return Err(DomainError::InvariantViolation(format!(
                "Product {} has minimum {} above maximum {}",
                product.item.name, product.amount_min, product.amount_max
            )));
        }
        if !(0.0..=1.0).contains(&product.probability) {
            return Err(DomainError::InvariantViolation(format!(
                "Product {} has probability {} outside [0, 1]",
                product.item.name, product.probability
            )));
        }
    }

    Ok(())
}

/// Quantities must be finite and non-negative
fn validate_quantity(label: &str, value: f64) -> DomainResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::InvariantViolation(format!(
            "Invalid {}: {}",
            label, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::Mode;
    use crate::domain::item::Item;
    use crate::domain::recipe::RecipeProduct;

    #[test]
    fn test_valid_recipe() {
        let recipe = Recipe::new("iron-gear-wheel", Mode::Normal, 0.5)
            .with_ingredient(Item::new("item", "iron-plate"), 2.0)
            .with_product(Item::new("item", "iron-gear-wheel"), 1.0);
        assert!(validate_recipe(&recipe).is_ok());
    }

    #[test]
    fn test_nan_crafting_time_fails() {
        let recipe = Recipe::new("broken", Mode::Normal, f64::NAN);
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_probability_out_of_range_fails() {
        let mut recipe = Recipe::new("uranium-processing", Mode::Normal, 12.0);
        recipe.products.push(RecipeProduct {
            item: Item::new("item", "uranium-235"),
            amount_min: 1.0,
            amount_max: 1.0,
            probability: 1.5,
        });
        assert!(validate_recipe(&recipe).is_err());
    }
}
