use thiserror::Error;

use crate::models::{CartLine, CartRecord, Product};

#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    #[error("quantity must be a positive integer")]
    InvalidQuantity,
    #[error("product {id} is not in the cart")]
    UnknownProduct { id: String },
}

/// In-memory cart. Lines keep the insertion order of their first add, and a
/// product id never appears on more than one line.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product: Product, quantity: u32) -> Result<&CartLine, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let position = match self.position(&product.id) {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::InvalidQuantity)?;
                index
            }
            None => {
                self.lines.push(CartLine { product, quantity });
                self.lines.len() - 1
            }
        };

        Ok(&self.lines[position])
    }

    /// Set the quantity of an existing line. Zero removes the line, matching
    /// [`CartStore::remove`] including its absent-id no-op.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }

        match self.position(product_id) {
            Some(index) => {
                self.lines[index].quantity = quantity;
                Ok(())
            }
            None => Err(CartError::UnknownProduct {
                id: product_id.to_string(),
            }),
        }
    }

    /// Remove a line. Returns whether it was present; an absent id leaves the
    /// cart unchanged.
    pub fn remove(&mut self, product_id: &str) -> bool {
        match self.position(product_id) {
            Some(index) => {
                self.lines.remove(index);
                true
            }
            None => false,
        }
    }

    /// Sum of unit price times quantity, in the base currency.
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities across lines (the badge number, not the line count).
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn load(&mut self, record: CartRecord) {
        self.lines = record.items;
    }

    pub fn snapshot(&self) -> CartRecord {
        CartRecord {
            items: self.lines.clone(),
            saved_at: chrono::Utc::now(),
        }
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.product.id == product_id)
    }
}
