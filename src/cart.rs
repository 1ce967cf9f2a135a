//! In-memory shopping cart.
//!
//! A cart is an ordered list of [`CartItem`] lines addressed by book id. It never
//! holds two lines for the same book and never holds a line with quantity below 1.
//! Persistence lives in [`crate::services::cart_service`], which loads the cart from
//! the session, applies one operation and writes it back.

use rust_decimal::Decimal;

use crate::models::{Book, CartItem};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from stored lines, folding duplicates and dropping empty lines.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            if item.quantity <= 0 {
                continue;
            }
            match cart.line_mut(item.book_id) {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => cart.items.push(item),
            }
        }
        cart
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, book_id: i32) -> Option<&CartItem> {
        self.items.iter().find(|item| item.book_id == book_id)
    }

    /// Add `quantity` copies of `book`. An existing line is incremented (saturating
    /// at `max_quantity`); otherwise a new line snapshots the book's title, author,
    /// price and image.
    pub fn add(&mut self, book: &Book, quantity: i32, max_quantity: i32) -> &CartItem {
        let quantity = quantity.clamp(1, max_quantity.max(1));
        let index = match self.items.iter().position(|item| item.book_id == book.id) {
            Some(index) => {
                let line = &mut self.items[index];
                line.quantity = line.quantity.saturating_add(quantity).min(max_quantity.max(1));
                index
            }
            None => {
                self.items.push(CartItem {
                    book_id: book.id,
                    title: book.title.clone(),
                    author: book.author.clone(),
                    price: book.price,
                    quantity,
                    image_url: book.image_url.clone(),
                });
                self.items.len() - 1
            }
        };
        &self.items[index]
    }

    /// Returns whether a line was removed.
    pub fn remove(&mut self, book_id: i32) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.book_id != book_id);
        self.items.len() != before
    }

    /// Set the quantity of an existing line. Zero or less removes the line; values
    /// above `max_quantity` are clamped. Returns whether a line was touched.
    pub fn set_quantity(&mut self, book_id: i32, quantity: i32, max_quantity: i32) -> bool {
        if quantity <= 0 {
            return self.remove(book_id);
        }
        match self.line_mut(book_id) {
            Some(line) => {
                line.quantity = quantity.min(max_quantity.max(1));
                true
            }
            None => false,
        }
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of copies across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn line_mut(&mut self, book_id: i32) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.book_id == book_id)
    }
}
