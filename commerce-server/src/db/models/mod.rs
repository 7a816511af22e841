//! Database models

pub mod cart;
pub mod cart_item;
pub mod product;

pub use cart::{Cart, CartDetail, CartId, CartStatus, CartUpdate};
pub use cart_item::{CartItem, CartItemCreate, CartItemDetail, CartItemId, CartItemUpdate};
pub use product::{Category, Product, ProductCreate, ProductId, ProductUpdate};
