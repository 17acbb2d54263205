//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod contact;
pub mod content;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod user;

// Re-export specific types to avoid conflicts
pub use contact::{Column as ContactColumn, Entity as Contact, Model as ContactModel};
pub use content::{Column as ContentColumn, Entity as Content, Model as ContentModel};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
