pub mod inventory_item;
pub mod pending_change;
