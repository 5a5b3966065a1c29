pub mod inventory_lot;
pub mod inventory_movement;
pub mod inventory_record;
