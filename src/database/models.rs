pub mod hash_entry;
pub mod set_entry;
