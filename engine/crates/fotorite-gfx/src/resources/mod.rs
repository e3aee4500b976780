pub mod buffer;
pub mod handles;
pub mod image;
pub mod memory;
pub mod pool;
pub mod resource_state;
pub mod usage;
