pub mod binding;
pub mod descriptor_pool;
pub mod sampler;
pub mod write_descriptor_set;
