pub mod material;
pub mod model;
pub mod shader;
pub mod technique;
pub mod texture;
