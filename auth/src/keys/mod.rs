pub mod errors;
pub mod material;

pub use errors::KeyLoadError;
pub use material::KeyMaterial;
pub use material::KeySource;
pub use material::SigningAlgorithm;
