/// Texture manager: descriptors, the shared texture resource, file decoding
/// and the creation path used by every device profile.

mod texture;
mod decoded;
pub(crate) mod loader;
pub mod container;
pub mod raster;

pub use texture::{SamplerDesc, Texture, TextureDesc, TextureHandle, TextureInfo};
pub use decoded::{DecodedImage, DecodedTexture};
