//! Android launcher assets: density-bucketed mipmap icons cut out of a logo,
//! and TV banners.

pub mod banner;
pub mod error;
pub mod mipmap;

pub use banner::{BANNER_HEIGHT, BANNER_WIDTH, resize_banner};
pub use error::AssetError;
pub use mipmap::{DENSITIES, MipmapOptions, generate_mipmaps, remove_dark_background};
