//! Scene file I/O for rigged character meshes.
//!
//! This crate loads and saves a [`SceneContext`](mesh_scene::SceneContext) as **binary glTF** (GLB):
//! skins become armatures, triangle primitives become mesh objects, and
//! materials, textures and embedded images are carried through unchanged.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_glb, save_glb};
//!
//! let mut scene = load_glb("base_models/female.glb").unwrap();
//! scene.bake_skins().unwrap();
//! scene.discard_armatures();
//! save_glb(&scene, "generated_models/alice/static.glb").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod export;
mod import;

pub use error::{IoError, IoResult};
pub use export::{save_glb, write_glb};
pub use import::{load_glb, read_glb};
