//! Object picking.
//!
//! Renderables with geometry receive a 1-based name from [`PickMap`]. The
//! pick pass writes names into an `R32Uint` target; [`PickReadback`] reads
//! back the pixel under the cursor and the map resolves it to an
//! [`ObjectId`](crate::scene::ObjectId).

mod pick_map;
mod readback;

pub use pick_map::PickMap;
pub use readback::PickReadback;
