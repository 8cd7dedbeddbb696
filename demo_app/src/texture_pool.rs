//! Stand-in for a foreign texture API
//!
//! Hands out integer texture ids from a fixed number of slots, returns `0`
//! when none are free and reports why through `last_error`, the way SDL's
//! factories and `SDL_GetError` do.

use std::cell::RefCell;

use lp3_core::define_resource;

thread_local! {
    static POOL: RefCell<Pool> = const { RefCell::new(Pool::new()) };
}

const SLOTS: usize = 4;

struct Pool {
    used: [bool; SLOTS],
    last_error: Option<String>,
}

impl Pool {
    const fn new() -> Self {
        Self { used: [false; SLOTS], last_error: None }
    }
}

/// Reserve a texture of the given size, returning its id or `0`
pub fn create(width: u32, height: u32) -> u32 {
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        if width == 0 || height == 0 {
            pool.last_error = Some(format!("invalid texture size {width}x{height}"));
            return 0;
        }
        match pool.used.iter().position(|used| !used) {
            Some(slot) => {
                pool.used[slot] = true;
                u32::try_from(slot + 1).unwrap_or(0)
            }
            None => {
                pool.last_error = Some("out of memory".to_string());
                0
            }
        }
    })
}

/// Free a texture id
pub fn destroy(id: u32) {
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        let Some(slot) = usize::try_from(id).ok().and_then(|id| id.checked_sub(1)) else {
            return;
        };
        if let Some(used) = pool.used.get_mut(slot) {
            *used = false;
        }
    });
    log::debug!("released texture {}", id);
}

/// Why the last `create` returned `0`
pub fn last_error() -> Option<String> {
    POOL.with(|pool| pool.borrow().last_error.clone())
}

/// Number of textures currently reserved
pub fn live_count() -> usize {
    POOL.with(|pool| pool.borrow().used.iter().filter(|used| **used).count())
}

define_resource!(
    /// Owned texture id
    pub Texture, TextureDeleter, u32, destroy, last_error = last_error
);
