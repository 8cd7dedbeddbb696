//! Scoped ownership of foreign handles
//!
//! Foreign libraries such as SDL hand out resources as nullable handles that
//! must be passed to a matching destroy function exactly once. Every such
//! resource differs only in its handle type and its destroy function, so a
//! single generic guard covers all of them:
//!
//! ```rust
//! use lp3_core::define_resource;
//! use lp3_core::resource::ResourceGuard;
//!
//! fn destroy_font(_id: u32) {}
//!
//! define_resource!(
//!     /// Owned font id
//!     pub Font, FontDeleter, u32, destroy_font
//! );
//!
//! let font: Font = ResourceGuard::new(7).unwrap();
//! assert_eq!(font.get(), 7);
//! ```
//!
//! A null handle fails construction with
//! [`ResourceError::CreationFailed`]. Misuse that would otherwise leak or
//! double-free (reading an empty guard, overwriting a live one, releasing
//! twice) is reported as a [`GuardStateViolation`] and panics.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{GuardStateViolation, ResourceError};

/// A value handed out by a foreign library that may be null
pub trait ForeignHandle: Copy {
    /// Whether this handle refers to no resource
    fn is_null(&self) -> bool;
}

impl<T> ForeignHandle for *mut T {
    fn is_null(&self) -> bool {
        <*mut T>::is_null(*self)
    }
}

impl<T> ForeignHandle for *const T {
    fn is_null(&self) -> bool {
        <*const T>::is_null(*self)
    }
}

impl<T: Copy> ForeignHandle for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

macro_rules! impl_integer_handle {
    ($($ty:ty),*) => {
        $(
            impl ForeignHandle for $ty {
                fn is_null(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

impl_integer_handle!(u8, u16, u32, u64, usize);

/// Destroy function paired with a handle type
pub trait Deleter<H> {
    /// Human readable resource kind, used in diagnostics
    const KIND: &'static str = "resource";

    /// Release the handle. Called exactly once per live handle.
    fn delete(handle: H);

    /// Last error reported by the foreign library
    ///
    /// Queried only when a factory returned a null handle.
    fn last_error() -> Option<String> {
        None
    }
}

/// Move-only owner of zero or one foreign handle
///
/// A live guard always holds a handle that was non-null when the guard was
/// built, and dropping it calls `D::delete` exactly once.
pub struct ResourceGuard<H: ForeignHandle, D: Deleter<H>> {
    handle: Option<H>,
    _deleter: PhantomData<D>,
}

impl<H: ForeignHandle, D: Deleter<H>> ResourceGuard<H, D> {
    /// Take ownership of a handle returned by a foreign factory
    ///
    /// # Errors
    /// Returns [`ResourceError::CreationFailed`] if `raw` is null. The failure
    /// is logged at `Error` level first.
    pub fn new(raw: H) -> Result<Self, ResourceError> {
        if raw.is_null() {
            let diagnostic = D::last_error();
            match &diagnostic {
                Some(message) => crate::lp3_log_error!("Couldn't create %s: %s", D::KIND, message),
                None => crate::lp3_log_error!("Couldn't create %s", D::KIND),
            }
            return Err(ResourceError::CreationFailed { kind: D::KIND, diagnostic });
        }

        Ok(Self { handle: Some(raw), _deleter: PhantomData })
    }

    /// Create a guard that owns nothing
    pub const fn empty() -> Self {
        Self { handle: None, _deleter: PhantomData }
    }

    /// Whether the guard currently owns no handle
    pub const fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    /// The owned handle
    ///
    /// # Panics
    /// Panics with [`GuardStateViolation::AccessOnEmpty`] if the guard is empty.
    #[track_caller]
    pub fn get(&self) -> H {
        match self.handle {
            Some(handle) => handle,
            None => violation(GuardStateViolation::AccessOnEmpty { kind: D::KIND }),
        }
    }

    /// The owned handle, or `None` for an empty guard
    pub const fn try_get(&self) -> Option<H> {
        self.handle
    }

    /// Move the handle out into a new guard, leaving this one empty
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self { handle: self.handle.take(), _deleter: PhantomData }
    }

    /// Move `other` into this guard
    ///
    /// # Panics
    /// Panics with [`GuardStateViolation::AssignIntoLive`] if this guard still
    /// owns a handle. Release it first with [`destroy`](Self::destroy).
    #[track_caller]
    pub fn assign(&mut self, mut other: Self) {
        if self.handle.is_some() {
            violation(GuardStateViolation::AssignIntoLive { kind: D::KIND });
        }
        self.handle = other.handle.take();
    }

    /// Release the handle now instead of at scope exit
    ///
    /// # Panics
    /// Panics with [`GuardStateViolation::DoubleRelease`] if the guard is
    /// already empty.
    #[track_caller]
    pub fn destroy(&mut self) {
        match self.handle.take() {
            Some(handle) => D::delete(handle),
            None => violation(GuardStateViolation::DoubleRelease { kind: D::KIND }),
        }
    }
}

impl<H: ForeignHandle, D: Deleter<H>> Default for ResourceGuard<H, D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<H: ForeignHandle, D: Deleter<H>> Drop for ResourceGuard<H, D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            D::delete(handle);
        }
    }
}

impl<H: ForeignHandle + fmt::Debug, D: Deleter<H>> fmt::Debug for ResourceGuard<H, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("kind", &D::KIND)
            .field("handle", &self.handle)
            .finish()
    }
}

#[cold]
#[track_caller]
fn violation(state: GuardStateViolation) -> ! {
    crate::lp3_log_critical!(state.to_string());
    panic!("{state}");
}

/// Declare a deleter type and a guard alias for one foreign resource kind
///
/// ```rust
/// # fn sdl_destroy_window(_: *mut u8) {}
/// # fn sdl_get_error() -> Option<String> { None }
/// lp3_core::define_resource!(
///     /// Owned SDL window
///     pub Window, WindowDeleter, *mut u8, sdl_destroy_window,
///     last_error = sdl_get_error
/// );
/// ```
#[macro_export]
macro_rules! define_resource {
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident, $deleter:ident, $handle:ty, $destroy:path
        $(, last_error = $last_error:path)? $(,)?
    ) => {
        #[doc = concat!("Deleter for [`", stringify!($name), "`]")]
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $deleter;

        impl $crate::resource::Deleter<$handle> for $deleter {
            const KIND: &'static str = stringify!($name);

            fn delete(handle: $handle) {
                $destroy(handle);
            }

            $(
                fn last_error() -> ::std::option::Option<::std::string::String> {
                    $last_error()
                }
            )?
        }

        $(#[$meta])*
        $vis type $name = $crate::resource::ResourceGuard<$handle, $deleter>;
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serial;
    use std::cell::RefCell;

    thread_local! {
        static DELETED: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
        static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
    }

    fn destroy_texture(id: u32) {
        DELETED.with(|deleted| deleted.borrow_mut().push(id));
    }

    fn texture_error() -> Option<String> {
        LAST_ERROR.with(|error| error.borrow().clone())
    }

    fn deleted() -> Vec<u32> {
        DELETED.with(|deleted| deleted.borrow().clone())
    }

    define_resource!(Texture, TextureDeleter, u32, destroy_texture, last_error = texture_error);

    #[test]
    fn test_access_returns_owned_handle_and_drop_deletes_once() {
        {
            let texture = Texture::new(42).unwrap();
            assert!(!texture.is_empty());
            assert_eq!(texture.get(), 42);
            assert!(deleted().is_empty());
        }
        assert_eq!(deleted(), vec![42]);
    }

    #[test]
    fn test_null_handle_fails_without_deleting() {
        let _lock = serial();
        LAST_ERROR.with(|error| *error.borrow_mut() = None);

        let err = Texture::new(0).unwrap_err();

        assert_eq!(err, ResourceError::CreationFailed { kind: "Texture", diagnostic: None });
        assert!(deleted().is_empty());
    }

    #[test]
    #[cfg(not(feature = "log-disable"))]
    fn test_null_handle_logs_diagnostic_before_failing() {
        use crate::logging::{LogLevel, LogSystem, MemorySink};

        let _lock = serial();
        let sink = MemorySink::new();
        let _log = LogSystem::builder().level(LogLevel::Debug).sink(sink.clone()).build();
        LAST_ERROR.with(|error| *error.borrow_mut() = Some("out of memory".to_string()));

        let err = Texture::new(0).unwrap_err();

        assert_eq!(err.diagnostic(), Some("out of memory"));
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Error);
        assert_eq!(records[0].message, "Couldn't create Texture: out of memory");
        assert!(deleted().is_empty());
    }

    #[test]
    fn test_move_transfers_ownership_without_double_delete() {
        let mut first = Texture::new(7).unwrap();
        let second = first.take();

        assert!(first.is_empty());
        assert_eq!(first.try_get(), None);
        assert_eq!(second.get(), 7);

        drop(first);
        assert!(deleted().is_empty());
        drop(second);
        assert_eq!(deleted(), vec![7]);
    }

    #[test]
    fn test_native_move_keeps_single_owner() {
        let texture = Texture::new(3).unwrap();
        let moved = texture;
        assert_eq!(moved.get(), 3);
        drop(moved);
        assert_eq!(deleted(), vec![3]);
    }

    #[test]
    fn test_assign_into_empty_guard() {
        let mut slot = Texture::default();
        assert!(slot.is_empty());

        slot.assign(Texture::new(9).unwrap());

        assert_eq!(slot.get(), 9);
        assert!(deleted().is_empty());
        drop(slot);
        assert_eq!(deleted(), vec![9]);
    }

    #[test]
    fn test_destroy_releases_early() {
        let mut texture = Texture::new(5).unwrap();
        texture.destroy();
        assert!(texture.is_empty());
        assert_eq!(deleted(), vec![5]);

        drop(texture);
        assert_eq!(deleted(), vec![5]);
    }

    #[test]
    fn test_empty_guard_drop_is_noop() {
        drop(Texture::empty());
        assert!(deleted().is_empty());
    }

    #[test]
    fn test_pointer_handles_check_null() {
        let value = 1_u8;
        let live: *const u8 = &value;
        assert!(!ForeignHandle::is_null(&live));
        assert!(ForeignHandle::is_null(&std::ptr::null_mut::<u8>()));
        assert!(ForeignHandle::is_null(&None::<u32>));
    }

    #[test]
    #[should_panic(expected = "Texture guard accessed while empty")]
    fn test_access_on_empty_guard_panics() {
        let _lock = serial();
        let _ = Texture::empty().get();
    }

    #[test]
    #[should_panic(expected = "Texture guard assigned while still holding a live handle")]
    fn test_assign_into_live_guard_panics() {
        let _lock = serial();
        let mut slot = Texture::new(1).unwrap();
        slot.assign(Texture::new(2).unwrap());
    }

    #[test]
    #[should_panic(expected = "Texture guard released twice")]
    fn test_double_release_panics() {
        let _lock = serial();
        let mut texture = Texture::new(4).unwrap();
        texture.destroy();
        texture.destroy();
    }
}
