//! The class trail attached to errors under the `debug` feature.
//!
//! While an object is built or dumped, the names of the schemas being
//! processed are kept on a thread-local stack. The first error leaving a
//! field is wrapped in [`PropertyError::Traced`] with the current trail,
//! e.g. `Workflow -> Predictor -> Descriptor`.
//!
//! Without the feature, or in release builds, this module compiles to
//! nothing.

#[cfg(all(debug_assertions, feature = "debug"))]
mod inner {
    use alloc::boxed::Box;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::PropertyError;

    std::thread_local! {
        static TRAIL: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    /// Pops the trail entry when dropped.
    pub(crate) struct TrailGuard(());

    impl Drop for TrailGuard {
        #[inline]
        fn drop(&mut self) {
            TRAIL.with_borrow_mut(|trail| {
                trail.pop();
            });
        }
    }

    #[inline]
    pub(crate) fn enter(class: &'static str) -> TrailGuard {
        TRAIL.with_borrow_mut(|trail| trail.push(class));
        TrailGuard(())
    }

    pub(crate) fn attach(err: PropertyError) -> PropertyError {
        if matches!(err, PropertyError::Traced { .. }) {
            return err;
        }
        let trail = TRAIL.with_borrow(|trail| trail.join(" -> "));
        if trail.is_empty() {
            return err;
        }
        PropertyError::Traced {
            trail,
            source: Box::new(err),
        }
    }
}

#[cfg(not(all(debug_assertions, feature = "debug")))]
mod inner {
    use crate::PropertyError;

    pub(crate) struct TrailGuard;

    #[inline(always)]
    pub(crate) fn enter(_class: &'static str) -> TrailGuard {
        TrailGuard
    }

    #[inline(always)]
    pub(crate) fn attach(err: PropertyError) -> PropertyError {
        err
    }
}

pub(crate) use inner::{attach, enter};

#[cfg(all(test, debug_assertions, feature = "debug"))]
mod tests {
    use crate::PropertyError;

    use super::{attach, enter};

    #[test]
    fn innermost_trail_is_kept() {
        let _outer = enter("Outer");
        let err = {
            let _inner = enter("Inner");
            attach(PropertyError::mismatch("x", "int"))
        };
        let err = attach(err);

        let PropertyError::Traced { trail, .. } = &err else {
            panic!("expected a traced error");
        };
        assert_eq!(trail, "Outer -> Inner");
        assert!(matches!(err.root(), PropertyError::TypeMismatch { .. }));
    }
}
