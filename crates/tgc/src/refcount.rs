//! Reference Count Primitives
//!
//! The count lives in the word at an object's base address. How that word
//! is read and written is a policy: single-threaded mutator heaps use
//! plain loads and stores, hosts that adjust counts from several threads
//! use relaxed atomics. The lifetime passes are generic over the policy
//! and never touch the word directly.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::object::header::ObjectView;

/// How the count word at a given address is accessed.
///
/// All methods are `unsafe`: the address must be the count word of a live
/// object, obtained from a header view.
pub trait CountPolicy {
    /// Read the current count.
    ///
    /// # Safety
    ///
    /// `count_addr` must be a live object's count word.
    unsafe fn load(count_addr: usize) -> usize;

    /// Add one; returns the new count.
    ///
    /// # Safety
    ///
    /// `count_addr` must be a live object's count word.
    unsafe fn increment(count_addr: usize) -> usize;

    /// Subtract one; returns the new count.
    ///
    /// # Safety
    ///
    /// `count_addr` must be a live object's count word with a count of at
    /// least one.
    unsafe fn decrement(count_addr: usize) -> usize;
}

/// Plain word access for heaps touched by one thread at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonAtomicCount;

impl CountPolicy for NonAtomicCount {
    #[inline]
    unsafe fn load(count_addr: usize) -> usize {
        *(count_addr as *const usize)
    }

    #[inline]
    unsafe fn increment(count_addr: usize) -> usize {
        let count = count_addr as *mut usize;
        debug_assert!(*count != usize::MAX, "reference count overflow");
        *count += 1;
        *count
    }

    #[inline]
    unsafe fn decrement(count_addr: usize) -> usize {
        let count = count_addr as *mut usize;
        debug_assert!(*count != 0, "reference count underflow");
        *count -= 1;
        *count
    }
}

/// Relaxed atomic access for counts shared across threads.
///
/// Relaxed suffices: the count is the only word involved, and the host is
/// responsible for ordering object publication itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicCount;

impl CountPolicy for AtomicCount {
    #[inline]
    unsafe fn load(count_addr: usize) -> usize {
        (*(count_addr as *const AtomicUsize)).load(Ordering::Relaxed)
    }

    #[inline]
    unsafe fn increment(count_addr: usize) -> usize {
        (*(count_addr as *const AtomicUsize)).fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    unsafe fn decrement(count_addr: usize) -> usize {
        (*(count_addr as *const AtomicUsize)).fetch_sub(1, Ordering::Relaxed) - 1
    }
}

/// Read the reference count of a live object.
///
/// # Safety
///
/// `obj` must point at the data of a live object.
#[inline]
pub unsafe fn count<P: CountPolicy>(obj: usize) -> usize {
    P::load(ObjectView::classify(obj).count_address())
}

/// Add one reference to a live object; returns the new count.
///
/// # Safety
///
/// `obj` must point at the data of a live object.
#[inline]
pub unsafe fn increment<P: CountPolicy>(obj: usize) -> usize {
    P::increment(ObjectView::classify(obj).count_address())
}

/// Drop one reference from a live object; returns the new count.
///
/// Freeing the object when zero is the caller's job.
///
/// # Safety
///
/// `obj` must point at the data of a live object with a count of at least
/// one.
#[inline]
pub unsafe fn decrement<P: CountPolicy>(obj: usize) -> usize {
    P::decrement(ObjectView::classify(obj).count_address())
}
