//! Callable references: two-word, copyable, identity-comparable handles to one call target.
//!
//! A [`CallRef`] names a free function, a method bound to a shared receiver, or a method
//! bound to an exclusive receiver. The target is fixed at compile time: only zero-sized
//! targets (function items and closures that capture nothing) can be bound, so a
//! `CallRef` never owns state beyond its receiver pointer and copying it is a plain
//! two-word copy.
//!
//! # Examples
//!
//! ```
//! use concurrent_event::CallRef;
//!
//! fn double(x: &i32) -> i32 {
//!     x * 2
//! }
//!
//! let call: CallRef<i32, i32> = CallRef::free(double);
//! assert_eq!(call.invoke(&21), 42);
//! assert_eq!(call, CallRef::free(double));
//! ```

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

/// Adapter table generated once per bound target and kept in static memory.
struct Thunk<A: ?Sized, R> {
    invoke: unsafe fn(*const (), &A) -> R,
    /// Identity of the binding (kind, receiver type and target type).
    target: fn() -> TypeId,
    name: fn() -> &'static str,
}

/// Rejects targets that carry state at compile time.
struct Stateless<F>(PhantomData<F>);

impl<F> Stateless<F> {
    const ASSERT: () = assert!(
        mem::size_of::<F>() == 0,
        "call targets must not capture state"
    );
}

/// Produces a value of a zero-sized target type.
///
/// # Safety
///
/// `F` must be zero-sized and a value of `F` must already have been handed to a
/// `CallRef` constructor.
unsafe fn conjure<F: Copy>() -> F {
    debug_assert_eq!(mem::size_of::<F>(), 0);
    // Reading a zero-sized value through an aligned, non-null pointer reads no memory.
    unsafe { NonNull::<F>::dangling().as_ptr().read() }
}

// -------------------------------------------------------------------------------------------------
// Binding kinds
// -------------------------------------------------------------------------------------------------

struct Free<F, A: ?Sized, R>(PhantomData<(F, fn(&A) -> R)>);

impl<F, A, R> Free<F, A, R>
where
    F: Fn(&A) -> R + Copy + Send + Sync + 'static,
    A: ?Sized + 'static,
    R: 'static,
{
    const THUNK: Thunk<A, R> = Thunk {
        invoke: Self::invoke,
        target: TypeId::of::<Self>,
        name: type_name::<F>,
    };

    unsafe fn invoke(_receiver: *const (), args: &A) -> R {
        let target: F = unsafe { conjure() };
        target(args)
    }
}

struct Shared<C, F, A: ?Sized, R>(PhantomData<(fn(&C), F, fn(&A) -> R)>);

impl<C, F, A, R> Shared<C, F, A, R>
where
    C: Sync + 'static,
    F: Fn(&C, &A) -> R + Copy + Send + Sync + 'static,
    A: ?Sized + 'static,
    R: 'static,
{
    const THUNK: Thunk<A, R> = Thunk {
        invoke: Self::invoke,
        target: TypeId::of::<Self>,
        name: type_name::<F>,
    };

    unsafe fn invoke(receiver: *const (), args: &A) -> R {
        let target: F = unsafe { conjure() };
        let receiver = unsafe { &*receiver.cast::<C>() };
        target(receiver, args)
    }
}

struct Exclusive<C, F, A: ?Sized, R>(PhantomData<(fn(&mut C), F, fn(&A) -> R)>);

impl<C, F, A, R> Exclusive<C, F, A, R>
where
    C: Send + 'static,
    F: Fn(&mut C, &A) -> R + Copy + Send + Sync + 'static,
    A: ?Sized + 'static,
    R: 'static,
{
    const THUNK: Thunk<A, R> = Thunk {
        invoke: Self::invoke,
        target: TypeId::of::<Self>,
        name: type_name::<F>,
    };

    unsafe fn invoke(receiver: *const (), args: &A) -> R {
        let target: F = unsafe { conjure() };
        let receiver = unsafe { &mut *receiver.cast::<C>().cast_mut() };
        target(receiver, args)
    }
}

// -------------------------------------------------------------------------------------------------
// CallRef
// -------------------------------------------------------------------------------------------------

/// A reference to one call target with the signature `fn(&A) -> R`.
///
/// Two `CallRef`s are equal when they bind the same target to the same receiver, which
/// is what [`Event::unsubscribe`](crate::Event::unsubscribe) matches on. The lifetime
/// `'a` is the borrow of the bound receiver; free functions can use any lifetime.
pub struct CallRef<'a, A: ?Sized + 'static, R: 'static = ()> {
    receiver: *const (),
    thunk: &'static Thunk<A, R>,
    _receiver: PhantomData<&'a ()>,
}

impl<'a, A: ?Sized + 'static, R: 'static> CallRef<'a, A, R> {
    /// Binds a free function or a closure that captures nothing.
    ///
    /// Capturing closures are rejected at compile time.
    ///
    /// ```compile_fail
    /// use concurrent_event::CallRef;
    ///
    /// let offset = 3;
    /// let _ = CallRef::<i32, i32>::free(move |x: &i32| x + offset);
    /// ```
    pub fn free<F>(_target: F) -> Self
    where
        F: Fn(&A) -> R + Copy + Send + Sync + 'static,
    {
        let () = Stateless::<F>::ASSERT;
        CallRef {
            receiver: ptr::null(),
            thunk: &Free::<F, A, R>::THUNK,
            _receiver: PhantomData,
        }
    }

    /// Binds a `&self` method (or any `Fn(&C, &A) -> R` without captures) to `receiver`.
    ///
    /// ```
    /// use concurrent_event::CallRef;
    /// use std::sync::atomic::{AtomicI32, Ordering};
    ///
    /// struct Total(AtomicI32);
    ///
    /// impl Total {
    ///     fn add(&self, x: &i32) {
    ///         self.0.fetch_add(*x, Ordering::SeqCst);
    ///     }
    /// }
    ///
    /// let total = Total(AtomicI32::new(0));
    /// let call: CallRef<i32> = CallRef::method(&total, Total::add);
    /// call.invoke(&5);
    /// call.invoke(&6);
    /// assert_eq!(total.0.load(Ordering::SeqCst), 11);
    /// ```
    pub fn method<C, M>(receiver: &'a C, _target: M) -> Self
    where
        C: Sync + 'static,
        M: Fn(&C, &A) -> R + Copy + Send + Sync + 'static,
    {
        let () = Stateless::<M>::ASSERT;
        CallRef {
            receiver: ptr::from_ref(receiver).cast(),
            thunk: &Shared::<C, M, A, R>::THUNK,
            _receiver: PhantomData,
        }
    }

    /// Binds a `&mut self` method to `receiver`.
    ///
    /// # Safety
    ///
    /// The returned reference and every copy of it must never be invoked while another
    /// invocation of it is still running, on this thread or any other. Emitting the
    /// same event from two threads, or re-emitting from inside the handler, breaks this.
    pub unsafe fn method_mut<C, M>(receiver: &'a mut C, _target: M) -> Self
    where
        C: Send + 'static,
        M: Fn(&mut C, &A) -> R + Copy + Send + Sync + 'static,
    {
        let () = Stateless::<M>::ASSERT;
        CallRef {
            receiver: ptr::from_mut(receiver).cast_const().cast(),
            thunk: &Exclusive::<C, M, A, R>::THUNK,
            _receiver: PhantomData,
        }
    }

    /// Calls the target with `args`.
    #[inline]
    pub fn invoke(&self, args: &A) -> R {
        // SAFETY: every constructor pairs the receiver with the thunk built for its type,
        // and the receiver borrow lives for `'a`, which outlives `self`.
        unsafe { (self.thunk.invoke)(self.receiver, args) }
    }

    /// Type name of the bound function or method.
    pub fn target_name(&self) -> &'static str {
        (self.thunk.name)()
    }

    /// Whether a receiver is bound (false for free functions).
    pub fn is_bound(&self) -> bool {
        !self.receiver.is_null()
    }
}

impl<A: ?Sized + 'static, R: 'static> Clone for CallRef<'_, A, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: ?Sized + 'static, R: 'static> Copy for CallRef<'_, A, R> {}

impl<'b, A: ?Sized + 'static, R: 'static> PartialEq<CallRef<'b, A, R>> for CallRef<'_, A, R> {
    fn eq(&self, other: &CallRef<'b, A, R>) -> bool {
        // Function addresses are not unique across codegen units, so the target is
        // compared by type identity instead.
        ptr::eq(self.receiver, other.receiver) && (self.thunk.target)() == (other.thunk.target)()
    }
}

impl<A: ?Sized + 'static, R: 'static> Eq for CallRef<'_, A, R> {}

impl<A: ?Sized + 'static, R: 'static> Hash for CallRef<'_, A, R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.receiver.hash(state);
        (self.thunk.target)().hash(state);
    }
}

impl<A: ?Sized + 'static, R: 'static> fmt::Debug for CallRef<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRef")
            .field("target", &self.target_name())
            .field("receiver", &self.receiver)
            .finish()
    }
}

// SAFETY: `free` and `method` only accept `Send + Sync` targets and `Sync` receivers, so
// invoking from another thread only ever shares `&C`. `method_mut` requires `C: Send`
// and leaves the no-overlapping-invocations obligation to its caller.
unsafe impl<A: ?Sized + 'static, R: 'static> Send for CallRef<'_, A, R> {}
unsafe impl<A: ?Sized + 'static, R: 'static> Sync for CallRef<'_, A, R> {}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
