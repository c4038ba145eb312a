//! Request queue for `no_std` environments.
//!
//! Button handlers, network callbacks and the host firmware push [`LampRequest`]s
//! from any context. The scheduler drains them at the start of every tick. The queue is
//! built on `critical-section` and `heapless::Deque`, so it is interrupt safe.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::command::LampRequest;

/// Request rejected because the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrySendError(pub LampRequest);

/// The queue is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryReceiveError;

/// A bounded queue of lamp requests.
pub struct RequestQueue<const SIZE: usize> {
    inner: Mutex<RefCell<Deque<LampRequest, SIZE>>>,
}

impl<const SIZE: usize> RequestQueue<SIZE> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Get a sender handle. Any number of senders may coexist.
    pub const fn sender(&self) -> RequestSender<'_, SIZE> {
        RequestSender { queue: self }
    }

    /// Get the receiver handle the scheduler drains
    pub const fn receiver(&self) -> RequestReceiver<'_, SIZE> {
        RequestReceiver { queue: self }
    }

    /// Queue a request.
    ///
    /// Returns `Err(TrySendError(request))` if the queue is full.
    pub fn try_send(&self, request: LampRequest) -> Result<(), TrySendError> {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow(cs).borrow_mut();
            queue.push_back(request).map_err(TrySendError)
        })
    }

    /// Take the oldest request.
    pub fn try_receive(&self) -> Result<LampRequest, TryReceiveError> {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow(cs).borrow_mut();
            queue.pop_front().ok_or(TryReceiveError)
        })
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const SIZE: usize> Default for RequestQueue<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// A sender handle for a [`RequestQueue`].
#[derive(Clone, Copy)]
pub struct RequestSender<'a, const SIZE: usize> {
    queue: &'a RequestQueue<SIZE>,
}

impl<const SIZE: usize> RequestSender<'_, SIZE> {
    pub fn try_send(&self, request: impl Into<LampRequest>) -> Result<(), TrySendError> {
        self.queue.try_send(request.into())
    }

    /// Queue a remote command by its code
    pub fn send_code(&self, code: u8) -> Result<(), TrySendError> {
        self.queue.try_send(LampRequest::from_code(code))
    }
}

/// The receiver handle for a [`RequestQueue`].
#[derive(Clone, Copy)]
pub struct RequestReceiver<'a, const SIZE: usize> {
    queue: &'a RequestQueue<SIZE>,
}

impl<const SIZE: usize> RequestReceiver<'_, SIZE> {
    pub fn try_receive(&self) -> Result<LampRequest, TryReceiveError> {
        self.queue.try_receive()
    }
}
