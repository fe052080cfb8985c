use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::car::{Direction, Floor};

/// A pending call to be served. Identity is positional: duplicates may coexist.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub floor: Floor,
    pub direction: Direction,
}

impl Request {
    pub fn new(floor: Floor, direction: Direction) -> Self {
        Self { floor, direction }
    }

    pub fn matches(&self, floor: Floor, direction: Direction) -> bool {
        self.floor == floor && self.direction == direction
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.floor, self.direction)
    }
}

/// Ordered queue of pending requests.
///
/// Clones are handles onto the same queue, so a request added through one
/// handle is visible to every other. All reads go through the queue lock,
/// which makes `list` an atomic copy.
#[derive(Clone, Debug, Default)]
pub struct RequestQueue {
    inner: Arc<Mutex<Vec<Request>>>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request. Floors are not validated.
    pub fn add(&self, floor: Floor, direction: Direction) {
        self.lock().push(Request::new(floor, direction));
    }

    pub fn list(&self) -> Vec<Request> {
        self.lock().clone()
    }

    /// Removes the request at the front of the queue, if any.
    pub fn remove_first(&self) -> Option<Request> {
        let mut requests = self.lock();
        if requests.is_empty() {
            None
        } else {
            Some(requests.remove(0))
        }
    }

    /// Removes the first request for `floor` travelling `direction`, if any.
    pub fn remove_matching(&self, floor: Floor, direction: Direction) -> Option<Request> {
        let mut requests = self.lock();
        let at = requests.iter().position(|r| r.matches(floor, direction))?;
        Some(requests.remove(at))
    }

    /// Runs `f` over the live contents while holding the queue lock.
    /// `f` must not call back into this queue.
    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&[Request]) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Request>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
