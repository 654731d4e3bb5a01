//! Use counting with scope-bound holders
//!
//! Every container, content proxy and component proxy carries a `UseCell`.
//! Client code never touches the count directly: acquiring a `Hold`
//! increments it, cloning a `Hold` increments it, dropping one decrements
//! it. The session only ever reads counts when it sweeps.

use std::cell::{Cell, RefCell};
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use asmx_core_types::{ComponentId, ContainerId, ProxyId};

/// Queue of armed containers whose count reached zero
pub(crate) type ReapQueue = Rc<RefCell<Vec<ContainerId>>>;

#[derive(Debug)]
struct Reaper {
    queue: Weak<RefCell<Vec<ContainerId>>>,
    container: ContainerId,
}

/// Shared use-count cell
#[derive(Debug, Default)]
pub struct UseCell {
    count: Cell<usize>,
    armed: Cell<bool>,
    reaper: RefCell<Option<Reaper>>,
}

impl UseCell {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    pub fn is_unneeded(&self) -> bool {
        self.count.get() == 0
    }

    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    /// Arm a container cell for deletion as soon as its count drops to zero
    pub(crate) fn arm(&self, container: ContainerId, queue: &ReapQueue) {
        self.armed.set(true);
        *self.reaper.borrow_mut() = Some(Reaper {
            queue: Rc::downgrade(queue),
            container,
        });
    }

    fn acquire(&self) {
        self.count.set(self.count.get() + 1);
    }

    fn release(&self) {
        let remaining = self.count.get().saturating_sub(1);
        self.count.set(remaining);
        if remaining == 0 && self.armed.get() {
            if let Some(reaper) = self.reaper.borrow().as_ref() {
                if let Some(queue) = reaper.queue.upgrade() {
                    if let Ok(mut pending) = queue.try_borrow_mut() {
                        pending.push(reaper.container);
                    }
                }
            }
        }
    }
}

/// Scope-bound holder of one use of an object
///
/// Equality and hashing go by id; canonicalisation guarantees that equal
/// ids share one cell, which `same_object` checks directly.
#[derive(Debug)]
pub struct Hold<I: Copy> {
    id: I,
    cell: Rc<UseCell>,
}

impl<I: Copy> Hold<I> {
    pub(crate) fn acquire(id: I, cell: &Rc<UseCell>) -> Self {
        cell.acquire();
        Self {
            id,
            cell: Rc::clone(cell),
        }
    }

    pub fn id(&self) -> I {
        self.id
    }

    /// Current number of holders of the underlying object
    pub fn use_count(&self) -> usize {
        self.cell.count()
    }

    /// True if both holders point at the same in-memory object
    pub fn same_object(&self, other: &Hold<I>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<I: Copy> Clone for Hold<I> {
    fn clone(&self) -> Self {
        Self::acquire(self.id, &self.cell)
    }
}

impl<I: Copy> Drop for Hold<I> {
    fn drop(&mut self) {
        self.cell.release();
    }
}

impl<I: Copy + PartialEq> PartialEq for Hold<I> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<I: Copy + Eq> Eq for Hold<I> {}

impl<I: Copy + Hash> Hash for Hold<I> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Holder of a container
pub type ContainerHandle = Hold<ContainerId>;

/// Holder of a canonical component proxy
pub type ComponentHandle = Hold<ComponentId>;

/// Holder of a content proxy (entity handle)
pub type ContentHandle = Hold<ProxyId>;
