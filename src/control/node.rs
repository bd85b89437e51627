//! Untyped program nodes behind [`Free`](super::Free).
//!
//! Values passed between continuations are erased to `Rc<dyn Any>`, which
//! lets every bind store its continuation without knowing the intermediate
//! result type. The typed facade guarantees each erased value is read back at
//! the type it was written with.
//!
//! Dropping a program never recurses once per node: an unshared node is
//! hollowed out and its children (bind sources, sequenced programs, pending
//! stacks and plain instruction slots) are pushed onto a [`Reclaim`] worklist.
//! Programs captured inside continuation closures are dropped by the closure.

use smallvec::SmallVec;
use std::any::Any;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use super::pending::{Next, Pending};
use crate::typeclass::InstructionSet;

const DROP_INLINE_CAPACITY: usize = 8;

pub(crate) type Erased = Rc<dyn Any>;

/// Type-erased continuation: consumes a result and returns the program to resume.
pub(crate) type Arrow<S> = Rc<dyn Fn(Erased) -> Core<S>>;

pub(crate) struct Core<S: InstructionSet> {
    node: Rc<Node<S>>,
}

pub(crate) enum Node<S: InstructionSet> {
    Pure(Erased),
    Impure(S::Instruction<Core<S>>),
    /// Runs `source`, then feeds its result through every frame of `pending`.
    Bind {
        source: Core<S>,
        pending: Pending<S>,
    },
}

/// The head of a program after all leading binds have been resolved.
pub(crate) enum View<S: InstructionSet, K> {
    Pure(Erased),
    Impure(S::Instruction<K>),
}

/// Worklist of program parts waiting to be released.
pub(crate) struct Reclaim<S: InstructionSet> {
    cores: SmallVec<[Core<S>; DROP_INLINE_CAPACITY]>,
    stacks: SmallVec<[Pending<S>; DROP_INLINE_CAPACITY]>,
}

impl<S: InstructionSet> Clone for Core<S> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<S: InstructionSet> Core<S> {
    #[inline]
    pub(crate) fn pure(value: Erased) -> Self {
        Self::from_node(Node::Pure(value))
    }

    #[inline]
    pub(crate) fn impure(instruction: S::Instruction<Self>) -> Self {
        Self::from_node(Node::Impure(instruction))
    }

    #[inline]
    pub(crate) fn bind(source: Self, arrow: Arrow<S>) -> Self {
        Self::from_node(Node::Bind {
            source,
            pending: Pending::single(arrow),
        })
    }

    /// Runs `source`, discards its result and continues with `next`.
    #[inline]
    pub(crate) fn sequence(source: Self, next: Self) -> Self {
        Self::from_node(Node::Bind {
            source,
            pending: Pending::program(next),
        })
    }

    fn suspend(source: Self, pending: Pending<S>) -> Self {
        if pending.is_empty() {
            source
        } else {
            Self::from_node(Node::Bind { source, pending })
        }
    }

    #[inline]
    fn from_node(node: Node<S>) -> Self {
        Self {
            node: Rc::new(node),
        }
    }

    #[inline]
    pub(crate) fn node(&self) -> &Node<S> {
        &self.node
    }

    /// The value of this program if it is already `Pure`.
    pub(crate) fn pure_value(&self) -> Option<Erased> {
        match self.node() {
            Node::Pure(value) => Some(Rc::clone(value)),
            _ => None,
        }
    }

    /// Resolves leading binds until the program is `Pure` or has an instruction
    /// at its head.
    ///
    /// Continuations still pending when an instruction is reached are attached
    /// to each of its slots, and every slot is then passed through `wrap`.
    /// Native stack usage is constant in the depth of the program.
    pub(crate) fn resume<K, W>(&self, wrap: W) -> View<S, K>
    where
        K: 'static,
        W: Fn(Self) -> K + Clone + 'static,
    {
        let mut current = self.clone();
        let mut pending = Pending::empty();
        loop {
            let next = match current.node() {
                Node::Bind {
                    source,
                    pending: inner,
                } => {
                    pending = inner.then(pending);
                    source.clone()
                }
                Node::Pure(value) => match pending.pop() {
                    Some((next, rest)) => {
                        pending = rest;
                        match next {
                            Next::Apply(arrow) => arrow(Rc::clone(value)),
                            Next::Program(program) => program,
                        }
                    }
                    None => return View::Pure(Rc::clone(value)),
                },
                Node::Impure(instruction) => {
                    return View::Impure(S::map_next(instruction, move |next: &Self| {
                        wrap(Self::suspend(next.clone(), pending.clone()))
                    }));
                }
            };
            current = next;
        }
    }

    /// Moves the children of an unshared node onto `reclaim`, leaving an empty
    /// `Pure` node behind. Shared nodes are left alone.
    fn hollow(&mut self, reclaim: &mut Reclaim<S>) {
        let Some(node) = Rc::get_mut(&mut self.node) else {
            return;
        };
        if matches!(node, Node::Pure(_)) {
            return;
        }
        match mem::replace(node, Node::Pure(Rc::new(()))) {
            Node::Pure(_) => {}
            Node::Impure(instruction) => {
                let slots: Rc<RefCell<Vec<Self>>> = Rc::default();
                let sink = Rc::clone(&slots);
                drop(S::map_next(&instruction, move |next: &Self| {
                    sink.borrow_mut().push(next.clone());
                }));
                reclaim.cores.extend(slots.take());
            }
            Node::Bind { source, pending } => {
                reclaim.cores.push(source);
                reclaim.stacks.push(pending);
            }
        }
    }
}

impl<S: InstructionSet> Drop for Core<S> {
    fn drop(&mut self) {
        let mut reclaim = Reclaim::new();
        self.hollow(&mut reclaim);
        reclaim.run();
    }
}

impl<S: InstructionSet> Reclaim<S> {
    pub(crate) fn new() -> Self {
        Self {
            cores: SmallVec::new(),
            stacks: SmallVec::new(),
        }
    }

    pub(crate) fn push_core(&mut self, core: Core<S>) {
        self.cores.push(core);
    }

    pub(crate) fn push_stack(&mut self, stack: Pending<S>) {
        self.stacks.push(stack);
    }

    /// Releases everything on the worklist. Each popped item is emptied before
    /// it is dropped, so its own `Drop` finds nothing left to do.
    pub(crate) fn run(mut self) {
        loop {
            if let Some(mut core) = self.cores.pop() {
                core.hollow(&mut self);
            } else if let Some(mut stack) = self.stacks.pop() {
                stack.release_into(&mut self);
            } else {
                break;
            }
        }
    }
}
