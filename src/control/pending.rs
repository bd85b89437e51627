//! Persistent stack of pending continuations.
//!
//! When a program built from left-nested `chain` calls is resumed, every bind
//! contributes the continuations that must run once its source finishes. They
//! are kept here instead of on the call stack.
//!
//! # Design
//!
//! The stack is an immutable cons list shared through `Rc`, so an instruction
//! whose continuation slots all need "the rest of the program" can capture it
//! in O(1). Prepending a whole stack in front of another would be O(n), so a
//! stack can instead be pushed as a single [`Frame::Segment`] which [`pop`]
//! unfolds lazily. A continuation that ignores its input and resumes a fixed
//! program is stored as [`Frame::Program`] rather than as a closure, so the
//! program stays reachable when the stack is dropped.
//!
//! # Invariants
//!
//! - **Order**: `front.then(back)` pops every frame of `front` before any frame of `back`
//! - **Sharing**: no operation mutates an existing link
//! - **Drop**: dropping a long stack does not recurse once per link, and
//!   sequenced programs are released through the same [`Reclaim`] worklist
//!
//! [`pop`]: Pending::pop

use smallvec::SmallVec;
use std::rc::Rc;

use super::node::{Arrow, Core, Reclaim};
use crate::typeclass::InstructionSet;

const DROP_INLINE_CAPACITY: usize = 8;

pub(crate) struct Pending<S: InstructionSet> {
    head: Option<Rc<Link<S>>>,
}

struct Link<S: InstructionSet> {
    frame: Frame<S>,
    rest: Pending<S>,
}

enum Frame<S: InstructionSet> {
    Arrow(Arrow<S>),
    Program(Core<S>),
    Segment(Pending<S>),
}

/// A continuation popped off the stack.
pub(crate) enum Next<S: InstructionSet> {
    /// Feed the current result to the arrow.
    Apply(Arrow<S>),
    /// Discard the current result and run the program.
    Program(Core<S>),
}

impl<S: InstructionSet> Clone for Pending<S> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
        }
    }
}

impl<S: InstructionSet> Clone for Frame<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Arrow(arrow) => Self::Arrow(Rc::clone(arrow)),
            Self::Program(program) => Self::Program(program.clone()),
            Self::Segment(segment) => Self::Segment(segment.clone()),
        }
    }
}

impl<S: InstructionSet> Pending<S> {
    #[inline]
    pub(crate) const fn empty() -> Self {
        Self { head: None }
    }

    #[inline]
    pub(crate) fn single(arrow: Arrow<S>) -> Self {
        Self::link(Frame::Arrow(arrow), Self::empty())
    }

    #[inline]
    pub(crate) fn program(program: Core<S>) -> Self {
        Self::link(Frame::Program(program), Self::empty())
    }

    #[inline]
    fn link(frame: Frame<S>, rest: Self) -> Self {
        Self {
            head: Some(Rc::new(Link { frame, rest })),
        }
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns a stack that runs every frame of `self`, then every frame of `back`.
    pub(crate) fn then(&self, back: Self) -> Self {
        if self.is_empty() {
            return back;
        }
        if back.is_empty() {
            return self.clone();
        }
        Self::link(Frame::Segment(self.clone()), back)
    }

    /// Returns the next continuation to run and the stack that remains after it.
    pub(crate) fn pop(&self) -> Option<(Next<S>, Self)> {
        let mut current = self.clone();
        loop {
            let link = Rc::clone(current.head.as_ref()?);
            match &link.frame {
                Frame::Arrow(arrow) => {
                    return Some((Next::Apply(Rc::clone(arrow)), link.rest.clone()));
                }
                Frame::Program(program) => {
                    return Some((Next::Program(program.clone()), link.rest.clone()));
                }
                Frame::Segment(segment) => {
                    current = match segment.head.as_ref() {
                        Some(inner) => {
                            Self::link(inner.frame.clone(), inner.rest.then(link.rest.clone()))
                        }
                        None => link.rest.clone(),
                    };
                }
            }
        }
    }

    /// Number of continuations left to run.
    pub(crate) fn len(&self) -> usize {
        let mut count = 0;
        let mut stacks: SmallVec<[&Self; DROP_INLINE_CAPACITY]> = SmallVec::new();
        stacks.push(self);
        while let Some(stack) = stacks.pop() {
            let mut cursor = stack;
            while let Some(link) = &cursor.head {
                match &link.frame {
                    Frame::Arrow(_) | Frame::Program(_) => count += 1,
                    Frame::Segment(segment) => stacks.push(segment),
                }
                cursor = &link.rest;
            }
        }
        count
    }

    /// Unlinks every link this stack owns alone, handing nested stacks and
    /// sequenced programs to `reclaim`. Leaves `self` empty.
    pub(crate) fn release_into(&mut self, reclaim: &mut Reclaim<S>) {
        let mut links: SmallVec<[Rc<Link<S>>; DROP_INLINE_CAPACITY]> = SmallVec::new();
        links.extend(self.head.take());
        while let Some(link) = links.pop() {
            if let Ok(Link { frame, mut rest }) = Rc::try_unwrap(link) {
                links.extend(rest.head.take());
                match frame {
                    Frame::Arrow(_) => {}
                    Frame::Program(program) => reclaim.push_core(program),
                    Frame::Segment(segment) => reclaim.push_stack(segment),
                }
            }
        }
    }
}

impl<S: InstructionSet> Drop for Pending<S> {
    fn drop(&mut self) {
        if self.is_empty() {
            return;
        }
        let mut reclaim = Reclaim::new();
        self.release_into(&mut reclaim);
        reclaim.run();
    }
}
