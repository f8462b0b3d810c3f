// Copyright 2018-2019 Joe Neeman.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// See the LICENSE-APACHE or LICENSE-MIT files at the top-level directory
// of this distribution.

//! Intrusive doubly-linked lists over arena indices.
//!
//! The list head only knows its two ends and its length; the `prev`/`next` links live inside the
//! members themselves. Knowing a member is therefore enough to unlink it in constant time.

/// The links stored inside every member of a list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Link<T> {
    pub prev: Option<T>,
    pub next: Option<T>,
}

impl<T> Link<T> {
    pub fn detached() -> Link<T> {
        Link {
            prev: None,
            next: None,
        }
    }
}

/// An arena whose elements carry a `Link<T>`, where `T` is the index type of the arena.
pub(crate) trait Links<T> {
    fn link(&self, t: T) -> &Link<T>;
    fn link_mut(&mut self, t: T) -> &mut Link<T>;
}

#[derive(Clone, Debug)]
pub(crate) struct List<T> {
    first: Option<T>,
    last: Option<T>,
    len: usize,
}

impl<T: Copy + Eq> List<T> {
    pub fn new() -> List<T> {
        List {
            first: None,
            last: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Option<T> {
        self.first
    }

    pub fn push_back<L: Links<T> + ?Sized>(&mut self, arena: &mut L, t: T) {
        debug_assert!(*arena.link(t) == Link::detached() && self.first != Some(t));
        *arena.link_mut(t) = Link {
            prev: self.last,
            next: None,
        };
        match self.last {
            Some(last) => arena.link_mut(last).next = Some(t),
            None => self.first = Some(t),
        }
        self.last = Some(t);
        self.len += 1;
    }

    /// Unlinks `t`, which must be a member of this list.
    pub fn remove<L: Links<T> + ?Sized>(&mut self, arena: &mut L, t: T) {
        assert!(self.len > 0, "removing from an empty list");
        let Link { prev, next } = *arena.link(t);
        match prev {
            Some(p) => arena.link_mut(p).next = next,
            None => {
                debug_assert!(self.first == Some(t));
                self.first = next;
            }
        }
        match next {
            Some(n) => arena.link_mut(n).prev = prev,
            None => {
                debug_assert!(self.last == Some(t));
                self.last = prev;
            }
        }
        *arena.link_mut(t) = Link::detached();
        self.len -= 1;
    }

    /// The member following `t`.
    pub fn next<L: Links<T> + ?Sized>(&self, arena: &L, t: T) -> Option<T> {
        arena.link(t).next
    }

    pub fn iter<'a, L: Links<T> + ?Sized>(&self, arena: &'a L) -> Iter<'a, T, L> {
        Iter {
            arena,
            cur: self.first,
        }
    }

    /// Copies the members out, so that the arena can be mutated while walking them.
    pub fn to_vec<L: Links<T> + ?Sized>(&self, arena: &L) -> Vec<T> {
        let mut ret = Vec::with_capacity(self.len);
        ret.extend(self.iter(arena));
        ret
    }
}

pub(crate) struct Iter<'a, T, L: ?Sized> {
    arena: &'a L,
    cur: Option<T>,
}

impl<T: Copy, L: Links<T> + ?Sized> Iterator for Iter<'_, T, L> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let ret = self.cur?;
        self.cur = self.arena.link(ret).next;
        Some(ret)
    }
}
