//! Tab registry: ordered page handles plus the active-tab pointer
//!
//! All tab mutations go through [`TabRegistry`], which keeps `current` inside
//! `0..len` whenever the registry is non-empty.

use std::sync::Arc;

use crate::manager::SessionError;

pub struct TabRegistry<P: ?Sized> {
    pages: Vec<Arc<P>>,
    current: usize,
}

impl<P: ?Sized> Default for TabRegistry<P> {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            current: 0,
        }
    }
}

impl<P: ?Sized> TabRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.pages.is_empty()).then_some(self.current)
    }

    pub fn current(&self) -> Option<Arc<P>> {
        self.pages.get(self.current).cloned()
    }

    pub fn get(&self, index: usize) -> Option<Arc<P>> {
        self.pages.get(index).cloned()
    }

    fn check(&self, index: usize) -> Result<(), SessionError> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(SessionError::TabOutOfRange {
                index,
                count: self.pages.len(),
            })
        }
    }

    /// Append a page and make it current; returns its index
    pub fn push(&mut self, page: Arc<P>) -> usize {
        self.pages.push(page);
        self.current = self.pages.len() - 1;
        self.current
    }

    /// Replace all tabs. The first page matching `was_active` stays current,
    /// otherwise the first tab.
    pub fn adopt(&mut self, pages: Vec<Arc<P>>, was_active: impl Fn(&P) -> bool) {
        self.current = pages.iter().position(|p| was_active(&**p)).unwrap_or(0);
        self.pages = pages;
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.current = 0;
    }

    pub fn switch_to(&mut self, index: usize) -> Result<Arc<P>, SessionError> {
        self.check(index)?;
        self.current = index;
        Ok(self.pages[index].clone())
    }

    /// Remove a tab and clamp the current pointer into range.
    ///
    /// A tab before the current one shifts the pointer down so the same page
    /// stays active.
    pub fn remove(&mut self, index: usize) -> Result<Arc<P>, SessionError> {
        self.check(index)?;
        let removed = self.pages.remove(index);
        if index < self.current {
            self.current -= 1;
        }
        if self.current >= self.pages.len() {
            self.current = self.pages.len().saturating_sub(1);
        }
        Ok(removed)
    }
}
