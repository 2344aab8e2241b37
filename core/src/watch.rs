use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

pub type WatchHook<T> = Rc<dyn Fn(T)>;

/// A value that notifies hooks when it changes.
pub struct Watch<T: Copy + PartialEq> {
    value: Cell<T>,
    hooks: RefCell<Vec<(u64, WatchHook<T>)>>,
    next_hook_id: Cell<u64>,
}

impl<T: Copy + PartialEq> Watch<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Cell::new(value),
            hooks: RefCell::new(Vec::new()),
            next_hook_id: Cell::new(1),
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn set(&self, next: T) {
        if self.value.replace(next) == next {
            return;
        }
        let hooks: Vec<_> = self
            .hooks
            .borrow()
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect();
        for hook in hooks {
            hook(next);
        }
    }

    pub fn subscribe(&self, hook: WatchHook<T>) -> u64 {
        let id = self.next_hook_id.get();
        self.next_hook_id.set(id.saturating_add(1));
        self.hooks.borrow_mut().push((id, hook));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.hooks.borrow_mut().retain(|(hook_id, _)| *hook_id != id);
    }

    pub fn clear_hooks(&self) {
        self.hooks.borrow_mut().clear();
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.borrow().len()
    }
}

impl<T: Copy + PartialEq + fmt::Debug> fmt::Debug for Watch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("value", &self.value.get())
            .field("hooks", &self.hooks.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_fire_on_change_only() {
        let watch = Watch::new(0.0_f64);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = watch.subscribe(Rc::new(move |value| sink.borrow_mut().push(value)));
        watch.set(0.0);
        watch.set(12.5);
        watch.set(12.5);
        watch.unsubscribe(id);
        watch.set(3.0);
        assert_eq!(*seen.borrow(), vec![12.5]);
        assert_eq!(watch.get(), 3.0);
    }

    #[test]
    fn hooks_may_unsubscribe_while_notified() {
        let watch = Rc::new(Watch::new(0_u32));
        let slot = Rc::new(Cell::new(0_u64));
        let inner = watch.clone();
        let slot_for_hook = slot.clone();
        let id = watch.subscribe(Rc::new(move |_| inner.unsubscribe(slot_for_hook.get())));
        slot.set(id);
        watch.set(1);
        assert_eq!(watch.hook_count(), 0);
    }
}
