use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::Timeout;
use yew::prelude::*;

use meadow_core::keywords::REVEAL_GRACE_MS;
use meadow_core::{KeywordReveal, RevealSnapshot, SecretKeyword};

/// Context handed down from `App` so search and sections share one reveal
/// and its pending grace timer.
#[derive(Clone)]
pub(crate) struct KeywordContext {
    pub(crate) reveal: Rc<KeywordReveal>,
    grace_timer: Rc<RefCell<Option<Timeout>>>,
}

impl KeywordContext {
    pub(crate) fn new(reveal: Rc<KeywordReveal>) -> Self {
        Self {
            reveal,
            grace_timer: Rc::new(RefCell::new(None)),
        }
    }

    /// Shows `keyword` and lowers the reveal flags after the grace period.
    /// A newer reveal replaces (and so cancels) the pending timer.
    pub(crate) fn reveal_keyword(&self, keyword: &'static SecretKeyword) {
        let Some(token) = self.reveal.set_active(Some(keyword)) else {
            return;
        };
        let weak = Rc::downgrade(&self.reveal);
        let timer = Timeout::new(REVEAL_GRACE_MS, move || {
            if let Some(reveal) = weak.upgrade() {
                reveal.expire(token);
            }
        });
        *self.grace_timer.borrow_mut() = Some(timer);
    }

    pub(crate) fn clear_reveal(&self) {
        let pending = self.grace_timer.borrow_mut().take();
        drop(pending);
        self.reveal.reset();
    }

    #[cfg(test)]
    pub(crate) fn has_pending_timer(&self) -> bool {
        self.grace_timer.borrow().is_some()
    }
}

impl PartialEq for KeywordContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.reveal, &other.reveal)
    }
}

#[hook]
pub(crate) fn use_keyword_context() -> KeywordContext {
    let context = use_context::<KeywordContext>();
    let fallback = use_memo((), |_| KeywordContext::new(Rc::new(KeywordReveal::new())));
    context.unwrap_or_else(|| (*fallback).clone())
}

/// Re-renders the caller whenever the reveal state changes.
#[hook]
pub(crate) fn use_reveal_snapshot(context: KeywordContext) -> RevealSnapshot {
    let snapshot = use_state(|| context.reveal.snapshot());
    {
        let snapshot = snapshot.clone();
        use_effect_with(context, move |context| {
            let reveal = context.reveal.clone();
            snapshot.set(reveal.snapshot());
            let id = reveal.subscribe(Rc::new(move |next: &RevealSnapshot| {
                snapshot.set(next.clone());
            }));
            move || reveal.unsubscribe(id)
        });
    }
    (*snapshot).clone()
}
