#![forbid(unsafe_code)]

//! Dynamic elements: subtrees rebuilt when the shape of bound data changes.
//!
//! A dynamic element owns at most one built child. Every tick it asks its
//! trigger whether the child is stale; on `true` it destroys the child, runs
//! the build closure again and fires `rebuild_children` exactly once.
//!
//! # Rebuild sequence
//!
//! ```text
//! rebuild_if(current, tick) == true
//!   -> destroy + detach current child
//!   -> build()             (panics propagate; nothing half-built is mounted)
//!   -> attach result
//!   -> rebuild_count += 1, rebuild_children()
//! ```
//!
//! # Invariants
//!
//! 1. The trigger runs at most once per tick, before the child is ticked.
//! 2. A build result produced after the element was destroyed (e.g. the build
//!    closure destroyed an ancestor) is destroyed, never attached.
//! 3. Closures are dropped when the element is destroyed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use web_time::Instant;

use crate::config::ElementConfig;
use crate::element::{Body, Element, ElementKind, Tick};

type BuildFn = Box<dyn FnMut() -> Option<Element>>;
type RebuildIfFn = Box<dyn FnMut(Option<&Element>, &Tick) -> bool>;

pub(crate) struct DynamicBody {
    build: RefCell<Option<BuildFn>>,
    rebuild_if: RefCell<Option<RebuildIfFn>>,
    rebuild_count: Cell<u64>,
}

impl DynamicBody {
    pub(crate) fn tick(&self, element: &Element, tick: &Tick) {
        let taken = self.rebuild_if.borrow_mut().take();
        let Some(mut rebuild_if) = taken else {
            return;
        };
        let current = element.content_at(0);
        let stale = rebuild_if(current.as_ref(), tick);
        if element.is_destroyed() {
            return;
        }
        self.rebuild_if.replace(Some(rebuild_if));
        if stale {
            self.rebuild(element, true);
        }
    }

    fn rebuild(&self, element: &Element, notify: bool) {
        let old = std::mem::take(&mut *element.inner.children.borrow_mut());
        element.inner.has_header.set(false);
        for child in old {
            child.set_parent(None);
            child.destroy();
        }

        let taken = self.build.borrow_mut().take();
        let Some(mut build) = taken else {
            return;
        };
        let built = build();
        if element.is_destroyed() {
            if let Some(built) = built {
                built.destroy();
            }
            return;
        }
        self.build.replace(Some(build));

        if let Some(built) = built {
            if let Some(prev) = built.parent() {
                prev.remove_child(&built);
            }
            element.attach(built);
        }
        if notify {
            let count = self.rebuild_count.get() + 1;
            self.rebuild_count.set(count);
            tracing::trace!(id = %element.id(), count, "dynamic element rebuilt");
            element.rebuild_children();
        }
    }

    pub(crate) fn release(&self) {
        self.build.replace(None);
        self.rebuild_if.replace(None);
    }
}

impl Element {
    /// Element that builds its child once now and again whenever
    /// `rebuild_if(current_child, tick)` returns `true`.
    pub fn dynamic(
        build: impl FnMut() -> Option<Element> + 'static,
        rebuild_if: impl FnMut(Option<&Element>, &Tick) -> bool + 'static,
    ) -> Self {
        let element = Self::new(
            ElementKind::Dynamic,
            Body::Dynamic(DynamicBody {
                build: RefCell::new(Some(Box::new(build))),
                rebuild_if: RefCell::new(Some(Box::new(rebuild_if))),
                rebuild_count: Cell::new(0),
            }),
        );
        if let Body::Dynamic(body) = &element.inner.body {
            body.rebuild(&element, false);
        }
        element
    }

    /// Dynamic element rebuilt whenever the status read each tick differs
    /// from the status its current child was built for.
    pub fn dynamic_on_status_changed<S: PartialEq + 'static>(
        read_status: impl Fn() -> S + 'static,
        build: impl Fn(&S) -> Option<Element> + 'static,
    ) -> Self {
        let read_status = Rc::new(read_status);
        let built_for: Rc<RefCell<Option<S>>> = Rc::new(RefCell::new(None));

        let read = Rc::clone(&read_status);
        let last = Rc::clone(&built_for);
        let build_fn = move || {
            let status = read();
            let element = build(&status);
            last.replace(Some(status));
            element
        };
        let rebuild_if = move |_: Option<&Element>, _: &Tick| {
            let status = read_status();
            built_for.borrow().as_ref() != Some(&status)
        };
        Self::dynamic(build_fn, rebuild_if)
    }

    /// Polled lookup of an external object.
    ///
    /// While the current target is missing (or, with `rebuild_if_disabled`,
    /// fails `is_alive`) the lookup runs whenever `schedule` is due. A poll
    /// rebuilds only when a target was or becomes present.
    pub fn find_object_observer<T: Clone + 'static>(
        find: impl Fn() -> Option<T> + 'static,
        is_alive: impl Fn(&T) -> bool + 'static,
        build: impl Fn(&T) -> Option<Element> + 'static,
        rebuild_if_disabled: bool,
        schedule: PollSchedule,
    ) -> Self {
        let target: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(find()));
        let schedule = RefCell::new(schedule);

        let current = Rc::clone(&target);
        let build_fn = move || {
            let found = current.borrow().clone();
            found.and_then(|t| build(&t))
        };
        let rebuild_if = move |_: Option<&Element>, tick: &Tick| {
            let healthy = target
                .borrow()
                .as_ref()
                .is_some_and(|t| !rebuild_if_disabled || is_alive(t));
            if healthy || !schedule.borrow_mut().is_due(tick.now()) {
                return false;
            }
            let found = find();
            let was_present = target.borrow().is_some();
            let is_present = found.is_some();
            target.replace(found);
            was_present || is_present
        };
        Self::dynamic(build_fn, rebuild_if)
    }

    /// Rebuilds performed since construction; `None` for non-dynamic kinds.
    #[must_use]
    pub fn rebuild_count(&self) -> Option<u64> {
        match &self.inner.body {
            Body::Dynamic(body) => Some(body.rebuild_count.get()),
            _ => None,
        }
    }

    /// Built child of a dynamic element.
    #[must_use]
    pub fn dynamic_child(&self) -> Option<Element> {
        match &self.inner.body {
            Body::Dynamic(_) => self.content_at(0),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PollSchedule
// ---------------------------------------------------------------------------

/// Fixed-interval poll gate measured against [`Tick::now`].
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    last_check: Option<Instant>,
}

impl PollSchedule {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_check: None,
        }
    }

    /// Interval drawn uniformly from `min..=max`, so many observers created
    /// together do not poll on the same frame.
    #[must_use]
    pub fn jittered(min: Duration, max: Duration) -> Self {
        let interval = if min >= max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        Self::new(interval)
    }

    /// Jittered schedule over the configured find-poll range.
    #[must_use]
    pub fn from_config() -> Self {
        let (min, max) = ElementConfig::global().find_poll_range();
        Self::jittered(min, max)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `true` once per elapsed interval. The first call only records the
    /// baseline.
    pub fn is_due(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_check else {
            self.last_check = Some(now);
            return false;
        };
        if now.saturating_duration_since(last) >= self.interval {
            self.last_check = Some(now);
            true
        } else {
            false
        }
    }
}
