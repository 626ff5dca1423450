//! Event bus the route controller publishes fahrstrasse and block section
//! notifications to. Subscribers are plain closures registered per event kind;
//! publishing never returns anything to the controller.

use crate::models::{RouteId, TrainId};
use log::trace;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CreateFahrstrasse,
    RemoveFahrstrasse,
    TrainEnterBlockSection,
    TrainLeaveBlockSection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateFahrstrasse { tick: u64, route: RouteId },
    RemoveFahrstrasse { tick: u64, route: RouteId },
    TrainEnterBlockSection { tick: u64, train: TrainId, block_section: RouteId, length: f64 },
    TrainLeaveBlockSection { tick: u64, train: TrainId, block_section: RouteId, length: f64 },
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::CreateFahrstrasse { .. } => EventKind::CreateFahrstrasse,
            Self::RemoveFahrstrasse { .. } => EventKind::RemoveFahrstrasse,
            Self::TrainEnterBlockSection { .. } => EventKind::TrainEnterBlockSection,
            Self::TrainLeaveBlockSection { .. } => EventKind::TrainLeaveBlockSection,
        }
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        match self {
            Self::CreateFahrstrasse { tick, .. }
            | Self::RemoveFahrstrasse { tick, .. }
            | Self::TrainEnterBlockSection { tick, .. }
            | Self::TrainLeaveBlockSection { tick, .. } => *tick,
        }
    }
}

pub type Subscriber = Box<dyn FnMut(&Event)>;

#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<EventKind, Vec<Subscriber>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, subscriber: impl FnMut(&Event) + 'static) {
        self.subscribers.entry(kind).or_default().push(Box::new(subscriber));
    }

    /// Register one subscriber for every event kind
    pub fn subscribe_all(&mut self, subscriber: impl FnMut(&Event) + Clone + 'static) {
        for kind in [
            EventKind::CreateFahrstrasse,
            EventKind::RemoveFahrstrasse,
            EventKind::TrainEnterBlockSection,
            EventKind::TrainLeaveBlockSection,
        ] {
            self.subscribe(kind, subscriber.clone());
        }
    }

    /// Call every subscriber of the event's kind in registration order
    pub fn publish(&mut self, event: &Event) {
        trace!("publish {event:?}");
        if let Some(subscribers) = self.subscribers.get_mut(&event.kind()) {
            for subscriber in subscribers {
                subscriber(event);
            }
        }
    }

    pub fn create_fahrstrasse(&mut self, tick: u64, route: &RouteId) {
        self.publish(&Event::CreateFahrstrasse { tick, route: route.clone() });
    }

    pub fn remove_fahrstrasse(&mut self, tick: u64, route: &RouteId) {
        self.publish(&Event::RemoveFahrstrasse { tick, route: route.clone() });
    }

    pub fn train_enter_block_section(&mut self, tick: u64, train: TrainId, block_section: &RouteId, length: f64) {
        self.publish(&Event::TrainEnterBlockSection {
            tick,
            train,
            block_section: block_section.clone(),
            length,
        });
    }

    pub fn train_leave_block_section(&mut self, tick: u64, train: TrainId, block_section: &RouteId, length: f64) {
        self.publish(&Event::TrainLeaveBlockSection {
            tick,
            train,
            block_section: block_section.clone(),
            length,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_publish_reaches_only_matching_kind() {
        let mut bus = EventBus::new();
        let created = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&created);
        bus.subscribe(EventKind::CreateFahrstrasse, move |event| sink.borrow_mut().push(event.clone()));

        bus.create_fahrstrasse(3, &RouteId::from("S1-S2"));
        bus.remove_fahrstrasse(4, &RouteId::from("S1-S2"));

        assert_eq!(
            *created.borrow(),
            vec![Event::CreateFahrstrasse { tick: 3, route: RouteId::from("S1-S2") }]
        );
    }

    #[test]
    fn test_subscribers_called_in_order() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let order = Rc::clone(&order);
            bus.subscribe(EventKind::TrainEnterBlockSection, move |_| order.borrow_mut().push(n));
        }

        bus.train_enter_block_section(1, TrainId(7), &RouteId::from("S1-S2"), 400.0);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_subscribe_all() {
        let mut bus = EventBus::new();
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ticks);
        bus.subscribe_all(move |event: &Event| sink.borrow_mut().push(event.tick()));

        bus.create_fahrstrasse(1, &RouteId::from("A-B"));
        bus.train_leave_block_section(2, TrainId(1), &RouteId::from("A-B"), 10.0);
        assert_eq!(*ticks.borrow(), vec![1, 2]);
    }
}
