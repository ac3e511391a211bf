//! End-to-end scenarios: several observers on one hub, window and scroll
//! container, driven by published snapshots.

use std::cell::RefCell;
use std::rc::Rc;

use element_observer::testing::{ElementId, StaticLayout};
use element_observer::{
    is_in_viewport, CheckOutcome, Container, ElementObserver, ObserverConfig, ObserverOptions,
    Offsets, Rect, ViewportHub, ViewportSource, ViewportState, WindowSize,
};
use pretty_assertions::assert_eq;

type Log = Rc<RefCell<Vec<String>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn logging(log: &Log, name: &'static str) -> ObserverOptions<ElementId> {
    let enter = Rc::clone(log);
    let exit = Rc::clone(log);
    ObserverOptions::new()
        .on_enter(move |_, state| {
            enter
                .borrow_mut()
                .push(format!("{name}:enter@{}", state.scroll_y))
        })
        .on_exit(move |_, state| {
            exit.borrow_mut()
                .push(format!("{name}:exit@{}", state.scroll_y))
        })
}

/// Scrolls the page: moves every listed element and publishes the new offset
struct Page {
    layout: StaticLayout,
    hub: Rc<ViewportHub>,
    scroll_y: f64,
}

impl Page {
    fn new(width: f64, height: f64) -> Self {
        Self {
            layout: StaticLayout::new(WindowSize::new(width, height)),
            hub: Rc::new(ViewportHub::new(ViewportState::new(width, height))),
            scroll_y: 0.0,
        }
    }

    fn source(&self) -> Rc<dyn ViewportSource> {
        self.hub.clone()
    }

    fn observe(
        &self,
        el: ElementId,
        options: ObserverOptions<ElementId>,
    ) -> ElementObserver<StaticLayout> {
        ElementObserver::new(self.layout.clone(), el, options, self.source()).unwrap()
    }

    fn scroll_to(&mut self, scroll_y: f64, elements: &[ElementId]) {
        let dy = scroll_y - self.scroll_y;
        for el in elements {
            self.layout.scroll_by(*el, 0.0, dy);
        }
        self.scroll_y = scroll_y;
        let state = self.hub.state();
        self.hub
            .publish(ViewportState::new(state.width, state.height).with_scroll(0.0, scroll_y));
    }
}

#[test]
fn window_scenario_from_rects() {
    let layout = StaticLayout::new(WindowSize::new(100.0, 100.0));
    let el = layout.add(Rect::from_edges(10.0, 50.0, 10.0, 50.0));
    assert!(is_in_viewport(&layout, &el, 0.0, 0.0, &Container::Root).unwrap());

    layout.set_rect(el, Rect::from_edges(150.0, 190.0, 10.0, 50.0));
    assert!(!is_in_viewport(&layout, &el, 0.0, 0.0, &Container::Root).unwrap());
}

#[test]
fn partial_overlap_with_container_counts() {
    let layout = StaticLayout::new(WindowSize::new(100.0, 100.0));
    let scroller = layout.add(Rect::from_edges(0.0, 100.0, 0.0, 100.0));
    let el = layout.add(Rect::from_edges(90.0, 130.0, 10.0, 50.0));
    assert!(is_in_viewport(&layout, &el, 0.0, 0.0, &Container::Element(scroller)).unwrap());
}

#[test]
fn several_observers_share_one_hub() {
    init_tracing();
    let mut page = Page::new(100.0, 100.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    let a = page.layout.add(Rect::new(50.0, 0.0, 100.0, 40.0));
    let b = page.layout.add(Rect::new(200.0, 0.0, 100.0, 40.0));
    let c = page.layout.add(Rect::new(400.0, 0.0, 100.0, 40.0));
    let all = [a, b, c];

    let _oa = page.observe(a, logging(&log, "a"));
    let _ob = page.observe(b, logging(&log, "b"));
    let _oc = page.observe(c, logging(&log, "c").once(true));
    assert_eq!(*log.borrow(), vec!["a:enter@0"]);

    page.scroll_to(150.0, &all);
    page.scroll_to(350.0, &all);
    page.scroll_to(0.0, &all);

    assert_eq!(
        *log.borrow(),
        vec![
            "a:enter@0",
            "a:exit@150",
            "b:enter@150",
            "b:exit@350",
            "c:enter@350",
            "a:enter@0",
        ]
    );
    // c was once-only and is gone
    assert_eq!(page.hub.listener_count(), 2);
}

#[test]
fn hysteresis_holds_until_exit_boundary() {
    init_tracing();
    let mut page = Page::new(100.0, 100.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let el = page.layout.add(Rect::new(120.0, 0.0, 100.0, 40.0));
    let offsets = Offsets {
        y_enter: 0.0,
        y_exit: 50.0,
        ..Offsets::default()
    };
    let observer = page.observe(el, logging(&log, "el").offsets(offsets));

    // top: 120 -> 90, enters
    page.scroll_to(30.0, &[el]);
    // top: 90 -> 120 -> 145, still within the 150 exit bound
    page.scroll_to(0.0, &[el]);
    page.scroll_to(-25.0, &[el]);
    assert!(observer.is_entered());
    assert_eq!(*log.borrow(), vec!["el:enter@30"]);

    // top: 155, out
    page.scroll_to(-35.0, &[el]);
    assert!(!observer.is_entered());
    assert_eq!(*log.borrow(), vec!["el:enter@30", "el:exit@-35"]);
}

#[test]
fn scroll_container_gates_visibility() {
    init_tracing();
    let page = Page::new(200.0, 200.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    // 100px tall scroller in the middle of the window
    let scroller = page.layout.add(Rect::from_edges(50.0, 150.0, 0.0, 200.0));
    let item = page.layout.add(Rect::new(160.0, 10.0, 50.0, 20.0));
    let options = logging(&log, "item").container(Container::Element(scroller));
    let observer = page.observe(item, options);

    // In the window, below the scroller's bottom edge
    assert!(!observer.is_entered());

    page.layout.scroll_by(item, 0.0, 20.0);
    assert_eq!(observer.check(&page.hub.state()).unwrap(), CheckOutcome::Entered);

    // Above the scroller's top edge but still in the window
    page.layout.set_rect(item, Rect::new(20.0, 10.0, 50.0, 20.0));
    assert_eq!(observer.check(&page.hub.state()).unwrap(), CheckOutcome::Exited);
}

#[test]
fn once_stops_updates_after_first_callback() {
    let mut page = Page::new(100.0, 100.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let el = page.layout.add(Rect::new(150.0, 0.0, 100.0, 40.0));
    let config = ObserverConfig::from_json(r#"{"once": true}"#).unwrap();
    let observer = page.observe(el, logging(&log, "el").with_config(config));

    page.scroll_to(100.0, &[el]);
    page.scroll_to(0.0, &[el]);

    assert_eq!(*log.borrow(), vec!["el:enter@100"]);
    assert!(!observer.is_active());
    assert_eq!(page.hub.listener_count(), 0);
}

#[test]
fn detach_tears_down_on_next_update() {
    let mut page = Page::new(100.0, 100.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let el = page.layout.add(Rect::new(150.0, 0.0, 100.0, 40.0));
    let observer = page.observe(el, logging(&log, "el"));

    page.layout.detach(el);
    page.scroll_to(100.0, &[el]);

    assert!(log.borrow().is_empty());
    assert!(!observer.is_active());
    assert_eq!(observer.check(&page.hub.state()).unwrap(), CheckOutcome::Inactive);
}

#[test]
fn zero_size_element_never_enters() {
    let mut page = Page::new(100.0, 100.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let el = page.layout.add(Rect::new(10.0, 10.0, 0.0, 40.0));
    let options = logging(&log, "el").offsets(Offsets::uniform(500.0, 500.0));
    let observer = page.observe(el, options);

    page.scroll_to(5.0, &[el]);
    assert!(!observer.is_entered());
    assert!(log.borrow().is_empty());
}
