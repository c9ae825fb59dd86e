#![no_main]

use chrono::{Duration, NaiveDate};
use libfuzzer_sys::fuzz_target;
use roadmap_core::timeline::window::MAX_WINDOW_DAYS;
use roadmap_core::timeline::{TimelineView, TimelineWindow};

fuzz_target!(|input: (i32, u16, i32, i32, i8)| {
    let (reference, days, start, end, offset) = input;
    let Some(base) = NaiveDate::from_ymd_opt(2000, 1, 1) else {
        return;
    };
    let day = |n: i32| base.checked_add_signed(Duration::days(i64::from(n % 20_000)));
    let (Some(reference), Some(start), Some(end)) = (day(reference), day(start), day(end)) else {
        return;
    };

    let window = TimelineWindow::with_days(reference, u32::from(days)).offset(i64::from(offset));
    assert!((1..=MAX_WINDOW_DAYS).contains(&window.days));
    assert!(window.start <= window.end());
    assert_eq!(window.next().previous(), window);

    if let Some(bar) = window.bar_position(start, end) {
        assert!(bar.left_pct >= 0.0 && bar.left_pct < 100.0);
        assert!(bar.width_pct > 0.0 && bar.left_pct + bar.width_pct <= 100.0 + 1e-9);
    }

    for view in TimelineView::ALL {
        assert!(!window.periods(view).is_empty());
    }
});
