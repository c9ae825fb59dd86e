#![no_main]

use libfuzzer_sys::fuzz_target;
use roadmap_core::check::check_portfolio;
use roadmap_core::index::PortfolioIndex;
use roadmap_core::ingest::{assemble, parse_snapshot};
use roadmap_core::rollup::{Rollup, compute_completion, compute_completion_iterative};
use roadmap_core::timeline::flatten_portfolio;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(snapshot) = parse_snapshot(text) else {
        return;
    };
    let Ok(portfolio) = assemble(snapshot) else {
        return;
    };

    let rollup = Rollup::of_forest(&portfolio.business_requests);
    for root in &portfolio.business_requests {
        let recursive = compute_completion(root);
        assert!(recursive <= 100);
        assert_eq!(recursive, compute_completion_iterative(root));
        assert_eq!(recursive, rollup.completion(root.into()));
    }

    if let Ok(index) = PortfolioIndex::build(&portfolio) {
        let rows = flatten_portfolio(&portfolio, &index);
        assert_eq!(rows.len(), portfolio.node_count());
    }
    let _ = check_portfolio(&portfolio, 0);
});
