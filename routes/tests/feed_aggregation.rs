//! End-to-end runs of the route builder over a trimmed delegation file.

use routes::address;
use routes::builder::build_routes;
use routes::builder::Routes;
use routes::cidr::AddressSpan;
use routes::cidr::CidrBlock;
use routes::private;
use routes::region::Region;
use routes::testing::assert_well_formed;
use routes::testing::coalesce;
use routes::testing::strings;

const FEED: &str = include_str!("fixtures/delegated-sample.txt");

fn run(region: Region) -> Routes {
    build_routes(region, "apnic", FEED.lines()).expect("the sample feed is ascending")
}

/// The spans of every well-formed, public-start record `region` selects.
fn selected_spans(region: Region) -> Vec<AddressSpan> {
    let filter = region.record_filter("apnic");
    FEED.lines()
        .filter_map(|line| filter.decode(line).ok().flatten())
        .filter(|record| !private::classify(record.start).is_private())
        .map(|record| record.span().unwrap())
        .collect()
}

fn span(start: &str, end_inclusive: &str) -> AddressSpan {
    let start = u64::from(address::parse(start).unwrap());
    let end = u64::from(address::parse(end_inclusive).unwrap()) + 1;
    AddressSpan::new(start, end)
}

#[test]
fn china_routes_cover_exactly_the_chinese_records() {
    let routes = run(Region::China);
    assert_well_formed(&routes.blocks);

    let covered = coalesce(routes.blocks.iter().map(CidrBlock::span));
    let expected = coalesce(
        selected_spans(Region::China)
            .into_iter()
            .flat_map(private::public_parts),
    );
    assert_eq!(covered, expected);
    assert_eq!(routes.stats.malformed, 1);
}

#[test]
fn china_routes_merge_where_the_total_is_a_block() {
    let blocks = strings(&run(Region::China).blocks);

    // 1.1.8.0/24, 1.1.9.0/24 and 1.1.10.0/23 fold into a /22, while the
    // /22 before them does not fit and is emitted on its own.
    assert!(blocks.contains(&"1.1.4.0/22".to_string()));
    assert!(blocks.contains(&"1.1.8.0/22".to_string()));
    assert!(!blocks.contains(&"1.1.9.0/24".to_string()));
    // 768 addresses are split into a /23 and a /24.
    let tail: Vec<&str> = blocks
        .iter()
        .map(String::as_str)
        .filter(|b| b.starts_with("14.0.6"))
        .collect();
    assert_eq!(tail, ["14.0.64.0/23", "14.0.66.0/24"]);
    // The private record never shows up.
    assert!(blocks.iter().all(|b| !b.starts_with("10.")));
}

#[test]
fn asia_routes_do_not_include_china() {
    let routes = run(Region::Asia);
    assert_well_formed(&routes.blocks);

    let china = selected_spans(Region::China);
    for block in &routes.blocks {
        let span = block.span();
        assert!(china
            .iter()
            .all(|c| span.end <= c.start || c.end <= span.start));
    }
    assert!(strings(&routes.blocks).contains(&"1.160.0.0/12".to_string()));
}

#[test]
fn not_asia_routes_and_asia_tile_the_public_space() {
    let routes = run(Region::NotAsia);
    assert_well_formed(&routes.blocks);

    let asia = selected_spans(Region::NotAsia);
    let private_spans = private::PRIVATE_BLOCKS
        .iter()
        .map(|b| AddressSpan::new(b.start, b.end));
    let everything = coalesce(
        routes
            .blocks
            .iter()
            .map(CidrBlock::span)
            .chain(asia.iter().copied())
            .chain(private_spans),
    );
    assert_eq!(
        everything,
        [AddressSpan::new(0, address::ADDRESS_SPACE_SIZE)]
    );

    let covered = routes.blocks.iter().map(CidrBlock::span).collect::<Vec<_>>();
    for gap in [
        span("1.0.0.0", "1.0.0.255"),
        span("1.0.4.0", "1.0.7.255"),
        span("1.1.1.0", "1.1.1.255"),
        span("14.0.32.0", "14.0.39.255"),
    ] {
        assert!(
            covered.iter().any(|c| c.start <= gap.start && gap.end <= c.end),
            "{gap:?} should be routed"
        );
    }
}

#[test]
fn not_asia_routes_avoid_private_space() {
    let routes = run(Region::NotAsia);
    for block in &routes.blocks {
        let span = block.span();
        for private in private::PRIVATE_BLOCKS {
            assert!(span.end <= private.start || private.end <= span.start);
        }
    }
    let last = routes.blocks.last().unwrap();
    assert_eq!(last.span().end, address::ADDRESS_SPACE_SIZE);
}

#[test]
fn runs_are_repeatable() {
    for region in Region::ALL {
        assert_eq!(run(region), run(region));
    }
}
