//! Tests for [`Range`], [`Bindings`], and [`RangeSet`] algebra.

use rstest::rstest;

use crate::{BindingIdentity, Bindings, Range, RangeSet};

fn bound(start: u32, end: u32, name: &str, sid: i64) -> Range {
    Range::new(
        start,
        end,
        [(name, BindingIdentity::Symbol(sid))].into_iter().collect(),
    )
}

#[test]
fn equal_offsets_and_bindings_are_equal() {
    assert_eq!(bound(0, 10, "$X", 1), bound(0, 10, "$X", 1));
}

#[test]
fn different_binding_identity_makes_ranges_distinct() {
    let set: RangeSet = [bound(0, 10, "$X", 1), bound(0, 10, "$X", 2)].into();
    assert_eq!(set.len(), 2);
}

#[test]
fn unbound_and_bound_ranges_differ() {
    assert_ne!(Range::unbound(0, 10), bound(0, 10, "$X", 1));
}

#[test]
fn set_difference_removes_only_identical_ranges() {
    let left: RangeSet = [Range::unbound(0, 10), Range::unbound(20, 30)].into();
    let right: RangeSet = [Range::unbound(0, 10), Range::unbound(20, 31)].into();
    let difference: RangeSet = left.difference(&right).cloned().collect();
    assert_eq!(difference, [Range::unbound(20, 30)].into());
}

#[rstest]
#[case::equal(Range::unbound(5, 10), Range::unbound(5, 10), true)]
#[case::strictly_inside(Range::unbound(0, 20), Range::unbound(5, 10), true)]
#[case::shared_start(Range::unbound(5, 20), Range::unbound(5, 10), true)]
#[case::overlap_right(Range::unbound(0, 8), Range::unbound(5, 10), false)]
#[case::inner_is_outer(Range::unbound(5, 10), Range::unbound(0, 20), false)]
#[case::disjoint(Range::unbound(0, 4), Range::unbound(5, 10), false)]
fn enclosure(#[case] outer: Range, #[case] inner: Range, #[case] expected: bool) {
    assert_eq!(outer.is_enclosing_or_eq(&inner), expected);
}

#[test]
fn enclosure_ignores_bindings() {
    assert!(bound(0, 20, "$A", 1).is_enclosing_or_eq(&bound(5, 10, "$B", 2)));
}

#[test]
fn display_lists_binding_names() {
    let mut bindings = Bindings::new();
    bindings.insert("$X", BindingIdentity::Text(String::from("a")));
    bindings.insert("$Y", BindingIdentity::Digest(String::from("ff")));
    assert_eq!(Range::new(3, 9, bindings).to_string(), "3..9 [$X, $Y]");
    assert_eq!(Range::unbound(3, 9).to_string(), "3..9");
}

#[test]
fn identity_serializes_with_kind_tag() {
    let json = serde_json::to_string(&BindingIdentity::Symbol(7)).expect("serialize");
    assert_eq!(json, r#"{"kind":"symbol","value":7}"#);
}
