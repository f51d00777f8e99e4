use super::*;

#[test]
fn test_span_len_and_union() {
    let a = Span::new(4, 10);
    let b = Span::new(8, 20);
    assert_eq!(a.len(), 6);
    assert_eq!(a.to(b), Span::new(4, 20));
    assert!(Span::new(0, 30).contains(a));
    assert!(!a.contains(b));
    assert!(Span::DUMMY.is_empty());
}

#[test]
fn test_line_map_positions() {
    let map = LineMap::new("val x = 1\nval y = 2\n\nfun f() = x");
    assert_eq!(map.line_count(), 4);
    assert_eq!(map.position(0), Position { line: 1, column: 1 });
    assert_eq!(map.position(4), Position { line: 1, column: 5 });
    assert_eq!(map.position(10), Position { line: 2, column: 1 });
    assert_eq!(map.position(21), Position { line: 4, column: 1 });
}
