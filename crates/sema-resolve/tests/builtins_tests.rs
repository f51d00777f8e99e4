//! Tests for builtins.rs

use super::*;
use crate::cancel::CancellationToken;
use crate::error::ResolveError;
use crate::for_loop::ForLoopConventionChecker;
use crate::options::ResolveOptions;
use sema_syntax::SourceSet;
use std::rc::Rc;

fn context(sources: SourceSet, token: CancellationToken) -> ResolveContext {
    ResolveContext::new(
        Rc::new(sources),
        ResolveOptions::default(),
        Vec::new(),
        ForLoopConventionChecker,
        token,
    )
}

#[test]
fn test_lookup_is_cached_by_name() {
    let ctx = context(
        SourceSet::with_builtins().expect("builtins parse"),
        CancellationToken::new(),
    );
    let int = ctx
        .builtins()
        .class("Int")
        .expect("lookup")
        .expect("Int is built in");
    assert_eq!(ctx.builtin_cache().borrow().get("Int").copied(), Some(int));
    assert_eq!(ctx.builtins().is(int, "Int"), Ok(true));
    assert_eq!(ctx.builtins().is(int, "Long"), Ok(false));
    assert_eq!(ctx.builtins().class("NoSuchClass"), Ok(None));
}

#[test]
fn test_missing_catalogue_yields_error_types() {
    let ctx = context(SourceSet::new(), CancellationToken::new());
    assert_eq!(ctx.builtins().class("Any"), Ok(None));
    assert_eq!(ctx.builtins().int_type(), Ok(TypeId::ERROR));
}

#[test]
fn test_cancellation_propagates_from_lookup() {
    let token = CancellationToken::new();
    let ctx = context(SourceSet::with_builtins().expect("builtins parse"), token.clone());
    token.cancel();
    assert_eq!(ctx.builtins().int_type(), Err(ResolveError::Cancelled));
    assert!(ctx.builtin_cache().borrow().is_empty());

    ctx.set_token(CancellationToken::new());
    let int = ctx.builtins().int_type().expect("recomputed");
    assert!(!int.is_error());
    assert_eq!(ctx.render_type(int), "Int");
}
