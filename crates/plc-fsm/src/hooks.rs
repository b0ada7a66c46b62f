//! Hook type aliases shared by [`crate::state::State`] and
//! [`crate::transition::Transition`].
//!
//! Hooks are an opaque callable of signature `(context) -> ()` (entry,
//! exit, and transition actions) or `(from, to) -> bool` (guards). They are
//! represented as `Arc<dyn Fn>` rather than plain function pointers so a
//! hook can close over state and survive being cloned into a
//! [`crate::snapshot::StateSnapshot`].

use std::sync::Arc;

use crate::state::State;

/// An on-enter or on-exit hook: `(context) -> ()`.
pub type EnterExitFn<Ctx> = Arc<dyn Fn(&mut Ctx) + Send + Sync>;

/// A transition's action hook: `(context) -> ()`.
pub type ActionFn<Ctx> = Arc<dyn Fn(&mut Ctx) + Send + Sync>;

/// A transition's guard predicate: `(from, to) -> bool`.
pub type GuardFn<Ctx> = Arc<dyn Fn(&State<Ctx>, &State<Ctx>) -> bool + Send + Sync>;
