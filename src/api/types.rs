//! Shared types for the HTTP layer.

use crate::engine_state::SharedEngine;

/// Answers longer than this are rejected before any model call.
pub const MAX_ANSWER_CHARS: usize = 2000;

/// Shared context for all routes.
///
/// The engine lives for the whole process, so handlers hold a plain
/// `'static` reference.
#[derive(Clone, Copy)]
pub struct ApiContext {
    pub engine: &'static SharedEngine,
}

impl ApiContext {
    pub fn new(engine: &'static SharedEngine) -> Self {
        Self { engine }
    }
}
