mod block;
mod caret;
mod config;
mod dispatch;
mod dom;
mod error;
mod extension;
mod grammar;
mod guard;
mod markup;
mod ops;
mod query;
mod render;
mod styles;
mod surgeon;
mod transitions;

pub use crate::block::*;
pub use crate::caret::*;
pub use crate::config::*;
pub use crate::dispatch::*;
pub use crate::dom::*;
pub use crate::error::*;
pub use crate::extension::*;
pub use crate::grammar::*;
pub use crate::guard::*;
pub use crate::markup::*;
pub use crate::ops::*;
pub use crate::query::*;
pub use crate::render::*;
pub use crate::styles::*;
pub use crate::surgeon::*;
pub use crate::transitions::*;
