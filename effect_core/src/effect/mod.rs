//! Status effects - definitions, stacks and live per-entity instances

mod def;
mod lookup;
mod stack;
mod status;

pub use def::{CustomEffect, EffectDef, StackMode};
pub use lookup::EffectLookup;
pub use stack::{EffectStack, StackDef};
pub use status::StatusEffect;
