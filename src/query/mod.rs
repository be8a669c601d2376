//! Query synthesis: templates, the symbol dictionary and the two-pass
//! placeholder substitution engine.

pub mod dictionary;
pub mod subst;
pub mod template;
