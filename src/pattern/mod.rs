//! Pattern matchers
//!
//! Pure helpers that locate candidate URLs inside content a strategy has
//! already fetched. Absence is never an error here: every matcher returns
//! `None` or an empty `Vec` when the site's markup doesn't have what it
//! looks for, and the strategy decides what that means.
//!
//! - [`dom`]: CSS selector + attribute reads
//! - [`script`]: JSON / JS-literal fragments inside inline scripts
//! - [`regex_url`]: regex scans over raw text
//! - [`redirect`]: `Location` header of a non-followed request

pub mod dom;
pub mod redirect;
pub mod regex_url;
pub mod script;
