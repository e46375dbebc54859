//! Cookie records and the per-tab cookie store.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`record`] | Normalized [`CookieRecord`](record::CookieRecord) |
//! | [`parse`] | `Set-Cookie` / `Cookie` header and debugger payload parsers |
//! | [`dictionary`] | Known-cookie classification database |
//! | [`psl`] | Public suffix helpers |
//! | [`store`] | [`CookieDataStore`](store::CookieDataStore) and its in-memory implementation |

pub mod dictionary;
pub mod parse;
pub mod psl;
pub mod record;
pub mod store;
