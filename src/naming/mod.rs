//! Display titles for tables and columns.
//!
//! - `alias` - prefix stripping and per-base [`NamingPolicy`]
//! - `inflection` - pluralize, singularize, camelize and friends
//! - `unique` - numeric-suffix disambiguation

mod alias;
mod inflection;
mod unique;

pub use alias::{column_alias, table_alias, NamingPolicy};
pub use inflection::{pluralize, singularize, Inflection, InflectionStep};
pub use unique::unique_title;
