//! # bumpspec
//!
//! A library for bumping versions described by a configurable grammar of components.
//!
//! Instead of hard-coding a versioning scheme, a version is split into named *components* by a
//! regex with named groups, each component is given a *function* that knows how to increment it,
//! and the bumped version is rendered back to text with the best fitting of several *serialization
//! formats*.
//!
//! ## Examples
//!
//! Bump a prerelease-style version:
//!
//! ```
//! use bumpspec::prelude::*;
//!
//! let config = Config::from_toml_str(r#"
//!     parse = '(?P<major>\d+)\.(?P<minor>\d+)((?P<prerel>[a-z]+)(?P<prerelversion>\d+))?'
//!     serialize = ["{major}.{minor}{prerel}{prerelversion}", "{major}.{minor}"]
//!
//!     [parts.prerel]
//!     values = ["dev", "a", "b", "c", "rc", "d"]
//!     optional_value = "d"
//! "#).unwrap();
//!
//! let spec = config.version_spec(Clock::default()).unwrap();
//! let regex = config.parse_regex().unwrap();
//! let formats = config.serialize_templates().unwrap();
//!
//! let version = spec.parse_version("1.0rc1", &regex).unwrap();
//! let next = version.bump("prerelversion").unwrap();
//! assert_eq!("1.0rc2", next.serialize(&formats, &Context::new()).unwrap());
//!
//! // `d` is the optional value, so it is left out
//! let release = version.bump("prerel").unwrap();
//! assert_eq!("1.0", release.serialize(&formats, &Context::new()).unwrap());
//! ```
//!
//! Or let [plan_bump] do every step, including the tag name and commit message:
//!
//! ```
//! use bumpspec::prelude::*;
//!
//! let config = Config::from_toml_str(r#"
//!     current_version = "2024.1.7"
//!     parse = '(?P<release>\d+\.\d+)\.(?P<patch>\d+)'
//!     serialize = "{release}.{patch}"
//!
//!     [parts.release]
//!     calver_format = "{YYYY}.{MM}"
//! "#).unwrap();
//!
//! let clock: Clock = "2024-03-15".parse().unwrap();
//! let target = BumpTarget::Part("release".to_string());
//! let outcome = plan_bump(&config, &target, clock, [("USER", "me")], None).unwrap();
//! assert_eq!("2024.3.0", outcome.new_version);
//! assert_eq!("v2024.3.0", outcome.tag_name);
//! ```
//!
//! ## Important Terms
//!
//! - **Component**: A named part of a version, like `major` or `prerel`. It's modeled by
//!   [`VersionComponent`] and described by a [`ComponentSpec`].
//! - **Version Spec**: The components of a version, their order and the dependencies between
//!   them. It's modeled by [`VersionSpec`]. Bumping a component resets every component that
//!   depends on it.
//! - **Optional value**: The value of a component that may be left out when serializing. For
//!   numeric components, this is the first value (usually `0`).
//! - **Serialization format**: A [`Template`] like `{major}.{minor}{prerel}`. Among the formats
//!   that represent every component with a meaningful value, the shortest one is used.
//!
//! ## Component Functions
//!
//! | Function | Configured with | Bump |
//! |---|---|---|
//! | Numeric | nothing, or `first_value` | Increments the first run of digits: `r3-beta` becomes `r4-beta` |
//! | Values | `values` | Moves to the next value of the list |
//! | Independent | `independent = true` and a first value without digits | Keeps its value, never reset |
//! | CalVer | `calver_format` | Renders the current date |
//!
//! Components with `independent = true` or `always_increment = true` are never reset by other
//! components. `always_increment` components are bumped on every bump of the version.
//!
//! ## Calendar Placeholders
//!
//! In the "Example" column below, we reference a date of `2001-02-03`.
//!
//! | Placeholder | Example | Description |
//! |---|---|---|
//! | `{YYYY}` | `2001` | Full year |
//! | `{YY}` | `1` | Short year, without padding |
//! | `{0Y}` | `01` | Short year, zero-padded to 2 characters |
//! | `{MMM}` | `Feb` | Abbreviated month name |
//! | `{MM}` | `2` | Month (`1`–`12`) |
//! | `{0M}` | `02` | Same as `MM` but zero-padded to 2 characters |
//! | `{DD}` | `3` | Day of the month (`1`–`31`) |
//! | `{0D}` | `03` | Same as `DD` but zero-padded to 2 characters |
//! | `{JJJ}` | `34` | Day of the year (`1`–`366`) |
//! | `{00J}` | `034` | Same as `JJJ` but zero-padded to 3 characters |
//! | `{Q}` | `1` | Quarter (`1`–`4`) |
//! | `{WW}` | `5` | Week of the year, weeks starting on Monday (`0`–`53`) |
//! | `{0W}` | `05` | Same as `WW` but zero-padded to 2 characters |
//! | `{UU}` | `4` | Week of the year, weeks starting on Sunday (`0`–`53`) |
//! | `{0U}` | `04` | Same as `UU` but zero-padded to 2 characters |
//! | `{VV}` | `5` | ISO 8601 week (`1`–`53`) |
//! | `{0V}` | `05` | Same as `VV` but zero-padded to 2 characters |
//! | `{GGGG}` | `2001` | ISO 8601 week-based year |
//! | `{GG}` | `1` | Short ISO 8601 week-based year |
//! | `{0G}` | `01` | Same as `GG` but zero-padded to 2 characters |
//!
//! ## Prelude
//!
//! bumpspec provides a prelude module for convenience. Use it with:
//!
//! ```
//! use bumpspec::prelude::*;
//! ```

mod bump;
mod calver;
mod clock;
mod component;
mod config;
mod context;
mod error;
mod function;
mod parse;
mod serialize;
mod spec;
mod template;
mod version;

pub use crate::bump::{plan_bump, BumpOutcome, BumpTarget};
pub use crate::calver::CalendarFormat;
pub use crate::clock::Clock;
pub use crate::component::{ComponentConfig, ComponentSpec, VersionComponent};
pub use crate::config::{
    Config, DEFAULT_CONFIG_FILE, DEFAULT_MESSAGE, DEFAULT_SERIALIZE, DEFAULT_TAG_NAME, ENV_PREFIX,
};
pub use crate::context::{Context, ContextValue, ScmInfo};
pub use crate::error::{
    BumpError, ConfigError, DateError, Error, FormatError, SpecError, VersionError,
};
pub use crate::function::{
    CalVerFunction, ComponentFunction, ComponentKind, IndependentFunction, NumericFunction,
    ValuesFunction, CALVER_NO_OPTIONAL_VALUE,
};
pub use crate::parse::{
    compile_parse_pattern, parse_raw_version, pattern_labels, RawVersion, DEFAULT_PARSE_PATTERN,
};
pub use crate::serialize::serialize;
pub use crate::spec::VersionSpec;
pub use crate::template::Template;
pub use crate::version::Version;

/// A convenience module appropriate for glob imports (`use bumpspec::prelude::*;`).
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::plan_bump;
    #[doc(no_inline)]
    pub use crate::BumpError;
    #[doc(no_inline)]
    pub use crate::BumpTarget;
    #[doc(no_inline)]
    pub use crate::Clock;
    #[doc(no_inline)]
    pub use crate::ComponentConfig;
    #[doc(no_inline)]
    pub use crate::Config;
    #[doc(no_inline)]
    pub use crate::Context;
    #[doc(no_inline)]
    pub use crate::Error;
    #[doc(no_inline)]
    pub use crate::ScmInfo;
    #[doc(no_inline)]
    pub use crate::Template;
    #[doc(no_inline)]
    pub use crate::Version;
    #[doc(no_inline)]
    pub use crate::VersionSpec;
}
